pub mod rules;

pub use rules::{classify_text_column, normalize_column_name};

/// The kind of text a column name suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    FullName,
    Email,
    Address,
    Phone,
    Password,
    ImageUrl,
    Url,
    Price,
    Review,
    Country,
    City,
    PostalCode,
    /// Multi-sentence body text.
    Message,
    /// A short list of words.
    Description,
    /// Single word, used when nothing else matches.
    Word,
}
