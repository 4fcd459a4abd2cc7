use std::borrow::Cow;

use fake::faker::address::en::*;
use fake::faker::internet::en::*;
use fake::faker::lorem::en::*;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::*;
use fake::Fake;
use rand::Rng;

use crate::classify::TextKind;
use crate::generate::value::Value;

/// Wrap a dynamically generated String into a Value::String.
#[inline]
pub(crate) fn owned(s: String) -> Value {
    Value::String(Cow::Owned(s))
}

/// Generate realistic text for a column classified as `kind`.
///
/// The result is not length-limited; callers truncate to the column's
/// declared maximum.
pub fn generate_text(kind: TextKind, rng: &mut impl Rng) -> String {
    match kind {
        TextKind::FullName => Name().fake_with_rng(rng),
        TextKind::Email => SafeEmail().fake_with_rng(rng),
        TextKind::Address => {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            let city: String = CityName().fake_with_rng(rng);
            let state: String = StateAbbr().fake_with_rng(rng);
            let zip: String = ZipCode().fake_with_rng(rng);
            format!("{} {}, {}, {} {}", number, street, city, state, zip)
        }
        TextKind::Phone => PhoneNumber().fake_with_rng(rng),
        TextKind::Password => Password(10..20).fake_with_rng(rng),
        TextKind::ImageUrl => format!(
            "https://picsum.photos/seed/{}/640/480",
            rng.random_range(1..100_000u32)
        ),
        TextKind::Url => {
            let word: String = Word().fake_with_rng(rng);
            let suffix: String = DomainSuffix().fake_with_rng(rng);
            format!("https://{}.{}", word, suffix)
        }
        TextKind::Price => {
            let cents: u32 = rng.random_range(100..100_000);
            format!("{}.{:02}", cents / 100, cents % 100)
        }
        TextKind::Review => {
            let sentences: Vec<String> = Sentences(1..3).fake_with_rng(rng);
            sentences.join(" ")
        }
        TextKind::Country => CountryName().fake_with_rng(rng),
        TextKind::City => CityName().fake_with_rng(rng),
        TextKind::PostalCode => ZipCode().fake_with_rng(rng),
        TextKind::Message => {
            let paragraphs: Vec<String> = Paragraphs(1..3).fake_with_rng(rng);
            paragraphs.join("\n\n")
        }
        TextKind::Description => {
            let words: Vec<String> = Words(3..8).fake_with_rng(rng);
            words.join(" ")
        }
        TextKind::Word => Word().fake_with_rng(rng),
    }
}

/// Cut `text` to at most `max_chars` characters, never splitting a character.
pub fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut text = text;
            text.truncate(byte_idx);
            text
        }
        None => text,
    }
}
