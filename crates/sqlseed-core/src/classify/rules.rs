use std::sync::LazyLock;

use regex::Regex;

use crate::classify::TextKind;

/// A keyword rule: regex over the normalized column name and the text kind it selects.
struct KeywordRule {
    pattern: &'static str,
    kind: TextKind,
}

struct CompiledRule {
    pattern: Regex,
    kind: TextKind,
}

/// Rules in priority order. The first match wins, so `email_address`
/// is an email and not an address.
static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        pattern: r"(^|_)(full_?name|name)(_|$)",
        kind: TextKind::FullName,
    },
    KeywordRule {
        pattern: r"(^|_)e?_?mail(_|$)",
        kind: TextKind::Email,
    },
    KeywordRule {
        pattern: r"(^|_)address(_|$)",
        kind: TextKind::Address,
    },
    KeywordRule {
        pattern: r"(^|_)phone(_|$)",
        kind: TextKind::Phone,
    },
    KeywordRule {
        pattern: r"(^|_)password(_|$)",
        kind: TextKind::Password,
    },
    KeywordRule {
        pattern: r"(^|_)(picture|image)(_|$)",
        kind: TextKind::ImageUrl,
    },
    KeywordRule {
        pattern: r"(^|_)url(_|$)",
        kind: TextKind::Url,
    },
    KeywordRule {
        pattern: r"(^|_)price(_|$)",
        kind: TextKind::Price,
    },
    KeywordRule {
        pattern: r"(^|_)review(_|$)",
        kind: TextKind::Review,
    },
    KeywordRule {
        pattern: r"(^|_)country(_|$)",
        kind: TextKind::Country,
    },
    KeywordRule {
        pattern: r"(^|_)city(_|$)",
        kind: TextKind::City,
    },
    KeywordRule {
        pattern: r"(^|_)(zip_?code|postal_?code)(_|$)",
        kind: TextKind::PostalCode,
    },
    KeywordRule {
        pattern: r"(^|_)message(_|$)",
        kind: TextKind::Message,
    },
    KeywordRule {
        pattern: r"(^|_)description(_|$)",
        kind: TextKind::Description,
    },
];

/// Pre-compiled keyword rules, built once on first access.
static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    KEYWORD_RULES
        .iter()
        .filter_map(|r| match Regex::new(r.pattern) {
            Ok(pattern) => Some(CompiledRule {
                pattern,
                kind: r.kind,
            }),
            Err(err) => {
                tracing::error!("Invalid keyword pattern {:?}: {}", r.pattern, err);
                None
            }
        })
        .collect()
});

/// Pick the kind of text to generate for a text column, from its name alone.
pub fn classify_text_column(column_name: &str) -> TextKind {
    let normalized = normalize_column_name(column_name);
    COMPILED_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&normalized))
        .map(|rule| rule.kind)
        .unwrap_or(TextKind::Word)
}

/// Normalize a column name for pattern matching:
/// - CamelCase to snake_case (e.g., firstName → first_name)
/// - lowercase (Unicode-safe)
/// - replace hyphens and spaces with underscores
pub fn normalize_column_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_char: Option<char> = None;

    for ch in name.chars() {
        if ch.is_uppercase() {
            if let Some(p) = prev_char {
                if p.is_lowercase() {
                    result.push('_');
                }
            }
        }
        // to_lowercase() can yield several chars (e.g., Turkish İ).
        result.extend(ch.to_lowercase());
        prev_char = Some(ch);
    }
    result.replace(['-', ' '], "_")
}
