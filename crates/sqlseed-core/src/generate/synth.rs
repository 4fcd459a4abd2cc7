//! # Value Synthesis
//!
//! One `ValueSynthesizer` per run owns the random source. Seeding it makes
//! every generated value reproducible; temporal values are anchored to a
//! `base_time` captured when the synthesizer is created.

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use fake::faker::lorem::en::Word;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::classify::TextKind;
use crate::generate::providers::{generate_text, owned, truncate_chars};
use crate::generate::value::Value;
use crate::schema::types::TypeCategory;

const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;
const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

pub struct ValueSynthesizer {
    rng: StdRng,
    base_time: NaiveDateTime,
}

impl ValueSynthesizer {
    /// Seeded synthesizers are deterministic; unseeded ones draw from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_base_time(seed, chrono::Utc::now().naive_utc())
    }

    pub fn with_base_time(seed: Option<u64>, base_time: NaiveDateTime) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, base_time }
    }

    pub fn base_time(&self) -> NaiveDateTime {
        self.base_time
    }

    /// Uniform draw from `values`. `None` when the slice is empty.
    pub fn pick<'a>(&mut self, values: &'a [Value]) -> Option<&'a Value> {
        values.choose(&mut self.rng)
    }

    /// Text of the given kind, cut to `max_length` characters when set.
    pub fn text(&mut self, kind: TextKind, max_length: Option<u32>) -> Value {
        let text = generate_text(kind, &mut self.rng);
        owned(limit(text, max_length))
    }

    /// A fresh random UUID. Drawn from the run's RNG so seeded runs repeat.
    pub fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.random()).into_uuid()
    }

    /// A UUID rendered as text, for character-typed key columns.
    pub fn uuid_text(&mut self, max_length: Option<u32>) -> Value {
        let text = self.uuid().to_string();
        owned(limit(text, max_length))
    }

    /// A value for a non-text column of the given category.
    /// Returns `None` for categories there is no generator for.
    pub fn typed(&mut self, category: TypeCategory) -> Option<Value> {
        let value = match category {
            TypeCategory::Integer => Value::Int(self.rng.random_range(1..=100)),
            TypeCategory::Decimal => {
                // 1.00 ..= 99.99, so two integer digits always suffice.
                let cents: u32 = self.rng.random_range(100..10_000);
                Value::Float(f64::from(cents) / 100.0)
            }
            TypeCategory::Boolean => Value::Bool(self.rng.random_bool(0.5)),
            TypeCategory::Timestamp => Value::Timestamp(self.past_instant()),
            TypeCategory::Date => Value::Date(self.past_instant().date()),
            TypeCategory::Time => {
                let secs = self.rng.random_range(0..SECONDS_PER_DAY);
                Value::Time(NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default())
            }
            TypeCategory::Uuid => Value::Uuid(self.uuid()),
            TypeCategory::Json => {
                let label: String = Word().fake_with_rng(&mut self.rng);
                Value::Json(serde_json::json!({
                    "label": label,
                    "score": self.rng.random_range(1..=100),
                    "active": self.rng.random_bool(0.5),
                }))
            }
            TypeCategory::Text => {
                let word: String = Word().fake_with_rng(&mut self.rng);
                owned(word)
            }
            TypeCategory::Unsupported => return None,
        };
        Some(value)
    }

    /// A random instant within the year before `base_time`.
    fn past_instant(&mut self) -> NaiveDateTime {
        let seconds_ago = self.rng.random_range(0..SECONDS_PER_YEAR);
        self.base_time - ChronoDuration::seconds(seconds_ago)
    }
}

fn limit(text: String, max_length: Option<u32>) -> String {
    match max_length {
        Some(max) => truncate_chars(text, max as usize),
        None => text,
    }
}
