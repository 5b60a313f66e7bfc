//! Fake music sheet generator
//!
//! Produces plausible-looking sheets for the background producer. Seeding
//! makes the output reproducible in tests.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::MusicSheet;
use crate::producer::RecordGenerator;

const KEYS: &[&str] = &["C", "G", "Dm", "Am", "F"];

const INSTRUMENTS: &[&str] = &["Piano", "Guitar", "Violin", "Drums", "Flute"];

const GENRES: &[&str] = &[
    "Rock", "Pop", "Jazz", "Classical", "Blues", "Country", "Electronic", "Folk", "Hip Hop",
    "Latin", "Reggae", "Metal", "Soul", "Funk", "Soundtrack", "World",
];

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipisci", "velit", "sed",
    "quia", "non", "numquam", "eius", "modi", "tempora", "incidunt", "ut", "labore", "et",
    "dolore", "magnam", "aliquam", "quaerat", "voluptatem",
];

const FIRST_NAMES: &[&str] = &[
    "Clara", "Johann", "Fanny", "Frederic", "Amy", "Antonin", "Lili", "Maurice", "Florence",
    "Sergei", "Nadia", "Igor", "Hildegard", "Duke", "Nina", "Erik",
];

const LAST_NAMES: &[&str] = &[
    "Schumann", "Bach", "Mendelssohn", "Chopin", "Beach", "Dvorak", "Boulanger", "Ravel",
    "Price", "Rachmaninoff", "Stravinsky", "Ellington", "Simone", "Satie", "Smyth", "Holst",
];

/// Years back from the current year a generated sheet may date from
const YEAR_SPAN: i32 = 50;

const MUSIC_FILE_PLACEHOLDER: &str = "string";

/// Generator of random music sheets
pub struct FakeSheetGenerator {
    rng: Mutex<StdRng>,
    user_id: u64,
}

impl FakeSheetGenerator {
    /// Create a generator seeded from the OS
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            user_id: 0,
        }
    }

    /// Attribute generated sheets to a user
    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Generate `count` sheets
    pub fn generate(&self, count: usize) -> Vec<MusicSheet> {
        (0..count).map(|_| self.generate_one()).collect()
    }
}

impl Default for FakeSheetGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordGenerator for FakeSheetGenerator {
    type Record = MusicSheet;

    fn generate_one(&self) -> MusicSheet {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rng = &mut *rng;

        MusicSheet {
            id: 0,
            title: sentence(rng, 3),
            composer: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
            year: current_year() - rng.gen_range(0..YEAR_SPAN),
            key: pick(rng, KEYS).to_string(),
            genres: (0..2).map(|_| pick(rng, GENRES).to_string()).collect(),
            instruments: (0..2).map(|_| pick(rng, INSTRUMENTS).to_string()).collect(),
            music_file_url: MUSIC_FILE_PLACEHOLDER.to_string(),
            user_id: self.user_id,
        }
    }
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items[rng.gen_range(0..items.len())]
}

/// Capitalized sentence of `words` lorem words ending in a period
fn sentence<R: Rng>(rng: &mut R, words: usize) -> String {
    let mut text = (0..words)
        .map(|_| pick(rng, LOREM))
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn current_year() -> i32 {
    const SECS_PER_YEAR: u64 = 31_556_952;
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    1970 + (secs / SECS_PER_YEAR) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generators_agree() {
        let a = FakeSheetGenerator::with_seed(42).generate(5);
        let b = FakeSheetGenerator::with_seed(42).generate(5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_fields_in_range() {
        let generator = FakeSheetGenerator::with_seed(7).user_id(3);
        let year = current_year();

        for sheet in generator.generate(50) {
            assert!(sheet.title.ends_with('.'));
            assert!(sheet.title.chars().next().unwrap().is_ascii_uppercase());
            assert_eq!(sheet.title.split(' ').count(), 3);
            assert!(sheet.year > year - YEAR_SPAN && sheet.year <= year);
            assert!(KEYS.contains(&sheet.key.as_str()));
            assert_eq!(sheet.genres.len(), 2);
            assert_eq!(sheet.instruments.len(), 2);
            assert!(sheet
                .instruments
                .iter()
                .all(|i| INSTRUMENTS.contains(&i.as_str())));
            assert_eq!(sheet.music_file_url, "string");
            assert_eq!(sheet.user_id, 3);
            assert_eq!(sheet.id, 0);
        }
    }
}
