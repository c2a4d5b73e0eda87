//! Thai symbol pools used to pad the on-screen keyboard, and tile artwork lookup.

use serde::{Deserialize, Serialize};

/// Consonants offered as decoy tiles (the 41 in everyday use).
pub const THAI_CONSONANTS: &[char] = &[
    'ก', 'ข', 'ค', 'ง', 'จ', 'ฉ', 'ช', 'ซ', 'ฌ', 'ญ', 'ฎ', 'ฏ', 'ฐ', 'ฑ', 'ฒ', 'ณ', 'ด', 'ต', 'ถ',
    'ท', 'ธ', 'น', 'บ', 'ป', 'ผ', 'ฝ', 'พ', 'ฟ', 'ภ', 'ม', 'ย', 'ร', 'ล', 'ว', 'ศ', 'ษ', 'ส', 'ห',
    'ฬ', 'อ', 'ฮ',
];

/// Vowel and tone marks offered as decoy tiles.
pub const THAI_VOWELS_AND_TONES: &[char] = &[
    'ะ', 'า', 'ิ', 'ี', 'ึ', 'ื', 'ุ', 'ู', 'เ', 'แ', 'โ', 'ใ', 'ไ', 'ำ', 'ั', '่', '้', '๊', '๋',
];

/// Full 44-letter consonant table in dictionary order; position + 1 is the tile artwork number.
const CONSONANT_ARTWORK: &[char] = &[
    'ก', 'ข', 'ฃ', 'ค', 'ฅ', 'ฆ', 'ง', 'จ', 'ฉ', 'ช', 'ซ', 'ฌ', 'ญ', 'ฎ', 'ฏ', 'ฐ', 'ฑ', 'ฒ', 'ณ',
    'ด', 'ต', 'ถ', 'ท', 'ธ', 'น', 'บ', 'ป', 'ผ', 'ฝ', 'พ', 'ฟ', 'ภ', 'ม', 'ย', 'ร', 'ล', 'ว', 'ศ',
    'ษ', 'ส', 'ห', 'ฬ', 'อ', 'ฮ',
];

const VOWEL_ARTWORK: &[(char, u8)] = &[
    ('ะ', 1),
    ('า', 2),
    ('ิ', 3),
    ('ี', 4),
    ('ึ', 5),
    ('ื', 6),
    ('ุ', 7),
    ('ู', 8),
    ('เ', 10),
    ('แ', 12),
    ('โ', 14),
    ('ฤ', 29),
    ('ฦ', 31),
    ('ำ', 25),
    ('ใ', 26),
    ('ไ', 27),
    ('่', 32),
    ('้', 33),
    ('๊', 34),
    ('๋', 35),
];

/// The two symbol pools a keyboard is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alphabet {
    /// Symbols classified as consonants.
    pub consonants: Vec<char>,
    /// Vowel and tone marks.
    pub vowels_and_tones: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from arbitrary pools.
    pub fn new(
        consonants: impl IntoIterator<Item = char>,
        vowels_and_tones: impl IntoIterator<Item = char>,
    ) -> Self {
        Self {
            consonants: consonants.into_iter().collect(),
            vowels_and_tones: vowels_and_tones.into_iter().collect(),
        }
    }

    /// The Thai pools.
    #[must_use]
    pub fn thai() -> Self {
        Self::new(
            THAI_CONSONANTS.iter().copied(),
            THAI_VOWELS_AND_TONES.iter().copied(),
        )
    }

    /// Whether a symbol belongs to the consonant pool.
    #[must_use]
    pub fn is_consonant(&self, symbol: char) -> bool {
        self.consonants.contains(&symbol)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::thai()
    }
}

/// Artwork for a Thai keyboard tile, if the game ships one.
///
/// Consonants are looked up first, so `อ` resolves to its consonant picture.
#[must_use]
pub fn tile_image_ref(symbol: char) -> Option<String> {
    if let Some(pos) = CONSONANT_ARTWORK.iter().position(|&c| c == symbol) {
        return Some(format!("consonants/{}.png", pos + 1));
    }
    VOWEL_ARTWORK
        .iter()
        .find(|(c, _)| *c == symbol)
        .map(|(_, n)| format!("vowels/{n}.png"))
}
