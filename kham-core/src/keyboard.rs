//! On-screen keyboard generation.
//!
//! A keyboard holds one tile per distinct symbol of the target word plus
//! random decoys, grouped as consonants followed by vowel/tone marks.
//!
//! ```text
//! word "ปลา" ──► distinct {ป, ล, า}
//!                 consonants {ป, ล} + 10 decoys ──shuffle──┐
//!                 vowels     {า}    +  3 decoys ──shuffle──┴──► 16 tiles
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alphabet::{tile_image_ref, Alphabet};
use crate::config::{GameConfig, DEFAULT_CONSONANT_TILES, DEFAULT_VOWEL_TILES};

/// Which keyboard block a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileClass {
    /// Consonant block.
    Consonant,
    /// Vowel and tone-mark block.
    VowelOrTone,
}

/// A selectable keyboard symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// The symbol (one Unicode codepoint).
    pub symbol: char,
    /// Keyboard block.
    pub class: TileClass,
    /// Whether the target word uses this symbol.
    pub required: bool,
}

impl Tile {
    /// Artwork for the tile, if any.
    #[must_use]
    pub fn image_ref(&self) -> Option<String> {
        tile_image_ref(self.symbol)
    }
}

/// The tiles generated for one word, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardTileSet {
    tiles: Vec<Tile>,
}

impl KeyboardTileSet {
    /// Tiles in display order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Symbols in display order.
    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.tiles.iter().map(|t| t.symbol)
    }

    /// Tiles the word needs.
    pub fn required(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.required)
    }

    /// Decoy tiles.
    pub fn decoys(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| !t.required)
    }

    /// Tiles of one block.
    pub fn class(&self, class: TileClass) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(move |t| t.class == class)
    }

    /// Whether a symbol has a tile.
    #[must_use]
    pub fn contains(&self, symbol: char) -> bool {
        self.tiles.iter().any(|t| t.symbol == symbol)
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether there are no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Distinct codepoints of a word in first-occurrence order.
#[must_use]
pub fn distinct_symbols(word: &str) -> Vec<char> {
    let mut seen = Vec::new();
    for symbol in word.chars() {
        if !seen.contains(&symbol) {
            seen.push(symbol);
        }
    }
    seen
}

/// Builds keyboards with a minimum tile count per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardGenerator {
    consonant_target: usize,
    vowel_target: usize,
}

impl KeyboardGenerator {
    /// Create a generator with explicit block sizes.
    #[must_use]
    pub const fn new(consonant_target: usize, vowel_target: usize) -> Self {
        Self {
            consonant_target,
            vowel_target,
        }
    }

    /// Create a generator from game configuration.
    #[must_use]
    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(config.consonant_tiles, config.vowel_tiles)
    }

    /// Generate a keyboard using the thread-local RNG.
    #[must_use]
    pub fn generate(&self, word: &str, alphabet: &Alphabet) -> KeyboardTileSet {
        self.generate_with(word, alphabet, &mut rand::thread_rng())
    }

    /// Generate a keyboard with a caller-supplied RNG.
    ///
    /// Targets are floors on the block size: a word needing more symbols than
    /// the target keeps all of them and gets no decoys. Decoys stop early when
    /// a pool runs out.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        word: &str,
        alphabet: &Alphabet,
        rng: &mut R,
    ) -> KeyboardTileSet {
        let symbols = distinct_symbols(word);
        let (consonants, vowels): (Vec<char>, Vec<char>) = symbols
            .iter()
            .copied()
            .partition(|&c| alphabet.is_consonant(c));

        let mut consonant_block = Self::block(
            &consonants,
            &alphabet.consonants,
            &symbols,
            self.consonant_target,
            TileClass::Consonant,
            rng,
        );
        let vowel_block = Self::block(
            &vowels,
            &alphabet.vowels_and_tones,
            &symbols,
            self.vowel_target,
            TileClass::VowelOrTone,
            rng,
        );

        tracing::debug!(
            word,
            consonants = consonant_block.len(),
            vowels = vowel_block.len(),
            "Generated keyboard"
        );

        consonant_block.extend(vowel_block);
        KeyboardTileSet {
            tiles: consonant_block,
        }
    }

    fn block<R: Rng + ?Sized>(
        required: &[char],
        pool: &[char],
        word_symbols: &[char],
        target: usize,
        class: TileClass,
        rng: &mut R,
    ) -> Vec<Tile> {
        let needed = target.saturating_sub(required.len());

        let mut candidates: Vec<char> = pool
            .iter()
            .copied()
            .filter(|c| !word_symbols.contains(c))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut tiles: Vec<Tile> = required
            .iter()
            .map(|&symbol| Tile {
                symbol,
                class,
                required: true,
            })
            .collect();
        tiles.extend(
            candidates
                .choose_multiple(rng, needed)
                .map(|&symbol| Tile {
                    symbol,
                    class,
                    required: false,
                }),
        );
        tiles.shuffle(rng);
        tiles
    }
}

impl Default for KeyboardGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CONSONANT_TILES, DEFAULT_VOWEL_TILES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_distinct_symbols_keeps_first_occurrence_order() {
        assert_eq!(distinct_symbols("มะม่วง"), vec!['ม', 'ะ', '่', 'ว', 'ง']);
        assert!(distinct_symbols("").is_empty());
    }

    #[test]
    fn test_ka_contains_both_symbols() {
        let generator = KeyboardGenerator::default();
        let alphabet = Alphabet::thai();
        for seed in 0..50 {
            let keyboard = generator.generate_with("กา", &alphabet, &mut rng(seed));
            assert!(keyboard.contains('ก'));
            assert!(keyboard.contains('า'));
            assert_eq!(keyboard.len(), 16);
        }
    }

    #[test]
    fn test_layout_consonants_then_vowels() {
        let keyboard =
            KeyboardGenerator::default().generate_with("ปลา", &Alphabet::thai(), &mut rng(7));
        let classes: Vec<TileClass> = keyboard.tiles().iter().map(|t| t.class).collect();
        assert_eq!(classes[..12], [TileClass::Consonant; 12]);
        assert_eq!(classes[12..], [TileClass::VowelOrTone; 4]);
        assert_eq!(keyboard.required().count(), 3);
        assert_eq!(keyboard.decoys().count(), 13);
    }

    #[test]
    fn test_repeated_letters_get_one_tile() {
        let keyboard =
            KeyboardGenerator::default().generate_with("แมงมุม", &Alphabet::thai(), &mut rng(1));
        let m_tiles = keyboard.symbols().filter(|&c| c == 'ม').count();
        assert_eq!(m_tiles, 1);
    }

    #[test]
    fn test_unknown_marks_land_in_vowel_block() {
        // ็ and ์ are not in either pool but still need tiles.
        let keyboard =
            KeyboardGenerator::default().generate_with("ดวงจันทร์", &Alphabet::thai(), &mut rng(3));
        let vowels: Vec<char> = keyboard
            .class(TileClass::VowelOrTone)
            .map(|t| t.symbol)
            .collect();
        assert!(vowels.contains(&'ั'));
        assert!(vowels.contains(&'์'));
        assert_eq!(vowels.len(), 4);
    }

    #[test]
    fn test_target_is_floor_not_cap() {
        let generator = KeyboardGenerator::new(2, 1);
        let keyboard = generator.generate_with("มอเตอร์ไซค์", &Alphabet::thai(), &mut rng(9));
        // ม อ ต ร ซ ค are consonants: all kept, no decoys
        assert_eq!(keyboard.class(TileClass::Consonant).count(), 6);
        assert_eq!(keyboard.decoys().count(), 0);
    }

    #[test]
    fn test_small_pools_terminate() {
        let alphabet = Alphabet::new(['ก', 'ข'], ['า']);
        let keyboard = KeyboardGenerator::default().generate_with("กา", &alphabet, &mut rng(0));
        assert_eq!(keyboard.len(), 3);
        assert!(keyboard.contains('ข'));
    }

    #[test]
    fn test_empty_pools() {
        let alphabet = Alphabet::new([], []);
        let keyboard = KeyboardGenerator::default().generate_with("กา", &alphabet, &mut rng(0));
        // no consonant pool: every symbol falls into the second block
        assert_eq!(keyboard.len(), 2);
        assert!(keyboard.tiles().iter().all(|t| t.required));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let generator = KeyboardGenerator::default();
        let alphabet = Alphabet::thai();
        let a = generator.generate_with("เต่า", &alphabet, &mut rng(42));
        let b = generator.generate_with("เต่า", &alphabet, &mut rng(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tile_image_refs() {
        let tile = Tile {
            symbol: 'ก',
            class: TileClass::Consonant,
            required: true,
        };
        assert_eq!(tile.image_ref().as_deref(), Some("consonants/1.png"));
    }

    fn thai_word() -> impl Strategy<Value = String> {
        let mut symbols: Vec<char> = crate::alphabet::THAI_CONSONANTS.to_vec();
        symbols.extend_from_slice(crate::alphabet::THAI_VOWELS_AND_TONES);
        symbols.extend(['็', '์']);
        proptest::collection::vec(proptest::sample::select(symbols), 1..14)
            .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_tiles_cover_word(word in thai_word(), seed in any::<u64>()) {
            let keyboard = KeyboardGenerator::default()
                .generate_with(&word, &Alphabet::thai(), &mut rng(seed));
            for symbol in word.chars() {
                prop_assert!(keyboard.contains(symbol));
            }
            prop_assert!(keyboard.len() >= 16);
        }

        #[test]
        fn prop_tiles_unique(word in thai_word(), seed in any::<u64>()) {
            let keyboard = KeyboardGenerator::default()
                .generate_with(&word, &Alphabet::thai(), &mut rng(seed));
            let unique: HashSet<char> = keyboard.symbols().collect();
            prop_assert_eq!(unique.len(), keyboard.len());
            let required: HashSet<char> = keyboard.required().map(|t| t.symbol).collect();
            let expected: HashSet<char> = word.chars().collect();
            prop_assert_eq!(required, expected);
        }
    }
}
