//! Static level table: levels, their names, and their ordered word entries.
//!
//! Word order inside a level is the canonical index used by progress
//! tracking, so a [`Lexicon`] never reorders or mutates its entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Identifier of a level. Level ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LevelId(u32);

impl LevelId {
    /// The first level, unlocked for every new player.
    pub const FIRST: Self = Self(1);

    /// Create a level id, rejecting zero.
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The following level.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The preceding level, if any.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }
}

impl TryFrom<u32> for LevelId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "level id must be at least 1".to_string())
    }
}

impl From<LevelId> for u32 {
    fn from(id: LevelId) -> Self {
        id.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One vocabulary word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// Target word; both the correct answer and the audio lookup key.
    pub text: String,
    /// Illustration shown while the word is played.
    pub image_ref: String,
}

impl WordEntry {
    /// Create a word entry.
    pub fn new(text: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_ref: image_ref.into(),
        }
    }
}

/// A themed group of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Level id (1-based, contiguous within a lexicon).
    pub id: LevelId,
    /// Display name.
    pub name: String,
    /// Folder holding one `{word}.mp3` per word.
    #[serde(default)]
    pub audio_folder: String,
    /// Words in canonical order.
    pub words: Vec<WordEntry>,
}

impl LevelDefinition {
    /// Audio reference for a word of this level.
    #[must_use]
    pub fn audio_ref(&self, word: &WordEntry) -> String {
        if self.audio_folder.is_empty() {
            format!("{}.mp3", word.text)
        } else {
            format!("{}/{}.mp3", self.audio_folder, word.text)
        }
    }

    /// Number of words in the level.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// Read-only table of levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelDefinition>", into = "Vec<LevelDefinition>")]
pub struct Lexicon {
    levels: Vec<LevelDefinition>,
}

impl Lexicon {
    /// Build a lexicon from level definitions.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLexicon`] if the table is empty, a level has
    /// no words, or ids are not `1..=n` in order.
    pub fn from_levels(levels: Vec<LevelDefinition>) -> GameResult<Self> {
        if levels.is_empty() {
            return Err(GameError::InvalidLexicon("no levels".into()));
        }
        for (position, level) in levels.iter().enumerate() {
            let expected = u32::try_from(position + 1)
                .map_err(|_| GameError::InvalidLexicon("too many levels".into()))?;
            if level.id.get() != expected {
                return Err(GameError::InvalidLexicon(format!(
                    "level ids must be contiguous from 1: expected {expected}, found {}",
                    level.id
                )));
            }
            if level.words.is_empty() {
                return Err(GameError::InvalidLexicon(format!(
                    "level {} has no words",
                    level.id
                )));
            }
        }
        Ok(Self { levels })
    }

    /// Parse a lexicon from a JSON array of level definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the table is invalid.
    pub fn from_json(json: &str) -> GameResult<Self> {
        let levels: Vec<LevelDefinition> = serde_json::from_str(json)?;
        Self::from_levels(levels)
    }

    /// The built-in Thai level table.
    #[must_use]
    pub fn thai() -> Self {
        let levels = THAI_LEVELS
            .iter()
            .zip(1_u32..)
            .map(|((name, folder, words), id)| LevelDefinition {
                id: LevelId(id),
                name: (*name).to_string(),
                audio_folder: (*folder).to_string(),
                words: words
                    .iter()
                    .map(|(text, image)| WordEntry::new(*text, *image))
                    .collect(),
            })
            .collect();
        Self { levels }
    }

    /// Look up a level.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::LevelNotFound`] for ids beyond the table.
    pub fn get_level(&self, id: LevelId) -> GameResult<&LevelDefinition> {
        usize::try_from(id.get() - 1)
            .ok()
            .and_then(|i| self.levels.get(i))
            .ok_or(GameError::LevelNotFound(id))
    }

    /// Look up a word by level and index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::LevelNotFound`] or [`GameError::WordOutOfRange`].
    pub fn get_word(&self, level: LevelId, index: usize) -> GameResult<&WordEntry> {
        let def = self.get_level(level)?;
        def.words.get(index).ok_or(GameError::WordOutOfRange {
            level,
            index,
            len: def.words.len(),
        })
    }

    /// Highest level id.
    #[must_use]
    pub fn max_level(&self) -> LevelId {
        self.levels.last().map_or(LevelId::FIRST, |l| l.id)
    }

    /// Number of levels.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of words in a level; zero for unknown levels.
    #[must_use]
    pub fn word_count(&self, level: LevelId) -> usize {
        self.get_level(level).map_or(0, LevelDefinition::word_count)
    }

    /// All levels in order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }

    /// Index of a word within a level by its text.
    #[must_use]
    pub fn find_index(&self, level: LevelId, text: &str) -> Option<usize> {
        self.get_level(level)
            .ok()?
            .words
            .iter()
            .position(|w| w.text == text)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::thai()
    }
}

impl TryFrom<Vec<LevelDefinition>> for Lexicon {
    type Error = GameError;

    fn try_from(levels: Vec<LevelDefinition>) -> Result<Self, Self::Error> {
        Self::from_levels(levels)
    }
}

impl From<Lexicon> for Vec<LevelDefinition> {
    fn from(lexicon: Lexicon) -> Self {
        lexicon.levels
    }
}

type LevelRow = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const THAI_LEVELS: &[LevelRow] = &[
    (
        "หมวดสัตว์",
        "เสียงคำตอบ/สัตว์",
        &[
            ("กา", "ภาพประกอบ คำศัพท์/2.png"),
            ("งู", "ภาพประกอบ คำศัพท์/3.png"),
            ("ม้า", "ภาพประกอบ คำศัพท์/4.png"),
            ("ปลา", "ภาพประกอบ คำศัพท์/5.png"),
            ("หมา", "ภาพประกอบ คำศัพท์/6.png"),
            ("แมว", "ภาพประกอบ คำศัพท์/7.png"),
            ("กบ", "ภาพประกอบ คำศัพท์/8.png"),
            ("เต่า", "ภาพประกอบ คำศัพท์/9.png"),
            ("นก", "ภาพประกอบ คำศัพท์/10.png"),
            ("มด", "ภาพประกอบ คำศัพท์/11.png"),
        ],
    ),
    (
        "หมวดสิ่งของ",
        "เสียงคำตอบ/สิ่งของ",
        &[
            ("รถ", "ภาพประกอบ คำศัพท์/13.png"),
            ("ถัง", "ภาพประกอบ คำศัพท์/14.png"),
            ("ไม้", "ภาพประกอบ คำศัพท์/15.png"),
            ("ตู้", "ภาพประกอบ คำศัพท์/16.png"),
            ("โต๊ะ", "ภาพประกอบ คำศัพท์/17.png"),
            ("ถ้วย", "ภาพประกอบ คำศัพท์/18.png"),
            ("ซ่อม", "ภาพประกอบ คำศัพท์/19.png"),
            ("หม้อ", "ภาพประกอบ คำศัพท์/20.png"),
            ("ช้อน", "ภาพประกอบ คำศัพท์/21.png"),
            ("แก้ว", "ภาพประกอบ คำศัพท์/22.png"),
        ],
    ),
    (
        "หมวดร่างกาย",
        "เสียงคำตอบ/ร่างกาย",
        &[
            ("ตา", "ภาพประกอบ คำศัพท์/24.png"),
            ("หู", "ภาพประกอบ คำศัพท์/25.png"),
            ("ปาก", "ภาพประกอบ คำศัพท์/26.png"),
            ("มือ", "ภาพประกอบ คำศัพท์/27.png"),
            ("เท้า", "ภาพประกอบ คำศัพท์/28.png"),
            ("ขา", "ภาพประกอบ คำศัพท์/29.png"),
            ("ผม", "ภาพประกอบ คำศัพท์/30.png"),
            ("ฟัน", "ภาพประกอบ คำศัพท์/31.png"),
            ("คอ", "ภาพประกอบ คำศัพท์/32.png"),
            ("จมูก", "ภาพประกอบ คำศัพท์/33.png"),
        ],
    ),
    (
        "หมวดธรรมชาติ",
        "เสียงคำตอบ/ธรรมชาติ",
        &[
            ("ฟ้า", "ภาพประกอบ คำศัพท์/35.png"),
            ("ดิน", "ภาพประกอบ คำศัพท์/36.png"),
            ("น้ำ", "ภาพประกอบ คำศัพท์/37.png"),
            ("ไฟ", "ภาพประกอบ คำศัพท์/38.png"),
            ("ลม", "ภาพประกอบ คำศัพท์/39.png"),
            ("เมฆ", "ภาพประกอบ คำศัพท์/40.png"),
            ("ดาว", "ภาพประกอบ คำศัพท์/41.png"),
            ("ภูเขา", "ภาพประกอบ คำศัพท์/42.png"),
            ("หนาว", "ภาพประกอบ คำศัพท์/43.png"),
            ("ร้อน", "ภาพประกอบ คำศัพท์/44.png"),
        ],
    ),
    (
        "หมวดคนรอบตัว",
        "เสียงคำตอบ/คนรอบตัว",
        &[
            ("พ่อ", "ภาพประกอบ คำศัพท์/46.png"),
            ("แม่", "ภาพประกอบ คำศัพท์/47.png"),
            ("ป้า", "ภาพประกอบ คำศัพท์/48.png"),
            ("ลุง", "ภาพประกอบ คำศัพท์/49.png"),
            ("น้า", "ภาพประกอบ คำศัพท์/50.png"),
            ("พี่", "ภาพประกอบ คำศัพท์/51.png"),
            ("น้อง", "ภาพประกอบ คำศัพท์/52.png"),
            ("ครู", "ภาพประกอบ คำศัพท์/53.png"),
            ("เพื่อน", "ภาพประกอบ คำศัพท์/54.png"),
            ("ยาย", "ภาพประกอบ คำศัพท์/55.png"),
        ],
    ),
    (
        "คำ 2 พยางค์",
        "เสียงคำตอบ/คำ 2 พยางค์",
        &[
            ("ดอกไม้", "ภาพประกอบ คำศัพท์/57.png"),
            ("ต้นไม้", "ภาพประกอบ คำศัพท์/58.png"),
            ("กระเป๋า", "ภาพประกอบ คำศัพท์/59.png"),
            ("ดินสอ", "ภาพประกอบ คำศัพท์/60.png"),
            ("ยางลบ", "ภาพประกอบ คำศัพท์/61.png"),
            ("รถไฟ", "ภาพประกอบ คำศัพท์/62.png"),
            ("ลำโพง", "ภาพประกอบ คำศัพท์/63.png"),
            ("เต้นรำ", "ภาพประกอบ คำศัพท์/64.png"),
            ("แต่งงาน", "ภาพประกอบ คำศัพท์/65.png"),
            ("ปลูกผัก", "ภาพประกอบ คำศัพท์/66.png"),
        ],
    ),
    (
        "คำอาหารและผลไม้",
        "เสียงคำตอบ/คำอาหารและผลไม้ + คำทั่วไป",
        &[
            ("มะนาว", "ภาพประกอบ คำศัพท์/68.png"),
            ("มะม่วง", "ภาพประกอบ คำศัพท์/69.png"),
            ("มะเขือ", "ภาพประกอบ คำศัพท์/70.png"),
            ("กล้วย", "ภาพประกอบ คำศัพท์/71.png"),
            ("ขนมปัง", "ภาพประกอบ คำศัพท์/72.png"),
            ("ไก่ทอด", "ภาพประกอบ คำศัพท์/73.png"),
            ("บ้านเล็ก", "ภาพประกอบ คำศัพท์/74.png"),
            ("แมวน้อย", "ภาพประกอบ คำศัพท์/75.png"),
            ("หมาใหญ่", "ภาพประกอบ คำศัพท์/76.png"),
            ("น้ำหวาน", "ภาพประกอบ คำศัพท์/77.png"),
        ],
    ),
    (
        "หมวดผสม",
        "เสียงคำตอบ/หมวดธรรมชาติ + สิ่งของ + สัตว์ผสม",
        &[
            ("ผีเสื้อ", "ภาพประกอบ คำศัพท์/79.png"),
            ("แมงมุม", "ภาพประกอบ คำศัพท์/80.png"),
            ("เต่าทอง", "ภาพประกอบ คำศัพท์/81.png"),
            ("หลอดไฟ", "ภาพประกอบ คำศัพท์/82.png"),
            ("ดวงจันทร์", "ภาพประกอบ คำศัพท์/83.png"),
            ("ทะเล", "ภาพประกอบ คำศัพท์/84.png"),
            ("ภูเขาไฟ", "ภาพประกอบ คำศัพท์/85.png"),
            ("หนังสือ", "ภาพประกอบ คำศัพท์/86.png"),
            ("กล่อง", "ภาพประกอบ คำศัพท์/87.png"),
            ("เสื้อกันฝน", "ภาพประกอบ คำศัพท์/88.png"),
        ],
    ),
    (
        "หมวดโรงเรียน",
        "เสียงคำตอบ/หมวดโรงเรียน + ชีวิตประจำวัน",
        &[
            ("สมุด", "ภาพประกอบ คำศัพท์/90.png"),
            ("โต๊ะเรียน", "ภาพประกอบ คำศัพท์/91.png"),
            ("กระดานดำ", "ภาพประกอบ คำศัพท์/92.png"),
            ("ปากกาแดง", "ภาพประกอบ คำศัพท์/93.png"),
            ("ขวดน้ำ", "ภาพประกอบ คำศัพท์/94.png"),
            ("กล่องข้าว", "ภาพประกอบ คำศัพท์/95.png"),
            ("รองเท้า", "ภาพประกอบ คำศัพท์/96.png"),
            ("กระถาง", "ภาพประกอบ คำศัพท์/97.png"),
            ("รถบัส", "ภาพประกอบ คำศัพท์/98.png"),
            ("รถถัง", "ภาพประกอบ คำศัพท์/99.png"),
        ],
    ),
    (
        "คำยาวขึ้น",
        "เสียงคำตอบ/คำยาวขึ้นเล็กน้อย แต่ความหมายชัด",
        &[
            ("หุ่นยนต์", "ภาพประกอบ คำศัพท์/101.png"),
            ("เครื่องบิน", "ภาพประกอบ คำศัพท์/102.png"),
            ("จักรยาน", "ภาพประกอบ คำศัพท์/103.png"),
            ("มอเตอร์ไซค์", "ภาพประกอบ คำศัพท์/104.png"),
            ("ดอกทานตะวัน", "ภาพประกอบ คำศัพท์/105.png"),
            ("บ้านสองชั้น", "ภาพประกอบ คำศัพท์/106.png"),
            ("เรือดำน้ำ", "ภาพประกอบ คำศัพท์/107.png"),
            ("หมีขั้วโลก", "ภาพประกอบ คำศัพท์/108.png"),
            ("แม่น้ำ", "ภาพประกอบ คำศัพท์/109.png"),
            ("พระอาทิตย์", "ภาพประกอบ คำศัพท์/110.png"),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn level(id: u32) -> LevelId {
        LevelId::new(id).expect("non-zero")
    }

    #[test]
    fn test_level_id_rejects_zero() {
        assert!(LevelId::new(0).is_none());
        assert_eq!(LevelId::FIRST.get(), 1);
        assert_eq!(LevelId::FIRST.next().get(), 2);
        assert!(LevelId::FIRST.prev().is_none());
        assert_eq!(level(3).prev(), Some(level(2)));
    }

    #[test]
    fn test_level_id_serde() {
        let json = serde_json::to_string(&level(4)).expect("serialize");
        assert_eq!(json, "4");
        assert!(serde_json::from_str::<LevelId>("0").is_err());
    }

    #[test]
    fn test_thai_lexicon_shape() {
        let lexicon = Lexicon::thai();
        assert_eq!(lexicon.level_count(), 10);
        assert_eq!(lexicon.max_level(), level(10));
        for def in lexicon.levels() {
            assert_eq!(def.word_count(), 10, "level {}", def.id);
        }
    }

    #[test]
    fn test_get_word() {
        let lexicon = Lexicon::thai();
        let word = lexicon.get_word(LevelId::FIRST, 0).expect("word");
        assert_eq!(word.text, "กา");
        let def = lexicon.get_level(LevelId::FIRST).expect("level");
        assert_eq!(def.audio_ref(word), "เสียงคำตอบ/สัตว์/กา.mp3");
    }

    #[test]
    fn test_get_word_out_of_range() {
        let lexicon = Lexicon::thai();
        let err = lexicon.get_word(LevelId::FIRST, 10).unwrap_err();
        assert_eq!(
            err,
            GameError::WordOutOfRange {
                level: LevelId::FIRST,
                index: 10,
                len: 10
            }
        );
        assert_eq!(
            lexicon.get_level(level(11)).unwrap_err(),
            GameError::LevelNotFound(level(11))
        );
    }

    #[test]
    fn test_find_index() {
        let lexicon = Lexicon::thai();
        assert_eq!(lexicon.find_index(LevelId::FIRST, "ปลา"), Some(3));
        assert_eq!(lexicon.find_index(LevelId::FIRST, "รถ"), None);
    }

    #[test]
    fn test_custom_lexicon_arbitrary_sizes() {
        let json = r#"[
            {"id": 1, "name": "one", "words": [{"text": "กา", "image_ref": "a.png"}]},
            {"id": 2, "name": "two", "words": [
                {"text": "งู", "image_ref": "b.png"},
                {"text": "นก", "image_ref": "c.png"},
                {"text": "มด", "image_ref": "d.png"}
            ]}
        ]"#;
        let lexicon = Lexicon::from_json(json).expect("valid");
        assert_eq!(lexicon.level_count(), 2);
        assert_eq!(lexicon.word_count(level(1)), 1);
        assert_eq!(lexicon.word_count(level(2)), 3);
        assert_eq!(lexicon.word_count(level(3)), 0);
        let def = lexicon.get_level(level(2)).expect("level");
        assert_eq!(def.audio_ref(&def.words[0]), "งู.mp3");
    }

    #[test]
    fn test_invalid_lexicons() {
        assert!(Lexicon::from_levels(Vec::new()).is_err());

        let gap = r#"[{"id": 2, "name": "x", "words": [{"text": "a", "image_ref": ""}]}]"#;
        assert!(matches!(
            Lexicon::from_json(gap),
            Err(GameError::InvalidLexicon(_))
        ));

        let empty = r#"[{"id": 1, "name": "x", "words": []}]"#;
        assert!(matches!(
            Lexicon::from_json(empty),
            Err(GameError::InvalidLexicon(_))
        ));
    }
}
