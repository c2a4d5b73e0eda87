//! Persisted document shapes shared by the backend and HTTP clients.
//!
//! These are the JSON wire formats (camelCase, string level keys). Converting
//! a [`ProgressDocument`] into a [`ProgressState`] is the only place legacy
//! answered entries are accepted: stringified indices and word texts are
//! resolved to indices through the [`Lexicon`], anything else is dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lexicon::{LevelId, Lexicon};
use crate::progress::ProgressState;

/// Number of selectable player characters.
pub const CHARACTER_COUNT: u8 = 6;

/// A player avatar, 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CharacterId(u8);

impl CharacterId {
    /// Create a character id in `1..=6`.
    #[must_use]
    pub fn new(id: u8) -> Option<Self> {
        (1..=CHARACTER_COUNT).contains(&id).then_some(Self(id))
    }

    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Avatar artwork, `"{id}.png"`.
    #[must_use]
    pub fn image_ref(self) -> String {
        format!("{}.png", self.0)
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for CharacterId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("character id must be 1..={CHARACTER_COUNT}"))
    }
}

impl From<CharacterId> for u8 {
    fn from(id: CharacterId) -> Self {
        id.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leaderboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    /// Today.
    Daily,
    /// This week.
    Weekly,
    /// This month.
    Monthly,
    /// Since registration.
    AllTime,
}

impl Period {
    /// Every period.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::AllTime];

    /// Path segment and JSON value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "allTime",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown leaderboard period: {s}"))
    }
}

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Account id.
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Avatar.
    pub character_id: CharacterId,
    /// Avatar artwork.
    pub character_image: String,
    /// Sum of level scores from the last progress write.
    #[serde(default)]
    pub total_score: u32,
    /// Games played.
    #[serde(default)]
    pub games_played: u32,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserDocument {
    /// The record without its password hash.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            character_id: self.character_id,
            character_image: self.character_image.clone(),
            total_score: self.total_score,
            games_played: self.games_played,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Account record as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// Account id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Avatar.
    pub character_id: CharacterId,
    /// Avatar artwork.
    pub character_image: String,
    /// Sum of level scores.
    #[serde(default)]
    pub total_score: u32,
    /// Games played.
    #[serde(default)]
    pub games_played: u32,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One leaderboard row; at most one per (user, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Account id.
    pub user_id: String,
    /// Login name.
    pub username: String,
    /// Display name at submission time.
    pub display_name: String,
    /// Avatar at submission time.
    pub character_id: CharacterId,
    /// Submitted score.
    pub score: u32,
    /// Level reached.
    pub level: u32,
    /// Window.
    pub period: Period,
    /// Submission time.
    pub date: DateTime<Utc>,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Desired login name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Name shown to other players; defaults to the username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Chosen avatar, validated server-side.
    #[serde(default)]
    pub character_id: Option<i64>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Response of register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Human-readable result.
    pub message: String,
    /// Bearer token.
    pub token: String,
    /// The account.
    pub user: PublicUser,
}

/// Body of `PUT /api/user/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New avatar, validated server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<i64>,
}

/// Body of `POST /api/leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSubmission {
    /// Score to record.
    pub score: u32,
    /// Level reached.
    #[serde(default)]
    pub level: u32,
    /// Window, as its string form.
    pub period: String,
}

/// An answered-word entry as stored.
///
/// Current writers only emit indices; text forms come from older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnsweredEntry {
    /// Word index.
    Index(usize),
    /// Stringified index or word text.
    Text(String),
}

impl AnsweredEntry {
    fn resolve(&self, lexicon: &Lexicon, level: LevelId) -> Option<usize> {
        let count = lexicon.word_count(level);
        match self {
            Self::Index(i) => Some(*i).filter(|i| *i < count),
            Self::Text(text) => match text.trim().parse::<usize>() {
                Ok(i) => Some(i).filter(|i| *i < count),
                Err(_) => lexicon.find_index(level, text),
            },
        }
    }
}

fn first_level() -> u32 {
    LevelId::FIRST.get()
}

/// Stored progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    /// Owner; set by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// `[1, 2, ..., U]`.
    #[serde(default)]
    pub unlocked_levels: Vec<u32>,
    /// Level score snapshots by level key.
    #[serde(default)]
    pub level_scores: BTreeMap<String, u32>,
    /// Answered words by level key.
    #[serde(default)]
    pub answered_words: BTreeMap<String, Vec<AnsweredEntry>>,
    /// Levels played to the end.
    #[serde(default)]
    pub completed_levels: Vec<u32>,
    /// Last level entered.
    #[serde(default = "first_level")]
    pub current_level: u32,
    /// Unused by the game, which writes 0; the server keeps the highest value seen.
    #[serde(default)]
    pub total_stars: u32,
    /// Levels whose unlock notice was shown.
    #[serde(default)]
    pub acknowledged_notices: Vec<u32>,
    /// Last write time; set by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self::from_state(&ProgressState::default())
    }
}

impl ProgressDocument {
    /// Serialize a progress state.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            user_id: None,
            unlocked_levels: (1..=state.unlocked_level.get()).collect(),
            level_scores: state
                .level_scores
                .iter()
                .map(|(l, s)| (l.to_string(), *s))
                .collect(),
            answered_words: state
                .answered_words
                .iter()
                .map(|(l, set)| {
                    (
                        l.to_string(),
                        set.iter().copied().map(AnsweredEntry::Index).collect(),
                    )
                })
                .collect(),
            completed_levels: state.completed_levels.iter().map(|l| l.get()).collect(),
            current_level: state.current_level.get(),
            total_stars: 0,
            acknowledged_notices: state.acknowledged_notices.iter().map(|l| l.get()).collect(),
            updated_at: None,
        }
    }

    /// Normalize into a progress state.
    ///
    /// Unknown levels, out-of-range indices and unmatched word texts are
    /// dropped with a warning. The unlock frontier is the highest entry of
    /// `unlockedLevels`, clamped to the lexicon. Transient unlock bookkeeping
    /// is left empty; see [`crate::unlock::UnlockController::rederive`].
    #[must_use]
    pub fn into_state(&self, lexicon: &Lexicon) -> ProgressState {
        let known = |n: u32| LevelId::new(n).filter(|l| lexicon.get_level(*l).is_ok());
        let parse_key = |key: &str| key.trim().parse::<u32>().ok().and_then(known);

        let mut state = ProgressState::default();
        state.unlocked_level = self
            .unlocked_levels
            .iter()
            .copied()
            .filter_map(LevelId::new)
            .max()
            .unwrap_or(LevelId::FIRST)
            .min(lexicon.max_level());

        for (key, entries) in &self.answered_words {
            let Some(level) = parse_key(key) else {
                tracing::warn!(level = %key, "Dropping answered words for unknown level");
                continue;
            };
            let set = state.answered_words.entry(level).or_default();
            for entry in entries {
                match entry.resolve(lexicon, level) {
                    Some(index) => {
                        set.insert(index);
                    }
                    None => tracing::warn!(%level, ?entry, "Dropping unknown answered entry"),
                }
            }
        }
        state.answered_words.retain(|_, set| !set.is_empty());

        for (key, score) in &self.level_scores {
            match parse_key(key) {
                Some(level) => {
                    let cap = u32::try_from(lexicon.word_count(level)).unwrap_or(u32::MAX);
                    state.level_scores.insert(level, (*score).min(cap));
                }
                None => tracing::warn!(level = %key, "Dropping score for unknown level"),
            }
        }

        state.completed_levels = self.completed_levels.iter().copied().filter_map(known).collect();
        state.acknowledged_notices = self
            .acknowledged_notices
            .iter()
            .copied()
            .filter_map(known)
            .collect();
        state.current_level = known(self.current_level)
            .filter(|l| *l <= state.unlocked_level)
            .unwrap_or(LevelId::FIRST);
        state
    }

    /// Sum of level scores, saturating.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.level_scores
            .values()
            .fold(0, |total, score| total.saturating_add(*score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn level(n: u32) -> LevelId {
        LevelId::new(n).expect("non-zero")
    }

    #[test]
    fn test_character_id_bounds() {
        assert!(CharacterId::new(0).is_none());
        assert!(CharacterId::new(7).is_none());
        let id = CharacterId::new(6).expect("valid");
        assert_eq!(id.image_ref(), "6.png");
        assert!(serde_json::from_value::<CharacterId>(json!(9)).is_err());
    }

    #[test]
    fn test_period_strings() {
        assert_eq!("allTime".parse::<Period>(), Ok(Period::AllTime));
        assert_eq!(Period::Weekly.to_string(), "weekly");
        assert!("yearly".parse::<Period>().is_err());
        assert_eq!(
            serde_json::to_value(Period::AllTime).expect("serialize"),
            json!("allTime")
        );
    }

    #[test]
    fn test_document_shape() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        state.unlocked_level = level(3);
        state.record_correct(&lexicon, level(1), 2).expect("record");
        state.complete_level(level(1));

        let value = serde_json::to_value(ProgressDocument::from_state(&state)).expect("serialize");
        assert_eq!(value["unlockedLevels"], json!([1, 2, 3]));
        assert_eq!(value["answeredWords"], json!({"1": [2]}));
        assert_eq!(value["levelScores"], json!({"1": 1}));
        assert_eq!(value["completedLevels"], json!([1]));
        assert_eq!(value["totalStars"], json!(0));
        assert!(value.get("userId").is_none());
    }

    #[test]
    fn test_state_survives_document() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        state.unlocked_level = level(2);
        for i in [0, 4, 9] {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        state.record_correct(&lexicon, level(2), 1).expect("record");
        state.complete_level(level(1));
        state.acknowledged_notices.insert(level(2));
        state.current_level = level(2);

        let json = serde_json::to_string(&ProgressDocument::from_state(&state)).expect("serialize");
        let doc: ProgressDocument = serde_json::from_str(&json).expect("parse");
        assert_eq!(doc.into_state(&lexicon), state);
    }

    #[test]
    fn test_legacy_entries_normalize_to_indices() {
        let lexicon = Lexicon::thai();
        let first_word = lexicon.get_word(level(1), 0).expect("word").text.clone();
        let doc: ProgressDocument = serde_json::from_value(json!({
            "unlockedLevels": [1],
            "answeredWords": { "1": [3, "5", first_word, "not a word", 42] }
        }))
        .expect("parse");

        let state = doc.into_state(&lexicon);
        assert_eq!(state.answered(level(1)).collect::<Vec<_>>(), vec![0, 3, 5]);
    }

    #[test]
    fn test_unknown_levels_dropped() {
        let lexicon = Lexicon::thai();
        let doc: ProgressDocument = serde_json::from_value(json!({
            "unlockedLevels": [1, 2, 3, 99],
            "answeredWords": { "abc": [1], "12": [0] },
            "levelScores": { "0": 3, "2": 4 },
            "currentLevel": 7
        }))
        .expect("parse");

        let state = doc.into_state(&lexicon);
        assert_eq!(state.unlocked_level(), level(10));
        assert_eq!(state.answered_count(level(1)), 0);
        assert_eq!(state.level_score(level(2)), Some(4));
        assert_eq!(state.level_scores().len(), 1);
        assert_eq!(state.current_level(), level(7));
    }

    #[test]
    fn test_scores_clamped_to_word_count() {
        let lexicon = Lexicon::thai();
        let doc: ProgressDocument = serde_json::from_value(json!({
            "levelScores": { "1": 4_294_967_295_u32, "2": 1 }
        }))
        .expect("parse");
        assert_eq!(doc.total_score(), u32::MAX);

        let state = doc.into_state(&lexicon);
        let cap = u32::try_from(lexicon.word_count(level(1))).expect("fits");
        assert_eq!(state.level_score(level(1)), Some(cap));
        assert_eq!(state.level_score(level(2)), Some(1));
        assert_eq!(state.total_score(), cap + 1);
    }

    #[test]
    fn test_empty_document_is_fresh_state() {
        let doc: ProgressDocument = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(doc.into_state(&Lexicon::thai()), ProgressState::new());
    }

    #[test]
    fn test_public_user_hides_hash() {
        let user = UserDocument {
            id: "u1".to_string(),
            username: "somchai".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            display_name: "Somchai".to_string(),
            character_id: CharacterId::default(),
            character_image: CharacterId::default().image_ref(),
            total_score: 0,
            games_played: 0,
            created_at: Utc::now(),
            last_login_at: None,
        };
        let value = serde_json::to_value(user.public()).expect("serialize");
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["characterImage"], json!("1.png"));
    }
}
