//! # Kham Core
//!
//! Game logic for a Thai vocabulary spelling game: the player hears a word,
//! sees its picture and spells it from a keyboard of letter tiles. Levels
//! unlock one at a time as words are learned.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Game                            │
//! │          (async: awaits saves, wrong-answer delay)      │
//! ├──────────────────────────────┬──────────────────────────┤
//! │  GameSession                 │  ProgressSync            │
//! │  - Lexicon / Alphabet        │  - serialized writes     │
//! │  - KeyboardGenerator         │  - latest-wins pending   │
//! │  - AnswerSession             │  - fallback loads        │
//! │  - ProgressState             ├──────────────────────────┤
//! │  - UnlockController          │  SyncGateway             │
//! │                              │  - MemoryGateway         │
//! │                              │  - HttpGateway (http)    │
//! └──────────────────────────────┴──────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alphabet;
pub mod answer;
pub mod config;
pub mod error;
pub mod game;
pub mod gateway;
pub mod keyboard;
pub mod lexicon;
pub mod progress;
pub mod schema;
pub mod session;
pub mod sync;
pub mod unlock;
pub mod validation;

#[cfg(feature = "http")]
pub mod http_gateway;

pub use alphabet::Alphabet;
pub use answer::{AnswerSession, TapAction};
pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use game::Game;
pub use gateway::{GatewayError, MemoryGateway, Profile, ProfileUpdate, SyncGateway};
pub use keyboard::{KeyboardGenerator, KeyboardTileSet, Tile, TileClass};
pub use lexicon::{LevelDefinition, LevelId, Lexicon, WordEntry};
pub use progress::{Grade, ProgressState, ProgressSummary};
pub use schema::{
    CharacterId, LeaderboardEntry, Period, ProgressDocument, PublicUser, UserDocument,
};
pub use session::{Advance, GameSession, SubmitOutcome, WordPosition};
pub use sync::{ProgressSync, SaveOutcome, SyncStats};
pub use unlock::{LevelStatus, Surface, UnlockController};
pub use validation::ValidationError;

#[cfg(feature = "http")]
pub use http_gateway::HttpGateway;

/// Kham core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
