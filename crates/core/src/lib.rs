//! Core library for the Arcade Verse hub.
//!
//! The crate holds every subsystem behind the terminal front end: the
//! synthesized audio engine and its step sequencer, the game session host
//! and its mini-games, the trivia question loader, the best-score book and
//! the hub that routes between screens. Time is virtual throughout; owners
//! drive everything with `advance` calls.

pub mod audio;
pub mod config;
pub mod error;
pub mod games;
pub mod hub;
pub mod scores;
pub mod session;
pub mod timeline;
pub mod trivia;

pub use audio::{
    probe::{BlockSummary, SpectralProbe},
    tone::{ToneRequest, Waveform},
    AudioEngine,
};
pub use config::{AppConfig, AudioConfig, OutputTarget};
pub use error::{ArcadeError, Result};
pub use games::{Difficulty, GameDescriptor, GameKind, GameSelection};
pub use hub::{Character, Hub, ResultSummary, Screen, CHARACTERS};
pub use scores::{ScoreBook, ScoreRecord};
pub use session::{Direction, GameInput, GameSession, Loaded, Session, SessionHost};
pub use timeline::{PlaybackClock, TimerId, TimerQueue};
pub use trivia::{TriviaError, TriviaQuestion, TriviaSource};
