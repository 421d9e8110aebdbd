//! # SLG Common Library
//!
//! Game engine shared by all SLG front-ends:
//! - Catalogue loading and name lookup
//! - Feedback oracle and candidate pruning
//! - Entropy-based move selection
//! - Game session state and snapshots
//! - Reranker seam (inference context, history encoding)
//! - Configuration loading

pub mod catalogue;
pub mod config;
pub mod error;
pub mod feedback;
pub mod pruner;
pub mod rerank;
pub mod resolve;
pub mod selector;
pub mod session;
pub mod snapshot;

pub use catalogue::{Artist, Catalogue, Dataset, Live, LoadPolicy, Song};
pub use error::{Error, IdentifierKind, Result};
pub use feedback::{Feedback, INVALID_FEEDBACK_CODE};
pub use resolve::{ExactResolver, FuzzyResolver, NameResolver};
pub use selector::MoveScore;
pub use session::{GameSession, GameStatus, HistoryEntry};
pub use snapshot::SessionSnapshot;

/// Catalogue identifier of a song
pub type SongId = String;
/// Catalogue identifier of an artist
pub type ArtistId = String;
/// Catalogue identifier of a live
pub type LiveId = String;
