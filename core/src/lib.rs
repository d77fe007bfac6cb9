pub mod animation;
pub mod catalog;
pub mod celebration;
pub mod completion;
pub mod config;
pub mod drag;
pub mod element_id;
pub mod error;
pub mod geometry;
pub mod hit_zone;
pub mod registry;
pub mod scene;
pub mod session;
pub mod stats;
pub mod surface;
pub mod timer;

pub use catalog::{CatalogCache, Difficulty, PuzzleSummary, RawPuzzle};
pub use config::EngineConfig;
pub use element_id::{ElementIdError, ElementRole, PieceId};
pub use error::{PuzzleError, PuzzleResult};
pub use geometry::{distance, Affine, BBox, ClientRect, Point, ViewBox, ViewportMapping};
pub use registry::{PieceIndex, SkipReason, SkippedPiece};
pub use scene::SvgScene;
pub use session::{
    CompletionSummary, DragRejected, DropOutcome, LoadReport, PuzzleSession, SessionEvent,
};
pub use stats::{CompletionRecord, KeyValueStore, MemoryStore, PuzzleStats, StatsStore};
pub use surface::{PulseFrame, PuzzleSurface};
pub use timer::{format_clock, SessionTimer};
