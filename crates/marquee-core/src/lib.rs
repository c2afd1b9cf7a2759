//! State-reconciliation core for the marquee: turns "what is playing" into a
//! presence update and a rate-limited voice channel rename.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod governor;
pub mod models;
pub mod normalize;
pub mod select;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, EngineConfig, Mode};
pub use engine::{CycleOutcome, Engine, PresenceCommand, Reconciliation, RenameCommand};
pub use error::{ChannelError, CoreError, PresenceError, SourceError};
pub use governor::{RenameDecision, RenameGovernor};
pub use models::{Category, MediaKind, PlaybackWindow, Presentation, RawSessionRecord, SessionOwner};
pub use sink::{ChannelSink, NoPresence, PresenceSink, SessionSource};
