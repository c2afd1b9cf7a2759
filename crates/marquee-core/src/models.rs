pub mod presentation;
pub mod session;

pub use presentation::{Category, PlaybackWindow, Presentation};
pub use session::{MediaKind, RawSessionRecord, SessionOwner};
