//! Drivers and wiring for the marquee.

pub mod activity;
pub mod app;
pub mod driver;
pub mod error;
pub mod queue;
pub mod timed;
pub mod worker;

pub use error::RuntimeError;
pub use worker::Worker;
