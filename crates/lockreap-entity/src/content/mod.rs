//! Content version entities.

pub mod model;

pub use model::{ContentVersion, StaleLock};
