pub mod anki;
pub mod core;
pub mod duolingo;
pub mod persistence;

pub use crate::core::errors::SyncError;
