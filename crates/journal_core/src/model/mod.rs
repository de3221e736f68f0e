//! Domain models shared across the engine.

pub mod entry;
pub mod principal;
pub mod record;
pub mod role;
pub mod tag;
pub mod user;
