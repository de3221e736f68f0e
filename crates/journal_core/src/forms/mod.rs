//! Form payloads and per-resource form types.

pub mod base;
pub mod entry;
pub mod role;
pub mod tag;
pub mod user;
