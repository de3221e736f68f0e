//! Access control: capability classification and scope resolution.

pub mod capability;
pub mod scope;
