//! Domain layer
//!
//! Core domain types and port traits

pub mod ports;

pub use ports::*;
