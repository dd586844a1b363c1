//! API Module
//!
//! REST surface over the aggregation views, with Prometheus metrics.

pub mod metrics;
pub mod rest;
pub mod server;

pub use metrics::*;
pub use rest::*;
pub use server::*;
