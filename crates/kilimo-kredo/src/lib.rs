//! Credit scoring and loan application lifecycle engine behind the KilimoKredo dashboard.

pub mod config;
pub mod error;
pub mod lending;
pub mod telemetry;
