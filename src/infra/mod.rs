//! Shared infrastructure.

pub mod metrics;
pub mod tracing;

pub use metrics::MetricsConfig;
pub use tracing::init_tracing;
