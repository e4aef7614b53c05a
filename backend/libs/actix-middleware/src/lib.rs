//! # Actix Middleware Library
//!
//! Request plumbing shared by the Socially HTTP services
//!
//! ## Modules
//! - `correlation_id`: X-Correlation-ID propagation
//! - `logging`: request/response logging via tracing
//! - `metrics`: Prometheus request metrics

pub mod correlation_id;
pub mod logging;
pub mod metrics;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use logging::Logging;
pub use metrics::MetricsMiddleware;
