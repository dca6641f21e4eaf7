//! Detector library for zombie container detection
//!
//! This crate provides the core functionality for:
//! - Heuristic rule evaluation over container resource time series
//! - Weighted score aggregation and classification
//! - Detection sweeps and the continuous detection loop
//! - Prometheus series / Kubernetes workload providers
//! - Offline evaluation against labeled fixtures
//! - Health checks and observability

pub mod config;
pub mod detect;
pub mod evaluation;
pub mod health;
pub mod heuristics;
pub mod models;
pub mod observability;
pub mod providers;

pub use detect::{Detector, SweepConfig};
pub use heuristics::HeuristicEngine;
pub use models::*;
pub use observability::{DetectorMetrics, StructuredLogger};
