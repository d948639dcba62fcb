//! Core crate for the inclusion platform: configuration, telemetry, and the
//! job-application workflows exposed to the HTTP service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
