pub mod config;
pub mod error;
pub mod import;
pub mod intelligence;
pub mod telemetry;
