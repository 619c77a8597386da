//! CLI command implementations.

mod config;
mod doctor;
mod serve;
mod summarize;

pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use summarize::run_summarize;
