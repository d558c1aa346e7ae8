//! CLI command implementations.

mod chat;
mod config;
mod discover;
mod doctor;
pub mod serve;

pub use chat::run_chat;
pub use config::run_config;
pub use discover::run_discover;
pub use doctor::run_doctor;
pub use serve::run_serve;
