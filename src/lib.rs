pub mod config;
pub mod monitor;
pub mod notify;
pub mod version;
