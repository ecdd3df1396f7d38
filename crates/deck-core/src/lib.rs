pub mod bridge;
pub mod config;
pub mod log;
pub mod platform;
pub mod protocol;
pub mod timefmt;
