pub mod composer;
pub mod config;
pub mod mode;
pub mod transcript;
