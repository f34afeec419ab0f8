pub mod bridge;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod palette;
pub mod protocol;
