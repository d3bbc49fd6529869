pub mod cache;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod remote;
pub mod sources;
pub mod state;

pub use error::{ConsoleError, Result};
