pub mod analytics;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod record;
pub mod report;

pub use error::{Error, Result};
