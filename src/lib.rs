pub mod cli;
pub mod config;
pub mod econ;
pub mod error;
pub mod galaxy;
pub mod minefield;
pub mod persistence;
pub mod report;
pub mod space;

pub use error::{Result, StarfoldError};
