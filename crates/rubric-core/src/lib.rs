pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod rank;
pub mod report;
pub mod score;
pub mod types;
pub mod verdict;

pub use error::{Result, RubricError};
