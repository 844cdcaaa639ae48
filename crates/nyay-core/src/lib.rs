pub mod agent;
pub mod citations;
pub mod config;
pub mod error;
pub mod prompt;
pub mod script;
pub mod trial;
pub mod types;
pub mod verdict;

pub use error::TrialError;
pub use trial::{Trial, TrialStage};
pub use types::*;
