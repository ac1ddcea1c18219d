pub mod checklist;
pub mod config;
pub mod error;
pub mod reference;
pub mod signature;
pub mod types;

pub use error::{Result, StoryhookError};
