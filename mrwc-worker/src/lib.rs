//! A mapper or reducer process for the word count coordinator.

pub mod args;
pub mod core;
pub mod registration;

pub use crate::core::{serve, MRWorker};
pub use crate::registration::CoordinatorLink;
