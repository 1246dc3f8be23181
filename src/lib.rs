pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{AirtableClient, DryRunStore};
pub use config::IntakeConfig;
pub use core::category_map::{CategoryResolver, CategorySource, CategoryTree, FlatCategoryMap};
pub use core::handler::{handle_event, FormEvent, FormResponse};
pub use core::submission::{SubmissionOrchestrator, SubmissionReport};
pub use utils::error::{IntakeError, Result};
