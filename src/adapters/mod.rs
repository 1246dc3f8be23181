// Adapters layer: concrete RecordStore implementations for the external record service.

pub mod airtable;
pub mod dry_run;

pub use airtable::AirtableClient;
pub use dry_run::{DryRunStore, PendingWrite};
