pub mod category_map;
pub mod field_mapping;
pub mod handler;
pub mod submission;

pub use crate::domain::model::{CreatedRecord, RecordPage, SubmissionPayload, TableRecord};
pub use crate::domain::ports::RecordStore;
pub use crate::utils::error::Result;
