pub mod labels;
pub mod record;

pub use labels::LabelStore;
pub use record::{SampleRecord, SampleStatus};
