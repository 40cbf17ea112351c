mod filter;
pub mod status;
mod types;
pub mod validation;

pub use filter::FilterCriteria;
pub use status::{ProcessingStatus, UploadStatus};
pub use types::{MessageResponse, ProcessStatusUpdate, RosbagRecord, UploadFileInfo, UploadForm};
pub use validation::AcceptedExtensions;
