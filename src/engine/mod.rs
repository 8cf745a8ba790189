pub mod aggregator;
pub mod buffer;
pub mod reporter;
pub mod scheduler;
pub mod uploader;

pub use reporter::{Collaborators, ReportingEngine};
pub use uploader::Uploader;
