pub mod archive;
pub mod preview;
pub mod runner;

pub use archive::{BatchWorkspace, archive_name, build_archive};
pub use preview::{PreviewPayload, build_preview};
pub use runner::{BatchItemError, NormalizedImage, UploadedImage, process_batch, process_image};
