mod types;

pub use types::{ArchiveError, GeometryStage, ListingError, TransformError};
