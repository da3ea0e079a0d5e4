pub mod batch;
pub mod constants;
pub mod errors;
pub mod profile;
pub mod transform;
pub mod validation;

// 公開API
pub use batch::{
    BatchItemError, BatchWorkspace, NormalizedImage, PreviewPayload, UploadedImage, archive_name,
    build_archive, build_preview, process_batch, process_image,
};
pub use constants::{
    COVER_BIAS, COVER_MIN_FRACTION, DEFAULT_PLATFORM, DEFAULT_QUALITY, MAX_BATCH_SIZE,
    MAX_PIXELS, MIN_BATCH_SIZE,
};
pub use errors::{ArchiveError, GeometryStage, ListingError, TransformError};
pub use profile::{PlatformProfile, ProfileTable};
pub use transform::{
    Background, ContentBounds, FillSpec, NormalizeParams, NormalizeReport, Normalized,
    Normalizer, OutputFormat, OutputSpec, ScalePlan, ScalePolicy, decode_image, encode_image,
    normalize,
};
pub use validation::{validate_batch_size, validate_params};
