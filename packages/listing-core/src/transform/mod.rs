pub mod bounds;
pub mod canvas;
pub mod decode;
pub mod dimensions;
pub mod encode;
pub mod params;
pub mod pipeline;
pub mod resize;

pub use bounds::{ContentBounds, extract_product, find_content_bounds, flatten_to_rgb};
pub use canvas::{Placement, composite};
pub use decode::decode_image;
pub use dimensions::{FillSpec, ScalePlan, ScalePolicy, plan_scale, preview_dimensions};
pub use encode::encode_image;
pub use params::{Background, NormalizeParams, OutputFormat, OutputSpec};
pub use pipeline::{NormalizeReport, Normalized, Normalizer, normalize};
pub use resize::resize_image;
