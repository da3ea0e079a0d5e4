pub mod filename;
pub mod params;

pub use filename::{output_file_name, output_stem};
pub use params::{validate_batch_size, validate_params};
