pub mod table;

pub use table::{PlatformProfile, ProfileTable};
