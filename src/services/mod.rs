//! Services shared by the CLI and the HTTP surface
//!
//! - `format`: encoding processed images for download and JSON embedding
//! - `gallery`: discovery of the example images offered on each tab

pub mod format;
pub mod gallery;

pub use format::OutputFormatHandler;
pub use gallery::{ExampleCatalog, ExampleImage, EXAMPLES_PER_PAGE};
