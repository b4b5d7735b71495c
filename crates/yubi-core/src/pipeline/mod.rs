//! Transcode pipeline components.
//!
//! - **decode**: Read source bytes and decode them
//! - **resize**: Bounded target dimensions and rendering
//! - **encode**: PNG/JPEG encoding and data URLs
//! - **naming**: Output file names
//! - **processor**: Runs the stages for a single file
//! - **batch**: Concurrent transcoding with indexed completions

pub mod batch;
pub mod decode;
pub mod encode;
pub mod naming;
pub mod processor;
pub mod resize;

// Re-exports for convenient access
pub use batch::{spawn_batch, transcode_all, Completion};
pub use decode::{DecodedImage, ImageDecoder};
pub use encode::{parse_data_url, to_data_url, Encoder};
pub use naming::output_file_name;
pub use processor::Transcoder;
pub use resize::target_dimensions;
