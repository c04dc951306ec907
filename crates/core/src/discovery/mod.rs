//! Discovery module: finds the files a batch will re-encode.
//!
//! Walks a folder recursively, keeps files whose name matches a glob mask and
//! optionally drops files whose FLAC vendor tag (read with `metaflac`) already
//! matches the desired encoder version.

mod config;
mod error;
mod vendor;
mod walker;

pub use config::{DiscoveryConfig, DEFAULT_VENDOR_STRING};
pub use error::DiscoveryError;
pub use vendor::read_vendor_string;
pub use walker::{build_matcher, discover, find_files};
