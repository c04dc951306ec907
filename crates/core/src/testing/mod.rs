//! Testing utilities: a fake encoder and a scripted recovery policy.
//!
//! Lets the pool and the batch driver run real processes in tests without a
//! `flac` installation. The fake encoder is a POSIX shell script, so the
//! process-based helpers are only available on Unix.
//!
//! # Example
//!
//! ```rust,ignore
//! use reflac_core::testing::{FakeLibrary, ScriptedPolicy};
//!
//! let dir = tempfile::TempDir::new()?;
//! let library = FakeLibrary::new(dir.path());
//! let track = library.add("album/01-fail.flac");
//! let config = library.encoder_config();
//! ```

mod fake_encoder;
mod scripted_policy;

#[cfg(unix)]
pub use fake_encoder::fake_encoder_path;
pub use fake_encoder::FakeLibrary;
pub use scripted_policy::ScriptedPolicy;
