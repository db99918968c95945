//! Persistence of wrapped data keys
//!
//! This module provides two storage backends:
//! 1. Record file in the user's data directory
//! 2. In-memory (tests and demos)

mod file;
mod memory;
mod record;
mod traits;

pub use file::{default_key_directory, FileKeyRecordStorage};
pub use memory::MemoryKeyRecordStorage;
pub use record::{WrappedKeyRecord, RECORD_VERSION};
pub use traits::KeyRecordStorage;
