//! Cache backends for wrapped keys and other shared values
//!
//! The cache is injected into its users behind an `Arc`; there is no
//! process-wide instance.

mod memory;
mod traits;

pub use memory::MemoryCache;
pub use traits::{typed_key, Cache, DEFAULT_SLIDING_EXPIRATION, MAX_SLIDING_EXPIRATION};
