//! Cache stores and install-time precache for offgrid.

pub mod filesystem;
pub mod keys;
pub mod memory;
pub mod precache;
pub mod types;

pub use filesystem::FilesystemStore;
pub use keys::{sanitize_generation, storage_key};
pub use memory::MemoryStore;
pub use precache::{DEFAULT_MANIFEST, InstallOutcome, PrecacheManifest, Precacher};
pub use types::CacheStats;
