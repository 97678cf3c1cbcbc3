//! # pix-blob: blob storage boundary for Pixgate
//!
//! Pixgate treats the blob store as an external collaborator reached
//! through a narrow trait. This crate holds that trait, the key
//! conventions linking originals to their derivatives, the
//! finalize-notification plumbing, and two backends: a filesystem
//! store for the local server binary and an in-memory store for
//! tests.
//!
//! ```text
//! ┌───────────────────┐
//! │ transform pipeline│  ← consumes FinalizeEvent
//! ├───────────────────┤
//! │    ObjectStore    │  ← upload / download / make_public
//! ├───────────────────┤
//! │  Fs / Memory / …  │  ← backends
//! └───────────────────┘
//! ```

mod error;
pub mod fs_store;
pub mod keys;
mod memory_store;
mod notify;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use fs_store::FsObjectStore;
pub use keys::{
    file_name, DefaultKeyStrategy, KeyStrategy, DERIVED_MARKER, DERIVED_PREFIX, ORIGINAL_PREFIX,
};
pub use memory_store::MemoryObjectStore;
pub use notify::{FinalizeEvent, NotificationBus};
pub use store::{ObjectHead, ObjectStore};
