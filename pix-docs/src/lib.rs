//! # pix-docs: document store boundary for Pixgate
//!
//! The metadata backing store is an external collaborator; this crate
//! defines the two collections the core needs (`assets` and
//! `entitlements`) as narrow traits, plus in-memory implementations
//! with watch-based live queries used by the server binary and the
//! test suite.
//!
//! Live queries deliver whole ordered snapshots and are torn down by
//! dropping (or explicitly cancelling) the returned handle.

pub mod asset;
pub mod entitlement;
mod error;
mod live;
mod memory;

pub use asset::{AssetDoc, AssetDocs, AssetScope, DerivedRefs};
pub use entitlement::{composite_key, EntitlementDoc, EntitlementDocs};
pub use error::{DocError, DocResult};
pub use live::LiveQuery;
pub use memory::{MemoryAssets, MemoryEntitlements};
