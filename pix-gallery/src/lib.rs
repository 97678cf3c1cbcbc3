//! # pix-gallery: entitlement-aware incremental gallery
//!
//! A pure pager over three inputs (live asset list, entitlement set,
//! growing window) plus a session that wires it to the document
//! store's live queries with an explicit cancellation handle.

mod pager;
mod session;

pub use pager::{GalleryItem, GalleryPager, DEFAULT_PAGE_SIZE};
pub use session::GallerySession;
