//! # pix-pipeline: derived-asset pipeline for Pixgate
//!
//! Consumes object-finalize notifications, produces a bounded-size
//! JPEG preview for each original image, publishes it, and reconciles
//! the result into the owning asset document. One invocation per
//! notification, no state across invocations, temporaries scoped to
//! the call.

mod error;
pub mod filter;
pub mod resize;
mod worker;

pub use error::PipelineError;
pub use filter::SkipReason;
pub use resize::derive_preview;
pub use worker::{run, TransformConfig, TransformOutcome, TransformWorker};
