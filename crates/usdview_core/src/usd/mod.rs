//! USD stage support for the viewer.
//!
//! Reads `.usda` layers into a prim outline with the metadata the viewer
//! needs: time range, frame rate, up axis and world-space bounds.
//!
//! ## Not Supported
//!
//! - Binary `.usdc` layers
//! - References, payloads, sublayers and variants (no composition)
//! - Xform ops other than `xformOp:translate` when computing bounds
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use usdview_core::{Stage, Tokens};
//!
//! let stage = Stage::open("scene.usda", Arc::new(Tokens::new()))?;
//! for line in stage.outline() {
//!     println!("{line}");
//! }
//! ```

mod builtin;
mod parser;
mod schema;
mod stage;
mod types;

pub use builtin::*;
pub use parser::*;
pub use schema::*;
pub use stage::*;
pub use types::*;
