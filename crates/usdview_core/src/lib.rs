//! UsdView Core - stage, plugin and token support for the viewer.
//!
//! This crate provides:
//!
//! - **Stage**: USDA layer reading, time range, up axis and world bounds
//! - **Schemas**: typed prim handles behind the `Schema`/`Xformable` traits
//! - **Tokens**: a process-wide interned string table
//! - **Plugins**: `plugInfo.json` discovery and bundle registration
//! - **Callbacks**: a registry that keeps closures alive until unregistered
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use usdview_core::{PlugRegistry, Stage, Tokens};
//!
//! let tokens = Arc::new(Tokens::new());
//! let mut plugins = PlugRegistry::new();
//! plugins.register_plugins(&PlugRegistry::paths_from_env());
//!
//! let stage = Stage::open("scene.usda", tokens)?;
//! println!("{} prims", stage.traverse().len());
//! ```

pub mod callback;
pub mod plug;
pub mod tokens;
pub mod usd;

// Re-export commonly used types
pub use callback::{CallbackHandle, CallbackRegistry};
pub use plug::{BundleFramework, EnvPlan, PlugError, PlugRegistry, Plugin, PluginInfo, PluginKind};
pub use tokens::{Token, Tokens};
pub use usd::{PrimSpec, Stage, StageError};
