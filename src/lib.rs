//! Workspace facade crate.
//!
//! This crate exposes feature flags that map to the individual workspace crates
//! (`core-project`, `core-metadata`, `bridge-desktop`). Host applications can
//! depend on `recwerk-workspace` and enable the documented features without
//! wiring each crate individually.

#[cfg(feature = "project")]
pub use core_project as project;

#[cfg(feature = "project")]
pub use core_runtime as runtime;

#[cfg(feature = "metadata")]
pub use core_metadata as metadata;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
