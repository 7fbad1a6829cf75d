//! Host-side services behind the pose widget.
//!
//! ARCHITECTURE
//! ============
//! The canvas engine stays synchronous and knows nothing about files or the
//! network. These modules turn its persist requests into a rendered PNG, an
//! upload, and a preset-store write.

pub mod persistence;
pub mod preset;
pub mod raster;
pub mod upload;
