//! Skeleton geometry engine for the pose editor widget.
//!
//! This crate owns everything between a pointer event on the pose canvas and
//! the flat keypoint list that gets persisted: the fixed 18-point skeleton
//! topology, group transforms (move, scale, rotate, mirror) and how they are
//! folded back into absolute keypoint and bone coordinates, the multi-skeleton
//! scene, and linear undo/redo over full-scene snapshots. The host layer wires
//! DOM or console events into [`engine::EngineCore`] and acts on the returned
//! [`engine::Action`]s (redraw, persist).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`topology`] | Static keypoint/bone tables, colors, and the default pose |
//! | [`geom`] | Points and the per-skeleton group transform |
//! | [`doc`] | Keypoints, bones, skeleton assembly, and the scene store |
//! | [`transform`] | Recomputes absolute coordinates from a group transform |
//! | [`history`] | Undo/redo snapshot stacks with a replay guard |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against keypoints, skeletons, and handles |
//! | [`viewport`] | Display-to-canvas coordinate mapping |
//! | [`render`] | Scene rendering to a browser 2D context |
//! | [`consts`] | Shared numeric constants (radii, stroke widths, handle sizes) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod history;
pub mod input;
pub mod render;
pub mod topology;
pub mod transform;
pub mod viewport;
