//! Rendering: draws the pose scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of the scene and UI state and produces
//! pixels. It does not mutate any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{BACKGROUND_COLOR, CORNER_SIZE_PX, ROTATE_HANDLE_OFFSET_PX, SELECTION_COLOR};
use crate::doc::{Bone, Keypoint, Scene, Skeleton};
use crate::hit;
use crate::input::UiState;
use crate::viewport::Viewport;

/// Draw the full scene: background, skeletons, and selection UI.
///
/// Drawing happens in canvas units; the host scales the element to its
/// display size.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, scene: &Scene, ui: &UiState, viewport: &Viewport) -> Result<(), JsValue> {
    let size = viewport.canvas_size;

    // Layer 1: background.
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(BACKGROUND_COLOR);
    ctx.fill_rect(0.0, 0.0, size, size);

    // Layer 2: skeletons in creation order, bones beneath keypoints.
    for skeleton in scene.skeletons() {
        draw_skeleton(ctx, skeleton)?;
    }

    // Layer 3: selection UI.
    if let Some(skeleton) = ui.selected.and_then(|i| scene.get(i)) {
        draw_selection(ctx, skeleton, viewport)?;
    }

    Ok(())
}

fn draw_skeleton(ctx: &CanvasRenderingContext2d, skeleton: &Skeleton) -> Result<(), JsValue> {
    for bone in &skeleton.bones {
        draw_bone(ctx, bone);
    }
    for kp in &skeleton.keypoints {
        draw_keypoint(ctx, kp)?;
    }
    Ok(())
}

fn draw_bone(ctx: &CanvasRenderingContext2d, bone: &Bone) {
    if bone.stroke_width <= 0.0 {
        return;
    }
    ctx.set_stroke_style_str(&bone.color.to_string());
    ctx.set_line_width(bone.stroke_width);
    ctx.begin_path();
    ctx.move_to(bone.start.x, bone.start.y);
    ctx.line_to(bone.end.x, bone.end.y);
    ctx.stroke();
}

fn draw_keypoint(ctx: &CanvasRenderingContext2d, kp: &Keypoint) -> Result<(), JsValue> {
    let radius = kp.radius * kp.scale_x.max(kp.scale_y);
    if radius <= 0.0 {
        return Ok(());
    }
    let color = kp.color.to_string();
    ctx.begin_path();
    ctx.arc(kp.position.x, kp.position.y, radius, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(&color);
    ctx.fill();
    ctx.set_stroke_style_str(&color);
    ctx.set_line_width(kp.stroke_width);
    ctx.stroke();
    Ok(())
}

fn draw_selection(ctx: &CanvasRenderingContext2d, skeleton: &Skeleton, viewport: &Viewport) -> Result<(), JsValue> {
    let t = &skeleton.transform;
    let corners = t.corners();
    let line_width = viewport.screen_dist_to_canvas(1.0);
    let half_corner = viewport.screen_dist_to_canvas(CORNER_SIZE_PX) / 2.0;

    ctx.save();
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(line_width);

    // Rotated bounding box.
    ctx.begin_path();
    ctx.move_to(corners[0].x, corners[0].y);
    for c in &corners[1..] {
        ctx.line_to(c.x, c.y);
    }
    ctx.close_path();
    ctx.stroke();

    // Corner handles, filled in the selection color.
    ctx.set_fill_style_str(SELECTION_COLOR);
    for c in &corners {
        ctx.fill_rect(c.x - half_corner, c.y - half_corner, half_corner * 2.0, half_corner * 2.0);
    }

    // Rotate handle and its stem from the top edge midpoint.
    let rh = hit::rotate_handle_position(t, viewport.screen_dist_to_canvas(ROTATE_HANDLE_OFFSET_PX));
    let top_mid = hit::rotate_handle_position(t, 0.0);
    ctx.begin_path();
    ctx.move_to(top_mid.x, top_mid.y);
    ctx.line_to(rh.x, rh.y);
    ctx.stroke();

    ctx.begin_path();
    ctx.arc(rh.x, rh.y, half_corner, 0.0, 2.0 * PI)?;
    ctx.fill();

    ctx.restore();
    Ok(())
}
