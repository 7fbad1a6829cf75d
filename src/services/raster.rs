//! Rasterize a pose scene to PNG for upload.
//!
//! Mirrors the on-screen canvas without the selection UI: black background,
//! translucent bones, then opaque keypoint circles, at one pixel per canvas
//! unit.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use pose_canvas::doc::{Bone, Keypoint, Scene};
use pose_canvas::topology::Rgb;

use super::persistence::PersistError;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

type Surface = Blend<RgbaImage>;

/// Render `scene` onto a `size` x `size` black image and encode it as PNG.
///
/// # Errors
///
/// Returns [`PersistError::Raster`] if PNG encoding fails.
pub fn render_png(scene: &Scene, size: u32) -> Result<Vec<u8>, PersistError> {
    let mut surface = Blend(RgbaImage::from_pixel(size, size, BACKGROUND));
    for skeleton in scene.skeletons() {
        for bone in &skeleton.bones {
            draw_bone(&mut surface, bone);
        }
        for kp in &skeleton.keypoints {
            draw_keypoint(&mut surface, kp);
        }
    }

    let mut png = Cursor::new(Vec::new());
    surface.0.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

fn draw_bone(surface: &mut Surface, bone: &Bone) {
    if bone.stroke_width <= 0.0 {
        return;
    }
    let Rgb(r, g, b) = bone.color.rgb;
    let color = Rgba([r, g, b, bone.color.alpha_u8()]);
    let half = bone.stroke_width / 2.0;
    let (dx, dy) = (bone.end.x - bone.start.x, bone.end.y - bone.start.y);
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        draw_filled_circle_mut(surface, pixel(bone.start.x, bone.start.y), px(half), color);
        return;
    }

    let (nx, ny) = (-dy / len * half, dx / len * half);
    let quad = [
        PixelPoint::new(px(bone.start.x + nx), px(bone.start.y + ny)),
        PixelPoint::new(px(bone.end.x + nx), px(bone.end.y + ny)),
        PixelPoint::new(px(bone.end.x - nx), px(bone.end.y - ny)),
        PixelPoint::new(px(bone.start.x - nx), px(bone.start.y - ny)),
    ];
    if quad[0] == quad[3] {
        return;
    }
    draw_polygon_mut(surface, &quad, color);
}

fn draw_keypoint(surface: &mut Surface, kp: &Keypoint) {
    let radius = kp.radius * kp.scale_x.max(kp.scale_y);
    if radius <= 0.0 {
        return;
    }
    let Rgb(r, g, b) = kp.color;
    let outer = radius + kp.stroke_width / 2.0;
    draw_filled_circle_mut(surface, pixel(kp.position.x, kp.position.y), px(outer).max(1), Rgba([r, g, b, 255]));
}

#[allow(clippy::cast_possible_truncation)]
fn px(v: f64) -> i32 {
    v.round() as i32
}

fn pixel(x: f64, y: f64) -> (i32, i32) {
    (px(x), px(y))
}

#[cfg(test)]
#[path = "raster_test.rs"]
mod tests;
