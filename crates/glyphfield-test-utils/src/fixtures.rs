//! Mask builders and reference distance transforms.
//!
//! Masks are row-major `u8` buffers with 255 for object and 0 for background.

use glyphfield_core::geometry::Rect;
use glyphfield_sdf::pass::seed;

pub const OBJECT: u8 = 255;
pub const BACKGROUND: u8 = 0;

pub fn empty(width: u32, height: u32) -> Vec<u8> {
    vec![BACKGROUND; (width * height) as usize]
}

pub fn full(width: u32, height: u32) -> Vec<u8> {
    vec![OBJECT; (width * height) as usize]
}

pub fn single_pixel(width: u32, height: u32, x: u32, y: u32) -> Vec<u8> {
    let mut mask = empty(width, height);
    mask[(y * width + x) as usize] = OBJECT;
    mask
}

/// Object in the left half (`x < width / 2`).
pub fn half_plane(width: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|_| (0..width).map(move |x| if x < width / 2 { OBJECT } else { BACKGROUND }))
        .collect()
}

pub fn filled_rect(width: u32, height: u32, rect: Rect<u32>) -> Vec<u8> {
    let mut mask = empty(width, height);
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            mask[(y * width + x) as usize] = OBJECT;
        }
    }
    mask
}

/// Texels whose centre lies within `radius` of `(cx, cy)`.
pub fn disk(width: u32, height: u32, cx: f32, cy: f32, radius: f32) -> Vec<u8> {
    let mut mask = empty(width, height);
    for y in 0..height {
        for x in 0..width {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            if dx * dx + dy * dy <= radius * radius {
                mask[(y * width + x) as usize] = OBJECT;
            }
        }
    }
    mask
}

/// Mirror a row-major buffer of one-byte texels left to right.
pub fn mirror_horizontal(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    (0..height as usize)
        .flat_map(|y| data[y * width..(y + 1) * width].iter().rev().copied())
        .collect()
}

/// Exact Euclidean distance in texels from `(x, y)` to the nearest texel
/// whose object state equals `to_object`; `None` when there is none.
pub fn brute_force_distance(
    mask: &[u8],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    to_object: bool,
) -> Option<f32> {
    let mut best: Option<u32> = None;
    for sy in 0..height {
        for sx in 0..width {
            if seed::is_object(mask[(sy * width + sx) as usize], false) != to_object {
                continue;
            }
            let dx = sx.abs_diff(x);
            let dy = sy.abs_diff(y);
            let d2 = dx * dx + dy * dy;
            if best.is_none_or(|b| d2 < b) {
                best = Some(d2);
            }
        }
    }
    best.map(|d2| (d2 as f32).sqrt())
}
