//! Flood pass: one jump-flood step, plus the step schedule.

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, UVec2, Vec2};

use glyphfield_core::geometry::Size;

use crate::codec::{self, EncodedTexel};

pub(crate) const SHADER_SOURCE: &str = pass_shader!("flood.wgsl");

/// Neighbour directions, in the order they are examined.
///
/// Ties keep the earlier candidate, so this order is observable.
pub const COMPASS: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
];

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct FloodUniforms {
    pub size: [u32; 2],
    pub step: u32,
    pub _padding: u32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<FloodUniforms>(), 16);

impl FloodUniforms {
    pub fn new(size: Size<u32>, step: u32) -> Self {
        Self {
            size: [size.width, size.height],
            step,
            _padding: 0,
        }
    }
}

/// Halving step sizes: `max(w, h) / 2`, then halved until zero.
#[derive(Debug, Clone)]
pub struct FloodSchedule {
    next: u32,
}

impl Iterator for FloodSchedule {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next == 0 {
            return None;
        }
        let step = self.next;
        self.next /= 2;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (u32::BITS - self.next.leading_zeros()) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FloodSchedule {}

pub fn flood_schedule(size: Size<u32>) -> FloodSchedule {
    FloodSchedule {
        next: size.width.max(size.height) / 2,
    }
}

/// Number of flood passes one field takes for a tile of `size`.
pub fn flood_pass_count(size: Size<u32>) -> u32 {
    flood_schedule(size).len() as u32
}

/// Evaluate the flood program for texel `(x, y)` of a row-major `field`.
///
/// # Panics
///
/// Panics if `(x, y)` lies outside `size` or `field` holds fewer than
/// `size.area()` texels.
pub fn flood_texel(field: &[EncodedTexel], size: Size<u32>, x: u32, y: u32, step: u32) -> EncodedTexel {
    let extent = UVec2::new(size.width, size.height);
    let p = UVec2::new(x, y).as_ivec2();
    let texel_at = |q: IVec2| field[q.y as usize * size.width as usize + q.x as usize];

    let mut best: Option<(Vec2, f32)> =
        codec::decode(texel_at(p)).map(|v| (v, v.length()));

    let step = step as i32;
    for direction in COMPASS {
        let offset = direction * step;
        let q = p + offset;
        if q.cmplt(IVec2::ZERO).any() || q.cmpge(extent.as_ivec2()).any() {
            continue;
        }

        let Some(seed_vector) = codec::decode(texel_at(q)) else {
            continue;
        };

        let candidate = seed_vector + offset.as_vec2() / extent.as_vec2();
        let distance = candidate.length();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }

    codec::encode(best.map(|(v, _)| v))
}

/// Run one complete flood step over a field on the CPU.
///
/// # Panics
///
/// Panics if `field` holds fewer than `size.area()` texels.
pub fn flood_step(field: &[EncodedTexel], size: Size<u32>, step: u32) -> Vec<EncodedTexel> {
    let mut out = Vec::with_capacity(size.area());
    for y in 0..size.height {
        for x in 0..size.width {
            out.push(flood_texel(field, size, x, y, step));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::seed;

    fn seeded(size: Size<u32>, seeds: &[(u32, u32)]) -> Vec<EncodedTexel> {
        let mut field = vec![EncodedTexel::INDETERMINATE; size.area()];
        for &(x, y) in seeds {
            field[(y * size.width + x) as usize] = EncodedTexel::ZERO;
        }
        field
    }

    fn converge(size: Size<u32>, mut field: Vec<EncodedTexel>) -> Vec<EncodedTexel> {
        for step in flood_schedule(size) {
            field = flood_step(&field, size, step);
        }
        field
    }

    #[test]
    fn test_schedule() {
        let steps: Vec<u32> = flood_schedule(Size::new(8, 8)).collect();
        assert_eq!(steps, vec![4, 2, 1]);

        let steps: Vec<u32> = flood_schedule(Size::new(5, 3)).collect();
        assert_eq!(steps, vec![2, 1]);

        let steps: Vec<u32> = flood_schedule(Size::new(1000, 20)).collect();
        assert_eq!(steps, vec![500, 250, 125, 62, 31, 15, 7, 3, 1]);

        assert_eq!(flood_schedule(Size::new(1, 1)).count(), 0);
        assert_eq!(flood_pass_count(Size::new(2, 1)), 1);
        assert_eq!(flood_pass_count(Size::new(64, 64)), 6);
    }

    #[test]
    fn test_schedule_len_matches_count() {
        for n in 0..300u32 {
            let size = Size::new(n, 1);
            assert_eq!(flood_schedule(size).len(), flood_schedule(size).count());
        }
    }

    #[test]
    #[should_panic]
    fn test_flood_texel_short_field_panics() {
        let size = Size::new(4, 4);
        let field = seeded(Size::new(2, 2), &[]);
        flood_texel(&field, size, 3, 3, 1);
    }

    #[test]
    fn test_seed_texel_keeps_zero() {
        let size = Size::new(4, 4);
        let field = seeded(size, &[(1, 1), (2, 1)]);
        assert_eq!(flood_texel(&field, size, 1, 1, 1), EncodedTexel::ZERO);
    }

    #[test]
    fn test_indeterminate_without_seeds() {
        let size = Size::new(4, 4);
        let field = converge(size, seeded(size, &[]));
        assert!(field.iter().all(|t| t.is_indeterminate()));
    }

    #[test]
    fn test_neighbour_vector_points_to_seed() {
        let size = Size::new(8, 8);
        let field = seeded(size, &[(3, 3)]);

        // (5, 3) sees the seed two texels to its left
        let v = codec::decode(flood_texel(&field, size, 5, 3, 2)).unwrap();
        assert_eq!(v, Vec2::new(-2.0 / 8.0, 0.0));

        // step 1 cannot reach it
        assert!(flood_texel(&field, size, 5, 3, 1).is_indeterminate());
    }

    #[test]
    fn test_out_of_bounds_neighbours_ignored() {
        let size = Size::new(4, 4);
        let field = seeded(size, &[(0, 0)]);
        // step larger than the tile: every neighbour is outside
        assert!(flood_texel(&field, size, 3, 3, 8).is_indeterminate());
    }

    #[test]
    fn test_single_seed_converges_exactly() {
        let size = Size::new(32, 32);
        let seed = (11u32, 20u32);
        let field = converge(size, seeded(size, &[seed]));

        for y in 0..size.height {
            for x in 0..size.width {
                let v = codec::decode(field[(y * size.width + x) as usize])
                    .unwrap_or_else(|| panic!("({}, {}) has no seed", x, y));
                let px = Vec2::new(v.x * size.width as f32, v.y * size.height as f32);
                let expected = Vec2::new(seed.0 as f32 - x as f32, seed.1 as f32 - y as f32);
                assert!((px - expected).length() < 0.01, "({}, {}): {:?}", x, y, px);
            }
        }
    }

    #[test]
    fn test_seeds_unchanged_by_flooding() {
        let size = Size::new(16, 16);
        let mask: Vec<u8> = (0..size.area())
            .map(|i| if i % 7 == 0 { 255 } else { 0 })
            .collect();
        let field: Vec<EncodedTexel> = mask.iter().map(|&m| seed::seed_texel(m, false)).collect();
        let converged = converge(size, field);

        for (i, &m) in mask.iter().enumerate() {
            if seed::is_object(m, false) {
                assert_eq!(converged[i], EncodedTexel::ZERO);
            } else {
                assert!(!converged[i].is_indeterminate());
            }
        }
    }

    #[test]
    fn test_uniform_layout() {
        let uniforms = FloodUniforms::new(Size::new(64, 32), 16);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&uniforms));
        assert_eq!(words, &[64, 32, 16, 0]);
    }
}
