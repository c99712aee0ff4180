//! The three full-screen programs: seed, flood and insert.
//!
//! Each submodule holds the WGSL source of its program, the matching uniform
//! block and a CPU kernel that evaluates one output texel exactly the way the
//! shader does.

/// Prepend the shared vertex stage and codec helpers to a fragment program.
macro_rules! pass_shader {
    ($file:literal) => {
        concat!(
            include_str!("../shaders/fullscreen.wgsl"),
            "\n",
            include_str!("../shaders/codec.wgsl"),
            "\n",
            include_str!(concat!("../shaders/", $file)),
        )
    };
}

pub mod flood;
pub mod insert;
pub mod seed;

pub use flood::{FloodSchedule, flood_pass_count, flood_schedule};
pub use insert::Falloff;

/// Two triangles covering clip space.
pub(crate) const FULLSCREEN_QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];
