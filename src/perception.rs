//! Vision-cone perception over an agent's forward half-plane.
//!
//! The half-plane in front of an agent is split into [`VISION_CONES`]
//! equal wedges, half on each side of the facing vector. Each wedge
//! reports the mean distance of what it sees, normalized so that 0 is
//! touching and 1 is the far corner of the world (or nothing seen).

use glam::Vec2;
use std::f32::consts::PI;

/// Wedges per perceived category
pub const VISION_CONES: usize = 8;

/// Angular width of one wedge
pub const CONE_WIDTH: f32 = PI / VISION_CONES as f32;

const HALF_CONES: usize = VISION_CONES / 2;

/// Wedge that `direction` (unit length) falls into, or `None` if it points behind.
///
/// Wedges `0..HALF_CONES` lie clockwise of `facing`, the rest counter-clockwise.
pub fn cone_index(facing: Vec2, direction: Vec2) -> Option<usize> {
    let dot = facing.dot(direction);
    if dot < 0.0 {
        return None;
    }
    let angle = dot.min(1.0).acos();
    let offset = ((angle / CONE_WIDTH) as usize).min(HALF_CONES - 1);
    if facing.perp_dot(direction) >= 0.0 {
        Some(HALF_CONES + offset)
    } else {
        Some(HALF_CONES - offset - 1)
    }
}

/// Encode one perception block into `out`.
///
/// Objects at `origin` have no direction and are not seen.
pub fn encode_block<I>(origin: Vec2, facing: Vec2, objects: I, max_distance: f32, out: &mut [f32])
where
    I: IntoIterator<Item = Vec2>,
{
    assert_eq!(out.len(), VISION_CONES, "perception block size mismatch");

    let mut sums = [0.0f32; VISION_CONES];
    let mut counts = [0u32; VISION_CONES];

    for position in objects {
        let between = position - origin;
        let Some(direction) = between.try_normalize() else {
            continue;
        };
        if let Some(cone) = cone_index(facing, direction) {
            sums[cone] += between.length();
            counts[cone] += 1;
        }
    }

    for (cone, value) in out.iter_mut().enumerate() {
        *value = if counts[cone] == 0 {
            1.0
        } else {
            (sums[cone] / counts[cone] as f32 / max_distance).clamp(0.0, 1.0)
        };
    }
}
