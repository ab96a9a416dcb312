//! Poses and angle helpers.
//!
//! Angles are in degrees throughout.  The helpers reproduce the conventions
//! of common game-engine vector libraries (degenerate vectors yield 0°, the
//! sign of a zero cross product counts as positive) so that thresholds tuned
//! against a tracking runtime carry over unchanged.

use glam::{Quat, Vec3};

/// Anchor-local axes.  Forward is the switch's press direction.
pub const LOCAL_FORWARD: Vec3 = Vec3::Z;
pub const LOCAL_UP:      Vec3 = Vec3::Y;
pub const LOCAL_RIGHT:   Vec3 = Vec3::X;

/// Vectors shorter than this are treated as zero when normalizing.
const NORMALIZE_EPSILON: f32 = 1e-5;

// ════════════════════════════════════════════════════════════════════════════
// Pose
// ════════════════════════════════════════════════════════════════════════════

/// A rigid transform: world position plus orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self { Pose::IDENTITY }
}

impl Pose {
    pub const IDENTITY: Pose = Pose { position: Vec3::ZERO, rotation: Quat::IDENTITY };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Pose { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Pose { position, rotation: Quat::IDENTITY }
    }

    /// World direction of the local forward axis.
    pub fn forward(&self) -> Vec3 { self.rotation * LOCAL_FORWARD }

    /// World direction of the local up axis.
    pub fn up(&self) -> Vec3 { self.rotation * LOCAL_UP }

    /// World point → pose-local point.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Pose-local point → world point.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Angle helpers
// ════════════════════════════════════════════════════════════════════════════

/// Unsigned angle between two vectors, 0–180.  Returns 0 if either is
/// (near) zero.
pub fn angle_between_deg(from: Vec3, to: Vec3) -> f32 {
    let denom = (from.length_squared() * to.length_squared()).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    let cos = (from.dot(to) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Signed angle from `from` to `to`, positive when `from × to` points along
/// `axis`.
pub fn signed_angle_deg(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let unsigned = angle_between_deg(from, to);
    let side = axis.dot(from.cross(to));
    if side >= 0.0 { unsigned } else { -unsigned }
}

/// Shortest signed difference `target - current`, wrapped to (-180, 180].
pub fn delta_angle_deg(current: f32, target: f32) -> f32 {
    let d = (target - current).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Remove the component of `v` along `normal`.
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let sq = normal.length_squared();
    if sq < f32::EPSILON {
        return v;
    }
    v - normal * (v.dot(normal) / sq)
}

/// Normalize, or zero for vectors too short to have a direction.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > NORMALIZE_EPSILON { v / len } else { Vec3::ZERO }
}

/// Angle of an anchor-local point around the forward axis, measured from up.
pub fn planar_angle_deg(local: Vec3) -> f32 {
    signed_angle_deg(LOCAL_UP, project_on_plane(local, LOCAL_FORWARD), LOCAL_FORWARD)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
