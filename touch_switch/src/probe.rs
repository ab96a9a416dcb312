//! Geometry probe: is a hand inside the switch's detection cylinder?
//!
//! The cylinder is centred on the anchor with its axis along the anchor's
//! forward direction.  A point is inside when its distance to the centre is
//! below `radius` and its offset along the axis is at most `thickness / 2`.
//! The distance test is strict and the axial test inclusive, always, so a
//! point sitting exactly on the boundary gives the same answer every frame.

use glam::{Quat, Vec3};

use crate::config::SwitchConfig;
use crate::geometry::Pose;
use crate::tracking::{Hand, TrackingSource};

/// Grip-axis value a hand must reach when the grip gate is configured.
pub const GRIP_THRESHOLD: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryProbe {
    pub radius:      f32,
    pub thickness:   f32,
    pub finger_mode: bool,
    pub grip:        bool,
}

impl GeometryProbe {
    pub fn from_config(cfg: &SwitchConfig) -> Self {
        GeometryProbe {
            radius:      cfg.dimensions.radius,
            thickness:   cfg.dimensions.thickness,
            finger_mode: cfg.touch.finger_mode,
            grip:        cfg.touch.grip,
        }
    }

    /// The tracked point for a hand: debug override, fingertip estimate, or
    /// hand position, in that order of preference.
    pub fn touch_point(&self, hand: Hand, tracking: &dyn TrackingSource) -> Option<Vec3> {
        if let Some(debug) = tracking.debug_override() {
            return Some(debug.position);
        }
        if self.finger_mode {
            tracking.index_bones(hand).map(|b| b.tip())
        } else {
            tracking.hand_pose(hand).map(|p| p.position)
        }
    }

    /// Hand orientation used by knob mode.
    pub fn hand_rotation(&self, hand: Hand, tracking: &dyn TrackingSource) -> Option<Quat> {
        tracking
            .debug_override()
            .or_else(|| tracking.hand_pose(hand))
            .map(|p| p.rotation)
    }

    /// Pure containment test.
    pub fn contains(&self, anchor: &Pose, point: Vec3) -> bool {
        let relative = anchor.position - point;
        relative.length_squared() < self.radius * self.radius
            && relative.dot(anchor.forward()).abs() <= self.thickness * 0.5
    }

    /// Full per-frame probe for one hand, including the grip gate.
    pub fn detect(&self, hand: Hand, anchor: &Pose, tracking: &dyn TrackingSource) -> bool {
        if self.grip && tracking.grip(hand) < GRIP_THRESHOLD {
            return false;
        }
        match self.touch_point(hand, tracking) {
            Some(point) => self.contains(anchor, point),
            None        => false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::SimulatedTracking;

    fn probe(radius: f32, thickness: f32) -> GeometryProbe {
        GeometryProbe { radius, thickness, finger_mode: true, grip: false }
    }

    #[test]
    fn inside_and_outside_radius() {
        let p = probe(0.1, 1.0);
        let anchor = Pose::IDENTITY;
        assert!(p.contains(&anchor, Vec3::new(0.05, 0.0, 0.0)));
        assert!(p.contains(&anchor, Vec3::new(0.0, -0.099, 0.0)));
        assert!(!p.contains(&anchor, Vec3::new(0.0, 0.101, 0.0)));
        assert!(!p.contains(&anchor, Vec3::new(0.08, 0.08, 0.0)));
    }

    #[test]
    fn slab_limits_axial_offset() {
        // Thin slab: radius is generous, the forward offset decides.
        let p = probe(1.0, 0.02);
        let anchor = Pose::IDENTITY;
        assert!(p.contains(&anchor, Vec3::new(0.0, 0.0, 0.009)));
        assert!(!p.contains(&anchor, Vec3::new(0.0, 0.0, 0.011)));
        assert!(!p.contains(&anchor, Vec3::new(0.0, 0.0, -0.011)));
        // Sideways offsets are not limited by the slab.
        assert!(p.contains(&anchor, Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn slab_follows_anchor_rotation() {
        let p = probe(1.0, 0.02);
        let anchor = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Forward is now +X.
        assert!(!p.contains(&anchor, Vec3::new(0.05, 0.0, 0.0)));
        assert!(p.contains(&anchor, Vec3::new(0.0, 0.0, 0.05)));
    }

    #[test]
    fn boundary_is_stable() {
        let p = probe(0.5, 1.0);
        let anchor = Pose::IDENTITY;
        let on_radius = Vec3::new(0.5, 0.0, 0.0);
        let first = p.contains(&anchor, on_radius);
        for _ in 0..100 {
            assert_eq!(p.contains(&anchor, on_radius), first);
        }
        assert!(!first);
    }

    #[test]
    fn slab_face_is_inside_every_time() {
        let p = probe(1.0, 0.5);
        let anchor = Pose::IDENTITY;
        for face in [Vec3::new(0.0, 0.0, 0.25), Vec3::new(0.0, 0.0, -0.25)] {
            for _ in 0..100 {
                assert!(p.contains(&anchor, face));
            }
        }
    }

    #[test]
    fn detect_uses_fingertip_in_finger_mode() {
        let mut t = SimulatedTracking::new();
        t.set_fingertip(Hand::Right, Vec3::new(0.0, 0.01, 0.0));
        // Move the pose away; only the bones should matter.
        t.hand_mut(Hand::Right).pose = Some(Pose::from_position(Vec3::splat(5.0)));
        let p = probe(0.05, 1.0);
        assert!(p.detect(Hand::Right, &Pose::IDENTITY, &t));

        let palm = GeometryProbe { finger_mode: false, ..p };
        assert!(!palm.detect(Hand::Right, &Pose::IDENTITY, &t));
    }

    #[test]
    fn detect_prefers_debug_override() {
        let mut t = SimulatedTracking::new();
        t.set_fingertip(Hand::Left, Vec3::splat(3.0));
        t.debug = Some(Pose::from_position(Vec3::new(0.0, 0.0, 0.01)));
        let p = probe(0.05, 1.0);
        assert!(p.detect(Hand::Left, &Pose::IDENTITY, &t));
        assert!(p.detect(Hand::Right, &Pose::IDENTITY, &t));
    }

    #[test]
    fn missing_tracking_never_touches() {
        let t = SimulatedTracking::new();
        assert!(!probe(10.0, 10.0).detect(Hand::Right, &Pose::IDENTITY, &t));
    }

    #[test]
    fn grip_gate() {
        let mut t = SimulatedTracking::new();
        t.set_fingertip(Hand::Right, Vec3::ZERO);
        let p = GeometryProbe { grip: true, ..probe(0.05, 1.0) };
        t.hand_mut(Hand::Right).grip = 0.5;
        assert!(!p.detect(Hand::Right, &Pose::IDENTITY, &t));
        t.hand_mut(Hand::Right).grip = 0.75;
        assert!(p.detect(Hand::Right, &Pose::IDENTITY, &t));
    }
}
