//! Tracking input: the per-frame poses the switch reads.
//!
//! The switch never reaches for a global player or input API; whatever the
//! host uses (a VR runtime, a LeapMotion controller, a keyboard simulator)
//! is wrapped in a [`TrackingSource`] and passed in each frame.

use glam::{Quat, Vec3};

use crate::geometry::Pose;

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

/// Which hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left  => "left",
            Self::Right => "right",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Left  => 0,
            Self::Right => 1,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerBones
// ════════════════════════════════════════════════════════════════════════════

/// World positions of the two outer index-finger bones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerBones {
    pub intermediate: Vec3,
    pub distal:       Vec3,
}

impl FingerBones {
    /// Fingertip estimate: the distal bone extended by its own length.
    pub fn tip(&self) -> Vec3 {
        self.distal + (self.distal - self.intermediate)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingSource
// ════════════════════════════════════════════════════════════════════════════

/// Capability interface over the host's tracking runtime.
///
/// Any query may return `None` when the data is not available this frame;
/// the switch treats that as "no touch".
pub trait TrackingSource {
    /// Position of the local viewer, or `None` if there is no local viewer.
    fn viewer_position(&self) -> Option<Vec3>;

    /// Whether the local viewer is in immersive (VR) mode.
    fn in_vr(&self) -> bool;

    /// World pose of a hand.
    fn hand_pose(&self, hand: Hand) -> Option<Pose>;

    /// Index-finger bone positions of a hand.
    fn index_bones(&self, hand: Hand) -> Option<FingerBones>;

    /// Continuous grip-trigger value, 0–1.
    fn grip(&self, hand: Hand) -> f32;

    /// A pose that replaces both hands, for testing in a desktop session.
    fn debug_override(&self) -> Option<Pose> { None }

    /// True on the frame the desktop interact key went down.
    fn desktop_key_pressed(&self) -> bool { false }
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedTracking
// ════════════════════════════════════════════════════════════════════════════

/// Per-hand sample held by [`SimulatedTracking`].
#[derive(Debug, Clone, Default)]
pub struct HandSample {
    pub pose:  Option<Pose>,
    pub bones: Option<FingerBones>,
    pub grip:  f32,
}

/// A tracking source that is just data. Set fields, then hand it to the
/// switch.  Used by the simulator and by tests.
#[derive(Debug, Clone)]
pub struct SimulatedTracking {
    pub viewer:      Option<Vec3>,
    pub in_vr:       bool,
    pub hands:       [HandSample; 2],
    pub debug:       Option<Pose>,
    pub desktop_key: bool,
}

impl Default for SimulatedTracking {
    fn default() -> Self {
        SimulatedTracking {
            viewer:      Some(Vec3::ZERO),
            in_vr:       true,
            hands:       [HandSample::default(), HandSample::default()],
            debug:       None,
            desktop_key: false,
        }
    }
}

/// Length of the simulated distal bone.
const SIM_BONE_LEN: f32 = 0.02;

impl SimulatedTracking {
    pub fn new() -> Self { Self::default() }

    pub fn hand(&self, hand: Hand) -> &HandSample { &self.hands[hand.index()] }

    pub fn hand_mut(&mut self, hand: Hand) -> &mut HandSample { &mut self.hands[hand.index()] }

    /// Place a hand so that both its pose and its extrapolated fingertip sit
    /// at `tip`, keeping the current rotation.
    pub fn set_fingertip(&mut self, hand: Hand, tip: Vec3) {
        let sample = self.hand_mut(hand);
        let rotation = sample.pose.map(|p| p.rotation).unwrap_or(Quat::IDENTITY);
        let along = rotation * Vec3::Z * SIM_BONE_LEN;
        sample.pose = Some(Pose::new(tip, rotation));
        sample.bones = Some(FingerBones {
            distal:       tip - along,
            intermediate: tip - along * 2.0,
        });
    }

    /// Rotate a hand in place without moving its fingertip.
    pub fn set_rotation(&mut self, hand: Hand, rotation: Quat) {
        let tip = self.fingertip(hand);
        let sample = self.hand_mut(hand);
        let position = sample.pose.map(|p| p.position).unwrap_or(Vec3::ZERO);
        sample.pose = Some(Pose::new(position, rotation));
        if let Some(tip) = tip {
            self.set_fingertip(hand, tip);
        }
    }

    /// Remove a hand from tracking.
    pub fn clear_hand(&mut self, hand: Hand) {
        *self.hand_mut(hand) = HandSample::default();
    }

    pub fn fingertip(&self, hand: Hand) -> Option<Vec3> {
        self.hand(hand).bones.map(|b| b.tip())
    }
}

impl TrackingSource for SimulatedTracking {
    fn viewer_position(&self) -> Option<Vec3> { self.viewer }
    fn in_vr(&self) -> bool { self.in_vr }
    fn hand_pose(&self, hand: Hand) -> Option<Pose> { self.hand(hand).pose }
    fn index_bones(&self, hand: Hand) -> Option<FingerBones> { self.hand(hand).bones }
    fn grip(&self, hand: Hand) -> f32 { self.hand(hand).grip }
    fn debug_override(&self) -> Option<Pose> { self.debug }
    fn desktop_key_pressed(&self) -> bool { self.desktop_key }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tip_extrapolates_past_distal() {
        let bones = FingerBones {
            intermediate: Vec3::new(0.0, 0.0, 0.0),
            distal:       Vec3::new(0.0, 0.03, 0.0),
        };
        assert_eq!(bones.tip(), Vec3::new(0.0, 0.06, 0.0));
    }

    #[test]
    fn set_fingertip_places_tip_and_pose() {
        let mut t = SimulatedTracking::new();
        let target = Vec3::new(0.1, 0.2, 0.3);
        t.set_fingertip(Hand::Left, target);
        assert!((t.fingertip(Hand::Left).unwrap() - target).length() < 1e-6);
        assert_eq!(t.hand_pose(Hand::Left).unwrap().position, target);
        assert!(t.hand_pose(Hand::Right).is_none());
    }

    #[test]
    fn set_rotation_keeps_tip() {
        let mut t = SimulatedTracking::new();
        let target = Vec3::new(0.0, 0.05, 0.0);
        t.set_fingertip(Hand::Right, target);
        t.set_rotation(Hand::Right, Quat::from_rotation_x(0.8));
        assert!((t.fingertip(Hand::Right).unwrap() - target).length() < 1e-6);
        assert_eq!(t.hand_pose(Hand::Right).unwrap().rotation, Quat::from_rotation_x(0.8));
    }
}
