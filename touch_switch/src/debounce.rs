//! Touch debouncer — per-hand `Idle` / `Touching` state machine.
//!
//! Each frame the probe results for both hands are folded into edges.  The
//! right hand has priority: the left probe is only consulted when the right
//! probe failed, so the two hands can never start touching in the same frame.

use glam::{Quat, Vec3};
use tracing::debug;

use crate::tracking::Hand;

// ════════════════════════════════════════════════════════════════════════════
// HandTouchState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Idle,
    Touching,
}

/// Everything the switch remembers about one hand between frames.
///
/// `touch_start_local` and `reference_rotation` are only meaningful while
/// `phase == Touching`; they are overwritten on the next start.
#[derive(Debug, Clone, PartialEq)]
pub struct HandTouchState {
    pub phase:              TouchPhase,
    /// Anchor-local position when the touch began.
    pub touch_start_local:  Vec3,
    /// Inverse hand rotation at the last knob baseline.
    pub reference_rotation: Quat,
    /// Wheel angle reference in degrees; keeps the sub-step remainder.
    pub wheel_angle:        f32,
    /// Time of the last emitted start (throttling).
    pub last_start_emit:    Option<f32>,
    /// Time of the last knob step (throttling).
    pub last_step:          Option<f32>,
}

impl Default for HandTouchState {
    fn default() -> Self {
        HandTouchState {
            phase:              TouchPhase::Idle,
            touch_start_local:  Vec3::ZERO,
            reference_rotation: Quat::IDENTITY,
            wheel_angle:        0.0,
            last_start_emit:    None,
            last_step:          None,
        }
    }
}

impl HandTouchState {
    pub fn is_touching(&self) -> bool { self.phase == TouchPhase::Touching }
}

// ════════════════════════════════════════════════════════════════════════════
// Edges
// ════════════════════════════════════════════════════════════════════════════

/// A phase change produced by one frame's probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Started,
    Ended,
}

/// Result of one debouncer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEdges {
    pub right:       Option<Edge>,
    pub left:        Option<Edge>,
    /// Probe results after arbitration; a hand "moves" every frame it is set.
    pub right_hit:   bool,
    pub left_hit:    bool,
}

impl FrameEdges {
    pub fn edge(&self, hand: Hand) -> Option<Edge> {
        match hand {
            Hand::Left  => self.left,
            Hand::Right => self.right,
        }
    }

    pub fn hit(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left  => self.left_hit,
            Hand::Right => self.right_hit,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TouchDebouncer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct TouchDebouncer {
    states: [HandTouchState; 2],
}

impl TouchDebouncer {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self, hand: Hand) -> &HandTouchState { &self.states[hand.index()] }

    pub fn state_mut(&mut self, hand: Hand) -> &mut HandTouchState { &mut self.states[hand.index()] }

    /// Fold one frame of probe results into edges.
    ///
    /// `probe_left` is only called when `right_hit` is false.
    pub fn step(&mut self, right_hit: bool, probe_left: impl FnOnce() -> bool) -> FrameEdges {
        let right = self.apply(Hand::Right, right_hit);
        let left_hit = !right_hit && probe_left();
        let left = self.apply(Hand::Left, left_hit);
        FrameEdges { right, left, right_hit, left_hit }
    }

    fn apply(&mut self, hand: Hand, hit: bool) -> Option<Edge> {
        let state = self.state_mut(hand);
        let edge = match (state.phase, hit) {
            (TouchPhase::Idle, true) => {
                state.phase = TouchPhase::Touching;
                Some(Edge::Started)
            }
            (TouchPhase::Touching, false) => {
                state.phase = TouchPhase::Idle;
                Some(Edge::Ended)
            }
            _ => None,
        };
        if let Some(e) = edge {
            debug!("{} hand touch {:?}", hand.as_str(), e);
        }
        edge
    }

    /// Force both hands idle without producing edges.
    ///
    /// Used when the detector is disabled mid-gesture: the pending end event
    /// is dropped rather than delivered late.
    pub fn reset_phases(&mut self) {
        for s in &mut self.states {
            s.phase = TouchPhase::Idle;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
