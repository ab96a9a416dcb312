//! Gesture mode handlers: turn touch edges into semantic events.
//!
//! | Mode | Runs on | Emits |
//! |---|---|---|
//! | Simple | start, end | `interact` + `touch_start`; `touch_end` |
//! | Knob | start (baseline), move | `knob_right` / `knob_left` per step |
//! | Wheel | start (baseline), move | `wheel_right` / `wheel_left`, one per step |
//! | Directional | end | any of `up` / `down` / `right` / `left` |
//!
//! Knob, Wheel and Simple are exclusive (priority Knob > Wheel > Simple).
//! Directional is checked at end regardless of the active mode, and is not
//! exclusive between directions: a diagonal release past the threshold on two
//! axes fires both.

use glam::{Quat, Vec3};
use tracing::debug;

use crate::config::{EventNames, SwitchConfig};
use crate::debounce::HandTouchState;
use crate::geometry::{
    delta_angle_deg, normalize_or_zero, planar_angle_deg, project_on_plane, signed_angle_deg,
    Pose, LOCAL_FORWARD, LOCAL_RIGHT, LOCAL_UP,
};

/// Float-rounding allowance on the knob threshold.  A hand turned by exactly
/// one step reads back a few ten-thousandths of a degree short after the
/// quaternion round trip; anything further off than this is still ignored.
const KNOB_STEP_TOLERANCE_DEG: f32 = 1e-3;

/// Strength of the pulse played when a knob/directional touch begins.
pub const MODE_START_PULSE: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// A semantic event produced by a mode handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureEvent {
    Interact,
    TouchStart,
    TouchEnd,
    KnobRight,
    KnobLeft,
    Up,
    Down,
    Left,
    Right,
    WheelRight,
    WheelLeft,
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interact   => "interact",
            Self::TouchStart => "touch-start",
            Self::TouchEnd   => "touch-end",
            Self::KnobRight  => "knob-right",
            Self::KnobLeft   => "knob-left",
            Self::Up         => "up",
            Self::Down       => "down",
            Self::Left       => "left",
            Self::Right      => "right",
            Self::WheelRight => "wheel-right",
            Self::WheelLeft  => "wheel-left",
        }
    }

    /// The configured receiver-side name for this event.
    pub fn event_name<'a>(&self, names: &'a EventNames) -> &'a str {
        match self {
            Self::Interact   => &names.interact,
            Self::TouchStart => &names.touch_start,
            Self::TouchEnd   => &names.touch_end,
            Self::KnobRight  => &names.knob_right,
            Self::KnobLeft   => &names.knob_left,
            Self::Up         => &names.up,
            Self::Down       => &names.down,
            Self::Left       => &names.left,
            Self::Right      => &names.right,
            Self::WheelRight => &names.wheel_right,
            Self::WheelLeft  => &names.wheel_left,
        }
    }
}

/// Output of a handler: an event to dispatch, or a bare haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission {
    Event(GestureEvent),
    Pulse { strength: f32 },
}

/// The mode that owns start/move handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMode {
    Simple,
    Knob,
    Wheel,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct GestureInterpreter {
    pub mode:                  ActiveMode,
    pub directional:           bool,
    pub knob_step_deg:         f32,
    pub wheel_step_deg:        f32,
    pub directional_threshold: f32,
    pub throttling_delay_s:    f32,
}

impl GestureInterpreter {
    pub fn from_config(cfg: &SwitchConfig) -> Self {
        let m = &cfg.modes;
        let mode = if m.knob {
            ActiveMode::Knob
        } else if m.wheel {
            ActiveMode::Wheel
        } else {
            ActiveMode::Simple
        };
        debug_assert!(m.knob_step_deg > 0.0, "knob_step_deg must be positive");
        debug_assert!(m.wheel_step_deg > 0.0, "wheel_step_deg must be positive");
        GestureInterpreter {
            mode,
            directional:           m.directional,
            knob_step_deg:         m.knob_step_deg,
            wheel_step_deg:        m.wheel_step_deg,
            directional_threshold: m.directional_threshold,
            throttling_delay_s:    cfg.touch.throttling_delay_s,
        }
    }

    /// Capture start data, then emit the start events unless throttled.
    ///
    /// `local` is the anchor-local touch point, `hand_rotation` the current
    /// world hand rotation.  Capture always happens; only emission is gated.
    pub fn on_touch_start(
        &self,
        state:         &mut HandTouchState,
        local:         Vec3,
        hand_rotation: Quat,
        now:           f32,
        out:           &mut Vec<Emission>,
    ) {
        state.touch_start_local = local;
        match self.mode {
            ActiveMode::Knob  => state.reference_rotation = hand_rotation.inverse(),
            ActiveMode::Wheel => state.wheel_angle = planar_angle_deg(local),
            ActiveMode::Simple => {}
        }

        if let Some(last) = state.last_start_emit {
            if now - last < self.throttling_delay_s {
                debug!("touch start throttled ({:.3}s since last)", now - last);
                return;
            }
        }
        state.last_start_emit = Some(now);

        if self.mode == ActiveMode::Simple {
            out.push(Emission::Event(GestureEvent::Interact));
            out.push(Emission::Event(GestureEvent::TouchStart));
        }
        if self.mode == ActiveMode::Knob || self.directional {
            out.push(Emission::Pulse { strength: MODE_START_PULSE });
        }
    }

    /// Per-frame handling while touching.
    pub fn on_touch_move(
        &self,
        state:         &mut HandTouchState,
        anchor:        &Pose,
        local:         Vec3,
        hand_rotation: Quat,
        now:           f32,
        out:           &mut Vec<Emission>,
    ) {
        match self.mode {
            ActiveMode::Knob   => self.process_knob(state, anchor, hand_rotation, now, out),
            ActiveMode::Wheel  => self.process_wheel(state, local, out),
            ActiveMode::Simple => {}
        }
    }

    /// End handling.  `local_end` is the anchor-local point at release, if
    /// the hand is still tracked.
    pub fn on_touch_end(&self, local_end: Option<Vec3>, out: &mut Vec<Emission>) {
        out.push(Emission::Event(GestureEvent::TouchEnd));
        if !self.directional {
            return;
        }
        let Some(local_end) = local_end else { return };

        let dir = normalize_or_zero(project_on_plane(normalize_or_zero(local_end), LOCAL_FORWARD));
        let t = self.directional_threshold;
        if dir.dot(LOCAL_UP)     > t { out.push(Emission::Event(GestureEvent::Up)); }
        if dir.dot(-LOCAL_UP)    > t { out.push(Emission::Event(GestureEvent::Down)); }
        if dir.dot(LOCAL_RIGHT)  > t { out.push(Emission::Event(GestureEvent::Right)); }
        if dir.dot(-LOCAL_RIGHT) > t { out.push(Emission::Event(GestureEvent::Left)); }
    }

    // ── Knob ──────────────────────────────────────────────────────────────

    fn process_knob(
        &self,
        state:         &mut HandTouchState,
        anchor:        &Pose,
        hand_rotation: Quat,
        now:           f32,
        out:           &mut Vec<Emission>,
    ) {
        let up = anchor.up();
        let turned = hand_rotation * state.reference_rotation * up;
        let angle = signed_angle_deg(up, turned, anchor.forward());

        if angle.abs() + KNOB_STEP_TOLERANCE_DEG < self.knob_step_deg {
            return;
        }
        if let Some(last) = state.last_step {
            if now - last <= self.throttling_delay_s {
                return;
            }
        }
        state.last_step = Some(now);
        let event = if angle > 0.0 { GestureEvent::KnobRight } else { GestureEvent::KnobLeft };
        debug!("knob step {:+.1}° → {}", angle, event.as_str());
        out.push(Emission::Event(event));
        state.reference_rotation = hand_rotation.inverse();
    }

    // ── Wheel ─────────────────────────────────────────────────────────────

    fn process_wheel(&self, state: &mut HandTouchState, local: Vec3, out: &mut Vec<Emission>) {
        let current = planar_angle_deg(local);
        let delta = delta_angle_deg(state.wheel_angle, current);
        let steps = (delta.abs() / self.wheel_step_deg).floor() as u32;
        if steps == 0 {
            return;
        }
        let event = if delta > 0.0 { GestureEvent::WheelRight } else { GestureEvent::WheelLeft };
        for _ in 0..steps {
            out.push(Emission::Event(event));
        }
        state.wheel_angle += delta.signum() * self.wheel_step_deg * steps as f32;
        debug!("wheel {} ×{} (Δ{:+.1}°)", event.as_str(), steps, delta);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
