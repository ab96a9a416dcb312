//! Hand input — from LeapMotion hardware or keyboard/mouse simulation.
//!
//! Either way the result is a [`SimulatedTracking`] snapshot that the app
//! hands to the switch each frame.  The switch doesn't know which one it got.

use touch_switch::{Hand, Quat, SimulatedTracking, Vec3};

// ════════════════════════════════════════════════════════════════════════════
// SimInput — raw input from the visualizer window
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Nudge the fingertip in the switch plane by (dx, dy) steps.
    Nudge { dx: f32, dy: f32 },
    /// Move the fingertip along the press axis by `dz` steps.
    Push { dz: f32 },
    /// Drag the fingertip to a plane position given in radii.
    DragTo { x: f32, y: f32 },
    /// Roll the hand about the press axis, degrees.
    Roll { degrees: f32 },
    /// Toggle the fingertip between pressed (in the slab) and retracted.
    TogglePress,
    /// Switch which hand the keyboard drives.
    SwapHand,
    /// Toggle the grip trigger on the driven hand.
    ToggleGrip,
    /// Toggle the viewer between near and far (liveness gate).
    ToggleViewer,
    /// Desktop interaction (mouse click on the switch).
    Interact,
    /// Desktop interact key.
    DesktopKey,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// SimHand — keyboard-driven hand state
// ════════════════════════════════════════════════════════════════════════════

/// Viewer distance used when the "far" viewer is toggled on.
const FAR_VIEWER_M: f32 = 50.0;
/// Retracted fingertip distance, in slab half-thicknesses.
const RETRACT: f32 = 1.5;

/// The simulated hands, in anchor-local coordinates scaled by the switch
/// radius (x, y) and slab half-thickness (z).
#[derive(Clone, Debug)]
pub struct SimHand {
    pub driven:    Hand,
    /// Fingertip in the plane, in radii.
    pub plane:     [f32; 2],
    /// Fingertip along the press axis, in half-thicknesses.
    pub depth:     f32,
    pub roll_deg:  f32,
    pub grip:      bool,
    pub far:       bool,
    radius:        f32,
    half_thick:    f32,
    /// Set for one frame by `DesktopKey`.
    key_pulse:     bool,
}

impl SimHand {
    pub fn new(radius: f32, thickness: f32) -> Self {
        SimHand {
            driven:     Hand::Right,
            plane:      [0.0, 0.0],
            depth:      RETRACT,
            roll_deg:   0.0,
            grip:       false,
            far:        false,
            radius,
            half_thick: thickness * 0.5,
            key_pulse:  false,
        }
    }

    /// Apply one input.  Returns false for `Quit`; `Interact` is left to the
    /// caller.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Nudge { dx, dy } => {
                self.plane[0] += dx * 0.1;
                self.plane[1] += dy * 0.1;
            }
            SimInput::Push { dz } => {
                self.depth = (self.depth + dz * 0.1).clamp(-2.0 * RETRACT, 2.0 * RETRACT);
            }
            SimInput::DragTo { x, y } => {
                self.plane = [x, y];
            }
            SimInput::Roll { degrees } => self.roll_deg += degrees,
            SimInput::TogglePress => {
                self.depth = if self.depth.abs() < 1.0 { RETRACT } else { 0.0 };
            }
            SimInput::SwapHand => {
                self.driven = match self.driven {
                    Hand::Left  => Hand::Right,
                    Hand::Right => Hand::Left,
                };
            }
            SimInput::ToggleGrip   => self.grip = !self.grip,
            SimInput::ToggleViewer => self.far = !self.far,
            SimInput::DesktopKey   => self.key_pulse = true,
            SimInput::Interact     => {}
            SimInput::Quit         => return false,
        }
        true
    }

    /// Fingertip position in anchor-local meters.
    pub fn local_tip(&self) -> Vec3 {
        Vec3::new(
            self.plane[0] * self.radius,
            self.plane[1] * self.radius,
            self.depth * self.half_thick,
        )
    }

    /// Write the driven hand into `tracking`; the other hand is removed.
    /// The anchor is taken to sit at the origin with identity rotation.
    pub fn write(&mut self, tracking: &mut SimulatedTracking) {
        let other = match self.driven {
            Hand::Left  => Hand::Right,
            Hand::Right => Hand::Left,
        };
        tracking.clear_hand(other);
        tracking.set_fingertip(self.driven, self.local_tip());
        tracking.set_rotation(self.driven, Quat::from_rotation_z(self.roll_deg.to_radians()));
        tracking.hand_mut(self.driven).grip = if self.grip { 1.0 } else { 0.0 };
        self.write_overrides(tracking);
    }

    /// Write the keyboard-only state (viewer distance, desktop key) without
    /// touching the hands.  Used on top of hardware tracking too.
    pub fn write_overrides(&mut self, tracking: &mut SimulatedTracking) {
        tracking.viewer = Some(if self.far {
            Vec3::new(0.0, 0.0, -FAR_VIEWER_M)
        } else {
            Vec3::new(0.0, 0.0, -0.5)
        });
        tracking.desktop_key = std::mem::take(&mut self.key_pulse);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapMotion tracking (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Leap device coordinates (mm) of the switch centre.
#[cfg(feature = "leap")]
const LEAP_SWITCH_CENTRE_MM: [f32; 3] = [0.0, 200.0, 0.0];

/// Spawn a thread polling LeapC and publishing hands into a shared snapshot.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Leap reports millimetres with +Y up from the device; the switch sits
/// 20 cm above it, facing the user (+Z).
#[cfg(feature = "leap")]
pub fn spawn_leap_tracking() -> std::sync::Arc<std::sync::Mutex<SimulatedTracking>> {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use leaprs::*;
    use touch_switch::tracking::FingerBones;
    use touch_switch::Pose;
    use tracing::warn;

    let shared = Arc::new(Mutex::new(SimulatedTracking::new()));
    let out = Arc::clone(&shared);

    let to_world = |x: f32, y: f32, z: f32| {
        Vec3::new(
            x - LEAP_SWITCH_CENTRE_MM[0],
            y - LEAP_SWITCH_CENTRE_MM[1],
            z - LEAP_SWITCH_CENTRE_MM[2],
        ) * 0.001
    };

    thread::spawn(move || {
        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => { warn!("[leap] failed to create LeapC connection: {:?}", e); return; }
        };
        if let Err(e) = connection.open() {
            warn!("[leap] failed to open LeapMotion device: {:?}", e);
            return;
        }

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let Ok(mut snapshot) = out.lock() else { return };
                snapshot.clear_hand(Hand::Left);
                snapshot.clear_hand(Hand::Right);

                for h in frame.hands() {
                    let which = match h.hand_type() {
                        HandType::Left  => Hand::Left,
                        HandType::Right => Hand::Right,
                    };
                    let palm = h.palm();
                    let p = palm.position();
                    let q = palm.orientation();
                    let sample = snapshot.hand_mut(which);
                    sample.pose = Some(Pose::new(
                        to_world(p.x, p.y, p.z),
                        Quat::from_xyzw(q.x, q.y, q.z, q.w),
                    ));
                    sample.grip = h.grab_strength();

                    let fingers: Vec<_> = h.digits().collect();
                    if fingers.len() >= 2 {
                        let index = &fingers[1];
                        let inter  = index.intermediate().prev_joint();
                        let distal = index.distal().prev_joint();
                        sample.bones = Some(FingerBones {
                            intermediate: to_world(inter.x, inter.y, inter.z),
                            distal:       to_world(distal.x, distal.y, distal.z),
                        });
                    }
                }
            }
        }
    });

    shared
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use touch_switch::TrackingSource;

    #[test]
    fn toggle_press_enters_slab() {
        let mut h = SimHand::new(0.01, 0.02);
        assert!(h.local_tip().z > 0.01);
        h.apply(SimInput::TogglePress);
        assert_eq!(h.local_tip().z, 0.0);
        h.apply(SimInput::TogglePress);
        assert!(h.local_tip().z > 0.01);
    }

    #[test]
    fn nudge_moves_in_radius_units() {
        let mut h = SimHand::new(0.02, 0.02);
        for _ in 0..5 {
            h.apply(SimInput::Nudge { dx: 1.0, dy: 0.0 });
        }
        assert!((h.local_tip().x - 0.01).abs() < 1e-6);
    }

    #[test]
    fn write_drives_one_hand() {
        let mut h = SimHand::new(0.01, 0.02);
        let mut t = SimulatedTracking::new();
        h.write(&mut t);
        assert!(t.fingertip(Hand::Right).is_some());
        h.apply(SimInput::SwapHand);
        h.write(&mut t);
        assert!(t.fingertip(Hand::Right).is_none());
        assert!(t.fingertip(Hand::Left).is_some());
    }

    #[test]
    fn desktop_key_lasts_one_frame() {
        let mut h = SimHand::new(0.01, 0.02);
        let mut t = SimulatedTracking::new();
        h.apply(SimInput::DesktopKey);
        h.write(&mut t);
        assert!(t.desktop_key_pressed());
        h.write(&mut t);
        assert!(!t.desktop_key_pressed());
    }

    #[test]
    fn far_viewer_moves_viewer() {
        let mut h = SimHand::new(0.01, 0.02);
        let mut t = SimulatedTracking::new();
        h.apply(SimInput::ToggleViewer);
        h.write(&mut t);
        assert!(t.viewer_position().unwrap().length() > 10.0);
    }

    #[test]
    fn overrides_leave_hands_alone() {
        let mut h = SimHand::new(0.01, 0.02);
        let mut t = SimulatedTracking::new();
        t.set_fingertip(Hand::Left, Vec3::new(0.1, 0.2, 0.3));
        h.apply(SimInput::ToggleViewer);
        h.apply(SimInput::DesktopKey);
        h.write_overrides(&mut t);
        assert!(t.viewer_position().unwrap().length() > 10.0);
        assert!(t.desktop_key_pressed());
        assert!(t.fingertip(Hand::Left).is_some());
        assert!(t.fingertip(Hand::Right).is_none());
    }

    #[test]
    fn quit_stops() {
        let mut h = SimHand::new(0.01, 0.02);
        assert!(!h.apply(SimInput::Quit));
    }
}
