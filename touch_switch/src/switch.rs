//! `TouchSwitch` — one switch instance and its per-frame loop.
//!
//! The host calls [`TouchSwitch::frame`] once per rendered frame, after the
//! tracking runtime has updated poses.  A frame runs any due scheduler tasks
//! (liveness gate, post-start check), then, if the detector is enabled,
//! probes both hands, debounces, interprets and dispatches.

use glam::{Quat, Vec3};
use rand::Rng;
use tracing::{debug, info};

use crate::config::SwitchConfig;
use crate::debounce::{Edge, HandTouchState, TouchDebouncer};
use crate::dispatch::{Dispatcher, EventSink, Feedback};
use crate::geometry::Pose;
use crate::gesture::{Emission, GestureEvent, GestureInterpreter};
use crate::liveness::LivenessGate;
use crate::probe::GeometryProbe;
use crate::scheduler::{Scheduler, TaskKind};
use crate::tracking::{Hand, TrackingSource};

/// Seconds after `start` at which the VR interaction check runs.
pub const POST_START_DELAY_S: f32 = 1.0;

/// Right before left: the order edges and moves are processed in.
const HAND_ORDER: [Hand; 2] = [Hand::Right, Hand::Left];

// ════════════════════════════════════════════════════════════════════════════
// TouchSwitch
// ════════════════════════════════════════════════════════════════════════════

pub struct TouchSwitch<S: EventSink, F: Feedback> {
    config:      SwitchConfig,
    anchor:      Pose,

    // ── pipeline ──────────────────────────────────────────────────────────
    probe:       GeometryProbe,
    debouncer:   TouchDebouncer,
    interpreter: GestureInterpreter,
    dispatcher:  Dispatcher,

    // ── liveness ──────────────────────────────────────────────────────────
    gate:        LivenessGate,
    scheduler:   Scheduler,
    /// Direct (non-tracked) interaction; cleared by the post-start check.
    interact_enabled: bool,

    // ── collaborators ─────────────────────────────────────────────────────
    target:      Option<S>,
    feedback:    F,

    /// Reused per-call emission buffer.
    emissions:   Vec<Emission>,
}

impl<S: EventSink, F: Feedback> TouchSwitch<S, F> {
    pub fn new(config: SwitchConfig, anchor: Pose, target: Option<S>, feedback: F) -> Self {
        TouchSwitch {
            probe:       GeometryProbe::from_config(&config),
            debouncer:   TouchDebouncer::new(),
            interpreter: GestureInterpreter::from_config(&config),
            dispatcher:  Dispatcher::from_config(&config),
            gate:        LivenessGate::from_config(&config),
            scheduler:   Scheduler::new(),
            interact_enabled: true,
            target,
            feedback,
            emissions:   Vec::new(),
            config,
            anchor,
        }
    }

    /// Arm the liveness check (jittered) and the post-start check.  A switch
    /// that is already started keeps its schedule.
    pub fn start<R: Rng>(&mut self, now: f32, rng: &mut R) {
        if self.scheduler.next_due(TaskKind::LivenessCheck).is_some() {
            debug!("switch already started");
            return;
        }
        let jitter = self.gate.initial_delay(rng);
        self.scheduler.schedule(TaskKind::LivenessCheck, now + jitter);
        self.scheduler.schedule(TaskKind::PostStart, now + POST_START_DELAY_S);
        debug!("switch started; first liveness check in {:.2}s", jitter);
    }

    /// Scheduler tick, then detection.
    pub fn frame(&mut self, now: f32, tracking: &dyn TrackingSource) {
        self.tick(now, tracking);
        self.late_update(now, tracking);
    }

    // ── scheduled tasks ───────────────────────────────────────────────────

    /// Run scheduled tasks that have come due.  Runs even while disabled,
    /// since the liveness check is what re-enables the detector.
    pub fn tick(&mut self, now: f32, tracking: &dyn TrackingSource) {
        for task in self.scheduler.take_due(now) {
            match task {
                TaskKind::LivenessCheck => {
                    if let Some(enabled) = self.gate.check(self.anchor.position, tracking.viewer_position()) {
                        self.on_enabled_changed(enabled);
                    }
                    self.scheduler.schedule(TaskKind::LivenessCheck, now + self.gate.check_interval_s);
                }
                TaskKind::PostStart => {
                    if self.config.touch.disable_interact_in_vr && tracking.in_vr() {
                        info!("viewer is in VR; direct interaction disabled");
                        self.interact_enabled = false;
                    }
                }
            }
        }
    }

    // ── per-frame detection ───────────────────────────────────────────────

    /// Probe, debounce, interpret and dispatch for both hands.
    pub fn late_update(&mut self, now: f32, tracking: &dyn TrackingSource) {
        if !self.gate.is_enabled() || tracking.viewer_position().is_none() {
            return;
        }

        if tracking.in_vr() || tracking.debug_override().is_some() {
            let anchor = self.anchor;
            let probe = self.probe;
            let right_hit = probe.detect(Hand::Right, &anchor, tracking);
            let edges = self.debouncer.step(right_hit, || probe.detect(Hand::Left, &anchor, tracking));

            for hand in HAND_ORDER {
                match edges.edge(hand) {
                    Some(Edge::Started) => self.begin_touch(hand, now, tracking),
                    Some(Edge::Ended)   => self.end_touch(hand, tracking),
                    None                => {}
                }
            }
            for hand in HAND_ORDER {
                if edges.hit(hand) {
                    self.move_touch(hand, now, tracking);
                }
            }
        }

        if self.config.touch.desktop_key && tracking.desktop_key_pressed() {
            let mut out = self.take_buffer();
            out.push(Emission::Event(GestureEvent::Interact));
            self.flush(Hand::Right, out);
        }
    }

    /// Direct interaction: a right-hand start immediately followed by an end.
    /// Returns false when interaction is unavailable.
    pub fn interact(&mut self, now: f32, tracking: &dyn TrackingSource) -> bool {
        if !self.interact_enabled || !self.gate.is_enabled() {
            return false;
        }
        self.begin_touch(Hand::Right, now, tracking);
        self.end_touch(Hand::Right, tracking);
        true
    }

    fn begin_touch(&mut self, hand: Hand, now: f32, tracking: &dyn TrackingSource) {
        let local = self.local_point(hand, tracking).unwrap_or(Vec3::ZERO);
        let rotation = self.probe.hand_rotation(hand, tracking).unwrap_or(Quat::IDENTITY);
        let mut out = self.take_buffer();
        self.interpreter.on_touch_start(self.debouncer.state_mut(hand), local, rotation, now, &mut out);
        self.flush(hand, out);
    }

    fn move_touch(&mut self, hand: Hand, now: f32, tracking: &dyn TrackingSource) {
        let Some(local) = self.local_point(hand, tracking) else { return };
        let rotation = self.probe.hand_rotation(hand, tracking).unwrap_or(Quat::IDENTITY);
        let anchor = self.anchor;
        let mut out = self.take_buffer();
        self.interpreter.on_touch_move(self.debouncer.state_mut(hand), &anchor, local, rotation, now, &mut out);
        self.flush(hand, out);
    }

    fn end_touch(&mut self, hand: Hand, tracking: &dyn TrackingSource) {
        let local = self.local_point(hand, tracking);
        let mut out = self.take_buffer();
        self.interpreter.on_touch_end(local, &mut out);
        self.flush(hand, out);
    }

    fn local_point(&self, hand: Hand, tracking: &dyn TrackingSource) -> Option<Vec3> {
        self.probe
            .touch_point(hand, tracking)
            .map(|p| self.anchor.inverse_transform_point(p))
    }

    fn take_buffer(&mut self) -> Vec<Emission> {
        let mut out = std::mem::take(&mut self.emissions);
        out.clear();
        out
    }

    fn flush(&mut self, hand: Hand, mut out: Vec<Emission>) {
        for emission in out.drain(..) {
            match emission {
                Emission::Event(event) => {
                    let name = event.event_name(&self.config.events);
                    self.dispatcher.dispatch(name, hand, self.target.as_mut(), &mut self.feedback);
                }
                Emission::Pulse { strength } => {
                    self.dispatcher.pulse(hand, strength, &mut self.feedback);
                }
            }
        }
        self.emissions = out;
    }

    // ── enable / disable ──────────────────────────────────────────────────

    /// External toggle.  Disabling drops any gesture in progress without
    /// emitting its end.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.gate.is_enabled() != enabled {
            self.gate.force(enabled);
            self.on_enabled_changed(enabled);
        }
    }

    fn on_enabled_changed(&mut self, enabled: bool) {
        if !enabled {
            self.debouncer.reset_phases();
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool               { self.gate.is_enabled() }
    pub fn interact_enabled(&self) -> bool         { self.interact_enabled }
    pub fn config(&self) -> &SwitchConfig          { &self.config }
    pub fn anchor(&self) -> &Pose                  { &self.anchor }
    pub fn set_anchor(&mut self, anchor: Pose)     { self.anchor = anchor; }
    pub fn state(&self, hand: Hand) -> &HandTouchState { self.debouncer.state(hand) }
    pub fn target(&self) -> Option<&S>             { self.target.as_ref() }
    pub fn feedback(&self) -> &F                   { &self.feedback }
    pub fn feedback_mut(&mut self) -> &mut F       { &mut self.feedback }
    pub fn scheduler(&self) -> &Scheduler          { &self.scheduler }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventNames;
    use crate::dispatch::{EventLog, FeedbackLog};
    use crate::tracking::SimulatedTracking;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type TestSwitch = TouchSwitch<EventLog, FeedbackLog>;

    const INSIDE: Vec3  = Vec3::new(0.0, 0.01, 0.0);
    const OUTSIDE: Vec3 = Vec3::new(0.0, 0.0, 0.5);

    fn config(edit: impl FnOnce(&mut SwitchConfig)) -> SwitchConfig {
        let mut c = SwitchConfig::default();
        c.dimensions.radius = 0.05;
        c.dimensions.thickness = 0.04;
        c.events = EventNames {
            interact:    "Interact".into(),
            touch_start: "Start".into(),
            touch_end:   "End".into(),
            knob_right:  "KnobRight".into(),
            knob_left:   "KnobLeft".into(),
            up:          "Up".into(),
            down:        "Down".into(),
            left:        "Left".into(),
            right:       "Right".into(),
            wheel_right: "WheelRight".into(),
            wheel_left:  "WheelLeft".into(),
        };
        edit(&mut c);
        c
    }

    fn switch(edit: impl FnOnce(&mut SwitchConfig)) -> TestSwitch {
        TouchSwitch::new(config(edit), Pose::IDENTITY, Some(EventLog::new()), FeedbackLog::default())
    }

    fn names(sw: &TestSwitch) -> Vec<&str> {
        sw.target().map(|t| t.names()).unwrap_or_default()
    }

    fn tracking_at(hand: Hand, tip: Vec3) -> SimulatedTracking {
        let mut t = SimulatedTracking::new();
        t.set_fingertip(hand, tip);
        t
    }

    #[test]
    fn simple_tap_emits_start_and_end() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, OUTSIDE);
        sw.frame(0.0, &t);
        t.set_fingertip(Hand::Right, INSIDE);
        sw.frame(0.1, &t);
        sw.frame(0.2, &t);
        assert!(sw.state(Hand::Right).is_touching());
        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(0.3, &t);
        assert_eq!(names(&sw), vec!["Interact", "Start", "End"]);
        assert_eq!(sw.feedback().pulses.len(), 3);
    }

    #[test]
    fn retouch_within_throttle_emits_single_start() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, INSIDE);
        sw.frame(1.0, &t);
        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(1.1, &t);
        t.set_fingertip(Hand::Right, INSIDE);
        sw.frame(1.2, &t);
        assert!(sw.state(Hand::Right).is_touching());
        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(1.3, &t);
        assert_eq!(names(&sw), vec!["Interact", "Start", "End", "End"]);
    }

    #[test]
    fn right_hand_priority() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, INSIDE);
        t.set_fingertip(Hand::Left, INSIDE);
        sw.frame(0.0, &t);
        assert!(sw.state(Hand::Right).is_touching());
        assert!(!sw.state(Hand::Left).is_touching());
        assert!(sw.target().unwrap().entries.iter().all(|e| e.hand == Hand::Right));
    }

    #[test]
    fn left_hand_touches_when_right_is_away() {
        let mut sw = switch(|_| {});
        let t = tracking_at(Hand::Left, INSIDE);
        sw.frame(0.0, &t);
        assert!(sw.state(Hand::Left).is_touching());
        assert_eq!(sw.target().unwrap().last().unwrap().hand, Hand::Left);
    }

    #[test]
    fn knob_turn_through_frames() {
        let mut sw = switch(|c| c.modes.knob = true);
        let mut t = tracking_at(Hand::Right, INSIDE);
        sw.frame(0.0, &t);
        assert!(names(&sw).is_empty());
        // Start pulse at half strength.
        assert_eq!(sw.feedback().pulses.len(), 1);

        t.set_rotation(Hand::Right, Quat::from_rotation_z(10f32.to_radians()));
        sw.frame(0.1, &t);
        assert_eq!(names(&sw), vec!["KnobRight"]);

        t.set_rotation(Hand::Right, Quat::from_rotation_z(20f32.to_radians()));
        sw.frame(0.7, &t);
        sw.frame(0.8, &t);
        assert_eq!(names(&sw), vec!["KnobRight", "KnobRight"]);

        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(0.9, &t);
        assert_eq!(names(&sw), vec!["KnobRight", "KnobRight", "End"]);
    }

    #[test]
    fn wheel_swipe_three_and_a_half_steps() {
        let mut sw = switch(|c| { c.modes.wheel = true; c.modes.wheel_step_deg = 10.0; });
        let at = |deg: f32| Quat::from_rotation_z(deg.to_radians()) * Vec3::new(0.0, 0.03, 0.0);
        let mut t = tracking_at(Hand::Right, at(0.0));
        sw.frame(0.0, &t);
        for (i, deg) in [8.0, 17.0, 26.0, 35.0].into_iter().enumerate() {
            t.set_fingertip(Hand::Right, at(deg));
            sw.frame(0.1 * (i + 1) as f32, &t);
        }
        assert_eq!(names(&sw), vec!["WheelRight"; 3]);
        assert!((sw.state(Hand::Right).wheel_angle - 30.0).abs() < 1e-3);
    }

    #[test]
    fn directional_release_upward() {
        let mut sw = switch(|c| c.modes.directional = true);
        let mut t = tracking_at(Hand::Right, INSIDE);
        sw.frame(0.0, &t);
        // Leave through the top edge.
        t.set_fingertip(Hand::Right, Vec3::new(0.0, 0.08, 0.0));
        sw.frame(0.1, &t);
        assert_eq!(names(&sw), vec!["Interact", "Start", "End", "Up"]);
    }

    #[test]
    fn no_target_has_no_side_effects() {
        let mut sw: TestSwitch = TouchSwitch::new(
            config(|c| c.feedback.sound_cue = true),
            Pose::IDENTITY,
            None,
            FeedbackLog::default(),
        );
        let mut t = tracking_at(Hand::Right, INSIDE);
        sw.frame(0.0, &t);
        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(0.1, &t);
        assert!(sw.feedback().pulses.is_empty());
        assert_eq!(sw.feedback().cues, 0);
    }

    #[test]
    fn desktop_session_does_not_probe() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, INSIDE);
        t.in_vr = false;
        sw.frame(0.0, &t);
        assert!(names(&sw).is_empty());

        // A debug override probes even outside VR.
        t.debug = Some(Pose::from_position(INSIDE));
        sw.frame(0.1, &t);
        assert_eq!(names(&sw), vec!["Interact", "Start"]);
    }

    #[test]
    fn no_local_viewer_does_nothing() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, INSIDE);
        t.viewer = None;
        sw.frame(0.0, &t);
        assert!(!sw.state(Hand::Right).is_touching());
    }

    #[test]
    fn desktop_key_fires_interact() {
        let mut sw = switch(|c| c.touch.desktop_key = true);
        let mut t = SimulatedTracking::new();
        t.in_vr = false;
        t.desktop_key = true;
        sw.frame(0.0, &t);
        assert_eq!(names(&sw), vec!["Interact"]);
    }

    #[test]
    fn liveness_disables_far_viewer_and_rechecks() {
        let mut sw = switch(|_| {});
        let mut rng = StdRng::seed_from_u64(1);
        sw.start(0.0, &mut rng);
        let mut t = tracking_at(Hand::Right, INSIDE);
        t.viewer = Some(Vec3::new(0.0, 0.0, 10.0));

        sw.frame(5.0, &t);
        assert!(!sw.is_enabled());
        assert!(names(&sw).is_empty());
        let next = sw.scheduler().next_due(TaskKind::LivenessCheck).unwrap();
        assert!((next - 10.0).abs() < 1e-4);

        t.viewer = Some(Vec3::new(0.0, 0.0, 1.0));
        sw.frame(next, &t);
        assert!(sw.is_enabled());
        assert!(sw.state(Hand::Right).is_touching());
    }

    #[test]
    fn second_start_keeps_schedule() {
        let mut sw = switch(|_| {});
        let mut rng = StdRng::seed_from_u64(3);
        sw.start(0.0, &mut rng);
        let first = sw.scheduler().next_due(TaskKind::LivenessCheck);
        sw.start(0.5, &mut rng);
        assert_eq!(sw.scheduler().next_due(TaskKind::LivenessCheck), first);

        let t = tracking_at(Hand::Right, OUTSIDE);
        sw.tick(1.2, &t);
        assert_eq!(sw.scheduler().next_due(TaskKind::PostStart), None);
    }

    #[test]
    fn disabling_mid_touch_drops_end() {
        let mut sw = switch(|_| {});
        let mut t = tracking_at(Hand::Right, INSIDE);
        sw.frame(0.0, &t);
        sw.set_enabled(false);
        t.set_fingertip(Hand::Right, OUTSIDE);
        sw.frame(0.1, &t);
        sw.set_enabled(true);
        sw.frame(0.2, &t);
        assert_eq!(names(&sw), vec!["Interact", "Start"]);
    }

    #[test]
    fn post_start_disables_interact_in_vr() {
        let mut sw = switch(|_| {});
        let mut rng = StdRng::seed_from_u64(3);
        sw.start(0.0, &mut rng);
        let t = SimulatedTracking::new();
        assert!(sw.interact(0.5, &t));
        sw.tick(1.0, &t);
        assert!(!sw.interact_enabled());
        assert!(!sw.interact(1.5, &t));
        assert_eq!(names(&sw), vec!["Interact", "Start", "End"]);
    }

    #[test]
    fn post_start_keeps_interact_on_desktop() {
        let mut sw = switch(|_| {});
        let mut rng = StdRng::seed_from_u64(3);
        sw.start(0.0, &mut rng);
        let mut t = SimulatedTracking::new();
        t.in_vr = false;
        sw.tick(1.0, &t);
        assert!(sw.interact_enabled());
    }

    #[test]
    fn anchor_rotation_moves_the_slab() {
        let mut sw = switch(|_| {});
        sw.set_anchor(Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)));
        // 3 cm along world Z is sideways for the rotated anchor: inside.
        let t = tracking_at(Hand::Right, Vec3::new(0.0, 0.0, 0.03));
        sw.frame(0.0, &t);
        assert!(sw.state(Hand::Right).is_touching());
    }
}
