//! Top-level application state machine.
//!
//! `AppState` owns the `TouchSwitch`, the tracking snapshot it reads and the
//! keyboard-driven `SimHand`.  It applies `SimInput`s, steps the switch once
//! per frame and drives the visualizer.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use rand::Rng;
use touch_switch::config::EventNames;
use touch_switch::{EventLog, Hand, Pose, SimulatedTracking, SwitchConfig, TouchSwitch};
use tracing::info;

use crate::cue::SimFeedback;
use crate::source::{SimHand, SimInput};
use crate::visualizer::{RenderState, Visualizer};

/// How many recent event names the status bar shows.
const RECENT_EVENTS: usize = 6;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
pub struct AppConfig {
    pub switch:     SwitchConfig,
    /// Open a MIDI port for the sound cue.
    pub with_audio: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            switch:     sim_defaults(),
            with_audio: true,
        }
    }
}

/// Defaults for the simulator: every event named, sound cue on, the desktop
/// key (`K`) live, and direct interaction (`Enter`) kept available even
/// though the simulated viewer counts as in VR.
pub fn sim_defaults() -> SwitchConfig {
    let mut cfg = SwitchConfig { events: default_event_names(), ..SwitchConfig::default() };
    cfg.feedback.sound_cue           = true;
    cfg.touch.desktop_key            = true;
    cfg.touch.disable_interact_in_vr = false;
    cfg
}

/// Every transition named after itself, so the log shows all of them.
pub fn default_event_names() -> EventNames {
    EventNames {
        interact:    "interact".into(),
        touch_start: "touch_start".into(),
        touch_end:   "touch_end".into(),
        knob_right:  "knob_right".into(),
        knob_left:   "knob_left".into(),
        up:          "up".into(),
        down:        "down".into(),
        left:        "left".into(),
        right:       "right".into(),
        wheel_right: "wheel_right".into(),
        wheel_left:  "wheel_left".into(),
    }
}

/// Short label for the active modes, e.g. `knob+directional`.
pub fn mode_label(cfg: &SwitchConfig) -> String {
    let primary = if cfg.modes.knob {
        "knob"
    } else if cfg.modes.wheel {
        "wheel"
    } else {
        "simple"
    };
    if cfg.modes.directional {
        format!("{}+directional", primary)
    } else {
        primary.to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── switch and its inputs ────────────────────────────────────────────
    switch:   TouchSwitch<EventLog, SimFeedback>,
    tracking: SimulatedTracking,
    hand:     SimHand,

    /// Shared snapshot written by the LeapMotion thread.
    #[cfg(feature = "leap")]
    leap:     Option<std::sync::Arc<std::sync::Mutex<SimulatedTracking>>>,

    // ── status ───────────────────────────────────────────────────────────
    pub status: String,
    mode_label: String,
    /// Events already logged from the target.
    seen:       usize,
    recent:     Vec<String>,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        let dims = &cfg.switch.dimensions;
        let hand = SimHand::new(dims.radius, dims.thickness);
        let mode_label = mode_label(&cfg.switch);
        let switch = TouchSwitch::new(
            cfg.switch,
            Pose::IDENTITY,
            Some(EventLog::new()),
            SimFeedback::new(cfg.with_audio),
        );

        AppState {
            switch,
            tracking: SimulatedTracking::new(),
            hand,
            #[cfg(feature = "leap")]
            leap: None,
            status: format!("Ready: {} mode", mode_label),
            mode_label,
            seen: 0,
            recent: Vec::new(),
        }
    }

    /// Read hands from a LeapMotion snapshot instead of the keyboard.
    #[cfg(feature = "leap")]
    pub fn attach_leap(&mut self, shared: std::sync::Arc<std::sync::Mutex<SimulatedTracking>>) {
        self.leap = Some(shared);
    }

    /// Arm the switch's scheduled checks.
    pub fn start<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.switch.start(now, rng);
    }

    // ── process one SimInput ─────────────────────────────────────────────

    /// Returns false when the app should quit.
    pub fn handle_input(&mut self, input: SimInput, now: f32) -> bool {
        if input == SimInput::Interact {
            if !self.switch.interact(now, &self.tracking) {
                self.status = "interact unavailable (disabled, or in VR)".to_string();
            }
            return true;
        }
        self.hand.apply(input)
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, now: f32) {
        self.sync_tracking();
        self.switch.frame(now, &self.tracking);
        self.drain_events();
        self.switch.feedback_mut().tick();
    }

    fn sync_tracking(&mut self) {
        #[cfg(feature = "leap")]
        if let Some(shared) = &self.leap {
            if let Ok(snapshot) = shared.lock() {
                self.tracking = snapshot.clone();
            }
            self.hand.write_overrides(&mut self.tracking);
            return;
        }
        self.hand.write(&mut self.tracking);
    }

    fn drain_events(&mut self) {
        let Some(log) = self.switch.target() else { return };
        let fresh = &log.entries[self.seen.min(log.entries.len())..];
        for entry in fresh {
            info!("event {} ({} hand)", entry.name, entry.hand.as_str());
            self.status = format!("{} from {} hand", entry.name, entry.hand.as_str());
            self.recent.push(entry.name.clone());
        }
        self.seen = log.entries.len();
        if self.recent.len() > RECENT_EVENTS {
            let excess = self.recent.len() - RECENT_EVENTS;
            self.recent.drain(..excess);
        }
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn is_touching(&self) -> bool {
        self.switch.state(Hand::Right).is_touching() || self.switch.state(Hand::Left).is_touching()
    }

    pub fn events(&self) -> Vec<&str> {
        self.switch.target().map(|t| t.names()).unwrap_or_default()
    }

    pub fn switch(&self) -> &TouchSwitch<EventLog, SimFeedback> { &self.switch }

    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            hand:       &self.hand,
            touching:   self.is_touching(),
            enabled:    self.switch.is_enabled(),
            mode_label: &self.mode_label,
            status:     &self.status,
            recent:     &self.recent,
            flash:      self.switch.feedback().flash(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the hand source (keyboard by default, hardware with `--features leap`),
/// and drives the input/frame/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), String> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);

    #[cfg(feature = "leap")]
    app.attach_leap(crate::source::spawn_leap_tracking());

    let clock = Instant::now();
    app.start(0.0, &mut rand::thread_rng());

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        let now = clock.elapsed().as_secs_f32();

        // 1. Poll window input → translate to SimInput
        if !vis.poll_input() { break; }

        // 2. Drain inputs
        loop {
            match sim_rx.try_recv() {
                Ok(input) => {
                    if !app.handle_input(input, now) { return Ok(()); }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 3. Per-frame switch update
        app.tick(now);

        // 4. Render
        vis.render(&app.render_state());
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_app(edit: impl FnOnce(&mut SwitchConfig)) -> AppState {
        let mut cfg = AppConfig { with_audio: false, ..AppConfig::default() };
        edit(&mut cfg.switch);
        let mut app = AppState::new(cfg);
        app.start(0.0, &mut StdRng::seed_from_u64(7));
        app
    }

    #[test]
    fn press_emits_interact_then_start() {
        let mut app = make_app(|_| {});
        app.tick(0.05);
        assert!(app.events().is_empty());
        app.handle_input(SimInput::TogglePress, 0.1);
        app.tick(0.1);
        assert_eq!(app.events(), vec!["interact", "touch_start"]);
        assert!(app.is_touching());
    }

    #[test]
    fn release_emits_end() {
        let mut app = make_app(|_| {});
        app.handle_input(SimInput::TogglePress, 0.1);
        app.tick(0.1);
        app.handle_input(SimInput::TogglePress, 0.2);
        app.tick(0.2);
        assert_eq!(app.events().last(), Some(&"touch_end"));
        assert!(!app.is_touching());
    }

    #[test]
    fn wheel_drag_emits_wheel_steps() {
        let mut app = make_app(|c| c.modes.wheel = true);
        app.handle_input(SimInput::DragTo { x: 0.0, y: 0.5 }, 0.1);
        app.handle_input(SimInput::TogglePress, 0.1);
        app.tick(0.1);
        app.handle_input(SimInput::DragTo { x: -0.25, y: 0.43 }, 0.2);
        app.tick(0.2);
        assert!(app.events().iter().any(|e| e.starts_with("wheel_")));
    }

    #[test]
    fn interact_before_post_start_check() {
        let mut app = make_app(|_| {});
        app.tick(0.1);
        app.handle_input(SimInput::Interact, 0.2);
        assert!(app.events().contains(&"interact"));
    }

    #[test]
    fn interact_stays_available_with_sim_defaults() {
        let mut app = make_app(|_| {});
        app.tick(1.5);
        app.handle_input(SimInput::Interact, 1.6);
        assert!(app.events().contains(&"interact"));
    }

    #[test]
    fn interact_blocked_in_vr_after_start() {
        let mut app = make_app(|c| c.touch.disable_interact_in_vr = true);
        app.tick(1.5);
        app.handle_input(SimInput::Interact, 1.6);
        assert!(app.events().is_empty());
        assert!(app.status.contains("unavailable"));
    }

    #[test]
    fn far_viewer_disables_switch() {
        let mut app = make_app(|_| {});
        app.handle_input(SimInput::ToggleViewer, 0.1);
        app.tick(6.0);
        assert!(!app.switch().is_enabled());
        app.handle_input(SimInput::ToggleViewer, 6.1);
        app.tick(12.0);
        assert!(app.switch().is_enabled());
    }

    #[test]
    fn recent_events_are_bounded() {
        let mut app = make_app(|_| {});
        for i in 0..10 {
            let t = 0.1 + i as f32;
            app.handle_input(SimInput::TogglePress, t);
            app.tick(t);
        }
        assert!(app.render_state().recent.len() <= RECENT_EVENTS);
    }

    #[test]
    fn mode_labels() {
        let mut c = SwitchConfig::default();
        assert_eq!(mode_label(&c), "simple");
        c.modes.knob = true;
        c.modes.directional = true;
        assert_eq!(mode_label(&c), "knob+directional");
    }
}
