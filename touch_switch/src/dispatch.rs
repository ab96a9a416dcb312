//! Event dispatch: deliver a named event and play its feedback.
//!
//! Delivery goes through an [`EventSink`]; haptics and sound go through a
//! [`Feedback`].  Both are supplied by the host, so the switch does not care
//! whether an event ends up as a local call or a replicated broadcast.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SwitchConfig;
use crate::tracking::Hand;

/// Strength of the pulse that accompanies a delivered event.
pub const DISPATCH_PULSE: f32 = 1.0;

// ════════════════════════════════════════════════════════════════════════════
// Delivery
// ════════════════════════════════════════════════════════════════════════════

/// Which remote observers receive a replicated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTarget {
    #[default]
    All,
    Owner,
}

/// How the sink should deliver an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Local,
    Replicated(NetworkTarget),
}

/// Context handed to the sink alongside the event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchContext {
    pub hand:     Hand,
    pub delivery: Delivery,
}

// ════════════════════════════════════════════════════════════════════════════
// Capabilities
// ════════════════════════════════════════════════════════════════════════════

/// The receiver of named events.
pub trait EventSink {
    fn accept(&mut self, event_name: &str, ctx: &DispatchContext);

    /// Whether the local viewer owns this target (checked for owner-only
    /// switches).
    fn is_locally_owned(&self) -> bool { true }
}

/// A scaled haptic request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticPulse {
    pub duration:  f32,
    pub amplitude: f32,
    pub frequency: f32,
}

/// Fire-and-forget side effects.
pub trait Feedback {
    fn haptic(&mut self, hand: Hand, pulse: HapticPulse);
    fn play_cue(&mut self);
}

/// Feedback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn haptic(&mut self, _hand: Hand, _pulse: HapticPulse) {}
    fn play_cue(&mut self) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Recording implementations
// ════════════════════════════════════════════════════════════════════════════

/// One delivered event.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub name:     String,
    pub hand:     Hand,
    pub delivery: Delivery,
}

/// An `EventSink` that records what it receives.
#[derive(Debug, Clone)]
pub struct EventLog {
    pub entries: Vec<LoggedEvent>,
    pub owned:   bool,
}

impl Default for EventLog {
    fn default() -> Self { EventLog { entries: Vec::new(), owned: true } }
}

impl EventLog {
    pub fn new() -> Self { Self::default() }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn last(&self) -> Option<&LoggedEvent> { self.entries.last() }
}

impl EventSink for EventLog {
    fn accept(&mut self, event_name: &str, ctx: &DispatchContext) {
        self.entries.push(LoggedEvent {
            name:     event_name.to_string(),
            hand:     ctx.hand,
            delivery: ctx.delivery,
        });
    }

    fn is_locally_owned(&self) -> bool { self.owned }
}

/// A `Feedback` that records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct FeedbackLog {
    pub pulses: Vec<(Hand, HapticPulse)>,
    pub cues:   usize,
}

impl Feedback for FeedbackLog {
    fn haptic(&mut self, hand: Hand, pulse: HapticPulse) { self.pulses.push((hand, pulse)); }
    fn play_cue(&mut self) { self.cues += 1; }
}

// ════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatcher {
    pub owner_only: bool,
    pub delivery:   Delivery,
    pub haptics:    Option<HapticPulse>,
    pub sound_cue:  bool,
}

impl Dispatcher {
    pub fn from_config(cfg: &SwitchConfig) -> Self {
        let f = &cfg.feedback;
        let d = &cfg.delivery;
        Dispatcher {
            owner_only: d.owner_only,
            delivery:   if d.networked { Delivery::Replicated(d.network_target) } else { Delivery::Local },
            haptics:    f.haptics.then_some(HapticPulse {
                duration:  f.haptic_duration,
                amplitude: f.haptic_amplitude,
                frequency: f.haptic_frequency,
            }),
            sound_cue:  f.sound_cue,
        }
    }

    /// Deliver `event_name` to `target`.  Returns whether anything happened.
    ///
    /// Silently does nothing without a target, with an empty name, or when
    /// the switch is owner-only and the target is owned elsewhere.
    pub fn dispatch<S: EventSink + ?Sized>(
        &self,
        event_name: &str,
        hand:       Hand,
        target:     Option<&mut S>,
        feedback:   &mut dyn Feedback,
    ) -> bool {
        let Some(target) = target else { return false };
        if event_name.is_empty() || (self.owner_only && !target.is_locally_owned()) {
            return false;
        }

        self.pulse(hand, DISPATCH_PULSE, feedback);
        if self.sound_cue {
            feedback.play_cue();
        }

        debug!("dispatch `{}` ({} hand, {:?})", event_name, hand.as_str(), self.delivery);
        target.accept(event_name, &DispatchContext { hand, delivery: self.delivery });
        true
    }

    /// Play a haptic pulse scaled by `strength`, if haptics are enabled.
    pub fn pulse(&self, hand: Hand, strength: f32, feedback: &mut dyn Feedback) {
        if let Some(base) = self.haptics {
            feedback.haptic(hand, HapticPulse {
                duration:  base.duration * strength,
                amplitude: base.amplitude * strength,
                frequency: base.frequency,
            });
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(edit: impl FnOnce(&mut SwitchConfig)) -> Dispatcher {
        let mut c = SwitchConfig::default();
        edit(&mut c);
        Dispatcher::from_config(&c)
    }

    #[test]
    fn delivers_with_feedback() {
        let d = dispatcher(|c| c.feedback.sound_cue = true);
        let mut log = EventLog::new();
        let mut fb = FeedbackLog::default();
        assert!(d.dispatch("Toggle", Hand::Left, Some(&mut log), &mut fb));
        assert_eq!(log.names(), vec!["Toggle"]);
        assert_eq!(log.entries[0].hand, Hand::Left);
        assert_eq!(log.entries[0].delivery, Delivery::Local);
        assert_eq!(fb.cues, 1);
        assert_eq!(fb.pulses, vec![(Hand::Left, HapticPulse { duration: 0.2, amplitude: 0.5, frequency: 0.1 })]);
    }

    #[test]
    fn no_target_is_silent() {
        let d = dispatcher(|c| c.feedback.sound_cue = true);
        let mut fb = FeedbackLog::default();
        assert!(!d.dispatch::<EventLog>("Toggle", Hand::Right, None, &mut fb));
        assert!(fb.pulses.is_empty());
        assert_eq!(fb.cues, 0);
    }

    #[test]
    fn empty_name_is_silent() {
        let d = dispatcher(|_| {});
        let mut log = EventLog::new();
        let mut fb = FeedbackLog::default();
        assert!(!d.dispatch("", Hand::Right, Some(&mut log), &mut fb));
        assert!(log.entries.is_empty());
        assert!(fb.pulses.is_empty());
    }

    #[test]
    fn owner_only_blocks_foreign_target() {
        let d = dispatcher(|c| c.delivery.owner_only = true);
        let mut log = EventLog { owned: false, ..EventLog::default() };
        let mut fb = FeedbackLog::default();
        assert!(!d.dispatch("Toggle", Hand::Right, Some(&mut log), &mut fb));
        log.owned = true;
        assert!(d.dispatch("Toggle", Hand::Right, Some(&mut log), &mut fb));
        assert_eq!(log.entries.len(), 1);
    }

    #[test]
    fn networked_marks_replicated() {
        let d = dispatcher(|c| {
            c.delivery.networked = true;
            c.delivery.network_target = NetworkTarget::Owner;
        });
        let mut log = EventLog::new();
        d.dispatch("Toggle", Hand::Right, Some(&mut log), &mut NoFeedback);
        assert_eq!(log.entries[0].delivery, Delivery::Replicated(NetworkTarget::Owner));
    }

    #[test]
    fn pulse_scales_duration_and_amplitude_only() {
        let d = dispatcher(|_| {});
        let mut fb = FeedbackLog::default();
        d.pulse(Hand::Right, 0.5, &mut fb);
        assert_eq!(fb.pulses[0].1, HapticPulse { duration: 0.1, amplitude: 0.25, frequency: 0.1 });
    }

    #[test]
    fn haptics_disabled() {
        let d = dispatcher(|c| c.feedback.haptics = false);
        let mut log = EventLog::new();
        let mut fb = FeedbackLog::default();
        d.dispatch("Toggle", Hand::Right, Some(&mut log), &mut fb);
        d.pulse(Hand::Right, 0.5, &mut fb);
        assert!(fb.pulses.is_empty());
        assert_eq!(log.entries.len(), 1);
    }
}
