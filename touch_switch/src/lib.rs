//! # touch_switch
//!
//! A per-frame touch-switch recognizer for tracked hands.  A small cylinder
//! is attached to an anchor pose; each frame the tracked fingertip of each
//! hand is tested against it, the results are debounced into start / move /
//! end edges, and the configured gesture mode turns those edges into named
//! events.
//!
//! ## Pipeline
//!
//! | Stage | Module | Per frame |
//! |---|---|---|
//! | Liveness gate | [`liveness`], [`scheduler`] | only when a check is due |
//! | Geometry probe | [`probe`] | one containment test per hand |
//! | Touch debouncer | [`debounce`] | edges, right hand first |
//! | Mode handlers | [`gesture`] | Simple / Knob / Wheel, Directional on end |
//! | Dispatcher | [`dispatch`] | haptic pulse, sound cue, delivery |
//!
//! [`TouchSwitch`] owns one instance of each stage and runs them in order.
//!
//! ## Modes
//!
//! | Mode | Gesture | Events |
//! |---|---|---|
//! | Simple | touch and release | `interact`, `touch_start`, `touch_end` |
//! | Knob | twist the hand while touching | `knob_right` / `knob_left` per step |
//! | Wheel | drag the fingertip around the centre | `wheel_right` / `wheel_left` per step |
//! | Directional | release towards an edge | `up` / `down` / `left` / `right` |
//!
//! ## Collaborators
//!
//! The host supplies a [`TrackingSource`] each frame and owns an
//! [`EventSink`] target and a [`Feedback`] implementation.  Nothing in this
//! crate touches a global player, input device or network.

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod liveness;
pub mod probe;
pub mod scheduler;
pub mod switch;
pub mod tracking;

pub use glam::{Quat, Vec3};

pub use config::SwitchConfig;
pub use dispatch::{Delivery, DispatchContext, EventLog, EventSink, Feedback, HapticPulse, NoFeedback};
pub use error::ConfigError;
pub use geometry::Pose;
pub use gesture::GestureEvent;
pub use switch::TouchSwitch;
pub use tracking::{Hand, SimulatedTracking, TrackingSource};
