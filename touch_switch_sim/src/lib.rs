//! # touch_switch_sim
//!
//! Interactive harness for the [`touch_switch`] recognizer: a keyboard and
//! mouse driven hand, a front/side view of the switch, and a MIDI click for
//! the sound cue.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keyboard and mouse drive one hand.
//! * `leap` — **Hardware mode**: tracks real hands via LeapC.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | Arrows / left-drag | Move the fingertip in the switch plane (Shift = fine) |
//! | `W` / `S` | Push into / pull out of the switch |
//! | `Space` | Toggle pressed / retracted |
//! | `Q` / `E` | Roll the hand (knob mode) |
//! | `Tab` | Swap driven hand |
//! | `G` | Toggle grip trigger |
//! | `V` | Move the viewer near / far (liveness gate) |
//! | `Enter` | Direct interaction (click) |
//! | `K` | Desktop interact key |
//! | `Escape` | Quit |

pub mod source;
pub mod cue;
pub mod visualizer;
pub mod app;
