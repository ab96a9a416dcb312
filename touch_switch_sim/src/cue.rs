//! Sound cue and haptic feedback for the simulator.
//!
//! The sound cue is a short MIDI note played on its own thread so the frame
//! loop never waits for note-off.  There is no haptic device on a desktop, so
//! pulses are logged and remembered for the visualizer to flash.

use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use touch_switch::{Feedback, Hand, HapticPulse};
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

/// Try to open the first available MIDI output port.
/// Falls back to `NullOut` with a warning if none found.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("touch_switch_cue") {
        Ok(m)  => m,
        Err(e) => {
            warn!("[cue] MIDI init error: {}; sound cue disabled", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    let Some(port) = ports.first() else {
        warn!("[cue] no MIDI output ports found; sound cue disabled");
        return Box::new(NullOut);
    };

    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    info!("[cue] opening MIDI port: {}", name);

    match midi_out.connect(port, "touch-switch-cue") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!("[cue] failed to connect: {}; sound cue disabled", e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CuePlayer — the note thread
// ════════════════════════════════════════════════════════════════════════════

enum CueCommand {
    Play,
    Quit,
}

/// GM program for the click sound (Woodblock).
const CUE_PROGRAM:  u8  = 115;
const CUE_NOTE:     u8  = 76;
const CUE_VELOCITY: u8  = 100;
const CUE_CHANNEL:  u8  = 0;
const CUE_LEN:      Duration = Duration::from_millis(120);

/// Handle to the cue thread.
pub struct CuePlayer {
    cmd_tx: Sender<CueCommand>,
}

impl CuePlayer {
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<CueCommand>();
        thread::spawn(move || {
            let mut midi = open_midi_output();
            midi.program_change(CUE_CHANNEL, CUE_PROGRAM);
            for cmd in cmd_rx {
                match cmd {
                    CueCommand::Play => {
                        midi.note_on(CUE_CHANNEL, CUE_NOTE, CUE_VELOCITY);
                        thread::sleep(CUE_LEN);
                        midi.note_off(CUE_CHANNEL, CUE_NOTE);
                    }
                    CueCommand::Quit => return,
                }
            }
        });
        CuePlayer { cmd_tx }
    }

    pub fn play(&self) { let _ = self.cmd_tx.send(CueCommand::Play); }
}

impl Drop for CuePlayer {
    fn drop(&mut self) { let _ = self.cmd_tx.send(CueCommand::Quit); }
}

// ════════════════════════════════════════════════════════════════════════════
// SimFeedback
// ════════════════════════════════════════════════════════════════════════════

/// How long a haptic pulse flashes the window border, in frames per unit of
/// pulse duration.
const FLASH_FRAMES_PER_S: f32 = 60.0;

/// `Feedback` for the simulator: MIDI cue plus a visual haptic stand-in.
pub struct SimFeedback {
    player:     Option<CuePlayer>,
    /// Remaining flash frames and amplitude of the latest pulse.
    flash:      Option<(u32, f32, Hand)>,
    pub pulses: usize,
    pub cues:   usize,
}

impl SimFeedback {
    /// `with_audio = false` skips opening a MIDI port entirely.
    pub fn new(with_audio: bool) -> Self {
        SimFeedback {
            player: with_audio.then(CuePlayer::spawn),
            flash:  None,
            pulses: 0,
            cues:   0,
        }
    }

    /// Advance the flash by one frame.
    pub fn tick(&mut self) {
        if let Some((frames, amp, hand)) = self.flash {
            self.flash = frames.checked_sub(1).filter(|f| *f > 0).map(|f| (f, amp, hand));
        }
    }

    /// Current flash amplitude and hand, if a pulse is still showing.
    pub fn flash(&self) -> Option<(f32, Hand)> {
        self.flash.map(|(_, amp, hand)| (amp, hand))
    }
}

impl Feedback for SimFeedback {
    fn haptic(&mut self, hand: Hand, pulse: HapticPulse) {
        debug!(
            "haptic {} hand: {:.2}s amp {:.2} freq {:.2}",
            hand.as_str(), pulse.duration, pulse.amplitude, pulse.frequency
        );
        self.pulses += 1;
        let frames = (pulse.duration * FLASH_FRAMES_PER_S).round().max(1.0) as u32;
        self.flash = Some((frames, pulse.amplitude, hand));
    }

    fn play_cue(&mut self) {
        self.cues += 1;
        if let Some(p) = &self.player {
            p.play();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(duration: f32) -> HapticPulse {
        HapticPulse { duration, amplitude: 0.5, frequency: 0.1 }
    }

    #[test]
    fn pulse_flashes_for_its_duration() {
        let mut fb = SimFeedback::new(false);
        fb.haptic(Hand::Left, pulse(0.05));
        assert_eq!(fb.flash(), Some((0.5, Hand::Left)));
        for _ in 0..2 { fb.tick(); }
        assert!(fb.flash().is_some());
        for _ in 0..2 { fb.tick(); }
        assert!(fb.flash().is_none());
    }

    #[test]
    fn cue_without_audio_still_counts() {
        let mut fb = SimFeedback::new(false);
        fb.play_cue();
        fb.play_cue();
        assert_eq!(fb.cues, 2);
    }
}
