//! Static per-instance switch configuration.
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs the keys
//! it changes:
//!
//! ```toml
//! [dimensions]
//! radius = 0.02
//!
//! [modes]
//! wheel = true
//! wheel_step_deg = 15.0
//!
//! [events]
//! wheel_right = "VolumeUp"
//! wheel_left  = "VolumeDown"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatch::NetworkTarget;
use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// SwitchConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    pub dimensions: Dimensions,
    pub touch:      TouchConfig,
    pub modes:      ModeConfig,
    pub feedback:   FeedbackConfig,
    pub delivery:   DeliveryConfig,
    pub events:     EventNames,
}

/// Detection volume and liveness range, in meters / seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Radius of the detection cylinder.
    pub radius:                  f32,
    /// Full length of the cylinder along the anchor's forward axis.
    pub thickness:               f32,
    /// Viewer distance beyond which the liveness gate disables detection.
    pub max_activation_distance: f32,
    /// Seconds between liveness re-checks.
    pub check_interval_s:        f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions {
            radius:                  0.0075,
            thickness:               1.0,
            max_activation_distance: 5.0,
            check_interval_s:        5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    /// Minimum seconds between two start emissions (and between knob steps).
    pub throttling_delay_s:     f32,
    /// Probe with the extrapolated index fingertip instead of the hand pose.
    pub finger_mode:            bool,
    /// Require the grip axis to be held for a probe to succeed.
    pub grip:                   bool,
    /// Turn off direct interaction once the viewer is found to be in VR.
    pub disable_interact_in_vr: bool,
    /// Fire the interact event when the tracking source reports the key.
    pub desktop_key:            bool,
}

impl Default for TouchConfig {
    fn default() -> Self {
        TouchConfig {
            throttling_delay_s:     0.5,
            finger_mode:            true,
            grip:                   false,
            disable_interact_in_vr: true,
            desktop_key:            false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub knob:                  bool,
    pub knob_step_deg:         f32,
    pub directional:           bool,
    pub directional_threshold: f32,
    pub wheel:                 bool,
    pub wheel_step_deg:        f32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeConfig {
            knob:                  false,
            knob_step_deg:         10.0,
            directional:           false,
            directional_threshold: 0.8,
            wheel:                 false,
            wheel_step_deg:        1.0,
        }
    }
}

/// Haptic and audio side effects.  Haptic values are normalized 0–1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub haptics:          bool,
    pub haptic_duration:  f32,
    pub haptic_amplitude: f32,
    pub haptic_frequency: f32,
    pub sound_cue:        bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            haptics:          true,
            haptic_duration:  0.2,
            haptic_amplitude: 0.5,
            haptic_frequency: 0.1,
            sound_cue:        false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Drop events unless the target is owned by the local viewer.
    pub owner_only:     bool,
    /// Replicate events to remote observers instead of calling locally.
    pub networked:      bool,
    pub network_target: NetworkTarget,
}

/// Event names per transition.  An empty name disables that event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventNames {
    /// Primary event: simple-mode start, direct interaction, desktop key.
    pub interact:    String,
    pub touch_start: String,
    pub touch_end:   String,
    pub knob_right:  String,
    pub knob_left:   String,
    pub up:          String,
    pub down:        String,
    pub left:        String,
    pub right:       String,
    pub wheel_right: String,
    pub wheel_left:  String,
}

// ════════════════════════════════════════════════════════════════════════════
// Loading
// ════════════════════════════════════════════════════════════════════════════

impl SwitchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: SwitchConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the geometric and timing preconditions the core relies on.
    ///
    /// The core itself never calls this; a hand-built config is trusted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dimensions;
        positive("dimensions.radius", d.radius)?;
        positive("dimensions.thickness", d.thickness)?;
        positive("dimensions.check_interval_s", d.check_interval_s)?;
        non_negative("dimensions.max_activation_distance", d.max_activation_distance)?;
        non_negative("touch.throttling_delay_s", self.touch.throttling_delay_s)?;
        positive("modes.knob_step_deg", self.modes.knob_step_deg)?;
        positive("modes.wheel_step_deg", self.modes.wheel_step_deg)?;

        let t = self.modes.directional_threshold;
        if !(-1.0..=1.0).contains(&t) {
            return Err(ConfigError::invalid(
                "modes.directional_threshold",
                format!("{} is not a dot product in -1..=1", t),
            ));
        }

        let f = &self.feedback;
        unit("feedback.haptic_duration", f.haptic_duration)?;
        unit("feedback.haptic_amplitude", f.haptic_amplitude)?;
        unit("feedback.haptic_frequency", f.haptic_frequency)?;
        Ok(())
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 { Ok(()) }
    else { Err(ConfigError::invalid(field, format!("{} must be > 0", v))) }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 { Ok(()) }
    else { Err(ConfigError::invalid(field, format!("{} must be >= 0", v))) }
}

fn unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) { Ok(()) }
    else { Err(ConfigError::invalid(field, format!("{} is outside 0..=1", v))) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
