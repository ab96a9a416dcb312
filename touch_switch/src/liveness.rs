//! Liveness gate. Switches the detector off when nobody is near it.
//!
//! Runs from the scheduler every `check_interval_s`, never per frame.  The
//! first check is jittered so many switches created together don't all
//! check on the same frame.

use glam::Vec3;
use rand::Rng;
use tracing::info;

use crate::config::SwitchConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct LivenessGate {
    pub max_distance:     f32,
    pub check_interval_s: f32,
    enabled:              bool,
}

impl LivenessGate {
    pub fn from_config(cfg: &SwitchConfig) -> Self {
        LivenessGate {
            max_distance:     cfg.dimensions.max_activation_distance,
            check_interval_s: cfg.dimensions.check_interval_s,
            enabled:          true,
        }
    }

    pub fn is_enabled(&self) -> bool { self.enabled }

    pub(crate) fn force(&mut self, enabled: bool) { self.enabled = enabled; }

    /// Random delay in `[0, interval)` before the first check.
    pub fn initial_delay<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.check_interval_s > 0.0 {
            rng.gen_range(0.0..self.check_interval_s)
        } else {
            0.0
        }
    }

    /// Whether a viewer at `viewer` is close enough to `anchor`.
    pub fn in_range(&self, anchor: Vec3, viewer: Vec3) -> bool {
        anchor.distance(viewer) <= self.max_distance
    }

    /// Re-evaluate.  Returns `Some(new_state)` when the state changed.
    /// Without a viewer the state is left as it is.
    pub fn check(&mut self, anchor: Vec3, viewer: Option<Vec3>) -> Option<bool> {
        let viewer = viewer?;
        let in_range = self.in_range(anchor, viewer);
        if in_range == self.enabled {
            return None;
        }
        self.enabled = in_range;
        info!(
            "liveness: detector {} (viewer at {:.2} m)",
            if in_range { "enabled" } else { "disabled" },
            anchor.distance(viewer)
        );
        Some(in_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gate() -> LivenessGate {
        LivenessGate::from_config(&SwitchConfig::default())
    }

    #[test]
    fn disables_when_far_and_reenables_when_near() {
        let mut g = gate();
        assert!(g.is_enabled());
        assert_eq!(g.check(Vec3::ZERO, Some(Vec3::new(0.0, 0.0, 6.0))), Some(false));
        assert!(!g.is_enabled());
        assert_eq!(g.check(Vec3::ZERO, Some(Vec3::new(0.0, 0.0, 7.0))), None);
        assert_eq!(g.check(Vec3::ZERO, Some(Vec3::new(0.0, 0.0, 5.0))), Some(true));
    }

    #[test]
    fn no_viewer_keeps_state() {
        let mut g = gate();
        assert_eq!(g.check(Vec3::ZERO, None), None);
        assert!(g.is_enabled());
    }

    #[test]
    fn initial_delay_within_interval() {
        let g = gate();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let d = g.initial_delay(&mut rng);
            assert!((0.0..5.0).contains(&d));
        }
    }
}
