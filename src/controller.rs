//! Masking volume control law
//!
//! A threshold rule picks the target volume for each block and a first-order
//! exponential smoothing step moves the current volume toward it, so the
//! masking sound swells over transient noise and fades back once the room
//! is quiet again.

use crate::error::ConfigError;
use crate::estimator;
use crate::playback::VolumeSink;
use crate::status::{MaskingStatus, StatusSink};

/// Immutable tuning of the volume controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    sensitivity_threshold: f32,
    base_volume: f32,
    max_volume: f32,
    smoothing_factor: f32,
}

impl ControllerSettings {
    /// Validate and build controller settings
    pub fn new(
        sensitivity_threshold: f32,
        base_volume: f32,
        max_volume: f32,
        smoothing_factor: f32,
    ) -> Result<Self, ConfigError> {
        if !sensitivity_threshold.is_finite() || sensitivity_threshold <= 0.0 {
            return Err(ConfigError::Sensitivity(sensitivity_threshold));
        }
        for (name, value) in [("base volume", base_volume), ("max volume", max_volume)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::VolumeRange { name, value });
            }
        }
        if base_volume > max_volume {
            return Err(ConfigError::VolumeOrder {
                base: base_volume,
                max: max_volume,
            });
        }
        if !(smoothing_factor > 0.0 && smoothing_factor <= 1.0) {
            return Err(ConfigError::Smoothing(smoothing_factor));
        }

        Ok(Self {
            sensitivity_threshold,
            base_volume,
            max_volume,
            smoothing_factor,
        })
    }

    pub fn sensitivity_threshold(&self) -> f32 {
        self.sensitivity_threshold
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn max_volume(&self) -> f32 {
        self.max_volume
    }

    pub fn smoothing_factor(&self) -> f32 {
        self.smoothing_factor
    }
}

/// Outcome of a single controller step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeUpdate {
    /// The block was classified as noisy
    pub masking_active: bool,
    /// Smoothed volume to hand to the playback sink
    pub commanded_volume: f32,
}

/// Smoothed volume carried from one block to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    settings: ControllerSettings,
    current_volume: f32,
}

impl ControllerState {
    /// Start at the quiet baseline
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            current_volume: settings.base_volume,
        }
    }

    pub fn current_volume(&self) -> f32 {
        self.current_volume
    }

    /// Advance the smoothed volume by one block given its energy metric
    pub fn update(&mut self, metric: f32) -> VolumeUpdate {
        let s = &self.settings;
        let masking_active = metric > s.sensitivity_threshold;
        let target = if masking_active {
            s.max_volume
        } else {
            s.base_volume
        };

        let next = self.current_volume + (target - self.current_volume) * s.smoothing_factor;
        self.current_volume = next.clamp(0.0, s.max_volume);

        VolumeUpdate {
            masking_active,
            commanded_volume: self.current_volume,
        }
    }
}

/// One pass of the control loop: estimate, update, then notify both sinks
pub struct Controller {
    state: ControllerState,
}

impl Controller {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            state: ControllerState::new(settings),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Run one captured block through the estimator and control law.
    ///
    /// The volume is pushed to the playback sink before the status record is
    /// published, so the display never runs ahead of what is audible.
    pub fn process_block<V, S>(&mut self, block: &[f32], volume: &V, status: &mut S) -> MaskingStatus
    where
        V: VolumeSink + ?Sized,
        S: StatusSink + ?Sized,
    {
        let noise_metric = estimator::estimate(block);
        let update = self.state.update(noise_metric);

        volume.set_volume(update.commanded_volume);
        let record = MaskingStatus {
            is_masking_active: update.masking_active,
            noise_metric,
            commanded_volume: update.commanded_volume,
        };
        status.publish(&record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn settings(sensitivity: f32, base: f32, max: f32, smoothing: f32) -> ControllerSettings {
        ControllerSettings::new(sensitivity, base, max, smoothing).unwrap()
    }

    fn default_settings() -> ControllerSettings {
        settings(0.015, 0.2, 1.0, 0.05)
    }

    #[test]
    fn test_starts_at_base_volume() {
        let state = ControllerState::new(default_settings());
        assert_eq!(state.current_volume(), 0.2);
    }

    #[test]
    fn test_quiet_baseline_is_fixed_point() {
        let mut state = ControllerState::new(default_settings());
        for metric in [0.0, 0.001, 0.015] {
            let update = state.update(metric);
            assert_eq!(update.commanded_volume, 0.2);
            assert!(!update.masking_active);
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut state = ControllerState::new(default_settings());
        assert!(!state.update(0.015).masking_active);
        assert!(state.update(0.0151).masking_active);
    }

    #[test]
    fn test_reference_scenario() {
        let mut state = ControllerState::new(default_settings());
        let metrics = [0.001, 0.001, 0.05, 0.05, 0.001];
        let expected = [0.2, 0.2, 0.24, 0.278, 0.2741];

        for (metric, want) in metrics.iter().zip(expected) {
            let got = state.update(*metric).commanded_volume;
            assert!((got - want).abs() < 1e-4, "expected {want}, got {got}");
        }
    }

    #[test]
    fn test_monotonic_convergence_to_max() {
        for smoothing in [0.01, 0.05, 0.2, 0.5] {
            let mut state = ControllerState::new(settings(0.015, 0.2, 0.9, smoothing));
            let steps = (5.0 / smoothing).ceil() as usize;
            let mut previous = state.current_volume();

            for _ in 0..steps {
                let volume = state.update(0.5).commanded_volume;
                assert!(volume > previous, "volume must rise on every step");
                assert!(volume <= 0.9);
                previous = volume;
            }

            assert!((previous - 0.9).abs() < 0.01 * 0.9);
        }
    }

    #[test]
    fn test_decays_back_to_base() {
        let mut state = ControllerState::new(settings(0.015, 0.2, 1.0, 0.1));
        for _ in 0..100 {
            state.update(1.0);
        }
        let mut previous = state.current_volume();
        for _ in 0..100 {
            let volume = state.update(0.0).commanded_volume;
            assert!(volume <= previous);
            assert!(volume >= 0.2);
            previous = volume;
        }
        assert!((previous - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_step_is_bounded() {
        let metrics = [0.0, 0.9, 0.9, 0.0, 0.016, 0.014, 0.5, 0.0, 0.0, 1.0];
        for (base, max) in [(0.0, 1.0), (0.2, 1.0), (0.5, 0.6), (0.3, 0.3)] {
            for smoothing in [0.01, 0.05, 0.5, 1.0] {
                let mut state = ControllerState::new(settings(0.015, base, max, smoothing));
                for metric in metrics {
                    let before = state.current_volume();
                    let after = state.update(metric).commanded_volume;
                    assert!((after - before).abs() <= smoothing * max + f32::EPSILON);
                    assert!((0.0..=max).contains(&after));
                }
            }
        }
    }

    #[test]
    fn test_no_change_when_at_target() {
        let mut state = ControllerState::new(settings(0.015, 0.0, 0.5, 1.0));
        assert_eq!(state.update(1.0).commanded_volume, 0.5);
        assert_eq!(state.update(1.0).commanded_volume, 0.5);
        assert_eq!(state.current_volume(), 0.5);
    }

    #[test]
    fn test_unit_smoothing_snaps_to_target() {
        let mut state = ControllerState::new(settings(0.015, 0.25, 1.0, 1.0));
        assert_eq!(state.update(0.5).commanded_volume, 1.0);
        assert_eq!(state.update(0.0).commanded_volume, 0.25);
        assert_eq!(state.update(0.5).commanded_volume, 1.0);
    }

    #[test]
    fn test_equal_bounds_give_constant_output() {
        let mut state = ControllerState::new(settings(0.015, 0.6, 0.6, 0.3));
        for metric in [0.0, 1.0, 0.02, 0.0, 5.0] {
            assert_eq!(state.update(metric).commanded_volume, 0.6);
        }
    }

    #[test]
    fn test_settings_validation() {
        assert_eq!(
            ControllerSettings::new(0.0, 0.2, 1.0, 0.05),
            Err(ConfigError::Sensitivity(0.0))
        );
        assert!(matches!(
            ControllerSettings::new(f32::NAN, 0.2, 1.0, 0.05),
            Err(ConfigError::Sensitivity(_))
        ));
        assert_eq!(
            ControllerSettings::new(0.015, -0.1, 1.0, 0.05),
            Err(ConfigError::VolumeRange { name: "base volume", value: -0.1 })
        );
        assert_eq!(
            ControllerSettings::new(0.015, 0.2, 1.5, 0.05),
            Err(ConfigError::VolumeRange { name: "max volume", value: 1.5 })
        );
        assert_eq!(
            ControllerSettings::new(0.015, 0.8, 0.5, 0.05),
            Err(ConfigError::VolumeOrder { base: 0.8, max: 0.5 })
        );
        assert_eq!(
            ControllerSettings::new(0.015, 0.2, 1.0, 0.0),
            Err(ConfigError::Smoothing(0.0))
        );
        assert_eq!(
            ControllerSettings::new(0.015, 0.2, 1.0, 1.01),
            Err(ConfigError::Smoothing(1.01))
        );
        assert!(ControllerSettings::new(0.015, 0.2, 1.0, 1.0).is_ok());
    }

    #[derive(Default)]
    struct RecordingVolume {
        volumes: RefCell<Vec<f32>>,
    }

    impl VolumeSink for RecordingVolume {
        fn set_volume(&self, volume: f32) {
            self.volumes.borrow_mut().push(volume);
        }
    }

    #[derive(Default)]
    struct RecordingStatus {
        records: Vec<MaskingStatus>,
    }

    impl StatusSink for RecordingStatus {
        fn publish(&mut self, status: &MaskingStatus) {
            self.records.push(*status);
        }
    }

    #[test]
    fn test_process_block_notifies_both_sinks() {
        let mut controller = Controller::new(default_settings());
        let volume = RecordingVolume::default();
        let mut status = RecordingStatus::default();

        let quiet = vec![0.001f32; 256];
        let loud = vec![0.05f32; 256];
        controller.process_block(&quiet, &volume, &mut status);
        let record = controller.process_block(&loud, &volume, &mut status);

        assert!(record.is_masking_active);
        assert!((record.noise_metric - 0.05).abs() < 1e-6);
        assert!((record.commanded_volume - 0.24).abs() < 1e-6);

        let volumes = volume.volumes.borrow();
        assert_eq!(volumes.len(), 2);
        assert_eq!(status.records.len(), 2);
        assert!(!status.records[0].is_masking_active);
        assert_eq!(volumes[1], status.records[1].commanded_volume);
        assert_eq!(controller.state().current_volume(), volumes[1]);
    }
}
