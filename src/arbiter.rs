use crate::config::{ArbitrationPolicy, NavigationConfig, NavigationLimits, SpeedFactors};
use crate::controller::CameraController;
use crate::scene::SceneView;
use crate::speed::SpeedModel;
use crate::types::{CameraPose, DeviceSample, Motion};
use crate::Result;
use glam::DVec3;

/// Device magnitudes at or below this count as no input.
const DEAD_ZONE: f64 = 1e-6;

/// Device-space axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// The single motion a sample asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Idle,
    /// `amount` is the raw device component on `axis`.
    Translate { axis: Axis, amount: f64 },
    /// `amount` is the rotation-axis component on `axis` (X or Z).
    Rotate { axis: Axis, amount: f64 },
}

/// Decide what one sample should do.
///
/// Only the dominant axis of the winning vector is kept; the device never
/// produces a blended motion. Roll input (rotation about Y) is not
/// navigated, so rotation picks between pitch (X) and heading (Z).
pub fn classify(policy: ArbitrationPolicy, sample: &DeviceSample) -> Intent {
    let rotating = sample.rotation_angle > DEAD_ZONE;
    let translating = sample.translation_length > DEAD_ZONE;

    let translate = translating
        && match policy {
            ArbitrationPolicy::DominantAxis => {
                !rotating || sample.translation_length >= sample.rotation_angle
            }
            ArbitrationPolicy::Threshold { high, low } => {
                sample.translation_length > high || (!rotating && sample.translation_length > low)
            }
        };

    if translate {
        let (axis, amount) = dominant_component(sample.translation);
        return Intent::Translate { axis, amount };
    }

    if rotating {
        let a = sample.rotation_axis;
        let (axis, amount) = if a.x.abs() >= a.z.abs() {
            (Axis::X, a.x)
        } else {
            (Axis::Z, a.z)
        };
        if amount.abs() > DEAD_ZONE {
            return Intent::Rotate { axis, amount };
        }
    }

    Intent::Idle
}

/// Largest-magnitude component. Ties go to X, then Y.
fn dominant_component(v: DVec3) -> (Axis, f64) {
    let mut best = (Axis::X, v.x);
    if v.y.abs() > best.1.abs() {
        best = (Axis::Y, v.y);
    }
    if v.z.abs() > best.1.abs() {
        best = (Axis::Z, v.z);
    }
    best
}

/// Pitch guard: outside [pitch_min, pitch_max] only deltas heading back
/// into range are allowed.
pub fn pitch_delta_allowed(pitch: f64, delta: f64, limits: &NavigationLimits) -> bool {
    if pitch > limits.pitch_max {
        delta < 0.0
    } else if pitch < limits.pitch_min {
        delta >= 0.0
    } else {
        true
    }
}

/// Turns device samples into camera motion.
pub struct InputArbiter<S> {
    controller: CameraController<S>,
    speed: SpeedModel,
    factors: SpeedFactors,
    limits: NavigationLimits,
    policy: ArbitrationPolicy,
    reversed: bool,
}

impl<S: SceneView> InputArbiter<S> {
    /// Build an arbiter over `scene`. Fails on an invalid config.
    pub fn new(scene: S, config: &NavigationConfig) -> Result<Self> {
        config.validate()?;
        let controller =
            CameraController::new(scene).with_pivot_min_gap(config.limits.pivot_search_min_gap);
        Ok(Self {
            controller,
            speed: SpeedModel::new(&config.limits),
            factors: config.speed,
            limits: config.limits,
            policy: config.policy,
            reversed: config.reversed,
        })
    }

    /// Apply one sample and publish the result.
    ///
    /// Returns the motions realized; empty for dead-zone samples and for
    /// rotations the pitch guard or pivot search skipped. Nothing is pushed
    /// to the renderer when nothing moved.
    pub fn process(&mut self, sample: &DeviceSample) -> Motion {
        self.controller.reset_if_externally_moved();

        let intent = classify(self.policy, sample);
        log::trace!(
            "rotation angle: {:.3}, translation length: {:.3} -> {:?}",
            sample.rotation_angle,
            sample.translation_length,
            intent
        );

        let motion = match intent {
            Intent::Idle => Motion::empty(),
            Intent::Translate { axis, amount } => self.translate(axis, amount),
            Intent::Rotate { axis: Axis::X, amount } => self.rotate_pitch(amount),
            Intent::Rotate { amount, .. } => self.rotate_heading(amount),
        };

        if !motion.is_empty() {
            self.controller.push_to_renderer();
        }
        motion
    }

    fn sign(&self) -> f64 {
        if self.reversed {
            -1.0
        } else {
            1.0
        }
    }

    fn translate(&mut self, axis: Axis, amount: f64) -> Motion {
        let pose = *self.controller.pose();
        match axis {
            Axis::X => {
                let speed = self
                    .speed
                    .move_speed(pose.altitude(), pose.pitch, self.factors.move_speed);
                self.controller.pan_lateral(self.sign() * amount * speed);
                Motion::PAN_LATERAL
            }
            Axis::Y => {
                let speed = self
                    .speed
                    .move_speed(pose.altitude(), pose.pitch, self.factors.move_speed);
                self.controller.pan_vertical(self.sign() * -amount * speed);
                Motion::PAN_VERTICAL
            }
            Axis::Z => {
                let speed = self
                    .speed
                    .zoom_speed(pose.altitude(), self.factors.zoom_speed);
                self.controller
                    .zoom(self.sign() * -amount * speed, self.limits.max_altitude);
                Motion::ZOOM
            }
        }
    }

    fn rotate_pitch(&mut self, amount: f64) -> Motion {
        let pose = *self.controller.pose();
        let speed = self
            .speed
            .rotate_x_speed(pose.altitude(), self.factors.rotate_x_speed);
        let delta = self.sign() * amount * speed;

        // judge the delta that will actually be applied
        if !pitch_delta_allowed(pose.pitch, delta, &self.limits) {
            log::trace!("Pitch {:.2} out of range, skipping delta {:.3}", pose.pitch, delta);
            return Motion::empty();
        }

        self.controller.rotate_about_local_x(delta);
        Motion::PITCH
    }

    fn rotate_heading(&mut self, amount: f64) -> Motion {
        let pose = *self.controller.pose();
        let mut delta = -amount * self.speed.rotate_z_speed(self.factors.rotate_z_speed);
        if let Some(max) = self.limits.heading_delta_max {
            delta = delta.clamp(-max, max);
        }
        delta *= self.sign();

        if pose.altitude() < self.limits.near_ground_altitude {
            self.controller.rotate_about_local_z(delta);
            Motion::HEADING
        } else if self.controller.orbit_around_screen_center(delta) {
            Motion::ORBIT
        } else {
            Motion::empty()
        }
    }

    pub fn pose(&self) -> &CameraPose {
        self.controller.pose()
    }

    pub fn controller(&self) -> &CameraController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CameraController<S> {
        &mut self.controller
    }

    pub fn speed_factors(&self) -> SpeedFactors {
        self.factors
    }

    /// Replace the speed factors. Rejects non-positive values.
    pub fn set_speed_factors(&mut self, factors: SpeedFactors) -> Result<()> {
        factors.validate()?;
        self.factors = factors;
        Ok(())
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn policy(&self) -> ArbitrationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ArbitrationPolicy) {
        self.policy = policy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedScene;
    use crate::types::GeoPoint;
    use crate::NavError;

    fn start(z: f64, heading: f64, pitch: f64) -> CameraPose {
        CameraPose::new(GeoPoint::new(-119.9489, 46.7592, z), heading, pitch, 0.0)
    }

    fn arbiter(pose: CameraPose) -> InputArbiter<ScriptedScene> {
        InputArbiter::new(ScriptedScene::new(pose), &NavigationConfig::default()).unwrap()
    }

    fn translation(x: f64, y: f64, z: f64) -> DeviceSample {
        DeviceSample::translation(DVec3::new(x, y, z))
    }

    #[test]
    fn test_lateral_pan_at_altitude() {
        let pose = start(10_000_000.0, 0.0, 40.0);
        let mut arb = arbiter(pose);

        let motion = arb.process(&translation(100.0, 0.0, 0.0));
        assert_eq!(motion, Motion::PAN_LATERAL);

        let after = arb.pose();
        assert!((after.altitude() - 10_000_000.0).abs() < 1e-6);
        assert_eq!(after.pitch, 40.0);
        // heading north, positive X pans east
        assert!(after.position.x > pose.position.x);
        assert_eq!(arb.controller().scene().pushes, 1);
    }

    #[test]
    fn test_reversed_pan_goes_the_other_way() {
        let pose = start(10_000_000.0, 0.0, 40.0);
        let mut arb = arbiter(pose);
        arb.set_reversed(true);
        assert_eq!(arb.process(&translation(100.0, 0.0, 0.0)), Motion::PAN_LATERAL);
        assert!(arb.pose().position.x < pose.position.x);
    }

    #[test]
    fn test_only_dominant_translation_applied() {
        let pose = start(50_000.0, 0.0, 40.0);
        let mut arb = arbiter(pose);
        let motion = arb.process(&translation(10.0, -50.0, 5.0));
        assert_eq!(motion, Motion::PAN_VERTICAL);
        assert!((arb.pose().altitude() - 50_000.0).abs() < 1e-6);
        // heading north, -Y moves back toward the south
        assert!(arb.pose().position.y < pose.position.y);
        assert!((arb.pose().position.x - pose.position.x).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_in_and_ceiling() {
        let mut arb = arbiter(start(5_000.0, 0.0, 30.0));
        assert_eq!(arb.process(&translation(0.0, 0.0, -100.0)), Motion::ZOOM);
        assert!(arb.pose().altitude() < 5_000.0);

        let mut arb = arbiter(start(19_999_990.0, 0.0, 30.0));
        assert_eq!(arb.process(&translation(0.0, 0.0, 100.0)), Motion::ZOOM);
        assert_eq!(arb.pose().altitude(), 20_000_000.0);
    }

    #[test]
    fn test_heading_near_ground_turns_in_place() {
        let pose = start(3_000.0, 10.0, 60.0);
        let mut arb = arbiter(pose);

        let motion = arb.process(&DeviceSample::rotation(DVec3::Z, 1.0));
        assert_eq!(motion, Motion::HEADING);
        // -1 * speed 1.0, clamped to the 0.6 per-tick limit
        assert!((arb.pose().heading - 9.4).abs() < 1e-9);
        assert_eq!(arb.pose().position, pose.position);
        assert!(arb.controller().scene().probes().is_empty());
    }

    #[test]
    fn test_heading_at_altitude_orbits() {
        let pose = start(8_000_000.0, 10.0, 60.0);
        let mut arb = arbiter(pose);

        let motion = arb.process(&DeviceSample::rotation(DVec3::Z, 1.0));
        assert_eq!(motion, Motion::ORBIT);
        assert!((arb.pose().heading - 10.6).abs() < 1e-9);
        assert_ne!(arb.pose().position, pose.position);
        assert!(!arb.controller().scene().probes().is_empty());
    }

    #[test]
    fn test_orbit_without_pivot_is_silent() {
        let pose = start(8_000_000.0, 10.0, 120.0);
        let mut scene = ScriptedScene::new(pose);
        scene.hit_below_y = None;
        let mut arb = InputArbiter::new(scene, &NavigationConfig::default()).unwrap();

        assert!(arb.process(&DeviceSample::rotation(DVec3::Z, 1.0)).is_empty());
        assert_eq!(*arb.pose(), pose);
        assert_eq!(arb.controller().scene().pushes, 0);
    }

    #[test]
    fn test_pitch_guard_above_max() {
        let limits = NavigationLimits::default();
        let pose = start(1_000.0, 0.0, limits.pitch_max + 5.0);

        let mut arb = arbiter(pose);
        assert!(arb.process(&DeviceSample::rotation(DVec3::X, 1.0)).is_empty());
        assert_eq!(arb.pose().pitch, 95.0);
        assert_eq!(arb.controller().scene().pushes, 0);

        assert_eq!(arb.process(&DeviceSample::rotation(DVec3::NEG_X, 1.0)), Motion::PITCH);
        assert!((arb.pose().pitch - 94.5).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_guard_below_min() {
        let mut arb = arbiter(start(1_000.0, 0.0, -5.0));
        assert!(arb.process(&DeviceSample::rotation(DVec3::NEG_X, 1.0)).is_empty());
        assert_eq!(arb.process(&DeviceSample::rotation(DVec3::X, 1.0)), Motion::PITCH);
        assert!((arb.pose().pitch + 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_speed_is_coarse_far_away() {
        let mut arb = arbiter(start(3_000_000.0, 0.0, 45.0));
        arb.process(&DeviceSample::rotation(DVec3::X, 1.0));
        assert!((arb.pose().pitch - 45.1).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_guard_judges_reversed_delta() {
        let mut arb = arbiter(start(1_000.0, 0.0, 95.0));
        arb.set_reversed(true);
        // reversed +X tilts back toward nadir, which is allowed past the horizon
        assert_eq!(arb.process(&DeviceSample::rotation(DVec3::X, 1.0)), Motion::PITCH);
        assert!((arb.pose().pitch - 94.5).abs() < 1e-9);

        assert!(arb.process(&DeviceSample::rotation(DVec3::NEG_X, 1.0)).is_empty());
        assert!((arb.pose().pitch - 94.5).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_pitch_stops_past_horizon() {
        let mut arb = arbiter(start(1_000.0, 0.0, 89.8));
        arb.set_reversed(true);
        for _ in 0..20 {
            arb.process(&DeviceSample::rotation(DVec3::NEG_X, 1.0));
        }
        // one step may cross the limit, none after it
        assert!(arb.pose().pitch <= 90.3 + 1e-9, "pitch ran to {}", arb.pose().pitch);
        assert!(arb.pose().pitch > 90.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = NavigationConfig::default();
        config.limits.pitch_min = 95.0;
        let result = InputArbiter::new(ScriptedScene::new(start(1_000.0, 0.0, 45.0)), &config);
        assert!(matches!(result, Err(NavError::InvalidConfig(_))));
    }

    #[test]
    fn test_idle_sample_is_noop() {
        let pose = start(10_000.0, 0.0, 45.0);
        let mut arb = arbiter(pose);
        assert!(arb.process(&DeviceSample::default()).is_empty());
        assert_eq!(*arb.pose(), pose);
        assert_eq!(arb.controller().scene().pushes, 0);
    }

    #[test]
    fn test_adopts_external_move_before_applying() {
        let mut arb = arbiter(start(10_000.0, 0.0, 45.0));
        let dragged = start(20_000.0, 90.0, 45.0);
        arb.controller_mut().scene_mut().drag_to(dragged);

        arb.process(&DeviceSample::rotation(DVec3::X, 1.0));
        assert_eq!(arb.pose().position, dragged.position);
        assert_eq!(arb.pose().heading, 90.0);
        assert!((arb.pose().pitch - 45.5).abs() < 1e-12);
    }

    #[test]
    fn test_classify_dominant_axis() {
        let policy = ArbitrationPolicy::DominantAxis;
        let both = DeviceSample::new(DVec3::Z, 200.0, DVec3::new(0.0, 50.0, 0.0));
        assert_eq!(classify(policy, &both), Intent::Rotate { axis: Axis::Z, amount: 1.0 });

        let both = DeviceSample::new(DVec3::Z, 20.0, DVec3::new(0.0, 50.0, 0.0));
        assert_eq!(classify(policy, &both), Intent::Translate { axis: Axis::Y, amount: 50.0 });

        let roll_only = DeviceSample::rotation(DVec3::Y, 30.0);
        assert_eq!(classify(policy, &roll_only), Intent::Idle);

        assert_eq!(classify(policy, &DeviceSample::default()), Intent::Idle);
    }

    #[test]
    fn test_classify_threshold() {
        let policy = ArbitrationPolicy::Threshold {
            high: 300.0,
            low: 10.0,
        };
        let rot = DVec3::new(1.0, 0.0, 1.0);

        let strong = DeviceSample::new(rot, 5.0, DVec3::new(0.0, 0.0, -400.0));
        assert_eq!(classify(policy, &strong), Intent::Translate { axis: Axis::Z, amount: -400.0 });

        let mixed = DeviceSample::new(rot, 5.0, DVec3::new(0.0, 0.0, -200.0));
        assert!(matches!(classify(policy, &mixed), Intent::Rotate { axis: Axis::X, .. }));

        let weak = DeviceSample::translation(DVec3::new(5.0, 0.0, 0.0));
        assert_eq!(classify(policy, &weak), Intent::Idle);

        let pure = DeviceSample::translation(DVec3::new(15.0, 0.0, 0.0));
        assert_eq!(classify(policy, &pure), Intent::Translate { axis: Axis::X, amount: 15.0 });
    }

    #[test]
    fn test_speed_factors_validated() {
        let mut arb = arbiter(start(10_000.0, 0.0, 45.0));
        let err = arb
            .set_speed_factors(SpeedFactors {
                zoom_speed: 0.0,
                ..SpeedFactors::default()
            })
            .unwrap_err();
        assert!(matches!(err, NavError::InvalidConfig(_)));

        let faster = SpeedFactors {
            move_speed: 2.0,
            ..SpeedFactors::default()
        };
        arb.set_speed_factors(faster).unwrap();
        assert_eq!(arb.speed_factors(), faster);
    }
}
