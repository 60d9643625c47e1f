//! Altitude- and pitch-dependent motion speeds.
//!
//! These are tuning curves, not physics: move and zoom speeds grow with
//! altitude, lateral movement slows as the camera tilts toward the
//! horizon, and pitch rotation switches between a coarse and a fine rate
//! at a fixed altitude.

use crate::config::NavigationLimits;

/// Meters per device unit per meter of altitude, before pitch damping.
const MOVE_SPEED_SCALE: f64 = 0.0005;
/// Meters per device unit per meter of altitude, before the ceiling boost.
const ZOOM_SPEED_SCALE: f64 = 0.000_12;
/// Constant part of the zoom boost, keeps zoom responsive near the ground.
const ZOOM_BASE_BOOST: f64 = 0.3;
/// Keeps the move scale above zero at the maximum pitch.
const MOVE_PITCH_MARGIN: f64 = 0.01;
/// Altitude used for move speed when the camera is at or below ground.
const GROUND_MOVE_ALTITUDE: f64 = 20.0;

const ROTATE_X_SCALE_FAR: f64 = 0.1;
const ROTATE_X_SCALE_NEAR: f64 = 0.5;
const ROTATE_Z_SCALE: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct SpeedModel {
    max_altitude: f64,
    pitch_min: f64,
    pitch_max: f64,
    rotate_x_altitude: f64,
    move_scale_max: f64,
}

impl SpeedModel {
    pub fn new(limits: &NavigationLimits) -> Self {
        Self {
            max_altitude: limits.max_altitude,
            pitch_min: limits.pitch_min,
            pitch_max: limits.pitch_max,
            rotate_x_altitude: limits.rotate_x_altitude,
            move_scale_max: limits.pitch_max.to_radians().atan() + MOVE_PITCH_MARGIN,
        }
    }

    /// Pan distance per device unit.
    ///
    /// Pitch is clamped to the navigation range first so a camera tipped
    /// past the horizon still pans forward, just slowly.
    pub fn move_speed(&self, altitude: f64, pitch: f64, factor: f64) -> f64 {
        let altitude = if altitude < 1.0 {
            GROUND_MOVE_ALTITUDE
        } else {
            altitude
        };
        let pitch = pitch.clamp(self.pitch_min, self.pitch_max);
        let scale = self.move_scale_max - pitch.to_radians().atan();
        altitude * factor * MOVE_SPEED_SCALE * scale
    }

    /// Zoom distance per device unit.
    pub fn zoom_speed(&self, altitude: f64, factor: f64) -> f64 {
        let altitude = altitude.max(1.0);
        let boost = (altitude * std::f64::consts::PI / (self.max_altitude * 4.0)).tan()
            + ZOOM_BASE_BOOST;
        altitude * factor * ZOOM_SPEED_SCALE * boost
    }

    /// Pitch degrees per device unit.
    pub fn rotate_x_speed(&self, altitude: f64, factor: f64) -> f64 {
        let scale = if altitude > self.rotate_x_altitude {
            ROTATE_X_SCALE_FAR
        } else {
            ROTATE_X_SCALE_NEAR
        };
        factor * scale
    }

    /// Heading degrees per device unit. Independent of altitude.
    pub fn rotate_z_speed(&self, factor: f64) -> f64 {
        factor * ROTATE_Z_SCALE
    }
}
