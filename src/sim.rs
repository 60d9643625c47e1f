//! In-process renderer stand-in.
//!
//! [`SimulatedScene`] renders nothing. It keeps a camera, answers
//! screen-to-surface queries by casting rays against the base sphere, and
//! accepts viewpoint updates. Useful for demos and for exercising the
//! navigation core without a real scene view.

use crate::geometry::{ecef_to_geo, enu_frame, geo_to_ecef, local_orientation, ray_hit_surface};
use crate::scene::{CameraSource, SurfaceProjector, ViewpointSink};
use crate::types::{CameraPose, GeoPoint, ScreenPoint, Viewport};
use crate::{NavError, Result};
use glam::DVec3;

pub struct SimulatedScene {
    pose: CameraPose,
    viewport: Viewport,
    /// Vertical field of view in degrees.
    field_of_view: f64,
    /// Refuse viewpoint updates, as a renderer does before its first frame.
    pub reject_viewpoints: bool,
    updates: usize,
}

impl SimulatedScene {
    pub fn new(pose: CameraPose, viewport: Viewport) -> Self {
        Self {
            pose,
            viewport,
            field_of_view: crate::capabilities::DEFAULT_FIELD_OF_VIEW,
            reject_viewpoints: false,
            updates: 0,
        }
    }

    pub fn with_field_of_view(mut self, degrees: f64) -> Self {
        self.field_of_view = degrees;
        self
    }

    /// Number of accepted viewpoint updates.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Move the camera without going through the navigator, like a mouse
    /// drag in the host would.
    pub fn drag_to(&mut self, pose: CameraPose) {
        self.pose = pose;
    }

    /// Geocentric unit ray through a screen point.
    fn view_ray(&self, point: ScreenPoint) -> Option<DVec3> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * point.x / self.viewport.width - 1.0;
        let ndc_y = 1.0 - 2.0 * point.y / self.viewport.height;
        let half = (self.field_of_view / 2.0).to_radians().tan();

        let camera_dir = DVec3::new(ndc_x * half * self.viewport.aspect(), ndc_y * half, -1.0);
        let local = local_orientation(self.pose.heading, self.pose.pitch, self.pose.roll) * camera_dir;
        Some((enu_frame(self.pose.position) * local).normalize())
    }
}

impl CameraSource for SimulatedScene {
    fn camera(&self) -> CameraPose {
        self.pose
    }
}

impl SurfaceProjector for SimulatedScene {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn screen_to_surface(&self, point: ScreenPoint) -> Option<GeoPoint> {
        let dir = self.view_ray(point)?;
        let hit = ray_hit_surface(geo_to_ecef(self.pose.position), dir)?;
        let mut p = ecef_to_geo(hit);
        p.z = 0.0;
        Some(p)
    }
}

impl ViewpointSink for SimulatedScene {
    fn set_viewpoint_camera(&mut self, pose: &CameraPose) -> Result<()> {
        if self.reject_viewpoints {
            return Err(NavError::Render("scene not initialized".into()));
        }
        self.pose = *pose;
        self.updates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::InputArbiter;
    use crate::config::NavigationConfig;
    use crate::controller::CameraController;
    use crate::geometry::to_enu;
    use crate::types::{DeviceSample, Motion};

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn scene(z: f64, heading: f64, pitch: f64) -> SimulatedScene {
        let pose = CameraPose::new(GeoPoint::new(-119.9489, 46.7592, z), heading, pitch, 0.0);
        SimulatedScene::new(pose, VIEWPORT)
    }

    #[test]
    fn test_center_hit_looking_down() {
        let s = scene(10_000.0, 0.0, 0.0);
        let hit = s.screen_to_surface(VIEWPORT.center()).unwrap();
        assert!((hit.x + 119.9489).abs() < 1e-6);
        assert!((hit.y - 46.7592).abs() < 1e-6);
    }

    #[test]
    fn test_screen_top_is_ahead() {
        let s = scene(10_000.0, 0.0, 0.0);
        let top = s.screen_to_surface(ScreenPoint { x: 640.0, y: 0.0 }).unwrap();
        let right = s.screen_to_surface(ScreenPoint { x: 1280.0, y: 360.0 }).unwrap();
        // heading north: screen top is north, screen right is east
        assert!(top.y > 46.7592);
        assert!(right.x > -119.9489);
    }

    #[test]
    fn test_horizon_misses_center() {
        let s = scene(10_000.0, 0.0, 90.0);
        assert!(s.screen_to_surface(VIEWPORT.center()).is_none());
        assert!(s.screen_to_surface(ScreenPoint { x: 640.0, y: 540.0 }).is_some());
    }

    #[test]
    fn test_pivot_falls_back_below_horizon() {
        let c = CameraController::new(scene(10_000.0, 0.0, 90.0));
        let pivot = c.find_screen_pivot().unwrap();
        let offset = to_enu(c.pose().position, pivot);
        assert!(offset.y > 0.0);
        assert!(offset.x.abs() < 1e-3);
    }

    #[test]
    fn test_orbit_from_far_away() {
        let mut arb = InputArbiter::new(scene(8_000_000.0, 0.0, 40.0), &NavigationConfig::default()).unwrap();
        let before = *arb.pose();
        let motion = arb.process(&DeviceSample::rotation(DVec3::Z, 1.0));
        assert_eq!(motion, Motion::ORBIT);
        assert!((arb.pose().heading - 0.6).abs() < 1e-9);
        assert_ne!(arb.pose().position, before.position);
        assert_eq!(arb.controller().scene().updates(), 1);
    }

    #[test]
    fn test_no_orbit_when_earth_out_of_view() {
        let mut arb = InputArbiter::new(scene(8_000_000.0, 0.0, 90.0), &NavigationConfig::default()).unwrap();
        let before = *arb.pose();
        assert!(arb.process(&DeviceSample::rotation(DVec3::Z, 1.0)).is_empty());
        assert_eq!(*arb.pose(), before);
        assert_eq!(arb.controller().scene().updates(), 0);
    }

    #[test]
    fn test_rejected_viewpoint() {
        let mut s = scene(10_000.0, 0.0, 0.0);
        s.reject_viewpoints = true;
        let pose = s.camera();
        assert!(matches!(s.set_viewpoint_camera(&pose), Err(NavError::Render(_))));
        assert_eq!(s.updates(), 0);
    }
}
