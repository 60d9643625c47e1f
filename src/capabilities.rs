//! Navigation-API queries a 3D mouse driver makes against the view.
//!
//! Drivers that do their own motion math ask the application for the camera
//! transform, a look-at vector, a pivot and the visible extents. These
//! traits answer those questions from a [`CameraController`].

use crate::controller::CameraController;
use crate::geometry::{geo_to_ecef, matrix_to_pose, pose_to_matrix};
use crate::scene::SceneView;
use crate::types::{Extents, GeoPoint, ScreenPoint};
use crate::{NavError, Result};
use glam::{DMat4, DVec3};

/// Distance in meters to the point reported by [`LookAtProvider::look_at`].
pub const LOOK_AT_DISTANCE: f64 = 5000.0;

/// Vertical field of view reported to drivers, in degrees.
pub const DEFAULT_FIELD_OF_VIEW: f64 = 45.0;

pub trait CameraMatrixProvider {
    /// Geocentric camera transform of the live camera.
    fn camera_matrix(&self) -> DMat4;

    /// Move the camera to a geocentric transform and publish it.
    fn set_camera_matrix(&mut self, matrix: &DMat4) -> Result<()>;
}

pub trait LookAtProvider {
    /// Geocentric vector from the camera to the point
    /// [`LOOK_AT_DISTANCE`] meters ahead.
    fn look_at(&self) -> DVec3;
}

pub trait PivotProvider {
    /// Surface point the camera orbits around, if any is in view.
    fn pivot_position(&self) -> Option<GeoPoint>;

    /// Whether the pivot was placed by the user rather than derived.
    fn is_user_pivot(&self) -> bool {
        false
    }
}

pub trait ExtentsProvider {
    /// Bounding box of the surface visible at the viewport corners and
    /// center. `None` when none of them hits the surface.
    fn view_extents(&self) -> Option<Extents>;

    fn field_of_view(&self) -> f64 {
        DEFAULT_FIELD_OF_VIEW
    }

    fn is_perspective(&self) -> bool {
        true
    }

    fn is_rotatable(&self) -> bool {
        true
    }
}

impl<S: SceneView> CameraMatrixProvider for CameraController<S> {
    fn camera_matrix(&self) -> DMat4 {
        pose_to_matrix(&self.scene().camera())
    }

    /// Unlike sample processing, renderer failures are returned to the
    /// caller here.
    fn set_camera_matrix(&mut self, matrix: &DMat4) -> Result<()> {
        let pose = matrix_to_pose(matrix).ok_or(NavError::DegenerateMatrix)?;
        self.set_pose(pose);
        self.scene_mut().set_viewpoint_camera(&pose)
    }
}

impl<S: SceneView> LookAtProvider for CameraController<S> {
    fn look_at(&self) -> DVec3 {
        let camera = self.scene().camera();
        let ahead = camera.move_forward(LOOK_AT_DISTANCE);
        geo_to_ecef(ahead.position) - geo_to_ecef(camera.position)
    }
}

impl<S: SceneView> PivotProvider for CameraController<S> {
    fn pivot_position(&self) -> Option<GeoPoint> {
        self.find_screen_pivot()
    }
}

impl<S: SceneView> ExtentsProvider for CameraController<S> {
    fn view_extents(&self) -> Option<Extents> {
        let viewport = self.scene().viewport();
        let probes = [
            ScreenPoint { x: 0.0, y: 0.0 },
            ScreenPoint {
                x: viewport.width,
                y: 0.0,
            },
            ScreenPoint {
                x: 0.0,
                y: viewport.height,
            },
            ScreenPoint {
                x: viewport.width,
                y: viewport.height,
            },
            viewport.center(),
        ];

        probes
            .iter()
            .filter_map(|&p| self.scene().screen_to_surface(p))
            .fold(None, |acc: Option<Extents>, p| {
                Some(match acc {
                    None => Extents { min: p, max: p },
                    Some(e) => Extents {
                        min: GeoPoint::new(e.min.x.min(p.x), e.min.y.min(p.y), e.min.z.min(p.z)),
                        max: GeoPoint::new(e.max.x.max(p.x), e.max.y.max(p.y), e.max.z.max(p.z)),
                    },
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CameraSource;
    use crate::testing::ScriptedScene;
    use crate::types::CameraPose;

    fn pose(z: f64, heading: f64, pitch: f64) -> CameraPose {
        CameraPose::new(GeoPoint::new(-119.9489, 46.7592, z), heading, pitch, 0.0)
    }

    #[test]
    fn test_camera_matrix_round_trip() {
        let start = pose(10_000.0, 30.0, 50.0);
        let mut c = CameraController::new(ScriptedScene::new(pose(500.0, 0.0, 0.0)));
        c.set_camera_matrix(&pose_to_matrix(&start)).unwrap();

        let after = *c.pose();
        assert!((after.position.x - start.position.x).abs() < 1e-7);
        assert!((after.position.y - start.position.y).abs() < 1e-7);
        assert!((after.altitude() - start.altitude()).abs() < 1e-3);
        assert!((after.heading - 30.0).abs() < 1e-6);
        assert!((after.pitch - 50.0).abs() < 1e-6);
        assert_eq!(c.scene().pushes, 1);
        assert_eq!(c.scene().camera(), after);

        let m = c.camera_matrix();
        assert!(m.abs_diff_eq(pose_to_matrix(&after), 1e-6));
    }

    #[test]
    fn test_set_camera_matrix_errors() {
        let mut c = CameraController::new(ScriptedScene::new(pose(500.0, 0.0, 0.0)));
        let err = c.set_camera_matrix(&DMat4::ZERO).unwrap_err();
        assert!(matches!(err, NavError::DegenerateMatrix));
        assert_eq!(c.scene().pushes, 0);

        c.scene_mut().reject_viewpoints = true;
        let err = c
            .set_camera_matrix(&pose_to_matrix(&pose(900.0, 0.0, 10.0)))
            .unwrap_err();
        assert!(matches!(err, NavError::Render(_)));
    }

    #[test]
    fn test_look_at_straight_down() {
        let start = pose(10_000.0, 0.0, 0.0);
        let c = CameraController::new(ScriptedScene::new(start));
        let v = c.look_at();
        assert!((v.length() - LOOK_AT_DISTANCE).abs() < 1e-6);
        let up = geo_to_ecef(start.position).normalize();
        assert!((v.dot(up) + LOOK_AT_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn test_pivot_is_derived() {
        let c = CameraController::new(ScriptedScene::new(pose(8_000_000.0, 0.0, 60.0)));
        assert_eq!(
            c.pivot_position(),
            Some(ScriptedScene::surface_point_at(ScreenPoint { x: 400.0, y: 300.0 }))
        );
        assert!(!c.is_user_pivot());
    }

    #[test]
    fn test_view_extents() {
        let c = CameraController::new(ScriptedScene::new(pose(10_000.0, 0.0, 0.0)));
        let e = c.view_extents().unwrap();
        assert_eq!(e.min, GeoPoint::new(-120.0, 46.0, 0.0));
        assert_eq!(e.max, ScriptedScene::surface_point_at(ScreenPoint { x: 800.0, y: 600.0 }));
        assert_eq!(c.field_of_view(), 45.0);
        assert!(c.is_perspective());
        assert!(c.is_rotatable());
    }

    #[test]
    fn test_view_extents_partial_and_sky() {
        let mut scene = ScriptedScene::new(pose(10_000.0, 0.0, 80.0));
        scene.hit_below_y = Some(450.0);
        let mut c = CameraController::new(scene);
        let e = c.view_extents().unwrap();
        assert_eq!(e.min.y, e.max.y);
        assert_eq!(e.min, ScriptedScene::surface_point_at(ScreenPoint { x: 0.0, y: 600.0 }));

        c.scene_mut().hit_below_y = None;
        assert!(c.view_extents().is_none());
    }
}
