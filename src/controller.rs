use crate::scene::SceneView;
use crate::types::{CameraPose, GeoPoint, ScreenPoint};

/// Default pivot search cutoff in pixels.
pub const DEFAULT_PIVOT_MIN_GAP: f64 = 10.0;

/// Incremental camera motions over a scene view.
///
/// The controller keeps its own copy of the camera pose. Operations mutate
/// that copy; [`push_to_renderer`](Self::push_to_renderer) publishes it.
/// Not re-entrant: the owner must serialize calls.
pub struct CameraController<S> {
    scene: S,
    pose: CameraPose,
    pivot_min_gap: f64,
}

impl<S: SceneView> CameraController<S> {
    /// Start from the scene's current camera.
    pub fn new(scene: S) -> Self {
        let pose = scene.camera();
        Self {
            scene,
            pose,
            pivot_min_gap: DEFAULT_PIVOT_MIN_GAP,
        }
    }

    pub fn with_pivot_min_gap(mut self, gap: f64) -> Self {
        self.pivot_min_gap = gap.max(1.0);
        self
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn into_scene(self) -> S {
        self.scene
    }

    /// Replace the cached pose outright.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
    }

    /// Adopt the live camera if something else moved it since the last
    /// operation, e.g. the user dragged the view with the mouse.
    ///
    /// Returns true when the baseline was replaced.
    pub fn reset_if_externally_moved(&mut self) -> bool {
        let live = self.scene.camera();
        if live.position != self.pose.position {
            log::debug!(
                "Camera moved externally, adopting live pose at ({:.6}, {:.6}, {:.1})",
                live.position.x,
                live.position.y,
                live.position.z
            );
            self.pose = live;
            true
        } else {
            false
        }
    }

    /// Slide sideways by `distance` meters without changing altitude or
    /// orientation. Positive moves to the right of the heading.
    pub fn pan_lateral(&mut self, distance: f64) {
        let current = self.pose;
        let altitude = current.altitude();

        let mut camera = current.rotate_to(current.heading, 90.0, 0.0);
        camera = camera.rotate_to(camera.heading + 90.0, camera.pitch, camera.roll);
        camera = camera.move_forward(distance);
        camera = camera.rotate_to(camera.heading - 90.0, camera.pitch, camera.roll);
        camera = camera.elevate(altitude - camera.altitude());

        self.pose = CameraPose::new(camera.position, camera.heading, current.pitch, current.roll);
    }

    /// Slide along the heading by `-distance` meters without changing
    /// altitude or orientation.
    pub fn pan_vertical(&mut self, distance: f64) {
        let current = self.pose;
        let altitude = current.altitude();

        let mut camera = current.rotate_to(current.heading, 90.0, 0.0);
        camera = camera.move_forward(-distance);
        camera = camera.elevate(altitude - camera.altitude());

        self.pose = CameraPose::new(camera.position, camera.heading, current.pitch, current.roll);
    }

    /// Lower the camera by `distance` meters, never above `max_altitude`.
    ///
    /// There is no floor: altitude may go to zero or below.
    pub fn zoom(&mut self, distance: f64, max_altitude: f64) {
        let mut position = self.pose.position;
        position.z -= distance;
        if position.z > max_altitude {
            position.z = max_altitude;
        }
        self.pose.position = position;
    }

    /// Pitch += delta. Not clamped.
    pub fn rotate_about_local_x(&mut self, delta: f64) {
        self.pose.pitch += delta;
    }

    /// Roll += delta. Not clamped.
    pub fn rotate_about_local_y(&mut self, delta: f64) {
        self.pose.roll += delta;
    }

    /// Heading += delta, kept in [0, 360).
    pub fn rotate_about_local_z(&mut self, delta: f64) {
        let pose = self.pose;
        self.pose = pose.rotate_to(pose.heading + delta, pose.pitch, pose.roll);
    }

    /// Find the surface point under the screen center.
    ///
    /// When the center shows sky, probe halfway toward the bottom edge,
    /// repeatedly, until something is hit or the remaining gap to the edge
    /// is no larger than the configured minimum.
    pub fn find_screen_pivot(&self) -> Option<GeoPoint> {
        let viewport = self.scene.viewport();
        let mut probe = viewport.center();
        let mut hit = self.scene.screen_to_surface(probe);

        while hit.is_none() && viewport.height - probe.y > self.pivot_min_gap {
            probe = ScreenPoint {
                x: probe.x,
                y: probe.y + (viewport.height - probe.y) / 2.0,
            };
            hit = self.scene.screen_to_surface(probe);
        }

        if hit.is_none() {
            log::trace!("No surface under the screen center, pivot search gave up");
        }
        hit
    }

    /// Swing the camera around the surface point in view by `-delta`
    /// degrees of heading.
    ///
    /// Returns false, leaving the pose untouched, when no pivot is found.
    pub fn orbit_around_screen_center(&mut self, delta: f64) -> bool {
        match self.find_screen_pivot() {
            Some(pivot) => {
                self.pose = self.pose.rotate_around(pivot, -delta, 0.0, 0.0);
                true
            }
            None => false,
        }
    }

    /// Publish the cached pose. Renderer failures are logged, never
    /// propagated, so input processing keeps running.
    pub fn push_to_renderer(&mut self) -> bool {
        match self.scene.set_viewpoint_camera(&self.pose) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to update viewpoint: {}", e);
                false
            }
        }
    }

    /// Stop viewpoint animations the renderer may be running.
    pub fn cancel(&mut self) {
        self.scene.cancel_viewpoint_operations();
    }
}
