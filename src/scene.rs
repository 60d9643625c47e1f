//! Capabilities consumed from the host's scene renderer.
//!
//! Each trait is small so a host can implement them on whatever owns the
//! corresponding piece of its view. [`SceneView`] is the union the
//! controller needs and is implemented automatically.

use crate::types::{CameraPose, GeoPoint, ScreenPoint, Viewport};
use crate::Result;

/// Read access to the renderer's live camera.
pub trait CameraSource {
    fn camera(&self) -> CameraPose;
}

/// Screen-space queries against the rendered base surface.
pub trait SurfaceProjector {
    fn viewport(&self) -> Viewport;

    /// Project a screen point onto the base surface. `None` when the
    /// point shows no terrain (sky, space).
    fn screen_to_surface(&self, point: ScreenPoint) -> Option<GeoPoint>;
}

/// Write access to the renderer's viewpoint.
pub trait ViewpointSink {
    fn set_viewpoint_camera(&mut self, pose: &CameraPose) -> Result<()>;

    /// Stop any viewpoint animation the renderer is running.
    fn cancel_viewpoint_operations(&mut self) {}
}

pub trait SceneView: CameraSource + SurfaceProjector + ViewpointSink {}

impl<T: CameraSource + SurfaceProjector + ViewpointSink> SceneView for T {}
