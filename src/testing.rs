//! Scripted collaborators for unit tests.

use crate::scene::{CameraSource, SurfaceProjector, ViewpointSink};
use crate::session::InputDevice;
use crate::types::{CameraPose, GeoPoint, ScreenPoint, Viewport};
use crate::{NavError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// Scene whose surface is hit only below a configurable screen row.
pub(crate) struct ScriptedScene {
    pose: CameraPose,
    viewport: Viewport,
    /// Rows at or below this y hit the surface. `None` = all sky.
    pub hit_below_y: Option<f64>,
    pub reject_viewpoints: bool,
    pub cancel_count: usize,
    pub pushes: usize,
    probes: RefCell<Vec<f64>>,
}

impl ScriptedScene {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            pose,
            viewport: Viewport {
                width: 800.0,
                height: 600.0,
            },
            hit_below_y: Some(0.0),
            reject_viewpoints: false,
            cancel_count: 0,
            pushes: 0,
            probes: RefCell::new(Vec::new()),
        }
    }

    /// Deterministic surface point for a screen position.
    pub fn surface_point_at(p: ScreenPoint) -> GeoPoint {
        GeoPoint::new(-120.0 + p.x * 1e-4, 46.0 + p.y * 1e-4, 0.0)
    }

    /// Screen rows probed so far, in order.
    pub fn probes(&self) -> Vec<f64> {
        self.probes.borrow().clone()
    }

    /// Move the live camera behind the controller's back.
    pub fn drag_to(&mut self, pose: CameraPose) {
        self.pose = pose;
    }
}

impl CameraSource for ScriptedScene {
    fn camera(&self) -> CameraPose {
        self.pose
    }
}

impl SurfaceProjector for ScriptedScene {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn screen_to_surface(&self, point: ScreenPoint) -> Option<GeoPoint> {
        self.probes.borrow_mut().push(point.y);
        match self.hit_below_y {
            Some(row) if point.y >= row => Some(Self::surface_point_at(point)),
            _ => None,
        }
    }
}

impl ViewpointSink for ScriptedScene {
    fn set_viewpoint_camera(&mut self, pose: &CameraPose) -> Result<()> {
        if self.reject_viewpoints {
            return Err(NavError::Render("scene view not ready".into()));
        }
        self.pose = *pose;
        self.pushes += 1;
        Ok(())
    }

    fn cancel_viewpoint_operations(&mut self) {
        self.cancel_count += 1;
    }
}

/// What a [`ScriptedDevice`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeviceCall {
    Connect(String),
    Disconnect,
}

/// Device whose connect/disconnect outcomes are scripted.
///
/// The call log is shared so tests can inspect it after the device has
/// moved into a session.
pub(crate) struct ScriptedDevice {
    connected: bool,
    pub fail_connect: bool,
    pub fail_disconnect: bool,
    calls: Rc<RefCell<Vec<DeviceCall>>>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            connected: false,
            fail_connect: false,
            fail_disconnect: false,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn call_log(&self) -> Rc<RefCell<Vec<DeviceCall>>> {
        Rc::clone(&self.calls)
    }
}

impl InputDevice for ScriptedDevice {
    fn connect(&mut self, profile: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(DeviceCall::Connect(profile.to_string()));
        if self.fail_connect {
            return Err(NavError::DeviceIo("driver not responding".into()));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.calls.borrow_mut().push(DeviceCall::Disconnect);
        if self.fail_disconnect {
            return Err(NavError::DeviceIo("device busy".into()));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
