//! # globenav - 6DOF input-device navigation for globe cameras
//!
//! Turns samples from a 3D mouse into camera motion over a spherical earth.
//! Provides:
//! - Altitude-aware pan, zoom, pitch and heading with one dominant motion per tick
//! - Orbiting around the surface point in view when far from the ground
//! - A device session with a thread-safe sample queue
//! - C FFI for hosts written in other languages
//!
//! ## Quick Start
//! ```no_run
//! # fn main() -> globenav::Result<()> {
//! use globenav::{
//!     CameraPose, DeviceSample, GeoPoint, InputArbiter, NavigationConfig, SimulatedScene, Viewport,
//! };
//! use glam::DVec3;
//!
//! let config = NavigationConfig::default().with_env_overrides();
//! let pose = CameraPose::new(GeoPoint::new(-119.95, 46.76, 10_000.0), 0.0, 45.0, 0.0);
//! let scene = SimulatedScene::new(pose, Viewport { width: 1280.0, height: 720.0 });
//! let mut arbiter = InputArbiter::new(scene, &config)?;
//!
//! let motion = arbiter.process(&DeviceSample::translation(DVec3::new(100.0, 0.0, 0.0)));
//! println!("{:?} -> {:?}", motion, arbiter.pose());
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod capabilities;
pub mod config;
pub mod controller;
pub mod error;
pub mod ffi;
pub mod geometry;
pub mod scene;
pub mod session;
pub mod sim;
pub mod speed;
pub mod types;

#[cfg(test)]
mod testing;

pub use arbiter::InputArbiter;
pub use config::{ArbitrationPolicy, NavigationConfig, NavigationLimits, SpeedFactors};
pub use controller::CameraController;
pub use error::NavError;
pub use scene::{CameraSource, SceneView, SurfaceProjector, ViewpointSink};
pub use session::{DeviceEvent, DeviceSession, InputDevice, PumpSummary, SampleSender};
pub use sim::SimulatedScene;
pub use types::*;

/// Result type alias for globenav operations.
pub type Result<T> = std::result::Result<T, NavError>;
