use glam::DVec3;

/// Geographic position on the globe.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub x: f64,
    /// Latitude in degrees.
    pub y: f64,
    /// Altitude in meters above the base surface. May be negative.
    pub z: f64,
}

impl GeoPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Camera position and orientation.
///
/// Angles are in degrees. Pitch 0 looks straight down, 90 looks at the
/// horizon. Pitch is not clamped and may transiently leave [0, 180].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: GeoPoint,
    /// Heading in [0, 360), clockwise from north.
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl CameraPose {
    /// Build a pose, normalizing the heading into [0, 360).
    pub fn new(position: GeoPoint, heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            position,
            heading: normalize_heading(heading),
            pitch,
            roll,
        }
    }

    pub fn altitude(&self) -> f64 {
        self.position.z
    }
}

pub(crate) fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// One tick of 6DOF device input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSample {
    /// Unit rotation axis in device space.
    pub rotation_axis: DVec3,
    /// Rotation magnitude, >= 0.
    pub rotation_angle: f64,
    /// Translation in device space.
    pub translation: DVec3,
    /// Translation magnitude, >= 0.
    pub translation_length: f64,
}

impl DeviceSample {
    /// Build a sample from raw device vectors.
    ///
    /// The translation length is derived from the vector. A zero axis with
    /// a nonzero angle is treated as no rotation. A negative angle flips the
    /// axis so the stored angle is non-negative.
    pub fn new(rotation_axis: DVec3, rotation_angle: f64, translation: DVec3) -> Self {
        let mut axis = rotation_axis.normalize_or_zero();
        let angle = if axis == DVec3::ZERO {
            0.0
        } else {
            if rotation_angle < 0.0 {
                axis = -axis;
            }
            rotation_angle.abs()
        };
        Self {
            rotation_axis: axis,
            rotation_angle: angle,
            translation,
            translation_length: translation.length(),
        }
    }

    pub fn translation(translation: DVec3) -> Self {
        Self::new(DVec3::ZERO, 0.0, translation)
    }

    pub fn rotation(axis: DVec3, angle: f64) -> Self {
        Self::new(axis, angle, DVec3::ZERO)
    }

    /// True when the device reports no deflection at all.
    pub fn is_idle(&self) -> bool {
        self.rotation_angle <= f64::EPSILON && self.translation_length <= f64::EPSILON
    }
}

/// Point in viewport pixels, origin top-left, y growing downward.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Viewport size in pixels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Axis-aligned geographic box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

/// Lifecycle of a device session.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No open device.
    Disconnected = 0,
    /// Device open, navigation disabled.
    Connected = 1,
    /// Device open and samples drive the camera.
    Active = 2,
}

bitflags::bitflags! {
    /// Camera motions realized by one processed sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Motion: u32 {
        const PAN_LATERAL  = 1 << 0;
        const PAN_VERTICAL = 1 << 1;
        const ZOOM         = 1 << 2;
        const PITCH        = 1 << 3;
        const HEADING      = 1 << 4;
        const ORBIT        = 1 << 5;
    }
}
