//! Spherical-earth camera geometry.
//!
//! Positions are geographic (`GeoPoint`: lon/lat degrees, altitude meters).
//! Motions are computed in geocentric (ECEF) space and in the local
//! east-north-up (ENU) frame of a reference point, then converted back.
//!
//! Camera orientation in ENU: the identity quaternion looks straight down
//! (-Z) with north (+Y) at the top of the screen. Heading turns clockwise
//! about up, pitch tilts toward the horizon about the camera's right axis,
//! roll spins about the view axis.

use crate::types::{CameraPose, GeoPoint};
use glam::{DMat3, DMat4, DQuat, DVec3};

/// Base-surface radius in meters (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Convert a geographic position to geocentric coordinates (meters).
pub fn geo_to_ecef(p: GeoPoint) -> DVec3 {
    let lon = p.x.to_radians();
    let lat = p.y.to_radians();
    let r = EARTH_RADIUS + p.z;
    DVec3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

/// Convert geocentric coordinates (meters) back to a geographic position.
pub fn ecef_to_geo(v: DVec3) -> GeoPoint {
    let r = v.length();
    if r <= f64::EPSILON {
        return GeoPoint::new(0.0, 0.0, -EARTH_RADIUS);
    }
    let lat = (v.z / r).clamp(-1.0, 1.0).asin();
    let lon = v.y.atan2(v.x);
    GeoPoint::new(lon.to_degrees(), lat.to_degrees(), r - EARTH_RADIUS)
}

/// Local frame at `origin`: columns are east, north, up in geocentric axes.
pub fn enu_frame(origin: GeoPoint) -> DMat3 {
    let (slon, clon) = origin.x.to_radians().sin_cos();
    let (slat, clat) = origin.y.to_radians().sin_cos();
    DMat3::from_cols(
        DVec3::new(-slon, clon, 0.0),
        DVec3::new(-slat * clon, -slat * slon, clat),
        DVec3::new(clat * clon, clat * slon, slat),
    )
}

/// Offset of `p` from `origin`, expressed in `origin`'s ENU frame.
pub fn to_enu(origin: GeoPoint, p: GeoPoint) -> DVec3 {
    enu_frame(origin).transpose() * (geo_to_ecef(p) - geo_to_ecef(origin))
}

/// Position reached by applying an ENU `offset` at `origin`.
pub fn from_enu(origin: GeoPoint, offset: DVec3) -> GeoPoint {
    ecef_to_geo(geo_to_ecef(origin) + enu_frame(origin) * offset)
}

/// Camera orientation in the local ENU frame.
pub fn local_orientation(heading: f64, pitch: f64, roll: f64) -> DQuat {
    DQuat::from_rotation_z(-heading.to_radians())
        * DQuat::from_rotation_x(pitch.to_radians())
        * DQuat::from_rotation_z(roll.to_radians())
}

/// Decompose a local ENU orientation into (heading, pitch, roll) degrees.
///
/// Looking straight up or down leaves heading and roll coupled; the
/// heading is then taken from the screen-up vector and roll comes out 0.
fn local_euler(q: DQuat) -> (f64, f64, f64) {
    let forward = q * DVec3::NEG_Z;
    let horizontal = forward.x.hypot(forward.y);
    let pitch = horizontal.atan2(-forward.z);
    let heading = if horizontal > 1e-9 {
        forward.x.atan2(forward.y)
    } else {
        let up = q * DVec3::Y;
        up.x.atan2(up.y)
    };

    let heading_pitch =
        DQuat::from_rotation_z(-heading) * DQuat::from_rotation_x(pitch);
    let rest = heading_pitch.inverse() * q;
    let mut roll = 2.0 * rest.z.atan2(rest.w);
    if roll > std::f64::consts::PI {
        roll -= std::f64::consts::TAU;
    } else if roll <= -std::f64::consts::PI {
        roll += std::f64::consts::TAU;
    }

    (heading.to_degrees(), pitch.to_degrees(), roll.to_degrees())
}

/// Geocentric camera transform: rotation maps camera axes to ECEF axes,
/// translation is the ECEF camera position.
pub fn pose_to_matrix(pose: &CameraPose) -> DMat4 {
    let frame = DQuat::from_mat3(&enu_frame(pose.position));
    let rotation = frame * local_orientation(pose.heading, pose.pitch, pose.roll);
    DMat4::from_rotation_translation(rotation.normalize(), geo_to_ecef(pose.position))
}

/// Inverse of [`pose_to_matrix`]. Scale is discarded.
///
/// Returns `None` for matrices with a collapsed axis or a translation at
/// the earth's center.
pub fn matrix_to_pose(m: &DMat4) -> Option<CameraPose> {
    let (scale, rotation, translation) = m.to_scale_rotation_translation();
    if !scale.is_finite()
        || !translation.is_finite()
        || scale.abs().min_element() <= 1e-12
        || translation.length() <= f64::EPSILON
    {
        return None;
    }

    let position = ecef_to_geo(translation);
    let frame = DQuat::from_mat3(&enu_frame(position));
    let local = (frame.inverse() * rotation).normalize();
    let (heading, pitch, roll) = local_euler(local);
    Some(CameraPose::new(position, heading, pitch, roll))
}

/// First intersection of a ray with the base surface sphere.
///
/// `dir` must be normalized. Returns the geocentric hit point.
pub fn ray_hit_surface(origin: DVec3, dir: DVec3) -> Option<DVec3> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - EARTH_RADIUS * EARTH_RADIUS;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = -b - sqrt_disc;
    let far = -b + sqrt_disc;
    let t = if near > 0.0 {
        near
    } else if far > 0.0 {
        far
    } else {
        return None;
    };
    Some(origin + dir * t)
}

/// Camera-representation transforms. Each returns a new pose.
impl CameraPose {
    /// Same position, new orientation.
    pub fn rotate_to(&self, heading: f64, pitch: f64, roll: f64) -> CameraPose {
        CameraPose::new(self.position, heading, pitch, roll)
    }

    /// Unit look direction in the local ENU frame.
    pub fn look_direction(&self) -> DVec3 {
        local_orientation(self.heading, self.pitch, self.roll) * DVec3::NEG_Z
    }

    /// Move `distance` meters along the look direction (negative = backward).
    ///
    /// Motion is a straight line in space, so a "horizontal" move gains a
    /// little altitude over the curved surface.
    pub fn move_forward(&self, distance: f64) -> CameraPose {
        let step = enu_frame(self.position) * (self.look_direction() * distance);
        CameraPose {
            position: ecef_to_geo(geo_to_ecef(self.position) + step),
            ..*self
        }
    }

    /// Change altitude by `delta` meters.
    pub fn elevate(&self, delta: f64) -> CameraPose {
        let mut pose = *self;
        pose.position.z += delta;
        pose
    }

    /// Orbit about `pivot`: heading delta swings the camera around the
    /// pivot's up axis, pitch delta around the camera's right axis.
    pub fn rotate_around(
        &self,
        pivot: GeoPoint,
        heading_delta: f64,
        pitch_delta: f64,
        roll_delta: f64,
    ) -> CameraPose {
        let mut offset = to_enu(pivot, self.position);
        offset = DQuat::from_rotation_z(-heading_delta.to_radians()) * offset;

        let heading = self.heading + heading_delta;
        if pitch_delta != 0.0 {
            let h = heading.to_radians();
            let right = DVec3::new(h.cos(), -h.sin(), 0.0);
            offset = DQuat::from_axis_angle(right, pitch_delta.to_radians()) * offset;
        }

        CameraPose::new(
            from_enu(pivot, offset),
            heading,
            self.pitch + pitch_delta,
            self.roll + roll_delta,
        )
    }
}
