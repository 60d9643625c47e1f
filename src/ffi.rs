//! C FFI layer for globenav.
//!
//! The host describes its scene view and its 3D mouse driver as tables of
//! callbacks and gets back an opaque navigator handle.
//! The generated C header is written to `include/globenav.h` by cbindgen.

use crate::arbiter::InputArbiter;
use crate::capabilities::CameraMatrixProvider;
use crate::config::{NavigationConfig, SpeedFactors};
use crate::error::LastError;
use crate::scene::{CameraSource, SurfaceProjector, ViewpointSink};
use crate::session::{DeviceSession, InputDevice, SampleSender};
use crate::types::{CameraPose, DeviceSample, GeoPoint, ScreenPoint, SessionState, Viewport};
use crate::{NavError, Result};
use glam::{DMat4, DVec3};
use std::cell::Cell;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::time::Duration;

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Scene view callbacks. Every entry except `cancel_viewpoint_operations`
/// is required. `user_data` is passed back to each call unchanged.
#[repr(C)]
pub struct GnSceneCallbacks {
    pub user_data: *mut c_void,
    /// Write the live camera to `out`. Return false if unavailable.
    pub get_camera: Option<extern "C" fn(user_data: *mut c_void, out: *mut CameraPose) -> bool>,
    pub get_viewport: Option<extern "C" fn(user_data: *mut c_void, out: *mut Viewport) -> bool>,
    /// Return false when the point shows no surface.
    pub screen_to_surface:
        Option<extern "C" fn(user_data: *mut c_void, point: ScreenPoint, out: *mut GeoPoint) -> bool>,
    /// Return false if the renderer rejected the camera.
    pub set_viewpoint_camera:
        Option<extern "C" fn(user_data: *mut c_void, pose: *const CameraPose) -> bool>,
    pub cancel_viewpoint_operations: Option<extern "C" fn(user_data: *mut c_void)>,
}

/// 3D mouse driver callbacks. Both entries are required.
#[repr(C)]
pub struct GnDeviceCallbacks {
    pub user_data: *mut c_void,
    /// Open the device under a NUL-terminated profile name.
    pub connect: Option<extern "C" fn(user_data: *mut c_void, profile: *const c_char) -> bool>,
    pub disconnect: Option<extern "C" fn(user_data: *mut c_void) -> bool>,
}

/// One device tick in C-compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GnSample {
    /// Rotation axis [x, y, z]. Need not be normalized.
    pub rotation_axis: [f64; 3],
    /// Rotation magnitude.
    pub rotation_angle: f64,
    /// Translation [x, y, z].
    pub translation: [f64; 3],
}

impl From<GnSample> for DeviceSample {
    fn from(s: GnSample) -> Self {
        DeviceSample::new(
            DVec3::from_array(s.rotation_axis),
            s.rotation_angle,
            DVec3::from_array(s.translation),
        )
    }
}

type GetCameraFn = extern "C" fn(*mut c_void, *mut CameraPose) -> bool;
type GetViewportFn = extern "C" fn(*mut c_void, *mut Viewport) -> bool;
type ScreenToSurfaceFn = extern "C" fn(*mut c_void, ScreenPoint, *mut GeoPoint) -> bool;
type SetViewpointFn = extern "C" fn(*mut c_void, *const CameraPose) -> bool;

/// Scene view backed by host callbacks.
struct CallbackScene {
    user_data: *mut c_void,
    get_camera: GetCameraFn,
    get_viewport: GetViewportFn,
    screen_to_surface: ScreenToSurfaceFn,
    set_viewpoint_camera: SetViewpointFn,
    cancel_viewpoint_operations: Option<extern "C" fn(*mut c_void)>,
    /// Last camera the host reported or accepted.
    last: Cell<CameraPose>,
}

impl CallbackScene {
    fn from_callbacks(cb: &GnSceneCallbacks) -> Result<Self> {
        match (
            cb.get_camera,
            cb.get_viewport,
            cb.screen_to_surface,
            cb.set_viewpoint_camera,
        ) {
            (Some(get_camera), Some(get_viewport), Some(screen_to_surface), Some(set_viewpoint_camera)) => {
                Ok(Self {
                    user_data: cb.user_data,
                    get_camera,
                    get_viewport,
                    screen_to_surface,
                    set_viewpoint_camera,
                    cancel_viewpoint_operations: cb.cancel_viewpoint_operations,
                    last: Cell::new(CameraPose::new(GeoPoint::default(), 0.0, 0.0, 0.0)),
                })
            }
            _ => Err(NavError::NullArgument),
        }
    }
}

impl CameraSource for CallbackScene {
    fn camera(&self) -> CameraPose {
        let mut out = self.last.get();
        if (self.get_camera)(self.user_data, &mut out) {
            self.last.set(out);
        } else {
            log::trace!("Host camera unavailable, reusing last known pose");
        }
        self.last.get()
    }
}

impl SurfaceProjector for CallbackScene {
    fn viewport(&self) -> Viewport {
        let mut out = Viewport {
            width: 0.0,
            height: 0.0,
        };
        if (self.get_viewport)(self.user_data, &mut out) {
            out
        } else {
            Viewport {
                width: 0.0,
                height: 0.0,
            }
        }
    }

    fn screen_to_surface(&self, point: ScreenPoint) -> Option<GeoPoint> {
        let mut out = GeoPoint::default();
        if (self.screen_to_surface)(self.user_data, point, &mut out) {
            Some(out)
        } else {
            None
        }
    }
}

impl ViewpointSink for CallbackScene {
    fn set_viewpoint_camera(&mut self, pose: &CameraPose) -> Result<()> {
        if (self.set_viewpoint_camera)(self.user_data, pose) {
            self.last.set(*pose);
            Ok(())
        } else {
            Err(NavError::Render("host rejected viewpoint camera".into()))
        }
    }

    fn cancel_viewpoint_operations(&mut self) {
        if let Some(cancel) = self.cancel_viewpoint_operations {
            cancel(self.user_data);
        }
    }
}

/// Input device backed by host callbacks.
struct CallbackDevice {
    user_data: *mut c_void,
    connect: extern "C" fn(*mut c_void, *const c_char) -> bool,
    disconnect: extern "C" fn(*mut c_void) -> bool,
    connected: bool,
}

impl CallbackDevice {
    fn from_callbacks(cb: &GnDeviceCallbacks) -> Result<Self> {
        match (cb.connect, cb.disconnect) {
            (Some(connect), Some(disconnect)) => Ok(Self {
                user_data: cb.user_data,
                connect,
                disconnect,
                connected: false,
            }),
            _ => Err(NavError::NullArgument),
        }
    }
}

impl InputDevice for CallbackDevice {
    fn connect(&mut self, profile: &str) -> Result<()> {
        let profile = CString::new(profile)
            .map_err(|_| NavError::DeviceIo("profile name contains NUL".into()))?;
        if (self.connect)(self.user_data, profile.as_ptr()) {
            self.connected = true;
            Ok(())
        } else {
            Err(NavError::DeviceIo("host connect callback failed".into()))
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        if (self.disconnect)(self.user_data) {
            self.connected = false;
            Ok(())
        } else {
            Err(NavError::DeviceIo("host disconnect callback failed".into()))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Opaque navigator handle for C consumers.
pub struct GnNavigator(DeviceSession<CallbackDevice, CallbackScene>);

/// Opaque, thread-safe sample queue handle for C consumers.
pub struct GnSampleSender(SampleSender);

unsafe fn read_config(config_toml: *const c_char) -> Result<NavigationConfig> {
    let config = if config_toml.is_null() {
        NavigationConfig::default()
    } else {
        let text = CStr::from_ptr(config_toml)
            .to_str()
            .map_err(|_| NavError::InvalidConfig("config is not valid UTF-8".into()))?;
        NavigationConfig::from_toml_str(text)?
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

unsafe fn create(
    scene: *const GnSceneCallbacks,
    device: *const GnDeviceCallbacks,
    config_toml: *const c_char,
) -> Result<GnNavigator> {
    if scene.is_null() || device.is_null() {
        return Err(NavError::NullArgument);
    }
    let config = read_config(config_toml)?;
    let scene = CallbackScene::from_callbacks(&*scene)?;
    let device = CallbackDevice::from_callbacks(&*device)?;
    let arbiter = InputArbiter::new(scene, &config)?;
    let session = DeviceSession::new(device, arbiter, config.profile.clone())?;
    Ok(GnNavigator(session))
}

/// Create a navigator and open the device.
///
/// `config_toml` is an optional TOML document (NULL for defaults);
/// `GLOBENAV_*` environment overrides apply either way. Navigation starts
/// disabled. Returns NULL on error (check gn_last_error()).
///
/// # Safety
/// `scene` and `device` must point to valid callback tables, or be null.
/// `config_toml` must be a NUL-terminated string, or null. The callbacks
/// and their `user_data` must stay valid until `gn_navigator_destroy`.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_create(
    scene: *const GnSceneCallbacks,
    device: *const GnDeviceCallbacks,
    config_toml: *const c_char,
) -> *mut GnNavigator {
    match create(scene, device, config_toml) {
        Ok(nav) => {
            LAST_ERROR.clear();
            Box::into_raw(Box::new(nav))
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Close the device and free the navigator.
///
/// # Safety
/// `nav` must be a pointer returned by `gn_navigator_create`, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_destroy(nav: *mut GnNavigator) {
    if !nav.is_null() {
        drop(Box::from_raw(nav));
    }
}

/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_set_enabled(nav: *mut GnNavigator, enabled: bool) {
    if let Some(nav) = nav.as_mut() {
        nav.0.set_enabled(enabled);
    }
}

/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_is_enabled(nav: *const GnNavigator) -> bool {
    match nav.as_ref() {
        Some(nav) => nav.0.is_enabled(),
        None => false,
    }
}

/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_state(nav: *const GnNavigator) -> SessionState {
    match nav.as_ref() {
        Some(nav) => nav.0.state(),
        None => SessionState::Disconnected,
    }
}

/// Replace the four speed multipliers. Returns 0 on success, -1 if any
/// factor is not a positive number.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_set_speed_factors(
    nav: *mut GnNavigator,
    move_speed: f64,
    zoom_speed: f64,
    rotate_x_speed: f64,
    rotate_z_speed: f64,
) -> c_int {
    let Some(nav) = nav.as_mut() else {
        LAST_ERROR.set(&NavError::NullArgument);
        return -1;
    };
    let factors = SpeedFactors {
        move_speed,
        zoom_speed,
        rotate_x_speed,
        rotate_z_speed,
    };
    match nav.0.arbiter_mut().set_speed_factors(factors) {
        Ok(()) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_set_reversed(nav: *mut GnNavigator, reversed: bool) {
    if let Some(nav) = nav.as_mut() {
        nav.0.arbiter_mut().set_reversed(reversed);
    }
}

/// Change the driver profile name. Returns 0 on success, -1 on error.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null. `profile` must be a
/// NUL-terminated string, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_set_profile(
    nav: *mut GnNavigator,
    profile: *const c_char,
) -> c_int {
    let (Some(nav), false) = (nav.as_mut(), profile.is_null()) else {
        LAST_ERROR.set(&NavError::NullArgument);
        return -1;
    };
    match CStr::from_ptr(profile).to_str() {
        Ok(name) => {
            nav.0.set_profile(name);
            0
        }
        Err(_) => {
            LAST_ERROR.set(&NavError::InvalidConfig("profile is not valid UTF-8".into()));
            -1
        }
    }
}

/// Process one sample on the calling thread. Returns the realized motion
/// bits (0 when nothing moved).
///
/// # Safety
/// `nav` and `sample` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_process_sample(
    nav: *mut GnNavigator,
    sample: *const GnSample,
) -> u32 {
    match (nav.as_mut(), sample.as_ref()) {
        (Some(nav), Some(sample)) => nav.0.process_sample(&DeviceSample::from(*sample)).bits(),
        _ => 0,
    }
}

/// Create a sample queue handle usable from any thread.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_sample_sender(nav: *const GnNavigator) -> *mut GnSampleSender {
    match nav.as_ref() {
        Some(nav) => Box::into_raw(Box::new(GnSampleSender(nav.0.sender()))),
        None => std::ptr::null_mut(),
    }
}

/// Queue a sample. Returns false if the queue was full.
///
/// # Safety
/// `sender` and `sample` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_sample_sender_push(
    sender: *const GnSampleSender,
    sample: *const GnSample,
) -> bool {
    match (sender.as_ref(), sample.as_ref()) {
        (Some(sender), Some(sample)) => sender.0.send_sample(DeviceSample::from(*sample)),
        _ => false,
    }
}

/// Tell the navigator the driver's configuration changed.
///
/// # Safety
/// `sender` must be a valid sender pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_sample_sender_notify_change(sender: *const GnSampleSender) -> bool {
    match sender.as_ref() {
        Some(sender) => sender.0.notify_device_change(),
        None => false,
    }
}

/// # Safety
/// `sender` must be a pointer returned by `gn_navigator_sample_sender`, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_sample_sender_destroy(sender: *mut GnSampleSender) {
    if !sender.is_null() {
        drop(Box::from_raw(sender));
    }
}

/// Handle queued samples on the calling thread.
/// `timeout_ms`: 0 = drain without blocking, > 0 = wait up to that long
/// for the first event.
/// Returns the number of events handled, or -1 on error/timeout.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_pump(nav: *mut GnNavigator, timeout_ms: c_int) -> c_int {
    let Some(nav) = nav.as_mut() else {
        LAST_ERROR.set(&NavError::NullArgument);
        return -1;
    };
    let result = if timeout_ms <= 0 {
        Ok(nav.0.pump())
    } else {
        nav.0.pump_timeout(Duration::from_millis(timeout_ms as u64))
    };
    match result {
        Ok(summary) => summary.events.min(c_int::MAX as usize) as c_int,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Host window gained focus: reconnect the device if needed.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_on_activated(nav: *mut GnNavigator) {
    if let Some(nav) = nav.as_mut() {
        nav.0.on_activated();
    }
}

/// Host window lost focus: release the device.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_on_deactivated(nav: *mut GnNavigator) {
    if let Some(nav) = nav.as_mut() {
        nav.0.on_deactivated();
    }
}

/// Copy the navigator's current camera pose to `out`.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `nav` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_pose(nav: *const GnNavigator, out: *mut CameraPose) -> c_int {
    match nav.as_ref() {
        Some(nav) if !out.is_null() => {
            out.write(*nav.0.arbiter().pose());
            0
        }
        _ => {
            LAST_ERROR.set(&NavError::NullArgument);
            -1
        }
    }
}

/// Write the live geocentric camera transform to `out` as 16 doubles,
/// column-major. Returns 0 on success, -1 on error.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null. `out` must point to
/// 16 writable doubles, or be null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_camera_matrix(nav: *const GnNavigator, out: *mut f64) -> c_int {
    match nav.as_ref() {
        Some(nav) if !out.is_null() => {
            let m = nav.0.arbiter().controller().camera_matrix().to_cols_array();
            std::ptr::copy_nonoverlapping(m.as_ptr(), out, m.len());
            0
        }
        _ => {
            LAST_ERROR.set(&NavError::NullArgument);
            -1
        }
    }
}

/// Move the camera to a geocentric transform given as 16 doubles,
/// column-major. Ignored while navigation is disabled.
/// Returns 0 on success (or when ignored), -1 on error.
///
/// # Safety
/// `nav` must be a valid navigator pointer, or null. `matrix` must point
/// to 16 readable doubles, or be null.
#[no_mangle]
pub unsafe extern "C" fn gn_navigator_set_camera_matrix(
    nav: *mut GnNavigator,
    matrix: *const f64,
) -> c_int {
    let (Some(nav), false) = (nav.as_mut(), matrix.is_null()) else {
        LAST_ERROR.set(&NavError::NullArgument);
        return -1;
    };
    if !nav.0.is_enabled() {
        return 0;
    }
    let mut cols = [0.0; 16];
    std::ptr::copy_nonoverlapping(matrix, cols.as_mut_ptr(), cols.len());
    match nav
        .0
        .arbiter_mut()
        .controller_mut()
        .set_camera_matrix(&DMat4::from_cols_array(&cols))
    {
        Ok(()) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next globenav API call.
#[no_mangle]
pub extern "C" fn gn_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}
