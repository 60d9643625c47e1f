use crate::arbiter::InputArbiter;
use crate::scene::SceneView;
use crate::types::{DeviceSample, Motion, SessionState};
use crate::{NavError, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::time::Duration;

/// Events queued between the device transport and the session.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Connection to a 6DOF input driver.
pub trait InputDevice {
    /// Open the device. `profile` names the application's settings in the
    /// driver.
    fn connect(&mut self, profile: &str) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
    fn is_connected(&self) -> bool;
}

/// What a device transport reports.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Sample(DeviceSample),
    /// Device configuration changed in the driver.
    Changed,
    /// Transport error. The device is closed and the session reports
    /// `Disconnected` until the next successful connect.
    Lost(String),
}

/// Cloneable handle for pushing device events from an I/O thread.
#[derive(Clone)]
pub struct SampleSender {
    sender: Sender<DeviceEvent>,
}

impl SampleSender {
    /// Queue a sample. Returns false if it was dropped.
    ///
    /// When the queue is full the sample is dropped: the device re-sends
    /// its full state every frame.
    pub fn send_sample(&self, sample: DeviceSample) -> bool {
        self.send(DeviceEvent::Sample(sample))
    }

    pub fn notify_device_change(&self) -> bool {
        self.send(DeviceEvent::Changed)
    }

    pub fn report_lost(&self, reason: impl Into<String>) -> bool {
        self.send(DeviceEvent::Lost(reason.into()))
    }

    pub fn send(&self, event: DeviceEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("Device event queue full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("Device session gone, dropping event");
                false
            }
        }
    }
}

/// What one [`DeviceSession::pump`] call handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    /// Events taken off the queue.
    pub events: usize,
    /// Union of the motion those events produced.
    pub motion: Motion,
}

/// Device lifecycle plus the event pump feeding an [`InputArbiter`].
///
/// Owned by one thread. Transports feed it through [`SampleSender`]s; the
/// owner drains them with [`pump`](Self::pump).
pub struct DeviceSession<D: InputDevice, S: SceneView> {
    device: D,
    arbiter: InputArbiter<S>,
    profile: String,
    enabled: bool,
    in_transaction: bool,
    /// Set by a transport error, cleared by the next successful connect.
    lost: bool,
    sender: Sender<DeviceEvent>,
    receiver: Receiver<DeviceEvent>,
}

impl<D: InputDevice, S: SceneView> DeviceSession<D, S> {
    /// Open `device` under `profile`. Navigation starts disabled.
    pub fn new(mut device: D, arbiter: InputArbiter<S>, profile: impl Into<String>) -> Result<Self> {
        let profile = profile.into();
        device.connect(&profile).map_err(|e| {
            NavError::DeviceUnavailable(format!("failed to open device for '{}': {}", profile, e))
        })?;
        log::info!("Input device connected (profile '{}')", profile);

        let (sender, receiver) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
        Ok(Self {
            device,
            arbiter,
            profile,
            enabled: false,
            in_transaction: false,
            lost: false,
            sender,
            receiver,
        })
    }

    pub fn sender(&self) -> SampleSender {
        SampleSender {
            sender: self.sender.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.lost || !self.device.is_connected() {
            SessionState::Disconnected
        } else if self.enabled {
            SessionState::Active
        } else {
            SessionState::Connected
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.in_transaction = false;
        }
        log::info!("Navigation {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Change the driver profile. While enabled the device is reopened
    /// under the new name.
    pub fn set_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if profile == self.profile {
            return;
        }
        self.profile = profile;
        if self.enabled {
            log::info!("Reopening input device with profile '{}'", self.profile);
            if self.device.is_connected() {
                if let Err(e) = self.device.disconnect() {
                    log::warn!("Failed to close input device: {}", e);
                }
            }
            self.reconnect();
        }
    }

    /// Host window gained focus.
    pub fn on_activated(&mut self) {
        if self.state() != SessionState::Disconnected {
            return;
        }
        if self.device.is_connected() {
            if let Err(e) = self.device.disconnect() {
                log::warn!("Failed to close input device: {}", e);
            }
        }
        self.reconnect();
    }

    /// Host window lost focus.
    pub fn on_deactivated(&mut self) {
        if !self.device.is_connected() {
            return;
        }
        match self.device.disconnect() {
            Ok(()) => {
                self.in_transaction = false;
                log::info!("Input device disconnected");
            }
            Err(e) => log::warn!("Failed to disconnect input device: {}", e),
        }
    }

    fn reconnect(&mut self) {
        match self.device.connect(&self.profile) {
            Ok(()) => {
                self.lost = false;
                log::info!("Input device connected (profile '{}')", self.profile);
            }
            Err(e) => log::warn!("Failed to connect input device: {}", e),
        }
    }

    fn mark_lost(&mut self, reason: &str) {
        log::warn!("Input device lost: {}", reason);
        if self.device.is_connected() {
            if let Err(e) = self.device.disconnect() {
                log::warn!("Failed to close lost input device: {}", e);
            }
        }
        self.lost = true;
        self.in_transaction = false;
    }

    /// Handle one event to completion.
    pub fn handle_event(&mut self, event: DeviceEvent) -> Motion {
        match event {
            DeviceEvent::Sample(sample) => self.process_sample(&sample),
            DeviceEvent::Changed => {
                log::debug!("Input device configuration changed");
                Motion::empty()
            }
            DeviceEvent::Lost(reason) => {
                self.mark_lost(&reason);
                Motion::empty()
            }
        }
    }

    /// Feed one sample to the arbiter. Ignored unless the session is Active.
    pub fn process_sample(&mut self, sample: &DeviceSample) -> Motion {
        if self.state() != SessionState::Active {
            return Motion::empty();
        }

        if sample.is_idle() {
            if self.in_transaction {
                log::debug!("Navigation transaction ended");
                self.in_transaction = false;
            }
        } else if !self.in_transaction {
            log::debug!("Navigation transaction started");
            self.in_transaction = true;
        }

        self.arbiter.process(sample)
    }

    /// True between the first moving sample and the next idle one.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Handle every queued event without blocking.
    pub fn pump(&mut self) -> PumpSummary {
        let mut summary = PumpSummary {
            events: 0,
            motion: Motion::empty(),
        };
        while let Ok(event) = self.receiver.try_recv() {
            summary.motion |= self.handle_event(event);
            summary.events += 1;
        }
        summary
    }

    /// Wait up to `timeout` for an event, then drain the queue.
    pub fn pump_timeout(&mut self, timeout: Duration) -> Result<PumpSummary> {
        // the session holds a sender, so the queue never disconnects
        let first = self
            .receiver
            .recv_timeout(timeout)
            .map_err(|_| NavError::Timeout)?;
        let motion = self.handle_event(first);
        let mut summary = self.pump();
        summary.events += 1;
        summary.motion |= motion;
        Ok(summary)
    }

    pub fn arbiter(&self) -> &InputArbiter<S> {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut InputArbiter<S> {
        &mut self.arbiter
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: InputDevice, S: SceneView> Drop for DeviceSession<D, S> {
    fn drop(&mut self) {
        if self.device.is_connected() {
            if let Err(e) = self.device.disconnect() {
                log::warn!("Failed to close input device on shutdown: {}", e);
            }
        }
    }
}
