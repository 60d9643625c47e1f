//! Fly a simulated globe camera with a scripted 3D mouse.
//!
//! An I/O thread plays back a short gesture script through the session's
//! sample queue while the main thread pumps it, as a host UI thread would.
//!
//! Usage: cargo run --example simulate
//! Set RUST_LOG=debug to see transactions, trace for every sample.

use globenav::{
    CameraPose, DeviceSample, DeviceSession, GeoPoint, InputArbiter, InputDevice, NavError,
    NavigationConfig, SimulatedScene, Viewport,
};
use glam::DVec3;
use std::time::Duration;

/// Stands in for the driver connection.
struct DemoDevice {
    connected: bool,
}

impl InputDevice for DemoDevice {
    fn connect(&mut self, profile: &str) -> globenav::Result<()> {
        println!("[device] open (profile '{}')", profile);
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> globenav::Result<()> {
        println!("[device] close");
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// (label, sample, repeat count)
fn gesture_script() -> Vec<(&'static str, DeviceSample, usize)> {
    let idle = DeviceSample::default();
    vec![
        ("zoom out", DeviceSample::translation(DVec3::new(0.0, 0.0, 250.0)), 60),
        ("rest", idle, 1),
        ("pan east", DeviceSample::translation(DVec3::new(300.0, 0.0, 0.0)), 40),
        ("rest", idle, 1),
        ("tilt toward horizon", DeviceSample::rotation(DVec3::X, 200.0), 60),
        ("rest", idle, 1),
        ("orbit", DeviceSample::rotation(DVec3::Z, 300.0), 90),
        ("rest", idle, 1),
        ("zoom in", DeviceSample::translation(DVec3::new(0.0, 0.0, -300.0)), 80),
        ("rest", idle, 1),
        ("turn in place", DeviceSample::rotation(DVec3::NEG_Z, 300.0), 30),
        ("rest", idle, 1),
    ]
}

fn print_pose(label: &str, pose: &CameraPose) {
    println!(
        "{:<22} lon={:+10.5} lat={:+9.5} alt={:>12.1}  heading={:6.2} pitch={:6.2}",
        label, pose.position.x, pose.position.y, pose.position.z, pose.heading, pose.pitch
    );
}

fn main() {
    env_logger::init();

    let config = NavigationConfig::default().with_env_overrides();

    let start = CameraPose::new(GeoPoint::new(-119.9489, 46.7592, 4_000.0), 0.0, 30.0, 0.0);
    let scene = SimulatedScene::new(
        start,
        Viewport {
            width: 1280.0,
            height: 720.0,
        },
    );
    let arbiter = match InputArbiter::new(scene, &config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = match DeviceSession::new(DemoDevice { connected: false }, arbiter, config.profile.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open device: {}", e);
            std::process::exit(1);
        }
    };
    session.set_enabled(true);
    print_pose("start", session.arbiter().pose());

    let sender = session.sender();
    let io_thread = std::thread::Builder::new()
        .name("globenav-io".into())
        .spawn(move || {
            for (label, sample, count) in gesture_script() {
                println!("[io] {}", label);
                for _ in 0..count {
                    sender.send_sample(sample);
                    // ~60 Hz device rate
                    std::thread::sleep(Duration::from_millis(16));
                }
            }
        });
    let io_thread = match io_thread {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to spawn I/O thread: {}", e);
            std::process::exit(1);
        }
    };

    let mut handled = 0usize;
    let mut last_report = 0usize;
    loop {
        match session.pump_timeout(Duration::from_millis(250)) {
            Ok(summary) => {
                handled += summary.events;
                if handled - last_report >= 50 {
                    print_pose(&format!("after {} samples", handled), session.arbiter().pose());
                    last_report = handled;
                }
            }
            Err(NavError::Timeout) => {
                if io_thread.is_finished() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let _ = io_thread.join();
    print_pose("end", session.arbiter().pose());
    println!(
        "\nTotal: {} samples, {} viewpoint updates",
        handled,
        session.arbiter().controller().scene().updates()
    );
}
