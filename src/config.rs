use crate::{NavError, Result};
use serde::{Deserialize, Serialize};

/// User-tunable speed multipliers, one per motion category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedFactors {
    pub move_speed: f64,
    pub zoom_speed: f64,
    pub rotate_x_speed: f64,
    pub rotate_z_speed: f64,
}

impl Default for SpeedFactors {
    fn default() -> Self {
        Self {
            move_speed: 1.0,
            zoom_speed: 1.0,
            rotate_x_speed: 1.0,
            rotate_z_speed: 1.0,
        }
    }
}

impl SpeedFactors {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("move_speed", self.move_speed),
            ("zoom_speed", self.zoom_speed),
            ("rotate_x_speed", self.rotate_x_speed),
            ("rotate_z_speed", self.rotate_z_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(NavError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Altitude and angle limits that shape navigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationLimits {
    /// Zoom ceiling in meters.
    pub max_altitude: f64,
    /// Pitch above which pitch rotation may only decrease pitch.
    pub pitch_max: f64,
    /// Pitch below which pitch rotation may only increase pitch.
    pub pitch_min: f64,
    /// Per-tick heading change limit in degrees. `None` disables the clamp.
    pub heading_delta_max: Option<f64>,
    /// Below this altitude heading input turns in place; above it the
    /// camera orbits the surface point in view.
    pub near_ground_altitude: f64,
    /// Altitude separating fine (below) from coarse (above) pitch rotation.
    pub rotate_x_altitude: f64,
    /// Pivot search gives up once the remaining screen gap is this small (px).
    pub pivot_search_min_gap: f64,
}

impl Default for NavigationLimits {
    fn default() -> Self {
        Self {
            max_altitude: 20_000_000.0,
            pitch_max: 90.0,
            pitch_min: 0.0,
            heading_delta_max: Some(0.6),
            near_ground_altitude: 5000.0,
            rotate_x_altitude: 2_000_000.0,
            pivot_search_min_gap: 10.0,
        }
    }
}

impl NavigationLimits {
    pub fn validate(&self) -> Result<()> {
        if !self.max_altitude.is_finite() || self.max_altitude <= 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "max_altitude must be positive, got {}",
                self.max_altitude
            )));
        }
        if !(self.pitch_min < self.pitch_max) {
            return Err(NavError::InvalidConfig(format!(
                "pitch_min ({}) must be below pitch_max ({})",
                self.pitch_min, self.pitch_max
            )));
        }
        if let Some(max) = self.heading_delta_max {
            if !max.is_finite() || max <= 0.0 {
                return Err(NavError::InvalidConfig(format!(
                    "heading_delta_max must be positive, got {}",
                    max
                )));
            }
        }
        if !self.pivot_search_min_gap.is_finite() || self.pivot_search_min_gap < 1.0 {
            return Err(NavError::InvalidConfig(format!(
                "pivot_search_min_gap must be at least 1 px, got {}",
                self.pivot_search_min_gap
            )));
        }
        Ok(())
    }
}

/// How a sample carrying both rotation and translation is resolved.
///
/// Either way exactly one motion, on the dominant axis, is applied per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArbitrationPolicy {
    /// Translate when rotation is near zero or the translation length is at
    /// least the rotation angle; otherwise rotate.
    #[default]
    DominantAxis,
    /// Translate when the translation length exceeds `high`, or when
    /// rotation is near zero and it exceeds `low`; otherwise rotate.
    Threshold { high: f64, low: f64 },
}

/// Everything the host can tune about navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub speed: SpeedFactors,
    pub limits: NavigationLimits,
    pub policy: ArbitrationPolicy,
    /// Invert every motion direction.
    pub reversed: bool,
    /// Name the device driver uses to find its per-application settings.
    pub profile: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            speed: SpeedFactors::default(),
            limits: NavigationLimits::default(),
            policy: ArbitrationPolicy::default(),
            reversed: false,
            profile: "globenav".to_string(),
        }
    }
}

impl NavigationConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: NavigationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.speed.validate()?;
        self.limits.validate()?;
        if let ArbitrationPolicy::Threshold { high, low } = self.policy {
            if !(low >= 0.0 && low <= high) {
                return Err(NavError::InvalidConfig(format!(
                    "threshold policy needs 0 <= low <= high, got low={} high={}",
                    low, high
                )));
            }
        }
        Ok(())
    }

    /// Apply `GLOBENAV_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read_f64 = |name: &str, current: f64| -> f64 {
            match lookup(name) {
                Some(v) => match v.trim().parse::<f64>() {
                    Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed,
                    _ => {
                        log::warn!("Ignoring {}='{}' (expected a positive number)", name, v);
                        current
                    }
                },
                None => current,
            }
        };

        self.speed.move_speed = read_f64("GLOBENAV_MOVE_SPEED", self.speed.move_speed);
        self.speed.zoom_speed = read_f64("GLOBENAV_ZOOM_SPEED", self.speed.zoom_speed);
        self.speed.rotate_x_speed = read_f64("GLOBENAV_ROTATE_X_SPEED", self.speed.rotate_x_speed);
        self.speed.rotate_z_speed = read_f64("GLOBENAV_ROTATE_Z_SPEED", self.speed.rotate_z_speed);

        if let Some(v) = lookup("GLOBENAV_REVERSED") {
            match parse_bool(&v) {
                Some(b) => self.reversed = b,
                None => log::warn!("Ignoring GLOBENAV_REVERSED='{}' (expected a boolean)", v),
            }
        }

        if let Some(v) = lookup("GLOBENAV_PROFILE") {
            let v = v.trim();
            if !v.is_empty() {
                self.profile = v.to_string();
            }
        }

        self
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    let v = v.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
