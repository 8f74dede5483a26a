//! Simulation settings
//!
//! Loaded from a JSON file next to the blueprints. Every field has a default,
//! so a partial file only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// Shape of the brightness curve between a light source and its radius edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    #[default]
    Linear,
    InverseSquare,
}

impl Falloff {
    pub fn as_str(&self) -> &'static str {
        match self {
            Falloff::Linear => "linear",
            Falloff::InverseSquare => "inverse_square",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(Falloff::Linear),
            "inverse_square" | "inverse-square" | "quadratic" => Some(Falloff::InverseSquare),
            _ => None,
        }
    }

    /// Normalized falloff weight in [0, 1]: 1 at the source, 0 at the edge.
    ///
    /// `distance` is assumed to be within `[0, radius]`.
    pub fn weight(&self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 {
            return 1.0;
        }
        let t = (distance / radius).clamp(0.0, 1.0);
        match self {
            Falloff::Linear => 1.0 - t,
            Falloff::InverseSquare => {
                // 1/(1+d^2), rescaled so the edge lands exactly on 0
                let edge = 1.0 / (1.0 + radius * radius);
                let here = 1.0 / (1.0 + distance * distance);
                ((here - edge) / (1.0 - edge)).clamp(0.0, 1.0)
            }
        }
    }
}

/// Light propagation tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Brightness of a source's own cell at full intensity
    pub max_brightness: f32,
    /// Brightness at the edge of a light's radius (must stay above zero)
    pub min_brightness: f32,
    /// Curve between the two
    pub falloff: Falloff,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            max_brightness: MAX_BRIGHTNESS,
            min_brightness: MIN_BRIGHTNESS,
            falloff: Falloff::Linear,
        }
    }
}

impl LightSettings {
    /// Clamp into a usable range: 0 < min <= max <= 1
    pub fn sanitized(mut self) -> Self {
        self.max_brightness = self.max_brightness.clamp(f32::EPSILON, 1.0);
        self.min_brightness = self.min_brightness.clamp(f32::EPSILON, self.max_brightness);
        self
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub light: LightSettings,

    // === Rendering hints ===
    /// Blend-toward-black ratio for explored-but-unseen cells
    pub fov_dim_ratio: f32,
    /// Fraction of a cell's colour shown when visible but unlit
    pub ambient_light: f32,
    /// How strongly the nearest light's colour tints a lit cell
    pub light_tint: f32,

    // === Actors ===
    /// Sight radius for spawned actors
    pub default_fov_radius: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            light: LightSettings::default(),
            fov_dim_ratio: FOV_DIM_RATIO,
            ambient_light: 0.35,
            light_tint: 0.25,
            default_fov_radius: DEFAULT_FOV_RADIUS,
        }
    }
}

impl Settings {
    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| Error::table("settings", e))?;
        Ok(settings.sanitized())
    }

    /// Load settings from a file, falling back to defaults if it is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::table("settings", e))?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Clamp ratios into [0, 1] and the light settings into a usable range
    pub fn sanitized(mut self) -> Self {
        self.light = self.light.sanitized();
        self.fov_dim_ratio = self.fov_dim_ratio.clamp(0.0, 1.0);
        self.ambient_light = self.ambient_light.clamp(0.0, 1.0);
        self.light_tint = self.light_tint.clamp(0.0, 1.0);
        self.default_fov_radius = self.default_fov_radius.min(MAX_RADIUS);
        self
    }
}
