//! Game tuning. Loaded from a RON file; every field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{positive, ConfigError};
use crate::locomotion::MovementConfig;
use crate::look::LookConfig;
use crate::possession::PickupConfig;
use crate::recoil::RecoilConfig;
use crate::sway::SwayConfig;
use crate::weapons::WeaponConfig;

/// All per-subsystem tuning in one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub look: LookConfig,
    /// Stats for weapons spawned without their own.
    #[serde(default)]
    pub weapon: WeaponConfig,
    #[serde(default)]
    pub recoil: RecoilConfig,
    #[serde(default)]
    pub pickup: PickupConfig,
    #[serde(default)]
    pub sway: SwayConfig,
    /// Physics tick rate.
    #[serde(default = "default_fixed_rate_hz")]
    pub fixed_rate_hz: f32,
    /// Seed for recoil, spread, shake and throw spin.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_fixed_rate_hz() -> f32 {
    50.0
}
fn default_seed() -> u64 {
    0x5eed
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            movement: MovementConfig::default(),
            look: LookConfig::default(),
            weapon: WeaponConfig::default(),
            recoil: RecoilConfig::default(),
            pickup: PickupConfig::default(),
            sway: SwayConfig::default(),
            fixed_rate_hz: default_fixed_rate_hz(),
            seed: default_seed(),
        }
    }
}

impl GameConfig {
    /// Load from `path`. If the file is missing or invalid, returns the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(data) => match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            },
            Err(e) => log::warn!("No config at {:?} ({}), using defaults", path, e),
        }
        Self::default()
    }

    /// Write as pretty RON. Logs on error.
    pub fn save(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }

    /// Check every subsystem's tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;
        self.look.validate()?;
        self.weapon.validate()?;
        self.recoil.validate()?;
        self.pickup.validate()?;
        self.sway.validate()?;
        positive("fixed_rate_hz", self.fixed_rate_hz)?;
        Ok(())
    }
}

/// `config.ron` in the current directory.
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.ron")
}
