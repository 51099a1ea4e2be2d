//! Configuration du front-end
//!
//! Chargée depuis `config.toml` (format TOML via serde). Toutes les
//! constantes de cadencement sont configurables: plancher et plafond du
//! budget de cycles, périodes de rafraîchissement et de mesure de vitesse.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::display::DisplayMode;
use crate::error::FrontendError;

/// Configuration principale du front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendConfig {
    pub video: VideoConfig,
    pub pacing: PacingConfig,
    pub emulation: EmulationConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub display_mode: DisplayMode,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Facteur d'échelle de la fenêtre initiale
    pub window_scale: u32,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Horloge de référence du CPU émulé (cycles par seconde)
    pub baseline_cycles_per_second: u32,
    /// Progression minimale par tick
    pub cycle_floor: u32,
    /// Borne contre le rattrapage après une longue pause
    pub cycle_ceiling: u32,
    pub refresh_period_ms: f64,
    pub speed_report_period_ms: f64,
    /// Intervalle visé entre deux ticks de la boucle hôte
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulationConfig {
    pub max_image_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Capture clavier active au démarrage (F3 pour basculer)
    pub capture_keyboard: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            video: VideoConfig {
                display_mode: DisplayMode::Accelerated,
                screen_width: crate::SCREEN_WIDTH,
                screen_height: crate::SCREEN_HEIGHT,
                window_scale: 2,
                vsync: true,
            },
            pacing: PacingConfig {
                baseline_cycles_per_second: crate::DEFAULT_CPU_CLOCK,
                cycle_floor: 100,
                cycle_ceiling: 25_000,
                refresh_period_ms: 40.0,
                speed_report_period_ms: 3000.0,
                frame_interval_ms: 16,
            },
            emulation: EmulationConfig {
                max_image_bytes: crate::MAX_IMAGE_SIZE,
            },
            input: InputConfig {
                capture_keyboard: true,
            },
        }
    }
}

impl FrontendConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("lecture de {}", path))?;
        let config: FrontendConfig = toml::from_str(&contents)
            .with_context(|| format!("analyse de {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Charge la configuration, ou retombe sur les valeurs par défaut
    pub fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Configuration {} ignorée ({:#}), valeurs par défaut", path, e);
                Self::default()
            }
        }
    }

    /// Vérifie la cohérence des paramètres
    pub fn validate(&self) -> Result<(), FrontendError> {
        let p = &self.pacing;
        if p.baseline_cycles_per_second == 0 {
            return Err(FrontendError::InvalidConfig(
                "baseline_cycles_per_second doit être > 0".into(),
            ));
        }
        if p.cycle_floor > p.cycle_ceiling {
            return Err(FrontendError::InvalidConfig(format!(
                "cycle_floor ({}) > cycle_ceiling ({})",
                p.cycle_floor, p.cycle_ceiling
            )));
        }
        for (name, period) in [
            ("refresh_period_ms", p.refresh_period_ms),
            ("speed_report_period_ms", p.speed_report_period_ms),
        ] {
            if !(period.is_finite() && period > 0.0) {
                return Err(FrontendError::InvalidConfig(format!(
                    "{} doit être > 0 (reçu {})",
                    name, period
                )));
            }
        }
        if p.frame_interval_ms == 0 {
            return Err(FrontendError::InvalidConfig("frame_interval_ms doit être > 0".into()));
        }
        if self.video.screen_width == 0 || self.video.screen_height == 0 {
            return Err(FrontendError::InvalidConfig("écran de taille nulle".into()));
        }
        if self.emulation.max_image_bytes == 0 {
            return Err(FrontendError::InvalidConfig("max_image_bytes doit être > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FrontendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pacing.baseline_cycles_per_second, 100_000);
        assert_eq!(config.emulation.max_image_bytes, 65536);
    }

    #[test]
    fn test_floor_above_ceiling_rejected() {
        let mut config = FrontendConfig::default();
        config.pacing.cycle_floor = 50_000;
        config.pacing.cycle_ceiling = 10;
        assert!(matches!(config.validate(), Err(FrontendError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_period_rejected() {
        let mut config = FrontendConfig::default();
        config.pacing.refresh_period_ms = 0.0;
        assert!(config.validate().is_err());

        let mut config = FrontendConfig::default();
        config.pacing.speed_report_period_ms = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_frame_interval_rejected() {
        let mut config = FrontendConfig::default();
        config.pacing.frame_interval_ms = 0;
        assert!(matches!(config.validate(), Err(FrontendError::InvalidConfig(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = FrontendConfig::default();
        config.video.display_mode = DisplayMode::Software;
        config.pacing.cycle_ceiling = 200_000;
        config.save_to_file(path).unwrap();

        let loaded = FrontendConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = FrontendConfig::load_or_default(path.to_str().unwrap());
        assert_eq!(config, FrontendConfig::default());
    }
}
