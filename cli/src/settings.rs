use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use autosweep_core::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: Coord = 40;
pub const DEFAULT_HEIGHT: Coord = 24;
pub const DEFAULT_PERCENT: f64 = 19.0;

/// Contents of a `--settings` TOML file. Every key is optional and command
/// line flags win over it.
///
/// ```toml
/// width = 30
/// height = 16
/// mines = 99
/// direction = "whiplash"
///
/// [solver]
/// hyper_solve = false
///
/// [emphasis.add_batch]
/// is_checked = true
/// pause_time = 20
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub width: Option<Coord>,
    pub height: Option<Coord>,
    pub percent: Option<f64>,
    pub mines: Option<CellCount>,
    pub direction: Direction,
    pub solver: EngineOptions,
    pub emphasis: EmphasisTable,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn size(&self) -> Coord2 {
        (
            self.width.unwrap_or(DEFAULT_WIDTH),
            self.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }

    /// An explicit mine count takes precedence over a percentage.
    pub fn density(&self) -> MineDensity {
        match self.mines {
            Some(count) => MineDensity::Count(count),
            None => MineDensity::Percent(self.percent.unwrap_or(DEFAULT_PERCENT)),
        }
    }
}
