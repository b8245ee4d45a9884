use crate::body::{default_table, BodySpec};
use crate::cli::Cli;
use crate::orbit::SpeedLaw;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OrbitModel {
    /// Every body on a circle of radius `a`.
    Circular,
    /// Table eccentricities are used.
    Elliptical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) time_scale: f64,
    pub(crate) tick_ms: u64,
    pub(crate) fps_cap: u32,
    pub(crate) orbit_model: OrbitModel,
    pub(crate) speed_law: SpeedLaw,
    pub(crate) tilt: f64,
    pub(crate) seed: u64,
    /// 0 scales the starfield with the scene area.
    pub(crate) star_count: usize,
    pub(crate) belt_count: usize,
    pub(crate) show_stars: bool,
    pub(crate) show_orbits: bool,
    pub(crate) show_belt: bool,
    pub(crate) show_rings: bool,
    pub(crate) show_labels: bool,
    pub(crate) show_legend: bool,
    pub(crate) bodies: Vec<BodySpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_scale: 0.3,
            tick_ms: 30,
            fps_cap: 30,
            orbit_model: OrbitModel::Elliptical,
            speed_law: SpeedLaw::Kepler { exponent: 1.5 },
            tilt: 1.0,
            seed: 0x50_1A_25_u64,
            star_count: 0,
            belt_count: 140,
            show_stars: true,
            show_orbits: true,
            show_belt: true,
            show_rings: true,
            show_labels: true,
            show_legend: true,
            bodies: default_table(),
        }
    }
}

impl Settings {
    pub(crate) fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.time_scale {
            self.time_scale = v;
        }
        if let Some(v) = cli.tick_ms {
            self.tick_ms = v;
        }
        if let Some(v) = cli.fps {
            self.fps_cap = v;
        }
        if cli.circular {
            self.orbit_model = OrbitModel::Circular;
        }
        if let Some(k) = cli.kepler_exponent {
            self.speed_law = if k == 0.0 { SpeedLaw::Uniform } else { SpeedLaw::Kepler { exponent: k } };
        }
        if let Some(v) = cli.tilt {
            self.tilt = v;
        }
        if let Some(v) = cli.seed {
            self.seed = v;
        }
        if let Some(v) = cli.stars {
            self.star_count = v;
        }
        if let Some(v) = cli.belt {
            self.belt_count = v;
        }
        if cli.no_labels {
            self.show_labels = false;
        }
        if cli.no_legend {
            self.show_legend = false;
        }
        if cli.no_orbits {
            self.show_orbits = false;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            bail!("time_scale must be positive, got {}", self.time_scale);
        }
        if self.tick_ms == 0 {
            bail!("tick_ms must be at least 1");
        }
        if self.fps_cap == 0 {
            bail!("fps_cap must be at least 1");
        }
        if !(self.tilt > 0.0 && self.tilt <= 1.0) {
            bail!("tilt must be in (0, 1], got {}", self.tilt);
        }
        if let SpeedLaw::Kepler { exponent } = self.speed_law {
            if !(exponent.is_finite() && exponent > 0.0) {
                bail!("kepler exponent must be positive, got {}", exponent);
            }
        }
        if self.bodies.is_empty() {
            bail!("body table is empty");
        }
        let mut seen = HashSet::new();
        for b in &self.bodies {
            if !seen.insert(b.name.as_str()) {
                bail!("duplicate body name {:?}", b.name);
            }
            if !b.orbit().is_valid() {
                bail!("{}: need a > 0 and 0 <= e < 1 (a = {}, e = {})", b.name, b.a, b.e);
            }
            if !b.speed.is_finite() || b.speed < 0.0 {
                bail!("{}: speed must be non-negative, got {}", b.name, b.speed);
            }
            if !b.size.is_finite() || b.size <= 0.0 {
                bail!("{}: size must be positive, got {}", b.name, b.size);
            }
        }
        Ok(())
    }
}

pub(crate) fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "solarsystem", "SolarSystem").map(|p| p.config_dir().join("settings.json"))
}

pub(crate) fn read_settings(path: &Path) -> Result<Settings> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}

/// An explicit path must load; the implicit per-user file falls back to defaults.
pub(crate) fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return read_settings(path);
    }
    if let Some(path) = default_settings_path() {
        if path.exists() {
            match read_settings(&path) {
                Ok(s) => return Ok(s),
                Err(e) => log::warn!("ignoring {}: {:#}", path.display(), e),
            }
        }
    }
    Ok(Settings::default())
}

pub(crate) fn resolve(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref())?;
    settings.apply_cli(cli);
    settings.validate()?;
    Ok(settings)
}
