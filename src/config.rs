// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::model::atom::AtomDefaults;
use crate::model::lattice::CalcMode;
use crate::physics::orbit::OrbitOptions;

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Orbit expansion depth and key precisions.
  pub orbit: OrbitOptions,

  /// Mesh and radii given to atoms of imported (non-`.struct`) files.
  pub atom_defaults: AtomDefaults,

  /// Distance tolerance of the symmetry search, fractional units.
  pub symprec: f64,

  pub calc_mode: CalcMode,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      orbit: OrbitOptions::default(),
      atom_defaults: AtomDefaults::default(),
      symprec: 1e-4,
      calc_mode: CalcMode::default(),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/w2kstruct/settings.json)
  pub fn load() -> (Self, String) {
    Self::load_from(&Self::get_path())
  }

  pub fn load_from(path: &Path) -> (Self, String) {
    if path.exists() {
      match File::open(path) {
        Ok(file) => {
          let reader = BufReader::new(file);
          match serde_json::from_reader::<_, Config>(reader) {
            Ok(mut cfg) => match cfg.atom_defaults.validate() {
              Ok(()) => {
                cfg.orbit = cfg.orbit.normalized();
                (cfg, format!("Config loaded from {:?}", path))
              }
              Err(e) => (Self::default(), format!("Invalid atom defaults in config: {}", e)),
            },
            Err(e) => (Self::default(), format!("Error parsing config: {}", e)),
          }
        }
        Err(e) => (Self::default(), format!("Error opening config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    self.save_to(&Self::get_path())
  }

  pub fn save_to(&self, path: &Path) -> String {
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }

    match File::create(path) {
      Ok(file) => {
        let writer = BufWriter::new(file);
        match serde_json::to_writer_pretty(writer, self) {
          Ok(_) => format!("Config saved to {:?}", path),
          Err(e) => format!("Failed to save config: {}", e),
        }
      }
      Err(e) => format!("Could not create config file: {}", e),
    }
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "w2kstruct", "w2kstruct") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
