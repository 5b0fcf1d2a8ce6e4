// src/io/mod.rs
pub mod poscar;
pub mod wien2k;

use std::path::Path;

use log::info;

use crate::config::Config;
use crate::error::FileError;
use crate::model::structure_file::{StructureFile, StructureProvider};

fn is_poscar_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with("poscar")
        || name.ends_with("contcar")
        || name.ends_with(".vasp")
}

pub fn load_structure(path: &Path, config: &Config) -> Result<StructureFile, FileError> {
    let p = path.to_string_lossy().to_lowercase();

    let structure = if p.ends_with(".struct") {
        StructureFile::read(path, &config.orbit)?
    } else {
        // Fallback to POSCAR for unknown or explicit POSCAR/CONTCAR
        let poscar = poscar::Poscar::read(path)?;
        let mut seed = poscar.seed(&config.atom_defaults)?;
        seed.calc_mode = config.calc_mode;
        StructureFile::from_seed(seed, config.orbit)
    };

    info!(
        "Loaded '{}' from {} ({} atoms)",
        structure.title(),
        path.display(),
        structure.atoms().len()
    );
    Ok(structure)
}

pub fn save_structure(path: &Path, structure: &StructureFile) -> Result<(), FileError> {
    if is_poscar_name(path) {
        poscar::write(path, structure)?;
    } else {
        // Default: WIEN2k document
        structure.write(path)?;
    }
    info!("Saved '{}' to {}", structure.title(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poscar_names() {
        assert!(is_poscar_name(Path::new("run/POSCAR")));
        assert!(is_poscar_name(Path::new("CONTCAR")));
        assert!(is_poscar_name(Path::new("fe.vasp")));
        assert!(is_poscar_name(Path::new("fe.poscar")));
        assert!(!is_poscar_name(Path::new("fe.struct")));
        assert!(!is_poscar_name(Path::new("poscar_dir/fe.struct")));
    }
}
