// src/io/poscar.rs

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{FileError, StructureError};
use crate::model::atom::{Atom, AtomDefaults};
use crate::model::elements;
use crate::model::lattice::{CalcMode, CellParameters, LatticeType};
use crate::model::structure_file::{StructureFile, StructureProvider, StructureSeed};
use crate::model::symmetry::wrap01;
use crate::utils::linalg;

/// One bohr in ångström. POSCAR scale factor for lattices kept in bohr.
pub const BOHR_TO_ANG: f64 = 0.52917721092;

// --------------- EXPORT ---------------

/// Lattice rows (bohr) of the exported cell. Rhombohedral structures are
/// written in their primitive setting, the one their positions refer to.
fn export_lattice(structure: &StructureFile) -> [[f64; 3]; 3] {
    let cell = structure.cell();
    let base = match structure.lattice_type() {
        LatticeType::R => linalg::rhombohedral_vectors(cell.a, cell.c),
        _ => cell.lattice_vectors(),
    };
    let m = structure.multiples().as_array();
    [0, 1, 2].map(|i| base[i].map(|v| v * m[i] as f64))
}

/// Every site of the replicated conventional cell, centering translations
/// included, stably sorted by atomic number.
fn export_sites(structure: &StructureFile) -> Vec<(&Atom, [f64; 3])> {
    let multiples = structure.multiples();
    let mut translations = vec![[0.0; 3]];
    translations.extend_from_slice(structure.lattice_type().centering_translations());

    let mut sites = Vec::new();
    for replica in multiples.replicas() {
        for atom in structure.atoms() {
            for t in &translations {
                let p = atom.position();
                let centred = [0, 1, 2].map(|i| wrap01(p[i] + t[i]));
                sites.push((atom, multiples.scale(centred, replica)));
            }
        }
    }

    sites.sort_by_key(|(atom, _)| atom.atomic_number());
    sites
}

/// Renders the structure as a VASP POSCAR (fractional coordinates).
pub fn to_poscar_string(structure: &StructureFile) -> String {
    let mut out = String::new();
    let sites = export_sites(structure);

    // Group sorted sites by element for the header
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (atom, _) in &sites {
        match counts.last_mut() {
            Some((symbol, n)) if *symbol == atom.symbol() => *n += 1,
            _ => counts.push((atom.symbol(), 1)),
        }
    }

    let _ = writeln!(out, "{}", structure.title());
    let _ = writeln!(out, "{}", BOHR_TO_ANG);
    for vec in export_lattice(structure) {
        let _ = writeln!(out, " {:12.8} {:12.8} {:12.8}", vec[0], vec[1], vec[2]);
    }

    for (label, _) in &counts {
        let _ = write!(out, " {:<4}", label);
    }
    out.push('\n');
    for (_, count) in &counts {
        let _ = write!(out, " {:<4}", count);
    }
    out.push('\n');

    out.push_str("Direct\n");
    for (atom, p) in &sites {
        let _ = writeln!(out, " {:12.8} {:12.8} {:12.8} {}", p[0], p[1], p[2], atom.symbol());
    }

    out
}

pub fn write(path: &Path, structure: &StructureFile) -> Result<(), FileError> {
    fs::write(path, to_poscar_string(structure))?;
    Ok(())
}

// --------------- IMPORT ---------------

/// A parsed POSCAR/CONTCAR. Lattice rows are in ångström, positions
/// fractional.
#[derive(Debug, Clone, PartialEq)]
pub struct Poscar {
    pub title: String,
    pub lattice: [[f64; 3]; 3],
    pub species: Vec<(String, usize)>,
    pub positions: Vec<[f64; 3]>,
}

fn syntax(line: usize, message: impl Into<String>) -> FileError {
    FileError::Poscar {
        line,
        message: message.into(),
    }
}

fn parse_floats(line: &str, number: usize, count: usize) -> Result<Vec<f64>, FileError> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(count)
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| syntax(number, format!("expected {} numbers", count)))?;
    if values.len() < count {
        return Err(syntax(number, format!("expected {} numbers", count)));
    }
    Ok(values)
}

impl Poscar {
    pub fn parse(text: &str) -> Result<Self, FileError> {
        // 1-based line numbers for messages
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mut next = |what: &str| {
            lines
                .next()
                .ok_or_else(|| syntax(0, format!("unexpected end of file, missing {}", what)))
        };

        let (_, title) = next("comment")?;

        // Scale
        let (n, scale_line) = next("scale")?;
        let scale = parse_floats(scale_line, n, 1)?[0];
        if scale == 0.0 || !scale.is_finite() {
            return Err(syntax(n, "invalid scale"));
        }

        // Lattice
        let mut lattice = [[0.0; 3]; 3];
        for row in lattice.iter_mut() {
            let (n, line) = next("lattice vector")?;
            let v = parse_floats(line, n, 3)?;
            *row = [v[0], v[1], v[2]];
        }
        // a negative scale is the cell volume
        let factor = if scale < 0.0 {
            let volume = linalg::row_matrix(lattice).determinant().abs();
            if volume == 0.0 {
                return Err(syntax(n, "singular lattice"));
            }
            (-scale / volume).cbrt()
        } else {
            scale
        };
        let lattice = lattice.map(|row| row.map(|v| v * factor));

        // Elements & Counts (VASP 4 files have no symbol line)
        let (n, line6) = next("element symbols")?;
        let starts_alpha = line6
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic());
        let (symbols, (n, counts_line)) = if starts_alpha {
            let symbols: Vec<String> = line6.split_whitespace().map(str::to_string).collect();
            (symbols, next("element counts")?)
        } else {
            (Vec::new(), (n, line6))
        };

        let counts: Vec<usize> = counts_line
            .split_whitespace()
            .map(|s| s.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|_| syntax(n, "invalid element counts"))?;
        if symbols.is_empty() {
            return Err(syntax(n, "element symbols are required"));
        }
        if symbols.len() != counts.len() {
            return Err(syntax(n, "element symbols and counts differ in length"));
        }

        // Mode
        let (n, mut mode_line) = next("coordinate mode")?;
        if mode_line.trim_start().starts_with(['S', 's']) {
            // Selective dynamics
            (_, mode_line) = next("coordinate mode")?;
        }
        let is_direct = mode_line.trim_start().starts_with(['D', 'd']);
        if !is_direct && !mode_line.trim_start().starts_with(['C', 'c', 'K', 'k']) {
            return Err(syntax(n, "expected Direct or Cartesian"));
        }

        // Atoms
        let total: usize = counts.iter().sum();
        let mut positions = Vec::with_capacity(total);
        for _ in 0..total {
            let (n, line) = next("atom position")?;
            let v = parse_floats(line, n, 3)?;
            let p = [v[0], v[1], v[2]];
            let frac = if is_direct {
                p
            } else {
                let cart = p.map(|x| x * factor);
                linalg::cart_to_frac(cart, lattice).ok_or_else(|| syntax(n, "singular lattice"))?
            };
            positions.push(frac);
        }

        Ok(Self {
            title: title.trim().to_string(),
            lattice,
            species: symbols.into_iter().zip(counts).collect(),
            positions,
        })
    }

    pub fn read(path: &Path) -> Result<Self, FileError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

impl StructureProvider for Poscar {
    fn seed(&self, defaults: &AtomDefaults) -> Result<StructureSeed, StructureError> {
        let bohr = self.lattice.map(|row| row.map(|v| v / BOHR_TO_ANG));
        let cell = CellParameters::from_vectors(bohr)?;

        let mut atoms = Vec::with_capacity(self.positions.len());
        let mut positions = self.positions.iter();
        for (symbol, count) in &self.species {
            let z = elements::atomic_number(symbol)
                .ok_or_else(|| StructureError::UnknownElement(symbol.clone()))?;
            for p in positions.by_ref().take(*count) {
                atoms.push(Atom::with_defaults(*p, z, defaults)?);
            }
        }

        Ok(StructureSeed {
            title: self.title.clone(),
            lattice_type: LatticeType::P,
            calc_mode: CalcMode::default(),
            cell,
            atoms,
            operations: Vec::new(),
        })
    }
}
