//! The structure aggregate behind a `.struct` document.
//!
//! A [`StructureFile`] owns the lattice, the full atom list with one
//! equivalence group id per atom, and the symmetry operations. Every
//! mutation goes through a `tweak_*` method that validates its input
//! completely before touching any field, and records what it changed in an
//! append-only tweak log. A rejected tweak leaves the structure untouched.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::StructureError;
use crate::model::atom::{self, Atom, AtomDefaults};
use crate::model::lattice::{CalcMode, CellParameters, LatticeType};
use crate::model::symmetry::SymmetryOperation;
use crate::physics::analysis::{SymmetryAnalysis, SymmetryAnalyzer};
use crate::physics::orbit::{self, OrbitOptions};
use crate::physics::supercell::CellMultiples;

/// Space group reported by the last symmetry analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceGroup {
    pub symbol: String,
    pub number: u32,
}

/// Read-only view of a structure for reports (`w2kstruct info --json`).
#[derive(Debug, Clone, Serialize)]
pub struct StructureSummary<'a> {
    pub title: &'a str,
    pub lattice_type: LatticeType,
    pub calc_mode: CalcMode,
    pub cell: CellParameters,
    pub multiples: [u32; 3],
    pub atom_count: usize,
    pub non_equivalent: usize,
    pub operation_count: usize,
    pub space_group: Option<(&'a str, u32)>,
    pub unique_atoms: Vec<&'a Atom>,
}

/// Everything needed to build a structure from an outside source.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSeed {
    pub title: String,
    pub lattice_type: LatticeType,
    pub calc_mode: CalcMode,
    pub cell: CellParameters,
    /// Unique atoms; expanded with `operations` when those are present.
    pub atoms: Vec<Atom>,
    pub operations: Vec<SymmetryOperation>,
}

/// A source of initial structures (a parsed POSCAR, a database entry).
pub trait StructureProvider {
    fn seed(&self, defaults: &AtomDefaults) -> Result<StructureSeed, StructureError>;
}

/// Optional changes to the cell parameters. `None` leaves a value as is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellTweak {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

/// Optional changes to one atom. `None` leaves a value as is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtomTweak {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub atomic_number: Option<u32>,
    pub rotation: Option<[[f64; 3]; 3]>,
    pub npt: Option<u32>,
    pub r0: Option<f64>,
    pub rmt: Option<f64>,
    pub isplit: Option<i32>,
    pub magnetization: Option<[f64; 3]>,
}

impl AtomTweak {
    fn is_empty(&self) -> bool {
        *self == AtomTweak::default()
    }

    /// Whether applying this tweak can break the current symmetry.
    fn moves_site(&self) -> bool {
        self.x.is_some()
            || self.y.is_some()
            || self.z.is_some()
            || self.atomic_number.is_some()
            || self.magnetization.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureFile {
    title: String,
    lattice_type: LatticeType,
    calc_mode: CalcMode,
    cell: CellParameters,
    multiples: CellMultiples,
    atoms: Vec<Atom>,
    groups: Vec<usize>,
    operations: Vec<SymmetryOperation>,
    write_symmetry: bool,
    space_group: Option<SpaceGroup>,
    orbit_options: OrbitOptions,
    tweak_log: Vec<String>,
}

impl StructureFile {
    /// A structure without symmetry: every atom is its own group.
    pub fn new(
        title: impl Into<String>,
        lattice_type: LatticeType,
        cell: CellParameters,
        atoms: Vec<Atom>,
    ) -> Self {
        let groups = (0..atoms.len()).collect();
        Self {
            title: title.into(),
            lattice_type,
            calc_mode: CalcMode::default(),
            cell,
            multiples: CellMultiples::default(),
            atoms,
            groups,
            operations: Vec::new(),
            write_symmetry: false,
            space_group: None,
            orbit_options: OrbitOptions::default(),
            tweak_log: Vec::new(),
        }
    }

    /// Expands `unique` atoms with `operations` into the full cell. Each
    /// unique atom becomes one equivalence group.
    pub fn with_symmetry(
        title: impl Into<String>,
        lattice_type: LatticeType,
        cell: CellParameters,
        unique: &[Atom],
        operations: Vec<SymmetryOperation>,
        options: OrbitOptions,
    ) -> Self {
        if operations.is_empty() {
            let mut structure = Self::new(title, lattice_type, cell, unique.to_vec());
            structure.orbit_options = options.normalized();
            return structure;
        }

        let (atoms, groups) = orbit::expand_all(unique, &operations, &options);
        debug!(
            "Expanded {} unique atom(s) into {} with {} operations",
            unique.len(),
            atoms.len(),
            operations.len()
        );

        Self {
            groups,
            operations,
            write_symmetry: true,
            orbit_options: options.normalized(),
            ..Self::new(title, lattice_type, cell, atoms)
        }
    }

    pub fn from_seed(seed: StructureSeed, options: OrbitOptions) -> Self {
        let mut structure = Self::with_symmetry(
            seed.title,
            seed.lattice_type,
            seed.cell,
            &seed.atoms,
            seed.operations,
            options,
        );
        structure.calc_mode = seed.calc_mode;
        structure
    }

    pub fn from_provider(
        provider: &dyn StructureProvider,
        defaults: &AtomDefaults,
        options: OrbitOptions,
    ) -> Result<Self, StructureError> {
        let seed = provider.seed(defaults)?;
        info!("Building structure '{}' ({} atoms)", seed.title, seed.atoms.len());
        Ok(Self::from_seed(seed, options))
    }

    /// Assembles an already expanded atom list, e.g. a decoded document.
    /// `groups` holds one entry per atom of `seed.atoms`.
    pub(crate) fn from_parts(seed: StructureSeed, groups: Vec<usize>, options: OrbitOptions) -> Self {
        debug_assert_eq!(groups.len(), seed.atoms.len());
        let write_symmetry = !seed.operations.is_empty();
        Self {
            calc_mode: seed.calc_mode,
            groups,
            operations: seed.operations,
            write_symmetry,
            orbit_options: options.normalized(),
            ..Self::new(seed.title, seed.lattice_type, seed.cell, seed.atoms)
        }
    }

    // --------------- ACCESSORS ---------------

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lattice_type(&self) -> LatticeType {
        self.lattice_type
    }

    pub fn calc_mode(&self) -> CalcMode {
        self.calc_mode
    }

    pub fn cell(&self) -> &CellParameters {
        &self.cell
    }

    pub fn multiples(&self) -> &CellMultiples {
        &self.multiples
    }

    /// Every atom of the (unreplicated) cell.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Equivalence group id of every atom.
    pub fn equivalent_atoms(&self) -> &[usize] {
        &self.groups
    }

    pub fn operations(&self) -> &[SymmetryOperation] {
        &self.operations
    }

    /// Whether `encode` writes the symmetry block.
    pub fn writes_symmetry(&self) -> bool {
        self.write_symmetry && !self.operations.is_empty()
    }

    pub fn space_group(&self) -> Option<&SpaceGroup> {
        self.space_group.as_ref()
    }

    pub fn orbit_options(&self) -> &OrbitOptions {
        &self.orbit_options
    }

    /// Depth below 1 is raised to 1.
    pub fn set_orbit_options(&mut self, options: OrbitOptions) {
        self.orbit_options = options.normalized();
    }

    /// Atom indices of each equivalence group, groups in order of first
    /// appearance.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut ids: Vec<usize> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (index, &id) in self.groups.iter().enumerate() {
            match ids.iter().position(|&g| g == id) {
                Some(slot) => members[slot].push(index),
                None => {
                    ids.push(id);
                    members.push(vec![index]);
                }
            }
        }
        members
    }

    /// First atom of every equivalence group.
    pub fn unique_atoms(&self) -> Vec<&Atom> {
        self.groups()
            .iter()
            .map(|members| &self.atoms[members[0]])
            .collect()
    }

    pub fn non_equivalent_count(&self) -> usize {
        self.groups().len()
    }

    pub fn summary(&self) -> StructureSummary<'_> {
        StructureSummary {
            title: &self.title,
            lattice_type: self.lattice_type,
            calc_mode: self.calc_mode,
            cell: self.cell,
            multiples: self.multiples.as_array(),
            atom_count: self.atoms.len(),
            non_equivalent: self.non_equivalent_count(),
            operation_count: self.operations.len(),
            space_group: self.space_group.as_ref().map(|sg| (sg.symbol.as_str(), sg.number)),
            unique_atoms: self.unique_atoms(),
        }
    }

    pub fn tweak_log(&self) -> &[String] {
        &self.tweak_log
    }

    pub fn log_text(&self) -> String {
        self.tweak_log.join("\n")
    }

    // --------------- TWEAKING ---------------

    fn record(&mut self, message: String) {
        debug!("{}", message);
        self.tweak_log.push(message);
    }

    pub fn tweak_lattice_type(&mut self, symbol: &str) -> Result<(), StructureError> {
        let new_type: LatticeType = symbol.parse().map_err(|e| {
            warn!("LATTICE TYPE : FAILED : {} -X-> {}", self.lattice_type, symbol);
            e
        })?;

        let old_type = std::mem::replace(&mut self.lattice_type, new_type);
        self.record(format!("LATTICE TYPE : {} -> {}", old_type, new_type));
        Ok(())
    }

    pub fn tweak_calc_mode(&mut self, label: &str) {
        let new_mode = CalcMode::parse_lenient(label);
        let old_mode = std::mem::replace(&mut self.calc_mode, new_mode);
        self.record(format!("CALC MODE : {} -> {}", old_mode, new_mode));
    }

    /// Changes cell lengths (bohr) and angles (degrees).
    pub fn tweak_dimensions(&mut self, tweak: CellTweak) -> Result<(), StructureError> {
        let mut cell = self.cell;
        let mut messages = Vec::new();

        for (name, new, slot) in [
            ("a", tweak.a, &mut cell.a),
            ("b", tweak.b, &mut cell.b),
            ("c", tweak.c, &mut cell.c),
            ("alpha", tweak.alpha, &mut cell.alpha),
            ("beta", tweak.beta, &mut cell.beta),
            ("gamma", tweak.gamma, &mut cell.gamma),
        ] {
            if let Some(value) = new {
                messages.push(format!("Cell dimension: {} : {} -> {}", name, slot, value));
                *slot = value;
            }
        }
        if messages.is_empty() {
            return Ok(());
        }

        if let Err(e) = cell.validate() {
            warn!("Cell dimension: FAILED : {}", e);
            return Err(e);
        }

        self.cell = cell;
        for message in messages {
            self.record(message);
        }
        self.reset_symmetry();
        Ok(())
    }

    /// Changes one atom. Rotation, mesh, radii and split code are shared by
    /// the whole equivalence group and are applied to every member.
    /// Position, element and magnetization changes drop the current
    /// symmetry.
    pub fn tweak_atom(&mut self, index: usize, tweak: AtomTweak) -> Result<(), StructureError> {
        if index >= self.atoms.len() {
            warn!("Atom {}: FAILED : INVALID INDEX", index);
            return Err(StructureError::IndexOutOfRange {
                index,
                len: self.atoms.len(),
            });
        }

        if let Err(e) = validate_atom_tweak(&tweak) {
            warn!("Atom {}: FAILED : {}", index, e);
            return Err(e);
        }
        if tweak.is_empty() {
            return Ok(());
        }

        // Everything is valid from here on.
        let group_id = self.groups[index];
        let members: Vec<usize> = (0..self.atoms.len())
            .filter(|&i| self.groups[i] == group_id)
            .collect();
        let old = self.atoms[index].clone();
        let mut messages = Vec::new();

        for (axis, (name, value)) in [("x", tweak.x), ("y", tweak.y), ("z", tweak.z)]
            .into_iter()
            .enumerate()
        {
            if let Some(value) = value {
                let atom = &mut self.atoms[index];
                atom.set_position_component(axis, value);
                messages.push(format!(
                    "Atom {}: {} : {} -> {}",
                    index,
                    name,
                    old.position()[axis],
                    atom.position()[axis]
                ));
            }
        }

        if let Some(z) = tweak.atomic_number {
            let atom = &mut self.atoms[index];
            atom.set_atomic_number(z);
            messages.push(format!("Atom {}: Z : {} -> {}", index, old.atomic_number(), z));
            messages.push(format!(
                "Atom {}: Symbol : {} -> {}",
                index,
                old.symbol(),
                atom.symbol()
            ));
        }

        if let Some(m) = tweak.magnetization {
            self.atoms[index].set_magnetization(m);
            messages.push(format!(
                "Atom {}: magnetization : {:?} -> {:?}",
                index,
                old.magnetization(),
                m
            ));
        }

        if let Some(rotation) = tweak.rotation {
            for &i in &members {
                self.atoms[i].set_rotation(rotation);
            }
            messages.push(format!(
                "Atom {}: ROT MATRIX : {:?} -> {:?}",
                index,
                old.rotation(),
                rotation
            ));
        }
        if let Some(npt) = tweak.npt {
            for &i in &members {
                self.atoms[i].set_npt(npt);
            }
            messages.push(format!("Atom {}: NPT : {} -> {}", index, old.npt(), npt));
        }
        if let Some(r0) = tweak.r0 {
            for &i in &members {
                self.atoms[i].set_r0(r0);
            }
            messages.push(format!("Atom {}: R0 : {} -> {}", index, old.r0(), r0));
        }
        if let Some(rmt) = tweak.rmt {
            for &i in &members {
                self.atoms[i].set_rmt(rmt);
            }
            messages.push(format!("Atom {}: RMT : {} -> {}", index, old.rmt(), rmt));
        }
        if let Some(isplit) = tweak.isplit {
            for &i in &members {
                self.atoms[i].set_isplit(isplit);
            }
            messages.push(format!(
                "Atom {}: ISPLIT : {} -> {}",
                index,
                old.isplit(),
                isplit
            ));
        }

        for message in messages {
            self.record(message);
        }
        if tweak.moves_site() {
            self.reset_symmetry();
        }
        Ok(())
    }

    /// Sets the supercell factors. Values below 1 are raised to 1.
    pub fn tweak_cell_multiples(&mut self, a: i64, b: i64, c: i64) {
        let new = CellMultiples::new(a, b, c);
        let old = std::mem::replace(&mut self.multiples, new);
        self.record(format!(
            "Cell multiples: ({},{},{}) -> ({},{},{})",
            old.a(),
            old.b(),
            old.c(),
            new.a(),
            new.b(),
            new.c()
        ));
    }

    // --------------- SYMMETRY ---------------

    /// Installs the result of a symmetry analysis.
    pub fn apply_symmetry(&mut self, analysis: SymmetryAnalysis) -> Result<(), StructureError> {
        if analysis.equivalent_atoms.len() != self.atoms.len() {
            return Err(StructureError::SymmetryMismatch {
                expected: self.atoms.len(),
                actual: analysis.equivalent_atoms.len(),
            });
        }

        self.groups = analysis.equivalent_atoms;
        self.write_symmetry = !analysis.operations.is_empty();
        self.operations = analysis.operations;
        self.space_group = Some(SpaceGroup {
            symbol: analysis.spacegroup_symbol,
            number: analysis.spacegroup_number,
        });

        let message = format!(
            "Update symmetry : {} {} : NONEQUIV {}",
            self.space_group.as_ref().map_or("", |sg| sg.symbol.as_str()),
            analysis.spacegroup_number,
            self.non_equivalent_count()
        );
        self.record(message);
        Ok(())
    }

    /// Runs `analyzer` and installs its result. When the analyzer fails the
    /// structure falls back to one group per atom without symmetry.
    pub fn analyze_symmetry(
        &mut self,
        analyzer: &dyn SymmetryAnalyzer,
    ) -> Result<(), StructureError> {
        match analyzer.analyze(self) {
            Ok(analysis) => self.apply_symmetry(analysis),
            Err(e) => {
                warn!("Error determining symmetry: {}", e);
                self.fall_back();
                self.record("Update symmetry : ERROR".to_string());
                Ok(())
            }
        }
    }

    fn fall_back(&mut self) {
        self.groups = (0..self.atoms.len()).collect();
        self.operations.clear();
        self.write_symmetry = false;
        self.space_group = None;
    }

    /// Drops symmetry that a geometry change may have broken.
    fn reset_symmetry(&mut self) {
        let trivial = self.operations.is_empty()
            && self.space_group.is_none()
            && self.groups.iter().enumerate().all(|(i, &g)| g == i);
        if trivial {
            return;
        }
        self.fall_back();
        self.record("Update symmetry : RESET".to_string());
    }
}

fn validate_atom_tweak(tweak: &AtomTweak) -> Result<(), StructureError> {
    for (name, value) in [("x", tweak.x), ("y", tweak.y), ("z", tweak.z)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(StructureError::InvalidCellParameter { name, value: v });
            }
        }
    }
    if let Some(z) = tweak.atomic_number {
        atom::validate_atomic_number(z)?;
    }
    if let Some(npt) = tweak.npt {
        atom::validate_mesh(npt)?;
    }
    if let Some(r0) = tweak.r0 {
        atom::validate_radius("R0", r0)?;
    }
    if let Some(rmt) = tweak.rmt {
        atom::validate_radius("RMT", rmt)?;
    }
    if let Some(isplit) = tweak.isplit {
        atom::validate_split(isplit)?;
    }
    Ok(())
}
