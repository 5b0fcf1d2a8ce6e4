use log::{debug, warn};
use moyo::base::{
    AngleTolerance, Cell, Lattice, MagneticCell, NonCollinear, RotationMagneticMomentAction,
};
use moyo::data::{get_magnetic_space_group_type, Setting};
use moyo::{MoyoDataset, MoyoMagneticDataset};
use nalgebra::Vector3;

use crate::error::SymmetryError;
use crate::model::structure_file::StructureFile;
use crate::model::symmetry::SymmetryOperation;
use crate::utils::linalg;

// --- Structs for Analysis Results ---

/// What a symmetry search reports about a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryAnalysis {
    /// One entry per atom; atoms with equal entries are equivalent.
    pub equivalent_atoms: Vec<usize>,
    pub spacegroup_symbol: String,
    pub spacegroup_number: u32,
    pub operations: Vec<SymmetryOperation>,
}

impl SymmetryAnalysis {
    pub fn crystal_system(&self) -> &'static str {
        crystal_system(self.spacegroup_number)
    }
}

/// External symmetry discovery.
pub trait SymmetryAnalyzer {
    fn analyze(&self, structure: &StructureFile) -> Result<SymmetryAnalysis, SymmetryError>;
}

/// Symmetry search backed by `moyo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoyoAnalyzer {
    pub symprec: f64,
}

impl Default for MoyoAnalyzer {
    fn default() -> Self {
        Self { symprec: 1e-4 }
    }
}

impl MoyoAnalyzer {
    pub fn new(symprec: f64) -> Self {
        Self { symprec }
    }
}

impl SymmetryAnalyzer for MoyoAnalyzer {
    fn analyze(&self, structure: &StructureFile) -> Result<SymmetryAnalysis, SymmetryError> {
        let atoms = structure.atoms();
        if atoms.is_empty() {
            return Err(SymmetryError::EmptyStructure);
        }

        let lattice_mat = linalg::row_matrix(structure.cell().lattice_vectors());
        if lattice_mat.determinant().abs() < 1e-12 {
            return Err(SymmetryError::SingularLattice);
        }
        if !structure.lattice_type().centering_translations().is_empty() {
            warn!(
                "Symmetry search on a {} lattice only sees the listed sites",
                structure.lattice_type()
            );
        }

        let positions: Vec<Vector3<f64>> =
            atoms.iter().map(|a| Vector3::from(a.position())).collect();
        let numbers: Vec<i32> = atoms.iter().map(|a| a.atomic_number() as i32).collect();
        let lattice = Lattice::new(lattice_mat);

        if atoms.iter().any(|a| a.magnetization() != [0.0; 3]) {
            let moments = atoms
                .iter()
                .map(|a| NonCollinear(Vector3::from(a.magnetization())))
                .collect();
            return self.analyze_magnetic(
                structure,
                MagneticCell::new(lattice, positions, numbers, moments),
            );
        }

        let cell = Cell::new(lattice, positions, numbers);
        let dataset = MoyoDataset::new(
            &cell,
            self.symprec,
            AngleTolerance::Default,
            Setting::Spglib,
            true,
        )
        .map_err(|e| SymmetryError::AnalysisFailed(format!("{:?}", e)))?;

        let number = u32::try_from(dataset.number).unwrap_or(0);
        let operations: Vec<SymmetryOperation> = dataset
            .operations
            .iter()
            .map(|op| SymmetryOperation::new(op.rotation.map(f64::from), op.translation))
            .collect();

        debug!(
            "moyo: space group {} with {} operations",
            number,
            operations.len()
        );

        Ok(SymmetryAnalysis {
            equivalent_atoms: dataset.orbits.clone(),
            spacegroup_symbol: spacegroup_symbol(number).to_string(),
            spacegroup_number: number,
            operations,
        })
    }
}

impl MoyoAnalyzer {
    /// Magnetic search. Moments follow `m' = R·m` like the orbit expander,
    /// and only operations without time reversal are kept, so sites with
    /// opposite moments stay in separate groups.
    fn analyze_magnetic(
        &self,
        structure: &StructureFile,
        cell: MagneticCell<NonCollinear>,
    ) -> Result<SymmetryAnalysis, SymmetryError> {
        let dataset = MoyoMagneticDataset::new(
            &cell,
            self.symprec,
            AngleTolerance::Default,
            None,
            RotationMagneticMomentAction::Polar,
            true,
        )
        .map_err(|e| SymmetryError::AnalysisFailed(format!("{:?}", e)))?;

        let operations: Vec<SymmetryOperation> = dataset
            .magnetic_operations
            .iter()
            .filter(|op| !op.time_reversal)
            .map(|op| {
                SymmetryOperation::new(
                    op.operation.rotation.map(f64::from),
                    op.operation.translation,
                )
            })
            .collect();

        let number = get_magnetic_space_group_type(dataset.uni_number)
            .and_then(|t| u32::try_from(t.number).ok())
            .unwrap_or(0);
        let cell_params = structure.cell();
        let min_length = cell_params.a.min(cell_params.b).min(cell_params.c);
        let tolerance = (self.symprec / min_length).max(1e-8);
        let equivalent_atoms = equivalent_sites(structure, &operations, tolerance);

        debug!(
            "moyo: magnetic UNI {}, {} of {} operations without time reversal",
            dataset.uni_number,
            operations.len(),
            dataset.magnetic_operations.len()
        );

        Ok(SymmetryAnalysis {
            equivalent_atoms,
            spacegroup_symbol: spacegroup_symbol(number).to_string(),
            spacegroup_number: number,
            operations,
        })
    }
}

/// Group id (lowest member index) of every atom under `operations`. Two
/// atoms are equivalent when an operation maps one onto the other with the
/// same element and moment.
fn equivalent_sites(
    structure: &StructureFile,
    operations: &[SymmetryOperation],
    tolerance: f64,
) -> Vec<usize> {
    let atoms = structure.atoms();
    let mut parent: Vec<usize> = (0..atoms.len()).collect();

    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let same_site = |a: [f64; 3], b: [f64; 3]| {
        (0..3).all(|k| {
            let d = a[k] - b[k];
            (d - d.round()).abs() < tolerance
        })
    };
    let same_moment =
        |a: [f64; 3], b: [f64; 3]| (0..3).all(|k| (a[k] - b[k]).abs() < 1e-3 * (1.0 + b[k].abs()));

    for (i, atom) in atoms.iter().enumerate() {
        for op in operations {
            let (p, m) = op.apply(atom.position(), atom.magnetization());
            let image = atoms.iter().position(|other| {
                other.atomic_number() == atom.atomic_number()
                    && same_site(p, other.position())
                    && same_moment(m, other.magnetization())
            });
            if let Some(j) = image {
                let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                // keep the lowest index as representative
                parent[ri.max(rj)] = ri.min(rj);
            }
        }
    }

    (0..atoms.len()).map(|i| root(&mut parent, i)).collect()
}

pub fn crystal_system(number: u32) -> &'static str {
    match number {
        1..=2 => "Triclinic",
        3..=15 => "Monoclinic",
        16..=74 => "Orthorhombic",
        75..=142 => "Tetragonal",
        143..=167 => "Trigonal",
        168..=194 => "Hexagonal",
        195..=230 => "Cubic",
        _ => "Unknown",
    }
}

/// Hermann-Mauguin symbol of an ITA space group number.
pub fn spacegroup_symbol(number: u32) -> &'static str {
    match number {
        1..=230 => SG_SYMBOLS[number as usize],
        _ => "Unknown",
    }
}

// =========================================================================
// DATA: Space Group Symbols
// =========================================================================
const SG_SYMBOLS: [&str; 231] = ["","P1", "P-1", "P121", "P12_11", "C121", "P1m1", "P1c1", "C1m1", "C1c1", "P12/m1", "P12_1/m1", "C12/m1", "P12/c1", "P12_1/c1", "C12/c1", "P222", "P222_1", "P2_12_12", "P2_12_12_1", "C222_1", "C222", "F222", "I222", "I2_12_12_1", "Pmm2", "Pmc2_1", "Pcc2", "Pma2", "Pca2_1", "Pnc2", "Pmn2_1", "Pba2", "Pna2_1", "Pnn2", "Cmm2", "Cmc2_1", "Ccc2", "Amm2", "Aem2", "Ama2", "Aea2", "Fmm2", "Fdd2", "Imm2", "Iba2", "Ima2", "Pmmm", "Pnnn", "Pccm", "Pban", "Pmma", "Pnna", "Pmna", "Pcca", "Pbam", "Pccn", "Pbcm", "Pnnm", "Pmmn", "Pbcn", "Pbca", "Pnma", "Cmcm", "Cmce", "Cmmm", "Cccm", "Cmme", "Ccce", "Fmmm", "Fddd", "Immm", "Ibam", "Ibca", "Imma", "P4", "P4_1", "P4_2", "P4_3", "I4", "I4_1", "P-4", "I-4", "P4/m", "P4_2/m", "P4/n", "P4_2/n", "I4/m", "I4_1/a", "P422", "P42_12", "P4_122", "P4_12_12", "P4_222", "P4_22_12", "P4_322", "P4_32_12", "I422", "I4_122", "P4mm", "P4bm", "P4_2cm", "P4_2nm", "P4cc", "P4nc", "P4_2mc", "P4_2bc", "I4mm", "I4cm", "I4_1md", "I4_1cd", "P-42m", "P-42c", "P-42_1m", "P-42_1c", "P-4m2", "P-4c2", "P-4b2", "P-4n2", "I-4m2", "I-4c2", "I-42m", "I-42d", "P4/mmm", "P4/mcc", "P4/nbm", "P4/nnc", "P4/mbm", "P4/mnc", "P4/nmm", "P4/ncc", "P4_2/mmc", "P4_2/mcm", "P4_2/nbc", "P4_2/nnm", "P4_2/mbc", "P4_2/mnm", "P4_2/nmc", "P4_2/ncm", "I4/mmm", "I4/mcm", "I4_1/amd", "I4_1/acd", "P3", "P3_1", "P3_2", "R3", "P-3", "R-3", "P312", "P321", "P3_112", "P3_121", "P3_212", "P3_221", "R32", "P3m1", "P31m", "P3c1", "P31c", "R3m", "R3c", "P-31m", "P-31c", "P-3m1", "P-3c1", "R-3m", "R-3c", "P6", "P6_1", "P6_5", "P6_2", "P6_4", "P6_3", "P-6", "P6/m", "P6_3/m", "P622", "P6_122", "P6_522", "P6_222", "P6_422", "P6_322", "P6mm", "P6cc", "P6_3cm", "P6_3mc", "P-6m2", "P-6c2", "P-62m", "P-62c", "P6/mmm", "P6/mcc", "P6_3/mcm", "P6_3/mmc", "P23", "F23", "I23", "P2_13", "I2_13", "Pm-3", "Pn-3", "Fm-3", "Fd-3", "Im-3", "Pa-3", "Ia-3", "P432", "P4_232", "F432", "F4_132", "I432", "P4_332", "P4_132", "I4_132", "P-43m", "F-43m", "I-43m", "P-43n", "F-43c", "I-43d", "Pm-3m", "Pn-3n", "Pm-3n", "Pn-3m", "Fm-3m", "Fm-3c", "Fd-3m", "Fd-3c", "Im-3m", "Ia-3d"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::lattice::{CellParameters, LatticeType};

    #[test]
    fn test_symbol_table() {
        assert_eq!(spacegroup_symbol(1), "P1");
        assert_eq!(spacegroup_symbol(221), "Pm-3m");
        assert_eq!(spacegroup_symbol(225), "Fm-3m");
        assert_eq!(spacegroup_symbol(229), "Im-3m");
        assert_eq!(spacegroup_symbol(230), "Ia-3d");
        assert_eq!(spacegroup_symbol(0), "Unknown");
        assert_eq!(crystal_system(194), "Hexagonal");
    }

    #[test]
    fn test_cscl_analysis() {
        let atoms = vec![
            Atom::new([0.0, 0.0, 0.0], 55).unwrap(),
            Atom::new([0.5, 0.5, 0.5], 17).unwrap(),
        ];
        let structure = StructureFile::new(
            "CsCl",
            LatticeType::P,
            CellParameters::cubic(7.78).unwrap(),
            atoms,
        );

        let analysis = MoyoAnalyzer::default().analyze(&structure).unwrap();
        assert_eq!(analysis.spacegroup_number, 221);
        assert_eq!(analysis.spacegroup_symbol, "Pm-3m");
        assert_eq!(analysis.operations.len(), 48);
        assert_eq!(analysis.equivalent_atoms, vec![0, 1]);
    }

    fn magnetic_bcc(up: [f64; 3], down: [f64; 3]) -> StructureFile {
        let atoms = vec![
            Atom::new([0.0, 0.0, 0.0], 26).unwrap().with_magnetization(up),
            Atom::new([0.5, 0.5, 0.5], 26).unwrap().with_magnetization(down),
        ];
        StructureFile::new("bcc Fe", LatticeType::P, CellParameters::cubic(5.42).unwrap(), atoms)
    }

    #[test]
    fn test_antiparallel_moments_stay_inequivalent() {
        let structure = magnetic_bcc([0.0, 0.0, 1.0], [0.0, 0.0, -1.0]);
        let analysis = MoyoAnalyzer::default().analyze(&structure).unwrap();

        assert_eq!(analysis.equivalent_atoms, vec![0, 1]);
        assert!(analysis.operations.contains(&SymmetryOperation::identity()));
        // every kept operation maps each site onto itself with its own moment
        for op in &analysis.operations {
            for atom in structure.atoms() {
                let (p, m) = op.apply(atom.position(), atom.magnetization());
                let back = atom.moved_to(p, m);
                assert!(structure.atoms().iter().any(|a| {
                    (0..3).all(|k| {
                        let d = a.position()[k] - back.position()[k];
                        (d - d.round()).abs() < 1e-6
                            && (a.magnetization()[k] - back.magnetization()[k]).abs() < 1e-6
                    })
                }));
            }
        }
    }

    #[test]
    fn test_parallel_moments_share_a_group() {
        let structure = magnetic_bcc([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]);
        let analysis = MoyoAnalyzer::default().analyze(&structure).unwrap();
        assert_eq!(analysis.equivalent_atoms, vec![0, 0]);
    }

    #[test]
    fn test_antiferromagnet_encodes_two_groups() {
        let mut structure = magnetic_bcc([0.0, 0.0, 1.0], [0.0, 0.0, -1.0]);
        structure.analyze_symmetry(&MoyoAnalyzer::default()).unwrap();

        assert_eq!(structure.non_equivalent_count(), 2);
        let text = structure.encode().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "P                            2");
        assert_eq!(text.matches("\n                1                  8\n").count(), 2);
    }

    #[test]
    fn test_empty_structure() {
        let structure = StructureFile::new(
            "empty",
            LatticeType::P,
            CellParameters::cubic(5.0).unwrap(),
            Vec::new(),
        );
        assert_eq!(
            MoyoAnalyzer::default().analyze(&structure),
            Err(SymmetryError::EmptyStructure)
        );
    }
}
