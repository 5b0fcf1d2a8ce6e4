//src/model/mod.rs
pub mod atom;
pub mod elements;
pub mod lattice;
pub mod structure_file;
pub mod symmetry;

// Re-exports for cleaner imports
pub use atom::{Atom, AtomDefaults};
pub use lattice::{CalcMode, CellParameters, LatticeType};
pub use structure_file::{AtomTweak, CellTweak, StructureFile, StructureProvider, StructureSeed};
pub use symmetry::SymmetryOperation;
