//! Reading, editing and writing WIEN2k `case.struct` documents.
//!
//! The crate is built from three layers:
//!
//! - [`format`]: Fortran-style fixed-width records (`"4X,I4,F10.8"`), with a
//!   line encoder and a regex-based line decoder.
//! - [`model`] and [`physics`]: the structure aggregate, symmetry operations,
//!   orbit expansion, supercells and the `moyo` symmetry search.
//! - [`io`]: the `.struct` document codec and POSCAR import/export.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod model;
pub mod physics;
pub mod utils;

pub use config::Config;
pub use error::{DecodeError, EncodeError, FileError, FormatCompileError, StructureError, SymmetryError};
pub use format::{RecordFormat, Value};
pub use model::{Atom, AtomTweak, CellTweak, LatticeType, StructureFile};
pub use physics::analysis::{MoyoAnalyzer, SymmetryAnalysis, SymmetryAnalyzer};
pub use physics::orbit::OrbitOptions;
