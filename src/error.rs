//! Error types for record compilation, encoding/decoding, structure tweaks
//! and file I/O.

use thiserror::Error;

use crate::format::FieldKind;

/// Error while compiling a format description such as `"4X,I4,F10.8"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatCompileError {
    #[error("empty field token at position {index}")]
    EmptyToken { index: usize },

    #[error("unknown field kind in token {token:?} (expected one of A, I, F, X)")]
    UnknownKind { token: String },

    #[error("malformed number in token {token:?}")]
    MalformedToken { token: String },

    #[error("repeat count of token {token:?} must be at least 1")]
    ZeroRepeat { token: String },

    #[error("field {token:?} needs a non-zero width")]
    MissingWidth { token: String },

    #[error("padding token {token:?} takes no width")]
    PaddingWidth { token: String },

    #[error("precision is only valid on float fields: {token:?}")]
    UnexpectedPrecision { token: String },

    #[error("float field {token:?}: precision {precision} does not fit in width {width}")]
    PrecisionExceedsWidth {
        token: String,
        width: usize,
        precision: usize,
    },

    #[error("could not build decode pattern: {0}")]
    Pattern(String),
}

/// Error while rendering values into a fixed-width line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("format consumes {expected} values but {actual} were supplied")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("value {index} is {found}, which a {expected:?} field does not accept")]
    TypeMismatch {
        index: usize,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("value {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("value {index} renders as {rendered:?}, wider than its {width}-column field")]
    FloatOverflow {
        index: usize,
        width: usize,
        rendered: String,
    },
}

/// Error while reading a fixed-width line or a whole document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("line {line:?} does not match record format {format:?}")]
    PatternMismatch { format: String, line: String },

    #[error("field {index}: {text:?} is not an integer")]
    InvalidInteger { index: usize, text: String },

    #[error("field {index}: {text:?} is not a number")]
    InvalidFloat { index: usize, text: String },

    #[error("unexpected end of document while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unexpected value layout while reading {context}")]
    UnexpectedValue { context: &'static str },
}

/// Error raised by the structure aggregate. A failed call leaves the
/// structure exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    #[error("invalid lattice type {0:?} (expected P, F, B, CXY, CYZ, CXZ, R or H)")]
    InvalidLatticeType(String),

    #[error("NPT must be odd, got {0}")]
    InvalidMeshSize(u32),

    #[error("invalid ISPLIT option {0} (expected 0-8, -2, 88 or 99)")]
    InvalidSplitCode(i32),

    #[error("atom index {index} out of range (structure has {len} atoms)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cell parameter {name} = {value} is out of range")]
    InvalidCellParameter { name: &'static str, value: f64 },

    #[error("{name} = {value} must be a positive finite radius")]
    InvalidRadius { name: &'static str, value: f64 },

    #[error("no element with atomic number {0}")]
    InvalidAtomicNumber(u32),

    #[error("unknown element symbol {0:?}")]
    UnknownElement(String),

    #[error("symmetry analysis returned {actual} group ids for {expected} atoms")]
    SymmetryMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Error reported by a symmetry analyzer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymmetryError {
    #[error("lattice is singular")]
    SingularLattice,

    #[error("structure has no atoms")]
    EmptyStructure,

    #[error("symmetry search failed: {0}")]
    AnalysisFailed(String),
}

/// Error while loading or saving structure files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("POSCAR line {line}: {message}")]
    Poscar { line: usize, message: String },

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<DecodeError> for FileError {
    fn from(err: DecodeError) -> Self {
        FileError::Structure(StructureError::Decode(err))
    }
}
