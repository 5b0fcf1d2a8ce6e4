//! Fixed-width record codec.
//!
//! A record format is described by a comma separated list of Fortran-style
//! edit descriptors (`A80`, `4X`, `3F10.7`, ...). The description is compiled
//! once into a [`FormatSpec`]; the same spec then drives both the
//! [`encoder`] and the [`decoder`].

pub mod decoder;
pub mod encoder;
pub mod spec;
pub mod value;

pub use decoder::LineDecoder;
pub use encoder::encode_line;
pub use spec::{FieldKind, FormatField, FormatSpec, FormatToken};
pub use value::Value;

use crate::error::{DecodeError, EncodeError, FormatCompileError};

/// A compiled record format: the field list plus its decode pattern.
#[derive(Debug, Clone)]
pub struct RecordFormat {
    spec: FormatSpec,
    decoder: LineDecoder,
}

impl RecordFormat {
    pub fn compile(description: &str) -> Result<Self, FormatCompileError> {
        let spec = FormatSpec::compile(description)?;
        let decoder = LineDecoder::new(&spec)?;
        Ok(Self { spec, decoder })
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// Renders one line, including the trailing `\n`.
    pub fn encode(&self, values: &[Value]) -> Result<String, EncodeError> {
        encode_line(&self.spec, values)
    }

    pub fn decode(&self, line: &str) -> Result<Vec<Value>, DecodeError> {
        self.decoder.decode(line)
    }
}
