//! Parses fixed-width lines back into values.
//!
//! The field list is turned into one anchored regular expression: padding
//! runs match any characters, text fields capture up to their width, numeric
//! fields capture exactly their width from a restricted character class.

use regex::Regex;

use crate::error::{DecodeError, FormatCompileError};
use crate::format::spec::{FieldKind, FormatSpec};
use crate::format::value::Value;

#[derive(Debug, Clone)]
pub struct LineDecoder {
    description: String,
    kinds: Vec<FieldKind>,
    pattern: Regex,
}

impl LineDecoder {
    pub fn new(spec: &FormatSpec) -> Result<Self, FormatCompileError> {
        let pattern = Regex::new(&build_pattern(spec))
            .map_err(|e| FormatCompileError::Pattern(e.to_string()))?;
        let kinds = spec
            .fields()
            .iter()
            .map(|f| f.kind)
            .filter(FieldKind::consumes_value)
            .collect();

        Ok(Self {
            description: spec.to_string(),
            kinds,
            pattern,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Decodes one line. A trailing line terminator is ignored, and so is
    /// anything after the last field.
    pub fn decode(&self, line: &str) -> Result<Vec<Value>, DecodeError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let captures = self
            .pattern
            .captures(line)
            .ok_or_else(|| DecodeError::PatternMismatch {
                format: self.description.clone(),
                line: line.to_string(),
            })?;

        let mut values = Vec::with_capacity(self.kinds.len());
        for (index, kind) in self.kinds.iter().enumerate() {
            let text = captures
                .get(index + 1)
                .map_or("", |m| m.as_str())
                .trim();

            let value = match kind {
                FieldKind::Text => Value::Text(text.to_string()),
                FieldKind::Integer => {
                    Value::Int(text.parse().map_err(|_| DecodeError::InvalidInteger {
                        index,
                        text: text.to_string(),
                    })?)
                }
                FieldKind::Float => {
                    Value::Float(text.parse().map_err(|_| DecodeError::InvalidFloat {
                        index,
                        text: text.to_string(),
                    })?)
                }
                FieldKind::Pad => continue,
            };
            values.push(value);
        }

        Ok(values)
    }
}

/// Builds the anchored pattern for a spec.
pub fn build_pattern(spec: &FormatSpec) -> String {
    let mut pattern = String::from("^");
    let mut pad_run = 0usize;

    for field in spec.fields() {
        if field.kind == FieldKind::Pad {
            pad_run += field.width;
            continue;
        }
        if pad_run > 0 {
            pattern.push_str(&format!(".{{{}}}", pad_run));
            pad_run = 0;
        }
        match field.kind {
            FieldKind::Text => pattern.push_str(&format!("(.{{0,{}}})", field.width)),
            FieldKind::Integer => pattern.push_str(&format!(r"([-0-9\s]{{{}}})", field.width)),
            FieldKind::Float => pattern.push_str(&format!(r"([-0-9.\s]{{{}}})", field.width)),
            FieldKind::Pad => {}
        }
    }
    if pad_run > 0 {
        pattern.push_str(&format!(".{{{}}}", pad_run));
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::encode_line;

    fn decoder(description: &str) -> LineDecoder {
        LineDecoder::new(&FormatSpec::compile(description).unwrap()).unwrap()
    }

    #[test]
    fn test_pattern_shape() {
        assert_eq!(
            decoder("4X,I4,3X,F10.8").pattern(),
            r"^.{4}([-0-9\s]{4}).{3}([-0-9.\s]{10})"
        );
        assert_eq!(decoder("A80").pattern(), "^(.{0,80})");
    }

    #[test]
    fn test_decodes_labelled_columns() {
        // Columns covered by padding may hold labels
        let lattice = decoder("A4,23X,I3");
        assert_eq!(
            lattice.decode("F   LATTICE,NONEQUIV.ATOMS:  2 225 Fm-3m").unwrap(),
            vec![Value::Text("F".into()), Value::Int(2)]
        );

        let mode = decoder("13X,A4");
        assert_eq!(
            mode.decode("MODE OF CALC=RELA unit=bohr\r\n").unwrap(),
            vec![Value::Text("RELA".into())]
        );

        let position = decoder("4X,I4,4X,F10.8,3X,F10.8,3X,F10.8");
        assert_eq!(
            position
                .decode("ATOM  -1: X=0.00000000 Y=0.50000000 Z=0.25000000")
                .unwrap(),
            vec![
                Value::Int(-1),
                Value::Float(0.0),
                Value::Float(0.5),
                Value::Float(0.25)
            ]
        );
    }

    #[test]
    fn test_short_text_field() {
        let title = decoder("A80");
        assert_eq!(
            title.decode("bcc Fe\n").unwrap(),
            vec![Value::Text("bcc Fe".into())]
        );
    }

    #[test]
    fn test_round_trip_through_encoder() {
        let spec = FormatSpec::compile("A10,5X,I5,5X,F10.8,5X,F10.5,5X,F10.5").unwrap();
        let values = vec![
            Value::Text("Cr".into()),
            Value::Int(781),
            Value::Float(0.00005),
            Value::Float(2.25),
            Value::Float(24.0),
        ];
        let line = encode_line(&spec, &values).unwrap();
        let decoded = LineDecoder::new(&spec).unwrap().decode(&line).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let err = decoder("I4,F10.8").decode("   1  0.5").unwrap_err();
        assert!(matches!(err, DecodeError::PatternMismatch { .. }));
    }

    #[test]
    fn test_non_numeric_content_is_rejected() {
        let err = decoder("I4").decode("  a1").unwrap_err();
        assert!(matches!(err, DecodeError::PatternMismatch { .. }));
    }

    #[test]
    fn test_blank_numeric_field_is_an_error() {
        assert_eq!(
            decoder("I4").decode("    "),
            Err(DecodeError::InvalidInteger {
                index: 0,
                text: String::new()
            })
        );
        assert_eq!(
            decoder("F6.2").decode(" 1.2.3"),
            Err(DecodeError::InvalidFloat {
                index: 0,
                text: "1.2.3".into()
            })
        );
    }
}
