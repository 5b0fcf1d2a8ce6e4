//! Renders values into one fixed-width line.

use crate::error::EncodeError;
use crate::format::spec::{FieldKind, FormatField, FormatSpec};
use crate::format::value::Value;

/// Encodes `values` (one per non-padding field, in field order) into a line
/// of exactly `spec.width()` columns followed by `\n`.
///
/// Integers wider than their field keep only their rightmost digits, the
/// way fixed-column writers have always laid them out. Floats that do not
/// fit are rejected instead.
pub fn encode_line(spec: &FormatSpec, values: &[Value]) -> Result<String, EncodeError> {
    let expected = spec.value_count();
    if values.len() != expected {
        return Err(EncodeError::ValueCountMismatch {
            expected,
            actual: values.len(),
        });
    }

    let mut line = String::with_capacity(spec.width() + 1);
    let mut next_value = values.iter().enumerate();

    for field in spec.fields() {
        if field.kind == FieldKind::Pad {
            line.push(' ');
            continue;
        }
        let (index, value) = next_value.next().ok_or(EncodeError::ValueCountMismatch {
            expected,
            actual: values.len(),
        })?;
        match field.kind {
            FieldKind::Text => push_text(&mut line, field, index, value)?,
            FieldKind::Integer => push_integer(&mut line, field, index, value)?,
            FieldKind::Float => push_float(&mut line, field, index, value)?,
            FieldKind::Pad => unreachable!("padding handled above"),
        }
    }

    line.push('\n');
    Ok(line)
}

fn push_text(
    line: &mut String,
    field: &FormatField,
    index: usize,
    value: &Value,
) -> Result<(), EncodeError> {
    let text = value.as_text().ok_or(EncodeError::TypeMismatch {
        index,
        expected: FieldKind::Text,
        found: value.kind_name(),
    })?;

    let mut used = 0;
    for c in text.chars().take(field.width) {
        line.push(c);
        used += 1;
    }
    line.extend(std::iter::repeat(' ').take(field.width - used));
    Ok(())
}

fn push_integer(
    line: &mut String,
    field: &FormatField,
    index: usize,
    value: &Value,
) -> Result<(), EncodeError> {
    let number = match value {
        Value::Int(i) => *i,
        Value::Float(f) if f.is_finite() => f.trunc() as i64,
        Value::Float(_) => return Err(EncodeError::NonFinite { index }),
        Value::Text(_) => {
            return Err(EncodeError::TypeMismatch {
                index,
                expected: FieldKind::Integer,
                found: value.kind_name(),
            })
        }
    };

    let rendered = number.to_string();
    if rendered.len() > field.width {
        line.push_str(&rendered[rendered.len() - field.width..]);
    } else {
        line.push_str(&format!("{:>width$}", rendered, width = field.width));
    }
    Ok(())
}

fn push_float(
    line: &mut String,
    field: &FormatField,
    index: usize,
    value: &Value,
) -> Result<(), EncodeError> {
    let number = value.as_float().ok_or(EncodeError::TypeMismatch {
        index,
        expected: FieldKind::Float,
        found: value.kind_name(),
    })?;
    if !number.is_finite() {
        return Err(EncodeError::NonFinite { index });
    }

    let mut rendered = format!("{:.prec$}", number, prec = field.precision);
    // "-0.000" is a zero that lost its digits to rounding
    if rendered.starts_with('-') && rendered[1..].bytes().all(|b| b == b'0' || b == b'.') {
        rendered.remove(0);
    }

    if rendered.len() > field.width {
        return Err(EncodeError::FloatOverflow {
            index,
            width: field.width,
            rendered,
        });
    }
    line.push_str(&format!("{:>width$}", rendered, width = field.width));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(description: &str) -> FormatSpec {
        FormatSpec::compile(description).unwrap()
    }

    #[test]
    fn test_text_is_padded_and_truncated() {
        let s = spec("A4,I3");
        assert_eq!(
            encode_line(&s, &[Value::from("P"), Value::Int(2)]).unwrap(),
            "P     2\n"
        );
        assert_eq!(
            encode_line(&s, &[Value::from("CXYZW"), Value::Int(2)]).unwrap(),
            "CXYZ  2\n"
        );
    }

    #[test]
    fn test_integer_overflow_keeps_rightmost_digits() {
        let s = spec("I2");
        assert_eq!(encode_line(&s, &[Value::Int(-123)]).unwrap(), "23\n");
        assert_eq!(encode_line(&s, &[Value::Int(-1)]).unwrap(), "-1\n");
    }

    #[test]
    fn test_integer_field_truncates_floats() {
        let s = spec("I4");
        assert_eq!(encode_line(&s, &[Value::Float(-2.9)]).unwrap(), "  -2\n");
    }

    #[test]
    fn test_float_rendering() {
        let s = spec("F10.5,F16.14");
        let line = encode_line(&s, &[Value::Float(2.4), Value::Float(0.25)]).unwrap();
        assert_eq!(line, "   2.400000.25000000000000\n");

        let s = spec("F10.7");
        assert_eq!(encode_line(&s, &[Value::Int(-1)]).unwrap(), "-1.0000000\n");
    }

    #[test]
    fn test_negative_zero_renders_unsigned() {
        let s = spec("F10.8");
        assert_eq!(encode_line(&s, &[Value::Float(-0.0)]).unwrap(), "0.00000000\n");
        assert_eq!(
            encode_line(&s, &[Value::Float(-1e-12)]).unwrap(),
            "0.00000000\n"
        );
    }

    #[test]
    fn test_float_overflow_is_rejected() {
        let s = spec("F10.6");
        let err = encode_line(&s, &[Value::Float(12345.5)]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::FloatOverflow {
                index: 0,
                width: 10,
                rendered: "12345.500000".to_string()
            }
        );
    }

    #[test]
    fn test_value_count_must_match() {
        let s = spec("4X,I4,F10.8");
        assert_eq!(
            encode_line(&s, &[Value::Int(1)]),
            Err(EncodeError::ValueCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_type_mismatch_and_non_finite() {
        assert!(matches!(
            encode_line(&spec("I4"), &[Value::from("x")]),
            Err(EncodeError::TypeMismatch { index: 0, .. })
        ));
        assert!(matches!(
            encode_line(&spec("A4"), &[Value::Int(3)]),
            Err(EncodeError::TypeMismatch { index: 0, .. })
        ));
        assert_eq!(
            encode_line(&spec("F10.3"), &[Value::Float(f64::NAN)]),
            Err(EncodeError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn test_line_width_is_exact() {
        let s = spec("A10,5X,I5,5X,F10.8,5X,F10.5,5X,F10.5");
        let line = encode_line(
            &s,
            &[
                Value::from("Fe"),
                Value::Int(781),
                Value::Float(0.00001),
                Value::Float(2.4),
                Value::Float(26.0),
            ],
        )
        .unwrap();
        assert_eq!(line.trim_end_matches('\n').len(), s.width());
        assert_eq!(
            line,
            "Fe               781     0.00001000        2.40000       26.00000\n"
        );
    }
}
