//! Compiler for format descriptions.
//!
//! Each comma separated token reads `[repeat]kind[width[.precision]]`:
//!
//! - `A` text, `I` integer, `F` fixed-point float: `repeat` identical fields
//! - `X` padding: `repeat` single blank columns, consumes no value
//!
//! `"20X,3F10.7"` therefore compiles to twenty pad columns followed by three
//! float fields of width 10 with 7 decimals.

use std::fmt;
use std::str::FromStr;

use crate::error::FormatCompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `A`
    Text,
    /// `I`
    Integer,
    /// `F`
    Float,
    /// `X`
    Pad,
}

impl FieldKind {
    pub fn code(&self) -> char {
        match self {
            FieldKind::Text => 'A',
            FieldKind::Integer => 'I',
            FieldKind::Float => 'F',
            FieldKind::Pad => 'X',
        }
    }

    fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(FieldKind::Text),
            'I' => Some(FieldKind::Integer),
            'F' => Some(FieldKind::Float),
            'X' => Some(FieldKind::Pad),
            _ => None,
        }
    }

    /// Whether a field of this kind takes one value from the value list.
    pub fn consumes_value(&self) -> bool {
        !matches!(self, FieldKind::Pad)
    }
}

/// One token of a description, before repeat expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatToken {
    pub kind: FieldKind,
    pub width: usize,
    pub precision: usize,
    pub repeat: usize,
}

impl FormatToken {
    /// Parses a single token such as `3F10.7` or `23X`.
    pub fn parse(token: &str) -> Result<Self, FormatCompileError> {
        let kind_at = token
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .ok_or_else(|| FormatCompileError::UnknownKind {
                token: token.to_string(),
            })?;

        let kind = token[kind_at..]
            .chars()
            .next()
            .and_then(FieldKind::from_code)
            .ok_or_else(|| FormatCompileError::UnknownKind {
                token: token.to_string(),
            })?;

        let repeat = match &token[..kind_at] {
            "" => 1,
            digits => parse_number(digits, token)?,
        };
        if repeat == 0 {
            return Err(FormatCompileError::ZeroRepeat {
                token: token.to_string(),
            });
        }

        let rest = &token[kind_at + 1..];
        let (width, precision) = match rest.split_once('.') {
            Some((w, p)) => (parse_number(w, token)?, Some(parse_number(p, token)?)),
            None if rest.is_empty() => (0, None),
            None => (parse_number(rest, token)?, None),
        };

        match kind {
            FieldKind::Pad => {
                if !rest.is_empty() {
                    return Err(FormatCompileError::PaddingWidth {
                        token: token.to_string(),
                    });
                }
                Ok(Self {
                    kind,
                    width: 1,
                    precision: 0,
                    repeat,
                })
            }
            FieldKind::Text | FieldKind::Integer => {
                if width == 0 {
                    return Err(FormatCompileError::MissingWidth {
                        token: token.to_string(),
                    });
                }
                if precision.is_some() {
                    return Err(FormatCompileError::UnexpectedPrecision {
                        token: token.to_string(),
                    });
                }
                Ok(Self {
                    kind,
                    width,
                    precision: 0,
                    repeat,
                })
            }
            FieldKind::Float => {
                if width == 0 {
                    return Err(FormatCompileError::MissingWidth {
                        token: token.to_string(),
                    });
                }
                let precision = precision.unwrap_or(0);
                // smallest rendering is "0." followed by the decimals
                if precision > 0 && precision + 2 > width {
                    return Err(FormatCompileError::PrecisionExceedsWidth {
                        token: token.to_string(),
                        width,
                        precision,
                    });
                }
                Ok(Self {
                    kind,
                    width,
                    precision,
                    repeat,
                })
            }
        }
    }

    /// The expanded fields of this token.
    pub fn fields(&self) -> impl Iterator<Item = FormatField> + '_ {
        (0..self.repeat).map(move |_| FormatField {
            kind: self.kind,
            width: self.width,
            precision: self.precision,
        })
    }
}

fn parse_number(digits: &str, token: &str) -> Result<usize, FormatCompileError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatCompileError::MalformedToken {
            token: token.to_string(),
        });
    }
    digits
        .parse()
        .map_err(|_| FormatCompileError::MalformedToken {
            token: token.to_string(),
        })
}

/// A single expanded column group. Pad fields are always one column wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatField {
    pub kind: FieldKind,
    pub width: usize,
    pub precision: usize,
}

/// Ordered list of expanded fields compiled from a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    fields: Vec<FormatField>,
}

impl FormatSpec {
    pub fn compile(description: &str) -> Result<Self, FormatCompileError> {
        let mut fields = Vec::new();
        for (index, raw) in description.split(',').enumerate() {
            let token = raw.trim();
            if token.is_empty() {
                return Err(FormatCompileError::EmptyToken { index });
            }
            fields.extend(FormatToken::parse(token)?.fields());
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FormatField] {
        &self.fields
    }

    /// Number of values an encoder consumes / a decoder produces.
    pub fn value_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.kind.consumes_value())
            .count()
    }

    /// Total line width in columns, excluding the line terminator.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }
}

impl FromStr for FormatSpec {
    type Err = FormatCompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatSpec::compile(s)
    }
}

/// Renders the format back into a normalised description, folding runs of
/// identical fields into one repeated token.
impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut i = 0;
        while i < self.fields.len() {
            let field = self.fields[i];
            let run = self.fields[i..]
                .iter()
                .take_while(|other| **other == field)
                .count();

            if !first {
                f.write_str(",")?;
            }
            first = false;

            if run > 1 {
                write!(f, "{}", run)?;
            }
            match field.kind {
                FieldKind::Pad => f.write_str("X")?,
                FieldKind::Float => write!(f, "F{}.{}", field.width, field.precision)?,
                kind => write!(f, "{}{}", kind.code(), field.width)?,
            }
            i += run;
        }
        Ok(())
    }
}
