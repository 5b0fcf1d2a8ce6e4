// src/io/wien2k.rs
//
// Reading and writing WIEN2k case.struct documents.

use lazy_static::lazy_static;
use log::debug;
use std::fs;
use std::path::Path;

use crate::error::{DecodeError, EncodeError, FileError, StructureError};
use crate::format::{RecordFormat, Value};
use crate::model::atom::Atom;
use crate::model::elements;
use crate::model::lattice::{CalcMode, CellParameters, LatticeType};
use crate::model::structure_file::{StructureFile, StructureSeed};
use crate::model::symmetry::SymmetryOperation;
use crate::physics::orbit::{self, OrbitOptions};

fn record(description: &str) -> RecordFormat {
    RecordFormat::compile(description).expect("built-in record format compiles")
}

lazy_static! {
    static ref TITLE: RecordFormat = record("A80");
    static ref LATTICE: RecordFormat = record("A4,23X,I3");
    static ref MODE: RecordFormat = record("13X,A4");
    static ref CELL: RecordFormat = record("6F10.6");
    static ref POSITION: RecordFormat = record("4X,I4,4X,F10.8,3X,F10.8,3X,F10.8");
    static ref MULTIPLICITY: RecordFormat = record("15X,I2,17X,I2");
    static ref ELEMENT: RecordFormat = record("A10,5X,I5,5X,F10.8,5X,F10.5,5X,F10.5");
    static ref ROTATION: RecordFormat = record("20X,3F10.7");
    static ref OP_COUNT: RecordFormat = record("I4");
    static ref OP_ROW: RecordFormat = record("3I2,F10.7");
    static ref OP_INDEX: RecordFormat = record("I8");
    static ref PRECISE: RecordFormat = record("F16.14,1X,F16.14,1X,F16.14");
}

// --------------- OUTPUT ---------------

impl StructureFile {
    /// Renders the complete `.struct` document, replicated by the cell
    /// multiples.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let multiples = self.multiples();
        let cell = self.cell();
        let groups = self.groups();
        let n_unique = groups.len();
        let atoms = self.atoms();

        let mut text = String::new();
        text += &TITLE.encode(&[Value::from(self.title())])?;
        text += &LATTICE.encode(&[
            Value::from(self.lattice_type().as_str()),
            Value::Int((n_unique * multiples.count()) as i64),
        ])?;
        text += &MODE.encode(&[Value::from(self.calc_mode().as_str())])?;
        text += &CELL.encode(&[
            Value::Float(cell.a * multiples.a() as f64),
            Value::Float(cell.b * multiples.b() as f64),
            Value::Float(cell.c * multiples.c() as f64),
            Value::Float(cell.alpha),
            Value::Float(cell.beta),
            Value::Float(cell.gamma),
        ])?;

        let sign = if cell.is_isometric() { 1 } else { -1 };
        for (cell_id, replica) in multiples.replicas().enumerate() {
            for (i, members) in groups.iter().enumerate() {
                let group_id = sign * (i + 1 + cell_id * n_unique) as i64;
                let first = &atoms[members[0]];

                for (k, &member) in members.iter().enumerate() {
                    let p = multiples.scale(atoms[member].position(), replica);
                    text += &POSITION.encode(&[
                        Value::Int(group_id),
                        Value::Float(p[0]),
                        Value::Float(p[1]),
                        Value::Float(p[2]),
                    ])?;
                    if k == 0 {
                        text += &MULTIPLICITY.encode(&[
                            Value::Int(members.len() as i64),
                            Value::Int(first.isplit() as i64),
                        ])?;
                    }
                }

                text += &ELEMENT.encode(&[
                    Value::from(first.symbol()),
                    Value::Int(first.npt() as i64),
                    Value::Float(first.r0()),
                    Value::Float(first.rmt()),
                    Value::Float(first.atomic_number() as f64),
                ])?;
                for row in first.rotation() {
                    text += &ROTATION.encode(&row.map(Value::Float))?;
                }
            }
        }

        if self.writes_symmetry() && multiples.is_unit() {
            let operations = self.operations();
            text += &OP_COUNT.encode(&[Value::Int(operations.len() as i64)])?;
            for (i, op) in operations.iter().enumerate() {
                for row in 0..3 {
                    let r = op.rotation_row(row);
                    text += &OP_ROW.encode(&[
                        Value::Int(r[0].round() as i64),
                        Value::Int(r[1].round() as i64),
                        Value::Int(r[2].round() as i64),
                        Value::Float(op.translation()[row]),
                    ])?;
                }
                text += &OP_INDEX.encode(&[Value::Int(i as i64 + 1)])?;
            }
        } else {
            text += &OP_COUNT.encode(&[Value::Int(0)])?;
        }

        text.push('\n');
        for replica in multiples.replicas() {
            for atom in atoms {
                let p = multiples.scale(atom.position(), replica);
                text += &PRECISE.encode(&p.map(Value::Float))?;
            }
        }

        Ok(text)
    }

    pub fn write(&self, path: &Path) -> Result<(), FileError> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }
}

// --------------- INPUT ---------------

/// Hands out document lines one by one, naming what was expected when the
/// document ends early.
struct LineReader<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
        }
    }

    fn read(
        &mut self,
        format: &RecordFormat,
        context: &'static str,
    ) -> Result<Vec<Value>, DecodeError> {
        let line = self
            .lines
            .next()
            .ok_or(DecodeError::UnexpectedEof { context })?;
        format.decode(line)
    }
}

fn text_at(values: &[Value], i: usize, context: &'static str) -> Result<String, DecodeError> {
    values
        .get(i)
        .and_then(Value::as_text)
        .map(str::to_string)
        .ok_or(DecodeError::UnexpectedValue { context })
}

fn int_at(values: &[Value], i: usize, context: &'static str) -> Result<i64, DecodeError> {
    values
        .get(i)
        .and_then(Value::as_int)
        .ok_or(DecodeError::UnexpectedValue { context })
}

fn float_at(values: &[Value], i: usize, context: &'static str) -> Result<f64, DecodeError> {
    values
        .get(i)
        .and_then(Value::as_float)
        .ok_or(DecodeError::UnexpectedValue { context })
}

fn floats_at(values: &[Value], from: usize, context: &'static str) -> Result<[f64; 3], DecodeError> {
    Ok([
        float_at(values, from, context)?,
        float_at(values, from + 1, context)?,
        float_at(values, from + 2, context)?,
    ])
}

/// Element line Z, falling back to the label when Z is missing or unknown.
fn resolve_atomic_number(label: &str, z: f64) -> Result<u32, StructureError> {
    let rounded = z.round();
    if rounded >= 1.0 && elements::symbol(rounded as u32).is_some() {
        return Ok(rounded as u32);
    }
    elements::atomic_number(label).ok_or_else(|| StructureError::UnknownElement(label.to_string()))
}

impl StructureFile {
    /// Parses a `.struct` document with the default orbit options.
    pub fn decode(text: &str) -> Result<Self, StructureError> {
        Self::decode_with(text, &OrbitOptions::default())
    }

    /// Parses a `.struct` document. When the document carries symmetry
    /// operations, each equivalence group is orbit-expanded from its listed
    /// sites; otherwise the listed sites are kept as they are. The trailing
    /// precise-position block is not read.
    pub fn decode_with(text: &str, options: &OrbitOptions) -> Result<Self, StructureError> {
        let mut reader = LineReader::new(text);

        let values = reader.read(&TITLE, "title")?;
        let title = text_at(&values, 0, "title")?;

        let values = reader.read(&LATTICE, "lattice type")?;
        let lattice_type: LatticeType = text_at(&values, 0, "lattice type")?.parse()?;
        let non_eq = int_at(&values, 1, "non-equivalent atom count")?;
        if non_eq < 0 {
            return Err(DecodeError::UnexpectedValue {
                context: "non-equivalent atom count",
            }
            .into());
        }

        let values = reader.read(&MODE, "calculation mode")?;
        let calc_mode = CalcMode::parse_lenient(&text_at(&values, 0, "calculation mode")?);

        let values = reader.read(&CELL, "cell parameters")?;
        let [a, b, c] = floats_at(&values, 0, "cell lengths")?;
        let [alpha, beta, gamma] = floats_at(&values, 3, "cell angles")?;
        let cell = CellParameters::new(a, b, c, alpha, beta, gamma)?;

        let mut decoded_groups: Vec<Vec<Atom>> = Vec::with_capacity(non_eq as usize);
        for _ in 0..non_eq {
            let values = reader.read(&POSITION, "atom position")?;
            let mut positions = vec![floats_at(&values, 1, "atom position")?];

            let values = reader.read(&MULTIPLICITY, "multiplicity")?;
            let mult = int_at(&values, 0, "multiplicity")?;
            let isplit = int_at(&values, 1, "ISPLIT")?;
            if mult < 1 {
                return Err(DecodeError::UnexpectedValue {
                    context: "multiplicity",
                }
                .into());
            }

            for _ in 1..mult {
                let values = reader.read(&POSITION, "equivalent atom position")?;
                positions.push(floats_at(&values, 1, "equivalent atom position")?);
            }

            let values = reader.read(&ELEMENT, "element line")?;
            let label = text_at(&values, 0, "element label")?;
            let npt = int_at(&values, 1, "NPT")?;
            let r0 = float_at(&values, 2, "R0")?;
            let rmt = float_at(&values, 3, "RMT")?;
            let z = resolve_atomic_number(&label, float_at(&values, 4, "Z")?)?;

            let mut rotation = [[0.0; 3]; 3];
            for row in rotation.iter_mut() {
                let values = reader.read(&ROTATION, "local rotation matrix")?;
                *row = floats_at(&values, 0, "local rotation matrix")?;
            }

            let npt = u32::try_from(npt).map_err(|_| DecodeError::UnexpectedValue { context: "NPT" })?;
            let isplit =
                i32::try_from(isplit).map_err(|_| DecodeError::UnexpectedValue { context: "ISPLIT" })?;
            let template = Atom::new([0.0; 3], z)?
                .with_mesh(npt)?
                .with_split(isplit)?
                .with_radii(r0, rmt)?
                .with_rotation(rotation);

            decoded_groups.push(
                positions
                    .into_iter()
                    .map(|p| template.moved_to(p, [0.0; 3]))
                    .collect(),
            );
        }

        let values = reader.read(&OP_COUNT, "symmetry operation count")?;
        let op_count = int_at(&values, 0, "symmetry operation count")?;
        if op_count < 0 {
            return Err(DecodeError::UnexpectedValue {
                context: "symmetry operation count",
            }
            .into());
        }
        let mut operations = Vec::with_capacity(op_count as usize);
        for _ in 0..op_count {
            let mut rows = [[0.0; 3]; 3];
            let mut translation = [0.0; 3];
            for (row, t) in rows.iter_mut().zip(translation.iter_mut()) {
                let values = reader.read(&OP_ROW, "symmetry operation")?;
                for (j, entry) in row.iter_mut().enumerate() {
                    *entry = int_at(&values, j, "symmetry operation")? as f64;
                }
                *t = float_at(&values, 3, "symmetry operation")?;
            }
            reader.read(&OP_INDEX, "symmetry operation index")?;
            operations.push(SymmetryOperation::from_rows(rows, translation));
        }

        let mut atoms = Vec::new();
        let mut groups = Vec::new();
        for (i, members) in decoded_groups.iter().enumerate() {
            let expanded = if operations.is_empty() {
                members.clone()
            } else {
                orbit::expand_group(members, &operations, options)
            };
            groups.extend(std::iter::repeat(i).take(expanded.len()));
            atoms.extend(expanded);
        }

        debug!(
            "Decoded '{}': {} groups, {} atoms, {} operations",
            title,
            decoded_groups.len(),
            atoms.len(),
            operations.len()
        );

        let seed = StructureSeed {
            title,
            lattice_type,
            calc_mode,
            cell,
            atoms,
            operations,
        };
        Ok(StructureFile::from_parts(seed, groups, *options))
    }

    pub fn read(path: &Path, options: &OrbitOptions) -> Result<Self, FileError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::decode_with(&text, options)?)
    }
}
