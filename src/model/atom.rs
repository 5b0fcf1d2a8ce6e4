use serde::{Deserialize, Serialize};

use crate::error::StructureError;
use crate::model::elements;
use crate::model::symmetry::wrap01;

/// ISPLIT options accepted by WIEN2k (users guide, case.struct).
pub const ALLOWED_SPLIT_CODES: [i32; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, -2, 88, 99];

pub const IDENTITY_ROTATION: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

pub fn validate_mesh(npt: u32) -> Result<u32, StructureError> {
    if npt % 2 == 1 {
        Ok(npt)
    } else {
        Err(StructureError::InvalidMeshSize(npt))
    }
}

pub fn validate_split(code: i32) -> Result<i32, StructureError> {
    if ALLOWED_SPLIT_CODES.contains(&code) {
        Ok(code)
    } else {
        Err(StructureError::InvalidSplitCode(code))
    }
}

pub fn validate_radius(name: &'static str, value: f64) -> Result<f64, StructureError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(StructureError::InvalidRadius { name, value })
    }
}

pub fn validate_atomic_number(z: u32) -> Result<u32, StructureError> {
    elements::symbol(z)
        .map(|_| z)
        .ok_or(StructureError::InvalidAtomicNumber(z))
}

/// Radial mesh defaults for atoms that do not come from a `.struct` file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomDefaults {
    pub npt: u32,
    pub r0: f64,
    pub rmt: f64,
    pub isplit: i32,
}

impl Default for AtomDefaults {
    fn default() -> Self {
        Self {
            npt: 781,
            r0: 0.00001,
            rmt: 2.4,
            isplit: 8,
        }
    }
}

impl AtomDefaults {
    pub fn validate(&self) -> Result<(), StructureError> {
        validate_mesh(self.npt)?;
        validate_radius("R0", self.r0)?;
        validate_radius("RMT", self.rmt)?;
        validate_split(self.isplit)?;
        Ok(())
    }
}

/// One atomic site. Position is fractional and always inside `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    position: [f64; 3],
    z: u32,
    rotation: [[f64; 3]; 3],
    npt: u32,
    r0: f64,
    rmt: f64,
    isplit: i32,
    magnetization: [f64; 3],
}

impl Atom {
    pub fn new(position: [f64; 3], z: u32) -> Result<Self, StructureError> {
        Self::with_defaults(position, z, &AtomDefaults::default())
    }

    pub fn with_defaults(
        position: [f64; 3],
        z: u32,
        defaults: &AtomDefaults,
    ) -> Result<Self, StructureError> {
        defaults.validate()?;
        Ok(Self {
            position: position.map(wrap01),
            z: validate_atomic_number(z)?,
            rotation: IDENTITY_ROTATION,
            npt: defaults.npt,
            r0: defaults.r0,
            rmt: defaults.rmt,
            isplit: defaults.isplit,
            magnetization: [0.0; 3],
        })
    }

    pub fn from_symbol(position: [f64; 3], symbol: &str) -> Result<Self, StructureError> {
        let z = elements::atomic_number(symbol)
            .ok_or_else(|| StructureError::UnknownElement(symbol.to_string()))?;
        Self::new(position, z)
    }

    pub fn with_mesh(mut self, npt: u32) -> Result<Self, StructureError> {
        self.npt = validate_mesh(npt)?;
        Ok(self)
    }

    pub fn with_split(mut self, isplit: i32) -> Result<Self, StructureError> {
        self.isplit = validate_split(isplit)?;
        Ok(self)
    }

    pub fn with_radii(mut self, r0: f64, rmt: f64) -> Result<Self, StructureError> {
        self.r0 = validate_radius("R0", r0)?;
        self.rmt = validate_radius("RMT", rmt)?;
        Ok(self)
    }

    pub fn with_rotation(mut self, rotation: [[f64; 3]; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_magnetization(mut self, magnetization: [f64; 3]) -> Self {
        self.magnetization = magnetization;
        self
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn atomic_number(&self) -> u32 {
        self.z
    }

    pub fn symbol(&self) -> &'static str {
        // z is validated on every write
        elements::symbol(self.z).unwrap_or("X")
    }

    pub fn rotation(&self) -> [[f64; 3]; 3] {
        self.rotation
    }

    pub fn npt(&self) -> u32 {
        self.npt
    }

    pub fn r0(&self) -> f64 {
        self.r0
    }

    pub fn rmt(&self) -> f64 {
        self.rmt
    }

    pub fn isplit(&self) -> i32 {
        self.isplit
    }

    pub fn magnetization(&self) -> [f64; 3] {
        self.magnetization
    }

    /// Copy of this atom at another site, keeping every other attribute.
    pub fn moved_to(&self, position: [f64; 3], magnetization: [f64; 3]) -> Self {
        Self {
            position: position.map(wrap01),
            magnetization,
            ..self.clone()
        }
    }

    // Unchecked setters for the aggregate, which validates before calling.

    pub(crate) fn set_position_component(&mut self, axis: usize, value: f64) {
        self.position[axis] = wrap01(value);
    }

    pub(crate) fn set_atomic_number(&mut self, z: u32) {
        self.z = z;
    }

    pub(crate) fn set_rotation(&mut self, rotation: [[f64; 3]; 3]) {
        self.rotation = rotation;
    }

    pub(crate) fn set_npt(&mut self, npt: u32) {
        self.npt = npt;
    }

    pub(crate) fn set_r0(&mut self, r0: f64) {
        self.r0 = r0;
    }

    pub(crate) fn set_rmt(&mut self, rmt: f64) {
        self.rmt = rmt;
    }

    pub(crate) fn set_isplit(&mut self, isplit: i32) {
        self.isplit = isplit;
    }

    pub(crate) fn set_magnetization(&mut self, magnetization: [f64; 3]) {
        self.magnetization = magnetization;
    }
}
