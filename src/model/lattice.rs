// src/model/lattice.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StructureError;
use crate::utils::linalg;

/// Bravais lattice symbols understood by WIEN2k.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatticeType {
    P,
    F,
    B,
    CXY,
    CYZ,
    CXZ,
    R,
    H,
}

impl LatticeType {
    pub const ALL: [LatticeType; 8] = [
        LatticeType::P,
        LatticeType::F,
        LatticeType::B,
        LatticeType::CXY,
        LatticeType::CYZ,
        LatticeType::CXZ,
        LatticeType::R,
        LatticeType::H,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LatticeType::P => "P",
            LatticeType::F => "F",
            LatticeType::B => "B",
            LatticeType::CXY => "CXY",
            LatticeType::CYZ => "CYZ",
            LatticeType::CXZ => "CXZ",
            LatticeType::R => "R",
            LatticeType::H => "H",
        }
    }

    /// Non-zero lattice translations of a centered cell, in fractional
    /// coordinates of the conventional cell. Only one site of each centered
    /// set is listed in a `.struct` document.
    pub fn centering_translations(&self) -> &'static [[f64; 3]] {
        match self {
            LatticeType::F => &[[0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]],
            LatticeType::B => &[[0.5, 0.5, 0.5]],
            LatticeType::CXY => &[[0.5, 0.5, 0.0]],
            LatticeType::CYZ => &[[0.0, 0.5, 0.5]],
            LatticeType::CXZ => &[[0.5, 0.0, 0.5]],
            LatticeType::P | LatticeType::R | LatticeType::H => &[],
        }
    }
}

impl FromStr for LatticeType {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        LatticeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == symbol)
            .ok_or_else(|| StructureError::InvalidLatticeType(s.to_string()))
    }
}

impl fmt::Display for LatticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RELA: relativistic core, scalar relativistic valence. NREL: non-relativistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalcMode {
    #[default]
    Rela,
    Nrel,
}

impl CalcMode {
    /// Lenient parse: `rela` in any case selects RELA, anything else NREL.
    pub fn parse_lenient(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("rela") {
            CalcMode::Rela
        } else {
            CalcMode::Nrel
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalcMode::Rela => "RELA",
            CalcMode::Nrel => "NREL",
        }
    }
}

impl fmt::Display for CalcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell lengths in bohr and angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl CellParameters {
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, StructureError> {
        let cell = Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        };
        cell.validate()?;
        Ok(cell)
    }

    /// `a = b = c`, all angles 90°.
    pub fn cubic(a: f64) -> Result<Self, StructureError> {
        Self::new(a, a, a, 90.0, 90.0, 90.0)
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        for (name, value) in [("a", self.a), ("b", self.b), ("c", self.c)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(StructureError::InvalidCellParameter { name, value });
            }
        }
        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 180.0 {
                return Err(StructureError::InvalidCellParameter { name, value });
            }
        }
        Ok(())
    }

    /// Whether all three lengths are equal.
    pub fn is_isometric(&self) -> bool {
        self.a == self.b && self.b == self.c
    }

    /// Lattice vectors as rows, `a` along x and `b` in the xy plane.
    pub fn lattice_vectors(&self) -> [[f64; 3]; 3] {
        linalg::params_to_vectors([self.a, self.b, self.c], [self.alpha, self.beta, self.gamma])
    }

    pub fn from_vectors(vectors: [[f64; 3]; 3]) -> Result<Self, StructureError> {
        let (lengths, angles) = linalg::vectors_to_params(vectors);
        Self::new(
            lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_type_parsing() {
        assert_eq!("CXZ".parse::<LatticeType>().unwrap(), LatticeType::CXZ);
        assert_eq!(" F ".parse::<LatticeType>().unwrap(), LatticeType::F);
        assert_eq!(
            "Q".parse::<LatticeType>(),
            Err(StructureError::InvalidLatticeType("Q".into()))
        );
        // symbols are case sensitive
        assert!("cxy".parse::<LatticeType>().is_err());
    }

    #[test]
    fn test_calc_mode_is_lenient() {
        assert_eq!(CalcMode::parse_lenient("rela"), CalcMode::Rela);
        assert_eq!(CalcMode::parse_lenient("ReLa "), CalcMode::Rela);
        assert_eq!(CalcMode::parse_lenient("NREL"), CalcMode::Nrel);
        assert_eq!(CalcMode::parse_lenient("anything"), CalcMode::Nrel);
    }

    #[test]
    fn test_cell_validation() {
        assert!(CellParameters::cubic(7.5).is_ok());
        assert_eq!(
            CellParameters::cubic(-1.0),
            Err(StructureError::InvalidCellParameter {
                name: "a",
                value: -1.0
            })
        );
        assert!(matches!(
            CellParameters::new(5.0, 5.0, 5.0, 90.0, 180.0, 90.0),
            Err(StructureError::InvalidCellParameter { name: "beta", .. })
        ));
    }

    #[test]
    fn test_vectors_round_trip() {
        let cell = CellParameters::new(5.0, 6.0, 7.0, 80.0, 95.0, 120.0).unwrap();
        let back = CellParameters::from_vectors(cell.lattice_vectors()).unwrap();
        assert!((back.a - 5.0).abs() < 1e-10);
        assert!((back.b - 6.0).abs() < 1e-10);
        assert!((back.c - 7.0).abs() < 1e-10);
        assert!((back.alpha - 80.0).abs() < 1e-10);
        assert!((back.beta - 95.0).abs() < 1e-10);
        assert!((back.gamma - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_centering() {
        assert_eq!(LatticeType::F.centering_translations().len(), 3);
        assert_eq!(LatticeType::B.centering_translations(), &[[0.5, 0.5, 0.5]]);
        assert!(LatticeType::H.centering_translations().is_empty());
    }
}
