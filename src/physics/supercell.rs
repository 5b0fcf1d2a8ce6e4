// src/physics/supercell.rs

use serde::{Deserialize, Serialize};

use crate::model::atom::Atom;

/// Replication factors along a, b and c. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMultiples {
    a: u32,
    b: u32,
    c: u32,
}

impl Default for CellMultiples {
    fn default() -> Self {
        Self { a: 1, b: 1, c: 1 }
    }
}

impl CellMultiples {
    /// Values below 1 are raised to 1.
    pub fn new(a: i64, b: i64, c: i64) -> Self {
        let clamp = |n: i64| n.clamp(1, u32::MAX as i64) as u32;
        Self {
            a: clamp(a),
            b: clamp(b),
            c: clamp(c),
        }
    }

    pub fn a(&self) -> u32 {
        self.a
    }

    pub fn b(&self) -> u32 {
        self.b
    }

    pub fn c(&self) -> u32 {
        self.c
    }

    pub fn as_array(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    pub fn count(&self) -> usize {
        self.a as usize * self.b as usize * self.c as usize
    }

    pub fn is_unit(&self) -> bool {
        self.count() == 1
    }

    /// Replica offsets `(i, j, k)`, a-major then b then c.
    pub fn replicas(&self) -> impl Iterator<Item = [u32; 3]> {
        let (nb, nc) = (self.b, self.c);
        (0..self.a).flat_map(move |x| {
            (0..nb).flat_map(move |y| (0..nc).map(move |z| [x, y, z]))
        })
    }

    /// Position of `position` in replica `replica`, in supercell fractions.
    pub fn scale(&self, position: [f64; 3], replica: [u32; 3]) -> [f64; 3] {
        let m = self.as_array();
        [0, 1, 2].map(|i| (position[i] + replica[i] as f64) / m[i] as f64)
    }
}

/// Every atom in every replica, in replica order.
pub fn replicate(atoms: &[Atom], multiples: &CellMultiples) -> Vec<Atom> {
    let mut new_atoms = Vec::with_capacity(atoms.len() * multiples.count());

    for replica in multiples.replicas() {
        for atom in atoms {
            new_atoms.push(atom.moved_to(
                multiples.scale(atom.position(), replica),
                atom.magnetization(),
            ));
        }
    }

    new_atoms
}
