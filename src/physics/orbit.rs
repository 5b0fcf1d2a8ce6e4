//! Orbit expansion of unique atoms under a list of symmetry operations.
//!
//! Images are deduplicated by their fixed-precision text form: two images
//! are the same site when position and magnetization print identically at
//! the configured number of decimals.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::model::atom::Atom;
use crate::model::symmetry::SymmetryOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitOptions {
    /// Rounds of operation application. Work grows as `ops^depth`.
    pub depth: usize,
    pub position_precision: usize,
    pub magnetization_precision: usize,
}

impl OrbitOptions {
    /// The same options with `depth` raised to at least 1.
    pub fn normalized(self) -> Self {
        if self.depth == 0 {
            warn!("Orbit depth 0 is not allowed, using 1");
        }
        Self {
            depth: self.depth.max(1),
            ..self
        }
    }
}

impl Default for OrbitOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            position_precision: 5,
            magnetization_precision: 6,
        }
    }
}

/// Fixed-point text of `v` with negative zero printed unsigned.
fn fixed(v: f64, precision: usize) -> String {
    let s = format!("{:.*}", precision, v);
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

/// Position coordinate text; a value that rounds up to `1` is the same
/// site as `0`.
fn fixed_coordinate(v: f64, precision: usize) -> String {
    let s = fixed(v, precision);
    if s.parse::<f64>().is_ok_and(|x| x >= 1.0) {
        fixed(0.0, precision)
    } else {
        s
    }
}

/// Canonical key `x,y,z,mx,my,mz` of one image.
pub fn orbit_key(position: [f64; 3], magnetization: [f64; 3], options: &OrbitOptions) -> String {
    position
        .iter()
        .map(|&v| fixed_coordinate(v, options.position_precision))
        .chain(
            magnetization
                .iter()
                .map(|&v| fixed(v, options.magnetization_precision)),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_key(key: &str) -> ([f64; 3], [f64; 3]) {
    let mut values = [0.0; 6];
    for (slot, part) in values.iter_mut().zip(key.split(',')) {
        // keys are produced by `orbit_key` and always parse
        *slot = part.parse().unwrap_or(0.0);
    }
    (
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
    )
}

/// Every (position, magnetization) image reachable from `seeds` in at most
/// `depth` rounds, seeds included.
fn images(
    seeds: &[([f64; 3], [f64; 3])],
    operations: &[SymmetryOperation],
    depth: usize,
) -> Vec<([f64; 3], [f64; 3])> {
    let mut all = seeds.to_vec();
    let mut frontier = seeds.to_vec();

    for _ in 0..depth {
        if operations.is_empty() {
            break;
        }
        let next: Vec<_> = frontier
            .iter()
            .flat_map(|&(p, m)| operations.iter().map(move |op| op.apply(p, m)))
            .collect();
        all.extend_from_slice(&next);
        frontier = next;
    }
    all
}

/// Expands several seeds of one equivalence group into a single
/// deduplicated orbit. Non-positional attributes come from the first seed.
/// Output follows first appearance of each key.
pub fn expand_group(
    seeds: &[Atom],
    operations: &[SymmetryOperation],
    options: &OrbitOptions,
) -> Vec<Atom> {
    let Some(template) = seeds.first() else {
        return Vec::new();
    };

    let start: Vec<_> = seeds
        .iter()
        .map(|a| (a.position(), a.magnetization()))
        .collect();
    let generated = images(&start, operations, options.depth.max(1));

    let mut seen = HashSet::new();
    let mut orbit = Vec::new();
    for (p, m) in &generated {
        let key = orbit_key(*p, *m, options);
        if seen.contains(&key) {
            continue;
        }
        let (position, magnetization) = parse_key(&key);
        orbit.push(template.moved_to(position, magnetization));
        seen.insert(key);
    }

    debug!(
        "Orbit of {} ({} seed(s)): {} images, {} unique",
        template.symbol(),
        seeds.len(),
        generated.len(),
        orbit.len()
    );
    orbit
}

pub fn expand_orbit(
    atom: &Atom,
    operations: &[SymmetryOperation],
    options: &OrbitOptions,
) -> Vec<Atom> {
    expand_group(std::slice::from_ref(atom), operations, options)
}

/// Expands each unique atom on its own. Returns the full atom list and the
/// group index (into `unique`) of every output atom.
pub fn expand_all(
    unique: &[Atom],
    operations: &[SymmetryOperation],
    options: &OrbitOptions,
) -> (Vec<Atom>, Vec<usize>) {
    let mut atoms = Vec::new();
    let mut groups = Vec::new();
    for (i, atom) in unique.iter().enumerate() {
        let orbit = expand_orbit(atom, operations, options);
        groups.extend(std::iter::repeat(i).take(orbit.len()));
        atoms.extend(orbit);
    }
    (atoms, groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron(position: [f64; 3]) -> Atom {
        Atom::new(position, 26).unwrap()
    }

    #[test]
    fn test_key_format() {
        let options = OrbitOptions::default();
        assert_eq!(
            orbit_key([0.5, 0.0, 0.25], [0.0, -0.0, 1.0], &options),
            "0.50000,0.00000,0.25000,0.000000,0.000000,1.000000"
        );
        // rounds up to 1.00000 and folds back to 0
        assert_eq!(
            orbit_key([0.999999, 0.0, 0.0], [0.0; 3], &options),
            "0.00000,0.00000,0.00000,0.000000,0.000000,0.000000"
        );
    }

    #[test]
    fn test_identity_orbit_is_the_input() {
        let atom = iron([0.125, 0.25, 0.5]).with_magnetization([0.0, 0.0, 2.5]);
        let orbit = expand_orbit(&atom, &[SymmetryOperation::identity()], &OrbitOptions::default());
        assert_eq!(orbit, vec![atom]);
    }

    #[test]
    fn test_inversion_at_origin_splits_magnetization() {
        let atom = iron([0.0, 0.0, 0.0]).with_magnetization([0.0, 0.0, 1.0]);
        let orbit = expand_orbit(&atom, &[SymmetryOperation::inversion()], &OrbitOptions::default());

        assert_eq!(orbit.len(), 2);
        assert_eq!(orbit[0].position(), [0.0, 0.0, 0.0]);
        assert_eq!(orbit[0].magnetization(), [0.0, 0.0, 1.0]);
        assert_eq!(orbit[1].position(), [0.0, 0.0, 0.0]);
        assert_eq!(orbit[1].magnetization(), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_dedup_at_precision() {
        let options = OrbitOptions::default();
        let shift = |t: f64| SymmetryOperation::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], [t, 0.0, 0.0]);

        // below the fifth decimal: same site
        let orbit = expand_orbit(&iron([0.25, 0.0, 0.0]), &[shift(0.000001)], &options);
        assert_eq!(orbit.len(), 1);

        // differs in the last printed digit: distinct
        let orbit = expand_orbit(&iron([0.25, 0.0, 0.0]), &[shift(0.00001)], &options);
        assert_eq!(orbit.len(), 2);
        assert_eq!(orbit[1].position()[0], 0.25001);
    }

    #[test]
    fn test_depth_reaches_products() {
        let shift = SymmetryOperation::from_rows(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [0.25, 0.0, 0.0],
        );
        let atom = iron([0.0; 3]);

        let one = expand_orbit(&atom, &[shift.clone()], &OrbitOptions::default());
        assert_eq!(one.len(), 2);

        let options = OrbitOptions {
            depth: 3,
            ..OrbitOptions::default()
        };
        let three = expand_orbit(&atom, &[shift], &options);
        let xs: Vec<f64> = three.iter().map(|a| a.position()[0]).collect();
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_zero_depth_expands_like_one() {
        let atom = iron([0.3, 0.3, 0.0]);
        let ops = [SymmetryOperation::identity(), SymmetryOperation::inversion()];
        let zero = OrbitOptions {
            depth: 0,
            ..OrbitOptions::default()
        };

        assert_eq!(zero.normalized().depth, 1);
        assert_eq!(
            expand_orbit(&atom, &ops, &zero),
            expand_orbit(&atom, &ops, &OrbitOptions::default())
        );
        assert_eq!(expand_orbit(&atom, &ops, &zero).len(), 2);
    }

    #[test]
    fn test_group_seeds_share_one_key_set() {
        let seeds = vec![iron([0.0; 3]), iron([0.5, 0.5, 0.5])];
        let translate = SymmetryOperation::from_rows(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [0.5, 0.5, 0.5],
        );
        let orbit = expand_group(&seeds, &[translate], &OrbitOptions::default());
        assert_eq!(orbit.len(), 2);
    }

    #[test]
    fn test_expand_all_tracks_groups() {
        let unique = vec![iron([0.0; 3]), Atom::new([0.25, 0.25, 0.25], 14).unwrap()];
        let (atoms, groups) = expand_all(
            &unique,
            &[SymmetryOperation::identity(), SymmetryOperation::inversion()],
            &OrbitOptions::default(),
        );
        assert_eq!(atoms.len(), 3);
        assert_eq!(groups, vec![0, 1, 1]);
        assert_eq!(atoms[2].position(), [0.75, 0.75, 0.75]);
        assert_eq!(atoms[2].symbol(), "Si");
    }
}
