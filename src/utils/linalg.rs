// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Lattice rows `[[ax, ay, az], [bx, by, bz], [cx, cy, cz]]` as a matrix
/// whose rows are the lattice vectors.
pub fn row_matrix(lattice: [[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_row_slice(&[
    lattice[0][0],
    lattice[0][1],
    lattice[0][2],
    lattice[1][0],
    lattice[1][1],
    lattice[1][2],
    lattice[2][0],
    lattice[2][1],
    lattice[2][2],
  ])
}

/// Fractional to Cartesian: `cart = L^T × frac`.
pub fn frac_to_cart(frac: [f64; 3], lattice: [[f64; 3]; 3]) -> [f64; 3] {
  let cart = row_matrix(lattice).transpose() * Vector3::from(frac);
  [cart.x, cart.y, cart.z]
}

/// Cartesian to fractional: `frac = (L^T)^-1 × cart`. `None` for a singular
/// lattice.
pub fn cart_to_frac(cart: [f64; 3], lattice: [[f64; 3]; 3]) -> Option<[f64; 3]> {
  let inv = row_matrix(lattice).transpose().try_inverse()?;
  let frac = inv * Vector3::from(cart);
  Some([frac.x, frac.y, frac.z])
}

/// Builds lattice rows from lengths and angles (degrees, alpha between b
/// and c). `a` lies along x and `b` in the xy plane.
pub fn params_to_vectors(lengths: [f64; 3], angles: [f64; 3]) -> [[f64; 3]; 3] {
  let [a, b, c] = lengths;
  let [alpha, beta, gamma] = angles.map(f64::to_radians);

  let (cos_a, cos_b) = (alpha.cos(), beta.cos());
  let (sin_g, cos_g) = gamma.sin_cos();

  let cy = (cos_a - cos_b * cos_g) / sin_g;
  let cz = (1.0 - cos_b * cos_b - cy * cy).max(0.0).sqrt();

  [
    [a, 0.0, 0.0],
    [b * cos_g, b * sin_g, 0.0],
    [c * cos_b, c * cy, c * cz],
  ]
  .map(|row| row.map(clean_zero))
}

/// Inverse of [`params_to_vectors`]: `([a, b, c], [alpha, beta, gamma])`.
pub fn vectors_to_params(lattice: [[f64; 3]; 3]) -> ([f64; 3], [f64; 3]) {
  let m = row_matrix(lattice);
  let va: Vector3<f64> = m.row(0).transpose();
  let vb: Vector3<f64> = m.row(1).transpose();
  let vc: Vector3<f64> = m.row(2).transpose();

  let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
    (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0).acos().to_degrees()
  };

  (
    [va.norm(), vb.norm(), vc.norm()],
    [angle(&vb, &vc), angle(&va, &vc), angle(&va, &vb)],
  )
}

/// Primitive rhombohedral vectors of a rhombohedral lattice given in its
/// hexagonal setting (`a` and `c` of the hexagonal cell).
pub fn rhombohedral_vectors(a: f64, c: f64) -> [[f64; 3]; 3] {
  let s3 = 3f64.sqrt();
  [
    [a / 2.0, -a / (2.0 * s3), c / 3.0],
    [0.0, a / s3, c / 3.0],
    [-a / 2.0, -a / (2.0 * s3), c / 3.0],
  ]
}

// cos(90°) is 6e-17, not 0
fn clean_zero(v: f64) -> f64 {
  if v.abs() < 1e-12 {
    0.0
  } else {
    v
  }
}
