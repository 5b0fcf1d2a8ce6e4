use nalgebra::{Matrix3, Vector3};

/// Wraps a fractional coordinate into `[0, 1)`.
///
/// Coordinates already in range come back unchanged. A tiny negative input
/// whose remainder rounds up to exactly `1.0` is folded to `0.0`.
pub fn wrap01(v: f64) -> f64 {
    let r = v.rem_euclid(1.0);
    if r >= 1.0 {
        0.0
    } else {
        // -0.0 rem 1.0 is -0.0
        r + 0.0
    }
}

/// A crystallographic symmetry operation in fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperation {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymmetryOperation {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Builds an operation from rotation rows and a translation.
    pub fn from_rows(rows: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self::new(
            Matrix3::from_row_slice(&rows.concat()),
            Vector3::from(translation),
        )
    }

    pub fn from_integer(rows: [[i32; 3]; 3], translation: [f64; 3]) -> Self {
        Self::from_rows(rows.map(|r| r.map(f64::from)), translation)
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// Inversion through the origin.
    pub fn inversion() -> Self {
        Self::new(-Matrix3::identity(), Vector3::zeros())
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn rotation_row(&self, i: usize) -> [f64; 3] {
        [
            self.rotation[(i, 0)],
            self.rotation[(i, 1)],
            self.rotation[(i, 2)],
        ]
    }

    /// `(wrap01(R·p + t), R·m)`. Magnetization does not take the
    /// translation.
    pub fn apply(&self, position: [f64; 3], magnetization: [f64; 3]) -> ([f64; 3], [f64; 3]) {
        let p = self.rotation * Vector3::from(position) + self.translation;
        let m = self.rotation * Vector3::from(magnetization);
        ([wrap01(p.x), wrap01(p.y), wrap01(p.z)], [m.x, m.y, m.z])
    }
}
