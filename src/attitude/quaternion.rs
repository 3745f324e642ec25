use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use super::{Axis, Euler, RotationMatrix};

/// Unit quaternion representing a device attitude.
///
/// Stored as `(x, y, z, w)` with `w` as the scalar part. Every composing
/// operation re-normalizes, so the norm stays at one across long chains of
/// per-frame updates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Sign with `sign(0) == 0`, used to pick the extraction branch below.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Quaternion {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Build a quaternion from ZXY Euler angles via half-angle products.
    pub fn from_euler(e: &Euler) -> Self {
        let z_2 = e.alpha.to_radians() / 2.0;
        let x_2 = e.beta.to_radians() / 2.0;
        let y_2 = e.gamma.to_radians() / 2.0;

        let (s_x, c_x) = x_2.sin_cos();
        let (s_y, c_y) = y_2.sin_cos();
        let (s_z, c_z) = z_2.sin_cos();

        Self {
            x: s_x * c_y * c_z - c_x * s_y * s_z,
            y: c_x * s_y * c_z + s_x * c_y * s_z,
            z: c_x * c_y * s_z + s_x * s_y * c_z,
            w: c_x * c_y * c_z - s_x * s_y * s_z,
        }
        .normalized()
    }

    /// Extract the quaternion from a rotation matrix.
    ///
    /// Symmetric closed form: each component from the matching diagonal
    /// combination, signs from the antisymmetric off-diagonal differences.
    /// Unstable only when several diagonal differences are near-equal while
    /// the off-diagonals are near zero; inputs built from rotations never
    /// get there.
    pub fn from_rotation_matrix(m: &RotationMatrix) -> Self {
        let r = &m.elements;

        Self {
            x: 0.5 * (1.0 + r[0] - r[4] - r[8]).max(0.0).sqrt() * sign(r[7] - r[5]),
            y: 0.5 * (1.0 - r[0] + r[4] - r[8]).max(0.0).sqrt() * sign(r[2] - r[6]),
            z: 0.5 * (1.0 - r[0] - r[4] + r[8]).max(0.0).sqrt() * sign(r[3] - r[1]),
            w: 0.5 * (1.0 + r[0] + r[4] + r[8]).max(0.0).sqrt(),
        }
    }

    /// Hamilton product `self * other`, re-normalized.
    pub fn multiply(self, other: Quaternion) -> Quaternion {
        self.hamilton(other).normalized()
    }

    fn hamilton(self, b: Quaternion) -> Quaternion {
        let a = self;
        Quaternion {
            x: a.x * b.w + a.w * b.x + a.y * b.z - a.z * b.y,
            y: a.y * b.w + a.w * b.y + a.z * b.x - a.x * b.z,
            z: a.z * b.w + a.w * b.z + a.x * b.y - a.y * b.x,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }

    /// Rotate by `angle_rad` about a canonical axis.
    pub fn rotated(self, axis: Axis, angle_rad: f64) -> Self {
        let half = angle_rad / 2.0;
        let (s_a, c_a) = half.sin_cos();

        let transform = match axis {
            Axis::X => Quaternion::new(s_a, 0.0, 0.0, c_a),
            Axis::Y => Quaternion::new(0.0, s_a, 0.0, c_a),
            Axis::Z => Quaternion::new(0.0, 0.0, s_a, c_a),
        };

        self.hamilton(transform).normalized()
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Scale to unit norm. A zero quaternion resets to identity instead of
    /// dividing by zero.
    pub fn normalized(self) -> Self {
        let len = self.norm();
        if len == 0.0 {
            return Self::identity();
        }
        Self {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
            w: self.w / len,
        }
    }

    pub fn to_unit_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(self.w, self.x, self.y, self.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_euler_is_identity() {
        let q = Quaternion::from_euler(&Euler::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(q.x, 0.0);
        assert_abs_diff_eq!(q.y, 0.0);
        assert_abs_diff_eq!(q.z, 0.0);
        assert_abs_diff_eq!(q.w, 1.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let q = Quaternion::new(0.3, -0.4, 0.5, 0.7).normalized();
        let q2 = q.normalized();
        assert_abs_diff_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q2.x, q.x, epsilon = 1e-15);
        assert_abs_diff_eq!(q2.w, q.w, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_quaternion_normalizes_to_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_multiply_preserves_unit_norm() {
        let a = Quaternion::from_euler(&Euler::new(310.0, 40.0, -20.0));
        let b = Quaternion::from_euler(&Euler::new(45.0, -70.0, 10.0));
        assert_abs_diff_eq!(a.multiply(b).norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotated_about_z() {
        let q = Quaternion::identity().rotated(Axis::Z, std::f64::consts::FRAC_PI_2);
        let half = std::f64::consts::FRAC_PI_4;
        assert_abs_diff_eq!(q.z, half.sin(), epsilon = 1e-12);
        assert_abs_diff_eq!(q.w, half.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(q.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_identity_matrix_extracts_identity() {
        let q = Quaternion::from_rotation_matrix(&RotationMatrix::identity());
        assert_abs_diff_eq!(q.x, 0.0);
        assert_abs_diff_eq!(q.y, 0.0);
        assert_abs_diff_eq!(q.z, 0.0);
        assert_abs_diff_eq!(q.w, 1.0);
    }

    #[test]
    fn test_rotate_and_back_is_identity() {
        let q = Quaternion::from_euler(&Euler::new(80.0, 30.0, 15.0));
        let round = q.rotated(Axis::Y, 0.8).rotated(Axis::Y, -0.8);
        assert_abs_diff_eq!(round.x, q.x, epsilon = 1e-12);
        assert_abs_diff_eq!(round.y, q.y, epsilon = 1e-12);
        assert_abs_diff_eq!(round.z, q.z, epsilon = 1e-12);
        assert_abs_diff_eq!(round.w, q.w, epsilon = 1e-12);
    }
}
