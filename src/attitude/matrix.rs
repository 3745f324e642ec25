use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::{Axis, Euler, Quaternion};

/// Row-major 3x3 rotation matrix in the ZXY convention.
///
/// `elements[0..3]` is the first row, `elements[3..6]` the second,
/// `elements[6..9]` the third.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationMatrix {
    pub elements: [f64; 9],
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl RotationMatrix {
    pub fn identity() -> Self {
        Self {
            elements: [
                1.0, 0.0, 0.0,
                0.0, 1.0, 0.0,
                0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn new(elements: [f64; 9]) -> Self {
        Self { elements }
    }

    /// Build the ZXY rotation matrix for the given Euler angles.
    ///
    /// The nine entries are written out in closed form rather than as a
    /// product of three elementary matrices, which avoids two intermediate
    /// roundings per entry. The result is drift-corrected by `normalized`.
    pub fn from_euler(e: &Euler) -> Self {
        let z = e.alpha.to_radians();
        let x = e.beta.to_radians();
        let y = e.gamma.to_radians();

        let (s_x, c_x) = x.sin_cos();
        let (s_y, c_y) = y.sin_cos();
        let (s_z, c_z) = z.sin_cos();

        Self {
            elements: [
                c_z * c_y - s_z * s_x * s_y, -c_x * s_z, c_y * s_z * s_x + c_z * s_y,
                c_y * s_z + c_z * s_x * s_y, c_z * c_x,  s_z * s_y - c_z * c_y * s_x,
                -c_x * s_y,                  s_x,        c_x * c_y,
            ],
        }
        .normalized()
    }

    /// Build the rotation matrix equivalent to a unit quaternion.
    pub fn from_quaternion(q: &Quaternion) -> Self {
        let sqw = q.w * q.w;
        let sqx = q.x * q.x;
        let sqy = q.y * q.y;
        let sqz = q.z * q.z;

        Self {
            elements: [
                sqw + sqx - sqy - sqz,         2.0 * (q.x * q.y - q.w * q.z), 2.0 * (q.x * q.z + q.w * q.y),
                2.0 * (q.x * q.y + q.w * q.z), sqw - sqx + sqy - sqz,         2.0 * (q.y * q.z - q.w * q.x),
                2.0 * (q.x * q.z - q.w * q.y), 2.0 * (q.y * q.z + q.w * q.x), sqw - sqx - sqy + sqz,
            ],
        }
    }

    /// Standard 3x3 matrix product `self * other`.
    pub fn multiply(&self, other: &RotationMatrix) -> RotationMatrix {
        let a = &self.elements;
        let b = &other.elements;

        RotationMatrix {
            elements: [
                a[0] * b[0] + a[1] * b[3] + a[2] * b[6],
                a[0] * b[1] + a[1] * b[4] + a[2] * b[7],
                a[0] * b[2] + a[1] * b[5] + a[2] * b[8],

                a[3] * b[0] + a[4] * b[3] + a[5] * b[6],
                a[3] * b[1] + a[4] * b[4] + a[5] * b[7],
                a[3] * b[2] + a[4] * b[5] + a[5] * b[8],

                a[6] * b[0] + a[7] * b[3] + a[8] * b[6],
                a[6] * b[1] + a[7] * b[4] + a[8] * b[7],
                a[6] * b[2] + a[7] * b[5] + a[8] * b[8],
            ],
        }
    }

    /// Rotate by `angle_rad` about a canonical axis.
    ///
    /// The elementary rotation is composed on the right of `self` and the
    /// result drift-corrected.
    pub fn rotated(self, axis: Axis, angle_rad: f64) -> Self {
        let (s_a, c_a) = angle_rad.sin_cos();

        let transform = match axis {
            Axis::X => RotationMatrix {
                elements: [
                    1.0, 0.0,  0.0,
                    0.0, c_a, -s_a,
                    0.0, s_a,  c_a,
                ],
            },
            Axis::Y => RotationMatrix {
                elements: [
                     c_a, 0.0, s_a,
                     0.0, 1.0, 0.0,
                    -s_a, 0.0, c_a,
                ],
            },
            Axis::Z => RotationMatrix {
                elements: [
                    c_a, -s_a, 0.0,
                    s_a,  c_a, 0.0,
                    0.0,  0.0, 1.0,
                ],
            },
        };

        self.multiply(&transform).normalized()
    }

    pub fn determinant(&self) -> f64 {
        let r = &self.elements;
        r[0] * r[4] * r[8] - r[0] * r[5] * r[7] - r[1] * r[3] * r[8]
            + r[1] * r[5] * r[6]
            + r[2] * r[3] * r[7]
            - r[2] * r[4] * r[6]
    }

    /// Divide every entry by the determinant.
    ///
    /// This is a drift-correction heuristic, not a true re-orthonormalization;
    /// it keeps the determinant at one but does not restore orthogonality of
    /// rows that have already drifted apart.
    pub fn normalized(mut self) -> Self {
        let determinant = self.determinant();
        for entry in self.elements.iter_mut() {
            *entry /= determinant;
        }
        self
    }

    pub fn to_matrix3(&self) -> Matrix3<f64> {
        Matrix3::from_row_slice(&self.elements)
    }
}
