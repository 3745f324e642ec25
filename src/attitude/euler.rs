use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};

use super::{Axis, Quaternion, RotationMatrix};

/// Device attitude as ZXY intrinsic Euler angles, in degrees.
///
/// `alpha` is the heading about Z and is reported in [0, 360) by every
/// conversion; `beta` (front-back tilt about X) and `gamma` (left-right
/// tilt about Y) follow the platform sensor ranges of [-180, 180] and
/// [-90, 90].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Euler {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Recover Euler angles from a ZXY rotation matrix.
    ///
    /// The branch structure cases on the sign of `r[8]` (cos beta) so no
    /// division by a vanishing cosine ever happens; the innermost branch is
    /// the gimbal-lock pole, where gamma is pinned to zero and alpha is
    /// taken from the remaining well-defined column.
    pub fn from_rotation_matrix(m: &RotationMatrix) -> Self {
        let r = &m.elements;

        let mut alpha;
        let mut beta;
        let gamma;

        if r[8] > 0.0 {
            // cos(beta) > 0
            alpha = (-r[1]).atan2(r[4]);
            beta = r[7].clamp(-1.0, 1.0).asin();
            gamma = (-r[6]).atan2(r[8]);
        } else if r[8] < 0.0 {
            // cos(beta) < 0, fold beta out of (-pi/2, pi/2)
            alpha = r[1].atan2(-r[4]);
            beta = -r[7].clamp(-1.0, 1.0).asin();
            beta += if beta >= 0.0 { -PI } else { PI };
            gamma = r[6].atan2(-r[8]);
        } else if r[6] > 0.0 {
            // cos(gamma) == 0, cos(beta) > 0
            alpha = (-r[1]).atan2(r[4]);
            beta = r[7].clamp(-1.0, 1.0).asin();
            gamma = -FRAC_PI_2;
        } else if r[6] < 0.0 {
            // cos(gamma) == 0, cos(beta) < 0
            alpha = r[1].atan2(-r[4]);
            beta = -r[7].clamp(-1.0, 1.0).asin();
            beta += if beta >= 0.0 { -PI } else { PI };
            gamma = -FRAC_PI_2;
        } else {
            // r[6] == 0 and r[8] == 0: gimbal lock
            alpha = r[3].atan2(r[0]);
            beta = if r[7] > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
            gamma = 0.0;
        }

        // atan2 yields alpha in [-pi, pi]; report [0, 2*pi)
        if alpha < 0.0 {
            alpha += TAU;
        }

        Self {
            alpha: alpha.to_degrees(),
            beta: beta.to_degrees(),
            gamma: gamma.to_degrees(),
        }
    }

    /// Recover Euler angles from a unit quaternion.
    ///
    /// The two poles at beta = +-90 degrees are detected up front (within
    /// 1e-6 of the exact pole, scaled by the squared norm so a slightly
    /// denormalized input still lands in the right branch) and answered
    /// with gamma = 0 and alpha from the one remaining free rotation. The
    /// general branch flips signs on `g_x` to keep atan2 in the stable
    /// quadrant.
    pub fn from_quaternion(q: &Quaternion) -> Self {
        let sqw = q.w * q.w;
        let sqx = q.x * q.x;
        let sqy = q.y * q.y;
        let sqz = q.z * q.z;

        let unit_length = sqw + sqx + sqy + sqz;
        let wxyz = q.w * q.x + q.y * q.z;
        let epsilon = 1e-6;

        let mut alpha;
        let mut beta;
        let gamma;

        if wxyz > (0.5 - epsilon) * unit_length {
            alpha = 2.0 * q.y.atan2(q.w);
            beta = FRAC_PI_2;
            gamma = 0.0;
        } else if wxyz < (-0.5 + epsilon) * unit_length {
            alpha = -2.0 * q.y.atan2(q.w);
            beta = -FRAC_PI_2;
            gamma = 0.0;
        } else {
            let a_x = sqw - sqx + sqy - sqz;
            let a_y = 2.0 * (q.w * q.z - q.x * q.y);

            let g_x = sqw - sqx - sqy + sqz;
            let g_y = 2.0 * (q.w * q.y - q.x * q.z);

            let sin_beta = (2.0 * wxyz / unit_length).clamp(-1.0, 1.0);

            if g_x > 0.0 {
                alpha = a_y.atan2(a_x);
                beta = sin_beta.asin();
                gamma = g_y.atan2(g_x);
            } else {
                alpha = (-a_y).atan2(-a_x);
                beta = -sin_beta.asin();
                beta += if beta < 0.0 { PI } else { -PI };
                gamma = (-g_y).atan2(-g_x);
            }
        }

        if alpha < 0.0 {
            alpha += TAU;
        }

        Self {
            alpha: alpha.to_degrees(),
            beta: beta.to_degrees(),
            gamma: gamma.to_degrees(),
        }
    }

    /// Rotate by `angle_rad` about a canonical axis.
    ///
    /// Euler angles do not compose additively, so the rotation round-trips
    /// through the matrix representation.
    pub fn rotated(self, axis: Axis, angle_rad: f64) -> Self {
        let m = RotationMatrix::from_euler(&self).rotated(axis, angle_rad);
        Euler::from_rotation_matrix(&m)
    }
}
