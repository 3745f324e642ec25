// attitude - orientation representations and conversions
//
// Three interchangeable representations of a device attitude:
//   - Euler angles (alpha/beta/gamma, degrees, ZXY intrinsic order)
//   - unit quaternions
//   - row-major 3x3 rotation matrices
//
// Conversions follow the mobile sensor convention: alpha is the heading
// about Z, beta the front-back tilt about X, gamma the left-right tilt
// about Y, composed as Rz(alpha) * Rx(beta) * Ry(gamma).

pub mod euler;
pub mod matrix;
pub mod quaternion;

pub use euler::Euler;
pub use matrix::RotationMatrix;
pub use quaternion::Quaternion;

/// Canonical rotation axes.
///
/// Axis-angle rotation is only supported about the device's principal
/// axes; encoding the axis as a variant keeps arbitrary 3-vectors out of
/// the rotation API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}
