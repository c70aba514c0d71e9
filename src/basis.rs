//! Conversion between the host basis (Z-up, -Y-forward) and the renderer
//! basis (Y-up, Z-forward).
//!
//! The change of basis is the fixed rotation `(x, y, z) -> (x, z, -y)`. It
//! has no scale, so the inverse is its transpose and every conversion here
//! is exact up to floating point rounding.

use glam::{Mat3, Mat4, Vec3};

/// Maps host coordinates onto renderer coordinates.
pub const HOST_TO_RENDER: Mat3 = Mat3::from_cols(Vec3::X, Vec3::NEG_Z, Vec3::Y);

/// Maps renderer coordinates onto host coordinates.
pub const RENDER_TO_HOST: Mat3 = Mat3::from_cols(Vec3::X, Vec3::Z, Vec3::NEG_Y);

/// Converts a host position into the renderer basis.
pub fn to_render_basis(position: Vec3) -> Vec3 {
    Mat4::from_mat3(HOST_TO_RENDER).transform_point3(position)
}

/// Converts a renderer position back into the host basis.
pub fn to_host_basis(position: Vec3) -> Vec3 {
    Mat4::from_mat3(RENDER_TO_HOST).transform_point3(position)
}

/// Re-expresses a host transform in the renderer basis (`C * M * C^-1`).
pub fn to_render_basis_mat(matrix: Mat4) -> Mat4 {
    Mat4::from_mat3(HOST_TO_RENDER) * matrix * Mat4::from_mat3(RENDER_TO_HOST)
}

/// Inverse of [`to_render_basis_mat`].
pub fn to_host_basis_mat(matrix: Mat4) -> Mat4 {
    Mat4::from_mat3(RENDER_TO_HOST) * matrix * Mat4::from_mat3(HOST_TO_RENDER)
}

/// Camera orientation in the renderer basis.
///
/// Camera-local axes follow the same convention on both sides (looking down
/// -Z with +Y up), so only the world side of the rotation changes basis:
/// `to_render_basis_mat(R) * C`, which reduces to `C * R`.
pub fn camera_to_render_basis(rotation: Mat3) -> Mat3 {
    HOST_TO_RENDER * rotation
}

/// Inverse of [`camera_to_render_basis`].
pub fn camera_to_host_basis(rotation: Mat3) -> Mat3 {
    RENDER_TO_HOST * rotation
}

/// Flattens a rotation into the document's row-major layout.
///
/// Row `i` of the output holds row `i` of the column-vector rotation
/// (`world = R * local`). [`matrix_from_rows`] is the exact inverse; nothing
/// else in the crate may read or write the `matrix` field.
pub fn matrix_to_rows(rotation: Mat3) -> [f32; 9] {
    rotation.transpose().to_cols_array()
}

/// Rebuilds a rotation from the document's row-major layout.
pub fn matrix_from_rows(rows: &[f32; 9]) -> Mat3 {
    Mat3::from_cols_array(rows).transpose()
}
