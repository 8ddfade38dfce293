/// 4x4 transformation matrices
///
/// nalgebra stores matrices column-major, which is the layout shader uniforms
/// expect. `Matrix4::new` takes its arguments in row order, so the factories
/// below read the way the matrices are written on paper.
use nalgebra::{Matrix4, Unit};

use crate::error::{Error, Result};
use crate::vector::{normalize, Vec3, Vec4};

pub type Mat4 = Matrix4<f32>;

/// Transform builder for 3D transformations. Angles are in degrees.
pub struct Transform;

impl Transform {
    /// The all-zero matrix; what a matrix is before a factory fills it in.
    pub fn zero() -> Mat4 {
        Mat4::zeros()
    }

    pub fn identity() -> Mat4 {
        Mat4::identity()
    }

    pub fn uniform_scale(factor: f32) -> Mat4 {
        Self::scale(factor, factor, factor)
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4::new(
            sx, 0.0, 0.0, 0.0,
            0.0, sy, 0.0, 0.0,
            0.0, 0.0, sz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new(
            1.0, 0.0, 0.0, x,
            0.0, 1.0, 0.0, y,
            0.0, 0.0, 1.0, z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotate_x(degrees: f32) -> Mat4 {
        let (s, c) = degrees.to_radians().sin_cos();
        Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c, -s, 0.0,
            0.0, s, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotate_y(degrees: f32) -> Mat4 {
        let (s, c) = degrees.to_radians().sin_cos();
        Mat4::new(
            c, 0.0, s, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -s, 0.0, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotate_z(degrees: f32) -> Mat4 {
        let (s, c) = degrees.to_radians().sin_cos();
        Mat4::new(
            c, -s, 0.0, 0.0,
            s, c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about an arbitrary unit axis (Rodrigues' formula).
    pub fn rotate_around_axis(axis: &Unit<Vec3>, degrees: f32) -> Mat4 {
        let (s, c) = degrees.to_radians().sin_cos();
        let d = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);
        Mat4::new(
            d * x * x + c, d * x * y - s * z, d * x * z + s * y, 0.0,
            d * y * x + s * z, d * y * y + c, d * y * z - s * x, 0.0,
            d * z * x - s * y, d * z * y + s * x, d * z * z + c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Right and up vectors of a view basis looking along `forward`.
    ///
    /// Fails when `forward` is zero or parallel to `world_up`, since the
    /// right vector is undefined there.
    pub fn view_basis(forward: &Vec3, world_up: &Vec3) -> Result<(Vec3, Vec3)> {
        let right = normalize(&forward.cross(world_up)).map_err(|_| {
            Error::degenerate(format!(
                "view direction {:?} is parallel to up {:?}",
                forward.as_slice(),
                world_up.as_slice()
            ))
        })?;
        let up = normalize(&right.cross(forward))?;
        Ok((right, up))
    }

    /// Eye-from-world matrix for an orthonormal basis placed at `eye`.
    ///
    /// Rotation rows are `right`, `up` and `-forward`; the result is that
    /// rotation times a translation by `-eye`.
    pub fn view(eye: &Vec3, forward: &Vec3, right: &Vec3, up: &Vec3) -> Mat4 {
        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            up.x, up.y, up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        Self::multiply(&rotation, &Self::translate(-eye.x, -eye.y, -eye.z))
    }

    /// View matrix from `eye` toward `target`, built the same way a camera
    /// reorients.
    pub fn look_at(eye: &Vec3, target: &Vec3, world_up: &Vec3) -> Result<Mat4> {
        let forward = normalize(&(target - eye))?;
        let (right, up) = Self::view_basis(&forward, world_up)?;
        Ok(Self::view(eye, &forward, &right, &up))
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new(
            2.0 / (right - left), 0.0, 0.0, -(right + left) / (right - left),
            0.0, 2.0 / (top - bottom), 0.0, -(top + bottom) / (top - bottom),
            0.0, 0.0, 2.0 / (near - far), (near + far) / (near - far),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Orthographic box centred on the view axis.
    pub fn symmetric_orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4 {
        Self::orthographic(-half_width, half_width, -half_height, half_height, near, far)
    }

    /// Perspective projection from a vertical field of view.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let top = (fov_y_degrees.to_radians() / 2.0).tan() * near;
        let right = aspect * top;
        Mat4::new(
            near / right, 0.0, 0.0, 0.0,
            0.0, near / top, 0.0, 0.0,
            0.0, 0.0, (near + far) / (near - far), 2.0 * near * far / (near - far),
            0.0, 0.0, -1.0, 0.0,
        )
    }

    pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
        a * b
    }

    /// `m * v` with `v` as a column vector.
    pub fn multiply_vector(m: &Mat4, v: &Vec4) -> Vec4 {
        m * v
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(model: &Mat4, view: &Mat4, projection: &Mat4) -> Mat4 {
        projection * view * model
    }

    /// The 16 cells in column-major order, ready for a uniform upload.
    pub fn to_buffer(m: &Mat4) -> [f32; 16] {
        let mut buffer = [0.0; 16];
        buffer.copy_from_slice(m.as_slice());
        buffer
    }
}
