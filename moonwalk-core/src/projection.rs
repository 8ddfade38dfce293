/// Clip-from-eye projections
use serde::Deserialize;

use crate::transform::{Mat4, Transform};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::Perspective {
            fov_y,
            aspect,
            near,
            far,
        }
    }

    /// Create the projection matrix
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Transform::perspective(fov_y, aspect, near, far),
            Self::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => Transform::symmetric_orthographic(half_width, half_height, near, far),
        }
    }

    /// Same projection fitted to a viewport with a new aspect ratio.
    ///
    /// An orthographic box keeps its height and widens to match.
    pub fn with_aspect(self, aspect: f32) -> Self {
        match self {
            Self::Perspective { fov_y, near, far, .. } => Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            },
            Self::Orthographic {
                half_height,
                near,
                far,
                ..
            } => Self::Orthographic {
                half_width: half_height * aspect,
                half_height,
                near,
                far,
            },
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::perspective(45.0, 1.0, 0.1, 1000.0)
    }
}
