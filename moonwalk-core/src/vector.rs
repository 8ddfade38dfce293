/// Vector aliases and the helpers nalgebra doesn't spell the way we need
use nalgebra::{Vector3, Vector4};

use crate::error::{Error, Result};

pub type Vec3 = Vector3<f32>;
pub type Vec4 = Vector4<f32>;

/// Magnitudes below this are treated as zero when normalizing.
pub const EPSILON: f32 = 1e-6;

/// Unit vector in the direction of `v`.
///
/// A zero-length input has no direction, so this fails instead of handing
/// back NaNs.
pub fn normalize(v: &Vec3) -> Result<Vec3> {
    v.try_normalize(EPSILON).ok_or_else(|| {
        Error::degenerate(format!("cannot normalize zero-length vector {:?}", v.as_slice()))
    })
}

/// Lift a position into homogeneous space (w = 1).
pub fn point(v: &Vec3) -> Vec4 {
    v.push(1.0)
}

/// Lift a direction into homogeneous space (w = 0), so translation ignores it.
pub fn direction(v: &Vec3) -> Vec4 {
    v.push(0.0)
}

/// Drop the homogeneous coordinate.
pub fn to_vector3(v: &Vec4) -> Vec3 {
    v.xyz()
}

/// Pack vectors into `[x0, y0, z0, x1, ...]` for buffer upload.
pub fn flatten(vectors: &[Vec3]) -> Vec<f32> {
    let mut flat = Vec::with_capacity(vectors.len() * 3);
    for v in vectors {
        flat.extend_from_slice(v.as_slice());
    }
    flat
}

/// Inverse of [`flatten`].
pub fn from_flat(flat: &[f32]) -> Result<Vec<Vec3>> {
    if flat.len() % 3 != 0 {
        return Err(Error::InvalidMesh(format!(
            "flat array of length {} is not a multiple of 3",
            flat.len()
        )));
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_gives_unit_length() {
        let samples = [
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(-1.0, 2.0, -7.5),
            Vec3::new(0.001, 0.0, 0.0),
        ];
        for v in samples {
            let n = normalize(&v).unwrap();
            assert!((n.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        let result = normalize(&Vec3::zeros());
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_cross_anticommutes_and_dot_commutes() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(-4.0, 0.5, 2.0);
        assert!((a.cross(&b) + b.cross(&a)).norm() < 1e-6);
        assert!((a.dot(&b) - b.dot(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_point_and_direction_homogeneous_coordinate() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(point(&v).w, 1.0);
        assert_eq!(direction(&v).w, 0.0);
        assert_eq!(to_vector3(&point(&v)), v);
    }

    #[test]
    fn test_flatten_layout() {
        let flat = flatten(&[Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
        assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(from_flat(&flat).unwrap().len(), 2);
        assert!(from_flat(&[1.0, 2.0]).is_err());
    }
}
