/// Triangle meshes with per-vertex normals
use log::debug;
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::transform::Mat4;
use crate::vector::{flatten, from_flat, normalize, Vec3};

/// Axis-aligned bounds of a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Bounds of `points`, or `None` when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in points {
            // Each axis tracks min and max independently; one point can set
            // both on different axes.
            for axis in 0..3 {
                if p[axis] < bounds.min[axis] {
                    bounds.min[axis] = p[axis];
                }
                if p[axis] > bounds.max[axis] {
                    bounds.max[axis] = p[axis];
                }
            }
        }
        Some(bounds)
    }

    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Whether `p` lies inside the box when viewed from above (Y ignored).
    pub fn contains_xz(&self, p: &Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }
}

/// A 3D mesh: positions, one normal per position and triangle indices
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Build a mesh from parts that are already consistent.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        if positions.len() != normals.len() {
            return Err(Error::InvalidMesh(format!(
                "{} positions but {} normals",
                positions.len(),
                normals.len()
            )));
        }
        validate_indices(&indices, positions.len())?;
        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    /// Build a mesh and generate smooth normals.
    ///
    /// Every triangle's unit face normal is summed into each of its three
    /// vertices, then the sums are normalized. Vertices no triangle uses keep
    /// a zero normal.
    pub fn from_positions_and_indices(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        validate_indices(&indices, positions.len())?;

        let mut sums = vec![Vec3::zeros(); positions.len()];
        let mut referenced = vec![false; positions.len()];

        for (face, tri) in indices.chunks_exact(3).enumerate() {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let normal = face_normal(&positions[a], &positions[b], &positions[c])
                .map_err(|_| Error::degenerate(format!("triangle {} has zero area", face)))?;
            for i in [a, b, c] {
                sums[i] += normal;
                referenced[i] = true;
            }
        }

        let mut normals = Vec::with_capacity(sums.len());
        for (i, sum) in sums.iter().enumerate() {
            if referenced[i] {
                let normal = normalize(sum).map_err(|_| {
                    Error::degenerate(format!("face normals around vertex {} cancel out", i))
                })?;
                normals.push(normal);
            } else {
                normals.push(Vec3::zeros());
            }
        }

        debug!(
            "generated normals for {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );

        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    /// Axis-aligned cube centred on the origin with flat faces.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // (normal, u axis, v axis) per face; u x v points along the normal.
        let faces = [
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), Vec3::y(), Vec3::x()),
            (Vec3::y(), Vec3::z(), Vec3::x()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::x(), Vec3::y(), Vec3::z()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = normal * half;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push(center + u * (su * half) + v * (sv * half));
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn flat_positions(&self) -> Vec<f32> {
        flatten(&self.positions)
    }

    pub fn flat_normals(&self) -> Vec<f32> {
        flatten(&self.normals)
    }

    /// Replace every position from a flat `[x, y, z, ...]` array.
    ///
    /// The vertex count must stay the same so normals and indices still line
    /// up.
    pub fn set_positions_from_flat(&mut self, flat: &[f32]) -> Result<()> {
        let positions = from_flat(flat)?;
        if positions.len() != self.positions.len() {
            return Err(Error::InvalidMesh(format!(
                "replacement has {} positions, mesh has {}",
                positions.len(),
                self.positions.len()
            )));
        }
        self.positions = positions;
        Ok(())
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions)
    }

    /// Copy of the mesh with `model` applied.
    ///
    /// Normals go through the inverse-transpose so non-uniform scales keep
    /// them perpendicular to the surface.
    pub fn transformed(&self, model: &Mat4) -> Result<Self> {
        let linear = model.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .ok_or_else(|| Error::degenerate("model matrix is singular"))?
            .transpose();

        let positions = self
            .positions
            .iter()
            .map(|p| model.transform_point(&Point3::from(*p)).coords)
            .collect();
        let normals = self
            .normals
            .iter()
            .map(|n| {
                if *n == Vec3::zeros() {
                    Ok(*n)
                } else {
                    normalize(&(normal_matrix * n))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            positions,
            normals,
            indices: self.indices.clone(),
        })
    }
}

/// Unit normal of triangle `abc`, counter-clockwise winding facing the viewer.
pub fn face_normal(a: &Vec3, b: &Vec3, c: &Vec3) -> Result<Vec3> {
    normalize(&(b - a).cross(&(c - a)))
}

fn validate_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(Error::InvalidMesh(format!(
            "{} indices do not form whole triangles",
            indices.len()
        )));
    }
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::InvalidMesh(format!(
            "index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    fn quad() -> Mesh {
        // Unit square in the XZ plane, wound to face +Y.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        Mesh::from_positions_and_indices(positions, vec![0, 2, 1, 0, 3, 2]).unwrap()
    }

    #[test]
    fn test_flat_quad_normals_point_up() {
        let mesh = quad();
        assert_eq!(mesh.normals().len(), mesh.positions().len());
        for n in mesh.normals() {
            assert!((n - Vec3::y()).norm() < 1e-6);
        }
    }

    #[test]
    fn test_shared_vertex_normals_are_averaged() {
        // Two faces folded 90 degrees along the Z axis.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_positions_and_indices(positions, vec![0, 1, 2, 0, 3, 1]).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((mesh.normals()[0] - expected).norm() < 1e-6);
        assert!((mesh.normals()[1] - expected).norm() < 1e-6);
        assert!((mesh.normals()[2] - Vec3::y()).norm() < 1e-6);
        assert!((mesh.normals()[3] - Vec3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_is_rejected() {
        let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0];
        let result = Mesh::from_positions_and_indices(positions, vec![0, 1, 2]);
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_bad_indices_are_rejected() {
        let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::y()];
        assert!(matches!(
            Mesh::from_positions_and_indices(positions.clone(), vec![0, 1]),
            Err(Error::InvalidMesh(_))
        ));
        assert!(matches!(
            Mesh::from_positions_and_indices(positions, vec![0, 1, 3]),
            Err(Error::InvalidMesh(_))
        ));
    }

    #[test]
    fn test_unreferenced_vertex_keeps_zero_normal() {
        let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::z(), Vec3::new(5.0, 5.0, 5.0)];
        let mesh = Mesh::from_positions_and_indices(positions, vec![0, 2, 1]).unwrap();
        assert_eq!(mesh.normals()[3], Vec3::zeros());
    }

    #[test]
    fn test_bounding_box() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, -1.0, 3.0),
            Vec3::new(-1.0, 5.0, 0.0),
        ];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds.to_array(), [-1.0, -1.0, 0.0, 2.0, 5.0, 3.0]);
    }

    #[test]
    fn test_bounding_box_point_sets_min_and_max_on_different_axes() {
        // The second point is a new min on X and a new max on Y.
        let points = [Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 2.0, 1.0)];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds.to_array(), [0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_bounding_box_empty() {
        let mesh = Mesh::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_contains_xz_ignores_height() {
        let bounds = BoundingBox {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        assert!(bounds.contains_xz(&Vec3::new(0.5, 100.0, 0.5)));
        assert!(!bounds.contains_xz(&Vec3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn test_flat_buffers_and_replacement() {
        let mut mesh = quad();
        let flat = mesh.flat_positions();
        assert_eq!(flat.len(), 12);
        assert_eq!(mesh.flat_normals()[1], 1.0);

        let raised: Vec<f32> = flat
            .chunks(3)
            .flat_map(|c| [c[0], c[1] + 2.0, c[2]])
            .collect();
        mesh.set_positions_from_flat(&raised).unwrap();
        assert_eq!(mesh.positions()[2], Vec3::new(1.0, 2.0, 1.0));

        assert!(mesh.set_positions_from_flat(&raised[..9]).is_err());
    }

    #[test]
    fn test_cube_normals_face_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for tri in cube.indices().chunks(3) {
            let p = cube.positions();
            let [a, b, c] = [0, 1, 2].map(|i| p[tri[i] as usize]);
            let n = face_normal(&a, &b, &c).unwrap();
            assert!((n - cube.normals()[tri[0] as usize]).norm() < 1e-6);
            assert!(n.dot(&p[tri[0] as usize]) > 0.0);
        }
        assert_eq!(cube.bounding_box().unwrap().to_array(), [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_transformed_scales_and_moves() {
        let model = Transform::translate(10.0, 0.0, 0.0) * Transform::scale(2.0, 4.0, 2.0);
        let moved = quad().transformed(&model).unwrap();
        assert_eq!(moved.positions()[2], Vec3::new(12.0, 0.0, 2.0));
        assert!((moved.normals()[0] - Vec3::y()).norm() < 1e-6);
    }
}
