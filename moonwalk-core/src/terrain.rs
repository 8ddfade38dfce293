/// Heightfield terrain
use std::path::Path;

use image::DynamicImage;
use log::debug;

use crate::error::{Error, Result};
use crate::geometry::Mesh;
use crate::vector::Vec3;

/// Heightmap pixels are scaled by this when no other scale is given.
pub const DEFAULT_HEIGHT_SCALE: f32 = 0.25;

/// A `width` x `depth` grid of elevations, stored row by row
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    elevations: Vec<f32>,
    width: usize,
    depth: usize,
}

impl Terrain {
    pub fn new(elevations: Vec<f32>, width: usize, depth: usize) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(Error::InvalidGrid(format!("empty {}x{} grid", width, depth)));
        }
        if elevations.len() != width * depth {
            return Err(Error::InvalidGrid(format!(
                "{} samples for a {}x{} grid",
                elevations.len(),
                width,
                depth
            )));
        }
        Ok(Self {
            elevations,
            width,
            depth,
        })
    }

    /// Elevations from the red channel of an image, one sample per pixel.
    pub fn from_image(image: &DynamicImage, height_scale: f32) -> Result<Self> {
        let rgba = image.to_rgba8();
        let (width, depth) = rgba.dimensions();
        let elevations = rgba.pixels().map(|p| p[0] as f32 * height_scale).collect();
        Self::new(elevations, width as usize, depth as usize)
    }

    /// Decode a heightmap file.
    pub fn load(path: impl AsRef<Path>, height_scale: f32) -> Result<Self> {
        let image = image::open(path.as_ref())?;
        let terrain = Self::from_image(&image, height_scale)?;
        debug!(
            "loaded {}x{} heightmap from {}",
            terrain.width,
            terrain.depth,
            path.as_ref().display()
        );
        Ok(terrain)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn elevations(&self) -> &[f32] {
        &self.elevations
    }

    /// Elevation of the grid cell nearest `(x, z)`.
    pub fn get(&self, x: f32, z: f32) -> Result<f32> {
        let (col, row) = self.cell(x.round(), z.round(), x, z)?;
        Ok(self.sample(col, row))
    }

    /// Bilinear blend of the four samples around `(x, z)`.
    ///
    /// On the last row or column the missing neighbours repeat the edge.
    pub fn blerp(&self, x: f32, z: f32) -> Result<f32> {
        let (col, row) = self.cell(x.floor(), z.floor(), x, z)?;
        let fraction_x = x - col as f32;
        let fraction_z = z - row as f32;
        let next_col = (col + 1).min(self.width - 1);
        let next_row = (row + 1).min(self.depth - 1);

        let near = lerp(fraction_x, self.sample(col, row), self.sample(next_col, row));
        let far = lerp(fraction_x, self.sample(col, next_row), self.sample(next_col, next_row));
        Ok(lerp(fraction_z, near, far))
    }

    /// Nearest point of the grid's footprint.
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (
            x.clamp(0.0, (self.width - 1) as f32),
            z.clamp(0.0, (self.depth - 1) as f32),
        )
    }

    /// One vertex per sample, two triangles per grid square.
    pub fn to_mesh(&self) -> Result<Mesh> {
        let mut positions = Vec::with_capacity(self.width * self.depth);
        for z in 0..self.depth {
            for x in 0..self.width {
                positions.push(Vec3::new(x as f32, self.sample(x, z), z as f32));
            }
        }

        let w = self.width as u32;
        let quads = (self.width - 1) * (self.depth - 1);
        let mut indices = Vec::with_capacity(quads * 6);
        for z in 0..self.depth as u32 - 1 {
            let next_z = z + 1;
            for x in 0..w - 1 {
                let next_x = x + 1;
                indices.extend_from_slice(&[z * w + next_x, z * w + x, next_z * w + x]);
                indices.extend_from_slice(&[next_z * w + next_x, z * w + next_x, next_z * w + x]);
            }
        }

        debug!(
            "terrain mesh: {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );
        Mesh::from_positions_and_indices(positions, indices)
    }

    /// Texture coordinates `(x / width, z / depth)` in vertex order of
    /// [`Terrain::to_mesh`], flattened.
    pub fn tex_coords(&self) -> Vec<f32> {
        let mut coords = Vec::with_capacity(self.width * self.depth * 2);
        for z in 0..self.depth {
            for x in 0..self.width {
                coords.push(x as f32 / self.width as f32);
                coords.push(z as f32 / self.depth as f32);
            }
        }
        coords
    }

    fn sample(&self, col: usize, row: usize) -> f32 {
        self.elevations[row * self.width + col]
    }

    /// Grid cell for already-snapped coordinates, or an error naming the
    /// original query.
    fn cell(&self, snapped_x: f32, snapped_z: f32, x: f32, z: f32) -> Result<(usize, usize)> {
        let inside = |v: f32, size: usize| v >= 0.0 && v < size as f32;
        if inside(snapped_x, self.width) && inside(snapped_z, self.depth) {
            Ok((snapped_x as usize, snapped_z as usize))
        } else {
            Err(Error::OutOfBounds {
                x,
                z,
                width: self.width,
                depth: self.depth,
            })
        }
    }
}

/// Linear blend from `start` (t = 0) to `end` (t = 1).
pub fn lerp(t: f32, start: f32, end: f32) -> f32 {
    (1.0 - t) * start + t * end
}
