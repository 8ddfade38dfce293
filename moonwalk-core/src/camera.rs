/// First-person cameras
///
/// A camera keeps a position, a unit forward vector and a fixed world up.
/// Whatever moves it also runs its ground constraint, which is how the
/// terrain-following camera keeps its feet on the heightfield.
use std::rc::Rc;

use log::{debug, warn};
use nalgebra::Unit;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::terrain::Terrain;
use crate::transform::{Mat4, Transform};
use crate::vector::{direction, normalize, Vec3};

/// Decides where a camera may stand after it moves
pub trait GroundConstraint {
    fn constrain(&self, position: Vec3) -> Vec3;
}

/// Fly anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeMovement;

impl GroundConstraint for FreeMovement {
    fn constrain(&self, position: Vec3) -> Vec3 {
        position
    }
}

/// How a terrain-following camera reads the ground under it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundSampling {
    /// Height of the nearest grid sample.
    #[default]
    Nearest,
    /// Bilinear blend of the surrounding samples.
    Bilinear,
}

/// Keep the camera over the terrain at a fixed height above the ground.
#[derive(Debug, Clone)]
pub struct TerrainFollow {
    terrain: Rc<Terrain>,
    eye_level: f32,
    sampling: GroundSampling,
}

impl TerrainFollow {
    pub fn new(terrain: Rc<Terrain>, eye_level: f32) -> Self {
        Self {
            terrain,
            eye_level,
            sampling: GroundSampling::Nearest,
        }
    }

    pub fn with_sampling(mut self, sampling: GroundSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn eye_level(&self) -> f32 {
        self.eye_level
    }
}

impl GroundConstraint for TerrainFollow {
    fn constrain(&self, position: Vec3) -> Vec3 {
        let (x, z) = self.terrain.clamp(position.x, position.z);
        let ground = match self.sampling {
            GroundSampling::Nearest => self.terrain.get(x, z),
            GroundSampling::Bilinear => self.terrain.blerp(x, z),
        };
        // Only a non-finite position gets past the clamp.
        match ground {
            Ok(ground) => Vec3::new(x, ground + self.eye_level, z),
            Err(e) => {
                debug!("ground lookup failed: {}", e);
                position
            }
        }
    }
}

/// Orientation limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Largest angle in degrees `forward` may tilt above or below the
    /// horizon, strictly between 0 and 90. `None` leaves pitch unclamped.
    pub max_pitch: Option<f32>,
}

impl CameraSettings {
    pub fn validate(&self) -> Result<()> {
        match self.max_pitch {
            Some(limit) if !(limit > 0.0 && limit < 90.0) => Err(Error::InvalidSettings(format!(
                "max_pitch must be between 0 and 90 degrees, got {}",
                limit
            ))),
            _ => Ok(()),
        }
    }
}

/// A camera looking along `forward` from `position`
#[derive(Debug, Clone)]
pub struct Camera<G = FreeMovement> {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    world_up: Unit<Vec3>,
    settings: CameraSettings,
    ground: G,
}

pub type TerrainCamera = Camera<TerrainFollow>;

impl Camera<FreeMovement> {
    pub fn new(position: Vec3, target: Vec3, world_up: Vec3) -> Result<Self> {
        Self::with_ground(position, target, world_up, FreeMovement)
    }
}

impl TerrainCamera {
    /// Camera that follows `terrain` at `eye_level` above the ground.
    pub fn on_terrain(
        position: Vec3,
        target: Vec3,
        world_up: Vec3,
        terrain: Rc<Terrain>,
        eye_level: f32,
    ) -> Result<Self> {
        Self::with_ground(position, target, world_up, TerrainFollow::new(terrain, eye_level))
    }
}

impl<G: GroundConstraint> Camera<G> {
    /// Camera at `position` facing `target`.
    ///
    /// The ground constraint is applied straight away, before the first
    /// view matrix is read.
    pub fn with_ground(position: Vec3, target: Vec3, world_up: Vec3, ground: G) -> Result<Self> {
        if !is_finite(&position) {
            return Err(Error::degenerate(format!(
                "camera position {:?} is not finite",
                position.as_slice()
            )));
        }
        let world_up = Unit::new_unchecked(normalize(&world_up)?);
        let forward = normalize(&(target - position))?;
        let (right, _) = Transform::view_basis(&forward, &world_up)?;
        Ok(Self {
            position: ground.constrain(position),
            forward,
            right,
            world_up,
            settings: CameraSettings::default(),
            ground,
        })
    }

    pub fn with_settings(mut self, settings: CameraSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.right.cross(&self.forward)
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up.into_inner()
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn ground(&self) -> &G {
        &self.ground
    }

    /// The eye-from-world transform for the current position and basis.
    pub fn eye_from_world(&self) -> Mat4 {
        Transform::view(&self.position, &self.forward, &self.right, &self.up())
    }

    /// Angle of `forward` above the horizon, in degrees.
    pub fn elevation(&self) -> f32 {
        self.forward.dot(&*self.world_up).clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Move to `position`, subject to the ground constraint. Non-finite
    /// positions are ignored.
    pub fn set_position(&mut self, position: Vec3) {
        if !is_finite(&position) {
            warn!("ignoring non-finite camera position {:?}", position.as_slice());
            return;
        }
        self.position = self.ground.constrain(position);
    }

    /// Turn to face `target`.
    pub fn look_at(&mut self, target: Vec3) -> Result<()> {
        let forward = normalize(&(target - self.position))?;
        self.reorient(forward)
    }

    /// Move along the view direction.
    pub fn advance(&mut self, distance: f32) {
        self.set_position(self.position + self.forward * distance);
    }

    /// Move sideways.
    pub fn strafe(&mut self, distance: f32) {
        self.set_position(self.position + self.right * distance);
    }

    /// Move along world up.
    pub fn elevate(&mut self, distance: f32) {
        self.set_position(self.position + self.world_up.into_inner() * distance);
    }

    /// Turn left (positive) or right about world up.
    pub fn yaw(&mut self, degrees: f32) -> Result<()> {
        let forward = self.rotated(&self.world_up, degrees);
        self.reorient(forward)
    }

    /// Tilt up (positive) or down about the camera's right axis.
    ///
    /// With `max_pitch` set the tilt stops at the limit. Without it, a tilt
    /// that would look straight along world up is refused and the camera
    /// keeps its previous orientation.
    pub fn pitch(&mut self, degrees: f32) -> Result<()> {
        let degrees = match self.settings.max_pitch {
            Some(limit) => {
                let current = self.elevation();
                (current + degrees).clamp(-limit, limit) - current
            }
            None => degrees,
        };
        let right = Unit::new_unchecked(self.right);
        let forward = self.rotated(&right, degrees);
        self.reorient(forward)
    }

    fn rotated(&self, axis: &Unit<Vec3>, degrees: f32) -> Vec3 {
        (Transform::rotate_around_axis(axis, degrees) * direction(&self.forward)).xyz()
    }

    /// Adopt a new forward vector and rebuild `right` from it.
    ///
    /// State is only replaced once the new basis is known to be valid.
    fn reorient(&mut self, forward: Vec3) -> Result<()> {
        let forward = normalize(&forward)?;
        let (right, _) = Transform::view_basis(&forward, &self.world_up).map_err(|_| {
            Error::degenerate(format!(
                "camera would look along world up {:?}",
                self.world_up.as_slice()
            ))
        })?;
        self.forward = forward;
        self.right = right;
        Ok(())
    }
}

fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::point;

    fn assert_basis(camera: &Camera<impl GroundConstraint>) {
        assert!((camera.forward().norm() - 1.0).abs() < 1e-5);
        assert!((camera.right().norm() - 1.0).abs() < 1e-5);
        assert!(camera.forward().dot(&camera.right()).abs() < 1e-5);
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y()).unwrap()
    }

    fn flat_terrain() -> Rc<Terrain> {
        // 4x3 grid where elevation = x + 10 * z
        let elevations = (0..3)
            .flat_map(|z| (0..4).map(move |x| (x + 10 * z) as f32))
            .collect();
        Rc::new(Terrain::new(elevations, 4, 3).unwrap())
    }

    #[test]
    fn test_camera_creation() {
        let camera = camera();
        assert!((camera.forward() - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
        assert!((camera.right() - Vec3::x()).norm() < 1e-6);
        assert!((camera.up() - Vec3::y()).norm() < 1e-6);
        assert_basis(&camera);
    }

    #[test]
    fn test_creation_looking_straight_up_fails() {
        let result = Camera::new(Vec3::zeros(), Vec3::new(0.0, 3.0, 0.0), Vec3::y());
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
        assert!(Camera::new(Vec3::zeros(), Vec3::zeros(), Vec3::y()).is_err());
    }

    #[test]
    fn test_view_matrix_matches_look_at() {
        let camera = camera();
        let expected =
            Transform::look_at(&Vec3::new(0.0, 0.0, 5.0), &Vec3::zeros(), &Vec3::y()).unwrap();
        assert!((camera.eye_from_world() - expected).norm() < 1e-6);
        let eye = camera.eye_from_world() * point(&camera.position());
        assert!(eye.xyz().norm() < 1e-6);
    }

    #[test]
    fn test_view_matrix_is_stable_between_reads() {
        let mut camera = camera();
        camera.yaw(17.0).unwrap();
        assert_eq!(camera.eye_from_world(), camera.eye_from_world());
    }

    #[test]
    fn test_advance_and_strafe() {
        let mut camera = camera();
        camera.advance(2.0);
        assert!((camera.position() - Vec3::new(0.0, 0.0, 3.0)).norm() < 1e-6);
        camera.strafe(-1.5);
        assert!((camera.position() - Vec3::new(-1.5, 0.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_elevate_moves_along_world_up() {
        let mut camera = camera();
        camera.elevate(2.5);
        assert!((camera.position() - Vec3::new(0.0, 2.5, 5.0)).norm() < 1e-6);
        camera.elevate(-1.0);
        assert!((camera.position() - Vec3::new(0.0, 1.5, 5.0)).norm() < 1e-6);
    }

    #[test]
    fn test_yaw_turns_left() {
        let mut camera = camera();
        camera.yaw(90.0).unwrap();
        assert!((camera.forward() - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
        assert!((camera.right() - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
        assert_basis(&camera);
    }

    #[test]
    fn test_pitch_tilts_up() {
        let mut camera = camera();
        camera.pitch(30.0).unwrap();
        assert!((camera.elevation() - 30.0).abs() < 1e-3);
        assert!((camera.right() - Vec3::x()).norm() < 1e-5);
        assert_basis(&camera);
    }

    #[test]
    fn test_pitch_clamp() {
        let mut camera = camera()
            .with_settings(CameraSettings {
                max_pitch: Some(15.0),
            })
            .unwrap();
        camera.pitch(10.0).unwrap();
        camera.pitch(10.0).unwrap();
        assert!((camera.elevation() - 15.0).abs() < 1e-3);
        camera.pitch(-50.0).unwrap();
        assert!((camera.elevation() + 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_limit_outside_range_is_rejected() {
        for limit in [-10.0, 0.0, 90.0, 120.0, f32::NAN] {
            let result = camera().with_settings(CameraSettings {
                max_pitch: Some(limit),
            });
            assert!(matches!(result, Err(Error::InvalidSettings(_))), "limit {}", limit);
        }
    }

    #[test]
    fn test_clamped_pitch_never_goes_over_the_pole() {
        let mut camera = camera()
            .with_settings(CameraSettings {
                max_pitch: Some(89.0),
            })
            .unwrap();
        camera.pitch(100.0).unwrap();
        assert!((camera.elevation() - 89.0).abs() < 1e-2);
        // Still facing -Z, just tilted up.
        assert!(camera.forward().z < 0.0);
        assert!(camera.forward().x.abs() < 1e-5);
        assert_basis(&camera);
    }

    #[test]
    fn test_non_finite_moves_are_ignored() {
        let mut camera = camera();
        camera.advance(f32::NAN);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 5.0));
        assert!(Camera::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::zeros(), Vec3::y()).is_err());

        let follow = TerrainFollow::new(flat_terrain(), 1.0);
        let position = Vec3::new(f32::NAN, 3.0, 1.0);
        assert!(follow.constrain(position).x.is_nan());
    }

    #[test]
    fn test_unclamped_pitch_to_the_pole_is_refused() {
        let mut camera = camera();
        let before = camera.eye_from_world();
        assert!(matches!(camera.pitch(90.0), Err(Error::DegenerateGeometry(_))));
        assert_eq!(camera.eye_from_world(), before);
    }

    #[test]
    fn test_look_at_turns_camera() {
        let mut camera = camera();
        camera.look_at(Vec3::new(5.0, 0.0, 5.0)).unwrap();
        assert!((camera.forward() - Vec3::x()).norm() < 1e-6);
        assert_basis(&camera);
    }

    #[test]
    fn test_terrain_camera_clamps_on_construction() {
        let terrain = flat_terrain();
        let camera = TerrainCamera::on_terrain(
            Vec3::new(4.0, 0.0, 1.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::y(),
            terrain.clone(),
            2.0,
        )
        .unwrap();
        let position = camera.position();
        assert_eq!(position.x, 3.0);
        assert_eq!(position.z, 1.0);
        assert_eq!(position.y, terrain.get(3.0, 1.0).unwrap() + 2.0);
    }

    #[test]
    fn test_terrain_camera_follows_ground() {
        let terrain = flat_terrain();
        let mut camera = TerrainCamera::on_terrain(
            Vec3::new(1.0, 50.0, 1.0),
            Vec3::new(1.0, 50.0, 10.0),
            Vec3::y(),
            terrain,
            1.0,
        )
        .unwrap();
        assert_eq!(camera.position().y, 12.0);

        camera.advance(1.0);
        assert_eq!(camera.position(), Vec3::new(1.0, 22.0, 2.0));

        // Walking off the far edge stops at the last row.
        camera.advance(10.0);
        assert_eq!(camera.position(), Vec3::new(1.0, 22.0, 2.0));

        // Strafing is clamped too (right is -x when facing +z).
        camera.strafe(5.0);
        assert_eq!(camera.position(), Vec3::new(0.0, 21.0, 2.0));

        // Elevating can't lift the camera off the ground.
        camera.elevate(4.0);
        assert_eq!(camera.position().y, 21.0);
    }

    #[test]
    fn test_bilinear_sampling() {
        let terrain = flat_terrain();
        let follow =
            TerrainFollow::new(terrain.clone(), 0.0).with_sampling(GroundSampling::Bilinear);
        let grounded = follow.constrain(Vec3::new(1.5, 0.0, 0.5));
        assert!((grounded.y - 6.5).abs() < 1e-5);
        let nearest = TerrainFollow::new(terrain, 0.0);
        assert_eq!(nearest.constrain(Vec3::new(1.4, 0.0, 0.4)).y, 1.0);
    }
}
