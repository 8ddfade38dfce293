/// Everything one walk across the terrain needs, in one place
use std::rc::Rc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::{Camera, TerrainCamera, TerrainFollow};
use crate::config::{SceneConfig, ScatterConfig};
use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Mesh};
use crate::obj::load_obj;
use crate::projection::Projection;
use crate::terrain::Terrain;
use crate::transform::{Mat4, Transform};
use crate::vector::Vec3;

/// Flat arrays in the layout vertex buffers take
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl From<&Mesh> for MeshBuffers {
    fn from(mesh: &Mesh) -> Self {
        Self {
            positions: mesh.flat_positions(),
            normals: mesh.flat_normals(),
            indices: mesh.indices().to_vec(),
        }
    }
}

/// A model copy placed in the world
#[derive(Debug, Clone)]
pub struct Placement {
    mesh: Mesh,
    bounds: BoundingBox,
}

impl Placement {
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}

pub struct Scene {
    config: SceneConfig,
    terrain: Rc<Terrain>,
    terrain_mesh: Mesh,
    player: TerrainCamera,
    light: Camera,
    projection: Projection,
    props: Vec<Placement>,
    collectibles: Vec<Placement>,
    collected: usize,
}

impl Scene {
    /// Assemble a scene from already loaded parts.
    ///
    /// The player starts over the middle of the terrain facing -Z.
    pub fn new(
        config: SceneConfig,
        terrain: Terrain,
        prop_model: &Mesh,
        collectible_model: &Mesh,
    ) -> Result<Self> {
        let terrain = Rc::new(terrain);
        let terrain_mesh = terrain.to_mesh()?;

        let start = Vec3::new(terrain.width() as f32 / 2.0, 0.0, terrain.depth() as f32 / 2.0);
        let follow = TerrainFollow::new(terrain.clone(), config.player.eye_level)
            .with_sampling(config.player.sampling);
        let player = Camera::with_ground(start, start - Vec3::z(), Vec3::y(), follow)?
            .with_settings(config.player.camera)?;

        let light = Camera::new(
            Vec3::from(config.light.position),
            Vec3::from(config.light.target),
            Vec3::y(),
        )?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let props = scatter(&terrain, prop_model, &config.props, &mut rng)?;
        let collectibles = scatter(&terrain, collectible_model, &config.collectibles, &mut rng)?;

        info!(
            "scene ready: {}x{} terrain, {} props, {} collectibles",
            terrain.width(),
            terrain.depth(),
            props.len(),
            collectibles.len()
        );

        Ok(Self {
            projection: config.projection,
            config,
            terrain,
            terrain_mesh,
            player,
            light,
            props,
            collectibles,
            collected: 0,
        })
    }

    /// Load the heightmap and models named by `config`.
    pub fn load(config: SceneConfig) -> Result<Self> {
        let heightmap = config
            .heightmap
            .as_ref()
            .ok_or_else(|| Error::InvalidGrid("no heightmap configured".to_string()))?;
        let terrain = Terrain::load(config.resolve(heightmap), config.height_scale)?;
        let prop_model = load_model(&config, &config.props)?;
        let collectible_model = load_model(&config, &config.collectibles)?;
        Self::new(config, terrain, &prop_model, &collectible_model)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn terrain_mesh(&self) -> &Mesh {
        &self.terrain_mesh
    }

    pub fn terrain_buffers(&self) -> MeshBuffers {
        MeshBuffers::from(&self.terrain_mesh)
    }

    pub fn player(&self) -> &TerrainCamera {
        &self.player
    }

    pub fn light(&self) -> &Camera {
        &self.light
    }

    pub fn props(&self) -> &[Placement] {
        &self.props
    }

    pub fn collectibles(&self) -> &[Placement] {
        &self.collectibles
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    /// One frame of movement. Axis values are usually -1, 0 or 1 (or a
    /// multiple for sprinting).
    ///
    /// Returns the collectible picked up at the new position, if any.
    pub fn step(&mut self, forward_axis: f32, strafe_axis: f32) -> Option<Placement> {
        let speed = self.config.player.movement_speed;
        if forward_axis != 0.0 {
            self.player.advance(speed * forward_axis);
        }
        if strafe_axis != 0.0 {
            self.player.strafe(speed * strafe_axis);
        }
        self.pick_up()
    }

    /// Turn the player by look deltas; positive deltas turn right and down.
    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let speed = self.config.player.rotation_speed;
        if let Err(e) = self.player.yaw(-yaw_delta * speed) {
            debug!("ignoring yaw input: {}", e);
        }
        if let Err(e) = self.player.pitch(-pitch_delta * speed) {
            debug!("ignoring pitch input: {}", e);
        }
    }

    /// Fit the projection to a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.projection = self.projection.with_aspect(width as f32 / height as f32);
    }

    pub fn clip_from_eye(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn eye_from_world(&self) -> Mat4 {
        self.player.eye_from_world()
    }

    /// Clip-from-world for rendering depths from the light.
    pub fn clip_from_light(&self) -> Mat4 {
        self.config.light.projection.matrix() * self.light.eye_from_world()
    }

    fn pick_up(&mut self) -> Option<Placement> {
        let position = self.player.position();
        let index = self
            .collectibles
            .iter()
            .position(|c| c.bounds.contains_xz(&position))?;
        self.collected += 1;
        debug!("picked up collectible {} at {:?}", index, position.as_slice());
        Some(self.collectibles.remove(index))
    }
}

fn load_model(config: &SceneConfig, scatter: &ScatterConfig) -> Result<Mesh> {
    match &scatter.model {
        Some(path) => load_obj(config.resolve(path)),
        None => Ok(Mesh::cube(1.0)),
    }
}

/// Drop `settings.count` scaled copies of `model` at random spots on the
/// terrain.
fn scatter(
    terrain: &Terrain,
    model: &Mesh,
    settings: &ScatterConfig,
    rng: &mut StdRng,
) -> Result<Vec<Placement>> {
    let max_x = (terrain.width() - 1) as f32;
    let max_z = (terrain.depth() - 1) as f32;
    let [low, high] = settings.lift;

    let mut placements = Vec::with_capacity(settings.count);
    for _ in 0..settings.count {
        let x = rng.gen_range(0.0..=max_x);
        let z = rng.gen_range(0.0..=max_z);
        let lift = if high > low { rng.gen_range(low..=high) } else { low };
        let ground = terrain.get(x, z)?;

        let model_matrix =
            Transform::translate(x, ground + lift, z) * Transform::uniform_scale(settings.size);
        let mesh = model.transformed(&model_matrix)?;
        let bounds = mesh.bounding_box().ok_or_else(|| {
            Error::InvalidMesh("cannot place a model with no vertices".to_string())
        })?;
        placements.push(Placement { mesh, bounds });
    }
    Ok(placements)
}
