/// Scene configuration, read from JSON
///
/// Every section has defaults, so a config file only needs the fields it
/// changes:
///
/// ```json
/// { "heightmap": "heightmap.png", "player": { "eye_level": 4.0 } }
/// ```
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::camera::{CameraSettings, GroundSampling};
use crate::error::Result;
use crate::projection::Projection;
use crate::terrain::DEFAULT_HEIGHT_SCALE;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Heightmap image, relative to the config file.
    pub heightmap: Option<PathBuf>,
    /// Elevation per unit of the heightmap's red channel.
    pub height_scale: f32,
    pub player: PlayerConfig,
    pub light: LightConfig,
    pub projection: Projection,
    pub props: ScatterConfig,
    pub collectibles: ScatterConfig,
    /// Seed for object placement.
    pub seed: u64,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub eye_level: f32,
    /// Distance per step per unit of movement input.
    pub movement_speed: f32,
    /// Degrees per unit of look input.
    pub rotation_speed: f32,
    pub sampling: GroundSampling,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub projection: Projection,
}

/// How many copies of a model to drop on the terrain, and how
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// OBJ model, relative to the config file. A unit cube stands in when
    /// unset.
    pub model: Option<PathBuf>,
    pub count: usize,
    /// Uniform scale applied to the model.
    pub size: f32,
    /// Height above the ground, picked uniformly from `[min, max]`.
    pub lift: [f32; 2],
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.player.camera.validate()?;
        Ok(config)
    }

    /// Read a config file; relative paths inside it resolve against its
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            heightmap: None,
            height_scale: DEFAULT_HEIGHT_SCALE,
            player: PlayerConfig::default(),
            light: LightConfig::default(),
            projection: Projection::default(),
            props: ScatterConfig {
                model: None,
                count: 50,
                size: 25.0,
                lift: [0.0, 0.0],
            },
            collectibles: ScatterConfig {
                model: None,
                count: 25,
                size: 5.0,
                lift: [2.0, 12.0],
            },
            seed: 0,
            base_dir: PathBuf::new(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            eye_level: 10.0,
            movement_speed: 0.5,
            rotation_speed: 0.5,
            sampling: GroundSampling::Nearest,
            camera: CameraSettings::default(),
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 0.0],
            target: [5.0, 5.0, 0.0],
            projection: Projection::default(),
        }
    }
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            model: None,
            count: 0,
            size: 1.0,
            lift: [0.0, 0.0],
        }
    }
}
