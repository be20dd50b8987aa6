use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::math::{Color, Transform};
use crate::mesh::Curve;

/// Construction-time scene parameters. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub stars: StarConfig,
    pub tube: TubeConfig,
    pub light: LightConfig,
    pub grid: Option<GridConfig>,
    pub background: BackgroundConfig,
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    pub count: usize,
    pub half_extent: f32,
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub color: Color,
    /// Fixed seed for a reproducible scatter
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeConfig {
    pub curve: Curve,
    pub tubular_segments: u32,
    pub radius: f32,
    pub radial_segments: u32,
    pub closed: bool,
    /// Per-axis scale applied to the generated vertices
    pub post_scale: Vec3,
    pub color: Color,
    pub transform: Transform,
    pub rotation_delta: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub helper: bool,
    pub helper_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub color: Color,
    pub image: Option<PathBuf>,
}

/// One external model: where it comes from, where it goes, how it spins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub rotation_delta: Vec3,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Starfield".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 100.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 30.0),
            target: Vec3::ZERO,
        }
    }
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 500,
            half_extent: 50.0,
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
            color: Color::WHITE,
            seed: None,
        }
    }
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            curve: Curve::sinusoid(10.0),
            tubular_segments: 1,
            radius: 1.0,
            radial_segments: 50,
            closed: false,
            post_scale: Vec3::new(0.5, 1.0, 1.0),
            color: Color::from_hex(0xffccff),
            transform: Transform::IDENTITY,
            rotation_delta: Vec3::new(0.01, 0.005, 0.01),
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(25.0, 25.0, 25.0),
            helper: true,
            helper_size: 1.0,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            divisions: 50,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x0b1a2e),
            image: None,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            camera: CameraConfig::default(),
            stars: StarConfig::default(),
            tube: TubeConfig::default(),
            light: LightConfig::default(),
            grid: Some(GridConfig::default()),
            background: BackgroundConfig::default(),
            assets: vec![AssetConfig {
                name: "dvd".to_string(),
                path: PathBuf::from("models/dvd/scene.gltf"),
                transform: Transform::from_position(Vec3::new(0.0, 3.0, 0.0))
                    .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0))
                    .with_scale(Vec3::splat(5.0)),
                rotation_delta: Vec3::new(0.01, 0.05, 0.01),
            }],
        }
    }
}

impl SceneConfig {
    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that can't be expressed in the types
    pub fn validate(&self) -> SceneResult<()> {
        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(SceneError::Config(format!("camera fov must be in (0, 180), got {}", camera.fov)));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(SceneError::Config(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(SceneError::Config("viewport must be non-empty".into()));
        }
        if !(self.stars.half_extent.is_finite() && self.stars.half_extent >= 0.0) {
            return Err(SceneError::Config(format!(
                "star half extent must be non-negative, got {}",
                self.stars.half_extent
            )));
        }
        self.tube.curve.check().map_err(|e| SceneError::Config(e.to_string()))?;
        if self.tube.post_scale.cmpeq(Vec3::ZERO).any() {
            return Err(SceneError::Config("tube post scale must be non-zero on every axis".into()));
        }
        let mut names: Vec<&str> = self.assets.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SceneError::Config(format!("duplicate asset name {:?}", pair[0])));
        }
        Ok(())
    }
}
