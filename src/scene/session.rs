use std::sync::Arc;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::graph::{NodeHandle, SceneGraph};
use super::node::{Backdrop, Helper, NodeContent, PointLight};
use crate::animation::AnimationSet;
use crate::camera::CameraState;
use crate::config::{BackgroundConfig, SceneConfig};
use crate::error::SceneResult;
use crate::math::Transform;
use crate::mesh::{build_sphere_mesh, build_tube_mesh, random_point_in_cube, Material};

pub const TUBE_NODE: &str = "tube";
pub const LIGHT_NODE: &str = "point-light";
pub const STAR_NODE: &str = "star";

/// Everything the animation loop mutates: one per process, built at startup.
#[derive(Debug)]
pub struct SceneSession {
    pub graph: SceneGraph,
    pub camera: CameraState,
    pub animations: AnimationSet,
    tube: NodeHandle,
    light: NodeHandle,
    stars: Vec<NodeHandle>,
}

impl SceneSession {
    /// Build the static part of the scene. Star placement uses the configured
    /// seed when present, otherwise OS entropy.
    pub fn build(config: &SceneConfig) -> SceneResult<Self> {
        let mut rng = match config.stars.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::build_with_rng(config, &mut rng)
    }

    pub fn build_with_rng<R: Rng + ?Sized>(config: &SceneConfig, rng: &mut R) -> SceneResult<Self> {
        config.validate()?;

        let mut graph = SceneGraph::new();
        let mut animations = AnimationSet::new();
        let root = graph.root();

        let tube_config = &config.tube;
        let mut tube_geometry = build_tube_mesh(
            &tube_config.curve,
            tube_config.tubular_segments,
            tube_config.radius,
            tube_config.radial_segments,
            tube_config.closed,
        )?;
        tube_geometry.scale(tube_config.post_scale);
        let tube = graph.create_node(
            root,
            TUBE_NODE,
            tube_config.transform,
            NodeContent::mesh(tube_geometry, Material::standard(tube_config.color)),
        )?;
        animations.bind(TUBE_NODE, tube);
        if tube_config.rotation_delta != glam::Vec3::ZERO {
            animations.add_rule(TUBE_NODE, tube_config.rotation_delta);
        }

        let light_config = &config.light;
        let light_transform = Transform::from_position(light_config.position);
        let light = graph.create_node(
            root,
            LIGHT_NODE,
            light_transform,
            NodeContent::Light(PointLight {
                color: light_config.color,
                intensity: light_config.intensity,
            }),
        )?;
        if light_config.helper {
            graph.create_node(
                root,
                "point-light-helper",
                light_transform,
                NodeContent::Helper(Helper::PointLight {
                    size: light_config.helper_size,
                }),
            )?;
        }
        if let Some(grid) = &config.grid {
            graph.create_node(
                root,
                "grid-helper",
                Transform::IDENTITY,
                NodeContent::Helper(Helper::Grid {
                    size: grid.size,
                    divisions: grid.divisions,
                }),
            )?;
        }

        let star_config = &config.stars;
        let mut stars = Vec::with_capacity(star_config.count);
        for _ in 0..star_config.count {
            let geometry = build_sphere_mesh(
                star_config.radius,
                star_config.width_segments,
                star_config.height_segments,
            )?;
            let position = random_point_in_cube(rng, star_config.half_extent);
            stars.push(graph.create_node(
                root,
                STAR_NODE,
                Transform::from_position(position),
                NodeContent::mesh(geometry, Material::standard(star_config.color)),
            )?);
        }

        graph.set_backdrop(load_backdrop(&config.background));

        let camera = CameraState::looking_at(config.camera.position, config.camera.target);

        info!(
            "Scene built: {} nodes ({} stars), {} animation rules",
            graph.len(),
            stars.len(),
            animations.rules().len()
        );

        Ok(Self {
            graph,
            camera,
            animations,
            tube,
            light,
            stars,
        })
    }

    pub fn tube(&self) -> NodeHandle {
        self.tube
    }

    pub fn light(&self) -> NodeHandle {
        self.light
    }

    pub fn stars(&self) -> &[NodeHandle] {
        &self.stars
    }
}

/// Decode the background image if one is configured; any failure falls back
/// to the plain colour.
fn load_backdrop(config: &BackgroundConfig) -> Backdrop {
    let Some(path) = &config.image else {
        return Backdrop::Color(config.color);
    };
    match image::open(path) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            info!("Background image {:?} loaded ({}x{})", path, rgba.width(), rgba.height());
            Backdrop::Image(Arc::new(rgba))
        }
        Err(e) => {
            warn!("Failed to load background image {:?}: {}; using colour", path, e);
            Backdrop::Color(config.color)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::mesh::Curve;
    use glam::Vec3;

    fn bare_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.stars.count = 0;
        config.tube.tubular_segments = 20;
        config.light.helper = false;
        config.grid = None;
        config.assets.clear();
        config
    }

    #[test]
    fn test_bare_scene_has_tube_and_light_only() {
        let session = SceneSession::build_with_rng(&bare_config(), &mut StdRng::seed_from_u64(0)).unwrap();
        let names: Vec<&str> = session.graph.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec![TUBE_NODE, LIGHT_NODE]);
        assert!(session.graph.get(session.tube()).unwrap().geometry().is_some());
        assert!(session.graph.get(session.light()).unwrap().light().is_some());
    }

    #[test]
    fn test_tube_is_post_scaled_on_x() {
        let session = SceneSession::build_with_rng(&bare_config(), &mut StdRng::seed_from_u64(0)).unwrap();
        let geometry = session.graph.get(session.tube()).unwrap().geometry().unwrap();
        let (min, max) = geometry.bounds().unwrap();
        // curve spans x in [-15, 15] at scale 10, halved, plus the radius
        assert!(max.x <= 7.5 + 0.5 + 1e-3);
        assert!(min.x >= -7.5 - 0.5 - 1e-3);
        assert!(max.y > 9.0);
    }

    #[test]
    fn test_stars_scattered_inside_cube() {
        let mut config = bare_config();
        config.stars.count = 500;
        let session = SceneSession::build_with_rng(&config, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(session.stars().len(), 500);
        let star_nodes: Vec<_> = session
            .graph
            .nodes()
            .filter(|(_, node)| node.name == STAR_NODE)
            .collect();
        assert_eq!(star_nodes.len(), 500);
        for (_, node) in star_nodes {
            assert!(node.transform.position.abs().max_element() <= 50.0);
            assert!(node.geometry().is_some());
        }
    }

    #[test]
    fn test_helpers_are_added_when_enabled() {
        let mut config = bare_config();
        config.light.helper = true;
        config.grid = Some(GridConfig::default());
        let session = SceneSession::build_with_rng(&config, &mut StdRng::seed_from_u64(0)).unwrap();
        let helpers = session
            .graph
            .nodes()
            .filter(|(_, node)| matches!(node.content, NodeContent::Helper(_)))
            .count();
        assert_eq!(helpers, 2);
    }

    #[test]
    fn test_tube_rule_registered_and_bound() {
        let session = SceneSession::build_with_rng(&bare_config(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(session.animations.rules().len(), 1);
        assert_eq!(session.animations.binding(&TUBE_NODE.into()), Some(session.tube()));
    }

    #[test]
    fn test_same_seed_same_scatter() {
        let mut config = bare_config();
        config.stars.count = 10;
        config.stars.seed = Some(9);
        let a = SceneSession::build(&config).unwrap();
        let b = SceneSession::build(&config).unwrap();
        let positions = |s: &SceneSession| -> Vec<Vec3> {
            s.stars().iter().map(|&h| s.graph.get(h).unwrap().transform.position).collect()
        };
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_missing_background_image_falls_back_to_colour() {
        let mut config = bare_config();
        config.background.image = Some("no/such/background.jpg".into());
        let session = SceneSession::build_with_rng(&config, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(matches!(session.graph.backdrop(), Backdrop::Color(_)));
    }

    #[test]
    fn test_invalid_tube_aborts_build() {
        let mut config = bare_config();
        config.tube.radial_segments = 1;
        assert!(SceneSession::build_with_rng(&config, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_zero_curve_scale_aborts_build() {
        let mut config = bare_config();
        config.tube.curve = Curve::sinusoid(0.0);
        assert!(SceneSession::build_with_rng(&config, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
