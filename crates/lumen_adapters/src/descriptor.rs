//! Parses the YAML scene descriptor: the host's on-disk summary of which
//! geometry archives make up a scene, its camera, and its material nodes.
//! Deliberately small — the descriptor only names *where* the scene data
//! lives and how the camera/materials are parameterized; the geometry
//! archive itself ([`crate::archive`]) carries the actual meshes.

use lumen_bsdf::Lobe;
use lumen_camera::Camera;
use lumen_math::{Affine3A, Vec3};
use lumen_shading::{ClosureNode, Material};
use serde::Deserialize;

/// One `data:` entry: a geometry archive to import as scene data.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEntry {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraDescriptor {
    pub position: [f32; 3],
    pub at: [f32; 3],
    pub up: [f32; 3],
    #[serde(rename = "focal-length", default = "default_focal_length")]
    pub focal_length: f32,
    #[serde(rename = "sensor-width", default = "default_sensor_width")]
    pub sensor_width: f32,
}

fn default_focal_length() -> f32 {
    35.0
}

fn default_sensor_width() -> f32 {
    32.0
}

impl CameraDescriptor {
    /// Builds a world-space look-at transform and a perspective [`Camera`]
    /// sized for `film_width` x `film_height`. The descriptor's
    /// focal-length/sensor-width pair describes the *horizontal* field of
    /// view (matching the sensor-fit convention it was distilled from);
    /// converting to the engine's vertical `fov_y` needs the output
    /// resolution's aspect ratio, which isn't known until render settings
    /// are in hand, hence this is a method rather than a field computed at
    /// parse time.
    #[must_use]
    pub fn to_camera(&self, film_width: u32, film_height: u32) -> Camera {
        let position = Vec3::from(self.position);
        let at = Vec3::from(self.at);
        let up_hint = Vec3::from(self.up).normalize_or_zero();

        let forward = (at - position).normalize_or_zero();
        let right = forward.cross(up_hint).normalize_or_zero();
        let true_up = right.cross(forward);

        let transform = Affine3A::from_cols(
            glam::Vec3A::from(right),
            glam::Vec3A::from(true_up),
            glam::Vec3A::from(-forward),
            glam::Vec3A::from(position),
        );

        let fov_x = 2.0 * (self.sensor_width / (2.0 * self.focal_length)).atan();
        let aspect = film_width as f32 / film_height as f32;
        let fov_y = 2.0 * ((fov_x / 2.0).tan() / aspect).atan();

        Camera::pinhole(transform, fov_y, film_width, film_height)
    }
}

/// One entry of a material node's `shaders` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ShaderRef {
    pub name: String,
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default = "default_shader_type")]
    #[serde(rename = "type")]
    pub shader_type: String,
}

fn default_shader_type() -> String {
    "surface".to_string()
}

/// A parameter's value. The descriptor's own `type` field (`float` or
/// `rgb`) is kept alongside for round-tripping, but the value's shape
/// (scalar vs. 3-array) already disambiguates it on read, so this is
/// `#[serde(untagged)]` rather than driven by the `type` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f32),
    Rgb([f32; 3]),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: ParameterValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialNode {
    #[serde(default)]
    pub name: Option<String>,
    pub shaders: Vec<ShaderRef>,
    #[serde(default)]
    pub parameters: Vec<MaterialParameter>,
}

impl MaterialNode {
    fn float_param(&self, name: &str, default: f32) -> f32 {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| match p.value {
                ParameterValue::Float(f) => Some(f),
                ParameterValue::Rgb(_) => None,
            })
            .unwrap_or(default)
    }

    fn rgb_param(&self, name: &str, default: Vec3) -> Vec3 {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| match p.value {
                ParameterValue::Rgb(rgb) => Some(Vec3::from(rgb)),
                ParameterValue::Float(_) => None,
            })
            .unwrap_or(default)
    }

    /// Compiles this node's parameter block into a [`Material`] by matching
    /// its first `surface`-layer shader name against the small set of
    /// built-in closures this renderer supports natively. Compiling an
    /// arbitrary shader network is the shading-language runtime's job, out
    /// of scope here; unrecognized shader names fall back to a neutral
    /// diffuse closure rather than failing the scene load.
    #[must_use]
    pub fn compile(&self) -> Material {
        let surface = self.shaders.iter().find(|s| s.shader_type == "surface");
        let albedo = self.rgb_param("color", Vec3::splat(0.8));

        let closure = match surface.map(|s| s.name.as_str()) {
            Some("diffuse") => ClosureNode::Lobe { lobe: Lobe::Lambert { albedo }, weight: Vec3::ONE },
            Some("oren_nayar") => ClosureNode::Lobe {
                lobe: Lobe::OrenNayar { albedo, roughness: self.float_param("roughness", 0.3) },
                weight: Vec3::ONE,
            },
            Some("glossy") => {
                let roughness = self.float_param("roughness", 0.1).max(1e-3);
                ClosureNode::Lobe {
                    lobe: Lobe::Ggx {
                        albedo,
                        alpha_x: roughness * roughness,
                        alpha_y: roughness * roughness,
                        ior: self.float_param("ior", 1.5),
                    },
                    weight: Vec3::ONE,
                }
            }
            Some("mirror") => {
                ClosureNode::Lobe { lobe: Lobe::SpecularReflect { color: albedo }, weight: Vec3::ONE }
            }
            Some("glass") => ClosureNode::Lobe {
                lobe: Lobe::SpecularRefract { color: albedo, ior: self.float_param("ior", 1.5) },
                weight: Vec3::ONE,
            },
            Some("emission") => ClosureNode::Emission {
                radiance: self.rgb_param("color", Vec3::ONE) * self.float_param("strength", 1.0),
            },
            Some(other) => {
                log::warn!("unrecognized surface shader {other:?}; falling back to diffuse");
                ClosureNode::Lobe { lobe: Lobe::Lambert { albedo }, weight: Vec3::ONE }
            }
            None => ClosureNode::Lobe { lobe: Lobe::Lambert { albedo }, weight: Vec3::ONE },
        };

        Material::new(closure)
    }
}

/// The YAML scene descriptor's top-level shape.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDescriptor {
    #[serde(default)]
    pub data: Vec<DataEntry>,
    pub camera: CameraDescriptor,
    #[serde(default)]
    pub materials: Vec<MaterialNode>,
}

impl SceneDescriptor {
    /// # Errors
    /// Returns [`crate::RenderError::Yaml`] if `text` isn't a valid scene
    /// descriptor.
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
data:
  - path: meshes/room.arc
  - path: meshes/props.arc
camera:
  position: [0.0, 1.0, 5.0]
  at: [0.0, 1.0, 0.0]
  up: [0.0, 1.0, 0.0]
  focal-length: 50
  sensor-width: 36
materials:
  - name: wall
    shaders:
      - name: diffuse
        layer: bsdf
        type: surface
    parameters:
      - name: color
        type: rgb
        value: [0.8, 0.2, 0.2]
  - name: light
    shaders:
      - name: emission
        type: surface
    parameters:
      - name: strength
        type: float
        value: 10.0
";

    #[test]
    fn parses_data_camera_and_materials() {
        let descriptor = SceneDescriptor::parse(SAMPLE).unwrap();
        assert_eq!(descriptor.data.len(), 2);
        assert_eq!(descriptor.data[0].path, "meshes/room.arc");
        assert_eq!(descriptor.materials.len(), 2);
        assert!((descriptor.camera.focal_length - 50.0).abs() < 1e-6);
    }

    #[test]
    fn missing_focal_length_and_sensor_width_fall_back_to_defaults() {
        let yaml = r"
camera:
  position: [0.0, 0.0, 0.0]
  at: [0.0, 0.0, -1.0]
  up: [0.0, 1.0, 0.0]
";
        let descriptor = SceneDescriptor::parse(yaml).unwrap();
        assert!((descriptor.camera.focal_length - 35.0).abs() < 1e-6);
        assert!((descriptor.camera.sensor_width - 32.0).abs() < 1e-6);
    }

    #[test]
    fn camera_descriptor_builds_a_transform_looking_at_its_target() {
        let descriptor = CameraDescriptor {
            position: [0.0, 0.0, 5.0],
            at: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            focal_length: 50.0,
            sensor_width: 36.0,
        };
        let camera = descriptor.to_camera(100, 100);
        let (origin, dir) = camera.generate_ray(49, 49, 0.5, 0.5, (0.0, 0.0));
        assert!((origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
        assert!(dir.z < 0.0);
    }

    #[test]
    fn diffuse_material_node_compiles_to_a_lambert_closure() {
        let node = MaterialNode {
            name: Some("wall".to_string()),
            shaders: vec![ShaderRef { name: "diffuse".to_string(), layer: None, shader_type: "surface".to_string() }],
            parameters: vec![MaterialParameter {
                name: "color".to_string(),
                value_type: "rgb".to_string(),
                value: ParameterValue::Rgb([0.1, 0.2, 0.3]),
            }],
        };
        let material = node.compile();
        assert!(!material.is_emitter());
    }

    #[test]
    fn emission_material_node_is_flagged_as_an_emitter() {
        let node = MaterialNode {
            name: Some("light".to_string()),
            shaders: vec![ShaderRef { name: "emission".to_string(), layer: None, shader_type: "surface".to_string() }],
            parameters: vec![MaterialParameter {
                name: "strength".to_string(),
                value_type: "float".to_string(),
                value: ParameterValue::Float(5.0),
            }],
        };
        let material = node.compile();
        assert!(material.is_emitter());
    }
}
