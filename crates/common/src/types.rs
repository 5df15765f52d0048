use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a placed scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Primitive topology used when drawing indexed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    Filled,
    Wireframe,
    Points,
}

impl DrawMode {
    pub const ALL: [DrawMode; 3] = [DrawMode::Filled, DrawMode::Wireframe, DrawMode::Points];

    /// Filled, then wireframe, then points, then back to filled.
    pub fn next(self) -> Self {
        match self {
            Self::Filled => Self::Wireframe,
            Self::Wireframe => Self::Points,
            Self::Points => Self::Filled,
        }
    }
}

/// Placement of one instance: translation, Euler rotation, scale.
///
/// `rotation` holds angles in radians about X, Y and Z, applied in that
/// fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix: `T * Rx * Ry * Rz * S`.
    pub fn matrix(&self) -> Mat4 {
        compose_placement(Mat4::IDENTITY, self, 0.0)
    }
}

/// Compose a node placement onto `base`.
///
/// Post-multiplies, in order: translation, rotation about X, Y, Z, an extra
/// `spin` about Y, then scale. `base` is usually the inverted camera matrix.
pub fn compose_placement(base: Mat4, transform: &Transform, spin: f32) -> Mat4 {
    base * Mat4::from_translation(transform.translation)
        * Mat4::from_rotation_x(transform.rotation.x)
        * Mat4::from_rotation_y(transform.rotation.y)
        * Mat4::from_rotation_z(transform.rotation.z)
        * Mat4::from_rotation_y(spin)
        * Mat4::from_scale(transform.scale)
}
