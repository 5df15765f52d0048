use crate::geometry::GeometryId;
use crate::material::MaterialId;
use meshview_common::{NodeId, Transform};

/// One placed instance of a geometry with a material.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Transform,
    /// Radians of extra Y rotation per unit of animation time.
    pub spin: Option<f32>,
}

impl SceneNode {
    pub fn new(geometry: GeometryId, material: MaterialId, transform: Transform) -> Self {
        Self {
            id: NodeId::new(),
            geometry,
            material,
            transform,
            spin: None,
        }
    }

    pub fn with_spin(mut self, rate: f32) -> Self {
        self.spin = Some(rate);
        self
    }

    /// Spin angle at animation time `time`.
    pub fn spin_angle(&self, time: f32) -> f32 {
        self.spin.map_or(0.0, |rate| rate * time)
    }
}

/// Ordered node list. Order is draw order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node; it is drawn from the next frame on.
    pub fn push(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        tracing::info!(
            node = %id.short(),
            geometry = node.geometry.0,
            material = node.material.0,
            "node appended"
        );
        self.nodes.push(node);
        id
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Placement is the only mutable part of a node.
    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| &mut n.transform)
    }
}
