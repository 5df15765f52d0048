//! Per-frame draw loop.

use crate::config::ViewerConfig;
use crate::device::{ClearState, RenderDevice};
use crate::error::RenderError;
use crate::geometry::GeometryBuffer;
use crate::material::{GlobalUniforms, MaterialId, MaterialRegistry};
use crate::scene::Scene;
use crate::texture::TextureResource;
use glam::{Mat4, Vec3};
use meshview_common::{DrawMode, compose_placement};
use meshview_input::Action;
use std::collections::HashSet;

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_drawn: usize,
    pub nodes_skipped: usize,
    pub indices_submitted: u64,
}

/// Resources a frame reads. Borrowed for the whole frame, so the scene
/// cannot change while it is being drawn.
pub struct FrameInputs<'a> {
    pub scene: &'a Scene,
    pub geometries: &'a [GeometryBuffer],
    pub materials: &'a MaterialRegistry,
    pub textures: &'a [TextureResource],
    /// Accumulated camera matrix, as produced by the view controller.
    pub view: Mat4,
}

/// Draws the scene and owns animation time, draw mode and the light switch.
#[derive(Debug)]
pub struct FrameRenderer {
    time: f32,
    time_step: f32,
    draw_mode: DrawMode,
    light_enabled: bool,
    fov_degrees: f32,
    near: f32,
    far: f32,
    clear: ClearState,
    light_position: Vec3,
    warned: HashSet<MaterialId>,
}

impl FrameRenderer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            time: 0.0,
            time_step: config.time_step,
            draw_mode: DrawMode::Filled,
            light_enabled: true,
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
            clear: ClearState {
                color: config.clear_color,
                depth: 1.0,
            },
            light_position: Vec3::from_array(config.light_position),
            warned: HashSet::new(),
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn light_enabled(&self) -> bool {
        self.light_enabled
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleLight => self.light_enabled = !self.light_enabled,
            Action::SetDrawMode(mode) => self.draw_mode = mode,
            Action::CycleDrawMode => self.draw_mode = self.draw_mode.next(),
            Action::Noop => return,
        }
        tracing::debug!(
            ?action,
            light = self.light_enabled,
            mode = ?self.draw_mode,
            "viewer action"
        );
    }

    /// Perspective projection for a drawable of `width` x `height`.
    pub fn projection(&self, (width, height): (u32, u32)) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Draw every node once, then advance animation time by one step.
    ///
    /// Nodes whose material or geometry cannot be used are skipped; the
    /// rest of the scene still draws.
    pub fn render<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        inputs: &FrameInputs<'_>,
    ) -> Result<FrameStats, RenderError> {
        let _span = tracing::trace_span!("frame", time = self.time).entered();

        device.begin_frame(self.clear);
        let projection = self.projection(device.viewport_size());
        let world = inputs.view.inverse();

        let mut stats = FrameStats::default();
        for node in inputs.scene.nodes() {
            let usable = inputs
                .materials
                .get(node.material)
                .is_some_and(|m| m.is_usable());
            if !usable {
                if self.warned.insert(node.material) {
                    tracing::warn!(
                        material = node.material.0,
                        node = %node.id.short(),
                        "material has no usable program; skipping its nodes"
                    );
                }
                stats.nodes_skipped += 1;
                continue;
            }
            let Some(geometry) = inputs.geometries.get(node.geometry.0) else {
                tracing::warn!(geometry = node.geometry.0, "node references unknown geometry");
                stats.nodes_skipped += 1;
                continue;
            };

            let model_view = compose_placement(world, &node.transform, node.spin_angle(self.time));
            let globals = GlobalUniforms {
                projection,
                model_view,
                normal: model_view.inverse().transpose(),
                light_enabled: self.light_enabled,
                light_position: self.light_position,
            };

            let bound = inputs
                .materials
                .bind_geometry(device, node.material, geometry)
                .and_then(|()| {
                    inputs
                        .materials
                        .bind(device, node.material, &globals, inputs.textures)
                });
            if let Err(e) = bound {
                tracing::warn!(node = %node.id.short(), "skipping node: {e}");
                stats.nodes_skipped += 1;
                continue;
            }

            device.draw_indexed(self.draw_mode, geometry.index_count);
            stats.nodes_drawn += 1;
            stats.indices_submitted += u64::from(geometry.index_count);
        }

        device.end_frame()?;
        self.time += self.time_step;
        tracing::trace!(
            drawn = stats.nodes_drawn,
            skipped = stats.nodes_skipped,
            indices = stats.indices_submitted,
            "frame complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_device::{DebugDevice, DeviceCommand};
    use crate::device::UniformData;
    use crate::geometry::GeometryId;
    use crate::material::{MaterialKind, MaterialValues};
    use crate::program::{ProgramSource, build_program};
    use crate::scene::SceneNode;
    use meshview_assets::cube;
    use meshview_common::Transform;

    struct Fixture {
        device: DebugDevice,
        geometries: Vec<GeometryBuffer>,
        materials: MaterialRegistry,
        scene: Scene,
    }

    impl Fixture {
        fn new() -> Self {
            let mut device = DebugDevice::new();
            let geometries = vec![GeometryBuffer::upload(&mut device, &cube(None)).unwrap()];
            Self {
                device,
                geometries,
                materials: MaterialRegistry::new(),
                scene: Scene::new(),
            }
        }

        fn material(&mut self, vertex: &str) -> MaterialId {
            let source = ProgramSource {
                label: "phong".into(),
                vertex: vertex.into(),
                fragment: "fn fs_main() {}".into(),
                interface: MaterialKind::Phong.schema().interface(),
            };
            let program = build_program(&mut self.device, &source).ok();
            self.materials.create_or_disable(
                &self.device,
                MaterialKind::Phong,
                program,
                &MaterialValues::new(),
            )
        }

        fn render(&mut self, renderer: &mut FrameRenderer, view: Mat4) -> FrameStats {
            let inputs = FrameInputs {
                scene: &self.scene,
                geometries: &self.geometries,
                materials: &self.materials,
                textures: &[],
                view,
            };
            renderer.render(&mut self.device, &inputs).unwrap()
        }

        /// Every `Mat4` uploaded to `location`, in submission order.
        fn matrices_at(&self, location: u32) -> Vec<Mat4> {
            self.device
                .commands()
                .iter()
                .filter_map(|c| match c {
                    DeviceCommand::SetUniform {
                        location: at,
                        data: UniformData::Mat4(m),
                    } if at.0 == location => Some(*m),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn draws_every_node_with_its_index_count() {
        let mut f = Fixture::new();
        let material = f.material("fn vs_main() {}");
        for z in [-20.0, -15.0] {
            f.scene.push(SceneNode::new(
                GeometryId(0),
                material,
                Transform::from_translation(Vec3::new(0.0, 0.0, z)),
            ));
        }
        let mut renderer = FrameRenderer::new(&ViewerConfig::default());
        let stats = f.render(&mut renderer, Mat4::IDENTITY);
        assert_eq!(stats.nodes_drawn, 2);
        assert_eq!(stats.indices_submitted, 72);
        assert_eq!(
            f.device.draw_calls(),
            vec![(DrawMode::Filled, 36), (DrawMode::Filled, 36)]
        );
        assert_eq!(f.device.rejected_uniforms(), 0);
    }

    #[test]
    fn broken_program_skips_only_its_material() {
        let mut f = Fixture::new();
        let good = f.material("fn vs_main() {}");
        let broken = f.material("fn main() {}");
        f.scene
            .push(SceneNode::new(GeometryId(0), good, Transform::default()));
        f.scene
            .push(SceneNode::new(GeometryId(0), broken, Transform::default()));
        f.scene
            .push(SceneNode::new(GeometryId(0), good, Transform::default()));

        let mut renderer = FrameRenderer::new(&ViewerConfig::default());
        let stats = f.render(&mut renderer, Mat4::IDENTITY);
        assert_eq!(stats.nodes_drawn, 2);
        assert_eq!(stats.nodes_skipped, 1);
        assert_eq!(f.device.draw_calls().len(), 2);
    }

    #[test]
    fn model_view_uses_inverted_camera_and_fixed_order() {
        let mut f = Fixture::new();
        let material = f.material("fn vs_main() {}");
        let transform = Transform::from_translation(Vec3::new(3.0, 0.0, -15.0))
            .with_rotation(Vec3::new(0.1, 0.2, 0.3))
            .with_scale(Vec3::new(1.0, 2.0, 1.0));
        f.scene
            .push(SceneNode::new(GeometryId(0), material, transform).with_spin(1.0));

        let view = Mat4::from_rotation_y(0.4) * Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0));
        let mut renderer = FrameRenderer::new(&ViewerConfig::default());
        f.render(&mut renderer, view);
        f.render(&mut renderer, view);

        let expected = compose_placement(view.inverse(), &transform, 0.01);
        let model_view = f.matrices_at(1)[0];
        assert!(model_view.abs_diff_eq(expected, 1e-5));

        // Non-uniform scale: the normal matrix is the inverse transpose, not the model-view.
        let normal = f.matrices_at(2)[0];
        assert!(normal.abs_diff_eq(expected.inverse().transpose(), 1e-5));
        assert!(!normal.abs_diff_eq(expected, 1e-3));
    }

    #[test]
    fn camera_inverted_twice_is_original() {
        let view = Mat4::from_rotation_x(0.3)
            * Mat4::from_rotation_y(-1.2)
            * Mat4::from_translation(Vec3::new(0.5, 0.0, -4.0));
        assert!(view.inverse().inverse().abs_diff_eq(view, 1e-5));
    }

    #[test]
    fn time_advances_by_fixed_step_per_frame() {
        let mut f = Fixture::new();
        let mut renderer = FrameRenderer::new(&ViewerConfig::default());
        for _ in 0..3 {
            f.render(&mut renderer, Mat4::IDENTITY);
        }
        assert!((renderer.time() - 0.03).abs() < 1e-6);
        assert_eq!(f.device.frames_submitted(), 3);
    }

    #[test]
    fn projection_tracks_viewport_aspect() {
        let renderer = FrameRenderer::new(&ViewerConfig::default());
        let wide = renderer.projection((1600, 800));
        let square = renderer.projection((800, 800));
        assert!((square.x_axis.x / wide.x_axis.x - 2.0).abs() < 1e-5);
        // Degenerate sizes do not produce NaNs.
        assert!(renderer.projection((0, 0)).is_finite());
    }

    #[test]
    fn actions_switch_mode_and_light() {
        let mut f = Fixture::new();
        let material = f.material("fn vs_main() {}");
        f.scene
            .push(SceneNode::new(GeometryId(0), material, Transform::default()));
        let mut renderer = FrameRenderer::new(&ViewerConfig::default());

        renderer.apply(Action::CycleDrawMode);
        assert_eq!(renderer.draw_mode(), DrawMode::Wireframe);
        renderer.apply(Action::SetDrawMode(DrawMode::Points));
        renderer.apply(Action::ToggleLight);
        renderer.apply(Action::Noop);
        assert!(!renderer.light_enabled());

        f.render(&mut renderer, Mat4::IDENTITY);
        assert_eq!(f.device.draw_calls(), vec![(DrawMode::Points, 36)]);
        let light_off = f.device.commands().iter().any(|c| {
            matches!(
                c,
                DeviceCommand::SetUniform {
                    location,
                    data: UniformData::Int(0),
                } if location.0 == 3
            )
        });
        assert!(light_off);
    }

    #[test]
    fn unknown_geometry_is_skipped() {
        let mut f = Fixture::new();
        let material = f.material("fn vs_main() {}");
        f.scene
            .push(SceneNode::new(GeometryId(5), material, Transform::default()));
        let mut renderer = FrameRenderer::new(&ViewerConfig::default());
        let stats = f.render(&mut renderer, Mat4::IDENTITY);
        assert_eq!(stats.nodes_skipped, 1);
        assert!(f.device.draw_calls().is_empty());
    }
}
