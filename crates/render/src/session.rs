//! A viewing session: every resource pool, the scene, the camera and the
//! asset loads in flight.

use crate::config::ViewerConfig;
use crate::device::{ProgramHandle, RenderDevice};
use crate::error::RenderError;
use crate::frame::{FrameInputs, FrameRenderer, FrameStats};
use crate::geometry::{GeometryBuffer, GeometryId};
use crate::material::{MaterialId, MaterialKind, MaterialRegistry, MaterialValues};
use crate::program::{ProgramSource, build_program};
use crate::scene::{Scene, SceneNode};
use crate::texture::{TextureId, TextureResource};
use meshview_assets::{AssetLoader, GeometryRecord, LoadEvent, LoadTicket, LoadedAsset};
use meshview_common::{NodeId, Transform};
use meshview_input::{Action, PointerEvent, ViewController};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Where a mesh goes once its file finishes loading.
#[derive(Debug, Clone, Copy)]
struct PendingMesh {
    material: MaterialId,
    transform: Transform,
    spin: Option<f32>,
}

/// What one round of asset polling changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetReport {
    pub nodes_added: Vec<NodeId>,
    pub textures_resolved: Vec<TextureId>,
    /// Paths that failed, with the error text.
    pub failures: Vec<(PathBuf, String)>,
}

impl AssetReport {
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty() && self.textures_resolved.is_empty() && self.failures.is_empty()
    }
}

pub struct RenderSession<D: RenderDevice> {
    device: D,
    config: ViewerConfig,
    geometries: Vec<GeometryBuffer>,
    textures: Vec<TextureResource>,
    materials: MaterialRegistry,
    scene: Scene,
    camera: ViewController,
    renderer: FrameRenderer,
    loader: AssetLoader,
    pending_meshes: HashMap<LoadTicket, PendingMesh>,
    pending_textures: HashMap<LoadTicket, TextureId>,
}

impl<D: RenderDevice> RenderSession<D> {
    pub fn new(device: D, config: ViewerConfig) -> Self {
        let camera = ViewController::new(config.view);
        let renderer = FrameRenderer::new(&config);
        Self {
            device,
            config,
            geometries: Vec::new(),
            textures: Vec::new(),
            materials: MaterialRegistry::new(),
            scene: Scene::new(),
            camera,
            renderer,
            loader: AssetLoader::new(),
            pending_meshes: HashMap::new(),
            pending_textures: HashMap::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }

    pub fn camera(&self) -> &ViewController {
        &self.camera
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryBuffer> {
        self.geometries.get(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureResource> {
        self.textures.get(id.0)
    }

    pub fn pending_loads(&self) -> usize {
        self.pending_meshes.len() + self.pending_textures.len()
    }

    /// Compile and link a program. `None` on failure, already logged.
    pub fn build_program(&mut self, source: &ProgramSource) -> Option<ProgramHandle> {
        build_program(&mut self.device, source).ok()
    }

    pub fn add_geometry(&mut self, record: &GeometryRecord) -> Result<GeometryId, RenderError> {
        let buffer = GeometryBuffer::upload(&mut self.device, record)?;
        self.geometries.push(buffer);
        Ok(GeometryId(self.geometries.len() - 1))
    }

    /// A texture showing the placeholder texel until resolved.
    pub fn add_texture(&mut self, label: &str) -> TextureId {
        let texture =
            TextureResource::with_placeholder(&mut self.device, self.config.placeholder_texel, label);
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    /// Placeholder texture now, decoded image once the load completes. A
    /// failed load keeps the placeholder.
    pub fn load_texture(&mut self, path: impl Into<PathBuf>) -> TextureId {
        let path = path.into();
        let id = self.add_texture(&path.display().to_string());
        let ticket = self.loader.load_image(path);
        self.pending_textures.insert(ticket, id);
        id
    }

    pub fn create_material(
        &mut self,
        kind: MaterialKind,
        program: Option<ProgramHandle>,
        values: &MaterialValues,
    ) -> Result<MaterialId, RenderError> {
        self.check_textures(values)?;
        Ok(self.materials.create(&self.device, kind, program, values)?)
    }

    /// Create a material, registering it as disabled if it cannot be used.
    pub fn create_material_or_disable(
        &mut self,
        kind: MaterialKind,
        program: Option<ProgramHandle>,
        values: &MaterialValues,
    ) -> MaterialId {
        self.materials
            .create_or_disable(&self.device, kind, program, values)
    }

    pub fn add_node(&mut self, node: SceneNode) -> Result<NodeId, RenderError> {
        if node.geometry.0 >= self.geometries.len() {
            return Err(RenderError::UnknownGeometry(node.geometry));
        }
        Ok(self.scene.push(node))
    }

    /// Load a mesh in the background; it joins the scene with this
    /// placement at the first poll after it is ready.
    pub fn load_mesh(
        &mut self,
        path: impl Into<PathBuf>,
        material: MaterialId,
        transform: Transform,
        spin: Option<f32>,
    ) -> LoadTicket {
        let ticket = self.loader.load_mesh(path);
        self.pending_meshes.insert(
            ticket,
            PendingMesh {
                material,
                transform,
                spin,
            },
        );
        ticket
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.camera.handle(event);
    }

    pub fn handle_action(&mut self, action: Action) {
        self.renderer.apply(action);
    }

    /// Apply every completed load without blocking.
    pub fn poll_assets(&mut self) -> AssetReport {
        let events = self.loader.poll();
        self.apply_loads(events)
    }

    /// Block until pending loads finish or `timeout` passes, then apply them.
    pub fn wait_for_assets(&mut self, timeout: Duration) -> AssetReport {
        let events = self.loader.wait_idle(timeout);
        self.apply_loads(events)
    }

    /// Apply finished loads, then draw one frame.
    pub fn render_frame(&mut self) -> Result<FrameStats, RenderError> {
        self.poll_assets();
        let inputs = FrameInputs {
            scene: &self.scene,
            geometries: &self.geometries,
            materials: &self.materials,
            textures: &self.textures,
            view: self.camera.view_matrix(),
        };
        self.renderer.render(&mut self.device, &inputs)
    }

    fn apply_loads(&mut self, events: Vec<LoadEvent>) -> AssetReport {
        let mut report = AssetReport::default();
        for event in events {
            let LoadEvent {
                ticket,
                path,
                result,
            } = event;
            let outcome = match result {
                Ok(LoadedAsset::Mesh(record)) => self.apply_mesh(ticket, &record).map(|node| {
                    if let Some(node) = node {
                        report.nodes_added.push(node);
                    }
                }),
                Ok(LoadedAsset::Image(image)) => match self.pending_textures.remove(&ticket) {
                    Some(id) => self.textures[id.0]
                        .resolve(&mut self.device, &image)
                        .map(|_| report.textures_resolved.push(id))
                        .map_err(RenderError::from),
                    None => Ok(()),
                },
                Err(e) => {
                    self.pending_meshes.remove(&ticket);
                    self.pending_textures.remove(&ticket);
                    Err(e.into())
                }
            };
            if let Err(e) = outcome {
                tracing::error!(path = %path.display(), "asset dropped: {e}");
                report.failures.push((path, e.to_string()));
            }
        }
        report
    }

    fn apply_mesh(
        &mut self,
        ticket: LoadTicket,
        record: &GeometryRecord,
    ) -> Result<Option<NodeId>, RenderError> {
        let Some(pending) = self.pending_meshes.remove(&ticket) else {
            return Ok(None);
        };
        let geometry = self.add_geometry(record)?;
        let mut node = SceneNode::new(geometry, pending.material, pending.transform);
        node.spin = pending.spin;
        Ok(Some(self.scene.push(node)))
    }

    fn check_textures(&self, values: &MaterialValues) -> Result<(), RenderError> {
        match values
            .texture_ids()
            .find(|id| id.0 >= self.textures.len())
        {
            Some(id) => Err(RenderError::UnknownTexture(id)),
            None => Ok(()),
        }
    }
}
