//! The viewer's built-in scene: a floor grid, two spinning textured cubes
//! and one mesh that joins once its file has loaded.

use crate::device::{ProgramHandle, RenderDevice};
use crate::error::RenderError;
use crate::material::{MaterialId, MaterialKind, MaterialValues, UniformValue};
use crate::program::ProgramSource;
use crate::scene::SceneNode;
use crate::session::RenderSession;
use glam::Vec3;
use meshview_assets::{LoadTicket, cube, grid};
use meshview_common::{NodeId, Transform};
use std::path::PathBuf;

/// Files the showcase pulls in asynchronously.
#[derive(Debug, Clone, Default)]
pub struct ShowcaseAssets {
    pub mesh: Option<PathBuf>,
    /// Cube `i` samples texture `i % len`; no textures means plain cubes.
    pub textures: Vec<PathBuf>,
}

/// What was placed, for logging and tests.
#[derive(Debug, Clone)]
pub struct Showcase {
    pub grid: NodeId,
    pub cubes: Vec<NodeId>,
    pub mesh: Option<LoadTicket>,
}

/// Cube translations and spin rates.
const CUBE_PLACEMENTS: [(Vec3, f32); 2] = [
    (Vec3::new(0.0, 0.0, -20.0), -1.0),
    (Vec3::new(3.0, 0.0, -15.0), 1.0),
];

/// Populate `session` with the showcase scene.
///
/// `programs` supplies the backend's source for each material kind. A
/// program that fails to build leaves its materials disabled; the rest of
/// the scene still renders.
pub fn assemble_showcase<D: RenderDevice>(
    session: &mut RenderSession<D>,
    programs: impl Fn(MaterialKind) -> ProgramSource,
    assets: &ShowcaseAssets,
) -> Result<Showcase, RenderError> {
    let phong = session.build_program(&programs(MaterialKind::Phong));
    let vertex_color = session.build_program(&programs(MaterialKind::VertexColor));

    let grid_record = grid(&session.config().grid)?;
    let grid_geometry = session.add_geometry(&grid_record)?;
    let grid_material = session.create_material_or_disable(
        MaterialKind::VertexColor,
        vertex_color,
        &MaterialValues::new(),
    );
    let grid = session.add_node(SceneNode::new(
        grid_geometry,
        grid_material,
        Transform::from_translation(Vec3::new(0.0, -2.0, -20.0)),
    ))?;

    let textures: Vec<_> = assets
        .textures
        .iter()
        .map(|path| session.load_texture(path.clone()))
        .collect();

    let cube_geometry = session.add_geometry(&cube(None))?;
    let mut cubes = Vec::with_capacity(CUBE_PLACEMENTS.len());
    for (i, (translation, spin)) in CUBE_PLACEMENTS.into_iter().enumerate() {
        let values = match textures.get(i % textures.len().max(1)) {
            Some(&texture) => MaterialValues::new()
                .with("use_texture", UniformValue::Bool(true))
                .with_texture("diffuse_map", texture),
            None => MaterialValues::new(),
        };
        let material = phong_material(session, phong, &values);
        let transform =
            Transform::from_translation(translation).with_rotation(Vec3::new(0.0, 0.0, 0.5));
        let node = SceneNode::new(cube_geometry, material, transform).with_spin(spin);
        cubes.push(session.add_node(node)?);
    }

    let mesh = assets.mesh.as_ref().map(|path| {
        let values = match textures.first() {
            Some(&texture) => MaterialValues::new()
                .with("use_texture", UniformValue::Bool(true))
                .with_texture("diffuse_map", texture),
            None => MaterialValues::new(),
        };
        let material = phong_material(session, phong, &values);
        let transform = Transform::from_translation(Vec3::new(0.0, 0.0, -30.0))
            .with_rotation(Vec3::new(0.1, 0.0, 0.0));
        session.load_mesh(path.clone(), material, transform, None)
    });

    tracing::info!(
        cubes = cubes.len(),
        textures = textures.len(),
        mesh_pending = mesh.is_some(),
        "showcase scene assembled"
    );
    Ok(Showcase { grid, cubes, mesh })
}

fn phong_material<D: RenderDevice>(
    session: &mut RenderSession<D>,
    program: Option<ProgramHandle>,
    values: &MaterialValues,
) -> MaterialId {
    session.create_material_or_disable(MaterialKind::Phong, program, values)
}
