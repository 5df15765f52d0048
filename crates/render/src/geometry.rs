//! Device-resident geometry.

use crate::device::{BufferHandle, BufferKind, RenderDevice};
use meshview_assets::{GeometryError, GeometryRecord};

/// Index of a [`GeometryBuffer`] in the session's geometry pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

/// Per-vertex streams a material can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    Position,
    Normal,
    Texcoord,
    Color,
}

/// Buffers for one mesh, uploaded once and never modified.
#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    pub name: String,
    pub positions: BufferHandle,
    pub normals: BufferHandle,
    pub texcoords: Option<BufferHandle>,
    pub colors: Option<BufferHandle>,
    pub indices: BufferHandle,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl GeometryBuffer {
    /// Validate `record` and upload each stream. Nothing is uploaded when
    /// validation fails.
    pub fn upload<D: RenderDevice + ?Sized>(
        device: &mut D,
        record: &GeometryRecord,
    ) -> Result<Self, GeometryError> {
        record.validate()?;
        let name = &record.name;

        let positions = device.create_buffer(
            BufferKind::Vertex,
            bytemuck::cast_slice(&record.positions),
            &format!("{name}/positions"),
        );
        let normals = device.create_buffer(
            BufferKind::Vertex,
            bytemuck::cast_slice(&record.normals),
            &format!("{name}/normals"),
        );
        let texcoords = record.texcoords.as_ref().map(|uv| {
            device.create_buffer(
                BufferKind::Vertex,
                bytemuck::cast_slice(uv),
                &format!("{name}/texcoords"),
            )
        });
        let colors = record.colors.as_ref().map(|c| {
            device.create_buffer(
                BufferKind::Vertex,
                bytemuck::cast_slice(c),
                &format!("{name}/colors"),
            )
        });
        let indices = device.create_buffer(
            BufferKind::Index,
            bytemuck::cast_slice(&record.indices),
            &format!("{name}/indices"),
        );

        let buffer = Self {
            name: name.clone(),
            positions,
            normals,
            texcoords,
            colors,
            indices,
            index_count: record.index_count() as u32,
            vertex_count: record.vertex_count() as u32,
        };
        tracing::info!(
            name = %buffer.name,
            vertices = buffer.vertex_count,
            indices = buffer.index_count,
            "geometry uploaded"
        );
        Ok(buffer)
    }

    /// Buffer holding `attribute`, if the mesh has that stream.
    pub fn attribute(&self, attribute: VertexAttribute) -> Option<BufferHandle> {
        match attribute {
            VertexAttribute::Position => Some(self.positions),
            VertexAttribute::Normal => Some(self.normals),
            VertexAttribute::Texcoord => self.texcoords,
            VertexAttribute::Color => self.colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_device::DebugDevice;
    use meshview_assets::{GridParams, cube, grid};

    #[test]
    fn cube_upload_creates_every_stream() {
        let mut device = DebugDevice::new();
        let buffer = GeometryBuffer::upload(&mut device, &cube(None)).unwrap();
        assert_eq!(buffer.index_count, 36);
        assert_eq!(buffer.vertex_count, 24);
        assert!(buffer.attribute(VertexAttribute::Texcoord).is_some());
        assert_eq!(device.buffer(buffer.positions).unwrap().len, 24 * 12);
        assert_eq!(device.buffer(buffer.indices).unwrap().len, 36 * 4);
        assert_eq!(device.buffer(buffer.indices).unwrap().kind, BufferKind::Index);
    }

    #[test]
    fn grid_upload_index_count_is_verbatim() {
        let mut device = DebugDevice::new();
        let record = grid(&GridParams::default()).unwrap();
        let buffer = GeometryBuffer::upload(&mut device, &record).unwrap();
        assert_eq!(buffer.index_count, 15000);
        assert_eq!(buffer.vertex_count, 2601);
        assert!(buffer.attribute(VertexAttribute::Color).is_some());
    }

    #[test]
    fn invalid_record_uploads_nothing() {
        let mut device = DebugDevice::new();
        let mut record = cube(None);
        record.indices[5] = 24;
        let err = GeometryBuffer::upload(&mut device, &record).unwrap_err();
        assert!(matches!(err, GeometryError::IndexOutOfRange { .. }));
        assert_eq!(device.buffer_count(), 0);
    }

    #[test]
    fn absent_streams_have_no_buffer() {
        let mut device = DebugDevice::new();
        let mut record = cube(None);
        record.texcoords = None;
        record.colors = None;
        let buffer = GeometryBuffer::upload(&mut device, &record).unwrap();
        assert!(buffer.attribute(VertexAttribute::Texcoord).is_none());
        assert!(buffer.attribute(VertexAttribute::Color).is_none());
        assert_eq!(device.buffer_count(), 3);
    }
}
