/// Invariant violations found in a geometry record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry has no {0}")]
    Empty(&'static str),
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("invalid grid parameters: {0}")]
    InvalidGridParameters(String),
}

/// Raw vertex attributes and triangle indices for one mesh, before upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryRecord {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub indices: Vec<u32>,
}

impl GeometryRecord {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the record against the attribute and index invariants.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 {
            return Err(GeometryError::Empty("positions"));
        }
        if self.indices.is_empty() {
            return Err(GeometryError::Empty("indices"));
        }

        check_len("normals", vertex_count, self.normals.len())?;
        if let Some(texcoords) = &self.texcoords {
            check_len("texcoords", vertex_count, texcoords.len())?;
        }
        if let Some(colors) = &self.colors {
            check_len("colors", vertex_count, colors.len())?;
        }

        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::NotTriangles(self.indices.len()));
        }
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= vertex_count)
        {
            return Err(GeometryError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

fn check_len(attribute: &'static str, expected: usize, actual: usize) -> Result<(), GeometryError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GeometryError::AttributeLength {
            attribute,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GeometryRecord {
        GeometryRecord {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            texcoords: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            colors: None,
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn well_formed_record_validates() {
        let record = triangle();
        assert!(record.validate().is_ok());
        assert_eq!(record.vertex_count(), 3);
        assert_eq!(record.triangle_count(), 1);
    }

    #[test]
    fn mismatched_normals_rejected() {
        let mut record = triangle();
        record.normals.pop();
        assert_eq!(
            record.validate(),
            Err(GeometryError::AttributeLength {
                attribute: "normals",
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn mismatched_texcoords_rejected() {
        let mut record = triangle();
        record.texcoords = Some(vec![[0.0, 0.0]]);
        assert!(matches!(
            record.validate(),
            Err(GeometryError::AttributeLength {
                attribute: "texcoords",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut record = triangle();
        record.indices = vec![0, 1, 3];
        assert_eq!(
            record.validate(),
            Err(GeometryError::IndexOutOfRange {
                position: 2,
                index: 3,
                vertex_count: 3,
            })
        );
    }

    #[test]
    fn partial_triangle_rejected() {
        let mut record = triangle();
        record.indices = vec![0, 1, 2, 0];
        assert_eq!(record.validate(), Err(GeometryError::NotTriangles(4)));
    }

    #[test]
    fn empty_record_rejected() {
        let record = GeometryRecord::default();
        assert_eq!(record.validate(), Err(GeometryError::Empty("positions")));
    }
}
