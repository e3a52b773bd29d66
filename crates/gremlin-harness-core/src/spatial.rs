//! Spatial reference registry.
//!
//! Maps the four supported SRID codes to a named point subtype and its field
//! template. Any other code resolves to `None`, meaning "not a spatial value".

use std::sync::OnceLock;

use crate::models::{FieldKind, FieldSchema, Mode, PropertyMap};

pub const WGS_84: i64 = 4326;
pub const WGS_84_3D: i64 = 4979;
pub const CARTESIAN: i64 = 7203;
pub const CARTESIAN_3D: i64 = 9157;

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialTypeDescriptor {
    pub srid: i64,
    pub sub_type: &'static str,
    pub properties: PropertyMap,
}

impl SpatialTypeDescriptor {
    fn new(srid: i64, sub_type: &'static str, axes: &[&str]) -> Self {
        let mut properties = PropertyMap::new();
        for axis in axes {
            properties.declare(axis, FieldSchema::number(Mode::Double, None));
        }
        properties.declare("srid", FieldSchema::number(Mode::Integer, None));
        Self {
            srid,
            sub_type,
            properties,
        }
    }

    pub fn to_field_schema(&self) -> FieldSchema {
        FieldSchema {
            mode: Some(Mode::Point),
            sub_type: Some(self.sub_type.to_string()),
            ..FieldSchema::nested(FieldKind::Spatial, self.properties.clone())
        }
    }
}

fn registry() -> &'static [SpatialTypeDescriptor] {
    static REGISTRY: OnceLock<Vec<SpatialTypeDescriptor>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            SpatialTypeDescriptor::new(WGS_84, "WGS-84", &["longitude", "latitude"]),
            SpatialTypeDescriptor::new(
                WGS_84_3D,
                "WGS-84-3D",
                &["longitude", "latitude", "height"],
            ),
            SpatialTypeDescriptor::new(CARTESIAN, "Cartesian", &["x", "y"]),
            SpatialTypeDescriptor::new(CARTESIAN_3D, "Cartesian 3D", &["x", "y", "z"]),
        ]
    })
}

pub fn resolve(srid: i64) -> Option<&'static SpatialTypeDescriptor> {
    registry().iter().find(|d| d.srid == srid)
}
