//! Area descriptors: which part of the map auxiliary queries are scoped to.

use crate::error::{Error, Result};
use geojson::{Geometry, Value};
use serde::Serialize;

/// Selection mode of the area selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    None,
    NamedRegion,
    Polygon,
}

/// A validated single-polygon GeoJSON geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry(Geometry);

impl PolygonGeometry {
    pub fn geometry(&self) -> &Geometry {
        &self.0
    }

    /// Exterior ring followed by any holes, as `[lng, lat]` positions.
    pub fn rings(&self) -> &[Vec<Vec<f64>>] {
        match &self.0.value {
            Value::Polygon(rings) => rings,
            _ => &[],
        }
    }

    /// GeoJSON text, as the backend expects it in `area_value`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn from_json(body: &str) -> Result<Self> {
        let geometry: Geometry = serde_json::from_str(body)?;
        Self::try_from(geometry)
    }
}

impl TryFrom<Geometry> for PolygonGeometry {
    type Error = Error;

    fn try_from(geometry: Geometry) -> Result<Self> {
        let rings = match &geometry.value {
            Value::Polygon(rings) => rings,
            other => {
                return Err(Error::GeometryInvalid(format!(
                    "expected Polygon, found {}",
                    geometry_type(other)
                )))
            }
        };
        if rings.is_empty() {
            return Err(Error::GeometryInvalid("polygon has no rings".into()));
        }
        for (index, ring) in rings.iter().enumerate() {
            if ring.len() < 4 {
                return Err(Error::GeometryInvalid(format!(
                    "ring {} has {} positions, at least 4 required",
                    index,
                    ring.len()
                )));
            }
            let valid_positions = ring
                .iter()
                .all(|p| p.len() >= 2 && p.iter().all(|c| c.is_finite()));
            if !valid_positions {
                return Err(Error::GeometryInvalid(format!(
                    "ring {} has a malformed position",
                    index
                )));
            }
            if ring.first() != ring.last() {
                return Err(Error::GeometryInvalid(format!("ring {} is not closed", index)));
            }
        }
        Ok(PolygonGeometry(geometry))
    }
}

fn geometry_type(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Current area selection. `NamedRegion(None)` and `Polygon(None)` mean
/// "mode chosen, value pending".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AreaDescriptor {
    #[default]
    None,
    NamedRegion(Option<String>),
    Polygon(Option<PolygonGeometry>),
}

impl AreaDescriptor {
    pub fn kind(&self) -> AreaKind {
        match self {
            AreaDescriptor::None => AreaKind::None,
            AreaDescriptor::NamedRegion(_) => AreaKind::NamedRegion,
            AreaDescriptor::Polygon(_) => AreaKind::Polygon,
        }
    }

    /// A fresh descriptor for `kind` with no value.
    pub fn empty(kind: AreaKind) -> Self {
        match kind {
            AreaKind::None => AreaDescriptor::None,
            AreaKind::NamedRegion => AreaDescriptor::NamedRegion(None),
            AreaKind::Polygon => AreaDescriptor::Polygon(None),
        }
    }

    pub fn has_value(&self) -> bool {
        self.filter().is_some()
    }

    /// The area as fetch parameters, if a value has been chosen.
    pub fn filter(&self) -> Option<AreaFilter> {
        match self {
            AreaDescriptor::NamedRegion(Some(name)) => Some(AreaFilter::NamedRegion(name.clone())),
            AreaDescriptor::Polygon(Some(polygon)) => Some(AreaFilter::Polygon(polygon.clone())),
            _ => None,
        }
    }
}

/// A chosen area, ready to be sent along with an auxiliary fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaFilter {
    NamedRegion(String),
    Polygon(PolygonGeometry),
}

impl AreaFilter {
    pub fn kind(&self) -> AreaKind {
        match self {
            AreaFilter::NamedRegion(_) => AreaKind::NamedRegion,
            AreaFilter::Polygon(_) => AreaKind::Polygon,
        }
    }

    pub fn area_type(&self) -> &'static str {
        match self {
            AreaFilter::NamedRegion(_) => "municipio",
            AreaFilter::Polygon(_) => "poligono",
        }
    }

    /// Region name, or the polygon serialized as GeoJSON text.
    pub fn area_value(&self) -> Result<String> {
        match self {
            AreaFilter::NamedRegion(name) => Ok(name.clone()),
            AreaFilter::Polygon(polygon) => polygon.to_json(),
        }
    }

    /// JSON form used in the `valor` field of area metrics requests.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            AreaFilter::NamedRegion(name) => serde_json::Value::String(name.clone()),
            AreaFilter::Polygon(polygon) => {
                serde_json::to_value(polygon.geometry()).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn square(offset: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![-35.3 + offset, -5.9],
            vec![-35.1 + offset, -5.9],
            vec![-35.1 + offset, -5.7],
            vec![-35.3 + offset, -5.7],
            vec![-35.3 + offset, -5.9],
        ]]))
    }

    #[test]
    fn accepts_closed_polygon() {
        let polygon = PolygonGeometry::try_from(square(0.0)).unwrap();
        assert_eq!(polygon.rings().len(), 1);
        let json = polygon.to_json().unwrap();
        assert_eq!(PolygonGeometry::from_json(&json).unwrap(), polygon);
    }

    #[test]
    fn rejects_malformed_geometry() {
        let point = Geometry::new(Value::Point(vec![-35.0, -5.0]));
        assert!(matches!(
            PolygonGeometry::try_from(point),
            Err(Error::GeometryInvalid(_))
        ));

        let open = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ]]));
        assert!(PolygonGeometry::try_from(open).is_err());

        let short = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
        ]]));
        assert!(PolygonGeometry::try_from(short).is_err());

        let nan = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![f64::NAN, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]));
        assert!(PolygonGeometry::try_from(nan).is_err());

        assert!(PolygonGeometry::try_from(Geometry::new(Value::Polygon(vec![]))).is_err());
    }

    #[test]
    fn descriptor_value_rules() {
        assert!(!AreaDescriptor::None.has_value());
        assert!(!AreaDescriptor::NamedRegion(None).has_value());
        assert!(!AreaDescriptor::Polygon(None).has_value());

        let natal = AreaDescriptor::NamedRegion(Some("Natal".into()));
        let filter = natal.filter().unwrap();
        assert_eq!(filter.area_type(), "municipio");
        assert_eq!(filter.area_value().unwrap(), "Natal");
        assert_eq!(AreaDescriptor::empty(AreaKind::Polygon).kind(), AreaKind::Polygon);
    }

    #[test]
    fn polygon_filter_serializes_geometry() {
        let polygon = PolygonGeometry::try_from(square(0.0)).unwrap();
        let filter = AreaDescriptor::Polygon(Some(polygon)).filter().unwrap();
        assert_eq!(filter.area_type(), "poligono");
        let value: serde_json::Value = serde_json::from_str(&filter.area_value().unwrap()).unwrap();
        assert_eq!(value["type"], "Polygon");
    }
}
