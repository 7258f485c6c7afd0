use crate::core::households::aggregate_doors;
use crate::core::partition::PolygonSelection;
use crate::domain::model::{LatLng, Voter};
use crate::utils::error::{Result, TurfError};
use geo::{Centroid, Contains, Coord, LineString, Point, Polygon};

/// A validated, caller-drawn turf boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPolygon {
    pub geometry: geojson::Geometry,
    pub shape: Polygon<f64>,
    pub centroid: LatLng,
}

fn invalid(reason: impl Into<String>) -> TurfError {
    TurfError::InvalidPolygon {
        reason: reason.into(),
    }
}

/// Parses a GeoJSON `Polygon` geometry. Only the outer ring is kept; holes are ignored.
pub fn parse_polygon(value: &serde_json::Value) -> Result<DrawnPolygon> {
    match value.get("type").and_then(serde_json::Value::as_str) {
        Some("Polygon") => {}
        Some(other) => return Err(invalid(format!("expected type Polygon, got {}", other))),
        None => return Err(invalid("geometry type is missing")),
    }
    if value
        .get("coordinates")
        .map_or(true, serde_json::Value::is_null)
    {
        return Err(invalid("coordinates are missing"));
    }

    let geometry: geojson::Geometry =
        serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;
    let rings = match geometry.value {
        geojson::Value::Polygon(rings) => rings,
        _ => return Err(invalid("geometry is not a polygon")),
    };
    let ring = rings
        .into_iter()
        .next()
        .ok_or_else(|| invalid("polygon has no rings"))?;

    let mut coords = Vec::with_capacity(ring.len());
    for position in &ring {
        match position.as_slice() {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => {
                coords.push(Coord { x: *lng, y: *lat })
            }
            _ => return Err(invalid(format!("bad position {:?}", position))),
        }
    }
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords.dedup();
    if coords.len() < 3 {
        return Err(invalid(format!(
            "ring needs at least 3 distinct vertices, got {}",
            coords.len()
        )));
    }

    let shape = Polygon::new(LineString::from(coords), vec![]);
    let centroid = shape
        .centroid()
        .map(|p| LatLng::new(p.y(), p.x()))
        .filter(LatLng::is_valid)
        .ok_or_else(|| invalid("polygon has no centroid"))?;

    Ok(DrawnPolygon {
        geometry: geojson::Geometry::new(geojson::Value::Polygon(vec![ring])),
        shape,
        centroid,
    })
}

impl DrawnPolygon {
    pub fn contains(&self, point: LatLng) -> bool {
        self.shape.contains(&Point::new(point.lng, point.lat))
    }

    /// Geocoded voters strictly inside the boundary, in input order.
    pub fn members<'a>(&self, voters: &'a [Voter]) -> Vec<&'a Voter> {
        voters
            .iter()
            .filter(|voter| voter.location().is_some_and(|p| self.contains(p)))
            .collect()
    }
}

/// Selects the list's voters inside the polygon. An empty selection is an
/// error distinct from a malformed polygon.
pub fn select_voters(list_id: &str, polygon: &DrawnPolygon, voters: &[Voter]) -> Result<PolygonSelection> {
    let inside: Vec<Voter> = polygon.members(voters).into_iter().cloned().collect();
    if inside.is_empty() {
        return Err(TurfError::NoVotersInPolygon {
            list_id: list_id.to_string(),
        });
    }

    Ok(PolygonSelection {
        boundary: polygon.geometry.clone(),
        center: polygon.centroid,
        door_count: aggregate_doors(&inside).len(),
        voter_ids: inside.into_iter().map(|v| v.id).collect(),
    })
}
