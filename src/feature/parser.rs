use serde_json::Value;

use super::{Feature, FeatureGeometry, GeometryKind, Tags};
use crate::{GeoPoint, OsmBuildingsError, Result};

/// Parser for raw feature documents
///
/// Accepts both Overpass JSON (`elements` array with `out geom` geometry)
/// and GeoJSON FeatureCollections. Individual malformed entries are skipped
/// with a log; only an unreadable document is an error.
///
/// Ways and relations draw from independent OSM id spaces. Relation-derived
/// features carry negated ids so both spaces fit into one `i64` without
/// collisions.
pub struct FeatureParser;

impl FeatureParser {
    /// Parse a raw document, detecting its format from the content
    pub fn parse(&self, raw: &str) -> Result<Vec<Feature>> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| OsmBuildingsError::Parse(format!("Invalid JSON: {}", e)))?;

        if parsed.get("elements").is_some() {
            self.parse_overpass(&parsed)
        } else if parsed.get("type").and_then(|t| t.as_str()) == Some("FeatureCollection") {
            self.parse_feature_collection(&parsed)
        } else {
            Err(OsmBuildingsError::Parse(
                "Document is neither Overpass JSON nor a GeoJSON FeatureCollection".to_string(),
            ))
        }
    }

    /// Parse Overpass JSON (`[out:json]` + `out geom`)
    fn parse_overpass(&self, doc: &Value) -> Result<Vec<Feature>> {
        let elements = doc
            .get("elements")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                OsmBuildingsError::Parse("No 'elements' array found in JSON".to_string())
            })?;

        let mut features = Vec::new();
        for element in elements {
            match self.parse_overpass_element(element) {
                Some(feature) => features.push(feature),
                None => {
                    tracing::debug!(
                        "Skipping element without usable id/type/geometry: {}",
                        element.get("id").cloned().unwrap_or(serde_json::Value::Null)
                    );
                }
            }
        }
        Ok(features)
    }

    fn parse_overpass_element(&self, element: &Value) -> Option<Feature> {
        let raw_id = element.get("id")?.as_i64()?;
        let element_type = element.get("type")?.as_str()?;
        let tags = Self::tags_from_object(element.get("tags"));

        let geometry = match element_type {
            "node" => {
                let lat = element.get("lat")?.as_f64()?;
                let lon = element.get("lon")?.as_f64()?;
                FeatureGeometry {
                    kind: GeometryKind::Point,
                    rings: vec![vec![GeoPoint::new(lat, lon)]],
                }
            }
            "way" => {
                let ring = Self::ring_from_geometry(element.get("geometry")?)?;
                Self::way_geometry(ring)
            }
            "relation" => self.relation_geometry(raw_id, element.get("members")?)?,
            _ => return None,
        };

        // Relations move to the negative id half, see the type docs
        let id = if element_type == "relation" {
            -raw_id
        } else {
            raw_id
        };

        Some(Feature { id, tags, geometry })
    }

    /// A closed way is a polygon, an open one a line
    fn way_geometry(ring: Vec<GeoPoint>) -> FeatureGeometry {
        let closed = ring.len() >= 4 && ring.first() == ring.last();
        FeatureGeometry {
            kind: if closed {
                GeometryKind::Polygon
            } else {
                GeometryKind::LineString
            },
            rings: vec![ring],
        }
    }

    /// Reduce a multipolygon relation to its first outer ring plus holes
    fn relation_geometry(&self, id: i64, members: &Value) -> Option<FeatureGeometry> {
        let members = members.as_array()?;

        let mut outer: Option<Vec<GeoPoint>> = None;
        let mut holes: Vec<Vec<GeoPoint>> = Vec::new();
        let mut extra_outers = 0usize;

        for member in members {
            let role = member.get("role").and_then(|r| r.as_str()).unwrap_or("");
            let Some(raw_geometry) = member.get("geometry") else {
                continue;
            };
            let Some(ring) = Self::ring_from_geometry(raw_geometry) else {
                continue;
            };

            match role {
                "outer" => {
                    if outer.is_none() {
                        outer = Some(ring);
                    } else {
                        extra_outers += 1;
                    }
                }
                "inner" => holes.push(ring),
                _ => {}
            }
        }

        if extra_outers > 0 {
            tracing::debug!(
                "Relation {} has {} extra outer rings, keeping only the first",
                id,
                extra_outers
            );
        }

        let mut rings = vec![outer?];
        rings.extend(holes);
        Some(FeatureGeometry {
            kind: GeometryKind::MultiPolygon,
            rings,
        })
    }

    fn ring_from_geometry(value: &Value) -> Option<Vec<GeoPoint>> {
        let points = value.as_array()?;
        let mut ring = Vec::with_capacity(points.len());
        for point in points {
            let lat = point.get("lat")?.as_f64()?;
            let lon = point.get("lon")?.as_f64()?;
            ring.push(GeoPoint::new(lat, lon));
        }
        Some(ring)
    }

    fn tags_from_object(value: Option<&Value>) -> Tags {
        let mut tags = Tags::new();
        if let Some(object) = value.and_then(|v| v.as_object()) {
            for (key, value) in object {
                if let Some(text) = value.as_str() {
                    tags.insert(key.clone(), text);
                }
            }
        }
        tags
    }

    /// Parse a GeoJSON FeatureCollection
    fn parse_feature_collection(&self, doc: &Value) -> Result<Vec<Feature>> {
        let entries = doc
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or_else(|| {
                OsmBuildingsError::Parse("No 'features' array in FeatureCollection".to_string())
            })?;

        let mut features = Vec::new();
        for entry in entries {
            match self.parse_geojson_feature(entry) {
                Some(feature) => features.push(feature),
                None => tracing::debug!(
                    "Skipping GeoJSON feature without usable id/geometry: {}",
                    entry.get("id").cloned().unwrap_or(serde_json::Value::Null)
                ),
            }
        }
        Ok(features)
    }

    fn parse_geojson_feature(&self, value: &Value) -> Option<Feature> {
        let id = Self::geojson_id(value)?;
        let tags = Self::tags_from_properties(value.get("properties"));

        let geometry = value.get("geometry")?;
        let coordinates = geometry.get("coordinates")?;
        let geometry = match geometry.get("type")?.as_str()? {
            "Polygon" => FeatureGeometry {
                kind: GeometryKind::Polygon,
                rings: Self::rings_from_positions(coordinates)?,
            },
            "MultiPolygon" => {
                let polygons = coordinates.as_array()?;
                if polygons.len() > 1 {
                    tracing::debug!(
                        "Feature {} is a {}-polygon multipolygon, keeping only the first",
                        id,
                        polygons.len()
                    );
                }
                FeatureGeometry {
                    kind: GeometryKind::MultiPolygon,
                    rings: Self::rings_from_positions(polygons.first()?)?,
                }
            }
            "LineString" => FeatureGeometry {
                kind: GeometryKind::LineString,
                rings: vec![Self::ring_from_positions(coordinates)?],
            },
            "Point" => FeatureGeometry {
                kind: GeometryKind::Point,
                rings: vec![vec![Self::position(coordinates)?]],
            },
            _ => return None,
        };

        Some(Feature { id, tags, geometry })
    }

    /// GeoJSON ids come as numbers or as "way/123"-style strings
    ///
    /// "relation/N" ids are negated, matching the Overpass path.
    fn geojson_id(value: &Value) -> Option<i64> {
        let from_string = |s: &str| -> Option<i64> {
            let id = s.rsplit('/').next()?.parse::<i64>().ok()?;
            Some(if s.starts_with("relation") { -id } else { id })
        };

        match value.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => from_string(s),
            _ => value
                .get("properties")?
                .get("@id")?
                .as_str()
                .and_then(from_string),
        }
    }

    fn tags_from_properties(value: Option<&Value>) -> Tags {
        let mut tags = Tags::new();
        if let Some(object) = value.and_then(|v| v.as_object()) {
            for (key, value) in object {
                match value {
                    Value::String(text) => tags.insert(key.clone(), text.clone()),
                    Value::Number(n) => tags.insert(key.clone(), n.to_string()),
                    Value::Bool(b) => tags.insert(key.clone(), b.to_string()),
                    _ => {}
                }
            }
        }
        tags
    }

    fn rings_from_positions(value: &Value) -> Option<Vec<Vec<GeoPoint>>> {
        let rings = value.as_array()?;
        let mut result = Vec::with_capacity(rings.len());
        for ring in rings {
            result.push(Self::ring_from_positions(ring)?);
        }
        if result.is_empty() {
            return None;
        }
        Some(result)
    }

    fn ring_from_positions(value: &Value) -> Option<Vec<GeoPoint>> {
        let positions = value.as_array()?;
        let mut ring = Vec::with_capacity(positions.len());
        for position in positions {
            ring.push(Self::position(position)?);
        }
        Some(ring)
    }

    /// GeoJSON positions are `[lon, lat]`
    fn position(value: &Value) -> Option<GeoPoint> {
        let pair = value.as_array()?;
        Some(GeoPoint::new(
            pair.get(1)?.as_f64()?,
            pair.get(0)?.as_f64()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERPASS_DOC: &str = r#"{
        "version": 0.6,
        "elements": [
            {
                "type": "way",
                "id": 3001,
                "tags": {"building": "residential", "height": "12"},
                "geometry": [
                    {"lat": 52.500, "lon": 13.400},
                    {"lat": 52.500, "lon": 13.401},
                    {"lat": 52.501, "lon": 13.401},
                    {"lat": 52.501, "lon": 13.400},
                    {"lat": 52.500, "lon": 13.400}
                ]
            },
            {
                "type": "way",
                "id": 2001,
                "tags": {"highway": "residential"},
                "geometry": [
                    {"lat": 52.499, "lon": 13.399},
                    {"lat": 52.502, "lon": 13.402}
                ]
            },
            {
                "type": "relation",
                "id": 4001,
                "tags": {"building": "yes", "type": "multipolygon"},
                "members": [
                    {
                        "type": "way",
                        "role": "outer",
                        "geometry": [
                            {"lat": 52.510, "lon": 13.410},
                            {"lat": 52.510, "lon": 13.412},
                            {"lat": 52.512, "lon": 13.412},
                            {"lat": 52.512, "lon": 13.410},
                            {"lat": 52.510, "lon": 13.410}
                        ]
                    },
                    {
                        "type": "way",
                        "role": "inner",
                        "geometry": [
                            {"lat": 52.5105, "lon": 13.4105},
                            {"lat": 52.5105, "lon": 13.4110},
                            {"lat": 52.5110, "lon": 13.4110},
                            {"lat": 52.5110, "lon": 13.4105},
                            {"lat": 52.5105, "lon": 13.4105}
                        ]
                    }
                ]
            },
            {
                "type": "node",
                "id": 5001,
                "lat": 52.5015,
                "lon": 13.4015,
                "tags": {"amenity": "cafe"}
            },
            {
                "type": "area",
                "id": 6001
            }
        ]
    }"#;

    #[test]
    fn test_parse_overpass() {
        let parser = FeatureParser;
        let features = parser.parse(OVERPASS_DOC).unwrap();

        // The unknown "area" element is skipped
        assert_eq!(features.len(), 4);

        let building = &features[0];
        assert_eq!(building.id, 3001);
        assert_eq!(building.geometry.kind, GeometryKind::Polygon);
        assert!(building.is_building());
        assert_eq!(building.tags.meters("height"), Some(12.0));
        assert_eq!(building.geometry.outer().unwrap().len(), 5);

        let street = &features[1];
        assert_eq!(street.geometry.kind, GeometryKind::LineString);
        assert!(!street.geometry.is_area());

        let relation = &features[2];
        assert_eq!(relation.id, -4001);
        assert_eq!(relation.geometry.kind, GeometryKind::MultiPolygon);
        assert_eq!(relation.geometry.rings.len(), 2);
        assert_eq!(relation.geometry.holes().len(), 1);

        let cafe = &features[3];
        assert_eq!(cafe.geometry.kind, GeometryKind::Point);
    }

    #[test]
    fn test_parse_overpass_skips_malformed() {
        let parser = FeatureParser;
        let doc = r#"{
            "elements": [
                {"type": "way", "tags": {"building": "yes"}},
                {
                    "type": "way",
                    "id": 1,
                    "tags": {"building": "yes"},
                    "geometry": [
                        {"lat": 52.5, "lon": 13.4},
                        {"lat": 52.5, "lon": 13.5},
                        {"lat": 52.6, "lon": 13.5},
                        {"lat": 52.5, "lon": 13.4}
                    ]
                }
            ]
        }"#;

        // The way without an id is dropped, the valid one survives
        let features = parser.parse(doc).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, 1);
    }

    #[test]
    fn test_way_and_relation_ids_stay_disjoint() {
        let parser = FeatureParser;
        let doc = r#"{
            "elements": [
                {
                    "type": "way",
                    "id": 7,
                    "tags": {"building": "yes"},
                    "geometry": [
                        {"lat": 52.500, "lon": 13.400},
                        {"lat": 52.500, "lon": 13.401},
                        {"lat": 52.501, "lon": 13.401},
                        {"lat": 52.500, "lon": 13.400}
                    ]
                },
                {
                    "type": "relation",
                    "id": 7,
                    "tags": {"building": "yes", "type": "multipolygon"},
                    "members": [
                        {
                            "type": "way",
                            "role": "outer",
                            "geometry": [
                                {"lat": 52.510, "lon": 13.410},
                                {"lat": 52.510, "lon": 13.412},
                                {"lat": 52.512, "lon": 13.412},
                                {"lat": 52.510, "lon": 13.410}
                            ]
                        }
                    ]
                }
            ]
        }"#;

        // A way and a relation may legitimately share a raw OSM id;
        // both must survive with distinct feature ids
        let features = parser.parse(doc).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, 7);
        assert_eq!(features[1].id, -7);
    }

    const GEOJSON_DOC: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "way/123",
                "properties": {"building": "yes", "building:levels": 3},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[13.400, 52.500], [13.401, 52.500], [13.401, 52.501], [13.400, 52.501], [13.400, 52.500]],
                        [[13.4003, 52.5003], [13.4007, 52.5003], [13.4007, 52.5007], [13.4003, 52.5007], [13.4003, 52.5003]]
                    ]
                }
            },
            {
                "type": "Feature",
                "id": 456,
                "properties": {"building:part": "yes"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[13.410, 52.510], [13.412, 52.510], [13.412, 52.512], [13.410, 52.510]]],
                        [[[13.420, 52.520], [13.422, 52.520], [13.422, 52.522], [13.420, 52.520]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "id": "relation/789",
                "properties": {"building": "yes"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[13.430, 52.530], [13.432, 52.530], [13.432, 52.532], [13.430, 52.530]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let parser = FeatureParser;
        let features = parser.parse(GEOJSON_DOC).unwrap();
        assert_eq!(features.len(), 3);

        let building = &features[0];
        assert_eq!(building.id, 123); // Extracted from "way/123"
        assert_eq!(building.geometry.kind, GeometryKind::Polygon);
        assert_eq!(building.geometry.rings.len(), 2);
        // Numeric property coerced to a string tag
        assert_eq!(building.tags.number("building:levels"), Some(3.0));
        // GeoJSON position order [lon, lat] is swapped into lat/lon
        let first = building.geometry.outer().unwrap()[0];
        assert_eq!(first.lat, 52.5);
        assert_eq!(first.lon, 13.4);

        let part = &features[1];
        assert_eq!(part.id, 456);
        // Only the first polygon of the multipolygon is kept
        assert_eq!(part.geometry.rings.len(), 1);

        // "relation/N" ids land in the negated id space
        let relation = &features[2];
        assert_eq!(relation.id, -789);
    }

    #[test]
    fn test_parse_rejects_unknown_documents() {
        let parser = FeatureParser;

        assert!(parser.parse("not json at all").is_err());
        assert!(parser.parse(r#"{"type": "Feature"}"#).is_err());
        assert!(parser.parse(r#"{"foo": 1}"#).is_err());
    }

    #[test]
    fn test_format_detection() {
        let parser = FeatureParser;

        let overpass = parser.parse(r#"{"elements": []}"#).unwrap();
        assert!(overpass.is_empty());

        let geojson = parser
            .parse(r#"{"type": "FeatureCollection", "features": []}"#)
            .unwrap();
        assert!(geojson.is_empty());
    }
}
