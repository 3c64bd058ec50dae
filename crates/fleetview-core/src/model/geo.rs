// ── GeoJSON types ──
//
// The minimal GeoJSON subset the map layers use: Point and LineString
// features with free-form properties, wrapped in a FeatureCollection.

use serde::{Deserialize, Serialize};

/// Geometry of a single feature. Coordinates are `[lon, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    /// A Point feature with a single string property.
    pub fn point(lon_lat: [f64; 2], key: &str, value: &str) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(key.to_owned(), serde_json::Value::String(value.to_owned()));
        Self {
            geometry: Geometry::Point { coordinates: lon_lat },
            properties,
        }
    }

    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            geometry: Geometry::LineString { coordinates },
            properties: serde_json::Map::new(),
        }
    }

    /// Read a string property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Smallest box containing every `[lon, lat]` point, or `None` for no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut iter = points.into_iter();
        let [lon, lat] = iter.next()?;
        let init = Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        };
        Some(iter.fold(init, |b, [lon, lat]| Self {
            min_lon: b.min_lon.min(lon),
            min_lat: b.min_lat.min(lat),
            max_lon: b.max_lon.max(lon),
            max_lat: b.max_lat.max(lat),
        }))
    }

    /// `[lon, lat]` of the box centre.
    pub fn center(&self) -> [f64; 2] {
        [
            f64::midpoint(self.min_lon, self.max_lon),
            f64::midpoint(self.min_lat, self.max_lat),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_feature_serializes_as_geojson() {
        let fc = FeatureCollection::new(vec![Feature::point([4.9, 52.3], "title", "Stop")]);
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [4.9, 52.3] },
                    "properties": { "title": "Stop" }
                }]
            })
        );
    }

    #[test]
    fn empty_collection_keeps_type_tag() {
        let value = serde_json::to_value(FeatureCollection::empty()).unwrap();
        assert_eq!(value, json!({ "type": "FeatureCollection", "features": [] }));
    }

    #[test]
    fn bounds_cover_all_points() {
        let b = Bounds::from_points([[1.0, 5.0], [3.0, -2.0], [2.0, 0.0]]).unwrap();
        assert_eq!(
            b,
            Bounds {
                min_lon: 1.0,
                min_lat: -2.0,
                max_lon: 3.0,
                max_lat: 5.0
            }
        );
        assert_eq!(b.center(), [2.0, 1.5]);
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }
}
