//! GeoJSON point reader for regions of interest

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::Point;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::UnsupportedDataType(format!("GeoJSON: {}", reason.into()))
}

/// Parse a GeoJSON FeatureCollection of Point features
pub fn parse_points(text: &str) -> Result<FeatureCollection> {
    let root: Value = serde_json::from_str(text)?;
    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("expected a FeatureCollection"))?;

    let mut out = FeatureCollection::new();
    for (i, f) in features.iter().enumerate() {
        let geometry = f
            .get("geometry")
            .ok_or_else(|| invalid(format!("feature {} has no geometry", i)))?;
        if geometry.get("type").and_then(Value::as_str) != Some("Point") {
            return Err(invalid(format!("feature {} is not a Point", i)));
        }
        let coords = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .filter(|c| c.len() >= 2)
            .ok_or_else(|| invalid(format!("feature {} has bad coordinates", i)))?;
        let (Some(x), Some(y)) = (coords[0].as_f64(), coords[1].as_f64()) else {
            return Err(invalid(format!("feature {} has bad coordinates", i)));
        };

        let mut feature = Feature::new(Point::new(x, y));
        if let Some(props) = f.get("properties").and_then(Value::as_object) {
            for (k, v) in props {
                feature.set_property(k.as_str(), attribute(v));
            }
        }
        out.push(feature);
    }
    Ok(out)
}

/// Read point features from a GeoJSON file
pub fn read_points(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::AssetNotFound {
            path: path.to_path_buf(),
        });
    }
    parse_points(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [123.0, 10.6]},
             "properties": {"ClassID2": 0, "note": "forest"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [123.1, 10.7]},
             "properties": {"ClassID2": 4.0}}
        ]
    }"#;

    #[test]
    fn test_parse_points() {
        let fc = parse_points(SAMPLE).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].get_class("ClassID2"), Some(0));
        assert_eq!(fc.features[1].get_class("ClassID2"), Some(4));
        assert_eq!(fc.features[1].geometry.y(), 10.7);
    }

    #[test]
    fn test_rejects_polygons() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Polygon","coordinates":[]},"properties":{}}]}"#;
        assert!(parse_points(text).is_err());
        assert!(parse_points("{}").is_err());
    }
}
