/// Tolerant decoding of API bodies
///
/// A body that is valid JSON but not the expected shape decodes to an empty
/// result. Individual photo records that do not parse are skipped.

use serde_json::Value;
use tracing::warn;

use super::request::FilterOptions;
use crate::state::data::{scalar_to_string, Facet, Photo};

/// Decode a filter-options object such as `{"Year": ["2023"], "Event": [...]}`
pub fn decode_filter_options(body: &str) -> Result<FilterOptions, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    let mut options = FilterOptions::default();

    let Value::Object(map) = value else {
        warn!("⚠️  Filter options response is not an object, treating as empty");
        return Ok(options);
    };

    for facet in Facet::ALL {
        match map.get(facet.as_str()) {
            Some(Value::Array(items)) => {
                options.insert(facet, items.iter().filter_map(scalar_to_string).collect());
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                warn!("⚠️  Ignoring non-array {} options: {}", facet, other);
            }
        }
    }

    Ok(options)
}

/// Decode a JSON array of photo records
pub fn decode_photos(body: &str) -> Result<Vec<Photo>, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;

    let Value::Array(items) = value else {
        warn!("⚠️  Photo response is not an array, treating as empty");
        return Ok(Vec::new());
    };

    let total = items.len();
    let photos: Vec<Photo> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Photo>(item) {
            Ok(photo) => Some(photo),
            Err(e) => {
                warn!("⚠️  Skipping malformed photo record: {}", e);
                None
            }
        })
        .collect();

    if photos.len() < total {
        warn!("⚠️  Kept {} of {} photo records", photos.len(), total);
    }

    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_options_tolerate_any_subset() {
        let body = json!({ "Event": ["F1", "GT"], "Team": null, "Misc": "oops" }).to_string();
        let options = decode_filter_options(&body).unwrap();

        assert_eq!(options.get(Facet::Event), Some(&["F1".to_string(), "GT".to_string()][..]));
        assert_eq!(options.get(Facet::Year), None);
        assert_eq!(options.get(Facet::Team), None);
        assert_eq!(options.get(Facet::Misc), None);
    }

    #[test]
    fn test_numeric_years_become_strings() {
        let options = decode_filter_options(r#"{"Year": [2022, "2023", true]}"#).unwrap();
        assert_eq!(options.get(Facet::Year), Some(&["2022".to_string(), "2023".to_string()][..]));
    }

    #[test]
    fn test_wrong_shape_is_empty() {
        assert_eq!(decode_filter_options("[1, 2]").unwrap(), FilterOptions::default());
        assert!(decode_photos(r#"{"message": "Internal server error"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(decode_photos("<html>").is_err());
        assert!(decode_filter_options("").is_err());
    }

    #[test]
    fn test_bad_photo_records_are_skipped() {
        let body = json!([
            { "id": "b", "thumbnailUrl": "tb", "hiResUrl": "hb", "Year": "2023" },
            { "thumbnailUrl": "missing-id", "hiResUrl": "h" },
            { "id": "a", "thumbnailUrl": "ta", "hiResUrl": "ha" }
        ])
        .to_string();

        let ids: Vec<String> = decode_photos(&body).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
