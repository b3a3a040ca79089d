//! Typed IIIF presentation manifest model
//!
//! The two manifest dialects are structurally incompatible: v3 nests canvases
//! under a top-level `items` array, v2 under `sequences[*].canvases`. The
//! dialect is decided exactly once, by probing the parsed JSON for those keys,
//! and the result is an explicit tagged union ([`Manifest`]) that downstream
//! code matches exhaustively. A document with neither key is rejected as an
//! unrecognized dialect.
//!
//! Only the schema subset needed for image resolution is modeled; all other
//! manifest fields are ignored. Fields that may be absent in the wild default
//! to `None`/empty so that a single sloppy canvas degrades to a warning during
//! resolution instead of failing the whole document.

use crate::error::ManifestError;
use serde::Deserialize;
use serde_json::Value;

/// A parsed manifest with its dialect decided
#[derive(Clone, Debug, PartialEq)]
pub enum Manifest {
    /// IIIF Presentation API v2 (`sequences` shape)
    V2(ManifestV2),
    /// IIIF Presentation API v3 (`items` shape)
    V3(ManifestV3),
}

impl Manifest {
    /// Decide the dialect of a parsed JSON document and decode it
    ///
    /// Probing order follows the reference tool: a top-level `items` key wins
    /// (v3), then `sequences` (v2); neither is an
    /// [`UnrecognizedDialect`](ManifestError::UnrecognizedDialect) error.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        let Some(object) = value.as_object() else {
            return Err(ManifestError::UnrecognizedDialect);
        };

        if object.contains_key("items") {
            serde_json::from_value(value)
                .map(Manifest::V3)
                .map_err(|source| ManifestError::Decode { dialect: "v3", source })
        } else if object.contains_key("sequences") {
            serde_json::from_value(value)
                .map(Manifest::V2)
                .map_err(|source| ManifestError::Decode { dialect: "v2", source })
        } else {
            Err(ManifestError::UnrecognizedDialect)
        }
    }

    /// Parse a raw JSON byte body and decide its dialect
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Dialect name for logging ("v2" or "v3")
    pub fn dialect(&self) -> &'static str {
        match self {
            Manifest::V2(_) => "v2",
            Manifest::V3(_) => "v3",
        }
    }
}

/// IIIF v3 manifest subset: `items` carries the canvases
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ManifestV3 {
    /// Canvases in presentation order
    #[serde(default)]
    pub items: Vec<CanvasV3>,
}

/// A v3 canvas: labeled, with nested annotation pages
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CanvasV3 {
    /// Canvas label; the filename comes from `label.none[0]`
    #[serde(default)]
    pub label: Option<LabelV3>,
    /// Annotation pages under this canvas
    #[serde(default)]
    pub items: Vec<AnnotationPageV3>,
}

/// A v3 language map label (only the `none` entry is consumed)
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LabelV3 {
    /// Values under the `none` language key
    #[serde(default)]
    pub none: Vec<String>,
}

/// A v3 annotation page: a list of painting annotations
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AnnotationPageV3 {
    /// Annotations on this page
    #[serde(default)]
    pub items: Vec<AnnotationV3>,
}

/// A v3 annotation whose body references the image content
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AnnotationV3 {
    /// The annotation body; either a single resource or a list of them
    #[serde(default)]
    pub body: Option<AnnotationBody>,
}

/// A v3 annotation body: a single image resource or a list of resources
///
/// Multiple image bodies per annotation are not supported; resolution takes
/// the first element of a list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnnotationBody {
    /// The common case: one image resource object
    One(ImageBody),
    /// A choice/list of image resources
    Many(Vec<ImageBody>),
}

impl AnnotationBody {
    /// The image URL of this body: the `id` of the single resource, or of the
    /// first resource when the body is a list
    pub fn first_id(&self) -> Option<&str> {
        match self {
            AnnotationBody::One(body) => body.id.as_deref(),
            AnnotationBody::Many(bodies) => bodies.first().and_then(|b| b.id.as_deref()),
        }
    }
}

/// A v3 image resource carrying the image URL in `id`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ImageBody {
    /// The image URL
    #[serde(default)]
    pub id: Option<String>,
}

/// IIIF v2 manifest subset: canvases live under `sequences`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ManifestV2 {
    /// Sequences in presentation order
    #[serde(default)]
    pub sequences: Vec<SequenceV2>,
}

/// A v2 sequence of canvases
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SequenceV2 {
    /// Canvases in presentation order
    #[serde(default)]
    pub canvases: Vec<CanvasV2>,
}

/// A v2 canvas with an optional label and its image annotations
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CanvasV2 {
    /// Canvas label; when absent the filename falls back to a running index
    #[serde(default)]
    pub label: Option<String>,
    /// Image annotations on this canvas
    #[serde(default)]
    pub images: Vec<ImageAnnotationV2>,
}

/// A v2 image annotation wrapping the actual resource
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ImageAnnotationV2 {
    /// The referenced image resource
    #[serde(default)]
    pub resource: Option<ResourceV2>,
}

/// A v2 image resource: `@id` plus an optional image service
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ResourceV2 {
    /// The resource identifier (`@id`)
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    /// The IIIF image service advertised for this resource
    #[serde(default)]
    pub service: Option<ServiceV2>,
}

/// A v2 image service reference
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ServiceV2 {
    /// The service endpoint (`@id`)
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_items_decides_v3() {
        let value = json!({
            "items": [
                {
                    "label": { "none": ["Page 1"] },
                    "items": [
                        { "items": [ { "body": { "id": "http://x/img1.jpg" } } ] }
                    ]
                }
            ]
        });
        let manifest = Manifest::from_value(value).unwrap();
        assert_eq!(manifest.dialect(), "v3");
        let Manifest::V3(v3) = manifest else {
            panic!("expected v3");
        };
        assert_eq!(v3.items.len(), 1);
        assert_eq!(
            v3.items[0].label.as_ref().unwrap().none,
            vec!["Page 1".to_string()]
        );
    }

    #[test]
    fn test_probe_sequences_decides_v2() {
        let value = json!({
            "sequences": [
                {
                    "canvases": [
                        { "images": [ { "resource": { "@id": "http://x/res1" } } ] }
                    ]
                }
            ]
        });
        let manifest = Manifest::from_value(value).unwrap();
        assert_eq!(manifest.dialect(), "v2");
        let Manifest::V2(v2) = manifest else {
            panic!("expected v2");
        };
        let resource = v2.sequences[0].canvases[0].images[0].resource.as_ref().unwrap();
        assert_eq!(resource.id.as_deref(), Some("http://x/res1"));
    }

    #[test]
    fn test_items_wins_when_both_keys_present() {
        // Structural probing checks `items` first, like the reference tool
        let value = json!({ "items": [], "sequences": [] });
        let manifest = Manifest::from_value(value).unwrap();
        assert_eq!(manifest.dialect(), "v3");
    }

    #[test]
    fn test_neither_key_is_unrecognized_dialect() {
        let err = Manifest::from_value(json!({ "@context": "http://iiif.io" })).unwrap_err();
        assert!(matches!(err, ManifestError::UnrecognizedDialect));

        let err = Manifest::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ManifestError::UnrecognizedDialect));
    }

    #[test]
    fn test_body_list_takes_first_id() {
        let body: AnnotationBody = serde_json::from_value(json!([
            { "id": "http://x/first.jpg" },
            { "id": "http://x/second.jpg" }
        ]))
        .unwrap();
        assert_eq!(body.first_id(), Some("http://x/first.jpg"));

        let body: AnnotationBody =
            serde_json::from_value(json!({ "id": "http://x/only.jpg" })).unwrap();
        assert_eq!(body.first_id(), Some("http://x/only.jpg"));

        let body: AnnotationBody = serde_json::from_value(json!([])).unwrap();
        assert_eq!(body.first_id(), None);
    }

    #[test]
    fn test_from_slice_rejects_invalid_json() {
        let err = Manifest::from_slice(b"<html>not json</html>").unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        // A canvas without label or images must decode, not error
        let value = json!({ "sequences": [ { "canvases": [ {} ] } ] });
        let Manifest::V2(v2) = Manifest::from_value(value).unwrap() else {
            panic!("expected v2");
        };
        let canvas = &v2.sequences[0].canvases[0];
        assert!(canvas.label.is_none());
        assert!(canvas.images.is_empty());
    }
}
