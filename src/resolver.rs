//! Manifest resolution: from a typed [`Manifest`] to an ordered list of
//! (filename, URL) pairs
//!
//! Resolution is a pure function over the parsed document; no I/O happens
//! here. Canvases that yield no usable image identifier are logged and
//! skipped, they never fail the run.
//!
//! Two provider quirks are encoded as named predicates rather than inline
//! string checks:
//!
//! - `is_known_provider_exception`: the Vatican Library (`vatlib`) publishes
//!   resource `@id`s that are not directly fetchable; the image service
//!   endpoint is canonical there instead.
//! - `has_default_suffix`: a v2 `@id` that already names a concrete Image
//!   API request (contains `default`) is used verbatim, anything else gets the
//!   Image API default request appended.

use crate::manifest::{Manifest, ManifestV2, ManifestV3};
use crate::types::ImageReference;
use tracing::{debug, warn};

/// IIIF Image API default request appended to bare v2 resource identifiers
const IMAGE_API_DEFAULT_REQUEST: &str = "/full/full/0/default/default.jpg";

/// Image API request used against a `vatlib` service endpoint
const VATLIB_SERVICE_REQUEST: &str = "/full/full/0/default.jpg";

/// True for resource identifiers of the known provider whose `@id` is not
/// fetchable (the image service endpoint must be used instead)
fn is_known_provider_exception(id: &str) -> bool {
    id.contains("vatlib")
}

/// True when the identifier already names a concrete Image API request
fn has_default_suffix(id: &str) -> bool {
    id.contains("default")
}

/// Resolve a manifest into its ordered list of image references
///
/// The order matches manifest traversal order. Filenames are not guaranteed
/// unique; duplicate canvas labels collide and the later file overwrites the
/// earlier one.
pub fn resolve(manifest: &Manifest) -> Vec<ImageReference> {
    let references = match manifest {
        Manifest::V3(v3) => resolve_v3(v3),
        Manifest::V2(v2) => resolve_v2(v2),
    };
    debug!(
        dialect = manifest.dialect(),
        count = references.len(),
        "Resolved manifest"
    );
    references
}

/// v3: `items` (canvases) → `items` (annotation pages) → `items` (annotations)
///
/// The filename comes from the canvas `label.none[0]`, defaulting to the
/// empty string. Every annotation under the canvas shares that filename.
fn resolve_v3(manifest: &ManifestV3) -> Vec<ImageReference> {
    let mut references = Vec::new();

    for canvas in &manifest.items {
        let label = canvas
            .label
            .as_ref()
            .and_then(|l| l.none.first())
            .map(String::as_str)
            .unwrap_or("");
        let filename = format!("{label}.jpg");

        for page in &canvas.items {
            for annotation in &page.items {
                let image_url = annotation.body.as_ref().and_then(|b| b.first_id());
                match image_url {
                    Some(url) if !url.is_empty() => {
                        references.push(ImageReference::new(filename.clone(), url));
                    }
                    _ => warn!(filename = %filename, "No image URL found in annotation"),
                }
            }
        }
    }

    references
}

/// v2: `sequences[*].canvases[*].images[*].resource`
///
/// The fallback filename index is 1-based and runs across all sequences; it
/// advances once per canvas whether or not the label branch is taken.
fn resolve_v2(manifest: &ManifestV2) -> Vec<ImageReference> {
    let mut references = Vec::new();
    let mut index: u32 = 1;

    for sequence in &manifest.sequences {
        for canvas in &sequence.canvases {
            let filename = match &canvas.label {
                Some(label) => format!("{label}.jpg"),
                None => format!("{index}.jpg"),
            };
            index += 1;

            for image in &canvas.images {
                let Some(resource) = image.resource.as_ref() else {
                    warn!(filename = %filename, "Image annotation has no resource");
                    continue;
                };
                let Some(id) = resource.id.as_deref().filter(|id| !id.is_empty()) else {
                    warn!(filename = %filename, "Resource has no @id");
                    continue;
                };

                if is_known_provider_exception(id) {
                    // The @id is not fetchable for this provider; derive the
                    // URL from the image service endpoint instead
                    match resource.service.as_ref().and_then(|s| s.id.as_deref()) {
                        Some(service_id) if !service_id.is_empty() => {
                            let url = format!("{service_id}{VATLIB_SERVICE_REQUEST}");
                            references.push(ImageReference::new(filename.clone(), url));
                        }
                        _ => {
                            warn!(filename = %filename, "Provider-exception resource has no service @id")
                        }
                    }
                } else if !has_default_suffix(id) {
                    let url = format!("{id}{IMAGE_API_DEFAULT_REQUEST}");
                    references.push(ImageReference::new(filename.clone(), url));
                } else {
                    references.push(ImageReference::new(filename.clone(), id));
                }
            }
        }
    }

    references
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve_json(value: serde_json::Value) -> Vec<ImageReference> {
        resolve(&Manifest::from_value(value).unwrap())
    }

    #[test]
    fn test_v3_single_canvas_scenario() {
        let refs = resolve_json(json!({
            "items": [
                {
                    "label": { "none": ["Page 1"] },
                    "items": [
                        { "items": [ { "body": { "id": "http://x/img1.jpg" } } ] }
                    ]
                }
            ]
        }));
        assert_eq!(
            refs,
            vec![ImageReference::new("Page 1.jpg", "http://x/img1.jpg")]
        );
    }

    #[test]
    fn test_v3_n_canvases_resolve_in_order() {
        let items: Vec<_> = (1..=5)
            .map(|n| {
                json!({
                    "label": { "none": [format!("Page {n}")] },
                    "items": [
                        { "items": [ { "body": { "id": format!("http://x/img{n}.jpg") } } ] }
                    ]
                })
            })
            .collect();
        let refs = resolve_json(json!({ "items": items }));
        assert_eq!(refs.len(), 5);
        for (i, reference) in refs.iter().enumerate() {
            let n = i + 1;
            assert_eq!(reference.filename, format!("Page {n}.jpg"));
            assert_eq!(reference.url, format!("http://x/img{n}.jpg"));
        }
    }

    #[test]
    fn test_v3_missing_label_yields_bare_jpg() {
        let refs = resolve_json(json!({
            "items": [
                { "items": [ { "items": [ { "body": { "id": "http://x/a.jpg" } } ] } ] }
            ]
        }));
        assert_eq!(refs, vec![ImageReference::new(".jpg", "http://x/a.jpg")]);
    }

    #[test]
    fn test_v3_list_body_uses_first_element_only() {
        let refs = resolve_json(json!({
            "items": [
                {
                    "label": { "none": ["Choice"] },
                    "items": [
                        {
                            "items": [
                                {
                                    "body": [
                                        { "id": "http://x/color.jpg" },
                                        { "id": "http://x/gray.jpg" }
                                    ]
                                }
                            ]
                        }
                    ]
                }
            ]
        }));
        assert_eq!(
            refs,
            vec![ImageReference::new("Choice.jpg", "http://x/color.jpg")]
        );
    }

    #[test]
    fn test_v3_missing_image_url_is_skipped_not_fatal() {
        let refs = resolve_json(json!({
            "items": [
                {
                    "label": { "none": ["Broken"] },
                    "items": [ { "items": [ { "body": { "id": "" } }, {} ] } ]
                },
                {
                    "label": { "none": ["Good"] },
                    "items": [ { "items": [ { "body": { "id": "http://x/good.jpg" } } ] } ]
                }
            ]
        }));
        assert_eq!(
            refs,
            vec![ImageReference::new("Good.jpg", "http://x/good.jpg")]
        );
    }

    #[test]
    fn test_v2_single_canvas_scenario() {
        let refs = resolve_json(json!({
            "sequences": [
                { "canvases": [ { "images": [ { "resource": { "@id": "http://x/res1" } } ] } ] }
            ]
        }));
        assert_eq!(
            refs,
            vec![ImageReference::new(
                "1.jpg",
                "http://x/res1/full/full/0/default/default.jpg"
            )]
        );
    }

    #[test]
    fn test_v2_unlabeled_canvases_number_across_sequences() {
        let canvas = |n: u32| {
            json!({ "images": [ { "resource": { "@id": format!("http://x/res{n}") } } ] })
        };
        let refs = resolve_json(json!({
            "sequences": [
                { "canvases": [ canvas(1), canvas(2) ] },
                { "canvases": [ canvas(3) ] }
            ]
        }));
        let filenames: Vec<_> = refs.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(filenames, vec!["1.jpg", "2.jpg", "3.jpg"]);
    }

    #[test]
    fn test_v2_label_takes_precedence_but_index_still_advances() {
        let refs = resolve_json(json!({
            "sequences": [
                {
                    "canvases": [
                        { "label": "Cover", "images": [ { "resource": { "@id": "http://x/cover" } } ] },
                        { "images": [ { "resource": { "@id": "http://x/page" } } ] }
                    ]
                }
            ]
        }));
        let filenames: Vec<_> = refs.iter().map(|r| r.filename.as_str()).collect();
        // The index advanced past the labeled canvas, so the unlabeled one is 2
        assert_eq!(filenames, vec!["Cover.jpg", "2.jpg"]);
    }

    #[test]
    fn test_v2_vatlib_resource_uses_service_endpoint() {
        let refs = resolve_json(json!({
            "sequences": [
                {
                    "canvases": [
                        {
                            "images": [
                                {
                                    "resource": {
                                        "@id": "http://digi.vatlib.it/whatever/ignored",
                                        "service": { "@id": "http://digi.vatlib.it/iiif/MSS_Vat.lat.1/p1" }
                                    }
                                }
                            ]
                        }
                    ]
                }
            ]
        }));
        assert_eq!(
            refs,
            vec![ImageReference::new(
                "1.jpg",
                "http://digi.vatlib.it/iiif/MSS_Vat.lat.1/p1/full/full/0/default.jpg"
            )]
        );
    }

    #[test]
    fn test_v2_id_with_default_is_used_verbatim() {
        let url = "http://x/iiif/res1/full/full/0/default.jpg";
        let refs = resolve_json(json!({
            "sequences": [
                { "canvases": [ { "images": [ { "resource": { "@id": url } } ] } ] }
            ]
        }));
        assert_eq!(refs, vec![ImageReference::new("1.jpg", url)]);
    }

    #[test]
    fn test_v2_missing_resource_or_id_is_skipped() {
        let refs = resolve_json(json!({
            "sequences": [
                {
                    "canvases": [
                        { "images": [ {}, { "resource": { "@id": "" } } ] },
                        { "images": [ { "resource": { "@id": "http://x/ok" } } ] }
                    ]
                }
            ]
        }));
        // First canvas contributes nothing but still consumed index 1
        assert_eq!(
            refs,
            vec![ImageReference::new(
                "2.jpg",
                "http://x/ok/full/full/0/default/default.jpg"
            )]
        );
    }

    #[test]
    fn test_v2_multiple_images_share_canvas_filename() {
        let refs = resolve_json(json!({
            "sequences": [
                {
                    "canvases": [
                        {
                            "label": "Folio",
                            "images": [
                                { "resource": { "@id": "http://x/recto" } },
                                { "resource": { "@id": "http://x/verso" } }
                            ]
                        }
                    ]
                }
            ]
        }));
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.filename == "Folio.jpg"));
    }

    #[test]
    fn test_provider_predicates() {
        assert!(is_known_provider_exception("http://digi.vatlib.it/iiif/x"));
        assert!(!is_known_provider_exception("http://gallica.bnf.fr/iiif/x"));
        assert!(has_default_suffix("http://x/full/full/0/default.jpg"));
        assert!(!has_default_suffix("http://x/iiif/res1"));
    }
}
