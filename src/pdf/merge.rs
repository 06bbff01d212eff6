//! Compositing overlays onto existing pages using lopdf

use std::collections::BTreeSet;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use log::debug;
use crate::error::{Error, Result};
use super::metadata::page_resources;
use super::overlay::overlay_page_id;

/// Merge a one-page overlay PDF on top of a page of `target`
///
/// The page's original content streams are kept and wrapped in `q`/`Q`
/// so that any transformation they leave behind does not affect the
/// overlay. The overlay's content is appended after them, so it is drawn
/// on top, and its resources are merged into the page's resources. The
/// overlay document is consumed.
pub fn merge_overlay(target: &mut Document, page_id: ObjectId, mut overlay: Document) -> Result<()> {
    // Renumber the overlay so its objects cannot collide with ours
    overlay.renumber_objects_with(target.max_id + 1);

    let overlay_page = overlay_page_id(&overlay)?;
    let (overlay_contents, overlay_resources) = {
        let page = overlay.get_dictionary(overlay_page)?;
        let resources = match page.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => overlay.get_dictionary(*id)?.clone(),
            _ => Dictionary::new(),
        };
        (content_refs(&overlay, overlay_page), resources)
    };

    // Everything but the overlay's own page tree moves into the target
    let skeleton = overlay_skeleton(&overlay, overlay_page);
    let overlay_max_id = overlay.max_id;
    let mut moved = 0;
    for (id, object) in overlay.objects {
        if !skeleton.contains(&id) {
            target.objects.insert(id, object);
            moved += 1;
        }
    }
    target.max_id = target.max_id.max(overlay_max_id);
    debug!("Merged {} overlay objects into page {:?}", moved, page_id);

    let resources = page_resources(target, page_id)?;
    let merged = merge_resources(target, resources, &overlay_resources);

    let original = content_refs(target, page_id);

    let open_id = target.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close_id = target.add_object(Stream::new(Dictionary::new(), b"Q\n".to_vec()));

    let Object::Dictionary(page_dict) = target.get_object_mut(page_id)? else {
        return Err(Error::General(format!("Page {:?} is not a dictionary", page_id)));
    };

    let mut contents = vec![Object::Reference(open_id)];
    contents.extend(original);
    contents.push(Object::Reference(close_id));
    contents.extend(overlay_contents);

    page_dict.set("Contents", Object::Array(contents));
    page_dict.set("Resources", Object::Dictionary(merged));

    Ok(())
}

/// Catalog, page tree nodes and the page itself of a one-page overlay
fn overlay_skeleton(overlay: &Document, page_id: ObjectId) -> BTreeSet<ObjectId> {
    let mut ids = BTreeSet::from([page_id]);

    if let Ok(Object::Reference(root_id)) = overlay.trailer.get(b"Root") {
        ids.insert(*root_id);
    }
    if let Ok(Object::Reference(pages_id)) = overlay
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Parent"))
    {
        ids.insert(*pages_id);
    }

    ids
}

/// Content stream references of a page
///
/// Contents may be a stream reference, an array of them, or a reference
/// to such an array; the result is always the flat list of streams.
fn content_refs(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    doc.get_page_contents(page_id)
        .into_iter()
        .map(Object::Reference)
        .collect()
}

/// Merge overlay resources into a page's resources dictionary
///
/// Resource categories (Font, XObject, ...) present on both sides are
/// merged entry by entry, resolving indirect category dictionaries on the
/// page side. Overlay names are brand-prefixed, so they do not shadow the
/// page's own resources.
fn merge_resources(doc: &Document, mut page_resources: Dictionary, overlay_resources: &Dictionary) -> Dictionary {
    for (key, value) in overlay_resources.iter() {
        let existing = match page_resources.get(key) {
            Ok(Object::Dictionary(dict)) => Some(dict.clone()),
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok().cloned(),
            _ => None,
        };

        match (existing, value) {
            (Some(mut merged), Object::Dictionary(overlay_sub)) => {
                for (subkey, subvalue) in overlay_sub.iter() {
                    merged.set(subkey.clone(), subvalue.clone());
                }
                page_resources.set(key.clone(), Object::Dictionary(merged));
            }
            _ => page_resources.set(key.clone(), value.clone()),
        }
    }

    page_resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrandSpec;
    use crate::layout::PageGeometry;
    use crate::pdf::overlay::{render_overlay, PageBrand};

    /// Single-page document whose content leaves a scaling transform behind
    fn transformed_page() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]));

        let content = b".24 0 0 -.24 0 792 cm\nBT /F1 40 Tf 100 100 Td (Body) Tj ET\n".to_vec();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            ("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])),
        ]));

        doc.objects.insert(pages_id, Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        (doc, page_id)
    }

    fn overlay() -> Document {
        render_overlay(
            PageGeometry::letter(),
            &BrandSpec::default(),
            PageBrand { page_number: 1, title: None },
            None,
        )
    }

    #[test]
    fn test_original_content_kept_and_isolated() {
        let (mut doc, page_id) = transformed_page();
        merge_overlay(&mut doc, page_id, overlay()).unwrap();

        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
        let body = content.find("(Body) Tj").expect("original text kept");
        let brand = content.find("(Logical Books) Tj").expect("overlay text added");
        assert!(content.starts_with("q\n"));
        assert!(body < brand, "overlay is drawn after the original content");

        let close = content[body..].find("Q\n").map(|i| i + body).unwrap();
        assert!(close < brand, "original transform is popped before the overlay");
    }

    #[test]
    fn test_resources_merged_without_losing_page_fonts() {
        let (mut doc, page_id) = transformed_page();
        merge_overlay(&mut doc, page_id, overlay()).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").and_then(Object::as_dict).unwrap();
        let fonts = resources.get(b"Font").and_then(Object::as_dict).unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"BrandRegular"));
        assert!(fonts.has(b"BrandBold"));

        let bold_id = fonts.get(b"BrandBold").and_then(Object::as_reference).unwrap();
        assert!(doc.get_dictionary(bold_id).is_ok(), "overlay font object was imported");
    }

    #[test]
    fn test_overlay_page_tree_not_imported() {
        let (mut doc, page_id) = transformed_page();
        merge_overlay(&mut doc, page_id, overlay()).unwrap();

        let catalogs = doc
            .objects
            .values()
            .filter(|obj| {
                obj.as_dict()
                    .and_then(|d| d.get(b"Type"))
                    .and_then(Object::as_name)
                    .map(|name| name == b"Catalog")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(catalogs, 1);
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_repeated_merges_do_not_collide() {
        let (mut doc, page_id) = transformed_page();
        merge_overlay(&mut doc, page_id, overlay()).unwrap();
        let after_first = doc.objects.len();
        merge_overlay(&mut doc, page_id, overlay()).unwrap();
        assert!(doc.objects.len() > after_first);

        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
        assert_eq!(content.matches("(Logical Books) Tj").count(), 2);
    }

    #[test]
    fn test_indirect_contents_array_flattened() {
        let (mut doc, page_id) = transformed_page();
        let body_id = doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Contents"))
            .and_then(Object::as_reference)
            .unwrap();
        let array_id = doc.add_object(Object::Array(vec![Object::Reference(body_id)]));
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Contents", Object::Reference(array_id));
        }

        merge_overlay(&mut doc, page_id, overlay()).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let contents = page.get(b"Contents").and_then(Object::as_array).unwrap();
        assert!(contents.iter().any(|o| o.as_reference().ok() == Some(body_id)));
        for entry in contents {
            let id = entry.as_reference().unwrap();
            assert!(doc.get_object(id).and_then(Object::as_stream).is_ok(), "{:?} is a stream", id);
        }

        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
        assert!(content.contains("(Body) Tj"));
    }
}
