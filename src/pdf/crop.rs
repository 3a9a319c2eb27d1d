//! Cropped copies of page regions
//!
//! Builds a new PDF with one page per region, each page sharing the source
//! page's content stream and showing only the region through its media box.

use lopdf::{dictionary, Dictionary, Document as LoDocument, Object, ObjectId};
use tracing::debug;

use crate::document::{DocumentError, Result};
use crate::geometry::Rect;

use super::annots::real_array;
use super::backend::MupdfDocument;

/// Space kept above and below each region
pub const CROP_MARGIN: f64 = 20.0;

/// Height of the blank page after each region
pub const SEPARATOR_HEIGHT: f64 = 50.0;

/// A PDF built from page regions
#[derive(Debug, Clone)]
pub struct CroppedPdf {
    pub bytes: Vec<u8>,
    /// Absolute offset of each region's page, in region order
    pub offsets: Vec<f64>,
}

/// Value of an inheritable page attribute
fn inherited(document: &LoDocument, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node = document.get_dictionary(*parent).ok()?,
            _ => return None,
        }
    }
    None
}

/// Copy page-local `regions` of `source` into a new PDF
///
/// Each region becomes a page whose media box is the region grown by
/// [`CROP_MARGIN`] above and below, followed by a blank page
/// [`SEPARATOR_HEIGHT`] high. Annotations of the source pages are not
/// carried over.
pub fn crop_regions(source: &[u8], regions: &[(usize, Rect)]) -> Result<CroppedPdf> {
    let mut document = LoDocument::load_mem(source)?;
    let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
    let pages_id = document.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(regions.len() * 2);
    let mut offsets = Vec::with_capacity(regions.len());
    let mut offset = 0.0;

    for &(page, region) in regions {
        let page_id = *page_ids
            .get(page)
            .ok_or(DocumentError::PageNotFound(page, page_ids.len()))?;
        let page_box = MupdfDocument::page_box(&document, page_id)?;
        let grown = Rect::new(
            region.x0,
            region.y0 - CROP_MARGIN,
            region.x1,
            region.y1 + CROP_MARGIN,
        );
        let [llx, lly, urx, ury] = page_box.to_user_space(&grown);

        let mut cropped: Dictionary = document.get_dictionary(page_id)?.clone();
        for key in [&b"Resources"[..], b"Rotate"] {
            if let Some(value) = inherited(&document, page_id, key) {
                cropped.set(key, value);
            }
        }
        for key in [&b"CropBox"[..], b"Annots", b"StructParents"] {
            cropped.remove(key);
        }
        cropped.set("MediaBox", real_array(&[llx, lly, urx, ury]));
        cropped.set("Parent", pages_id);
        kids.push(document.add_object(cropped).into());

        let separator = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => real_array(&[0.0, 0.0, urx - llx, SEPARATOR_HEIGHT]),
            "Resources" => Dictionary::new(),
        };
        kids.push(document.add_object(separator).into());

        offsets.push(offset);
        offset += (ury - lly) + SEPARATOR_HEIGHT;
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.trailer.remove(b"Encrypt");

    let pruned = document.prune_objects();
    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;

    debug!(
        regions = regions.len(),
        pruned = pruned.len(),
        bytes = bytes.len(),
        "Cropped document built"
    );
    Ok(CroppedPdf { bytes, offsets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfPages;
    use crate::pdf::annots::as_rect_array;

    /// Two letter-sized pages inheriting their media box and resources
    fn two_page_pdf() -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in ["first page", "second page"] {
            let content = format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET", text);
            let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_crop_regions() {
        let regions = [
            (1, Rect::new(100.0, 100.0, 300.0, 140.0)),
            (0, Rect::new(50.0, 80.0, 250.0, 100.0)),
        ];
        let cropped = crop_regions(&two_page_pdf(), &regions).unwrap();

        // 40 + 2 * 20 high, then the separator
        assert_eq!(cropped.offsets, vec![0.0, 130.0]);

        let document = LoDocument::load_mem(&cropped.bytes).unwrap();
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        assert_eq!(pages.len(), 4);

        let first = document.get_dictionary(pages[0]).unwrap();
        assert!(first.get(b"Resources").is_ok());
        let media_box = first.get(b"MediaBox").ok().and_then(as_rect_array);
        assert_eq!(media_box, Some([100.0, 632.0, 300.0, 712.0]));

        let pdf = MupdfDocument::from_bytes(cropped.bytes).unwrap();
        let (width, height) = pdf.page_size(0).unwrap();
        assert_eq!((width.round(), height.round()), (200.0, 80.0));
        let (_, separator) = pdf.page_size(1).unwrap();
        assert_eq!(separator.round(), SEPARATOR_HEIGHT);
    }

    #[test]
    fn test_crop_unknown_page() {
        let result = crop_regions(&two_page_pdf(), &[(5, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert!(matches!(result, Err(DocumentError::PageNotFound(5, 2))));
    }
}
