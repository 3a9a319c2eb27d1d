//! Direct edits of a PDF's annotations
//!
//! Removal and free-text boxes work on the PDF alone and never touch the
//! record store.

use tracing::{debug, info};

use crate::document::{AnnotationHandle, FreeTextOptions, PdfPages, Rgb};
use crate::error::{Result, SyncError};
use crate::geometry::Rect;

/// Delete every annotation on `page` whose rectangle intersects `rect`
///
/// Saves incrementally afterwards and returns how many were removed.
pub fn remove_annotations<P: PdfPages + ?Sized>(pdf: &mut P, page: usize, rect: &Rect) -> Result<usize> {
    let doomed: Vec<AnnotationHandle> = pdf
        .annotations(page)?
        .iter()
        .filter(|annotation| annotation.rect().intersects(rect))
        .map(|annotation| annotation.handle())
        .collect();

    for handle in &doomed {
        pdf.delete_annotation(page, *handle)?;
        debug!(page, handle = handle.0, "Annotation removed");
    }
    pdf.save_incremental()?;

    info!(page, removed = doomed.len(), "Annotations removed");
    Ok(doomed.len())
}

/// Add a free-text box to `page` and save
pub fn embed_text<P: PdfPages + ?Sized>(
    pdf: &mut P,
    page: usize,
    rect: Rect,
    text: &str,
    options: &FreeTextOptions,
) -> Result<AnnotationHandle> {
    let handle = pdf.create_free_text(page, rect, text, options)?;
    pdf.save_incremental()?;

    info!(page, handle = handle.0, "Text embedded");
    Ok(handle)
}

/// Parse `page,x0,y0,x1,y1`
pub fn parse_page_rect(value: &str) -> Result<(usize, Rect)> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [page, x0, y0, x1, y1] = parts[..] else {
        return Err(SyncError::InvalidInput(format!(
            "Expected page,x0,y0,x1,y1 but got {:?}",
            value
        )));
    };

    let page = page
        .parse::<usize>()
        .map_err(|_| SyncError::InvalidInput(format!("Invalid page number {:?}", page)))?;
    let coordinate = |s: &str| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SyncError::InvalidInput(format!("Invalid coordinate {:?}", s)))
    };

    Ok((
        page,
        Rect::new(coordinate(x0)?, coordinate(y0)?, coordinate(x1)?, coordinate(y1)?),
    ))
}

fn parse_color(key: &str, value: &str) -> Result<Rgb> {
    let components = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|c| (0.0..=1.0).contains(c)))
        .collect::<Option<Vec<f64>>>();

    match components.as_deref() {
        Some(&[r, g, b]) => Ok(Rgb(r, g, b)),
        _ => Err(SyncError::InvalidInput(format!(
            "{} expects r,g,b with components in 0..=1, got {:?}",
            key, value
        ))),
    }
}

/// Parse free-text styling from `key=value` arguments
///
/// Keys are `fontsize`, `text_color`, `fill_color` and `border_color`;
/// colors are written `r,g,b`. Unknown keys are an error.
pub fn parse_free_text_options<I, S>(args: I) -> Result<FreeTextOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = FreeTextOptions::default();

    for arg in args {
        let arg = arg.as_ref();
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| SyncError::InvalidInput(format!("Expected key=value, got {:?}", arg)))?;
        let (key, value) = (key.trim(), value.trim());

        match key {
            "fontsize" => {
                options.fontsize = value
                    .parse::<f64>()
                    .ok()
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .ok_or_else(|| SyncError::InvalidInput(format!("Invalid fontsize {:?}", value)))?;
            }
            "text_color" => options.text_color = parse_color(key, value)?,
            "fill_color" => options.fill_color = Some(parse_color(key, value)?),
            "border_color" => options.border_color = Some(parse_color(key, value)?),
            other => {
                return Err(SyncError::InvalidInput(format!(
                    "Unknown option {:?} (expected fontsize, text_color, fill_color or border_color)",
                    other
                )))
            }
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NativeAnnotation;
    use crate::pdf::MemoryPdf;

    fn pdf_with_annotations() -> MemoryPdf {
        let mut pdf = MemoryPdf::new(vec![(600.0, 800.0)]);
        pdf.create_highlight(
            0,
            &[Rect::new(50.0, 100.0, 200.0, 112.0)],
            Rgb(1.0, 1.0, 0.0),
            Rgb(1.0, 1.0, 0.0),
        )
        .unwrap();
        pdf.create_text_note(0, crate::geometry::Point::new(0.0, 400.0), "later")
            .unwrap();
        pdf
    }

    #[test]
    fn test_remove_intersecting() {
        let mut pdf = pdf_with_annotations();

        let removed = remove_annotations(&mut pdf, 0, &Rect::new(150.0, 90.0, 300.0, 105.0)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(pdf.save_count(), 1);

        let left = pdf.annotations(0).unwrap();
        assert_eq!(left.len(), 1);
        assert!(matches!(left[0], NativeAnnotation::FreeText { .. }));
    }

    #[test]
    fn test_remove_covers_every_subtype() {
        let mut pdf = pdf_with_annotations();
        pdf.insert_annotation(
            0,
            NativeAnnotation::Other {
                handle: AnnotationHandle(20),
                rect: Rect::new(300.0, 380.0, 360.0, 420.0),
                subtype: "Square".into(),
            },
        )
        .unwrap();

        let removed = remove_annotations(&mut pdf, 0, &Rect::new(0.0, 350.0, 600.0, 450.0)).unwrap();
        assert_eq!(removed, 2);

        let left = pdf.annotations(0).unwrap();
        assert_eq!(left.len(), 1);
        assert!(matches!(left[0], NativeAnnotation::Highlight { .. }));
    }

    #[test]
    fn test_remove_nothing_still_saves() {
        let mut pdf = pdf_with_annotations();
        let removed = remove_annotations(&mut pdf, 0, &Rect::new(300.0, 600.0, 400.0, 700.0)).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(pdf.annotations(0).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_unknown_page() {
        let mut pdf = pdf_with_annotations();
        assert!(remove_annotations(&mut pdf, 3, &Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_embed_text() {
        let mut pdf = MemoryPdf::new(vec![(600.0, 800.0)]);
        let options = parse_free_text_options(["fontsize=14", "fill_color=1,1,0.5"]).unwrap();

        let handle = embed_text(&mut pdf, 0, Rect::new(10.0, 10.0, 200.0, 40.0), "margin note", &options)
            .unwrap();

        assert_eq!(pdf.save_count(), 1);
        assert_eq!(pdf.free_text_options(handle), Some(&options));
        assert_eq!(
            pdf.annotations(0).unwrap()[0],
            NativeAnnotation::FreeText {
                handle,
                rect: Rect::new(10.0, 10.0, 200.0, 40.0),
                content: "margin note".into(),
            }
        );
    }

    #[test]
    fn test_parse_page_rect() {
        let (page, rect) = parse_page_rect("2, 10, 20.5, 300, 400").unwrap();
        assert_eq!(page, 2);
        assert_eq!(rect, Rect::new(10.0, 20.5, 300.0, 400.0));

        assert!(parse_page_rect("2,10,20,300").is_err());
        assert!(parse_page_rect("-1,10,20,300,400").is_err());
        assert!(parse_page_rect("0,a,20,300,400").is_err());
        assert!(parse_page_rect("0,NaN,20,300,400").is_err());
    }

    #[test]
    fn test_parse_free_text_options() {
        let options = parse_free_text_options([
            "fontsize=9",
            "text_color=0,0,1",
            "border_color = 0.5,0.5,0.5",
        ])
        .unwrap();
        assert_eq!(options.fontsize, 9.0);
        assert_eq!(options.text_color, Rgb(0.0, 0.0, 1.0));
        assert_eq!(options.fill_color, None);
        assert_eq!(options.border_color, Some(Rgb(0.5, 0.5, 0.5)));

        let defaults = parse_free_text_options(Vec::<String>::new()).unwrap();
        assert_eq!(defaults, FreeTextOptions::default());
    }

    #[test]
    fn test_parse_free_text_options_rejects_bad_input() {
        assert!(parse_free_text_options(["font=12"]).is_err());
        assert!(parse_free_text_options(["fontsize"]).is_err());
        assert!(parse_free_text_options(["fontsize=0"]).is_err());
        assert!(parse_free_text_options(["fill_color=1,1"]).is_err());
        assert!(parse_free_text_options(["fill_color=2,0,0"]).is_err());
    }
}
