//! Annotation synchronization
//!
//! Keeps the viewer's stored highlights and bookmarks and the annotations
//! inside the PDF consistent. Nothing links an entry on one side to an entry
//! on the other, so every pass re-scans both and pairs them up with
//! [`DedupPredicate`].
//!
//! # Passes
//!
//! - **Embed** ([`SyncContext::embed`]): stored records the PDF lacks become
//!   highlight and sticky-note annotations. Best effort per record; the PDF is
//!   saved once at the end.
//! - **Import** ([`SyncContext::import`]): PDF annotations the store lacks
//!   become records. All or nothing; one transaction.
//! - **Extract** ([`SyncContext::extract`]): the regions of stored highlights
//!   are copied into a new PDF whose pages link back to the source.
//!
//! Removal and free-text boxes ([`remove_annotations`], [`embed_text`]) edit
//! the PDF directly.

mod color;
mod context;
mod edit;
mod embed;
mod extract;
mod import;
mod predicate;
mod types;

pub use color::{color_for, nearest_type, COLOR_MAP};
pub use context::SyncContext;
pub use edit::{embed_text, parse_free_text_options, parse_page_rect, remove_annotations};
pub use extract::{extract_output_path, ExtractReport};
pub use predicate::DedupPredicate;
pub use types::{RecordOutcome, SyncReport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbedMethod, SyncConfig};
    use crate::db::{AnnotationRepository, SqliteRepository};
    use crate::document::{
        AbsolutePosition, Bookmark, Highlight, HighlightType, NativeAnnotation, PdfPages, Rgb,
    };
    use crate::geometry::Rect;
    use crate::pdf::MemoryPdf;
    use tempfile::TempDir;

    const HASH: &str = "0f3c";

    /// Two 600x800 pages; page 1 carries two lines of text
    fn sample_pdf() -> MemoryPdf {
        let mut pdf = MemoryPdf::new(vec![(600.0, 800.0), (600.0, 800.0)]);
        pdf.layout_line(1, 0, 100.0, "The quick brown fox");
        pdf.layout_line(1, 0, 120.0, "jumps over the lazy dog");
        pdf
    }

    async fn repository(dir: &TempDir) -> SqliteRepository {
        SqliteRepository::connect(&dir.path().join("local.db"), &dir.path().join("shared.db"))
            .await
            .unwrap()
    }

    /// Highlight over "quick brown" on page 1 in the viewer's convention
    fn stored_highlight(text: &str) -> Highlight {
        Highlight {
            text: text.to_string(),
            highlight_type: HighlightType::new('y').unwrap(),
            // page 1 starts at 800; x is measured from the page center at 300
            selection_begin: AbsolutePosition::new(72.0 - 300.0, 900.0),
            selection_end: AbsolutePosition::new(136.0 - 300.0, 912.0),
        }
    }

    #[tokio::test]
    async fn test_embed_creates_then_recognizes() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;
        repo.insert_batch(
            HASH,
            &[stored_highlight("quick brown")],
            &[Bookmark {
                description: "Section 2".into(),
                y_offset: 1000.0,
            }],
        )
        .await
        .unwrap();

        let mut context = SyncContext::new(sample_pdf(), repo, HASH, SyncConfig::default()).unwrap();

        let first = context.embed().await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(context.pdf().save_count(), 1);

        let annotations = context.pdf().annotations(1).unwrap();
        assert_eq!(annotations.len(), 2);
        assert!(annotations.iter().any(|a| matches!(
            a,
            NativeAnnotation::Highlight { stroke_color: Some(color), .. } if *color == Rgb(1.0, 1.0, 0.0)
        )));
        assert!(annotations.iter().any(|a| matches!(
            a,
            NativeAnnotation::FreeText { rect, content, .. } if content == "Section 2" && rect.y0 == 200.0
        )));

        let second = context.embed().await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 2);
        assert_eq!(context.pdf().save_count(), 1);
    }

    #[tokio::test]
    async fn test_embed_skips_missing_text_and_continues() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;
        repo.insert_batch(
            HASH,
            &[
                stored_highlight("1984 2001 2010 2061"),
                stored_highlight("lazy dog"),
            ],
            &[],
        )
        .await
        .unwrap();

        let mut context = SyncContext::new(sample_pdf(), repo, HASH, SyncConfig::default()).unwrap();
        let report = context.embed().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(context.pdf().annotations(1).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_embed_counts_out_of_range_as_failed() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;
        repo.insert_batch(
            HASH,
            &[],
            &[Bookmark {
                description: "past the end".into(),
                y_offset: 5000.0,
            }],
        )
        .await
        .unwrap();

        let mut context = SyncContext::new(sample_pdf(), repo, HASH, SyncConfig::default()).unwrap();
        let report = context.embed().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(context.pdf().save_count(), 0);
    }

    #[tokio::test]
    async fn test_embed_by_words() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;
        // text that is not on the page; placement only uses the positions
        repo.insert_batch(HASH, &[stored_highlight("qiuck bronw")], &[])
            .await
            .unwrap();

        let config = SyncConfig {
            embed_method: EmbedMethod::Words,
            ..SyncConfig::default()
        };
        let mut context = SyncContext::new(sample_pdf(), repo, HASH, config).unwrap();
        let report = context.embed().await.unwrap();
        assert_eq!(report.created, 1);

        // "quick" starts at x 72, "brown" ends at 136
        let annotations = context.pdf().annotations(1).unwrap();
        assert_eq!(annotations[0].rect(), Rect::new(72.0, 100.0, 136.0, 112.0));
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;

        let mut pdf = sample_pdf();
        pdf.create_highlight(
            1,
            &[Rect::new(72.0, 100.0, 136.0, 112.0)],
            Rgb(0.0, 0.45, 0.85),
            Rgb(0.0, 0.45, 0.85),
        )
        .unwrap();
        pdf.create_text_note(1, crate::geometry::Point::new(0.0, 300.0), "see appendix")
            .unwrap();

        let mut context = SyncContext::new(pdf, repo, HASH, SyncConfig::default()).unwrap();

        let first = context.import().await.unwrap();
        assert_eq!(first.created, 2);

        let highlights = context.repository().highlights_for(HASH).await.unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].text, "quick brown");
        assert_eq!(highlights[0].highlight_type.symbol(), 'b');
        assert_eq!(highlights[0].selection_begin, AbsolutePosition::new(-228.0, 900.0));
        assert_eq!(highlights[0].selection_end, AbsolutePosition::new(-164.0, 912.0));

        let bookmarks = context.repository().bookmarks_for(HASH).await.unwrap();
        assert_eq!(bookmarks[0].y_offset, 1100.0);

        let second = context.import().await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 2);
        assert_eq!(context.repository().highlights_for(HASH).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_for_path_requires_registered_document() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;

        let missing = SyncContext::for_path(sample_pdf(), repo, "/papers/a.pdf", SyncConfig::default()).await;
        assert!(matches!(missing, Err(crate::error::SyncError::UnknownDocument(_))));

        let repo = repository(&dir).await;
        repo.register_document("/papers/a.pdf", HASH).await.unwrap();
        let context = SyncContext::for_path(sample_pdf(), repo, "/papers/./a.pdf", SyncConfig::default())
            .await
            .unwrap();
        assert_eq!(context.hash(), HASH);
        assert_eq!(context.geometry().total_height(), 1600.0);
    }

    #[tokio::test]
    async fn test_embed_survives_damaged_page() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;
        repo.insert_batch(
            HASH,
            &[stored_highlight("quick brown")],
            &[Bookmark {
                description: "on the damaged page".into(),
                y_offset: 50.0,
            }],
        )
        .await
        .unwrap();

        let mut pdf = sample_pdf();
        pdf.damage_annotations(0).unwrap();
        let mut context = SyncContext::new(pdf, repo, HASH, SyncConfig::default()).unwrap();
        let report = context.embed().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 1);
        assert_eq!(context.pdf().save_count(), 1);
        assert_eq!(context.pdf().annotations(1).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_ignores_other_subtypes() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir).await;

        let mut pdf = sample_pdf();
        pdf.insert_annotation(
            1,
            NativeAnnotation::Other {
                handle: crate::document::AnnotationHandle(40),
                rect: Rect::new(72.0, 100.0, 136.0, 112.0),
                subtype: "Underline".into(),
            },
        )
        .unwrap();

        let mut context = SyncContext::new(pdf, repo, HASH, SyncConfig::default()).unwrap();
        let report = context.import().await.unwrap();

        assert_eq!(report.total(), 0);
        assert!(context.repository().highlights_for(HASH).await.unwrap().is_empty());
    }
}
