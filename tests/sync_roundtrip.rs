use std::sync::Arc;

use marginalia::config::SyncConfig;
use marginalia::db::{AnnotationRepository, SqliteRepository};
use marginalia::document::{
    AbsolutePosition, AnnotationHandle, Bookmark, Highlight, HighlightType, NativeAnnotation,
    PdfPages, Rgb,
};
use marginalia::geometry::Rect;
use marginalia::pdf::MemoryPdf;
use marginalia::sync::{remove_annotations, SyncContext};
use marginalia::SyncError;
use tempfile::TempDir;

const HASH: &str = "9b1e77";

/// Pages 800 and 600 high; page 1 starts at absolute y 800
fn two_page_pdf() -> MemoryPdf {
    let mut pdf = MemoryPdf::new(vec![(600.0, 800.0), (600.0, 600.0)]);
    // Marginal 50..98, notes 102..132, survive 136..178, the 182..200,
    // round 204..234, trip 238..262
    pdf.layout_line(1, 0, 50.0, "Marginal notes survive the round trip");
    pdf.layout_line(1, 1, 300.0, "A second block of text");
    pdf
}

async fn open_repository(dir: &TempDir) -> Arc<SqliteRepository> {
    let repo = SqliteRepository::connect(&dir.path().join("local.db"), &dir.path().join("shared.db"))
        .await
        .unwrap();
    Arc::new(repo)
}

fn stored_highlight() -> Highlight {
    Highlight {
        text: "survive the round trip".into(),
        highlight_type: HighlightType::new('g').unwrap(),
        selection_begin: AbsolutePosition::new(136.0 - 300.0, 850.0),
        selection_end: AbsolutePosition::new(262.0 - 300.0, 862.0),
    }
}

fn stored_bookmark() -> Bookmark {
    Bookmark {
        description: "Results".into(),
        y_offset: 850.0,
    }
}

#[tokio::test]
async fn embed_then_import_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(&dir).await;
    repo.insert_batch(HASH, &[stored_highlight()], &[stored_bookmark()])
        .await
        .unwrap();

    let mut context = SyncContext::new(two_page_pdf(), repo.clone(), HASH, SyncConfig::default()).unwrap();

    let embedded = context.embed().await.unwrap();
    assert_eq!(embedded.created, 2);
    assert_eq!(context.pdf().save_count(), 1);

    // absolute 850 lands 50 points into the second page
    let annotations = context.pdf().annotations(1).unwrap();
    let note = annotations
        .iter()
        .find(|a| matches!(a, NativeAnnotation::FreeText { .. }))
        .unwrap();
    assert_eq!(note.rect().y0, 50.0);
    let highlight = annotations
        .iter()
        .find(|a| matches!(a, NativeAnnotation::Highlight { .. }))
        .unwrap();
    assert_eq!(highlight.rect(), Rect::new(136.0, 50.0, 262.0, 62.0));

    let imported = context.import().await.unwrap();
    assert_eq!(imported.created, 0);
    assert_eq!(imported.existing, 2);
    assert_eq!(repo.highlights_for(HASH).await.unwrap().len(), 1);
    assert_eq!(repo.bookmarks_for(HASH).await.unwrap().len(), 1);
}

#[tokio::test]
async fn import_then_embed_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(&dir).await;

    let mut pdf = two_page_pdf();
    pdf.insert_annotation(
        1,
        NativeAnnotation::Highlight {
            handle: AnnotationHandle(40),
            rect: Rect::new(50.0, 50.0, 132.0, 62.0),
            stroke_color: Some(Rgb(0.17, 0.81, 0.28)),
        },
    )
    .unwrap();
    pdf.insert_annotation(
        0,
        NativeAnnotation::FreeText {
            handle: AnnotationHandle(41),
            rect: Rect::new(0.0, 700.0, 20.0, 720.0),
            content: "front matter".into(),
        },
    )
    .unwrap();

    let mut context = SyncContext::new(pdf, repo.clone(), HASH, SyncConfig::default()).unwrap();

    let imported = context.import().await.unwrap();
    assert_eq!(imported.created, 2);

    let highlights = repo.highlights_for(HASH).await.unwrap();
    assert_eq!(highlights[0].text, "Marginal notes");
    assert_eq!(highlights[0].highlight_type.symbol(), 'g');
    assert_eq!(highlights[0].selection_begin, AbsolutePosition::new(-250.0, 850.0));
    assert_eq!(repo.bookmarks_for(HASH).await.unwrap()[0].y_offset, 700.0);

    let embedded = context.embed().await.unwrap();
    assert_eq!(embedded.created, 0);
    assert_eq!(embedded.existing, 2);
    assert_eq!(context.pdf().save_count(), 0);
}

#[tokio::test]
async fn removed_annotations_are_embedded_again() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(&dir).await;
    repo.insert_batch(HASH, &[stored_highlight()], &[stored_bookmark()])
        .await
        .unwrap();

    let mut context = SyncContext::new(two_page_pdf(), repo.clone(), HASH, SyncConfig::default()).unwrap();
    context.embed().await.unwrap();

    let mut pdf = context.into_pdf();
    let removed = remove_annotations(&mut pdf, 1, &Rect::new(130.0, 45.0, 140.0, 55.0)).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(pdf.save_count(), 2);

    let mut context = SyncContext::new(pdf, repo.clone(), HASH, SyncConfig::default()).unwrap();
    let report = context.embed().await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.existing, 1);
}

#[tokio::test]
async fn missing_text_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(&dir).await;

    let absent = Highlight {
        text: "0451 1138 2112".into(),
        ..stored_highlight()
    };
    repo.insert_batch(HASH, &[absent, stored_highlight()], &[])
        .await
        .unwrap();

    let mut context = SyncContext::new(two_page_pdf(), repo.clone(), HASH, SyncConfig::default()).unwrap();
    let report = context.embed().await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.created, 1);
    assert_eq!(context.pdf().annotations(1).unwrap().len(), 1);
}

#[tokio::test]
async fn failed_import_stores_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = open_repository(&dir).await;

    let mut pdf = two_page_pdf();
    pdf.insert_annotation(
        1,
        NativeAnnotation::Highlight {
            handle: AnnotationHandle(7),
            rect: Rect::new(50.0, 50.0, 132.0, 62.0),
            stroke_color: None,
        },
    )
    .unwrap();
    pdf.insert_annotation(
        1,
        NativeAnnotation::FreeText {
            handle: AnnotationHandle(8),
            rect: Rect::new(0.0, 400.0, 20.0, 420.0),
            content: "lost".into(),
        },
    )
    .unwrap();

    // reads still work, the bookmark insert aborts after the highlight went in
    sqlx::query(
        "CREATE TRIGGER reject_bookmarks BEFORE INSERT ON bookmarks \
         BEGIN SELECT RAISE(ABORT, 'bookmarks are read only'); END",
    )
    .execute(repo.shared_pool())
    .await
    .unwrap();

    let mut context = SyncContext::new(pdf, repo.clone(), HASH, SyncConfig::default()).unwrap();
    let result = context.import().await;

    assert!(matches!(result, Err(SyncError::Repository(_))));
    assert!(repo.highlights_for(HASH).await.unwrap().is_empty());
}
