use std::fs;
use std::io;
use std::path::PathBuf;

use deckwright_config::LockTimings;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::approval::Approval;
use crate::error::ErrorKind;
use crate::geometry::{Anchor, Length, PositionSpec, Rect, SizeSpec};
use crate::lock::marker_path;
use crate::model::{MockDocumentStore, ShapeId, ShapeKind};
use crate::report::Status;

struct Workspace {
    _dir: TempDir,
    deck: PathBuf,
}

fn quick_options() -> SessionOptions {
    SessionOptions::default().with_lock_timings(LockTimings::from_millis(100, 60_000, 10))
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let deck = dir.path().join("deck.json");
    let session = DocumentSession::create(&deck, Canvas::STANDARD, quick_options())
        .expect("create deck");
    session.close().expect("close");
    Workspace { _dir: dir, deck }
}

fn open(workspace: &Workspace) -> DocumentSession {
    DocumentSession::open(&workspace.deck, LockMode::Exclusive, quick_options()).expect("open")
}

/// Opens the deck with three title slides titled `A`, `B` and `C`.
fn three_slides(workspace: &Workspace) -> DocumentSession {
    let mut session = open(workspace);
    for title in ["A", "B", "C"] {
        let report = session.add_slide("title", None).expect("add slide");
        let index = report.slide_index.expect("slide index");
        session.set_title(index, title).expect("set title");
    }
    session
}

fn titles(session: &DocumentSession) -> Vec<Option<String>> {
    session.document().slides.iter().map(Slide::title).collect()
}

#[rstest]
fn create_refuses_to_overwrite(workspace: Workspace) {
    let error = DocumentSession::create(&workspace.deck, Canvas::STANDARD, quick_options())
        .expect_err("existing deck");
    assert!(matches!(
        error,
        SessionError::Store(StoreError::AlreadyExists { .. })
    ));
    assert!(!marker_path(&workspace.deck).exists());
}

#[rstest]
fn add_slide_appends_and_reports_version_change(workspace: Workspace) {
    let mut session = open(&workspace);
    let report = session
        .add_slide("title-and-content", None)
        .expect("add slide");
    assert_eq!(report.slide_index, Some(0));
    assert_eq!(report.slide_count, 1);
    assert_eq!(report.shape_count, Some(2));
    assert!(report.version_changed());
    assert_eq!(report.version_after, session.version());
    assert_eq!(session.state(), SessionState::Saved);
}

#[rstest]
fn add_slide_rejects_unknown_layouts(workspace: Workspace) {
    let mut session = open(&workspace);
    let error = session.add_slide("two-column", None).expect_err("unknown");
    assert!(matches!(
        error,
        SessionError::UnknownLayout { ref available, .. } if available.len() == 4
    ));
    assert_eq!(session.state(), SessionState::Opened);
}

#[rstest]
fn add_slide_inserts_at_the_requested_index(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    session.add_slide("blank", Some(1)).expect("insert");
    assert_eq!(
        session.document().slides.get(1).map(|s| s.layout.as_str()),
        Some("blank")
    );

    let error = session.add_slide("blank", Some(9)).expect_err("past the end");
    assert_eq!(error.kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(error.details()["valid_range"], serde_json::json!([0, 4]));
}

#[rstest]
fn insert_shape_checks_the_slide_before_the_geometry(workspace: Workspace) {
    let mut session = open(&workspace);
    let degenerate = ShapeRequest::new(
        ShapeKind::TextBox,
        PositionSpec::Percentage {
            left: 10.0,
            top: 10.0,
        },
        SizeSpec::inches(0.0, 1.0),
    );
    let error = session.insert_shape(3, degenerate).expect_err("no slide 3");
    assert_eq!(error.kind(), ErrorKind::IndexOutOfRange);
}

#[rstest]
fn duplicate_slide_inserts_a_copy_with_fresh_ids(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let report = session.duplicate_slide(0).expect("duplicate");
    assert_eq!(report.slide_index, Some(1));
    let slides = &session.document().slides;
    let (original, copy) = (slides.first().expect("original"), slides.get(1).expect("copy"));
    assert_ne!(original.id, copy.id);
    assert_eq!(original.title(), copy.title());
    assert!(
        original
            .shapes
            .iter()
            .zip(&copy.shapes)
            .all(|(a, b)| a.id != b.id)
    );
}

#[rstest]
fn move_slide_reorders(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    session.move_slide(0, 2).expect("move");
    assert_eq!(
        titles(&session),
        vec![Some("B".into()), Some("C".into()), Some("A".into())]
    );
}

#[rstest]
fn delete_without_token_leaves_file_untouched(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let before = fs::read(&workspace.deck).expect("read deck");

    let error = session
        .delete_slide(1, Approval::none())
        .expect_err("missing token");

    assert_eq!(error.kind(), ErrorKind::MissingApprovalToken);
    assert_eq!(fs::read(&workspace.deck).expect("read deck"), before);
    assert_eq!(session.document().slide_count(), 3);
}

#[rstest]
fn delete_with_token_reports_index_shift(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let report = session
        .delete_slide(1, Approval::token("approve:delete-slide:0123abcd"))
        .expect("delete");
    assert_eq!(report.slide_count, 2);
    let shift = report.index_shift.expect("shift");
    assert_eq!(shift.removed_index, 1);
    assert_eq!(shift.shifted_count, 1);
    assert_eq!(titles(&session), vec![Some("A".into()), Some("C".into())]);
}

#[rstest]
fn delete_with_wrong_scope_is_denied(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let error = session
        .delete_slide(0, Approval::token("approve:remove-shape:0123abcd"))
        .expect_err("scope mismatch");
    assert_eq!(error.kind(), ErrorKind::ScopeMismatch);
}

#[rstest]
fn stale_expected_version_is_refused(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let stale = session.version();
    session.add_slide("blank", None).expect("add");

    session.expect_version(stale);
    let error = session.set_title(0, "Changed").expect_err("stale");
    assert_eq!(error.kind(), ErrorKind::VersionMismatch);

    session.expect_version(session.version());
    session.set_title(0, "Changed").expect("fresh version");
}

#[rstest]
fn set_title_without_placeholder_fails(workspace: Workspace) {
    let mut session = open(&workspace);
    session.add_slide("blank", None).expect("add");
    let error = session.set_title(0, "Nope").expect_err("no title");
    assert!(matches!(error, SessionError::NoTitlePlaceholder { slide: 0 }));
}

#[rstest]
fn insert_shape_resolves_anchor_frames(workspace: Workspace) {
    let mut session = open(&workspace);
    session.add_slide("blank", None).expect("add");
    let request = ShapeRequest::new(
        ShapeKind::TextBox,
        PositionSpec::Anchor {
            point: Anchor::BottomRight,
            offset_x: Length::inches(-1.0),
            offset_y: Length::inches(-0.5),
        },
        SizeSpec::inches(2.0, 1.0),
    );
    let report = session.insert_shape(0, request).expect("insert");
    assert_eq!(report.status, Status::Success);
    let shape = session
        .document()
        .slides
        .first()
        .and_then(|slide| slide.shapes.first())
        .expect("shape");
    assert_eq!(shape.frame, Rect::new(7.0, 6.0, 2.0, 1.0));
}

#[rstest]
fn off_canvas_insert_is_a_warning(workspace: Workspace) {
    let mut session = open(&workspace);
    session.add_slide("blank", None).expect("add");
    let request = ShapeRequest::new(
        ShapeKind::AutoShape {
            geometry: String::from("rect"),
        },
        PositionSpec::Percentage {
            left: 95.0,
            top: 10.0,
        },
        SizeSpec::inches(2.0, 1.0),
    );
    let report = session.insert_shape(0, request).expect("insert");
    assert_eq!(report.status, Status::Warning);
    assert!(
        report
            .warnings
            .iter()
            .any(|w| w.code == crate::report::FindingCode::OffCanvas)
    );
}

#[rstest]
fn pictures_do_not_take_text(workspace: Workspace) {
    let mut session = open(&workspace);
    session.add_slide("blank", None).expect("add");
    let picture = ShapeRequest {
        alt_text: Some(String::from("logo")),
        ..ShapeRequest::new(
            ShapeKind::Picture {
                source: String::from("logo.png"),
                intrinsic: None,
            },
            PositionSpec::Grid {
                row: 0,
                col: 0,
                grid_size: 3,
            },
            SizeSpec::inches(1.0, 1.0),
        )
    };
    session.insert_shape(0, picture).expect("insert");
    let error = session.set_shape_text(0, 0, "caption").expect_err("picture");
    assert!(matches!(error, SessionError::NotATextShape { kind: "picture", .. }));
}

#[rstest]
fn remove_shape_requires_its_own_scope(workspace: Workspace) {
    let mut session = open(&workspace);
    session.add_slide("title-and-content", None).expect("add");

    let error = session
        .remove_shape(0, 1, Approval::token("approve:delete-slide:0123abcd"))
        .expect_err("scope");
    assert_eq!(error.kind(), ErrorKind::ScopeMismatch);

    let report = session
        .remove_shape(0, 0, Approval::token("approve:remove-shape:0123abcd"))
        .expect("remove");
    assert_eq!(report.shape_count, Some(1));
    assert_eq!(
        report.index_shift.map(|shift| shift.shifted_count),
        Some(1)
    );
}

fn shape_ids(session: &DocumentSession, slide: usize) -> Vec<ShapeId> {
    session
        .document()
        .slides
        .get(slide)
        .map(|slide| slide.shapes.iter().map(|shape| shape.id).collect())
        .unwrap_or_default()
}

#[rstest]
#[case::first(0)]
#[case::middle(1)]
#[case::last(2)]
fn removing_a_shape_moves_later_shapes_down_by_one(workspace: Workspace, #[case] removed: usize) {
    let mut session = open(&workspace);
    session.add_slide("title-and-content", None).expect("add");
    let caption = ShapeRequest::new(
        ShapeKind::TextBox,
        PositionSpec::Percentage {
            left: 10.0,
            top: 80.0,
        },
        SizeSpec::inches(4.0, 0.5),
    );
    session.insert_shape(0, caption).expect("insert");
    let before = shape_ids(&session, 0);
    assert_eq!(before.len(), 3);

    let report = session
        .remove_shape(0, removed, Approval::token("approve:remove-shape:0123abcd"))
        .expect("remove");

    let after = shape_ids(&session, 0);
    assert_eq!(report.shape_count, Some(2));
    assert_eq!(
        report.index_shift.map(|shift| shift.shifted_count),
        Some(2 - removed)
    );
    for (index, id) in before.iter().enumerate() {
        match index.cmp(&removed) {
            std::cmp::Ordering::Less => assert_eq!(after.get(index), Some(id)),
            std::cmp::Ordering::Equal => assert!(!after.contains(id)),
            std::cmp::Ordering::Greater => assert_eq!(after.get(index - 1), Some(id)),
        }
    }
}

#[rstest]
#[case::missing(Approval::none(), ErrorKind::MissingApprovalToken)]
#[case::malformed(Approval::token("approve:x"), ErrorKind::MalformedApprovalToken)]
#[case::wrong_scope(
    Approval::token("approve:replace-all:0123abcd"),
    ErrorKind::ScopeMismatch
)]
fn refused_shape_removal_leaves_file_untouched(
    workspace: Workspace,
    #[case] approval: Approval<'static>,
    #[case] expected: ErrorKind,
) {
    let mut session = three_slides(&workspace);
    let before = fs::read(&workspace.deck).expect("read deck");

    let error = session.remove_shape(1, 0, approval).expect_err("refused");

    assert_eq!(error.kind(), expected);
    assert_eq!(fs::read(&workspace.deck).expect("read deck"), before);
    assert_eq!(shape_ids(&session, 1).len(), 2);
}

#[rstest]
#[case::missing(Approval::none(), ErrorKind::MissingApprovalToken)]
#[case::malformed(Approval::token("approve:x"), ErrorKind::MalformedApprovalToken)]
#[case::wrong_scope(
    Approval::token("approve:remove-shape:0123abcd"),
    ErrorKind::ScopeMismatch
)]
fn refused_replace_all_leaves_file_untouched(
    workspace: Workspace,
    #[case] approval: Approval<'static>,
    #[case] expected: ErrorKind,
) {
    let mut session = three_slides(&workspace);
    let before = fs::read(&workspace.deck).expect("read deck");

    let error = session
        .replace_all_text("A", "Z", approval)
        .expect_err("refused");

    assert_eq!(error.kind(), expected);
    assert_eq!(fs::read(&workspace.deck).expect("read deck"), before);
    assert_eq!(
        titles(&session),
        vec![Some("A".into()), Some("B".into()), Some("C".into())]
    );
}

#[rstest]
fn replace_all_counts_replacements(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    session.set_notes(0, "A is for apple").expect("notes");
    let report = session
        .replace_all_text("A", "Z", Approval::token("approve:replace-all:0123abcd"))
        .expect("replace");
    assert_eq!(report.replacements, Some(2));
    assert_eq!(
        session.document().slides.first().and_then(|s| s.notes.clone()),
        Some(String::from("Z is for apple"))
    );
}

#[rstest]
fn replace_all_rejects_empty_search(workspace: Workspace) {
    let mut session = open(&workspace);
    let error = session
        .replace_all_text("", "x", Approval::token("approve:replace-all:0123abcd"))
        .expect_err("empty");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[rstest]
fn shared_sessions_cannot_mutate(workspace: Workspace) {
    let mut session =
        DocumentSession::open(&workspace.deck, LockMode::Shared, quick_options()).expect("open");
    assert!(!session.is_locked());
    let error = session.add_slide("blank", None).expect_err("read only");
    assert_eq!(error.kind(), ErrorKind::ReadOnlySession);
    assert_eq!(session.inspect().slide_count, 0);
    assert_eq!(session.state(), SessionState::Reading);
}

#[rstest]
fn second_writer_times_out(workspace: Workspace) {
    let _holder = open(&workspace);
    let error = DocumentSession::open(&workspace.deck, LockMode::Exclusive, quick_options())
        .expect_err("contended");
    assert_eq!(error.kind(), ErrorKind::LockContention);
    assert!(error.is_retryable());
}

#[rstest]
fn close_releases_the_lock(workspace: Workspace) {
    let session = open(&workspace);
    assert!(marker_path(&workspace.deck).exists());
    session.close().expect("close");
    assert!(!marker_path(&workspace.deck).exists());
}

#[rstest]
fn slide_summary_describes_shapes(workspace: Workspace) {
    let mut session = three_slides(&workspace);
    let summary = session.slide_summary(2).expect("summary");
    assert_eq!(summary.title.as_deref(), Some("C"));
    let kinds: Vec<_> = summary.shapes.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec!["placeholder", "placeholder"]);
    assert!(summary.shapes.first().and_then(|s| s.contrast_ratio).is_some());

    let error = session.slide_summary(3).expect_err("range");
    assert_eq!(
        error.details()["valid_range"],
        serde_json::json!([0, 2])
    );
}

#[rstest]
fn failed_save_keeps_document_and_releases_lock(workspace: Workspace) {
    let mut store = MockDocumentStore::new();
    store
        .expect_load()
        .returning(|_| Ok(Document::new(Canvas::STANDARD)));
    store.expect_save().returning(|path, _| {
        Err(StoreError::Write {
            path: path.to_path_buf(),
            source: io::Error::other("disk full"),
        })
    });

    let mut session =
        DocumentSession::open_with_store(
            &workspace.deck,
            LockMode::Exclusive,
            quick_options(),
            store,
        )
        .expect("open");
    let before = session.version();

    let error = session.add_slide("title", None).expect_err("save fails");
    assert_eq!(error.kind(), ErrorKind::Io);
    assert_eq!(session.version(), before);
    assert_eq!(session.document().slide_count(), 0);
    assert_eq!(session.state(), SessionState::Opened);

    drop(session);
    assert!(!marker_path(&workspace.deck).exists());
}

#[rstest]
fn failed_load_leaves_no_lock(workspace: Workspace) {
    let mut store = MockDocumentStore::new();
    store.expect_load().returning(|path| {
        Err(StoreError::Read {
            path: path.to_path_buf(),
            source: io::Error::other("unreadable"),
        })
    });
    store.expect_save().never();

    let error =
        DocumentSession::open_with_store(
            &workspace.deck,
            LockMode::Exclusive,
            quick_options(),
            store,
        )
        .expect_err("load fails");
    assert_eq!(error.kind(), ErrorKind::Io);
    assert!(!marker_path(&workspace.deck).exists());
}

#[test]
fn options_from_config_reject_invalid_configuration() {
    let config = deckwright_config::Config {
        lock_poll_interval_ms: 0,
        ..deckwright_config::Config::default()
    };
    let error = SessionOptions::from_config(&config).expect_err("invalid");
    assert_eq!(error.kind(), ErrorKind::Configuration);
}
