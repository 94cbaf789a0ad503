#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wire::model::{Point, Shape, Stroke, TextElement};
use wire::payload::SnapshotPayload;

use super::*;

fn stroke(author: &str, x: f64) -> Stroke {
    Stroke {
        points: vec![Point::start(x, 0.0), Point::movement(x + 1.0, 1.0)],
        color: "#fff".into(),
        tool: "pencil".into(),
        author_id: author.into(),
    }
}

fn shape(x: f64) -> Shape {
    Shape { origin_x: x, origin_y: 0.0, width: 10.0, height: 10.0, color: "#fff".into() }
}

fn text(id: &str) -> TextElement {
    TextElement {
        id: id.into(),
        x: 0.0,
        y: 0.0,
        text: "hi".into(),
        color: "#fff".into(),
        font_size: 16,
        selected: false,
    }
}

fn snapshot(strokes: Vec<Stroke>, shapes: Vec<Shape>, texts: Vec<TextElement>) -> SnapshotPayload {
    SnapshotPayload {
        author_id: "responder".into(),
        strokes,
        shapes,
        text_elements: texts,
        for_requester_id: "me".into(),
        request_time_ms: 0,
    }
}

#[test]
fn new_document_is_empty() {
    let doc = Document::new();
    assert!(doc.is_empty());
    assert!(doc.strokes().is_empty());
    assert!(doc.shapes().is_empty());
    assert!(doc.text_elements().is_empty());
}

#[test]
fn strokes_and_shapes_append_in_order() {
    let mut doc = Document::new();
    doc.push_stroke(stroke("u1", 0.0));
    doc.push_stroke(stroke("u2", 5.0));
    doc.push_shape(shape(1.0));

    assert_eq!(doc.strokes().len(), 2);
    assert_eq!(doc.strokes()[0].author_id, "u1");
    assert_eq!(doc.strokes()[1].author_id, "u2");
    assert_eq!(doc.shapes().len(), 1);
}

#[test]
fn upsert_text_keeps_existing_element_on_id_collision() {
    let mut doc = Document::new();
    let mut original = text("abc");
    original.text = "local".into();
    doc.upsert_text(original);

    let mut remote = text("abc");
    remote.text = "remote".into();
    doc.upsert_text(remote);

    assert_eq!(doc.text_elements().len(), 1);
    assert_eq!(doc.text_elements()[0].text, "local");
}

#[test]
fn move_and_resize_text_by_id() {
    let mut doc = Document::new();
    doc.upsert_text(text("abc"));

    assert!(doc.move_text("abc", 30.0, 40.0));
    assert!(doc.set_text_font_size("abc", 24));
    assert!(!doc.move_text("missing", 0.0, 0.0));
    assert!(!doc.set_text_font_size("missing", 12));

    let element = &doc.text_elements()[0];
    assert_eq!(element.x, 30.0);
    assert_eq!(element.y, 40.0);
    assert_eq!(element.font_size, 24);
}

#[test]
fn remove_text_by_id() {
    let mut doc = Document::new();
    doc.upsert_text(text("abc"));
    doc.upsert_text(text("def"));

    let removed = doc.remove_text("abc").expect("element should exist");
    assert_eq!(removed.id, "abc");
    assert_eq!(doc.text_elements().len(), 1);
    assert!(doc.remove_text("abc").is_none());
}

#[test]
fn select_text_is_exclusive() {
    let mut doc = Document::new();
    doc.upsert_text(text("abc"));
    doc.upsert_text(text("def"));

    doc.select_text(Some("def"));
    assert!(!doc.text_elements()[0].selected);
    assert!(doc.text_elements()[1].selected);

    doc.select_text(None);
    assert!(doc.text_elements().iter().all(|t| !t.selected));
}

#[test]
fn clear_wipes_everything() {
    let mut doc = Document::new();
    doc.push_stroke(stroke("u1", 0.0));
    doc.push_shape(shape(0.0));
    doc.upsert_text(text("abc"));

    doc.clear();
    assert!(doc.is_empty());
}

#[test]
fn merge_snapshot_is_idempotent() {
    let mut doc = Document::new();
    let snap = snapshot(
        vec![stroke("u1", 0.0), stroke("u1", 5.0)],
        vec![shape(1.0)],
        vec![text("abc")],
    );

    doc.merge_snapshot(&snap);
    let after_once = (doc.strokes().len(), doc.shapes().len(), doc.text_elements().len());

    doc.merge_snapshot(&snap);
    let after_twice = (doc.strokes().len(), doc.shapes().len(), doc.text_elements().len());

    assert_eq!(after_once, (2, 1, 1));
    assert_eq!(after_once, after_twice);
}

#[test]
fn merge_snapshot_unions_with_existing_content() {
    let mut doc = Document::new();
    doc.push_stroke(stroke("me", 9.0));

    doc.merge_snapshot(&snapshot(vec![stroke("u1", 0.0)], vec![], vec![]));

    assert_eq!(doc.strokes().len(), 2);
    assert_eq!(doc.strokes()[0].author_id, "me");
}

#[test]
fn merge_snapshot_local_text_wins_by_id() {
    let mut doc = Document::new();
    let mut local = text("abc");
    local.text = "local".into();
    doc.upsert_text(local);

    let mut remote = text("abc");
    remote.text = "remote".into();
    doc.merge_snapshot(&snapshot(vec![], vec![], vec![remote]));

    assert_eq!(doc.text_elements().len(), 1);
    assert_eq!(doc.text_elements()[0].text, "local");
}

#[test]
fn merge_snapshot_forces_remote_selection_off() {
    let mut doc = Document::new();
    let mut remote = text("abc");
    remote.selected = true;
    doc.merge_snapshot(&snapshot(vec![], vec![], vec![remote]));

    assert!(!doc.text_elements()[0].selected);
}

#[test]
fn final_content_is_order_independent() {
    // Two peers observing the same broadcasts in different interleavings
    // converge on the same set of strokes/shapes/texts.
    let a_stroke = stroke("u1", 0.0);
    let b_stroke = stroke("u2", 5.0);
    let the_shape = shape(1.0);

    let mut peer_a = Document::new();
    peer_a.push_stroke(a_stroke.clone());
    peer_a.push_stroke(b_stroke.clone());
    peer_a.push_shape(the_shape.clone());
    peer_a.upsert_text(text("abc"));

    let mut peer_b = Document::new();
    peer_b.push_shape(the_shape);
    peer_b.push_stroke(b_stroke);
    peer_b.upsert_text(text("abc"));
    peer_b.push_stroke(a_stroke);

    let mut a_authors: Vec<_> = peer_a.strokes().iter().map(|s| s.author_id.clone()).collect();
    let mut b_authors: Vec<_> = peer_b.strokes().iter().map(|s| s.author_id.clone()).collect();
    a_authors.sort();
    b_authors.sort();
    assert_eq!(a_authors, b_authors);
    assert_eq!(peer_a.shapes().len(), peer_b.shapes().len());
    assert_eq!(peer_a.text_elements().len(), peer_b.text_elements().len());
}

#[test]
fn change_callback_fires_once_per_mutation() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);

    let mut doc = Document::new();
    doc.set_on_changed(Box::new(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    doc.push_stroke(stroke("u1", 0.0));
    doc.push_shape(shape(0.0));
    doc.upsert_text(text("abc"));
    doc.clear();

    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn redundant_merge_does_not_fire_change_callback() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);

    let mut doc = Document::new();
    let snap = snapshot(vec![stroke("u1", 0.0)], vec![], vec![]);
    doc.merge_snapshot(&snap);

    doc.set_on_changed(Box::new(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    }));
    doc.merge_snapshot(&snap);

    assert_eq!(count.load(Ordering::SeqCst), 0);
}
