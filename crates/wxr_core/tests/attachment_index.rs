use pretty_assertions::assert_eq;
use wxr_core::{AttachmentIndex, RawAttachment};

fn declared(url: &str, parent: &str) -> RawAttachment {
    RawAttachment {
        post_id: Some("7".to_string()),
        url: url.to_string(),
        post_parent: Some(parent.to_string()),
        ..RawAttachment::default()
    }
}

#[test]
fn seeding_skips_attachments_without_url() {
    let index = AttachmentIndex::from_attachments(vec![
        declared("https://example.com/a.jpg", "1"),
        declared("", "1"),
    ]);
    assert_eq!(index.len(), 1);
    assert!(index.contains("https://example.com/a.jpg"));
}

#[test]
fn iteration_follows_insertion_order() {
    let mut index = AttachmentIndex::new();
    index.insert("https://example.com/z.jpg", RawAttachment::ad_hoc("https://example.com/z.jpg"));
    index.insert("https://example.com/a.jpg", RawAttachment::ad_hoc("https://example.com/a.jpg"));
    index.insert("https://example.com/m.jpg", RawAttachment::ad_hoc("https://example.com/m.jpg"));

    let keys: Vec<_> = index.iter().map(|(src, _)| src.to_string()).collect();
    assert_eq!(
        keys,
        vec![
            "https://example.com/z.jpg",
            "https://example.com/a.jpg",
            "https://example.com/m.jpg"
        ]
    );
}

#[test]
fn get_or_insert_reports_creation_once() {
    let mut index = AttachmentIndex::new();
    let (entry, created) = index.get_or_insert_with("https://example.com/x.png", || {
        RawAttachment::ad_hoc("https://example.com/x.png")
    });
    assert!(created);
    entry.caption = Some("X".to_string());

    let (entry, created) =
        index.get_or_insert_with("https://example.com/x.png", || unreachable!());
    assert!(!created);
    assert_eq!(entry.caption.as_deref(), Some("X"));
    assert_eq!(index.len(), 1);
}

#[test]
fn child_relationship_requires_matching_parent() {
    let att = declared("https://example.com/a.jpg", "1");
    assert!(att.is_child_of(Some("1")));
    assert!(!att.is_child_of(Some("2")));
    assert!(!att.is_child_of(None));
    assert!(!RawAttachment::ad_hoc("u").is_child_of(Some("1")));
}
