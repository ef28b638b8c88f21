use pretty_assertions::assert_eq;
use wxr_core::{RawAttachment, RawPost};
use wxr_engine::{build_entries, ExportRun, LocalHosts, Normalizer, WxrExport};

const UPLOADS: &str = "https://example.com/wp-content/uploads";

fn declared() -> Vec<RawAttachment> {
    vec![
        RawAttachment {
            post_id: Some("101".to_string()),
            url: format!("{UPLOADS}/a.jpg"),
            post_parent: Some("20".to_string()),
            ..RawAttachment::default()
        },
        RawAttachment {
            post_id: Some("102".to_string()),
            url: format!("{UPLOADS}/b.jpg"),
            caption: Some("Declared caption".to_string()),
            post_parent: Some("99".to_string()),
            ..RawAttachment::default()
        },
    ]
}

fn posts() -> Vec<RawPost> {
    vec![
        RawPost {
            post_id: Some("20".to_string()),
            guid: Some("https://example.com/?p=20".to_string()),
            link: Some("https://example.com/first/".to_string()),
            content: format!(
                r#"<figure><img src="{UPLOADS}/a.jpg"><figcaption>Harbor</figcaption></figure><p>Text</p><img src="https://example.com/extra.png">"#
            ),
            ..RawPost::default()
        },
        RawPost {
            post_id: Some("21".to_string()),
            guid: Some("https://example.com/?p=21".to_string()),
            link: Some("https://example.com/second/".to_string()),
            content: format!(
                r#"<p>Again</p><img src="https://example.com/extra.png"><img src="{UPLOADS}/b.jpg">[leaflet-map lat=1.5 lng=2.5]"#
            ),
            ..RawPost::default()
        },
    ]
}

fn normalizer() -> Normalizer {
    Normalizer::new(LocalHosts::new(["example.com"]))
}

fn urls(post: &RawPost) -> Vec<&str> {
    post.attachments.iter().map(|a| a.url.as_str()).collect()
}

#[test]
fn posts_are_normalized_in_place() {
    let mut run = ExportRun::new(normalizer(), declared());
    let prepared = run.prepare(posts());

    assert_eq!(prepared[0].content, "Text");
    assert_eq!(prepared[1].content, "Again");
    assert_eq!(prepared[0].lat, None);
    assert_eq!(prepared[1].lat, Some(1.5));
    assert_eq!(prepared[1].lon, Some(2.5));
}

#[test]
fn declared_children_come_before_referenced_images() {
    let mut run = ExportRun::new(normalizer(), declared());
    let prepared = run.prepare(posts());

    assert_eq!(
        urls(&prepared[0]),
        vec![
            format!("{UPLOADS}/a.jpg").as_str(),
            "https://example.com/extra.png"
        ]
    );
    assert_eq!(prepared[0].attachments[0].caption.as_deref(), Some("Harbor"));
}

#[test]
fn shared_images_are_listed_on_every_referencing_post() {
    let mut run = ExportRun::new(normalizer(), declared());
    let prepared = run.prepare(posts());

    assert_eq!(
        urls(&prepared[1]),
        vec![
            "https://example.com/extra.png",
            format!("{UPLOADS}/b.jpg").as_str()
        ]
    );
    assert_eq!(
        prepared[1].attachments[1].caption.as_deref(),
        Some("Declared caption")
    );
}

#[test]
fn ad_hoc_images_belong_to_their_first_post() {
    let mut run = ExportRun::new(normalizer(), declared());
    run.prepare(posts());

    let index = run.into_index();
    assert_eq!(index.len(), 3);
    let stub = index.get("https://example.com/extra.png").unwrap();
    assert_eq!(stub.post_parent.as_deref(), Some("20"));
    assert_eq!(stub.post_id, None);
    // Declared parents are never reassigned.
    let b = index.get(&format!("{UPLOADS}/b.jpg")).unwrap();
    assert_eq!(b.post_parent.as_deref(), Some("99"));
}

#[test]
fn conversion_is_deterministic() {
    let export = WxrExport {
        posts: posts(),
        attachments: declared(),
    };
    let first = build_entries(export.clone(), normalizer());
    let second = build_entries(export, normalizer());
    assert_eq!(first, second);

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].paths, vec!["/first/".to_string()]);
    assert_eq!(first[0].attachments.len(), 2);
    // Both posts point at the same staged file for the shared image.
    assert_eq!(first[0].attachments[1].file, first[1].attachments[0].file);
    assert_eq!(first[1].attachments[0].mime_type, "image/png");
}

#[test]
fn posts_without_local_hosts_keep_remote_images() {
    let mut run = ExportRun::new(Normalizer::default(), Vec::new());
    let prepared = run.prepare(vec![RawPost {
        post_id: Some("1".to_string()),
        content: r#"<img src="https://example.com/x.png" alt="x">"#.to_string(),
        ..RawPost::default()
    }]);
    assert!(prepared[0].attachments.is_empty());
    assert_eq!(prepared[0].content, "![x](https://example.com/x.png)");
    assert!(run.index().is_empty());
}
