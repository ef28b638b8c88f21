use pretty_assertions::assert_eq;
use wxr_core::{
    convert_posts, hash_uuid, mime_type_for_extension, RawAttachment, RawPost,
};

fn init_logging() {
    wxr_logging::initialize_for_tests();
}

fn sample_post() -> RawPost {
    RawPost {
        post_id: Some("42".to_string()),
        guid: Some("https://example.com/?p=42".to_string()),
        title: Some("My Sample Post".to_string()),
        link: Some("https://example.com/2024/06/01/my-sample-post/".to_string()),
        content: "Example content".to_string(),
        post_date: Some("2024-06-01T12:00:00".to_string()),
        post_date_gmt: Some("2024-06-01T19:00:00".to_string()),
        post_name: Some("my-sample-post".to_string()),
        tags: vec!["demo".to_string(), "sample".to_string()],
        attachments: vec![RawAttachment {
            url: "https://example.com/wp-content/uploads/2024/05/image.jpg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
            caption: Some("A sample image caption".to_string()),
            ..RawAttachment::default()
        }],
        lat: None,
        lon: None,
    }
}

#[test]
fn uuid_is_deterministic() {
    let a = hash_uuid("abc");
    let b = hash_uuid("abc");
    let c = hash_uuid("xyz");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string().len(), 36);
}

#[test]
fn uuid_is_truncated_sha1_digest() {
    // sha1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
    assert_eq!(
        hash_uuid("abc").to_string(),
        "a9993e36-4706-816a-ba3e-25717850c26c"
    );
}

#[test]
fn conversion_basic_structure() {
    init_logging();
    let result = convert_posts(&[sample_post()]);
    assert_eq!(result.len(), 1);

    let entry = &result[0];
    assert_eq!(entry.id, hash_uuid("https://example.com/?p=42"));
    assert_eq!(entry.title.as_deref(), Some("My Sample Post"));
    assert_eq!(entry.slug.as_deref(), Some("my-sample-post"));
    assert_eq!(entry.paths, vec!["/2024/06/01/my-sample-post/".to_string()]);
    assert_eq!(entry.tags, vec!["demo".to_string(), "sample".to_string()]);
    assert_eq!(entry.date.as_deref(), Some("2024-06-01T19:00:00"));
    assert_eq!(entry.source, "Example content");
}

#[test]
fn attachment_structure() {
    let result = convert_posts(&[sample_post()]);
    let att = &result[0].attachments[0];

    let expected_id = hash_uuid("/wp-content/uploads/2024/05/image.jpg");
    assert_eq!(att.id, expected_id);
    assert_eq!(att.mime_type, "image/jpeg");
    assert_eq!(
        att.paths,
        vec!["/wp-content/uploads/2024/05/image.jpg".to_string()]
    );
    assert_eq!(att.file, format!("{expected_id}.jpg"));
    assert_eq!(att.caption.as_deref(), Some("A sample image caption"));
}

#[test]
fn attachment_id_hashes_path_as_written() {
    let mut post = sample_post();
    post.attachments[0].url = "https://example.com/uploads/café/../photo.JPG?w=640".to_string();
    let result = convert_posts(&[post]);
    let att = &result[0].attachments[0];

    assert_eq!(att.id, hash_uuid("/uploads/café/../photo.JPG"));
    assert_eq!(att.paths, vec!["/uploads/café/../photo.JPG".to_string()]);
    assert_eq!(att.mime_type, "image/jpeg");
}

#[test]
fn id_falls_back_from_guid_to_link_to_post_id() {
    let mut post = sample_post();
    post.guid = Some(String::new());
    let by_link = convert_posts(std::slice::from_ref(&post));
    assert_eq!(
        by_link[0].id,
        hash_uuid("https://example.com/2024/06/01/my-sample-post/")
    );

    post.link = None;
    let by_post_id = convert_posts(&[post]);
    assert_eq!(by_post_id[0].id, hash_uuid("42"));
    assert_eq!(by_post_id[0].paths, vec![String::new()]);
}

#[test]
fn date_falls_back_to_local_timestamp() {
    let mut post = sample_post();
    post.post_date_gmt = None;
    let result = convert_posts(&[post]);
    assert_eq!(result[0].date.as_deref(), Some("2024-06-01T12:00:00"));
}

#[test]
fn coordinates_are_emitted_only_as_a_pair() {
    let mut post = sample_post();
    post.lat = Some(33.43441);
    let half = convert_posts(std::slice::from_ref(&post));
    assert_eq!(half[0].lat, None);
    assert_eq!(half[0].lon, None);

    post.lon = Some(-112.01107);
    let full = convert_posts(&[post]);
    assert_eq!(full[0].lat, Some(33.43441));
    assert_eq!(full[0].lon, Some(-112.01107));
}

#[test]
fn empty_slug_and_caption_are_omitted() {
    let mut post = sample_post();
    post.post_name = Some(String::new());
    post.attachments[0].caption = Some(String::new());
    let result = convert_posts(&[post]);

    assert_eq!(result[0].slug, None);
    assert_eq!(result[0].attachments[0].caption, None);

    let json = serde_json::to_value(&result[0]).unwrap();
    assert!(json.get("slug").is_none());
    assert!(json.get("lat").is_none());
    assert!(json["attachments"][0].get("caption").is_none());
    assert_eq!(json["attachments"][0]["type"], "image/jpeg");
}

#[test]
fn same_upload_path_converges_across_hosts_and_queries() {
    let mut first = sample_post();
    first.attachments[0].url = "https://example.com/uploads/a.png?w=300".to_string();
    let mut second = sample_post();
    second.attachments[0].url = "https://cdn.example.net/uploads/a.png".to_string();

    let result = convert_posts(&[first, second]);
    assert_eq!(result[0].attachments[0].id, result[1].attachments[0].id);
    assert_eq!(result[0].attachments[0].file, result[1].attachments[0].file);
    assert_eq!(result[0].attachments[0].mime_type, "image/png");
}

#[test]
fn mime_type_ignores_reported_type() {
    let mut post = sample_post();
    post.attachments[0].url = "https://example.com/uploads/clip.mp4".to_string();
    post.attachments[0].mime_type = Some("video/mp4".to_string());
    let result = convert_posts(&[post]);
    assert_eq!(result[0].attachments[0].mime_type, "application/octet-stream");
}

#[test]
fn missing_extension_yields_bare_id() {
    let mut post = sample_post();
    post.attachments[0].url = "https://example.com/uploads/README".to_string();
    let result = convert_posts(&[post]);
    let att = &result[0].attachments[0];
    assert_eq!(att.file, att.id.to_string());
    assert!(!att.file.ends_with('.'));
}

#[test]
fn mime_type_extraction() {
    assert_eq!(mime_type_for_extension("jpg"), "image/jpeg");
    assert_eq!(mime_type_for_extension("jpeg"), "image/jpeg");
    assert_eq!(mime_type_for_extension("png"), "image/png");
    assert_eq!(mime_type_for_extension("gif"), "image/gif");
    assert_eq!(mime_type_for_extension("file"), "application/octet-stream");
    assert_eq!(mime_type_for_extension(""), "application/octet-stream");
}

#[test]
fn conversion_preserves_input_order() {
    let posts: Vec<RawPost> = (0..5)
        .map(|i| RawPost {
            guid: Some(format!("https://example.com/?p={i}")),
            ..RawPost::default()
        })
        .collect();
    let result = convert_posts(&posts);
    let ids: Vec<_> = result.iter().map(|e| e.id).collect();
    let expected: Vec<_> = (0..5)
        .map(|i| hash_uuid(&format!("https://example.com/?p={i}")))
        .collect();
    assert_eq!(ids, expected);
}
