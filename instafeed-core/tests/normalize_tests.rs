use instafeed_core::{extract_tags, normalize, MediaKind, RawMediaRecord};

fn record(media_type: &str) -> RawMediaRecord {
    RawMediaRecord {
        id: Some("17".into()),
        caption: Some("hello #world".into()),
        media_type: Some(media_type.into()),
        media_url: Some("http://x/media.jpg".into()),
        thumbnail_url: Some("http://x/thumb.jpg".into()),
        permalink: Some("http://x/p/17".into()),
        timestamp: Some("2024-10-21T07:28:00+0000".into()),
        username: Some("someone".into()),
    }
}

#[test]
fn keeps_only_clean_tags() {
    let tags = extract_tags(Some("Great day! #sunny #fun-times #a/b"));
    assert_eq!(tags, vec!["sunny".to_string()]);
}

#[test]
fn keeps_duplicates_in_order() {
    let tags = extract_tags(Some("#b #a #b\n#c"));
    assert_eq!(tags, vec!["b", "a", "b", "c"]);
}

#[test]
fn adjacent_hashes_reject_the_run() {
    assert!(extract_tags(Some("#one#two")).is_empty());
    assert!(extract_tags(Some("# lonely")).is_empty());
}

#[test]
fn missing_caption_has_no_tags() {
    assert!(extract_tags(None).is_empty());
}

#[test]
fn video_uses_thumbnail() {
    let item = normalize(&record("VIDEO"));
    assert_eq!(item.kind, Some(MediaKind::Video));
    assert_eq!(item.image.as_deref(), Some("http://x/thumb.jpg"));
    assert_eq!(item.tags, vec!["world"]);
    assert_eq!(item.link.as_deref(), Some("http://x/p/17"));
}

#[test]
fn image_and_album_use_media_url() {
    let image = normalize(&record("IMAGE"));
    assert_eq!(image.kind, Some(MediaKind::Image));
    assert_eq!(image.image.as_deref(), Some("http://x/media.jpg"));

    let album = normalize(&record("CAROUSEL_ALBUM"));
    assert_eq!(album.kind, Some(MediaKind::Album));
    assert_eq!(album.image.as_deref(), Some("http://x/media.jpg"));
}

#[test]
fn unknown_type_is_not_renderable() {
    let item = normalize(&record("REEL"));
    assert_eq!(item.kind, None);
    assert_eq!(item.image, None);
    assert!(!item.is_renderable());
}

#[test]
fn serializes_type_in_lowercase() {
    let item = normalize(&record("CAROUSEL_ALBUM"));
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "album");
    assert_eq!(json["raw"]["media_type"], "CAROUSEL_ALBUM");
}
