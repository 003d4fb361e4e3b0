use instafeed_core::config::DEFAULT_HOST;
use instafeed_core::FeedConfig;

#[test]
fn builds_graph_media_url() {
    let config = FeedConfig {
        access_token: "TOKEN".into(),
        ..Default::default()
    };
    assert_eq!(
        config.media_url(),
        "https://graph.instagram.com/me/media?fields=caption,id,media_type,media_url,permalink,thumbnail_url,timestamp,username&access_token=TOKEN"
    );

    let custom = FeedConfig {
        host: "http://127.0.0.1:9000".into(),
        access_token: "T".into(),
        ..Default::default()
    };
    assert!(custom.media_url().starts_with("http://127.0.0.1:9000/me/media?fields="));
}

#[test]
fn blank_token_is_rejected() {
    let config = FeedConfig {
        access_token: "   ".into(),
        ..Default::default()
    };
    assert_eq!(config.validate().unwrap_err().code(), 1);
}

#[test]
fn partial_json_keeps_defaults() {
    let config: FeedConfig =
        serde_json::from_str(r#"{"access_token": "abc", "cache_ttl_minutes": 0}"#).unwrap();
    assert_eq!(config.access_token, "abc");
    assert_eq!(config.cache_ttl_minutes, 0);
    assert_eq!(config.max_tries, 8);
    assert_eq!(config.host, DEFAULT_HOST);
}

#[test]
fn zero_tries_means_one() {
    let config = FeedConfig {
        max_tries: 0,
        ..Default::default()
    };
    assert_eq!(config.effective_max_tries(), 1);
}

#[test]
fn save_then_load() {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "instafeed_config_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path.push("config.json");

    let config = FeedConfig {
        access_token: "abc".into(),
        feed_id: "me".into(),
        items: 3,
        ..Default::default()
    };
    config.save(&path).unwrap();
    assert_eq!(FeedConfig::from_file(&path), config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn missing_file_gives_defaults() {
    let config = FeedConfig::from_file("/definitely/not/here/config.json");
    assert_eq!(config, FeedConfig::default());
}
