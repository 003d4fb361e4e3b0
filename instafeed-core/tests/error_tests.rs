use instafeed_core::{FeedError, TransportStatus};

#[test]
fn codes_are_stable() {
    assert_eq!(FeedError::MissingAccessToken.code(), 1);
    assert_eq!(FeedError::NoOutputTarget.code(), 2);
    assert_eq!(FeedError::EmptyFeed.code(), 3);
    let failed = FeedError::FetchFailed {
        status: TransportStatus {
            status: Some(503),
            message: "Service Unavailable".into(),
            attempts: 8,
        },
    };
    assert_eq!(failed.code(), 5);
    let text = failed.to_string();
    assert!(text.contains("503"));
    assert!(text.contains("8 attempt"));
}
