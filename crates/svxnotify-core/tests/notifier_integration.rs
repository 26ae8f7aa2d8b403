//! Integration tests for the polling cycle.
//!
//! A mock reflector proxy serves the status document and a mock Discord
//! webhook receives the announcements.

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;
use svxnotify_core::config::{FeedConfig, NotifierConfig};
use svxnotify_core::{DiscordWebhook, FeedClient, NotifierError, PollReport, SvxNotifier};

fn notifier_for(server: &Server) -> SvxNotifier {
    let feed = FeedClient::new(&FeedConfig {
        endpoint: format!("{}/reflectorproxy/", server.url()),
        ..FeedConfig::default()
    })
    .unwrap();
    SvxNotifier::new(feed, NotifierConfig::default())
}

fn discord_hook(url: String) -> DiscordWebhook {
    DiscordWebhook::new(url, Duration::from_secs(10)).unwrap()
}

fn status_document() -> String {
    json!({
        "nodes": {
            "SK6A": {
                "nodeLocation": "Göteborg",
                "monitoredTGs": [240, 2400],
                "isTalker": true,
                "tg": 240,
                "toneToTalkgroup": { "77.0": 240 }
            },
            "SM0XYZ": {
                "NodeLocation": "Stockholm",
                "monitoredTGs": [240],
                "isTalker": false,
                "tg": 0
            },
            "BROKEN": {
                "nodeLocation": "Nowhere",
                "isTalker": true,
                "tg": 240
            },
            "GHOST": {
                "hidden": true,
                "nodeLocation": "Secret",
                "monitoredTGs": [],
                "isTalker": true,
                "tg": 1
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn poll_announces_talking_nodes_through_webhook() {
    let mut server = Server::new_async().await;
    let feed = server
        .mock("GET", "/reflectorproxy/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(status_document())
        .create_async()
        .await;
    let webhook = server
        .mock("POST", "/api/webhooks/1/abc")
        .match_body(Matcher::Json(json!({
            "content": "Nod **SK6A** i **Göteborg** gick igång på talk group **240** <@&42>!!! "
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    notifier.add_listener(
        discord_hook(format!("{}/api/webhooks/1/abc", server.url())).with_role(Some(42)),
    );

    let report = notifier.poll().await.unwrap();

    assert_eq!(
        report,
        PollReport {
            nodes: 4,
            hidden: 1,
            malformed: 1,
            active: 1,
            notified: 1,
        }
    );
    assert!(notifier.history().last_active("SK6A").is_some());
    assert!(notifier.history().last_active("SM0XYZ").is_none());
    feed.assert_async().await;
    webhook.assert_async().await;
}

#[tokio::test]
async fn second_poll_within_threshold_stays_quiet() {
    let mut server = Server::new_async().await;
    let _feed = server
        .mock("GET", "/reflectorproxy/")
        .with_body(status_document())
        .expect(2)
        .create_async()
        .await;
    let webhook = server
        .mock("POST", "/hook")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    notifier.add_listener(discord_hook(format!("{}/hook", server.url())));

    let first = notifier.poll().await.unwrap();
    let second = notifier.poll().await.unwrap();

    assert_eq!(first.notified, 1);
    assert_eq!(second.active, 1);
    assert_eq!(second.notified, 0);
    webhook.assert_async().await;
}

#[tokio::test]
async fn nodes_not_a_mapping_is_an_empty_cycle() {
    let mut server = Server::new_async().await;
    let _feed = server
        .mock("GET", "/reflectorproxy/")
        .with_body(r#"{"nodes": ["SK6A", "SM0XYZ"]}"#)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    let report = notifier.poll().await.unwrap();

    assert_eq!(report, PollReport::default());
    assert!(notifier.history().is_empty());
}

#[tokio::test]
async fn non_json_body_is_an_empty_cycle() {
    let mut server = Server::new_async().await;
    let _feed = server
        .mock("GET", "/reflectorproxy/")
        .with_header("content-type", "text/html")
        .with_body("<html><body>Bad gateway</body></html>")
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);

    assert_eq!(notifier.poll().await.unwrap(), PollReport::default());
}

#[tokio::test]
async fn server_error_is_transient() {
    let mut server = Server::new_async().await;
    let _feed = server
        .mock("GET", "/reflectorproxy/")
        .with_status(502)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    let err = notifier.poll().await.unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(err, NotifierError::Feed(_)));
}

#[tokio::test]
async fn rejected_webhook_fails_the_cycle_and_retries_next_time() {
    let mut server = Server::new_async().await;
    let _feed = server
        .mock("GET", "/reflectorproxy/")
        .with_body(status_document())
        .create_async()
        .await;
    let _webhook = server
        .mock("POST", "/hook")
        .with_status(429)
        .with_body("rate limited")
        .expect(2)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    notifier.add_listener(discord_hook(format!("{}/hook", server.url())));

    let first = notifier.poll().await.unwrap_err();
    let second = notifier.poll().await.unwrap_err();

    assert!(!first.is_transient());
    assert!(second.to_string().contains("429"));
    assert!(notifier.history().is_empty());
}

#[tokio::test]
async fn poll_periodically_stops_on_shutdown() {
    let mut server = Server::new_async().await;
    let feed = server
        .mock("GET", "/reflectorproxy/")
        .with_body(r#"{"nodes": {}}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    let finished = tokio::time::timeout(
        Duration::from_secs(10),
        notifier.poll_periodically(tokio::time::sleep(Duration::from_millis(1500))),
    )
    .await;

    assert!(finished.is_ok(), "loop did not stop after shutdown");
    feed.assert_async().await;
}

#[tokio::test]
async fn poll_periodically_backs_off_after_network_errors() {
    let mut server = Server::new_async().await;
    // Cycles at 0 s and 2 s; the next one would be 4 s later.
    // Without backoff the feed would be hit at 0, 1, 2 and 3 s.
    let feed = server
        .mock("GET", "/reflectorproxy/")
        .with_status(502)
        .expect(2)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    notifier
        .poll_periodically(tokio::time::sleep(Duration::from_millis(3500)))
        .await;

    feed.assert_async().await;
}

#[tokio::test]
async fn poll_periodically_keeps_going_after_listener_errors() {
    let mut server = Server::new_async().await;
    let feed = server
        .mock("GET", "/reflectorproxy/")
        .with_body(status_document())
        .expect_at_least(2)
        .create_async()
        .await;
    let hook = server
        .mock("POST", "/hook")
        .with_status(500)
        .expect_at_least(2)
        .create_async()
        .await;

    let mut notifier = notifier_for(&server);
    notifier.add_listener(discord_hook(format!("{}/hook", server.url())));
    notifier
        .poll_periodically(tokio::time::sleep(Duration::from_millis(2500)))
        .await;

    feed.assert_async().await;
    hook.assert_async().await;
    assert!(notifier.history().is_empty());
}
