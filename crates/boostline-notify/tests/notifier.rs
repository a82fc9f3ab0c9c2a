//! Integration tests for the Slack/Discord notifier using wiremock HTTP mocks.

use boostline_core::ReplyTarget;
use boostline_notify::{
    DiscordClient, DualChannelNotifier, Notice, Notifier, NotifyError, SlackClient,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn slack(server: &MockServer) -> SlackClient {
    SlackClient::with_base_url("xoxb-test", "C0OPS", 5, &server.uri())
        .expect("client construction should not fail")
}

fn discord(server: &MockServer) -> DiscordClient {
    DiscordClient::with_base_url("bot-test", 5, &server.uri())
        .expect("client construction should not fail")
}

#[tokio::test]
async fn slack_post_message_sends_channel_and_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(body_partial_json(
            serde_json::json!({ "channel": "C0OPS", "text": "✅ done" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    slack(&server)
        .post_message("✅ done")
        .await
        .expect("post should succeed");
}

#[tokio::test]
async fn slack_ok_false_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "ok": false, "error": "channel_not_found" })),
        )
        .mount(&server)
        .await;

    let err = slack(&server).post_message("hello").await.unwrap_err();
    assert!(
        matches!(err, NotifyError::Slack(ref msg) if msg == "channel_not_found"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn discord_send_message_uses_bot_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/1200/messages"))
        .and(header("authorization", "Bot bot-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    discord(&server)
        .send_message("1200", "hi")
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn dual_notifier_routes_reply_to_chat_and_detail_to_operator() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/1200/messages"))
        .and(body_partial_json(serde_json::json!({
            "content": "❌ Error: @ana, campaign ABC isn't active anymore. Please contact admins"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_partial_json(serde_json::json!({
            "text": "❌ Campaign ABC not found for submission m-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DualChannelNotifier::new(slack(&server), discord(&server));
    let target = ReplyTarget {
        channel_id: "1200".to_string(),
        handle: "ana".to_string(),
    };
    notifier
        .notify(
            Notice::error("Campaign ABC not found for submission m-1").with_reply(
                &target,
                "campaign ABC isn't active anymore. Please contact admins",
            ),
        )
        .await;
}

#[tokio::test]
async fn dual_notifier_swallows_delivery_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DualChannelNotifier::new(slack(&server), discord(&server));
    // Completes without panicking even though Slack returns 500.
    notifier.notify(Notice::warning("video gone")).await;
}
