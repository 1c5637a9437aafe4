//! Relay flows: submission, streaming, history projection, and reset.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::fake_bridge::FakeBridge;
    use crate::integration::start_relay;

    const WAIT: Duration = Duration::from_secs(5);

    fn result_frame(text: &str) -> String {
        format!(
            "event: message\ndata: {}\n\n",
            serde_json::json!({"type": "result", "result": text})
        )
    }

    fn delta_frame(text: &str) -> String {
        format!(
            "event: message\ndata: {}\n\n",
            serde_json::json!({
                "type": "assistant",
                "message": {"content": [{"type": "text", "text": text}]}
            })
        )
    }

    #[tokio::test]
    async fn command_flows_through_to_history_and_stream() {
        let bridge = FakeBridge::start(vec![delta_frame("hi "), result_frame("hi there")]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;
        let client = reqwest::Client::new();

        // Submit a command; the bridge accepts and the user turn is recorded.
        let response = timeout(
            WAIT,
            client
                .post(format!("{relay}/api/command"))
                .json(&serde_json::json!({"command": "hello"}))
                .send(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "sent");

        let posts = bridge.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "/command");
        assert_eq!(posts[0].1["command"], "hello");

        let entries = service.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "hello");

        // The event stream mirrors the upstream bytes verbatim.
        let stream_body = timeout(WAIT, async {
            let response = client
                .get(format!("{relay}/api/events"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            assert_eq!(
                response.headers()["content-type"].to_str().unwrap(),
                "text/event-stream"
            );
            response.text().await.unwrap()
        })
        .await
        .unwrap();
        assert!(stream_body.contains("\"text\":\"hi \""));
        assert!(stream_body.contains("\"result\":\"hi there\""));

        // Draining the stream projected the terminal result into history.
        let entries = service.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].content, "hi there");

        let metrics = service.metrics().snapshot();
        assert_eq!(metrics.sessions_opened, 1);
        assert_eq!(metrics.events_parsed, 2);
    }

    #[tokio::test]
    async fn empty_command_is_rejected_without_touching_the_bridge() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/command"))
            .json(&serde_json::json!({"command": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "command is required");

        assert!(bridge.posts().is_empty());
        assert!(service.history().is_empty());
    }

    #[tokio::test]
    async fn busy_bridge_answer_passes_through_and_records_nothing() {
        let bridge = FakeBridge::start(vec![]).await;
        bridge.set_busy(true);
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/command"))
            .json(&serde_json::json!({"command": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "agent is busy");

        assert!(service.history().is_empty());
    }

    #[tokio::test]
    async fn respond_forwards_to_the_respond_endpoint() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/respond"))
            .json(&serde_json::json!({"response": "yes"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let posts = bridge.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "/respond");
        assert_eq!(posts[0].1["response"], "yes");

        let entries = service.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "yes");
    }

    #[tokio::test]
    async fn events_with_bridge_down_yields_synthetic_error_frame() {
        // Port 9 on loopback refuses connections.
        let dir = tempfile::tempdir().unwrap();
        let (relay, _service) =
            start_relay("http://127.0.0.1:9", &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .get(format!("{relay}/api/events"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );

        let body = response.text().await.unwrap();
        assert!(body.starts_with("event: error\ndata: "));
        assert!(body.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn command_with_bridge_down_is_a_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay("http://127.0.0.1:9", &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/command"))
            .json(&serde_json::json!({"command": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("upstream bridge unavailable"));

        assert!(service.history().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_history_and_forwards() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;
        let client = reqwest::Client::new();

        client
            .post(format!("{relay}/api/command"))
            .json(&serde_json::json!({"command": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(service.history().len(), 1);

        let response = client
            .post(format!("{relay}/api/reset"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "reset");

        assert!(service.history().is_empty());
        assert!(bridge.posts().iter().any(|(path, _)| path == "/reset"));
    }

    #[tokio::test]
    async fn reset_clears_history_even_when_bridge_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay("http://127.0.0.1:9", &dir.path().join("settings.json")).await;

        service.history().record_user("stale turn");

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/reset"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);

        // Local state cleared regardless of the upstream failure.
        assert!(service.history().is_empty());
    }
}
