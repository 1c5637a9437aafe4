//! Admin surface: allow-list persistence, workdir, clients, and metrics.

#[cfg(test)]
mod tests {
    use crate::fake_bridge::FakeBridge;
    use crate::integration::start_relay;

    #[tokio::test]
    async fn whitelist_round_trip_persists_to_the_settings_file() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.json");
        let (relay, _service) = start_relay(&bridge.base_url(), &settings).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{relay}/api/admin/whitelist/add"))
            .json(&serde_json::json!({"address": "10.0.0.5"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["whitelist"], serde_json::json!(["10.0.0.5"]));

        // Written through to disk immediately.
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(on_disk["whitelist"], serde_json::json!(["10.0.0.5"]));

        let response = client
            .get(format!("{relay}/api/admin/whitelist"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["whitelist"], serde_json::json!(["10.0.0.5"]));

        let response = client
            .post(format!("{relay}/api/admin/whitelist/remove"))
            .json(&serde_json::json!({"address": "10.0.0.5"}))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["whitelist"], serde_json::json!([]));

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(on_disk["whitelist"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn whitelist_add_requires_a_non_empty_entry() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, _service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .post(format!("{relay}/api/admin/whitelist/add"))
            .json(&serde_json::json!({"address": "  "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "address is required");
    }

    #[tokio::test]
    async fn workdir_set_then_get() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.json");
        let (relay, _service) = start_relay(&bridge.base_url(), &settings).await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{relay}/api/admin/workdir"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["workDir"], serde_json::Value::Null);

        let response = client
            .post(format!("{relay}/api/admin/workdir"))
            .json(&serde_json::json!({"workDir": "/srv/project"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = client
            .get(format!("{relay}/api/admin/workdir"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["workDir"], "/srv/project");

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(on_disk["workDir"], "/srv/project");
    }

    #[tokio::test]
    async fn status_passes_the_bridge_document_through() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, _service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        let response = reqwest::Client::new()
            .get(format!("{relay}/api/status"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["running"], true);
        assert_eq!(body["busy"], false);
    }

    #[tokio::test]
    async fn history_endpoint_uses_wire_field_names() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;

        service.history().record_user("hello");

        let response = reqwest::Client::new()
            .get(format!("{relay}/api/history"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["history"][0]["role"], "user");
        assert_eq!(body["history"][0]["content"], "hello");
        assert!(body["history"][0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn clients_and_metrics_observe_traffic() {
        let bridge = FakeBridge::start(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (relay, _service) =
            start_relay(&bridge.base_url(), &dir.path().join("settings.json")).await;
        let client = reqwest::Client::new();

        client
            .get(format!("{relay}/api/status"))
            .send()
            .await
            .unwrap();

        let response = client
            .get(format!("{relay}/api/admin/clients"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        let clients = body["clients"].as_array().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0]["addr"], "127.0.0.1");
        assert!(clients[0]["requests"].as_u64().unwrap() >= 1);

        let response = client
            .get(format!("{relay}/api/admin/metrics"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        // status + clients at minimum; the metrics request itself may or may
        // not be counted yet when the snapshot is taken.
        assert!(body["requestsTotal"].as_u64().unwrap() >= 2);
        assert_eq!(body["requestsDenied"], 0);
    }
}
