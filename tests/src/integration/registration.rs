//! Admission over live HTTP: the operator grant, the catalog walk in both
//! directions and the credentials handshake.

#[cfg(test)]
mod tests {
    use crate::support::{json_body, party, CannedResponse, FakePlatform, OcpiCall, TestNode};

    use ocn_core::ports::PlatformDirectory;
    use serde_json::json;

    #[tokio::test]
    async fn admission_runs_the_full_handshake() {
        let node = TestNode::start().await;
        let platform_backend = FakePlatform::start().await;
        let client = reqwest::Client::new();

        // The operator reserves the party and hands out a setup token.
        let grant = client
            .post(format!("{}/admin/generate-registration-token", node.url))
            .header("Authorization", "Token admin-key")
            .json(&json!([{ "country_code": "DE", "party_id": "AAA" }]))
            .send()
            .await
            .unwrap();
        assert_eq!(grant.status(), 200);
        let grant = json_body(grant).await;
        assert_eq!(grant["versions_url"], format!("{}/ocpi/versions", node.url));
        let setup_token = grant["token"].as_str().unwrap().to_string();

        // The platform walks the node's catalog with it.
        let listing = client
            .get(format!("{}/ocpi/versions", node.url))
            .header("Authorization", format!("Token {setup_token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(listing.status(), 200);
        let listing = json_body(listing).await;
        assert_eq!(listing["data"][0]["version"], "2.2");
        assert_eq!(listing["data"][0]["url"], format!("{}/ocpi/2.2", node.url));

        // It then posts its credentials; the node walks the platform's own
        // catalog before answering with node credentials.
        platform_backend.enqueue(CannedResponse::success(json!([
            { "version": "2.2", "url": format!("{}/ocpi/2.2", platform_backend.url) },
        ])));
        platform_backend.enqueue(CannedResponse::success(json!({
            "version": "2.2",
            "endpoints": [
                { "identifier": "sessions", "role": "SENDER", "url": format!("{}/ocpi/sessions", platform_backend.url) },
                { "identifier": "commands", "role": "RECEIVER", "url": format!("{}/ocpi/commands", platform_backend.url) },
            ],
        })));

        let response = client
            .post(format!("{}/ocpi/2.2/credentials", node.url))
            .header("Authorization", format!("Token {setup_token}"))
            .json(&json!({
                "token": "platform-outbound-1",
                "url": format!("{}/ocpi/versions", platform_backend.url),
                "roles": [{
                    "role": "EMSP",
                    "party_id": "AAA",
                    "country_code": "DE",
                    "business_details": { "name": "Example MSP" },
                }],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = json_body(response).await;
        assert_eq!(body["status_code"], 1000);
        assert_eq!(body["data"]["url"], format!("{}/ocpi/versions", node.url));
        assert_eq!(body["data"]["roles"][0]["role"], "HUB");
        let session_token = body["data"]["token"].as_str().unwrap().to_string();
        assert_ne!(session_token, setup_token);

        // The catalog walk ran under the token the platform handed over.
        let walked = platform_backend.requests();
        assert_eq!(walked.len(), 2);
        assert_eq!(walked[0].path, "/ocpi/versions");
        assert_eq!(walked[0].authorization.as_deref(), Some("Token platform-outbound-1"));
        assert_eq!(walked[1].path, "/ocpi/2.2");

        // The platform is connected and its party routable.
        let platform = node
            .directory
            .platform_by_session_token(&session_token)
            .await
            .unwrap()
            .expect("platform under the fresh session token");
        assert!(platform.is_connected());
        assert_eq!(
            node.directory.platform_of_party(&party("DE", "AAA")).await.unwrap(),
            Some(platform.id),
        );

        // The setup token is spent; the session token opens the catalog now.
        let replay = client
            .post(format!("{}/ocpi/2.2/credentials", node.url))
            .header("Authorization", format!("Token {setup_token}"))
            .json(&json!({ "token": "t", "url": "http://127.0.0.1:9/ocpi/versions", "roles": [] }))
            .send()
            .await
            .unwrap();
        assert_eq!(replay.status(), 401);

        let relisted = client
            .get(format!("{}/ocpi/versions", node.url))
            .header("Authorization", format!("Token {session_token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(relisted.status(), 200);
    }

    #[tokio::test]
    async fn unregistering_revokes_the_session() {
        let node = TestNode::start().await;
        let msp = party("DE", "AAA");
        let cpo = party("DE", "BBB");
        node.register_local_platform(&msp, "sess-a", "out-a", "http://127.0.0.1:9/ocpi").await;
        node.register_local_platform(&cpo, "sess-b", "out-b", "http://127.0.0.1:9/ocpi").await;

        let client = reqwest::Client::new();
        let response = client
            .delete(format!("{}/ocpi/2.2/credentials", node.url))
            .header("Authorization", "Token sess-a")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        assert!(node.directory.platform_by_session_token("sess-a").await.unwrap().is_none());
        assert!(node.directory.platform_of_party(&msp).await.unwrap().is_none());

        // Protocol calls under the revoked session are refused.
        let response = OcpiCall::get(&format!("{}/ocpi/sender/2.2/locations", node.url), "sess-a", &msp, &cpo)
            .send(&client)
            .await;
        assert_eq!(response.status(), 401);
        assert_eq!(json_body(response).await["status_code"], 2001);
    }

    #[tokio::test]
    async fn wrong_admin_token_cannot_mint_grants() {
        let node = TestNode::start().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/admin/generate-registration-token", node.url))
            .header("Authorization", "Token not-the-key")
            .json(&json!([{ "country_code": "DE", "party_id": "AAA" }]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }
}
