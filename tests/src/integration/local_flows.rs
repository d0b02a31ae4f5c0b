//! Flows between two platforms registered on the same node: pagination
//! custody and async command callbacks, driven over real sockets.

#[cfg(test)]
mod tests {
    use crate::support::{json_body, party, CannedResponse, FakePlatform, OcpiCall, TestNode};

    use ocn_core::domain::project::parse_next_link;
    use serde_json::json;

    #[tokio::test]
    async fn paginated_listing_travels_through_the_node() {
        let node = TestNode::start().await;
        let cpo_backend = FakePlatform::start().await;

        let msp = party("DE", "AAA");
        let cpo = party("DE", "BBB");
        node.register_local_platform(&msp, "sess-a", "out-a", "http://127.0.0.1:9/ocpi").await;
        node.register_local_platform(&cpo, "sess-b", "out-b", &format!("{}/ocpi", cpo_backend.url))
            .await;

        cpo_backend.enqueue(
            CannedResponse::success(json!([{ "id": "LOC1" }]))
                .with_header(
                    "Link",
                    format!("<{}/ocpi/locations?offset=20&limit=20>; rel=\"next\"", cpo_backend.url),
                )
                .with_header("X-Total-Count", "40")
                .with_header("X-Limit", "20"),
        );

        let client = reqwest::Client::new();
        let response = OcpiCall::get(
            &format!("{}/ocpi/sender/2.2/locations?limit=20", node.url),
            "sess-a",
            &msp,
            &cpo,
        )
        .send(&client)
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("X-Total-Count").unwrap(), "40");

        // The next page stays on the node; the platform's own URL never
        // reaches the caller.
        let link = response.headers().get("Link").unwrap().to_str().unwrap().to_string();
        let next = parse_next_link(&link).unwrap();
        assert!(
            next.starts_with(&format!("{}/ocpi/sender/2.2/locations/page/", node.url)),
            "unexpected next page: {next}"
        );

        let body = json_body(response).await;
        assert_eq!(body["status_code"], 1000);
        assert_eq!(body["data"][0]["id"], "LOC1");

        let first = &cpo_backend.requests()[0];
        assert_eq!(first.path, "/ocpi/locations");
        assert_eq!(first.query.as_deref(), Some("limit=20"));
        assert_eq!(first.authorization.as_deref(), Some("Token out-b"));

        // Following the minted link resolves to the platform's real page.
        cpo_backend.enqueue(CannedResponse::success(json!([{ "id": "LOC2" }])));
        let response = OcpiCall::get(&next, "sess-a", &msp, &cpo).send(&client).await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(response).await["data"][0]["id"], "LOC2");

        let second = &cpo_backend.requests()[1];
        assert_eq!(second.path, "/ocpi/locations");
        assert_eq!(second.query.as_deref(), Some("offset=20&limit=20"));

        // The mapping was one-shot.
        let response = OcpiCall::get(&next, "sess-a", &msp, &cpo).send(&client).await;
        assert_eq!(response.status(), 404);
        assert_eq!(json_body(response).await["status_code"], 2003);
    }

    #[tokio::test]
    async fn command_result_returns_through_the_custody_chain() {
        let node = TestNode::start().await;
        let msp_backend = FakePlatform::start().await;
        let cpo_backend = FakePlatform::start().await;

        let msp = party("DE", "AAA");
        let cpo = party("DE", "BBB");
        node.register_local_platform(&msp, "sess-a", "out-a", &format!("{}/ocpi", msp_backend.url))
            .await;
        node.register_local_platform(&cpo, "sess-b", "out-b", &format!("{}/ocpi", cpo_backend.url))
            .await;

        cpo_backend.enqueue(CannedResponse::success(json!({ "result": "ACCEPTED", "timeout": 30 })));

        let client = reqwest::Client::new();
        let original_callback = format!("{}/cb/cmd-1", msp_backend.url);
        let response = OcpiCall::post(
            &format!("{}/ocpi/receiver/2.2/commands/START_SESSION", node.url),
            "sess-a",
            &msp,
            &cpo,
            json!({
                "response_url": original_callback,
                "token": { "uid": "TK1" },
                "location_id": "LOC1",
            }),
        )
        .send(&client)
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(response).await["data"]["result"], "ACCEPTED");

        // The CPO was handed a callback route on the node, not the MSP's URL.
        let command = &cpo_backend.requests()[0];
        assert_eq!(command.path, "/ocpi/commands/START_SESSION");
        let rewritten =
            command.body.as_ref().unwrap()["response_url"].as_str().unwrap().to_string();
        assert!(
            rewritten.starts_with(&format!("{}/ocpi/sender/2.2/commands/START_SESSION/", node.url)),
            "callback must point at the node: {rewritten}"
        );
        assert_ne!(rewritten, original_callback);

        // Posting the async result to that route delivers it to the URL the
        // MSP originally named, under the MSP's outbound credential.
        let response = OcpiCall::post(&rewritten, "sess-b", &cpo, &msp, json!({ "result": "ACCEPTED" }))
            .send(&client)
            .await;
        assert_eq!(response.status(), 200);

        let delivered = &msp_backend.requests()[0];
        assert_eq!(delivered.method, "POST");
        assert_eq!(delivered.path, "/cb/cmd-1");
        assert_eq!(delivered.authorization.as_deref(), Some("Token out-a"));
        assert_eq!(delivered.body.as_ref().unwrap()["result"], "ACCEPTED");

        // The custody mapping was one-shot as well.
        let response = OcpiCall::post(&rewritten, "sess-b", &cpo, &msp, json!({ "result": "ACCEPTED" }))
            .send(&client)
            .await;
        assert_eq!(response.status(), 404);
    }
}
