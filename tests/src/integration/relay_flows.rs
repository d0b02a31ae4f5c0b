//! Flows between platforms registered on different nodes: signed relays,
//! credential substitution per hop and paged-fetch hand-off.

#[cfg(test)]
mod tests {
    use crate::support::{json_body, party, CannedResponse, FakePlatform, OcpiCall, TestNode};

    use ocn_core::domain::project::parse_next_link;
    use ocn_types::PartyId;
    use serde_json::json;

    /// Two nodes, an MSP on the first, a CPO with a live backend on the
    /// second, each node's registry aware of both parties.
    async fn federation() -> (TestNode, TestNode, FakePlatform, PartyId, PartyId) {
        let node1 = TestNode::start().await;
        let node2 = TestNode::start().await;
        let cpo_backend = FakePlatform::start().await;

        let msp = party("DE", "AAA");
        let cpo = party("NL", "BBB");
        node1.register_local_platform(&msp, "sess-a", "out-a", "http://127.0.0.1:9/ocpi").await;
        node2
            .register_local_platform(&cpo, "sess-b", "out-b", &format!("{}/ocpi", cpo_backend.url))
            .await;
        node1.link_remote(&cpo, &node2);
        node2.link_remote(&msp, &node1);

        (node1, node2, cpo_backend, msp, cpo)
    }

    #[tokio::test]
    async fn module_call_crosses_nodes_with_substituted_credentials() {
        let (node1, _node2, cpo_backend, msp, cpo) = federation().await;
        cpo_backend.enqueue(CannedResponse::success(json!([{ "id": "S1" }])));

        let client = reqwest::Client::new();
        let call =
            OcpiCall::get(&format!("{}/ocpi/sender/2.2/sessions", node1.url), "sess-a", &msp, &cpo);
        let original_request_id = call.request_id.clone();
        let correlation_id = call.correlation_id.clone();

        let response = call.send(&client).await;
        assert_eq!(response.status(), 200);
        let body = json_body(response).await;
        assert_eq!(body["status_code"], 1000);
        assert_eq!(body["data"][0]["id"], "S1");

        // The delivering node presented its own outbound credential for the
        // platform; the caller's bearer token never crossed nodes.
        let seen = &cpo_backend.requests()[0];
        assert_eq!(seen.path, "/ocpi/sessions");
        assert_eq!(seen.authorization.as_deref(), Some("Token out-b"));

        // Fresh hop id, stable correlation id.
        assert_eq!(seen.correlation_id.as_deref(), Some(correlation_id.as_str()));
        assert_ne!(seen.request_id.as_deref(), Some(original_request_id.as_str()));
    }

    #[tokio::test]
    async fn relayed_page_fetch_resolves_on_the_operating_node() {
        let (node1, _node2, cpo_backend, msp, cpo) = federation().await;
        cpo_backend.enqueue(
            CannedResponse::success(json!([{ "id": "CDR1" }])).with_header(
                "Link",
                format!("<{}/ocpi/cdrs?offset=100>; rel=\"next\"", cpo_backend.url),
            ),
        );

        let client = reqwest::Client::new();
        let response = OcpiCall::get(&format!("{}/ocpi/sender/2.2/cdrs", node1.url), "sess-a", &msp, &cpo)
            .send(&client)
            .await;
        assert_eq!(response.status(), 200);

        // The link that crossed the relay was re-minted on the caller's node.
        let link = response.headers().get("Link").unwrap().to_str().unwrap().to_string();
        let next = parse_next_link(&link).unwrap();
        assert!(
            next.starts_with(&format!("{}/ocpi/sender/2.2/cdrs/page/", node1.url)),
            "unexpected next page: {next}"
        );

        // Following it relays the fetch with hand-off metadata; the far node
        // registers the mapping and resolves it against the platform.
        cpo_backend.enqueue(CannedResponse::success(json!([{ "id": "CDR2" }])));
        let response = OcpiCall::get(&next, "sess-a", &msp, &cpo).send(&client).await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(response).await["data"][0]["id"], "CDR2");

        let page = &cpo_backend.requests()[1];
        assert_eq!(page.path, "/ocpi/cdrs");
        assert_eq!(page.query.as_deref(), Some("offset=100"));
        assert_eq!(page.authorization.as_deref(), Some("Token out-b"));

        // Both sides consumed their mapping.
        let response = OcpiCall::get(&next, "sess-a", &msp, &cpo).send(&client).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn command_callback_crosses_nodes_both_ways() {
        let node1 = TestNode::start().await;
        let node2 = TestNode::start().await;
        let msp_backend = FakePlatform::start().await;
        let cpo_backend = FakePlatform::start().await;

        let msp = party("DE", "AAA");
        let cpo = party("NL", "BBB");
        node1
            .register_local_platform(&msp, "sess-a", "out-a", &format!("{}/ocpi", msp_backend.url))
            .await;
        node2
            .register_local_platform(&cpo, "sess-b", "out-b", &format!("{}/ocpi", cpo_backend.url))
            .await;
        node1.link_remote(&cpo, &node2);
        node2.link_remote(&msp, &node1);

        cpo_backend.enqueue(CannedResponse::success(json!({ "result": "ACCEPTED", "timeout": 30 })));

        let client = reqwest::Client::new();
        let original_callback = format!("{}/cb/cmd-7", msp_backend.url);
        let response = OcpiCall::post(
            &format!("{}/ocpi/receiver/2.2/commands/STOP_SESSION", node1.url),
            "sess-a",
            &msp,
            &cpo,
            json!({ "response_url": original_callback, "session_id": "S1" }),
        )
        .send(&client)
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(json_body(response).await["data"]["result"], "ACCEPTED");

        // The CPO's copy of the callback points at its own node, which holds
        // the handed-off mapping back to the MSP's URL.
        let command = &cpo_backend.requests()[0];
        let rewritten =
            command.body.as_ref().unwrap()["response_url"].as_str().unwrap().to_string();
        assert!(
            rewritten.starts_with(&format!("{}/ocpi/sender/2.2/commands/STOP_SESSION/", node2.url)),
            "callback must point at the operating node: {rewritten}"
        );

        // The async result travels the reverse relay back to the MSP.
        let response = OcpiCall::post(&rewritten, "sess-b", &cpo, &msp, json!({ "result": "ACCEPTED" }))
            .send(&client)
            .await;
        assert_eq!(response.status(), 200);

        let delivered = &msp_backend.requests()[0];
        assert_eq!(delivered.path, "/cb/cmd-7");
        assert_eq!(delivered.authorization.as_deref(), Some("Token out-a"));
        assert_eq!(delivered.body.as_ref().unwrap()["result"], "ACCEPTED");
    }

    #[tokio::test]
    async fn unknown_receivers_are_refused_at_the_first_node() {
        let (node1, _node2, cpo_backend, msp, _cpo) = federation().await;

        let client = reqwest::Client::new();
        let response = OcpiCall::get(
            &format!("{}/ocpi/sender/2.2/sessions", node1.url),
            "sess-a",
            &msp,
            &party("FR", "ZZZ"),
        )
        .send(&client)
        .await;
        assert_eq!(response.status(), 404);
        assert_eq!(json_body(response).await["status_code"], 4001);
        assert!(cpo_backend.requests().is_empty());
    }
}
