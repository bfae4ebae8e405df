use std::sync::Arc;
use std::time::Duration;

use neo_exporter::constants::GAS_CONTRACT;
use neo_exporter::rpc::{ContractParam, Dialer, NeoRpcClient, NeoRpcDialer, RpcClient};
use neo_exporter::{EndpointGroup, ExporterError, Pool};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn node() -> MockServer {
    let server = MockServer::start().await;
    mount(
        &server,
        "getversion",
        ok(json!({ "useragent": "/NEO-GO:0.106.0/", "protocol": { "network": 860833102 } })),
    )
    .await;
    mount(&server, "getblockcount", ok(json!(1234))).await;
    server
}

#[tokio::test]
async fn test_dial_and_block_count() {
    let server = node().await;
    let client = NeoRpcDialer::new(Duration::from_secs(5))
        .dial(&server.uri())
        .await
        .unwrap();
    assert_eq!(client.get_block_count().await.unwrap(), 1234);
    assert_eq!(client.endpoint(), server.uri());
}

#[tokio::test]
async fn test_dial_fails_without_version() {
    let server = MockServer::start().await;
    mount(&server, "getversion", ResponseTemplate::new(500)).await;
    let res = NeoRpcDialer::new(Duration::from_secs(5))
        .dial(&server.uri())
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
    let server = node().await;
    mount(
        &server,
        "getcommittee",
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "Method not found" }
        })),
    )
    .await;
    let client = NeoRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.get_committee().await.unwrap_err();
    assert!(matches!(err, ExporterError::Rpc(ref m) if m.contains("Method not found")));
}

#[tokio::test]
async fn test_invoke_function_sends_typed_params() {
    let server = node().await;
    mount(
        &server,
        "invokefunction",
        ok(json!({
            "state": "HALT",
            "gasconsumed": "100",
            "stack": [{ "type": "Integer", "value": "500" }]
        })),
    )
    .await;

    let client = NeoRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let top = client
        .invoke_function(
            GAS_CONTRACT,
            "balanceOf",
            vec![ContractParam::Hash160(GAS_CONTRACT)],
        )
        .await
        .unwrap()
        .into_top()
        .unwrap();
    assert_eq!(top.try_i64().unwrap(), 500);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .find(|b| b["method"] == "invokefunction")
        .unwrap();
    assert_eq!(body["params"][0], format!("0x{GAS_CONTRACT}"));
    assert_eq!(body["params"][1], "balanceOf");
    assert_eq!(
        body["params"][2],
        json!([{ "type": "Hash160", "value": format!("0x{GAS_CONTRACT}") }])
    );
}

#[tokio::test]
async fn test_invoke_and_traverse_pages_until_empty() {
    let server = node().await;
    mount(
        &server,
        "invokefunction",
        ok(json!({
            "state": "HALT",
            "session": "s1",
            "stack": [{ "type": "InteropInterface", "interface": "IIterator", "id": "it1" }]
        })),
    )
    .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "traverseiterator" })))
        .respond_with(ok(json!([
            { "type": "Integer", "value": "1" },
            { "type": "Integer", "value": "2" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "traverseiterator", ok(json!([]))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "terminatesession", "params": ["s1"] })))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = NeoRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let items = client
        .invoke_and_traverse(GAS_CONTRACT, "iterate", vec![], 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].try_i64().unwrap(), 2);
}

#[tokio::test]
async fn test_state_root() {
    let server = node().await;
    mount(
        &server,
        "getstateheight",
        ok(json!({ "localrootindex": 90, "validatedrootindex": 88 })),
    )
    .await;
    mount(
        &server,
        "getstateroot",
        ok(json!({
            "version": 0,
            "index": 90,
            "roothash": format!("0x{}", "11".repeat(32)),
            "witnesses": []
        })),
    )
    .await;
    let client = NeoRpcClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let height = client.get_state_height().await.unwrap();
    assert_eq!(height.local, 90);
    let root = client.get_state_root(height.local).await.unwrap();
    assert_eq!(root.to_string(), format!("0x{}", "11".repeat(32)));
}

#[tokio::test]
async fn test_pool_skips_dead_endpoint() {
    let server = node().await;
    let dialer = Arc::new(NeoRpcDialer::new(Duration::from_secs(2)));
    let group = EndpointGroup::new(
        vec!["http://127.0.0.1:1".to_string(), server.uri()],
        dialer,
    )
    .unwrap();
    let pool = Pool::connect(group, Duration::ZERO).await.unwrap();
    assert_eq!(pool.current_index(), 1);
    assert_eq!(pool.get_block_count().await.unwrap(), 1234);
}
