use build_protocol_backend::server::Server;
use insta::assert_snapshot;
use jsonrpc_core::IoHandler;
use serde_json::{Value, json};

use crate::common::FooBackend;

async fn call(io: &IoHandler, id: u64, method: &str, params: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });
    let response = io
        .handle_request(&request.to_string())
        .await
        .expect("requests with an id always get a response");
    serde_json::from_str(&response).unwrap()
}

#[tokio::test]
async fn test_end_to_end_over_json_rpc() {
    let source_dir = tempfile::tempdir().unwrap();
    let io = Server::new(FooBackend::providing_metadata()).io_handler();

    let response = call(
        &io,
        1,
        "initialize",
        json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
    )
    .await;
    assert_eq!(
        response["result"],
        json!({ "capabilities": { "providesCondaMetadata": true } })
    );

    let response = call(
        &io,
        2,
        "condaMetadata",
        json!({
            "targetPlatform": "linux-64",
            "channelBaseUrls": ["https://repo.example/conda-forge"],
        }),
    )
    .await;
    assert_eq!(
        response["result"],
        json!({
            "packages": [{
                "name": "foo",
                "version": "1.0",
                "build": "py_0",
                "buildNumber": 0,
                "subdir": "linux-64",
            }]
        })
    );
}

#[tokio::test]
async fn test_validation_errors_are_invalid_params() {
    let io = Server::new(FooBackend::providing_metadata()).io_handler();
    let response = call(&io, 1, "initialize", json!({ "capabilities": {} })).await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(
        response["error"]["data"],
        json!({
            "message": "InitializeParams",
            "errors": [{ "path": "sourceDir", "constraint": { "kind": "required" } }]
        })
    );
    assert_snapshot!(
        response["error"]["message"].as_str().unwrap(),
        @"invalid InitializeParams: sourceDir: field is required"
    );
}

#[tokio::test]
async fn test_sequencing_errors_are_invalid_requests() {
    let io = Server::new(FooBackend::providing_metadata()).io_handler();
    let response = call(
        &io,
        1,
        "condaMetadata",
        json!({ "targetPlatform": "linux-64" }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(
        response["error"]["message"],
        "'condaMetadata' was called before the session was initialized"
    );
}

#[tokio::test]
async fn test_rejected_channel_scheme() {
    let source_dir = tempfile::tempdir().unwrap();
    let io = Server::new(FooBackend::providing_metadata()).io_handler();
    call(
        &io,
        1,
        "initialize",
        json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
    )
    .await;

    let response = call(
        &io,
        2,
        "condaMetadata",
        json!({ "channelBaseUrls": ["https://repo.example/conda-forge", "ftp://x/y"] }),
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(
        response["error"]["data"]["errors"][0]["path"],
        "channelBaseUrls[1]"
    );
    assert_eq!(
        response["error"]["data"]["errors"][0]["constraint"]["scheme"],
        "ftp"
    );
}

#[tokio::test]
async fn test_unknown_method() {
    let io = Server::new(FooBackend::providing_metadata()).io_handler();
    let response = call(&io, 1, "conda/build", json!({})).await;
    assert_eq!(response["error"]["code"], -32601);
}
