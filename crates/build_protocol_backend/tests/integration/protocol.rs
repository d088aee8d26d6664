use build_protocol_backend::session::{DispatchError, SequencingError, Session};
use build_protocol_types::{
    Method, Validate,
    procedures::conda_metadata::CondaMetadataResult,
    validation::Constraint,
};
use rstest::rstest;
use serde_json::json;

use crate::common::FooBackend;

#[tokio::test]
async fn test_initialize_then_conda_metadata() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::providing_metadata());

    let result = session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();
    assert_eq!(result, json!({ "capabilities": { "providesCondaMetadata": true } }));
    assert!(session.is_initialized());

    let result = session
        .handle(
            "condaMetadata",
            &json!({
                "targetPlatform": "linux-64",
                "channelBaseUrls": ["https://repo.example/conda-forge"],
            }),
        )
        .await
        .unwrap();
    let expected = json!({
        "packages": [{
            "name": "foo",
            "version": "1.0",
            "build": "py_0",
            "buildNumber": 0,
            "subdir": "linux-64",
        }]
    });
    assert_eq!(result, expected);

    // Re-validating the serialized result yields the same value.
    let validated = CondaMetadataResult::validate(&result).unwrap();
    assert_eq!(serde_json::to_value(&validated).unwrap(), result);
    assert_eq!(CondaMetadataResult::validate(&expected).unwrap(), validated);
}

#[tokio::test]
async fn test_metadata_may_be_queried_repeatedly() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::providing_metadata());
    session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();

    for platform in ["linux-64", "osx-arm64", "noarch"] {
        let result = session
            .handle("condaMetadata", &json!({ "targetPlatform": platform }))
            .await
            .unwrap();
        assert_eq!(result["packages"][0]["subdir"], platform);
    }
}

#[rstest]
#[case::initialize_twice(true, "initialize", SequencingError::AlreadyInitialized)]
#[case::metadata_before_initialize(
    false,
    "condaMetadata",
    SequencingError::NotInitialized { method: Method::CondaMetadata }
)]
#[tokio::test]
async fn test_out_of_order_requests(
    #[case] initialized: bool,
    #[case] method: &str,
    #[case] expected: SequencingError,
) {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::providing_metadata());
    if initialized {
        session
            .handle(
                "initialize",
                &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
            )
            .await
            .unwrap();
    }

    // The payloads are valid, only the order is wrong.
    let params = match method {
        "initialize" => json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        _ => json!({ "targetPlatform": "linux-64" }),
    };
    let err = session.handle(method, &params).await.unwrap_err();
    let DispatchError::Sequencing(err) = err else {
        panic!("expected a sequencing error, got {err:?}");
    };
    assert_eq!(err, expected);
    assert_eq!(session.is_initialized(), initialized);
}

#[tokio::test]
async fn test_nonexistent_source_dir_fails_validation() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::providing_metadata());
    let err = session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path().join("nope"), "capabilities": {} }),
        )
        .await
        .unwrap_err();

    let DispatchError::Validation(err) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(err.error_at("sourceDir").unwrap().constraint, Constraint::PathNotFound);
    assert!(!session.is_initialized());
    assert_eq!(session.backend_capabilities(), None);

    // A corrected request is still accepted.
    session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_declared_missing_capability_rejects_conda_metadata() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend {
        provides_conda_metadata: Some(false),
    });
    session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();

    let err = session
        .handle("condaMetadata", &json!({ "targetPlatform": "linux-64" }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Sequencing(SequencingError::CapabilityNotProvided { .. })
    ));
}

#[tokio::test]
async fn test_unspecified_capability_permits_conda_metadata() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::default());
    let result = session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();
    assert_eq!(result, json!({ "capabilities": {} }));

    session
        .handle("condaMetadata", &json!({ "targetPlatform": "linux-64" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_backend_errors_are_not_protocol_errors() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(FooBackend::providing_metadata());
    session
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();

    let err = session.handle("condaMetadata", &json!({})).await.unwrap_err();
    assert!(matches!(err, DispatchError::Backend(_)));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut first = Session::new(FooBackend::providing_metadata());
    let second = Session::new(FooBackend::providing_metadata());

    first
        .handle(
            "initialize",
            &json!({ "sourceDir": source_dir.path(), "capabilities": {} }),
        )
        .await
        .unwrap();
    assert!(first.is_initialized());
    assert!(!second.is_initialized());
}
