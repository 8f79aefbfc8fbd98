//! Integration tests for the HTTP fraud-score source.
//!
//! Uses `wiremock` to stand in for the external risk engine.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

use transaction_validator::domain::{
    AppError, Currency, ExternalServiceError, FraudScoreSource, Transaction,
};
use transaction_validator::infra::{HttpFraudScoreSource, HttpFraudSourceConfig};

fn transaction() -> Transaction {
    Transaction::new("TX-HTTP", 2500.0, Currency::Usd, "1234567890", "0987654321")
}

fn source_for(server: &MockServer) -> HttpFraudScoreSource {
    HttpFraudScoreSource::new(HttpFraudSourceConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_score_returned_from_engine() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .and(body_partial_json(json!({
            "transaction_id": "TX-HTTP",
            "currency": "USD",
            "sender_account": "1234567890"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fraud_score": 0.07 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let score = source_for(&mock_server).sample(&transaction()).await.unwrap();
    assert_eq!(score, 0.07);
}

#[tokio::test]
async fn test_api_key_sent_as_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .and(header("authorization", "Bearer engine-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fraud_score": 0.2 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = HttpFraudSourceConfig::new(format!("{}/", mock_server.uri()));
    config.api_key = Some(SecretString::from("engine-key".to_string()));
    let source = HttpFraudScoreSource::new(config).unwrap();

    assert_eq!(source.sample(&transaction()).await.unwrap(), 0.2);
}

#[tokio::test]
async fn test_engine_error_status_mapped_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(500).set_body_string("engine failure"))
        .mount(&mock_server)
        .await;

    let result = source_for(&mock_server).sample(&transaction()).await;
    match result {
        Err(AppError::ExternalService(ExternalServiceError::ApiError {
            status_code,
            message,
        })) => {
            assert_eq!(status_code, 500);
            assert_eq!(message, "engine failure");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_mapped_to_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "score": "low" })))
        .mount(&mock_server)
        .await;

    let result = source_for(&mock_server).sample(&transaction()).await;
    assert!(matches!(
        result,
        Err(AppError::ExternalService(ExternalServiceError::ParseError(_)))
    ));
}

#[tokio::test]
async fn test_out_of_range_score_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fraud_score": 1.5 })))
        .mount(&mock_server)
        .await;

    let result = source_for(&mock_server).sample(&transaction()).await;
    assert!(matches!(
        result,
        Err(AppError::ExternalService(ExternalServiceError::ParseError(_)))
    ));
}

#[tokio::test]
async fn test_slow_engine_mapped_to_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "fraud_score": 0.05 }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let mut config = HttpFraudSourceConfig::new(mock_server.uri());
    config.timeout = Duration::from_millis(50);
    let source = HttpFraudScoreSource::new(config).unwrap();

    let result = source.sample(&transaction()).await;
    assert!(matches!(
        result,
        Err(AppError::ExternalService(ExternalServiceError::Timeout(_)))
    ));
}

#[tokio::test]
async fn test_health_check_follows_engine_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let source = source_for(&mock_server);
    assert!(source.health_check().await.is_ok());
    assert!(matches!(
        source.health_check().await,
        Err(AppError::ExternalService(ExternalServiceError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_unreachable_engine_mapped_to_network_error() {
    let source =
        HttpFraudScoreSource::new(HttpFraudSourceConfig::new("http://127.0.0.1:9")).unwrap();

    let result = source.sample(&transaction()).await;
    assert!(matches!(
        result,
        Err(AppError::ExternalService(
            ExternalServiceError::Network(_) | ExternalServiceError::Timeout(_)
        ))
    ));
}
