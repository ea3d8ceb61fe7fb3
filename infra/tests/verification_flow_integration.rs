//! End-to-end verification flows over the in-memory store

use std::sync::Arc;

use vc_core::domain::value_objects::CompositeKey;
use vc_core::errors::DomainError;
use vc_core::services::{
    BackgroundTasks, CheckCodeRequest, CreateCodeRequest, IssueOutcome, RequestContext,
    VerificationService, VerificationStore,
};
use vc_infra::cache::{create_store, CacheConfig, CacheType, MemoryVerificationStore};
use vc_shared::config::VerificationConfig;

const TABLE: &str = "verification_code";

fn create_request() -> CreateCodeRequest {
    CreateCodeRequest {
        entity_type: "acme".to_string(),
        entity_id: "abc".to_string(),
        service_code: "login-phone".to_string(),
        communication_id: "+919999999999".to_string(),
        code_length: 4,
        cooldown_period: 60,
        code_ttl: 300,
    }
}

fn check_request(code: &str) -> CheckCodeRequest {
    CheckCodeRequest {
        entity_type: "acme".to_string(),
        entity_id: "abc".to_string(),
        service_code: "login-phone".to_string(),
        communication_id: "+919999999999".to_string(),
        verification_code: code.to_string(),
    }
}

fn key() -> CompositeKey {
    CompositeKey::derive("acme", "abc", "login-phone", "+919999999999")
}

fn setup() -> (
    Arc<MemoryVerificationStore>,
    VerificationService<MemoryVerificationStore>,
) {
    let store = Arc::new(MemoryVerificationStore::new());
    let service = VerificationService::with_secure_generator(store.clone(), VerificationConfig::default())
        .expect("default configuration is valid");
    (store, service)
}

#[tokio::test]
async fn test_issue_then_consume_once() {
    let (store, service) = setup();
    let tasks = BackgroundTasks::new();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let issued = match outcome {
        IssueOutcome::Issued(issued) => issued,
        IssueOutcome::CooldownActive => panic!("Expected a code to be issued"),
    };
    assert_eq!(issued.code.len(), 4);
    assert!(issued.code.chars().all(|c| c.is_ascii_digit()));

    let record = store.get(TABLE, &key()).await.unwrap().unwrap();
    assert_eq!(record.code, issued.code);
    assert_eq!(record.created_at, 1000);
    assert_eq!(record.expires_at, 1300);
    assert_eq!(record.fail_count, 0);

    let ctx = RequestContext::at(1005).with_tasks(tasks.clone());
    assert!(service.check_verification_code(&ctx, &check_request(&issued.code)).await.unwrap());

    tasks.wait_idle().await;
    assert!(store.get(TABLE, &key()).await.unwrap().is_none());

    let ctx = RequestContext::at(1006).with_tasks(tasks.clone());
    assert!(!service.check_verification_code(&ctx, &check_request(&issued.code)).await.unwrap());
}

#[tokio::test]
async fn test_cooldown_blocks_second_issue() {
    let (store, service) = setup();

    let first = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let second = service
        .create_verification_code(&RequestContext::at(1030), &create_request())
        .await
        .unwrap();

    assert_eq!(second, IssueOutcome::CooldownActive);
    let record = store.get(TABLE, &key()).await.unwrap().unwrap();
    assert_eq!(Some(record.code.as_str()), first.code());
    assert_eq!(record.created_at, 1000);

    let third = service
        .create_verification_code(&RequestContext::at(1060), &create_request())
        .await
        .unwrap();
    assert!(!third.is_cooldown_active());
    assert_eq!(store.get(TABLE, &key()).await.unwrap().unwrap().created_at, 1060);
}

#[tokio::test]
async fn test_fail_count_exhaustion() {
    let (store, service) = setup();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();
    let wrong = if code == "0000" { "1111" } else { "0000" };

    for now in [1010, 1020, 1030] {
        assert!(!service
            .check_verification_code(&RequestContext::at(now), &check_request(wrong))
            .await
            .unwrap());
    }
    assert_eq!(store.get(TABLE, &key()).await.unwrap().unwrap().fail_count, 3);

    assert!(!service
        .check_verification_code(&RequestContext::at(1040), &check_request(&code))
        .await
        .unwrap());
    assert_eq!(store.get(TABLE, &key()).await.unwrap().unwrap().fail_count, 3);
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let (store, service) = setup();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();

    assert!(!service
        .check_verification_code(&RequestContext::at(1301), &check_request(&code))
        .await
        .unwrap());
    assert_eq!(store.get(TABLE, &key()).await.unwrap().unwrap().fail_count, 0);
}

#[tokio::test]
async fn test_shared_store_through_trait_object() {
    let store = create_store(CacheType::Memory, &CacheConfig::default()).await.unwrap();
    let service = VerificationService::with_secure_generator(store.clone(), VerificationConfig::default()).unwrap();
    let tasks = BackgroundTasks::new();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();

    let ctx = RequestContext::at(1001).with_tasks(tasks.clone());
    assert!(service.check_verification_code(&ctx, &check_request(&code)).await.unwrap());
    tasks.wait_idle().await;
    assert!(store.get(TABLE, &key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_request_is_a_validation_error() {
    let (_store, service) = setup();

    let mut request = create_request();
    request.service_code = "login.phone".to_string();

    let error = service
        .create_verification_code(&RequestContext::at(1000), &request)
        .await
        .unwrap_err();

    assert!(matches!(error, DomainError::InvalidInput { field: "service_code", .. }));
    assert_eq!(error.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_candidate_must_match_exactly() {
    let (store, service) = setup();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();
    let padded: String = code.chars().flat_map(|c| [c, 'x']).collect();

    assert!(!service
        .check_verification_code(&RequestContext::at(1005), &check_request(&padded))
        .await
        .unwrap());
    assert_eq!(store.get(TABLE, &key()).await.unwrap().unwrap().fail_count, 1);
}

#[tokio::test]
async fn test_letter_charset_codes_verify() {
    let store = Arc::new(MemoryVerificationStore::new());
    let config = VerificationConfig {
        code_charset: "ABCDEFGH".to_string(),
        ..VerificationConfig::default()
    };
    let service = VerificationService::with_secure_generator(store.clone(), config).unwrap();
    let tasks = BackgroundTasks::new();

    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create_request())
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();
    assert!(code.chars().all(|c| "ABCDEFGH".contains(c)));

    let ctx = RequestContext::at(1005).with_tasks(tasks.clone());
    assert!(service.check_verification_code(&ctx, &check_request(&code)).await.unwrap());
    tasks.wait_idle().await;
    assert!(store.is_empty().await);
}
