//! Integration tests for the Redis verification store
//!
//! These tests require a running Redis instance to execute.
//! Run with: cargo test -p vc_infra --test redis_integration -- --ignored

use std::sync::Arc;

use vc_core::domain::entities::{fields, VerificationRecord};
use vc_core::domain::value_objects::{CompositeKey, RecordUpdate};
use vc_core::services::{
    BackgroundTasks, CheckCodeRequest, CreateCodeRequest, RequestContext, VerificationService,
    VerificationStore,
};
use vc_infra::cache::{CacheConfig, RedisClient, RedisVerificationStore};
use vc_shared::config::VerificationConfig;

const TABLE: &str = "verification_code";

async fn redis_store(prefix: &str) -> RedisVerificationStore {
    let config = CacheConfig::new(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    )
    .with_prefix(prefix);

    let client = RedisClient::new(config).await.expect("Failed to connect to Redis");
    RedisVerificationStore::new(client)
}

fn record(partition_key: &str, record_key: &str) -> VerificationRecord {
    VerificationRecord {
        partition_key: partition_key.to_string(),
        record_key: record_key.to_string(),
        code: "4821".to_string(),
        fail_count: 0,
        created_at: 1000,
        expires_at: 1300,
    }
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_redis_connection() {
    let store = redis_store("vc-it-conn").await;
    assert!(store.client().health_check().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_store_contract() {
    let store = redis_store("vc-it-contract").await;
    let record = record("acme.abc", "login-phone.+919999999999");
    let key = record.key();
    store.delete(TABLE, &key).await.unwrap();

    assert!(store.get(TABLE, &key).await.unwrap().is_none());
    assert!(store.put(TABLE, &record).await.unwrap());
    assert_eq!(store.get(TABLE, &key).await.unwrap(), Some(record.clone()));

    let increment = RecordUpdate::increment(fields::FAIL_COUNT, 1);
    assert!(store.update(TABLE, &key, &increment).await.unwrap());
    assert_eq!(store.get(TABLE, &key).await.unwrap().unwrap().fail_count, 1);

    // Reissue resets the fail count
    assert!(store.put(TABLE, &record).await.unwrap());
    assert_eq!(store.get(TABLE, &key).await.unwrap().unwrap().fail_count, 0);

    assert!(store.delete(TABLE, &key).await.unwrap());
    assert!(!store.update(TABLE, &key, &increment).await.unwrap());
    assert!(store.get(TABLE, &key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_colliding_components_stay_separate() {
    let store = redis_store("vc-it-keys").await;
    let first = record("a:b", "c");
    let second = record("a", "b:c");
    store.delete(TABLE, &first.key()).await.unwrap();
    store.delete(TABLE, &second.key()).await.unwrap();

    store.put(TABLE, &first).await.unwrap();
    assert!(store.get(TABLE, &second.key()).await.unwrap().is_none());

    store.delete(TABLE, &first.key()).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_verification_flow_on_redis() {
    let store = Arc::new(redis_store("vc-it-flow").await);
    let key = CompositeKey::derive("acme", "abc", "login-phone", "+919999999999");
    store.delete(TABLE, &key).await.unwrap();

    let service = VerificationService::with_secure_generator(store.clone(), VerificationConfig::default()).unwrap();
    let tasks = BackgroundTasks::new();

    let create = CreateCodeRequest {
        entity_type: "acme".to_string(),
        entity_id: "abc".to_string(),
        service_code: "login-phone".to_string(),
        communication_id: "+919999999999".to_string(),
        code_length: 4,
        cooldown_period: 60,
        code_ttl: 300,
    };
    let outcome = service
        .create_verification_code(&RequestContext::at(1000), &create)
        .await
        .unwrap();
    let code = outcome.code().unwrap().to_string();

    let check = CheckCodeRequest {
        entity_type: "acme".to_string(),
        entity_id: "abc".to_string(),
        service_code: "login-phone".to_string(),
        communication_id: "+919999999999".to_string(),
        verification_code: code,
    };
    let ctx = RequestContext::at(1005).with_tasks(tasks.clone());
    assert!(service.check_verification_code(&ctx, &check).await.unwrap());

    tasks.wait_idle().await;
    assert!(store.get(TABLE, &key).await.unwrap().is_none());
}
