//! Example: issuing and checking verification codes
//!
//! Loads configuration from the environment (and `.env`), builds the
//! configured store and walks through an issue / wrong code / correct code /
//! reuse sequence.
//!
//! Run with: cargo run --example verification_flow -p vc_infra
//! Use the in-memory store with: VERIFY_STORE=memory

use vc_core::services::{
    BackgroundTasks, CheckCodeRequest, CreateCodeRequest, IssueOutcome, RequestContext,
    VerificationService,
};
use vc_infra::cache::create_store;
use vc_infra::config::load_config;
use vc_shared::utils::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config()?;
    init_tracing(&config.logging)?;

    let store = create_store(config.store, &config.cache).await?;
    let service = VerificationService::with_secure_generator(store, config.verification)?;
    let tasks = BackgroundTasks::new();

    let create = CreateCodeRequest {
        entity_type: "user".to_string(),
        entity_id: "demo-user".to_string(),
        service_code: "login-phone".to_string(),
        communication_id: "+919999999999".to_string(),
        code_length: 6,
        cooldown_period: 60,
        code_ttl: 300,
    };

    let ctx = RequestContext::new().with_tasks(tasks.clone());
    let code = match service.create_verification_code(&ctx, &create).await? {
        IssueOutcome::Issued(issued) => {
            println!("Issued code {} (expires at {})", issued.code, issued.expires_at);
            issued.code
        }
        IssueOutcome::CooldownActive => {
            println!("A code was issued less than {}s ago, try again later", create.cooldown_period);
            return Ok(());
        }
    };

    let mut check = CheckCodeRequest {
        entity_type: create.entity_type.clone(),
        entity_id: create.entity_id.clone(),
        service_code: create.service_code.clone(),
        communication_id: create.communication_id.clone(),
        verification_code: "000000".to_string(),
    };

    println!("\nTrying wrong code...");
    let ctx = RequestContext::new().with_tasks(tasks.clone());
    println!("Result: {}", service.check_verification_code(&ctx, &check).await?);

    println!("\nTrying correct code...");
    check.verification_code = code;
    let ctx = RequestContext::new().with_tasks(tasks.clone());
    println!("Result: {}", service.check_verification_code(&ctx, &check).await?);

    // Let the background delete land before reusing the code
    tasks.wait_idle().await;

    println!("\nTrying to reuse code...");
    let ctx = RequestContext::new().with_tasks(tasks.clone());
    println!("Result: {}", service.check_verification_code(&ctx, &check).await?);

    tasks.wait_idle().await;
    Ok(())
}
