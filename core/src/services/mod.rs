//! Business services containing domain logic and use cases.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    BackgroundTasks, CheckCodeRequest, CodeGenerator, CreateCodeRequest, IssueOutcome,
    IssuedCode, RequestContext, SecureCodeGenerator, VerificationService, VerificationStore,
};
