use async_trait::async_trait;

use crate::validation::BoxError;

/// Looks up whether a name or code is still free. Implemented on top of the
/// offer repository's existence checks.
#[async_trait]
pub trait UniqueChecker: Send + Sync {
    async fn is_unique_name(&self, name: &str) -> Result<bool, BoxError>;

    async fn is_unique_code(&self, code: &str) -> Result<bool, BoxError>;
}
