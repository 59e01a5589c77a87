use async_trait::async_trait;

/// Yes/no gate the controller asks before destructive operations.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer, for tests and non-interactive callers that have already
/// asked the user elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirm(pub bool);

#[async_trait]
impl Confirm for StaticConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
