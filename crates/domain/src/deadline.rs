//! Per-call deadline for store operations.

use std::future::Future;
use std::time::Duration;

use crate::auth::Operation;
use crate::error::DomainError;

/// Bounds every store call a service makes.
///
/// When the deadline elapses the in-flight future is dropped, which rolls
/// back any transaction it holds, and the operation fails with `Cancelled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreDeadline {
    timeout: Option<Duration>,
}

impl StoreDeadline {
    /// No deadline.
    pub fn none() -> Self {
        Self { timeout: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Runs `fut`, returning its own result or `Cancelled` if it overran.
    pub async fn run<T, F>(&self, operation: Operation, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = T>,
    {
        let Some(timeout) = self.timeout else {
            return Ok(fut.await);
        };

        match tokio::time::timeout(timeout, fut).await {
            Ok(output) => Ok(output),
            Err(_) => {
                tracing::error!(%operation, ?timeout, "store call exceeded its deadline");
                metrics::counter!("operations_rejected_total", "kind" => "cancelled").increment(1);
                Err(DomainError::Cancelled { operation, timeout })
            }
        }
    }
}
