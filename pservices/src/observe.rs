//! Hook contract for observing single collaborator calls.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{ServiceError, ServiceId};

/// Callbacks around one collaborator call; every method defaults to a no-op.
pub trait ServiceOperationHooks: Send + Sync {
    fn on_call_start(&self, _service: ServiceId, _operation: &str) {}

    fn on_call_success(&self, _service: ServiceId, _operation: &str, _elapsed: Duration) {}

    fn on_call_failure(
        &self,
        _service: ServiceId,
        _operation: &str,
        _error: &ServiceError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ServiceOperationHooks for NoopOperationHooks {}

/// Awaits `call` exactly once and reports its outcome through `hooks`.
///
/// Failures are returned unchanged; the dialog layer decides what a failed
/// call means for the conversation.
pub async fn observe_once<T, CallFuture>(
    service: ServiceId,
    operation: &str,
    hooks: &dyn ServiceOperationHooks,
    call: CallFuture,
) -> Result<T, ServiceError>
where
    CallFuture: Future<Output = Result<T, ServiceError>>,
{
    hooks.on_call_start(service, operation);
    let started_at = Instant::now();

    let result = call.await;
    match &result {
        Ok(_) => hooks.on_call_success(service, operation, started_at.elapsed()),
        Err(error) => hooks.on_call_failure(service, operation, error, started_at.elapsed()),
    }
    result
}
