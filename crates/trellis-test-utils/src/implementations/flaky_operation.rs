//! Scripted operation for exercising retry paths.

use std::sync::atomic::{AtomicU32, Ordering};
use trellis_core::CoreError;

/// Fails a fixed number of times, then succeeds.
///
/// Each failure is `OperationError("attempt <n> failed")`; success returns
/// the attempt number.
#[derive(Debug)]
pub struct FlakyOperation {
    failures: u32,
    calls: AtomicU32,
}

impl FlakyOperation {
    /// Fail the first `failures` calls
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    /// Never succeed
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    /// Make one attempt
    pub async fn call(&self) -> Result<u32, CoreError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(Self::error_for(attempt))
        } else {
            Ok(attempt)
        }
    }

    /// Attempts made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The error returned by failed attempt `attempt`
    pub fn error_for(attempt: u32) -> CoreError {
        CoreError::OperationError(format!("attempt {} failed", attempt))
    }
}
