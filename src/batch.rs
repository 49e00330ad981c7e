use std::future::Future;

use crate::error::ApiResult;

/// Per-item result of [`process_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub item: T,
    pub success: bool,
    /// Display message of the failure.
    pub error: Option<String>,
}

impl<T> BatchOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Runs `op` once per item, one at a time, and records how each went.
/// A failure does not stop the batch.
pub async fn process_batch<T, R, F, Fut>(items: Vec<T>, mut op: F) -> Vec<BatchOutcome<T>>
where
    T: Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ApiResult<R>>,
{
    let mut outcomes = Vec::with_capacity(items.len());
    for item in items {
        let outcome = match op(item.clone()).await {
            Ok(_) => BatchOutcome {
                item,
                success: true,
                error: None,
            },
            Err(e) => {
                if e.kind().is_transport() {
                    log_error!("Batch item could not reach the backend: {}", e);
                } else {
                    log_warn!("Batch item rejected: {}", e);
                }
                BatchOutcome {
                    item,
                    success: false,
                    error: Some(e.display_message().to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Counts of a finished batch: (succeeded, failed).
pub fn tally<T>(outcomes: &[BatchOutcome<T>]) -> (usize, usize) {
    let ok = outcomes.iter().filter(|o| o.success).count();
    (ok, outcomes.len() - ok)
}
