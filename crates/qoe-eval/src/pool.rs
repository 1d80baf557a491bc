//! Bounded blocking-job runner
//!
//! Codec and scorer calls block (child processes, CPU-bound signal work),
//! so each job runs on tokio's blocking pool. A semaphore caps how many run
//! at once; the driver is the only writer of the collected results.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::{ErrorPolicy, EvalError, EvalResult};

/// One unit of blocking work with a label for logs and errors
pub struct Job<T> {
    pub label: String,
    pub run: Box<dyn FnOnce() -> EvalResult<T> + Send + 'static>,
}

impl<T> Job<T> {
    pub fn new(label: String, run: impl FnOnce() -> EvalResult<T> + Send + 'static) -> Self {
        Job {
            label,
            run: Box::new(run),
        }
    }
}

/// Run every job with at most `workers` in flight.
///
/// Results come back in job order. Under `Abort` the first failure cancels
/// jobs still waiting for a slot and is returned; under `Skip` it is logged
/// and the job produces nothing.
pub async fn run_bounded<T>(
    jobs: Vec<Job<T>>,
    workers: usize,
    policy: ErrorPolicy,
) -> EvalResult<Vec<T>>
where
    T: Send + 'static,
{
    let total = jobs.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => match tokio::task::spawn_blocking(job.run).await {
                    Ok(result) => result,
                    Err(e) => Err(EvalError::Worker(e.to_string())),
                },
                Err(e) => Err(EvalError::Worker(e.to_string())),
            };
            (index, job.label, outcome)
        });
    }

    let mut collected = Vec::with_capacity(total);
    let mut finished = 0usize;
    let mut skipped = 0usize;
    let step = (total / 10).max(1);

    while let Some(joined) = set.join_next().await {
        let (index, label, outcome) = joined.map_err(|e| EvalError::Worker(e.to_string()))?;
        finished += 1;

        match outcome {
            Ok(value) => collected.push((index, value)),
            Err(err) => match policy {
                ErrorPolicy::Abort => {
                    set.abort_all();
                    return Err(EvalError::Job {
                        job: label,
                        source: Box::new(err),
                    });
                }
                ErrorPolicy::Skip => {
                    skipped += 1;
                    warn!(job = %label, error = %err, "Skipping failed sample");
                }
            },
        }

        if finished % step == 0 || finished == total {
            info!(finished, total, skipped, "Progress");
        }
    }

    collected.sort_by_key(|(index, _)| *index);
    Ok(collected.into_iter().map(|(_, value)| value).collect())
}
