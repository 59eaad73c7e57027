//! Optimistic-concurrency retry loop

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::error::ServiceResult;

/// Lost races retried straight away before backing off
const IMMEDIATE_RETRIES: u32 = 2;
const BASE_BACKOFF: Duration = Duration::from_millis(1);
const MAX_BACKOFF: Duration = Duration::from_millis(50);

/// Run `attempt` until it succeeds, fails with anything other than a lost
/// conditional write, or `max_attempts` is exhausted. Every attempt must
/// re-read the state it decides on.
///
/// A lost race means another writer committed in between, so the loop
/// always makes progress; the bound only has to exceed the number of
/// concurrent writers on the same records.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    operation: &'static str,
    mut attempt: F,
) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if err.is_precondition_failed() && tries < max_attempts => {
                let delay = backoff(tries);
                debug!(operation, attempt = tries, ?delay, error = %err, "Write lost a race, retrying");
                tries += 1;
                match delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => tokio::task::yield_now().await,
                }
            }
            result => return result,
        }
    }
}

/// Pause after the `lost`-th lost race: none for the first few, then a
/// jittered exponential delay capped at `MAX_BACKOFF`
fn backoff(lost: u32) -> Option<Duration> {
    if lost <= IMMEDIATE_RETRIES {
        return None;
    }
    let exponent = (lost - IMMEDIATE_RETRIES - 1).min(6);
    let ceiling = BASE_BACKOFF.saturating_mul(1 << exponent).min(MAX_BACKOFF);
    let micros = u64::try_from(ceiling.as_micros()).unwrap_or(u64::MAX);
    let jittered = rand::thread_rng().gen_range(micros / 2..=micros);
    Some(Duration::from_micros(jittered))
}
