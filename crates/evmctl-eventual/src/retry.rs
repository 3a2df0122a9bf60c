use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Call `operation` until it succeeds, sleeping `interval` after each failure.
///
/// Never gives up; bound it with `tokio::time::timeout` or use `eventually`.
pub async fn retry<F, Fut, T, E>(interval: Duration, mut operation: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return value,
            Err(e) => debug!(attempt, error = %e, "attempt failed; retrying"),
        }
        tokio::time::sleep(interval).await;
    }
}
