use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::policy::PollArgs;

#[derive(Debug, Error)]
pub enum PollError {
    /// No non-null value within the time budget.
    #[error("{operation} failed to return non-null after {}ms", .waited.as_millis())]
    Timeout { operation: String, waited: Duration },

    /// The operation panicked while building its future.
    #[error("{operation} could not start: {reason}")]
    Construction { operation: String, reason: String },
}

/// Poll `operation` until it yields `Some(value)`.
///
/// The first attempt runs immediately. `Err(_)` and `Ok(None)` both count as
/// "not yet" and trigger another attempt after the interval. Each attempt gets
/// a clone of `args.pass_on`. When the timeout elapses first the pending attempt
/// is dropped and `PollError::Timeout` is returned.
pub async fn eventually<A, F, Fut, T, E>(
    name: impl Into<String>,
    args: PollArgs<A>,
    mut operation: F,
) -> Result<T, PollError>
where
    A: Clone,
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    let name = name.into();
    let policy = args.policy();
    let pass_on = args.pass_on;

    let attempts = async {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let pending = match panic::catch_unwind(AssertUnwindSafe(|| operation(pass_on.clone()))) {
                Ok(fut) => fut,
                Err(payload) => {
                    return Err(PollError::Construction {
                        operation: name.clone(),
                        reason: panic_message(&*payload),
                    })
                }
            };
            match pending.await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => debug!(operation = %name, attempt, "value still null"),
                Err(e) => debug!(operation = %name, attempt, error = %e, "attempt failed"),
            }
            tokio::time::sleep(policy.interval).await;
        }
    };

    let outcome = tokio::time::timeout(policy.timeout, attempts).await;
    match outcome {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(operation = %name, timeout_ms = policy.timeout.as_millis() as u64, "poll timed out");
            Err(PollError::Timeout {
                operation: name,
                waited: policy.timeout,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// `op.eventually(name, args)` sugar over [`eventually`].
pub trait EventuallyExt<A, Fut, T, E> {
    fn eventually(self, name: &str, args: PollArgs<A>) -> impl Future<Output = Result<T, PollError>>;
}

impl<A, F, Fut, T, E> EventuallyExt<A, Fut, T, E> for F
where
    A: Clone,
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    fn eventually(self, name: &str, args: PollArgs<A>) -> impl Future<Output = Result<T, PollError>> {
        eventually(name.to_string(), args, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    const I: Duration = Duration::from_millis(100);
    const T: Duration = Duration::from_millis(1_000);

    fn args() -> PollArgs<()> {
        PollArgs::new(()).interval(I).timeout(T)
    }

    #[tokio::test(start_paused = true)]
    async fn third_attempt_wins() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();
        let value = eventually("getReceipt", args(), move |()| async move {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err("not mined"),
                1 => Ok(None),
                _ => Ok(Some("receipt")),
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "receipt");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= 2 * I);
    }

    #[tokio::test(start_paused = true)]
    async fn never_succeeding_times_out_within_one_interval() {
        let start = Instant::now();
        let err = eventually("getReceipt", args(), |()| async { Ok::<Option<u8>, String>(None) })
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert!(elapsed >= T);
        assert!(elapsed <= T + I);
        match err {
            PollError::Timeout { operation, waited } => {
                assert_eq!(operation, "getReceipt");
                assert_eq!(waited, T);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_message_names_operation_and_budget() {
        let err = eventually("getBlock", args(), |()| async { Err::<Option<u8>, _>("down") })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "getBlock failed to return non-null after 1000ms");
    }

    #[tokio::test(start_paused = true)]
    async fn pass_on_reaches_every_attempt() {
        let seen = &std::sync::Mutex::new(Vec::new());
        let args = PollArgs::new(("0xabc".to_string(), 2u64)).interval(I).timeout(T);
        let got = eventually("getTransaction", args, move |(hash, confirmations)| async move {
            let mut seen = seen.lock().unwrap();
            seen.push(hash);
            Ok::<_, String>((seen.len() as u64 > confirmations).then_some(seen.len()))
        })
        .await
        .unwrap();
        assert_eq!(got, 3);
        assert_eq!(seen.lock().unwrap().as_slice(), ["0xabc", "0xabc", "0xabc"]);
    }

    #[tokio::test]
    async fn construction_panic_fails_immediately() {
        let err = eventually("missing", PollArgs::new(()), |()| -> std::future::Ready<Result<Option<u8>, String>> {
            panic!("no such operation")
        })
        .await
        .unwrap_err();
        match err {
            PollError::Construction { operation, reason } => {
                assert_eq!(operation, "missing");
                assert_eq!(reason, "no such operation");
            }
            other => panic!("expected construction failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn extension_trait() {
        let op = |n: u32| async move { Ok::<_, String>(Some(n * 2)) };
        assert_eq!(op.eventually("double", PollArgs::new(21)).await.unwrap(), 42);
    }
}
