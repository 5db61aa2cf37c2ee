//! Ordered fallback: try each attempt in turn, first success wins

use futures::future::BoxFuture;
use futures::FutureExt;
use intel_core::IntelError;
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};

type Thunk<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T, IntelError>> + Send + 'a>;

/// One labelled step of a fallback chain
///
/// The work is not started until the chain reaches this step.
pub struct Attempt<'a, K, T> {
    pub key: K,
    run: Thunk<'a, T>,
}

impl<'a, K, T> Attempt<'a, K, T> {
    pub fn new<F, Fut>(key: K, run: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, IntelError>> + Send + 'a,
    {
        Self {
            key,
            run: Box::new(move || run().boxed()),
        }
    }
}

/// Run attempts in order and return the first success with its key
///
/// Failures are logged and swallowed. `None` means every attempt failed.
pub async fn first_success<K, T>(component: &str, attempts: Vec<Attempt<'_, K, T>>) -> Option<(K, T)>
where
    K: Display,
{
    for attempt in attempts {
        let start = Instant::now();
        match (attempt.run)().await {
            Ok(value) => {
                info!(
                    "[{}] {} succeeded in {}ms",
                    component,
                    attempt.key,
                    start.elapsed().as_millis()
                );
                return Some((attempt.key, value));
            }
            Err(e) => {
                warn!("[{}] {} failed: {}", component, attempt.key, e);
            }
        }
    }
    None
}
