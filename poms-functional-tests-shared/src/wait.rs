//! Polling until backend state matches expectations.
//!
//! Most of what POMS does after an update is accepted happens
//! asynchronously: the update is queued, persisted, published and indexed
//! some time after the API answered `202 Accepted`. Tests therefore call a
//! supplier repeatedly until a set of [`Check`]s accepts its result, or give
//! up once the acceptable duration has elapsed.
//!
//! Before every attempt a thread-local "clear caches" hook runs, so a test
//! can drop whatever client-side state would otherwise hide a change on the
//! backend. See [`set_clear_caches`].

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

/// Time between two attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

/// Time before the first attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

const STRIKE: char = '\u{0336}';

thread_local! {
    static CLEAR_CACHES: RefCell<Rc<dyn Fn()>> = RefCell::new(Rc::new(|| {}));
}

/// Installs the hook that runs before every poll attempt on this thread.
///
/// The previous hook is restored when the returned guard is dropped.
pub fn set_clear_caches(hook: impl Fn() + 'static) -> ClearCachesGuard {
    let previous = CLEAR_CACHES.with(|current| current.replace(Rc::new(hook)));
    ClearCachesGuard {
        previous: Some(previous),
    }
}

/// Runs the clear caches hook of the current thread.
pub fn clear_caches() {
    // cloned first so the hook may itself install another hook
    let hook = CLEAR_CACHES.with(|current| current.borrow().clone());
    hook();
}

/// Restores the previously installed clear caches hook on drop.
#[must_use = "the hook is uninstalled when the guard is dropped"]
pub struct ClearCachesGuard {
    previous: Option<Rc<dyn Fn()>>,
}

impl Drop for ClearCachesGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CLEAR_CACHES.with(|current| {
                current.replace(previous);
            });
        }
    }
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Describer<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// A named predicate over a polled value.
pub struct Check<T> {
    description: String,
    predicate: Predicate<T>,
    failure_description: Option<Describer<T>>,
}

impl<T> Check<T> {
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Box::new(predicate),
            failure_description: None,
        }
    }

    /// A check that holds for any value, so polling stops as soon as the
    /// supplier produces something.
    pub fn not_none(description: impl Into<String>) -> Self {
        Self::new(description, |_| true)
    }

    /// Replaces the message used when the check still fails at timeout.
    pub fn with_failure_description(
        mut self,
        describer: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        self.failure_description = Some(Box::new(describer));
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn test(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T: Debug> Check<T> {
    pub fn failure_description(&self, value: &T) -> String {
        match &self.failure_description {
            Some(describer) => describer(value),
            None => format!("{}: {:?} doesn't match", self.description, value),
        }
    }
}

impl<T> Debug for Check<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("description", &self.description)
            .finish()
    }
}

/// The acceptable duration elapsed before all checks held.
#[derive(Debug, Error)]
#[error("({description}) didn't evaluate to true after {elapsed:?} in less than {acceptable:?}: {summary}")]
pub struct WaitError {
    /// Check descriptions joined by `AND`, the ones that held struck through.
    pub description: String,
    pub elapsed: Duration,
    pub acceptable: Duration,
    /// `Debug` rendering of the last value the supplier produced.
    pub last_value: Option<String>,
    /// Failure descriptions of the checks that did not hold on the last value.
    pub failures: Vec<String>,
    pub last_error: Option<String>,
    summary: String,
}

impl WaitError {
    fn new<T: Debug>(
        description: String,
        elapsed: Duration,
        acceptable: Duration,
        last_value: Option<&T>,
        checks: &[Check<T>],
        last_error: Option<String>,
    ) -> Self {
        let failures: Vec<String> = match last_value {
            Some(value) => checks
                .iter()
                .filter(|check| !check.test(value))
                .map(|check| check.failure_description(value))
                .collect(),
            None => Vec::new(),
        };
        let summary = match (last_value, &last_error) {
            (Some(_), _) => failures.join(" AND "),
            (None, Some(error)) => format!("supplied nothing (last error: {})", error),
            (None, None) => "supplied nothing".to_string(),
        };
        Self {
            description,
            elapsed,
            acceptable,
            last_value: last_value.map(|value| format!("{:?}", value)),
            failures,
            last_error,
            summary,
        }
    }
}

/// Polling schedule: how long to keep trying and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    pub acceptable: Duration,
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl Waiter {
    pub fn new(acceptable: Duration) -> Self {
        Self {
            acceptable,
            interval: DEFAULT_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Calls `supplier` until all `checks` hold for its result.
    ///
    /// `Ok(None)` from the supplier means "nothing yet" and errors are
    /// logged and treated the same way. The attempt during which the
    /// acceptable duration is exceeded is the last one.
    pub async fn until<T, F, Fut>(&self, mut supplier: F, checks: &[Check<T>]) -> Result<T, WaitError>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        let mut description = describe(checks, None);
        info!("Waiting until {}", description);
        clear_caches();
        let start = Instant::now();
        tokio::time::sleep(self.initial_delay).await;

        let mut last_value: Option<T> = None;
        let mut last_error: Option<String> = None;
        loop {
            clear_caches();
            match supplier().await {
                Ok(Some(value)) => {
                    let outcomes: Vec<bool> = checks.iter().map(|check| check.test(&value)).collect();
                    description = describe(checks, Some(&outcomes));
                    if outcomes.iter().all(|holds| *holds) {
                        info!("({}) evaluated true", description);
                        return Ok(value);
                    }
                    last_value = Some(value);
                }
                Ok(None) => {
                    last_value = None;
                }
                Err(e) => {
                    warn!("{:#}", e);
                    last_error = Some(format!("{:#}", e));
                }
            }

            let elapsed = start.elapsed();
            if elapsed > self.acceptable {
                return Err(WaitError::new(
                    description,
                    elapsed,
                    self.acceptable,
                    last_value.as_ref(),
                    checks,
                    last_error,
                ));
            }
            info!(
                "({}) didn't evaluate to true yet after {:?} (< {:?}). Waiting another {:?}",
                description, elapsed, self.acceptable, self.interval
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Calls `supplier` until `predicate` holds for its result.
    pub async fn until_matches<T, F, Fut>(
        &self,
        description: &str,
        supplier: F,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<T, WaitError>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        self.until(supplier, &[Check::new(description, predicate)])
            .await
    }

    /// Calls `supplier` until it produces a value.
    pub async fn until_some<T, F, Fut>(&self, description: &str, supplier: F) -> Result<T, WaitError>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        self.until(supplier, &[Check::not_none(format!("{} is present", description))])
            .await
    }

    /// Calls `condition` until it returns `true`.
    pub async fn until_true<F, Fut>(&self, description: &str, mut condition: F) -> Result<(), WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let owned = description.to_string();
        let check = Check::new(description, |holds: &bool| *holds)
            .with_failure_description(move |_| format!("{} is still false", owned));
        self.until(
            || {
                let next = condition();
                async move { next.await.map(Some) }
            },
            &[check],
        )
        .await
        .map(|_| ())
    }
}

/// [`Waiter::until`] with the default interval and initial delay.
pub async fn wait_until<T, F, Fut>(
    acceptable: Duration,
    supplier: F,
    checks: &[Check<T>],
) -> Result<T, WaitError>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    Waiter::new(acceptable).until(supplier, checks).await
}

/// [`Waiter::until_some`] with the default interval and initial delay.
pub async fn wait_until_some<T, F, Fut>(
    acceptable: Duration,
    description: &str,
    supplier: F,
) -> Result<T, WaitError>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    Waiter::new(acceptable).until_some(description, supplier).await
}

/// [`Waiter::until_true`] with the default interval and initial delay.
pub async fn wait_until_true<F, Fut>(
    acceptable: Duration,
    description: &str,
    condition: F,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    Waiter::new(acceptable).until_true(description, condition).await
}

/// Overlays every character with a combining long stroke.
pub fn strike_through(text: &str) -> String {
    text.chars().flat_map(|c| [c, STRIKE]).collect()
}

fn describe<T>(checks: &[Check<T>], outcomes: Option<&[bool]>) -> String {
    checks
        .iter()
        .enumerate()
        .map(|(i, check)| match outcomes {
            Some(outcomes) if outcomes[i] => strike_through(&check.description),
            _ => check.description.clone(),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_matching_value() {
        let attempts = AtomicUsize::new(0);
        let waiter = Waiter::new(Duration::from_secs(300));

        let value = waiter
            .until(
                || {
                    let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { Ok(Some(n)) }
                },
                &[Check::new("at least 3", |n: &usize| *n >= 3)],
            )
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_initial_delay_and_interval() {
        let start = Instant::now();
        let attempts = AtomicUsize::new(0);

        Waiter::new(Duration::from_secs(300))
            .until_true("third attempt", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n == 3) }
            })
            .await
            .unwrap();

        // 1s initial delay and two 15s intervals
        assert_eq!(start.elapsed(), Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_keeps_polling() {
        let attempts = AtomicUsize::new(0);

        let value = wait_until_some(Duration::from_secs(120), "the clip", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n < 2 { None } else { Some("POMS_VPRO_1") }) }
        })
        .await
        .unwrap();

        assert_eq!(value, "POMS_VPRO_1");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_transient() {
        let attempts = AtomicUsize::new(0);

        let value = wait_until(
            Duration::from_secs(120),
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        anyhow::bail!("connection reset")
                    }
                    Ok(Some(n))
                }
            },
            &[Check::not_none("anything")],
        )
        .await
        .unwrap();

        assert_eq!(value, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_acceptable_duration() {
        let attempts = AtomicUsize::new(0);
        let start = Instant::now();

        let err = Waiter::new(Duration::from_secs(60))
            .until(
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Some(4)) }
                },
                &[
                    Check::new("even", |n: &i32| n % 2 == 0),
                    Check::new("negative", |n: &i32| *n < 0),
                ],
            )
            .await
            .unwrap_err();

        // attempts at 1, 16, 31, 46 and 61 seconds
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(61));
        assert_eq!(err.elapsed, Duration::from_secs(61));
        assert_eq!(err.acceptable, Duration::from_secs(60));
        assert_eq!(err.last_value.as_deref(), Some("4"));
        assert_eq!(err.failures, vec!["negative: 4 doesn't match".to_string()]);
        assert_eq!(
            err.description,
            format!("{} AND negative", strike_through("even"))
        );
        assert!(err.to_string().contains("didn't evaluate to true after"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_value_reports_last_error() {
        let err = Waiter::new(Duration::from_secs(20))
            .until_some("the image", || async {
                Err::<Option<u32>, _>(anyhow::anyhow!("503 Service Unavailable"))
            })
            .await
            .unwrap_err();

        assert!(err.last_value.is_none());
        assert!(err.failures.is_empty());
        assert_eq!(err.last_error.as_deref(), Some("503 Service Unavailable"));
        assert!(err.to_string().contains("supplied nothing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_failure_description() {
        let err = Waiter::new(Duration::from_secs(10))
            .with_interval(Duration::from_secs(5))
            .until(
                || async { Ok(Some(vec!["a".to_string()])) },
                &[Check::new("no images", |images: &Vec<String>| images.is_empty())
                    .with_failure_description(|images| format!("{} images remaining", images.len()))],
            )
            .await
            .unwrap_err();

        assert_eq!(err.failures, vec!["1 images remaining".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_caches_runs_before_every_attempt() {
        let cleared = Rc::new(Cell::new(0));
        let counter = cleared.clone();
        let _guard = set_clear_caches(move || counter.set(counter.get() + 1));
        let attempts = AtomicUsize::new(0);

        Waiter::new(Duration::from_secs(100))
            .with_initial_delay(Duration::ZERO)
            .until_true("second attempt", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n == 2) }
            })
            .await
            .unwrap();

        // once up front, once per attempt
        assert_eq!(cleared.get(), 3);
    }

    #[test]
    fn test_clear_caches_guard_restores_previous_hook() {
        let calls = Rc::new(Cell::new((0, 0)));
        let outer_calls = calls.clone();
        let _outer = set_clear_caches(move || {
            let (outer, inner) = outer_calls.get();
            outer_calls.set((outer + 1, inner));
        });
        {
            let inner_calls = calls.clone();
            let _inner = set_clear_caches(move || {
                let (outer, inner) = inner_calls.get();
                inner_calls.set((outer, inner + 1));
            });
            clear_caches();
        }
        clear_caches();

        assert_eq!(calls.get(), (1, 1));
    }

    #[test]
    fn test_strike_through() {
        assert_eq!(strike_through("ab"), "a\u{0336}b\u{0336}");
        assert_eq!(strike_through(""), "");
    }
}
