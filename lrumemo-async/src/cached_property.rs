use crate::pending::{Abandoned, PendingCalls, PendingOwner, Waiter};
use futures::future::FutureExt;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

struct PropertyState<T, E> {
    value: Option<Arc<T>>,
    pending: PendingCalls<(), T, E>,
}

/// A lazily computed async value, owned by the struct it belongs to.
///
/// The first caller runs the initializer; callers arriving while it runs
/// await the same computation. A successful result is kept until
/// [`reset`](Self::reset); a failure is handed to every waiting caller and
/// the next call tries again.
///
/// The value is cloned and dropped only after the internal lock is released,
/// so its `Clone` and `Drop` impls may read the property.
///
/// # Examples
///
/// ```
/// use lrumemo_async::CachedProperty;
///
/// struct Account {
///     id: u64,
///     balance: CachedProperty<u64>,
/// }
///
/// impl Account {
///     async fn balance(&self) -> u64 {
///         let id = self.id;
///         self.balance.get_or_init(move || async move { id * 10 }).await
///     }
/// }
///
/// # futures::executor::block_on(async {
/// let account = Account { id: 7, balance: CachedProperty::new() };
/// assert_eq!(account.balance().await, 70);
/// assert_eq!(account.balance.get(), Some(70));
/// # });
/// ```
pub struct CachedProperty<T, E = Infallible> {
    state: Mutex<PropertyState<T, E>>,
}

impl<T, E> CachedProperty<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PropertyState {
                value: None,
                pending: PendingCalls::new(),
            }),
        }
    }

    /// Returns the value, running `init` if nothing is stored and no
    /// initialization is in flight.
    ///
    /// `init` is dropped without being called when another caller's
    /// initialization is joined instead.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let registration = {
            let mut state = self.state.lock();
            if let Some(value) = state.value.clone() {
                drop(state);
                return Ok(T::clone(&value));
            }
            match state.pending.join(&()) {
                Some(registration) => registration,
                None => {
                    trace!("initializing cached property");
                    state
                        .pending
                        .register(&(), async move { init().await }.boxed())
                }
            }
        };

        Waiter::new(self, (), registration).await
    }

    /// The stored value, if initialized.
    pub fn get(&self) -> Option<T> {
        let value = self.state.lock().value.clone()?;
        Some(T::clone(&value))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().value.is_some()
    }

    /// Whether an initialization is currently running.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.contains_key(&())
    }

    /// Forgets the stored value so the next access initializes again.
    ///
    /// An initialization already in flight is not interrupted and stores its
    /// result when it completes.
    pub fn reset(&self) -> Option<T> {
        let value = self.state.lock().value.take()?;
        Some(unwrap_or_clone(value))
    }

    /// Takes the stored value out through exclusive access.
    pub fn take(&mut self) -> Option<T> {
        self.state.get_mut().value.take().map(unwrap_or_clone)
    }
}

impl<T> CachedProperty<T, Infallible>
where
    T: Clone + Send + Sync + 'static,
{
    /// Returns the value, running `init` on first access.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> T
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        match self
            .get_or_try_init(move || init().map(Ok::<T, Infallible>))
            .await
        {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<T, E> PendingOwner<(), T, E> for CachedProperty<T, E>
where
    T: Clone,
    E: Clone,
{
    fn settle(&self, key: &(), id: u64, outcome: &Result<T, E>) {
        let fresh = outcome.as_ref().ok().map(|value| Arc::new(value.clone()));
        let mut state = self.state.lock();
        if !state.pending.finish(key, id) {
            return;
        }
        if state.value.is_none() {
            state.value = fresh;
        }
    }

    fn abandon(&self, key: &(), id: u64) {
        let abandoned = self.state.lock().pending.abandon(key, id);
        if let Abandoned::Removed = abandoned {
            trace!("cached property initialization dropped");
        }
    }
}

fn unwrap_or_clone<T: Clone>(value: Arc<T>) -> T {
    Arc::try_unwrap(value).unwrap_or_else(|shared| T::clone(&shared))
}

impl<T, E> Default for CachedProperty<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug, E: Clone> fmt::Debug for CachedProperty<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, pending) = {
            let state = self.state.lock();
            (state.value.clone(), state.pending.len())
        };
        f.debug_struct("CachedProperty")
            .field("value", &value)
            .field("pending", &pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_initializes_once() {
        let property: CachedProperty<String> = CachedProperty::new();
        let runs = Arc::new(AtomicUsize::new(0));

        block_on(async {
            for _ in 0..3 {
                let runs = Arc::clone(&runs);
                let value = property
                    .get_or_init(move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        "ready".to_string()
                    })
                    .await;
                assert_eq!(value, "ready");
            }
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(property.is_initialized());
    }

    #[test]
    fn test_failure_is_not_stored() {
        let property: CachedProperty<u32, String> = CachedProperty::new();

        block_on(async {
            let first = property
                .get_or_try_init(|| async { Err("offline".to_string()) })
                .await;
            assert_eq!(first, Err("offline".to_string()));
            assert_eq!(property.get(), None);

            let second = property.get_or_try_init(|| async { Ok(5) }).await;
            assert_eq!(second, Ok(5));
        });

        assert_eq!(property.get(), Some(5));
    }

    #[test]
    fn test_reset_and_take() {
        let mut property: CachedProperty<u32> = CachedProperty::new();

        block_on(async {
            property.get_or_init(|| async { 1 }).await;
            assert_eq!(property.reset(), Some(1));
            assert_eq!(property.get_or_init(|| async { 2 }).await, 2);
        });

        assert_eq!(property.take(), Some(2));
        assert!(!property.is_initialized());
        assert!(!property.is_pending());
    }
}
