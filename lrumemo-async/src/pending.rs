//! In-flight computations shared by concurrent callers.
//!
//! A computation is a lazily-started [`Shared`] future. The table keeps only a
//! weak handle to it; every caller interested in the result holds a strong
//! one through a [`Waiter`]. The wrapped future is driven by whichever waiter
//! polls it, so it outlives the cancellation of any single caller and is
//! dropped only together with the last waiter.

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) type CallFuture<V, E> = BoxFuture<'static, Result<V, E>>;
pub(crate) type SharedCall<V, E> = Shared<CallFuture<V, E>>;

struct PendingCall<V, E> {
    id: u64,
    future: WeakShared<CallFuture<V, E>>,
}

/// A caller's handle on a registered computation.
pub(crate) struct Registration<V, E> {
    pub future: SharedCall<V, E>,
    pub id: u64,
}

/// Result of [`PendingCalls::abandon`].
pub(crate) enum Abandoned<V, E> {
    /// Nobody waits on the computation any more; its entry is gone.
    Removed,
    /// Another waiter still holds the computation. The handle must be
    /// dropped after the owner's lock is released.
    Live(SharedCall<V, E>),
    /// The entry is gone or belongs to a newer registration.
    Stale,
}

/// Key → in-flight computation table.
///
/// Not synchronized by itself: the owner keeps it behind the same lock as the
/// rest of its state so that lookups, registrations and removals are atomic
/// with respect to the owner's other bookkeeping.
pub(crate) struct PendingCalls<K, V, E> {
    calls: HashMap<K, PendingCall<V, E>>,
    next_id: u64,
}

impl<K, V, E> PendingCalls<K, V, E>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: HashMap::new(),
            next_id: 0,
        }
    }

    /// Joins the computation in flight for `key`, if any waiter still holds
    /// it.
    pub fn join(&self, key: &K) -> Option<Registration<V, E>> {
        let pending = self.calls.get(key)?;
        let future = pending.future.upgrade()?;
        Some(Registration {
            future,
            id: pending.id,
        })
    }

    /// Registers `future` as the computation for `key`.
    ///
    /// Call only after [`join`](Self::join) found nothing. An entry whose
    /// waiters are all gone is replaced; its last waiter's
    /// [`abandon`](Self::abandon) then finds a newer id and leaves the
    /// replacement alone.
    pub fn register(&mut self, key: &K, future: CallFuture<V, E>) -> Registration<V, E> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let future = future.shared();
        // A fresh `Shared` has never completed, so downgrading succeeds.
        if let Some(weak) = future.downgrade() {
            self.calls.insert(key.clone(), PendingCall { id, future: weak });
        }
        Registration { future, id }
    }

    /// Removes the entry for `key` if it still belongs to registration `id`.
    pub fn finish(&mut self, key: &K, id: u64) -> bool {
        match self.calls.get(key) {
            Some(pending) if pending.id == id => {
                self.calls.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Removes the entry for `key` if it belongs to registration `id` and no
    /// waiter holds on to it any more.
    pub fn abandon(&mut self, key: &K, id: u64) -> Abandoned<V, E> {
        let live = match self.calls.get(key) {
            Some(pending) if pending.id == id => pending.future.upgrade(),
            _ => return Abandoned::Stale,
        };
        match live {
            Some(future) => Abandoned::Live(future),
            None => {
                self.calls.remove(key);
                Abandoned::Removed
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.calls.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }
}

/// Bookkeeping hooks run by a [`Waiter`].
///
/// Implementations lock their own state. Values of `V` and the computation
/// itself must not be cloned or dropped while that lock is held, since user
/// `Clone` and `Drop` impls may call back into the owner.
pub(crate) trait PendingOwner<K, V, E> {
    /// The computation registered as `id` produced `outcome`.
    fn settle(&self, key: &K, id: u64, outcome: &Result<V, E>);

    /// A waiter for registration `id` went away before the computation
    /// finished.
    fn abandon(&self, key: &K, id: u64);
}

struct Interest<V, E> {
    driver: SharedCall<V, E>,
    // Never polled. Keeps the registration upgradable until the completing
    // waiter has settled it, so late joiners see the finished result instead
    // of starting a second computation.
    _anchor: SharedCall<V, E>,
}

/// One caller's interest in a shared computation.
///
/// Resolves to the computation's outcome. Completion is reported to the owner
/// through [`PendingOwner::settle`]; dropping the waiter early releases its
/// handle and reports through [`PendingOwner::abandon`].
pub(crate) struct Waiter<'a, O, K, V, E>
where
    O: PendingOwner<K, V, E> + ?Sized,
{
    owner: &'a O,
    key: K,
    id: u64,
    interest: Option<Interest<V, E>>,
}

impl<'a, O, K, V, E> Waiter<'a, O, K, V, E>
where
    O: PendingOwner<K, V, E> + ?Sized,
{
    pub fn new(owner: &'a O, key: K, registration: Registration<V, E>) -> Self {
        let anchor = registration.future.clone();
        Self {
            owner,
            key,
            id: registration.id,
            interest: Some(Interest {
                driver: registration.future,
                _anchor: anchor,
            }),
        }
    }
}

impl<'a, O, K, V, E> Future for Waiter<'a, O, K, V, E>
where
    O: PendingOwner<K, V, E> + ?Sized,
    K: Unpin,
    V: Clone,
    E: Clone,
{
    type Output = Result<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let interest = match this.interest.as_mut() {
            Some(interest) => interest,
            None => panic!("`Waiter` polled after completion"),
        };

        let outcome = match Pin::new(&mut interest.driver).poll(cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => return Poll::Pending,
        };

        this.owner.settle(&this.key, this.id, &outcome);
        this.interest = None;
        Poll::Ready(outcome)
    }
}

impl<'a, O, K, V, E> Drop for Waiter<'a, O, K, V, E>
where
    O: PendingOwner<K, V, E> + ?Sized,
{
    fn drop(&mut self) {
        if let Some(interest) = self.interest.take() {
            // Release our handles before asking whether anyone is left.
            drop(interest);
            self.owner.abandon(&self.key, self.id);
        }
    }
}
