//! End-to-end tests through the `lrumemo` facade: a small user service built on
//! `#[lru_cache]` and `CachedProperty`

use lrumemo::{lru_cache, CacheError, CachedProperty};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static DB_QUERIES: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug, PartialEq)]
struct User {
    id: u64,
    email: String,
}

#[derive(Clone, Debug, PartialEq)]
enum DbError {
    Missing(u64),
}

#[lru_cache(max_size = 2, name = "users")]
async fn find_user(id: u64) -> Result<User, DbError> {
    DB_QUERIES.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    if id >= 100 {
        return Err(DbError::Missing(id));
    }
    Ok(User {
        id,
        email: format!("user{}@example.com", id),
    })
}

fn reset() {
    find_user_cache().cache_clear();
    DB_QUERIES.store(0, Ordering::SeqCst);
}

#[tokio::test]
#[serial]
async fn test_burst_of_lookups_hits_database_once() {
    reset();

    let (a, b, c) = tokio::join!(find_user(1), find_user(1), find_user(1));
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.unwrap().email, "user1@example.com");

    assert_eq!(DB_QUERIES.load(Ordering::SeqCst), 1);
    assert_eq!(find_user_cache().cache_info().misses, 3);
}

#[tokio::test]
#[serial]
async fn test_working_set_larger_than_cache() {
    reset();

    for id in [1, 2, 1, 3, 1, 2] {
        find_user(id).await.unwrap();
    }

    // 1 stays hot; 2 is evicted by 3 and fetched again
    assert_eq!(DB_QUERIES.load(Ordering::SeqCst), 4);
    let info = find_user_cache().cache_info();
    assert_eq!((info.hits, info.misses, info.current_size), (2, 4, 2));
    assert_eq!(info.max_size, Some(2));
}

#[tokio::test]
#[serial]
async fn test_missing_users_are_retried() {
    reset();

    for _ in 0..2 {
        assert_eq!(
            find_user(404).await,
            Err(CacheError::Computation(DbError::Missing(404)))
        );
    }
    assert_eq!(DB_QUERIES.load(Ordering::SeqCst), 2);
    assert_eq!(find_user_cache().cache_info().current_size, 0);
}

struct Session {
    user_id: u64,
    user: CachedProperty<User, CacheError<DbError>>,
}

impl Session {
    fn new(user_id: u64) -> Self {
        Self {
            user_id,
            user: CachedProperty::new(),
        }
    }

    async fn user(&self) -> Result<User, CacheError<DbError>> {
        let id = self.user_id;
        self.user.get_or_try_init(move || find_user(id)).await
    }
}

#[tokio::test]
#[serial]
async fn test_session_property_resolves_once() {
    reset();

    let session = Session::new(9);
    let (first, second) = tokio::join!(session.user(), session.user());
    assert_eq!(first, second);
    assert_eq!(session.user.get().map(|user| user.id), Some(9));

    // A second session shares the function cache but has its own property
    let other = Session::new(9);
    other.user().await.unwrap();

    assert_eq!(DB_QUERIES.load(Ordering::SeqCst), 1);
    let info = find_user_cache().cache_info();
    assert_eq!((info.hits, info.misses), (1, 1));
}
