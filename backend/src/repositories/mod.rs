//! User repositories
//!
//! Provides the credential store the session service consumes.

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::{PgUserStore, UserRecord, UserStore};

// Both stores must stay usable as `Arc<dyn UserStore>`.
const _: fn() = || {
    fn assert_user_store<T: UserStore + 'static>() {}
    assert_user_store::<PgUserStore>();
    assert_user_store::<InMemoryUserStore>();
};
