//! keeper-state — durable registration store for Keeper.
//!
//! Backed by [redb](https://docs.rs/redb). Registrations are JSON-serialized
//! into a single table keyed by service id.
//!
//! The registry only sees the [`RegistrationStore`] trait; [`StateStore`] is
//! the redb implementation. `StateStore` is `Clone` + `Send` + `Sync`
//! (backed by `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod traits;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use traits::RegistrationStore;
pub use types::*;
