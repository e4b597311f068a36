//! The persistence seam the registry is written against.

use crate::error::StateResult;
use crate::types::Registration;

/// Durable storage of registrations keyed by service id.
///
/// Calls are synchronous. Every failure is reported as a [`StateError`]
/// and the caller does not interpret it beyond "the write did not happen".
///
/// [`StateError`]: crate::StateError
pub trait RegistrationStore: Send + Sync {
    /// Insert a new registration. Fails if the id is already stored.
    fn add_registration(&self, registration: &Registration) -> StateResult<()>;

    /// Overwrite an existing registration. Fails if the id is not stored.
    fn update_registration(&self, registration: &Registration) -> StateResult<()>;

    /// Remove a registration. Fails if the id is not stored.
    fn delete_registration(&self, service_id: &str) -> StateResult<()>;

    fn get_registration(&self, service_id: &str) -> StateResult<Option<Registration>>;

    fn list_registrations(&self) -> StateResult<Vec<Registration>>;
}
