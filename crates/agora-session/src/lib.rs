//! Session state, wizard navigation, and dispatch services.
//!
//! This crate is the core of the console: a single durable session slot
//! ([`SessionStore`]), the step machine that gates configuration progress
//! ([`WizardStep`]), and the services that move actions to the backend and
//! stream frames back into the session.
//!
//! All mutation flows through [`SessionStore::read`] and
//! [`SessionStore::write`]. The store deliberately offers no partial-update
//! primitive; callers read, merge, and write back the whole object. Two
//! concurrent merges lose the first writer's fields. That is the documented
//! last-write-wins behavior of a single-operator console, not a bug to fix
//! here.

pub mod errors;
pub mod services;
pub mod store;
pub mod wizard;

pub use errors::SessionError;
pub use errors::ValidationError;
pub use services::dispatch::Action;
pub use services::dispatch::DispatchService;
pub use services::stream::StreamService;
pub use store::SessionScope;
pub use store::SessionStore;
pub use wizard::WizardStep;
