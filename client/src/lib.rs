//! Authenticated REST client for the job-board backend.
//!
//! Every backend call that needs a session goes through [`AuthClient`]:
//! it attaches the stored bearer token, refreshes it locally when it has
//! expired, and recovers once from a `401` by refreshing and retrying.

pub mod api;
pub mod auth;
pub mod error;
pub mod events;
pub mod storage;
pub mod transport;

pub use api::{AuthClient, AuthMode, CallOptions};
pub use error::ApiError;
pub use events::{LogoutReason, SessionEvent, SessionEvents};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use transport::{HttpRequest, HttpResponse, HyperTransport, Transport, TransportError};
