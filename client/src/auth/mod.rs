//! Session token lifecycle: decoding, local validity checks, persistence
//! and refresh.

pub mod codec;
pub mod expiry;
pub mod refresh;
pub mod role;
pub mod store;

pub use self::codec::decode_claims;
pub use self::expiry::{is_expired, is_expired_at, now_secs};
pub use self::refresh::RefreshFlow;
pub use self::role::{role_of, validate_role};
pub use self::store::TokenStore;
