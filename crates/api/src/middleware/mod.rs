//! Request middleware and the identity extractors.

pub mod auth;
pub mod guest;

pub use auth::{AuthUser, auth_middleware};
pub use guest::{GUEST_HEADER, GuestId};
