//! 도메인 모델.

mod feature;
mod role;
mod session;

pub use feature::Feature;
pub use role::{Role, RoleClaim};
pub use session::{resolve_session, Identity, Profile, ProfilePatch, Session, SessionUser};
