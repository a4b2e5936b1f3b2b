//! Identity collaborators for the download gateway.
//! The gateway only needs the current user and the role names that test positive;
//! both come from values passed in by the host, never from process-wide state.

mod principal;
mod provider;
mod request_context;
mod roles;

pub use principal::Principal;
pub use provider::{AuthProvider, HeaderAuth};
pub use request_context::RequestContext;
pub use roles::{RolePredicate, RoleRegistry};
