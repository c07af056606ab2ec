//! Auth glue: the external auth layer issues tokens; this module only
//! verifies them and injects the verified subject into requests.

pub mod middleware;
pub mod service;

pub use middleware::jwt_auth_middleware;
pub use service::{AuthVerifier, AuthenticatedAccount, Claims};
