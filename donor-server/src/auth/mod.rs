//! Authentication
//!
//! Identity is issued elsewhere; this module only validates bearer tokens:
//! - [`JwtService`] - token validation (and issuance for tooling/tests)
//! - [`CurrentUser`] - authenticated caller, extracted per request

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
