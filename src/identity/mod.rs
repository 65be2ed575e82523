//! Bearer credentials and the per-request authorization gate.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod claims;
mod request_context;
mod token;

pub use authorizer::{parse_bearer, require_bearer, AuthRequirement, BearerError, Gate};
pub use claims::{Claims, SUBJECT_CLAIM};
pub use request_context::{Authenticated, RequestContext};
pub use token::{SigningSecret, TokenError, TokenIssuer, TOKEN_LIFETIME_SECS};
