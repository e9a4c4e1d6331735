//! Authentication and authorization module

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;

pub use guard::{AuthenticationGuard, AuthorizationGuard, Decision, Guard, GuardChain, Principal, Verdict};
pub use jwt::{ClaimSet, Claims, TokenCodec, TokenError};
pub use middleware::{extract_token, guard_middleware, Gatekeeper};
pub use password::{PasswordHasher, WorkFactor};
pub use policy::{PolicyRouter, RoutePolicy, RoutePolicyTable};
