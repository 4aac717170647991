/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: Bearer token validation (HS256, issuer `boardline`)
/// - [`middleware`]: Axum middleware and the `AuthContext` extractor
/// - [`authorization`]: The policy table every store consults
///
/// Authentication answers "who is calling"; authorization answers "may
/// they do this to that entity". Only the second lives in the board core.

pub mod authorization;
pub mod jwt;
pub mod middleware;
