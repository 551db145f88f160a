/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access and refresh tokens
/// - [`middleware`]: bearer token to [`middleware::CurrentUser`] resolution
/// - [`authorization`]: team membership, admin and board access guards

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::CurrentUser;
