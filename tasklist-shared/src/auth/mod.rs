/// Authentication and identity utilities
///
/// # Modules
///
/// - `jwt`: Bearer token creation and validation (HS256)
/// - `password`: Argon2id password hashing and verification
/// - `google`: Google ID token verification (external identity provider)

pub mod google;
pub mod jwt;
pub mod password;
