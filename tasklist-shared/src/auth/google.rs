/// Google ID token verification (external identity provider)
///
/// Verifies ID tokens minted by Google's federated sign-in. A token is
/// accepted only when:
///
/// - its RS256 signature checks out against Google's published JWKS
/// - its issuer is one of exactly two trusted issuer strings
/// - its audience matches the configured OAuth client id
/// - it has not expired
///
/// The verifier never creates sessions itself; it only yields the verified
/// claims (subject id, email, optional name) for the identity layer to map
/// onto a user account.
///
/// # Example
///
/// ```no_run
/// use tasklist_shared::auth::google::GoogleVerifier;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = GoogleVerifier::new("my-client-id.apps.googleusercontent.com");
/// let claims = verifier.verify("eyJ...").await?;
/// println!("Signed in as {}", claims.email);
/// # Ok(())
/// # }
/// ```

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Issuer strings Google uses for ID tokens. Tokens from any other issuer
/// are rejected.
pub const TRUSTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Google's JWKS endpoint for ID token signing keys
const CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Error type for external identity token verification
///
/// Everything except `KeyFetch` means the caller supplied a bad token.
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    /// Token is not a structurally valid JWT
    #[error("Malformed identity token: {0}")]
    Malformed(String),

    /// Signature does not verify against Google's keys
    #[error("Identity token signature is invalid")]
    InvalidSignature,

    /// Token issuer is not in the trusted allow-list
    #[error("Identity token issuer is not trusted")]
    UntrustedIssuer,

    /// Token audience does not match the configured client id
    #[error("Identity token was issued for a different audience")]
    WrongAudience,

    /// Token has expired
    #[error("Identity token has expired")]
    Expired,

    /// Token is signed with a key id we don't know
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// Could not fetch Google's signing keys
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

/// Claims extracted from a verified Google ID token
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalClaims {
    /// Token issuer
    pub iss: String,

    /// Google's stable subject id for the account
    pub sub: String,

    /// Audience (our OAuth client id)
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Verified email address of the account
    pub email: String,

    /// Display name, when Google includes one
    #[serde(default)]
    pub name: Option<String>,
}

/// A single RSA signing key from the JWKS document
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// Google's JWKS response
#[derive(Debug, Deserialize)]
struct CertsResponse {
    keys: Vec<Jwk>,
}

/// Verifier for Google-issued ID tokens
///
/// Holds the configured OAuth client id and an HTTP client for fetching
/// Google's rotating signing keys.
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    client_id: String,
    http: reqwest::Client,
}

impl GoogleVerifier {
    /// Creates a verifier for the given OAuth client id
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Verifies an ID token and returns its claims
    ///
    /// # Errors
    ///
    /// - `GoogleError::Malformed` / `InvalidSignature` / `UntrustedIssuer` /
    ///   `WrongAudience` / `Expired` for bad tokens
    /// - `GoogleError::KeyFetch` when the JWKS endpoint is unreachable
    pub async fn verify(&self, token: &str) -> Result<ExternalClaims, GoogleError> {
        // Reject garbage before touching the network
        let header =
            decode_header(token).map_err(|e| GoogleError::Malformed(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| GoogleError::Malformed("missing key id".to_string()))?;

        let certs: CertsResponse = self
            .http
            .get(CERTS_URL)
            .send()
            .await
            .map_err(|e| GoogleError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| GoogleError::KeyFetch(e.to_string()))?;

        let jwk = certs
            .keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or_else(|| GoogleError::UnknownKey(kid.clone()))?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| GoogleError::KeyFetch(format!("bad JWKS key material: {}", e)))?;

        decode_claims(token, &key, Algorithm::RS256, &self.client_id)
    }
}

/// Decodes and validates token claims against a known key
///
/// Checks signature, expiry, the issuer allow-list and the audience.
/// Split out from [`GoogleVerifier::verify`] so the claim checks can be
/// exercised without Google's live keys.
fn decode_claims(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    audience: &str,
) -> Result<ExternalClaims, GoogleError> {
    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&TRUSTED_ISSUERS);
    validation.set_audience(&[audience]);

    let data = decode::<ExternalClaims>(token, key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => GoogleError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => GoogleError::UntrustedIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => GoogleError::WrongAudience,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => GoogleError::InvalidSignature,
        _ => GoogleError::Malformed(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-signing-secret";
    const CLIENT_ID: &str = "test-client-id.apps.googleusercontent.com";

    fn sign(claims: serde_json::Value) -> String {
        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
            .expect("Should sign test token")
    }

    fn decode_test(token: &str) -> Result<ExternalClaims, GoogleError> {
        decode_claims(
            token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            Algorithm::HS256,
            CLIENT_ID,
        )
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_trusted_issuer_accepted() {
        for iss in TRUSTED_ISSUERS {
            let token = sign(json!({
                "iss": iss,
                "sub": "1234567890",
                "aud": CLIENT_ID,
                "exp": future_exp(),
                "email": "user@example.com",
                "name": "Test User",
            }));

            let claims = decode_test(&token).expect("Trusted issuer should verify");
            assert_eq!(claims.sub, "1234567890");
            assert_eq!(claims.email, "user@example.com");
            assert_eq!(claims.name.as_deref(), Some("Test User"));
        }
    }

    #[test]
    fn test_untrusted_issuer_rejected() {
        let token = sign(json!({
            "iss": "https://evil.example.com",
            "sub": "1234567890",
            "aud": CLIENT_ID,
            "exp": future_exp(),
            "email": "user@example.com",
        }));

        assert!(matches!(
            decode_test(&token),
            Err(GoogleError::UntrustedIssuer)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let token = sign(json!({
            "iss": "accounts.google.com",
            "sub": "1234567890",
            "aud": "someone-elses-client-id",
            "exp": future_exp(),
            "email": "user@example.com",
        }));

        assert!(matches!(
            decode_test(&token),
            Err(GoogleError::WrongAudience)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = sign(json!({
            "iss": "accounts.google.com",
            "sub": "1234567890",
            "aud": CLIENT_ID,
            "exp": chrono::Utc::now().timestamp() - 3600,
            "email": "user@example.com",
        }));

        assert!(matches!(decode_test(&token), Err(GoogleError::Expired)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let token = sign(json!({
            "iss": "accounts.google.com",
            "sub": "1234567890",
            "aud": CLIENT_ID,
            "exp": future_exp(),
            "email": "user@example.com",
        }));

        let result = decode_claims(
            &token,
            &DecodingKey::from_secret(b"some-other-secret"),
            Algorithm::HS256,
            CLIENT_ID,
        );
        assert!(matches!(result, Err(GoogleError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            decode_test("not.a.token"),
            Err(GoogleError::Malformed(_))
        ));
    }

    #[test]
    fn test_name_claim_is_optional() {
        let token = sign(json!({
            "iss": "accounts.google.com",
            "sub": "1234567890",
            "aud": CLIENT_ID,
            "exp": future_exp(),
            "email": "user@example.com",
        }));

        let claims = decode_test(&token).expect("Token without name should verify");
        assert!(claims.name.is_none());
    }
}
