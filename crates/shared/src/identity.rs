//! Identity verification against the external auth provider.
//!
//! Faktura never issues credentials of its own. Clients authenticate with
//! the provider and send the resulting ID token as a bearer credential; this
//! module verifies the token signature and claims and hands back the stable
//! subject id (and email, when the provider supplies one).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::IdentityConfig;

/// How long fetched signing keys are trusted before a refresh.
const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Decoded identity of a verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Stable subject id assigned by the provider.
    pub uid: String,
    /// Email claim, when present on the token.
    pub email: Option<String>,
}

/// Errors that can occur during token verification.
///
/// Every variant maps to Unauthorized at the API boundary except
/// `KeyFetch`, which is an outbound infrastructure failure.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is malformed, unsigned by a known key, or carries wrong claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Token header names no key id.
    #[error("token header has no key id")]
    MissingKeyId,

    /// The provider's signing keys could not be fetched.
    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

/// Verifies opaque bearer credentials into a [`VerifiedIdentity`].
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a token, returning the decoded identity.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Claims Faktura reads from a provider ID token.
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    email: Option<String>,
}

/// One RSA signing key from the provider's JWKS document.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Cached signing keys, keyed by `kid`.
struct KeyCache {
    keys: HashMap<String, Jwk>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_stale(&self) -> bool {
        match self.fetched_at {
            Some(at) => at.elapsed() > KEY_CACHE_TTL,
            None => true,
        }
    }
}

/// Production verifier: validates RS256 ID tokens for the configured
/// provider project, fetching the provider's public keys on demand.
pub struct ProviderVerifier {
    config: IdentityConfig,
    http: reqwest::Client,
    cache: RwLock<KeyCache>,
}

impl std::fmt::Debug for ProviderVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProviderVerifier {
    /// Creates a verifier for the given provider project.
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    /// Returns the signing key for `kid`, refreshing the cache when the key
    /// is unknown or the cache has gone stale.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, IdentityError> {
        {
            let cache = self.cache.read().await;
            if !cache.is_stale()
                && let Some(key) = cache.keys.get(kid)
            {
                return Ok(key.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if cache.is_stale() || !cache.keys.contains_key(kid) {
            let jwks: JwkSet = self
                .http
                .get(&self.config.jwks_url)
                .send()
                .await
                .map_err(|e| IdentityError::KeyFetch(e.to_string()))?
                .error_for_status()
                .map_err(|e| IdentityError::KeyFetch(e.to_string()))?
                .json()
                .await
                .map_err(|e| IdentityError::KeyFetch(e.to_string()))?;

            debug!(keys = jwks.keys.len(), "Refreshed provider signing keys");
            cache.keys = jwks.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
            cache.fetched_at = Some(Instant::now());
        }

        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| IdentityError::Invalid(format!("unknown signing key '{kid}'")))
    }
}

#[async_trait]
impl TokenVerifier for ProviderVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token).map_err(map_jwt_error)?;
        let kid = header.kid.ok_or(IdentityError::MissingKeyId)?;
        let jwk = self.signing_key(&kid).await?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| IdentityError::Invalid(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.project_id]);
        validation.set_issuer(&[&self.config.issuer()]);

        let data = decode::<ProviderClaims>(token, &key, &validation).map_err(map_jwt_error)?;

        Ok(VerifiedIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Maps `jsonwebtoken` failures onto the identity taxonomy.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> IdentityError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => IdentityError::Expired,
        _ => IdentityError::Invalid(err.to_string()),
    }
}

/// Test/development verifier mapping fixed tokens to identities.
#[derive(Debug, Default)]
pub struct StaticVerifier {
    identities: HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    /// Creates an empty verifier that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as resolving to the given identity.
    #[must_use]
    pub fn with_token(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.identities.insert(
            token.to_string(),
            VerifiedIdentity {
                uid: uid.to_string(),
                email: email.map(ToString::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Invalid("unknown token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier_known_token() {
        let verifier =
            StaticVerifier::new().with_token("tok-1", "uid-1", Some("user@example.com"));

        let identity = verifier.verify("tok-1").await.unwrap();
        assert_eq!(identity.uid, "uid-1");
        assert_eq!(identity.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn test_static_verifier_unknown_token() {
        let verifier = StaticVerifier::new();
        let err = verifier.verify("nope").await.unwrap_err();
        assert!(matches!(err, IdentityError::Invalid(_)));
    }

    #[test]
    fn test_map_jwt_error_expired() {
        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert!(matches!(map_jwt_error(err), IdentityError::Expired));
    }

    #[test]
    fn test_map_jwt_error_other() {
        let err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature);
        assert!(matches!(map_jwt_error(err), IdentityError::Invalid(_)));
    }

    #[test]
    fn test_key_cache_staleness() {
        let cache = KeyCache {
            keys: HashMap::new(),
            fetched_at: None,
        };
        assert!(cache.is_stale());

        let cache = KeyCache {
            keys: HashMap::new(),
            fetched_at: Some(Instant::now()),
        };
        assert!(!cache.is_stale());
    }
}
