//! services/api/src/adapters/firebase.rs
//!
//! Verifies Firebase Authentication ID tokens. Implements the `IdentityVerifier`
//! port by checking the RS256 signature against Google's published JWK set and
//! validating the Firebase-specific claims.

use async_trait::async_trait;
use college_assistant_core::domain::Identity;
use college_assistant_core::ports::{IdentityVerifier, PortError, PortResult};
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
// Unknown `kid`s only trigger a refetch once the cached set is at least this old.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const CLOCK_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
    auth_time: Option<i64>,
    iat: Option<i64>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

enum CacheLookup {
    Found(DecodingKey),
    /// Not in a set that is too fresh to refetch.
    Unknown,
    Refresh,
}

fn unknown_key(kid: &str) -> PortError {
    PortError::Unauthorized(format!("unknown signing key '{}'", kid))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct FirebaseVerifier {
    http: reqwest::Client,
    project_id: String,
    jwks_url: String,
    keys: RwLock<Option<CachedKeys>>,
    refresh: Mutex<()>,
}

impl FirebaseVerifier {
    pub fn new(http: reqwest::Client, project_id: String, jwks_url: String) -> Self {
        Self {
            http,
            project_id,
            jwks_url,
            keys: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = CLOCK_LEEWAY_SECS;
        validation
    }

    /// Looks `kid` up in the cached set without fetching.
    async fn cached_key(&self, kid: &str) -> PortResult<CacheLookup> {
        let cache = self.keys.read().await;
        let Some(cached) = cache.as_ref() else {
            return Ok(CacheLookup::Refresh);
        };
        if cached.fetched_at.elapsed() >= KEY_CACHE_TTL {
            return Ok(CacheLookup::Refresh);
        }
        match cached.set.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map(CacheLookup::Found)
                .map_err(|e| PortError::Unexpected(format!("unusable signing key: {}", e))),
            None if cached.fetched_at.elapsed() >= MIN_REFRESH_INTERVAL => Ok(CacheLookup::Refresh),
            None => Ok(CacheLookup::Unknown),
        }
    }

    /// Finds `kid` in the cached set, refetching the set when it is stale or
    /// when the key is unknown and the set is old enough to be refreshed.
    ///
    /// Refreshes are serialized: callers that queued behind a refresh look at
    /// the new set before deciding to fetch again.
    async fn decoding_key(&self, kid: &str) -> PortResult<DecodingKey> {
        match self.cached_key(kid).await? {
            CacheLookup::Found(key) => return Ok(key),
            CacheLookup::Unknown => return Err(unknown_key(kid)),
            CacheLookup::Refresh => {}
        }

        let _refresh = self.refresh.lock().await;
        match self.cached_key(kid).await? {
            CacheLookup::Found(key) => return Ok(key),
            CacheLookup::Unknown => return Err(unknown_key(kid)),
            CacheLookup::Refresh => {}
        }

        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| PortError::Unexpected(format!("unusable signing key: {}", e)))?;
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        key.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch_keys(&self) -> PortResult<JwkSet> {
        debug!(url = %self.jwks_url, "Fetching identity provider signing keys");
        let set = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| PortError::Upstream(format!("fetching signing keys: {}", e)))?
            .json::<JwkSet>()
            .await
            .map_err(|e| PortError::InvalidResponse(format!("decoding signing keys: {}", e)))?;
        info!(key_count = set.keys.len(), "Identity provider signing keys refreshed");
        Ok(set)
    }
}

/// Applies the checks `jsonwebtoken` does not cover and maps the claims to an `Identity`.
fn identity_from_claims(claims: FirebaseClaims, now: i64) -> PortResult<Identity> {
    let latest_allowed = now + CLOCK_LEEWAY_SECS as i64;

    if claims.sub.trim().is_empty() {
        return Err(PortError::Unauthorized("token has an empty subject".to_string()));
    }
    if claims.auth_time.is_some_and(|t| t > latest_allowed) {
        return Err(PortError::Unauthorized("auth_time is in the future".to_string()));
    }
    if claims.iat.is_some_and(|t| t > latest_allowed) {
        return Err(PortError::Unauthorized("token issued in the future".to_string()));
    }
    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| PortError::Unauthorized("token carries no email".to_string()))?;

    Ok(Identity {
        user_id: claims.sub,
        email,
    })
}

//=========================================================================================
// `IdentityVerifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify_token(&self, id_token: &str) -> PortResult<Identity> {
        let header = decode_header(id_token)
            .map_err(|e| PortError::Unauthorized(format!("malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(PortError::Unauthorized(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| PortError::Unauthorized("token header has no kid".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<FirebaseClaims>(id_token, &key, &self.validation())
            .map_err(|e| PortError::Unauthorized(format!("token rejected: {}", e)))?;

        identity_from_claims(data.claims, chrono::Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::Value;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Header {"alg":"RS256","kid":"rotated-out","typ":"JWT"}, empty payload, dummy signature.
    const UNKNOWN_KID_TOKEN: &str =
        "eyJhbGciOiJSUzI1NiIsImtpZCI6InJvdGF0ZWQtb3V0IiwidHlwIjoiSldUIn0.e30.c2lnbmF0dXJl";

    const NOW: i64 = 1_750_000_000;

    fn claims(email: Option<&str>) -> FirebaseClaims {
        FirebaseClaims {
            sub: "uid-ada".to_string(),
            email: email.map(str::to_string),
            auth_time: Some(NOW - 30),
            iat: Some(NOW - 30),
        }
    }

    const PROJECT: &str = "lakeside-assistant";
    const SIGNING_KID: &str = "test-signing-key";
    const SIGNING_KEY_PEM: &str = include_str!("../../tests/fixtures/firebase_test_key.pem");
    // Public half of the fixture key, as published in a JWK set.
    const SIGNING_KEY_N: &str = "h46ijTH69b6ssq5GIETlvGT5D6G_I-kbH37byBegtTDARttJ9q9kaL3U9T7J-OyI8fQIYJaL02IcvPbaz9BAVizlXnEOcscdMKHe0n0RynrfIQKi1hWGQCf3KUnU3NzcKmL1Evcke-DGrBARHLpbghXy2UOr-1__LTEbd68gG-2gnceiWVrRx2kk7oCN02dagov1Yf0zBUImaNmrcacTdGJ_2COWNcf0XYQ5rYr55YoGtImoIM-5qeMHT6RtyfgrH4e5eEhDKcXdY_e-5S-solqBx2RWygrX5caQPcNLFYdXbr4F_ztqO05TNEfgVS3atknH3-Nuf27CXVoYfFajAw";
    const SIGNING_KEY_E: &str = "AQAB";

    async fn serve_signing_key(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/jwk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{
                    "kty": "RSA",
                    "alg": "RS256",
                    "use": "sig",
                    "kid": SIGNING_KID,
                    "n": SIGNING_KEY_N,
                    "e": SIGNING_KEY_E,
                }]
            })))
            .mount(server)
            .await;
    }

    fn valid_claims() -> Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "sub": "uid-ada",
            "email": "ada@example.edu",
            "aud": PROJECT,
            "iss": format!("https://securetoken.google.com/{}", PROJECT),
            "exp": now + 3600,
            "iat": now - 30,
            "auth_time": now - 30,
        })
    }

    fn sign(claims: &Value) -> String {
        let header = Header {
            kid: Some(SIGNING_KID.to_string()),
            ..Header::new(Algorithm::RS256)
        };
        let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM.as_bytes()).unwrap();
        encode(&header, claims, &key).unwrap()
    }

    fn verifier_for(server: &MockServer) -> FirebaseVerifier {
        FirebaseVerifier::new(
            reqwest::Client::new(),
            PROJECT.to_string(),
            format!("{}/jwk", server.uri()),
        )
    }

    #[test]
    fn claims_map_to_identity() {
        let identity = identity_from_claims(claims(Some("ada@example.edu")), NOW).unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: "uid-ada".to_string(),
                email: "ada@example.edu".to_string(),
            }
        );
    }

    #[test]
    fn token_without_email_is_rejected() {
        assert!(identity_from_claims(claims(None), NOW).is_err());
        assert!(identity_from_claims(claims(Some("  ")), NOW).is_err());
    }

    #[test]
    fn future_auth_time_is_rejected_beyond_leeway() {
        let mut c = claims(Some("ada@example.edu"));
        c.auth_time = Some(NOW + 3600);
        assert!(identity_from_claims(c, NOW).is_err());

        let mut c = claims(Some("ada@example.edu"));
        c.auth_time = Some(NOW + 10);
        assert!(identity_from_claims(c, NOW).is_ok());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let mut c = claims(Some("ada@example.edu"));
        c.sub = String::new();
        assert!(matches!(identity_from_claims(c, NOW), Err(PortError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn malformed_token_is_unauthorized_without_fetching_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let err = verifier_for(&server).verify_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn symmetric_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let forged = encode(
            &Header::default(),
            &json!({ "sub": "uid-ada", "email": "ada@example.edu", "exp": NOW * 2 }),
            &EncodingKey::from_secret(b"guessable"),
        )
        .unwrap();

        let err = verifier_for(&server).verify_token(&forged).await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_key_id_is_rejected_and_key_set_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server);
        for _ in 0..2 {
            let err = verifier.verify_token(UNKNOWN_KID_TOKEN).await.unwrap_err();
            assert!(matches!(err, PortError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn key_endpoint_failure_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = verifier_for(&server)
            .verify_token(UNKNOWN_KID_TOKEN)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }

    #[tokio::test]
    async fn correctly_signed_token_yields_identity() {
        let server = MockServer::start().await;
        serve_signing_key(&server).await;

        let identity = verifier_for(&server)
            .verify_token(&sign(&valid_claims()))
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: "uid-ada".to_string(),
                email: "ada@example.edu".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn signed_token_for_another_project_or_expired_is_rejected() {
        let server = MockServer::start().await;
        serve_signing_key(&server).await;
        let verifier = verifier_for(&server);
        let now = chrono::Utc::now().timestamp();

        let mut wrong_audience = valid_claims();
        wrong_audience["aud"] = json!("some-other-project");
        let mut wrong_issuer = valid_claims();
        wrong_issuer["iss"] = json!("https://accounts.example.com/lakeside-assistant");
        let mut expired = valid_claims();
        expired["exp"] = json!(now - 3600);

        for claims in [wrong_audience, wrong_issuer, expired] {
            let err = verifier.verify_token(&sign(&claims)).await.unwrap_err();
            assert!(matches!(err, PortError::Unauthorized(_)), "{:?} for {}", err, claims);
        }
    }

    #[tokio::test]
    async fn concurrent_cache_misses_share_one_key_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "keys": [] }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server);
        let (a, b, c, d) = tokio::join!(
            verifier.verify_token(UNKNOWN_KID_TOKEN),
            verifier.verify_token(UNKNOWN_KID_TOKEN),
            verifier.verify_token(UNKNOWN_KID_TOKEN),
            verifier.verify_token(UNKNOWN_KID_TOKEN),
        );
        for result in [a, b, c, d] {
            assert!(matches!(result, Err(PortError::Unauthorized(_))));
        }
    }
}
