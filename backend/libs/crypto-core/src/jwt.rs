/// Identity-provider session token verification
///
/// The hosted identity provider signs short-lived session tokens with RS256.
/// Services only ever hold the provider's public key: tokens are verified
/// here and turned into [`SessionClaims`] for the request pipeline.
///
/// ## Usage
///
/// Call [`initialize_session_verifier`] once during startup, then call
/// [`validate_session_token`] per request:
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// let public_key = jwt::load_validation_key()?;
/// jwt::initialize_session_verifier(&public_key, jwt::VerifierSettings::default())?;
///
/// let claims = jwt::validate_session_token(token)?.claims;
/// ```
use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Session tokens MUST be RS256; symmetric algorithms are never accepted
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const PUBLIC_KEY_PEM_ENV: &str = "IDENTITY_JWT_PUBLIC_KEY_PEM";
const PUBLIC_KEY_PATH_ENV: &str = "IDENTITY_JWT_PUBLIC_KEY_PATH";

/// Claims carried by an identity-provider session token
///
/// `sub` is the provider's user id. The profile claims are optional because
/// providers only include the ones the user actually filled in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Verification knobs taken from service configuration
#[derive(Debug, Clone, Default)]
pub struct VerifierSettings {
    /// Expected `iss` claim; unchecked when `None`
    pub issuer: Option<String>,
    /// Clock skew tolerated on `exp`
    pub leeway_secs: u64,
}

struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

static SESSION_VERIFIER: OnceCell<SessionVerifier> = OnceCell::new();

/// Initialize the process-wide verifier from the provider's PEM public key
///
/// Can only be called once; later calls return an error.
pub fn initialize_session_verifier(public_key_pem: &str, settings: VerifierSettings) -> Result<()> {
    let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = settings.leeway_secs;
    validation.set_required_spec_claims(&["exp", "sub"]);
    if let Some(issuer) = settings.issuer.as_deref() {
        validation.set_issuer(&[issuer]);
    }

    SESSION_VERIFIER
        .set(SessionVerifier { key, validation })
        .map_err(|_| anyhow!("Session verifier already initialized"))
}

/// Whether [`initialize_session_verifier`] has run
pub fn is_initialized() -> bool {
    SESSION_VERIFIER.get().is_some()
}

/// Read the provider public key from `IDENTITY_JWT_PUBLIC_KEY_PEM`, or from
/// the file named by `IDENTITY_JWT_PUBLIC_KEY_PATH`
pub fn load_validation_key() -> Result<String> {
    if let Ok(pem) = std::env::var(PUBLIC_KEY_PEM_ENV) {
        if !pem.trim().is_empty() {
            // Env files often carry the PEM on one line with literal "\n"
            return Ok(pem.replace("\\n", "\n"));
        }
    }

    let path = std::env::var(PUBLIC_KEY_PATH_ENV)
        .map_err(|_| anyhow!("{PUBLIC_KEY_PEM_ENV} or {PUBLIC_KEY_PATH_ENV} must be set"))?;

    std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read public key from {path}: {e}"))
}

/// Verify signature, expiry and issuer of a session token
///
/// `token` is the raw JWT without the `Bearer ` prefix.
pub fn validate_session_token(token: &str) -> Result<TokenData<SessionClaims>> {
    let verifier = SESSION_VERIFIER.get().ok_or_else(|| {
        anyhow!("Session verifier not initialized. Call initialize_session_verifier() during startup.")
    })?;

    decode::<SessionClaims>(token, &verifier.key, &verifier.validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Sign session claims with an RS256 private key
///
/// Production tokens come from the identity provider; this exists for local
/// development and tests that need to impersonate it.
pub fn sign_session_token(claims: &SessionClaims, private_key_pem: &str) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    encode(&Header::new(JWT_ALGORITHM), claims, &key)
        .map_err(|e| anyhow!("Failed to sign session token: {e}"))
}
