use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Per-call signing overrides.
///
/// The defaults configured on the service cover session tokens; action
/// tokens (e-mail confirmation, password recovery) override the secret and
/// usually the lifetime.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    pub secret: Option<Vec<u8>>,
    pub ttl: Option<Duration>,
}

/// Per-call verification overrides.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub secret: Option<Vec<u8>>,
}

/// JWT issuing and verification with a default secret and lifetime.
///
/// Uses HS256. There is no revocation list: once issued, a token stays
/// usable until its natural expiry.
pub struct TokenService {
    secret: Vec<u8>,
    default_ttl: Duration,
    algorithm: Algorithm,
}

impl TokenService {
    /// Create a token service with a default secret and default TTL.
    ///
    /// The secret should be at least 256 bits and come from configuration,
    /// never from code.
    pub fn new(secret: &[u8], default_ttl: Duration) -> Self {
        Self {
            secret: secret.to_vec(),
            default_ttl,
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a signed token for a subject.
    ///
    /// # Errors
    /// * `Signing` - token serialization or signing failed
    pub fn issue(&self, subject: &str, opts: &SignOptions) -> Result<String, TokenError> {
        let ttl = opts.ttl.unwrap_or(self.default_ttl);
        let claims = Claims::for_subject(subject, ttl);

        self.issue_claims(&claims, opts)
    }

    /// Issue a signed token from fully-built claims.
    ///
    /// # Errors
    /// * `Signing` - token serialization or signing failed
    pub fn issue_claims(&self, claims: &Claims, opts: &SignOptions) -> Result<String, TokenError> {
        let key = match &opts.secret {
            Some(secret) => EncodingKey::from_secret(secret),
            None => EncodingKey::from_secret(&self.secret),
        };
        let header = Header::new(self.algorithm);

        encode(&header, claims, &key).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token's signature and validity window, returning its claims.
    ///
    /// # Errors
    /// * `Expired` - the `exp` claim has elapsed
    /// * `NotYetValid` - the `nbf` claim has not been reached
    /// * `Invalid` - malformed token or bad signature
    /// * `Verification` - any other failure inside the JWT library
    pub fn verify(&self, token: &str, opts: &VerifyOptions) -> Result<Claims, TokenError> {
        let key = match &opts.secret {
            Some(secret) => DecodingKey::from_secret(secret),
            None => DecodingKey::from_secret(&self.secret),
        };

        let mut validation = Validation::new(self.algorithm);
        validation.validate_nbf = true;
        // No clock tolerance: a token one second past `exp` is expired.
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Invalid,
                _ => TokenError::Verification(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Decode a token without checking its signature or validity window.
    ///
    /// Only for informational use on tokens whose signature was already
    /// established, or where authenticity deliberately does not matter.
    /// Never feed the result into an authorization decision.
    ///
    /// # Errors
    /// * `Invalid` - the token does not parse as a JWT with a payload
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let key = DecodingKey::from_secret(&self.secret);
        let token_data =
            decode::<Claims>(token, &key, &validation).map_err(|_| TokenError::Invalid)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";
    const OTHER_SECRET: &[u8] = b"other_secret_key_at_least_32_byte!";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::days(1))
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = service();

        let token = tokens.issue("user123", &SignOptions::default()).unwrap();
        let claims = tokens.verify(&token, &VerifyOptions::default()).unwrap();

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_verify_expired_token() {
        let tokens = service();

        let claims = Claims::for_subject("user123", Duration::seconds(-2));
        let token = tokens
            .issue_claims(&claims, &SignOptions::default())
            .unwrap();

        assert!(matches!(
            tokens.verify(&token, &VerifyOptions::default()),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_verify_not_yet_valid_token() {
        let tokens = service();

        let claims = Claims::for_subject("user123", Duration::hours(1))
            .with_not_before(Utc::now().timestamp() + 600);
        let token = tokens
            .issue_claims(&claims, &SignOptions::default())
            .unwrap();

        assert!(matches!(
            tokens.verify(&token, &VerifyOptions::default()),
            Err(TokenError::NotYetValid)
        ));
    }

    #[test]
    fn test_verify_tampered_signature() {
        let tokens = service();

        let token = tokens.issue("user123", &SignOptions::default()).unwrap();
        let mut tampered = token.clone();
        // Flip the last signature character.
        let last = if tampered.ends_with('A') { 'B' } else { 'A' };
        tampered.pop();
        tampered.push(last);

        assert!(matches!(
            tokens.verify(&tampered, &VerifyOptions::default()),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_verify_garbage_token() {
        let tokens = service();

        assert!(matches!(
            tokens.verify("not.a.token", &VerifyOptions::default()),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let tokens = service();
        let other = TokenService::new(OTHER_SECRET, Duration::days(1));

        let token = tokens.issue("user123", &SignOptions::default()).unwrap();

        assert!(matches!(
            other.verify(&token, &VerifyOptions::default()),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_secret_override_for_action_tokens() {
        let tokens = service();

        let opts = SignOptions {
            secret: Some(OTHER_SECRET.to_vec()),
            ttl: Some(Duration::hours(1)),
        };
        let token = tokens.issue("someone@example.com", &opts).unwrap();

        // Rejected under the default secret, accepted under the override.
        assert!(tokens.verify(&token, &VerifyOptions::default()).is_err());

        let claims = tokens
            .verify(
                &token,
                &VerifyOptions {
                    secret: Some(OTHER_SECRET.to_vec()),
                },
            )
            .unwrap();
        assert_eq!(claims.sub, "someone@example.com");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_decode_skips_signature_and_expiry() {
        let tokens = service();
        let other = TokenService::new(OTHER_SECRET, Duration::days(1));

        let claims = Claims::for_subject("user123", Duration::seconds(-120));
        let token = other
            .issue_claims(&claims, &SignOptions::default())
            .unwrap();

        // Signed elsewhere and already expired, but decode still reads it.
        let decoded = tokens.decode(&token).unwrap();
        assert_eq!(decoded.sub, "user123");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let tokens = service();
        assert!(matches!(
            tokens.decode("garbage"),
            Err(TokenError::Invalid)
        ));
    }
}
