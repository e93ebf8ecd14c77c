use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// JWT claims carried by every token this service issues.
///
/// The subject is mandatory: tokens without an identity are useless to the
/// authentication layer. `nbf` is only present on tokens that are issued
/// ahead of their validity window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id, or the payload of an action token)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl Claims {
    /// Build claims for a subject, expiring `ttl` from now.
    pub fn for_subject(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            nbf: None,
        }
    }

    /// Set the not-before timestamp.
    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_subject_sets_window() {
        let claims = Claims::for_subject("user123", Duration::hours(24));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!(claims.nbf.is_none());
    }

    #[test]
    fn test_with_not_before() {
        let claims = Claims::for_subject("user123", Duration::hours(1)).with_not_before(1234567890);
        assert_eq!(claims.nbf, Some(1234567890));
    }

    #[test]
    fn test_nbf_is_omitted_when_absent() {
        let claims = Claims::for_subject("user123", Duration::hours(1));
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("nbf"));
    }
}
