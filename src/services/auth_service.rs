//! Authorization boundary for control connections.
//!
//! The hub treats the authorizer as opaque: it only consumes the
//! accept/reject outcome and an opaque principal id. Swapping the shared-key
//! check for a real identity provider stays behind this trait.

use uuid::Uuid;

use crate::error::ServiceError;

/// Opaque identity of an authorized control operator.
pub type PrincipalId = Uuid;

/// External collaborator deciding whether a credential grants control access.
pub trait ControlAuthorizer: Send + Sync {
    /// Validate `credential`, returning the principal it belongs to.
    fn authorize(&self, credential: &str) -> Result<PrincipalId, ServiceError>;
}

/// Authorizer comparing against a single shared key from the configuration.
pub struct SharedKeyAuthorizer {
    key: String,
    principal: PrincipalId,
}

impl SharedKeyAuthorizer {
    /// Build an authorizer for the given key. All successful authorizations
    /// map to one principal since the key is shared.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            principal: Uuid::new_v4(),
        }
    }
}

impl ControlAuthorizer for SharedKeyAuthorizer {
    fn authorize(&self, credential: &str) -> Result<PrincipalId, ServiceError> {
        if credential == self.key {
            Ok(self.principal)
        } else {
            Err(ServiceError::Unauthorized(
                "invalid control credential".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_configured_key_only() {
        let authorizer = SharedKeyAuthorizer::new("sesame");
        let principal = authorizer.authorize("sesame").unwrap();
        // Same principal for every successful check.
        assert_eq!(authorizer.authorize("sesame").unwrap(), principal);

        assert!(matches!(
            authorizer.authorize("guess"),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            authorizer.authorize(""),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
