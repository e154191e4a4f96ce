//! Verdict service contract
//!
//! The request and response bodies exchanged with the external verdict
//! service. The biometric summary rides inside the login request verbatim;
//! this crate defines the shapes and nothing about the transport.

use crate::types::BiometricSummary;
use serde::{Deserialize, Serialize};

/// Body of an authentication request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub username: String,
    pub password: String,
    /// Coarse location hint, when the surface has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The behavioral fingerprint, forwarded opaquely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biometrics: Option<BiometricSummary>,
}

impl LoginAttempt {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            location: None,
            biometrics: None,
        }
    }

    /// Attach a biometric summary to the attempt
    pub fn with_biometrics(mut self, summary: BiometricSummary) -> Self {
        self.biometrics = Some(summary);
        self
    }

    /// Attach a location hint to the attempt
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The verdict service's answer to a login attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginVerdict {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Session token, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Whether the service demands a second factor
    #[serde(rename = "requires2fa", default)]
    pub requires_2fa: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attempt_omits_absent_fields() {
        let attempt = LoginAttempt::new("alice", "hunter2");
        let value = serde_json::to_value(&attempt).unwrap();

        assert_eq!(value["username"], "alice");
        assert!(value.get("biometrics").is_none());
        assert!(value.get("location").is_none());
    }

    #[test]
    fn test_success_verdict_shape() {
        // A success body as the verdict service sends it.
        let json = r#"{"success": true, "token": "eyJ...", "username": "alice"}"#;
        let verdict: LoginVerdict = serde_json::from_str(json).unwrap();

        assert!(verdict.success);
        assert_eq!(verdict.token.as_deref(), Some("eyJ..."));
        assert_eq!(verdict.username.as_deref(), Some("alice"));
        assert!(!verdict.requires_2fa);
        assert!(verdict.message.is_none());
    }

    #[test]
    fn test_rejection_verdict_shape() {
        let json = r#"{
            "success": false,
            "message": "Behavioral verification failed",
            "requires2fa": true
        }"#;
        let verdict: LoginVerdict = serde_json::from_str(json).unwrap();

        assert!(!verdict.success);
        assert!(verdict.requires_2fa);
        assert_eq!(
            verdict.message.as_deref(),
            Some("Behavioral verification failed")
        );
        assert!(verdict.token.is_none());
    }

    #[test]
    fn test_requires_2fa_wire_name() {
        let verdict = LoginVerdict {
            success: false,
            message: None,
            token: None,
            username: None,
            requires_2fa: true,
        };
        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(value["requires2fa"], true);
        assert!(value.get("requires_2fa").is_none());
    }
}
