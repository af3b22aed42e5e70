//! Connection-setup link collaborator
//!
//! An operator holding a setup-link token submits SAML or OIDC connection
//! configuration. The configuration is posted to a save endpoint scoped by the
//! token; on success the operator is sent to a confirmation view scoped by the
//! same token, on failure they stay on the form with a readable message.
//!
//! This is a client of the connection-management API. It performs no key or
//! namespace handling of its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity-provider protocol of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdpType {
    /// SAML 2.0
    Saml,
    /// OpenID Connect
    Oidc,
}

impl IdpType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            IdpType::Saml => "saml",
            IdpType::Oidc => "oidc",
        }
    }
}

impl fmt::Display for IdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "saml" => Ok(IdpType::Saml),
            "oidc" => Ok(IdpType::Oidc),
            other => Err(Error::invalid_input(format!(
                "unknown identity-provider type '{}', expected \"saml\" or \"oidc\"",
                other
            ))),
        }
    }
}

/// Endpoint that persists connection configuration
pub trait ConnectionSink {
    /// Save `config` for an identity provider of type `idp` at `endpoint`
    ///
    /// # Errors
    ///
    /// Any error is reported to the operator as a non-fatal message.
    fn save(&self, endpoint: &str, idp: IdpType, config: &serde_json::Value) -> Result<()>;
}

/// What the setup form should do after a submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Saved; navigate to this confirmation path
    Navigate(String),
    /// Not saved; show this message and keep the form open for retry
    Failed(String),
}

/// A setup link: an opaque token plus the provider type being configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupLink {
    token: String,
    idp_type: IdpType,
}

impl SetupLink {
    /// Create a setup link
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the token is empty or contains `/`.
    pub fn new(token: impl Into<String>, idp_type: IdpType) -> Result<Self> {
        let token = token.into();
        if token.is_empty() || token.contains('/') {
            return Err(Error::invalid_input(format!(
                "invalid setup link token {:?}",
                token
            )));
        }
        Ok(Self { token, idp_type })
    }

    /// The opaque token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Provider type being configured
    pub fn idp_type(&self) -> IdpType {
        self.idp_type
    }

    /// Save endpoint scoped by the token
    pub fn save_endpoint(&self) -> String {
        format!("/api/setup/{}/sso-connection", self.token)
    }

    /// Confirmation view scoped by the token
    pub fn confirmation_path(&self) -> String {
        format!("/setup/{}/sso-connection", self.token)
    }

    /// Post `config` through `sink` and decide where the operator goes next
    pub fn submit<S: ConnectionSink + ?Sized>(
        &self,
        sink: &S,
        config: &serde_json::Value,
    ) -> SetupOutcome {
        match sink.save(&self.save_endpoint(), self.idp_type, config) {
            Ok(()) => SetupOutcome::Navigate(self.confirmation_path()),
            Err(e) => SetupOutcome::Failed(e.to_string()),
        }
    }
}
