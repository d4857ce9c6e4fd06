//! Client secrets identify an intent and authorize a publishable key to read it.
//!
//! Secrets have the form `pi_<id>_secret_<suffix>` for payment intents and
//! `seti_<id>_secret_<suffix>` for setup intents. The suffix never shows up in
//! `Debug` or `Display` output so secrets can be logged safely.

use std::str::FromStr;

use thiserror::Error;

const SECRET_SEPARATOR: &str = "_secret_";

/// Errors produced while parsing a client secret
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientSecretError {
    /// Secret does not start with a known intent prefix
    #[error("Unknown client secret prefix, expected `pi_` or `seti_`")]
    UnknownPrefix,

    /// Secret has a known prefix but not the `<id>_secret_<suffix>` layout
    #[error("Malformed {0} client secret, expected `<id>_secret_<secret>`")]
    Malformed(IntentKind),
}

/// Which API object an intent is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Payment,
    Setup,
}

impl IntentKind {
    /// Id prefix used by the API for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            IntentKind::Payment => "pi",
            IntentKind::Setup => "seti",
        }
    }

    /// Name of the `IntentConfiguration` mode that produces this kind
    pub fn mode_name(&self) -> &'static str {
        match self {
            IntentKind::Payment => "payment",
            IntentKind::Setup => "setup",
        }
    }

    /// REST collection for this kind
    pub fn api_path(&self) -> &'static str {
        match self {
            IntentKind::Payment => "payment_intents",
            IntentKind::Setup => "setup_intents",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::Payment => write!(f, "PaymentIntent"),
            IntentKind::Setup => write!(f, "SetupIntent"),
        }
    }
}

/// Parsed client secret
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret {
    kind: IntentKind,
    intent_id: String,
    raw: String,
}

impl ClientSecret {
    pub fn parse(raw: &str) -> Result<Self, ClientSecretError> {
        let raw = raw.trim();

        let kind = [IntentKind::Payment, IntentKind::Setup]
            .into_iter()
            .find(|kind| {
                raw.strip_prefix(kind.prefix())
                    .is_some_and(|rest| rest.starts_with('_'))
            })
            .ok_or(ClientSecretError::UnknownPrefix)?;

        // `<prefix>_<id>_secret_<suffix>` with no underscores inside id or suffix
        let body = &raw[kind.prefix().len() + 1..];
        let (id, suffix) = body
            .split_once(SECRET_SEPARATOR)
            .ok_or(ClientSecretError::Malformed(kind))?;

        let is_segment = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c != '_' && !c.is_whitespace())
        };
        if !is_segment(id) || !is_segment(suffix) {
            return Err(ClientSecretError::Malformed(kind));
        }

        Ok(Self {
            kind,
            intent_id: format!("{}_{}", kind.prefix(), id),
            raw: raw.to_string(),
        })
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    /// Id of the intent this secret belongs to (e.g. `pi_123`)
    pub fn intent_id(&self) -> &str {
        &self.intent_id
    }

    /// The full secret, for sending to the API
    pub fn expose(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ClientSecret {
    type Err = ClientSecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientSecret::parse(s)
    }
}

impl std::fmt::Display for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}***", self.intent_id, SECRET_SEPARATOR)
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("kind", &self.kind)
            .field("intent_id", &self.intent_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payment_intent_secret() {
        let secret = ClientSecret::parse("pi_3MtwBw2eZvKYlo2C_secret_YrKJUKribcBjcG8HVhfZluoGH").unwrap();
        assert_eq!(secret.kind(), IntentKind::Payment);
        assert_eq!(secret.intent_id(), "pi_3MtwBw2eZvKYlo2C");
        assert_eq!(
            secret.expose(),
            "pi_3MtwBw2eZvKYlo2C_secret_YrKJUKribcBjcG8HVhfZluoGH"
        );
    }

    #[test]
    fn test_parse_setup_intent_secret() {
        let secret: ClientSecret = "seti_1Mm8s8LkdIwHu7ix_secret_NXDICkPqPeiBTAFqWmkbff09lRmSVXe"
            .parse()
            .unwrap();
        assert_eq!(secret.kind(), IntentKind::Setup);
        assert_eq!(secret.intent_id(), "seti_1Mm8s8LkdIwHu7ix");
    }

    #[test]
    fn test_rejects_malformed_secrets() {
        assert_eq!(
            ClientSecret::parse("cs_123_secret_abc"),
            Err(ClientSecretError::UnknownPrefix)
        );
        assert_eq!(
            ClientSecret::parse("pix_123_secret_abc"),
            Err(ClientSecretError::UnknownPrefix)
        );
        assert_eq!(
            ClientSecret::parse("pi_123"),
            Err(ClientSecretError::Malformed(IntentKind::Payment))
        );
        assert_eq!(
            ClientSecret::parse("pi__secret_abc"),
            Err(ClientSecretError::Malformed(IntentKind::Payment))
        );
        assert_eq!(
            ClientSecret::parse("seti_123_secret_"),
            Err(ClientSecretError::Malformed(IntentKind::Setup))
        );
        assert_eq!(
            ClientSecret::parse("pi_1_2_secret_abc"),
            Err(ClientSecretError::Malformed(IntentKind::Payment))
        );
    }

    #[test]
    fn test_display_and_debug_redact_suffix() {
        let secret = ClientSecret::parse("pi_123_secret_topsecret").unwrap();
        assert_eq!(secret.to_string(), "pi_123_secret_***");
        assert!(!format!("{:?}", secret).contains("topsecret"));
    }
}
