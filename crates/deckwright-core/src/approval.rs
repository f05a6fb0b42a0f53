//! Governance gate for destructive operations.
//!
//! Slide deletion, shape removal and bulk replacement are destructive and
//! only run when the caller presents an approval token scoped to the
//! operation. Tokens have the shape `<prefix>:<scope>:<nonce>`, for example
//! `approve:delete-slide:7f3a9c21`.
//!
//! The gate checks a token's *shape and scope*, not its authenticity. The
//! [`TokenVerifier`] trait is where signature checks plug in; the shipped
//! [`StructuralOnly`] verifier accepts every well-formed token.

use std::fmt;

use deckwright_config::TokenPolicy;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;
use tracing::{info, warn};

const APPROVAL_TARGET: &str = "deckwright::approval";
const MIN_NONCE_LEN: usize = 8;

/// Closed set of operations that need approval.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DestructiveOperation {
    /// Removing a slide.
    DeleteSlide,
    /// Removing a shape from a slide.
    RemoveShape,
    /// Replacing text across the whole deck.
    ReplaceAll,
}

impl DestructiveOperation {
    /// Scope an approval token must carry for this operation.
    #[must_use]
    pub const fn required_scope(self) -> &'static str {
        match self {
            Self::DeleteSlide => "delete-slide",
            Self::RemoveShape => "remove-shape",
            Self::ReplaceAll => "replace-all",
        }
    }

    /// Classifies an operation name; `None` means no approval is needed.
    ///
    /// Accepts the snake_case operation name or its kebab-case scope.
    #[must_use]
    pub fn classify(operation: &str) -> Option<Self> {
        Self::iter().find(|candidate| {
            candidate.to_string() == operation || candidate.required_scope() == operation
        })
    }
}

/// Why a token failed the structural check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MalformedReason {
    /// The token is empty or whitespace.
    Empty,
    /// The token is shorter than the configured minimum.
    TooShort {
        /// Token length.
        length: usize,
        /// Minimum length.
        minimum: usize,
    },
    /// The token does not have three `:`-separated parts.
    MissingParts,
    /// The prefix is not the configured one.
    UnrecognisedPrefix {
        /// Expected prefix.
        expected: String,
    },
    /// The scope is not kebab-case.
    InvalidScope,
    /// The nonce is too short or contains invalid characters.
    InvalidNonce,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("token is empty"),
            Self::TooShort { length, minimum } => {
                write!(f, "token has {length} characters; at least {minimum} required")
            }
            Self::MissingParts => f.write_str("token must look like <prefix>:<scope>:<nonce>"),
            Self::UnrecognisedPrefix { expected } => {
                write!(f, "token prefix is not '{expected}'")
            }
            Self::InvalidScope => f.write_str("token scope must be lowercase kebab-case"),
            Self::InvalidNonce => write!(
                f,
                "token nonce must be at least {MIN_NONCE_LEN} characters of [A-Za-z0-9_-]"
            ),
        }
    }
}

/// Errors raised by the gate. Every variant fails closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// No token was presented.
    #[error("{operation} requires an approval token scoped to '{required_scope}'")]
    MissingToken {
        /// Operation name.
        operation: String,
        /// Scope the token must carry.
        required_scope: String,
    },
    /// The token failed the structural check.
    #[error("approval token for {operation} is malformed: {reason}")]
    MalformedToken {
        /// Operation name.
        operation: String,
        /// What was wrong.
        reason: MalformedReason,
    },
    /// The token is well formed but scoped to another operation.
    #[error("approval token is scoped to '{presented}' but {operation} requires '{required}'")]
    ScopeMismatch {
        /// Operation name.
        operation: String,
        /// Scope required.
        required: String,
        /// Scope presented.
        presented: String,
    },
    /// A verifier rejected an otherwise valid token.
    #[error("approval token for {operation} was rejected: {reason}")]
    Rejected {
        /// Operation name.
        operation: String,
        /// Verifier message.
        reason: String,
    },
}

/// A structurally valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalToken {
    scope: String,
    nonce: String,
}

impl ApprovalToken {
    /// Parses `raw` against `policy`.
    ///
    /// # Errors
    ///
    /// Returns the first [`MalformedReason`] found.
    pub fn parse(raw: &str, policy: &TokenPolicy) -> Result<Self, MalformedReason> {
        if raw.trim().is_empty() {
            return Err(MalformedReason::Empty);
        }
        let length = raw.chars().count();
        if length < policy.min_length() {
            return Err(MalformedReason::TooShort {
                length,
                minimum: policy.min_length(),
            });
        }
        let mut parts = raw.splitn(3, ':');
        let (Some(prefix), Some(scope), Some(nonce)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(MalformedReason::MissingParts);
        };
        if prefix != policy.prefix() {
            return Err(MalformedReason::UnrecognisedPrefix {
                expected: policy.prefix().to_owned(),
            });
        }
        if !is_kebab_case(scope) {
            return Err(MalformedReason::InvalidScope);
        }
        let nonce_ok = nonce.len() >= MIN_NONCE_LEN
            && nonce
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !nonce_ok {
            return Err(MalformedReason::InvalidNonce);
        }
        Ok(Self {
            scope: scope.to_owned(),
            nonce: nonce.to_owned(),
        })
    }

    /// Declared scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}

fn is_kebab_case(scope: &str) -> bool {
    !scope.is_empty()
        && !scope.starts_with('-')
        && !scope.ends_with('-')
        && !scope.contains("--")
        && scope
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Extension point for authenticating tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier {
    /// Accepts or rejects a structurally valid token for `operation`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable rejection reason.
    fn verify(&self, token: &ApprovalToken, operation: DestructiveOperation)
    -> Result<(), String>;
}

/// Accepts every well-formed, correctly scoped token.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralOnly;

impl TokenVerifier for StructuralOnly {
    fn verify(
        &self,
        _token: &ApprovalToken,
        _operation: DestructiveOperation,
    ) -> Result<(), String> {
        Ok(())
    }
}

/// Proof that a destructive operation was approved.
///
/// Only the gate can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    operation: DestructiveOperation,
}

impl Authorization {
    /// Operation that was approved.
    #[must_use]
    pub const fn operation(&self) -> DestructiveOperation {
        self.operation
    }
}

/// The approval slot carried by every destructive session operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Approval<'a>(Option<&'a str>);

impl<'a> Approval<'a> {
    /// Presents a token.
    #[must_use]
    pub const fn token(token: &'a str) -> Self {
        Self(Some(token))
    }

    /// Presents nothing; the operation will be refused.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Presented token, if any.
    #[must_use]
    pub const fn as_option(self) -> Option<&'a str> {
        self.0
    }
}

impl<'a> From<Option<&'a str>> for Approval<'a> {
    fn from(token: Option<&'a str>) -> Self {
        Self(token)
    }
}

/// Validates approval tokens for destructive operations.
#[derive(Debug, Clone)]
pub struct ApprovalGate<V = StructuralOnly> {
    policy: TokenPolicy,
    verifier: V,
}

impl ApprovalGate<StructuralOnly> {
    /// Creates a gate that checks structure and scope only.
    #[must_use]
    pub const fn new(policy: TokenPolicy) -> Self {
        Self {
            policy,
            verifier: StructuralOnly,
        }
    }
}

impl<V: TokenVerifier> ApprovalGate<V> {
    /// Creates a gate that also consults `verifier`.
    #[must_use]
    pub const fn with_verifier(policy: TokenPolicy, verifier: V) -> Self {
        Self { policy, verifier }
    }

    /// Token policy in force.
    #[must_use]
    pub const fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Authorises `operation_name` against `required_scope`.
    ///
    /// Operations outside the destructive set are always allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError`] when a destructive operation lacks a valid,
    /// correctly scoped token.
    pub fn authorize(
        &self,
        operation_name: &str,
        token: Option<&str>,
        required_scope: &str,
    ) -> Result<(), ApprovalError> {
        match DestructiveOperation::classify(operation_name) {
            Some(operation) => self
                .check(operation, operation_name, token, required_scope)
                .map(|_| ()),
            None => Ok(()),
        }
    }

    /// Authorises a statically known destructive operation.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError`] when the token is missing, malformed,
    /// mis-scoped or rejected by the verifier.
    pub fn authorize_destructive(
        &self,
        operation: DestructiveOperation,
        approval: Approval<'_>,
    ) -> Result<Authorization, ApprovalError> {
        let name = operation.to_string();
        self.check(operation, &name, approval.as_option(), operation.required_scope())
    }

    fn check(
        &self,
        operation: DestructiveOperation,
        operation_name: &str,
        token: Option<&str>,
        required_scope: &str,
    ) -> Result<Authorization, ApprovalError> {
        let result = self.evaluate(operation, operation_name, token, required_scope);
        match &result {
            Ok(_) => info!(
                target: APPROVAL_TARGET,
                operation = operation_name,
                scope = required_scope,
                "destructive operation approved"
            ),
            Err(error) => warn!(
                target: APPROVAL_TARGET,
                operation = operation_name,
                scope = required_scope,
                %error,
                "destructive operation denied"
            ),
        }
        result
    }

    fn evaluate(
        &self,
        operation: DestructiveOperation,
        operation_name: &str,
        token: Option<&str>,
        required_scope: &str,
    ) -> Result<Authorization, ApprovalError> {
        let Some(raw) = token else {
            return Err(ApprovalError::MissingToken {
                operation: operation_name.to_owned(),
                required_scope: required_scope.to_owned(),
            });
        };
        let parsed = ApprovalToken::parse(raw, &self.policy).map_err(|reason| {
            ApprovalError::MalformedToken {
                operation: operation_name.to_owned(),
                reason,
            }
        })?;
        if parsed.scope() != required_scope {
            return Err(ApprovalError::ScopeMismatch {
                operation: operation_name.to_owned(),
                required: required_scope.to_owned(),
                presented: parsed.scope().to_owned(),
            });
        }
        self.verifier
            .verify(&parsed, operation)
            .map_err(|reason| ApprovalError::Rejected {
                operation: operation_name.to_owned(),
                reason,
            })?;
        Ok(Authorization { operation })
    }
}
