//! Caller identity types for Pixgate.

/// A stable user identifier, as resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried with every authenticated operation.
///
/// Constructed only by the token-verification boundary; holding an
/// `Identity` means the caller has already been verified.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub label: Option<String>,
}

impl Identity {
    pub fn new<S: Into<String>>(uid: S) -> Self {
        Self {
            user_id: UserId(uid.into()),
            label: None,
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn uid(&self) -> &str {
        self.user_id.as_str()
    }
}
