use serde::{Deserialize, Serialize};

/// The (user, organization) pair that scopes a subscriber's alert view.
///
/// Exactly one live push session and one alert feed exist per identity;
/// changing either half tears down and rebuilds both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub org_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
        }
    }

    /// Validate that both halves are non-empty and free of path separators
    /// (identity components are interpolated into request paths).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_id.is_empty() || self.org_id.is_empty() {
            return Err("identity components must not be empty");
        }
        if self.user_id.contains('/') || self.org_id.contains('/') {
            return Err("identity components must not contain '/'");
        }
        Ok(())
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user_id, self.org_id)
    }
}
