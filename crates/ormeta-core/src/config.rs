//! Registry configuration.

use serde::Deserialize;

/// What happens when a declaration would change metadata that was already served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostServePolicy {
    /// Fail with [`Error::PostServeMutation`](crate::Error::PostServeMutation).
    #[default]
    Reject,
    /// Log a warning and drop the change.
    Ignore,
}

/// Metadata registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Policy for declarations arriving after metadata was served.
    pub post_serve_policy: PostServePolicy,

    /// Require one-to-many targets to declare the `mapped_by` property as a
    /// joined-entity field.
    pub validate_mapped_by: bool,
}

impl RegistryConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            post_serve_policy: PostServePolicy::Reject,
            validate_mapped_by: true,
        }
    }

    /// Set the post-serve policy.
    pub fn with_post_serve_policy(mut self, policy: PostServePolicy) -> Self {
        self.post_serve_policy = policy;
        self
    }

    /// Enable or disable `mapped_by` validation during resolution.
    pub fn with_mapped_by_validation(mut self, enabled: bool) -> Self {
        self.validate_mapped_by = enabled;
        self
    }

    /// Skip `mapped_by` validation.
    pub fn without_mapped_by_validation(self) -> Self {
        self.with_mapped_by_validation(false)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.post_serve_policy, PostServePolicy::Reject);
        assert!(config.validate_mapped_by);
    }

    #[test]
    fn test_builder_methods() {
        let config = RegistryConfig::new()
            .with_post_serve_policy(PostServePolicy::Ignore)
            .without_mapped_by_validation();

        assert_eq!(config.post_serve_policy, PostServePolicy::Ignore);
        assert!(!config.validate_mapped_by);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"post_serve_policy": "ignore"}"#).unwrap();

        assert_eq!(config.post_serve_policy, PostServePolicy::Ignore);
        assert!(config.validate_mapped_by);
    }
}
