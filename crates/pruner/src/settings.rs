//! Project settings (`.pruner/settings.json`)

use crate::merge::MergePolicy;
use crate::result::{PrunerError, PrunerResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One question a provider asks during `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsQuestion {
    /// Settings key the answer is stored under
    pub key: &'static str,
    /// Prompt text
    pub message: &'static str,
    /// Extra guidance
    pub hint: &'static str,
}

/// Contents of the settings document
///
/// `{}` is a valid document; it is what `init` writes by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrunerSettings {
    /// Per-provider settings, keyed by provider name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
    /// How gathered coverage is merged into persisted state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_policy: Option<MergePolicy>,
}

impl PrunerSettings {
    /// Create empty settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective merge policy
    #[must_use]
    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy.unwrap_or_default()
    }

    /// Typed settings of one provider; missing section yields the default
    pub fn provider<T: DeserializeOwned + Default>(&self, name: &str) -> PrunerResult<T> {
        match self.providers.get(name) {
            Some(section) => serde_json::from_value(serde_json::Value::Object(section.clone()))
                .map_err(|e| PrunerError::settings(format!("invalid settings for {name}: {e}"))),
            None => Ok(T::default()),
        }
    }

    /// Store an answer to a provider's init question
    pub fn set_answer(&mut self, provider: &str, key: &str, value: impl Into<String>) {
        self.providers
            .entry(provider.to_owned())
            .or_default()
            .insert(key.to_owned(), serde_json::Value::String(value.into()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        working_directory: Option<String>,
    }

    #[test]
    fn test_empty_settings_serialize_to_empty_object() {
        assert_eq!(serde_json::to_string(&PrunerSettings::new()).unwrap(), "{}");
    }

    #[test]
    fn test_empty_object_is_valid() {
        let settings: PrunerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, PrunerSettings::new());
        assert_eq!(settings.merge_policy(), MergePolicy::FirstWriteWins);
    }

    #[test]
    fn test_provider_section_roundtrip() {
        let mut settings = PrunerSettings::new();
        settings.set_answer("dotnet", "workingDirectory", "src");

        let json = serde_json::to_string(&settings).unwrap();
        let back: PrunerSettings = serde_json::from_str(&json).unwrap();
        let sample: Sample = back.provider("dotnet").unwrap();
        assert_eq!(sample.working_directory.as_deref(), Some("src"));
    }

    #[test]
    fn test_missing_provider_section_is_default() {
        let sample: Sample = PrunerSettings::new().provider("dotnet").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_invalid_provider_section() {
        let settings: PrunerSettings =
            serde_json::from_str(r#"{"providers":{"dotnet":{"workingDirectory":42}}}"#).unwrap();
        let err = settings.provider::<Sample>("dotnet").unwrap_err();
        assert!(err.to_string().contains("dotnet"));
    }

    #[test]
    fn test_merge_policy_is_read() {
        let settings: PrunerSettings = serde_json::from_str(r#"{"mergePolicy":"unionCoverage"}"#).unwrap();
        assert_eq!(settings.merge_policy(), MergePolicy::UnionCoverage);
    }
}
