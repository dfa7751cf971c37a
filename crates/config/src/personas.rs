//! Persona catalog
//!
//! Static mapping from declared customer relationship to the
//! tone/content template the prompt composer applies. Built once at
//! process start and shared read-only across concurrent requests, so
//! persona lookup never takes a lock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shop_assistant_core::CustomerType;

/// Tone/content template for one customer relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// How the shopkeeper opens (e.g. extra welcoming vs. familiar).
    pub greeting_style: String,

    /// Tone directives injected verbatim into the prompt.
    pub tone_directives: Vec<String>,

    /// Topics to lean into for this relationship.
    pub topic_emphasis: Vec<String>,

    /// Sampling temperature for this persona. Stable per persona so
    /// the shopkeeper's voice is reproducible.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// Immutable customer-type -> persona mapping.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    profiles: HashMap<CustomerType, PersonaProfile>,
}

impl PersonaCatalog {
    /// Build a catalog from explicit profiles. Any tag missing from the
    /// map resolves to the general profile, which must be present.
    pub fn new(profiles: HashMap<CustomerType, PersonaProfile>) -> Self {
        debug_assert!(
            profiles.contains_key(&CustomerType::General),
            "catalog must carry a general profile"
        );
        Self { profiles }
    }

    /// The built-in shopkeeper voices.
    pub fn default_catalog() -> Self {
        let mut profiles = HashMap::new();

        profiles.insert(
            CustomerType::FirstTime,
            PersonaProfile {
                greeting_style: "Be extra welcoming and explain how the honesty box works."
                    .to_string(),
                tone_directives: vec![
                    "Warm, patient, and reassuring.".to_string(),
                    "Walk them through paying: pop the money in the box, match the label price."
                        .to_string(),
                    "Mention that taking change from the box is fine.".to_string(),
                ],
                topic_emphasis: vec![
                    "how the honesty system works".to_string(),
                    "what the shop typically stocks".to_string(),
                ],
                temperature: 0.6,
            },
        );

        profiles.insert(
            CustomerType::General,
            PersonaProfile {
                greeting_style: "Friendly village-shop warmth.".to_string(),
                tone_directives: vec![
                    "Helpful and conversational, never salesy.".to_string(),
                    "Keep it practical: stock, prices, payment.".to_string(),
                ],
                topic_emphasis: vec![
                    "fresh local produce".to_string(),
                    "payment via the honesty box".to_string(),
                ],
                temperature: 0.7,
            },
        );

        profiles.insert(
            CustomerType::Returning,
            PersonaProfile {
                greeting_style: "Friendly and familiar, like greeting a neighbour.".to_string(),
                tone_directives: vec![
                    "Skip the basics; they know how the box works.".to_string(),
                    "If they have feedback or requests, say you'll pass it to the owner."
                        .to_string(),
                ],
                topic_emphasis: vec![
                    "what's new or restocked".to_string(),
                    "passing feedback to the owner".to_string(),
                ],
                temperature: 0.7,
            },
        );

        Self::new(profiles)
    }

    /// Load a catalog from YAML keyed by wire tag. Missing entries fall
    /// back to the built-in voices so a partial file is still usable.
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::ConfigError> {
        let raw: HashMap<String, PersonaProfile> = serde_yaml::from_str(yaml)
            .map_err(|e| crate::ConfigError::ParseError(e.to_string()))?;

        let mut catalog = Self::default_catalog();
        for (tag, profile) in raw {
            catalog
                .profiles
                .insert(CustomerType::from_tag(&tag), profile);
        }
        Ok(catalog)
    }

    /// Load a YAML overlay file so deployments can re-voice the
    /// shopkeeper without a rebuild.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, crate::ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|_| {
            crate::ConfigError::FileNotFound(path.as_ref().display().to_string())
        })?;
        Self::from_yaml(&yaml)
    }

    /// Total over all tags: unknown customer types resolve to the
    /// general profile rather than failing.
    pub fn profile_for(&self, customer_type: CustomerType) -> &PersonaProfile {
        self.profiles
            .get(&customer_type)
            .or_else(|| self.profiles.get(&CustomerType::General))
            .expect("catalog always carries a general profile")
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_total_over_tags() {
        let catalog = PersonaCatalog::default_catalog();
        for ct in [
            CustomerType::FirstTime,
            CustomerType::General,
            CustomerType::Returning,
        ] {
            let profile = catalog.profile_for(ct);
            assert!(!profile.tone_directives.is_empty());
        }
    }

    #[test]
    fn test_unknown_tag_resolves_to_general() {
        let catalog = PersonaCatalog::default_catalog();
        let general = catalog.profile_for(CustomerType::General);
        let fallback = catalog.profile_for(CustomerType::from_tag("wholesale"));
        assert_eq!(general, fallback);
    }

    #[test]
    fn test_yaml_override_merges_with_defaults() {
        let yaml = r#"
returning:
  greeting_style: "Hail the regular!"
  tone_directives: ["Very familiar."]
  topic_emphasis: ["the usual order"]
  temperature: 0.5
"#;
        let catalog = PersonaCatalog::from_yaml(yaml).unwrap();
        assert_eq!(
            catalog.profile_for(CustomerType::Returning).greeting_style,
            "Hail the regular!"
        );
        // Untouched profiles keep their built-in voice.
        assert!(!catalog
            .profile_for(CustomerType::FirstTime)
            .tone_directives
            .is_empty());
    }

    #[test]
    fn test_yaml_overlay_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("personas.yaml");
        std::fs::write(
            &path,
            "first_time:\n  greeting_style: \"Welcome in!\"\n  tone_directives: [\"Gentle.\"]\n  topic_emphasis: []\n",
        )
        .unwrap();

        let catalog = PersonaCatalog::from_yaml_file(&path).unwrap();
        assert_eq!(
            catalog.profile_for(CustomerType::FirstTime).greeting_style,
            "Welcome in!"
        );

        let missing = PersonaCatalog::from_yaml_file(dir.path().join("absent.yaml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_persona_temperatures_stable() {
        let a = PersonaCatalog::default_catalog();
        let b = PersonaCatalog::default_catalog();
        assert_eq!(
            a.profile_for(CustomerType::FirstTime).temperature,
            b.profile_for(CustomerType::FirstTime).temperature
        );
    }
}
