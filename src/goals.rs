//! Goal catalog: competence, knowledge and skill goals per practicum profile
//!
//! Loaded once at startup from a JSON document shaped as
//! `{ profile: { "kompetencemål": string | string[], "vidensmål": [..], "færdighedsmål": [..] } }`.
//! Profile order follows the document.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Profiles whose display label differs from their catalog key
const DISPLAY_LABELS: &[(&str, &str)] = &[("Dagtilbudspædagogik – 1. praktik", "1. praktik")];

/// Competence goals come either as one paragraph or as a list of entries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CompetenceGoals {
    Single(String),
    Many(Vec<String>),
}

impl Default for CompetenceGoals {
    fn default() -> Self {
        CompetenceGoals::Many(Vec::new())
    }
}

impl CompetenceGoals {
    pub fn entries(&self) -> Vec<&str> {
        match self {
            CompetenceGoals::Single(s) => vec![s.as_str()],
            CompetenceGoals::Many(list) => list.iter().map(String::as_str).collect(),
        }
    }

    /// Entries joined one per line (the single form is used as-is)
    pub fn joined(&self) -> String {
        match self {
            CompetenceGoals::Single(s) => s.clone(),
            CompetenceGoals::Many(list) => list.join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CompetenceGoals::Single(s) => s.is_empty(),
            CompetenceGoals::Many(list) => list.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalRecord {
    #[serde(rename = "kompetencemål", default)]
    pub competence_goals: CompetenceGoals,
    #[serde(rename = "vidensmål", default)]
    pub knowledge_goals: Vec<String>,
    #[serde(rename = "færdighedsmål", default)]
    pub skill_goals: Vec<String>,
}

impl GoalRecord {
    pub fn is_empty(&self) -> bool {
        self.competence_goals.is_empty()
            && self.knowledge_goals.is_empty()
            && self.skill_goals.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalCatalog {
    profiles: IndexMap<String, GoalRecord>,
}

impl GoalCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let profiles: IndexMap<String, GoalRecord> = serde_json::from_str(json)?;
        Ok(Self { profiles })
    }

    /// Load from a file path or an http(s) URL
    pub async fn load(source: &str) -> Result<Self> {
        let json = if source.starts_with("http://") || source.starts_with("https://") {
            let response = reqwest::get(source).await?;
            if !response.status().is_success() {
                return Err(Error::Backend(format!(
                    "goal catalog {} returned status {}",
                    source,
                    response.status()
                )));
            }
            response.text().await?
        } else {
            tokio::fs::read_to_string(Path::new(source)).await?
        };

        let catalog = Self::from_json(&json)?;
        log::info!("Loaded {} profiles from {}", catalog.len(), source);
        Ok(catalog)
    }

    /// Like [`GoalCatalog::load`], but a failed load is logged and yields an empty catalog
    pub async fn load_or_empty(source: &str) -> Self {
        match Self::load(source).await {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!("Could not load goal catalog {}: {}", source, e);
                Self::empty()
            }
        }
    }

    /// Goals for a profile; unknown profiles give an empty record
    pub fn lookup(&self, profile: &str) -> GoalRecord {
        self.profiles.get(profile).cloned().unwrap_or_default()
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.profiles.contains_key(profile)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Short label shown for a profile in pickers
pub fn display_label(profile: &str) -> &str {
    DISPLAY_LABELS
        .iter()
        .find(|(key, _)| *key == profile)
        .map(|(_, label)| *label)
        .unwrap_or(profile)
}
