//! Task domain model.
//!
//! Tasks are created by `TaskCreated` events and mutated only through event
//! application; nothing edits a task in place outside the projection fold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Changed-fields payload for `TaskUpdated` events.
///
/// `None` leaves a field untouched. For `description`, `Some(None)` clears
/// the field while `Some(Some(text))` replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_none()
    }
}

pub fn validate_title(title: &str, limits: &LimitsConfig) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("title cannot be empty".to_string()));
    }
    if trimmed.chars().count() > limits.title_max {
        return Err(Error::Validation(format!(
            "title exceeds {} characters",
            limits.title_max
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str, limits: &LimitsConfig) -> Result<()> {
    if description.chars().count() > limits.description_max {
        return Err(Error::Validation(format!(
            "description exceeds {} characters",
            limits.description_max
        )));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String], limits: &LimitsConfig) -> Result<()> {
    if tags.len() > limits.max_tags {
        return Err(Error::Validation(format!(
            "at most {} tags allowed",
            limits.max_tags
        )));
    }
    for tag in tags {
        if tag.is_empty() {
            return Err(Error::Validation("tag cannot be empty".to_string()));
        }
        if tag.chars().count() > limits.tag_max {
            return Err(Error::Validation(format!(
                "tag '{tag}' exceeds {} characters",
                limits.tag_max
            )));
        }
        if !tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(Error::Validation(format!(
                "tag '{tag}' may only contain letters, digits, hyphen, underscore"
            )));
        }
    }
    Ok(())
}

pub fn validate_patch(patch: &TaskPatch, limits: &LimitsConfig) -> Result<()> {
    if patch.is_empty() {
        return Err(Error::Validation(
            "update must change at least one field".to_string(),
        ));
    }
    if let Some(title) = &patch.title {
        validate_title(title, limits)?;
    }
    if let Some(Some(description)) = &patch.description {
        validate_description(description, limits)?;
    }
    if let Some(tags) = &patch.tags {
        validate_tags(tags, limits)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = validate_title("   ", &limits()).expect_err("empty");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let title = "x".repeat(257);
        assert!(validate_title(&title, &limits()).is_err());
        let ok = "x".repeat(256);
        assert!(validate_title(&ok, &limits()).is_ok());
    }

    #[test]
    fn tag_charset_is_enforced() {
        let good = vec!["infra".to_string(), "p2_low".to_string(), "a-b".to_string()];
        assert!(validate_tags(&good, &limits()).is_ok());

        let bad = vec!["has space".to_string()];
        assert!(validate_tags(&bad, &limits()).is_err());
    }

    #[test]
    fn tag_count_is_bounded() {
        let tags: Vec<String> = (0..11).map(|i| format!("t{i}")).collect();
        assert!(validate_tags(&tags, &limits()).is_err());
        assert!(validate_tags(&tags[..10], &limits()).is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = validate_patch(&TaskPatch::default(), &limits()).expect_err("empty patch");
        assert!(matches!(err, Error::Validation(_)));
    }
}
