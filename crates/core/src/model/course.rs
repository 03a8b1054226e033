use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::CourseId;

/// Landing page used when a course has no dedicated study plan.
pub const DEFAULT_STUDY_PLAN_URL: &str = "https://learn.serrarigroup.com/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course name cannot be empty")]
    EmptyName,

    #[error("invalid study plan URL: {0}")]
    InvalidStudyPlanUrl(String),
}

/// A certification course in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    name: String,
    description: String,
    study_plan_url: Option<Url>,
}

impl Course {
    /// Create a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` for a blank name and
    /// `CourseError::InvalidStudyPlanUrl` when the link does not parse.
    pub fn new(
        id: CourseId,
        name: impl Into<String>,
        description: impl Into<String>,
        study_plan_url: Option<&str>,
    ) -> Result<Self, CourseError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CourseError::EmptyName);
        }
        let study_plan_url = study_plan_url
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| Url::parse(raw).map_err(|_| CourseError::InvalidStudyPlanUrl(raw.into())))
            .transpose()?;

        Ok(Self {
            id,
            name,
            description: description.into(),
            study_plan_url,
        })
    }

    /// Stand-in for a course id missing from the catalog: the name is the
    /// upper-cased id.
    #[must_use]
    pub fn placeholder(id: &CourseId) -> Self {
        Self {
            id: id.clone(),
            name: id.as_str().to_uppercase(),
            description: String::new(),
            study_plan_url: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn study_plan_url(&self) -> Option<&Url> {
        self.study_plan_url.as_ref()
    }

    /// Study plan link, falling back to the generic landing page.
    #[must_use]
    pub fn study_plan_link(&self) -> &str {
        self.study_plan_url
            .as_ref()
            .map_or(DEFAULT_STUDY_PLAN_URL, Url::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_upper_cases_the_id() {
        let course = Course::placeholder(&CourseId::new("hesi-exit"));
        assert_eq!(course.name(), "HESI-EXIT");
        assert_eq!(course.study_plan_link(), DEFAULT_STUDY_PLAN_URL);
    }

    #[test]
    fn rejects_bad_study_plan_url() {
        let err = Course::new(CourseId::new("acca"), "ACCA", "", Some("not a url")).unwrap_err();
        assert!(matches!(err, CourseError::InvalidStudyPlanUrl(_)));
    }

    #[test]
    fn blank_url_is_treated_as_absent() {
        let course = Course::new(CourseId::new("acca"), "ACCA", "", Some("  ")).unwrap();
        assert!(course.study_plan_url().is_none());
    }
}
