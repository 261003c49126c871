//! Participant identity captured at session start.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Experiment arm. Decides which profile drives the rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    /// Rewrites use the profile built from the participant's own choices.
    Experimental,
    /// Rewrites use the opposite profile.
    Control,
}

impl FromStr for Group {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "experimental" => Ok(Self::Experimental),
            "control" => Ok(Self::Control),
            _ => Err(SurveyError::InvalidGroup(s.trim().to_string())),
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Experimental => write!(f, "Experimental"),
            Self::Control => write!(f, "Control"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub group: Group,
}

impl Participant {
    /// Validate intake input. An empty id or an unselected group is a
    /// validation error the front end recovers from by asking again.
    pub fn new(id: &str, group: &str) -> Result<Self, SurveyError> {
        let id = id.trim();
        let group = group.trim();
        if id.is_empty() || group.is_empty() {
            return Err(SurveyError::InvalidParticipant);
        }
        Ok(Self {
            id: id.to_string(),
            group: group.parse()?,
        })
    }

    /// Label shown in the corner of every page.
    pub fn display_id(&self) -> String {
        format!("ID: {}", self.id)
    }
}
