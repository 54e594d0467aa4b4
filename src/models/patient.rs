use serde::{Deserialize, Serialize};

use super::enums::PatientStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    pub status: PatientStatus,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub last_visit: Option<String>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Patient {
    /// True when at least one attached report still awaits review.
    pub fn has_pending_report(&self) -> bool {
        self.reports.iter().any(|r| !r.reviewed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub reviewed: bool,
}
