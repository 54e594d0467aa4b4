use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: AppointmentStatus,
}
