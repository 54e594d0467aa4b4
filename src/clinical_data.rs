//! Patient and appointment sources for the clinician dashboard.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::models::{Appointment, AppointmentStatus, Patient, PatientStatus, Report};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Clinical data unavailable: {0}")]
    Unavailable(String),
}

/// Read access to clinical records.
pub trait ClinicalData: Send + Sync {
    fn patients(&self) -> Result<Vec<Patient>, DataError>;
    fn appointments(&self) -> Result<Vec<Appointment>, DataError>;

    fn find_patient(&self, id: &str) -> Result<Option<Patient>, DataError> {
        Ok(self.patients()?.into_iter().find(|p| p.id == id))
    }
}

/// Fixed demo records. Appointment dates are relative to `anchor`.
pub struct MockClinicalData {
    anchor: NaiveDate,
}

impl MockClinicalData {
    pub fn new(anchor: NaiveDate) -> Self {
        Self { anchor }
    }
}

fn meds(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn report(id: &str, title: &str, reviewed: bool) -> Report {
    Report {
        id: id.into(),
        title: title.into(),
        reviewed,
    }
}

impl ClinicalData for MockClinicalData {
    fn patients(&self) -> Result<Vec<Patient>, DataError> {
        Ok(vec![
            Patient {
                id: "p-001".into(),
                name: "Sarah Johnson".into(),
                age: 45,
                gender: "Female".into(),
                condition: "Hypertension".into(),
                status: PatientStatus::Stable,
                history: Some("Family history of cardiovascular disease".into()),
                medications: meds(&["Lisinopril 10mg", "Aspirin 81mg"]),
                last_visit: Some("2024-01-15".into()),
                reports: vec![report("r-101", "Lipid panel", true)],
            },
            Patient {
                id: "p-002".into(),
                name: "Michael Chen".into(),
                age: 62,
                gender: "Male".into(),
                condition: "Type 2 Diabetes".into(),
                status: PatientStatus::Critical,
                history: Some("Diagnosed 2015, neuropathy since 2021".into()),
                medications: meds(&["Metformin 1000mg", "Insulin glargine"]),
                last_visit: Some("2024-01-18".into()),
                reports: vec![
                    report("r-201", "HbA1c", true),
                    report("r-202", "Renal function", false),
                ],
            },
            Patient {
                id: "p-003".into(),
                name: "Emily Davis".into(),
                age: 29,
                gender: "Female".into(),
                condition: "Asthma".into(),
                status: PatientStatus::Recovering,
                history: None,
                medications: meds(&["Albuterol inhaler"]),
                last_visit: Some("2024-01-10".into()),
                reports: Vec::new(),
            },
            Patient {
                id: "p-004".into(),
                name: "Robert Wilson".into(),
                age: 71,
                gender: "Male".into(),
                condition: "Congestive heart failure".into(),
                status: PatientStatus::Critical,
                history: Some("Myocardial infarction 2019".into()),
                medications: meds(&["Furosemide 40mg", "Carvedilol 12.5mg", "Spironolactone 25mg"]),
                last_visit: Some("2024-01-19".into()),
                reports: vec![report("r-401", "Echocardiogram", false)],
            },
            Patient {
                id: "p-005".into(),
                name: "Aisha Patel".into(),
                age: 38,
                gender: "Female".into(),
                condition: "Migraine".into(),
                status: PatientStatus::Monitoring,
                history: None,
                medications: Vec::new(),
                last_visit: None,
                reports: Vec::new(),
            },
        ])
    }

    fn appointments(&self) -> Result<Vec<Appointment>, DataError> {
        let today = self.anchor;
        let tomorrow = today + Duration::days(1);
        let slot = |id: &str, name: &str, date: NaiveDate, time: &str, kind: &str, status| {
            Appointment {
                id: id.into(),
                patient_name: name.into(),
                date,
                time: time.into(),
                kind: kind.into(),
                status,
            }
        };
        Ok(vec![
            slot("a-1", "Sarah Johnson", today, "09:00", "Follow-up", AppointmentStatus::Confirmed),
            slot("a-2", "Michael Chen", today, "10:30", "Urgent review", AppointmentStatus::Confirmed),
            slot("a-3", "Emily Davis", today, "14:00", "Consultation", AppointmentStatus::Pending),
            slot("a-4", "Robert Wilson", tomorrow, "11:15", "Cardiology", AppointmentStatus::Confirmed),
            slot("a-5", "Aisha Patel", tomorrow, "15:45", "Neurology", AppointmentStatus::Pending),
        ])
    }
}
