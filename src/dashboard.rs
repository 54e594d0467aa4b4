//! Clinician dashboard counters.
//!
//! Pure filters over the patient and appointment collections, recomputed
//! on every request. "Today" is passed in so results are reproducible.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Appointment, Patient, PatientStatus};

/// Patient cards shown on the dashboard.
const RECENT_PATIENTS: usize = 4;
/// Appointment rows shown on the dashboard.
const UPCOMING_APPOINTMENTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub today_appointments: usize,
    pub critical_cases: usize,
    pub pending_reports: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub date: NaiveDate,
    pub stats: DashboardStats,
    pub recent_patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
}

pub fn compute_stats(
    patients: &[Patient],
    appointments: &[Appointment],
    today: NaiveDate,
) -> DashboardStats {
    DashboardStats {
        total_patients: patients.len(),
        today_appointments: appointments.iter().filter(|a| a.date == today).count(),
        critical_cases: patients
            .iter()
            .filter(|p| p.status == PatientStatus::Critical)
            .count(),
        pending_reports: patients.iter().filter(|p| p.has_pending_report()).count(),
    }
}

/// Stats plus the leading slices of each collection, in source order.
pub fn build_view(
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    today: NaiveDate,
) -> DashboardView {
    let stats = compute_stats(&patients, &appointments, today);
    DashboardView {
        date: today,
        stats,
        recent_patients: patients.into_iter().take(RECENT_PATIENTS).collect(),
        appointments: appointments.into_iter().take(UPCOMING_APPOINTMENTS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, Report};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patient(id: &str, status: PatientStatus, reports: Vec<Report>) -> Patient {
        Patient {
            id: id.into(),
            name: format!("Patient {id}"),
            age: 40,
            gender: "Female".into(),
            condition: "Checkup".into(),
            status,
            history: None,
            medications: Vec::new(),
            last_visit: None,
            reports,
        }
    }

    fn report(reviewed: bool) -> Report {
        Report {
            id: "r".into(),
            title: "Blood panel".into(),
            reviewed,
        }
    }

    fn appointment(id: &str, on: NaiveDate) -> Appointment {
        Appointment {
            id: id.into(),
            patient_name: "Someone".into(),
            date: on,
            time: "09:00".into(),
            kind: "Follow-up".into(),
            status: AppointmentStatus::Confirmed,
        }
    }

    #[test]
    fn empty_collections_yield_zeroes() {
        assert_eq!(compute_stats(&[], &[], date(2024, 3, 1)), DashboardStats::default());
    }

    #[test]
    fn counts_each_category() {
        let today = date(2024, 3, 1);
        let patients = vec![
            patient("1", PatientStatus::Critical, vec![report(true), report(false)]),
            patient("2", PatientStatus::Stable, vec![report(true)]),
            patient("3", PatientStatus::Critical, Vec::new()),
            patient("4", PatientStatus::Recovering, vec![report(false)]),
        ];
        let appointments = vec![
            appointment("a", today),
            appointment("b", date(2024, 3, 2)),
            appointment("c", today),
            appointment("d", date(2024, 2, 29)),
        ];

        let stats = compute_stats(&patients, &appointments, today);
        assert_eq!(
            stats,
            DashboardStats {
                total_patients: 4,
                today_appointments: 2,
                critical_cases: 2,
                pending_reports: 2,
            }
        );
    }

    #[test]
    fn view_truncates_lists_but_counts_everything() {
        let today = date(2024, 3, 1);
        let patients: Vec<_> = (0..6)
            .map(|i| patient(&i.to_string(), PatientStatus::Stable, Vec::new()))
            .collect();
        let appointments: Vec<_> = (0..7).map(|i| appointment(&i.to_string(), today)).collect();

        let view = build_view(patients, appointments, today);
        assert_eq!(view.stats.total_patients, 6);
        assert_eq!(view.stats.today_appointments, 7);
        assert_eq!(view.recent_patients.len(), 4);
        assert_eq!(view.appointments.len(), 5);
        assert_eq!(view.recent_patients[0].id, "0");
    }
}
