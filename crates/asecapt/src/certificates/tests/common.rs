use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::certificates::domain::{
    Certificate, CertificateId, Enrollment, EnrollmentId, EnrollmentStanding, EnrollmentStatus,
    Score, VerificationToken,
};
use crate::certificates::repository::{
    CertificateRepository, EnrollmentRepository, RepositoryError,
};
use crate::certificates::{certificate_router, CertificateService};
use crate::config::CertificateConfig;

pub(super) fn score(value: f64) -> Score {
    Score::new(value).expect("valid score")
}

pub(super) fn standing(
    status: EnrollmentStatus,
    grade: Option<f64>,
    attendance: Option<f64>,
) -> EnrollmentStanding {
    EnrollmentStanding {
        status,
        final_grade: grade.map(score),
        attendance_percentage: attendance.map(score),
    }
}

pub(super) fn completed(grade: Option<f64>, attendance: Option<f64>) -> EnrollmentStanding {
    standing(EnrollmentStatus::Completed, grade, attendance)
}

pub(super) fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date")
}

pub(super) fn enrollment(id: u64, standing: EnrollmentStanding) -> Enrollment {
    let completion_date = (standing.status == EnrollmentStatus::Completed)
        .then(|| NaiveDate::from_ymd_opt(2025, 6, 20).expect("valid date"));

    Enrollment {
        id: EnrollmentId(id),
        status: standing.status,
        final_grade: standing.final_grade,
        attendance_percentage: standing.attendance_percentage,
        enrollment_date: NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date"),
        start_date: Some(NaiveDate::from_ymd_opt(2025, 2, 3).expect("valid date")),
        completion_date,
    }
}

pub(super) fn eligible_enrollment(id: u64) -> Enrollment {
    enrollment(id, completed(Some(85.0), Some(92.5)))
}

pub(super) fn active_certificate(id: u64, enrollment_id: u64) -> Certificate {
    Certificate {
        id: CertificateId(id),
        enrollment_id: EnrollmentId(enrollment_id),
        status: crate::certificates::CertificateStatus::Active,
        issue_date: issue_date(),
        expiration_date: None,
        verification_token: VerificationToken(format!("TOKEN-{id}")),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEnrollments {
    records: Arc<Mutex<HashMap<EnrollmentId, Enrollment>>>,
}

impl EnrollmentRepository for MemoryEnrollments {
    fn upsert(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut guard = self.records.lock().expect("mutex poisoned");
        guard.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    fn fetch(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(self.records.lock().expect("mutex poisoned").get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Enrollment>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("mutex poisoned")
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCertificates {
    records: Arc<Mutex<HashMap<CertificateId, Certificate>>>,
}

impl MemoryCertificates {
    pub(super) fn stored(&self) -> Vec<Certificate> {
        self.records
            .lock()
            .expect("mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl CertificateRepository for MemoryCertificates {
    fn insert(&self, certificate: Certificate) -> Result<Certificate, RepositoryError> {
        let mut guard = self.records.lock().expect("mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.enrollment_id == certificate.enrollment_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(certificate.id, certificate.clone());
        Ok(certificate)
    }

    fn update(&self, certificate: Certificate) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("mutex poisoned");
        match guard.get_mut(&certificate.id) {
            Some(slot) => {
                *slot = certificate;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self.records.lock().expect("mutex poisoned").get(&id).cloned())
    }

    fn fetch_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("mutex poisoned")
            .values()
            .find(|certificate| certificate.enrollment_id == enrollment_id)
            .cloned())
    }

    fn fetch_by_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("mutex poisoned")
            .values()
            .find(|certificate| &certificate.verification_token == token)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Certificate>, RepositoryError> {
        Ok(self.stored())
    }
}

pub(super) struct UnavailableCertificates;

impl CertificateRepository for UnavailableCertificates {
    fn insert(&self, _certificate: Certificate) -> Result<Certificate, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn update(&self, _certificate: Certificate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn fetch(&self, _id: CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn fetch_by_enrollment(
        &self,
        _enrollment_id: EnrollmentId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn fetch_by_token(
        &self,
        _token: &VerificationToken,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Certificate>, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }
}

pub(super) type TestService = CertificateService<MemoryEnrollments, MemoryCertificates>;

pub(super) fn build_service(
    config: CertificateConfig,
) -> (Arc<TestService>, MemoryEnrollments, MemoryCertificates) {
    let enrollments = MemoryEnrollments::default();
    let certificates = MemoryCertificates::default();
    let service = Arc::new(CertificateService::new(
        Arc::new(enrollments.clone()),
        Arc::new(certificates.clone()),
        config,
    ));
    (service, enrollments, certificates)
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    certificate_router(service)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) async fn assert_status(response: Response, expected: StatusCode) -> Value {
    assert_eq!(response.status(), expected);
    json_body(response).await
}
