use asecapt::certificates::{
    Certificate, CertificateId, CertificateRepository, Enrollment, EnrollmentId,
    EnrollmentRepository, RepositoryError, VerificationToken,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in for the enrollment backend, keyed by id so listings come back ordered.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEnrollmentRepository {
    records: Arc<Mutex<BTreeMap<EnrollmentId, Enrollment>>>,
}

impl EnrollmentRepository for InMemoryEnrollmentRepository {
    fn upsert(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    fn fetch(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Enrollment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
struct CertificateTables {
    by_id: BTreeMap<CertificateId, Certificate>,
    by_enrollment: HashMap<EnrollmentId, CertificateId>,
    by_token: HashMap<VerificationToken, CertificateId>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCertificateRepository {
    tables: Arc<Mutex<CertificateTables>>,
}

impl CertificateRepository for InMemoryCertificateRepository {
    fn insert(&self, certificate: Certificate) -> Result<Certificate, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.by_id.contains_key(&certificate.id)
            || guard.by_enrollment.contains_key(&certificate.enrollment_id)
            || guard.by_token.contains_key(&certificate.verification_token)
        {
            return Err(RepositoryError::Conflict);
        }
        guard
            .by_enrollment
            .insert(certificate.enrollment_id, certificate.id);
        guard
            .by_token
            .insert(certificate.verification_token.clone(), certificate.id);
        guard.by_id.insert(certificate.id, certificate.clone());
        Ok(certificate)
    }

    fn update(&self, certificate: Certificate) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        match guard.by_id.get_mut(&certificate.id) {
            // token and enrollment are immutable, so the indexes stay valid
            Some(slot) => {
                slot.status = certificate.status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.by_id.get(&id).cloned())
    }

    fn fetch_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .by_enrollment
            .get(&enrollment_id)
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }

    fn fetch_by_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .by_token
            .get(token)
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Certificate>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.by_id.values().cloned().collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
