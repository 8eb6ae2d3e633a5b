use super::domain::{Certificate, CertificateId, Enrollment, EnrollmentId, VerificationToken};

/// Read/write projection of the enrollments held by the backend.
pub trait EnrollmentRepository: Send + Sync {
    fn upsert(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError>;
    fn fetch(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError>;
    fn list(&self) -> Result<Vec<Enrollment>, RepositoryError>;
}

/// Certificate storage. At most one certificate exists per enrollment.
pub trait CertificateRepository: Send + Sync {
    fn insert(&self, certificate: Certificate) -> Result<Certificate, RepositoryError>;
    fn update(&self, certificate: Certificate) -> Result<(), RepositoryError>;
    fn fetch(&self, id: CertificateId) -> Result<Option<Certificate>, RepositoryError>;
    fn fetch_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Certificate>, RepositoryError>;
    fn fetch_by_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Certificate>, RepositoryError>;
    fn list(&self) -> Result<Vec<Certificate>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
