//! Enrollment eligibility, certificate issuance, and public verification.

pub mod domain;
pub mod eligibility;
mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Certificate, CertificateId, CertificateStatus, Enrollment, EnrollmentError, EnrollmentId,
    EnrollmentStanding, EnrollmentStatus, Score, VerificationToken,
};
pub use eligibility::{
    can_generate_certificate, certificate_validation_details, certificate_validation_message,
    display_status, DisplayStatus, EligibilityReport, ValidationDetails, ValidationMessage,
    MIN_ATTENDANCE, MIN_PASSING_GRADE,
};
pub use lifecycle::TransitionError;
pub use repository::{CertificateRepository, EnrollmentRepository, RepositoryError};
pub use router::certificate_router;
pub use service::{CertificateService, CertificateServiceError, VerificationOutcome};
