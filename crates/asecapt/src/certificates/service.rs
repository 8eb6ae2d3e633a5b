use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Certificate, CertificateId, CertificateStatus, Enrollment, EnrollmentId, VerificationToken,
};
use super::eligibility::{
    certificate_validation_message, EligibilityReport, ValidationDetails,
};
use super::lifecycle::TransitionError;
use super::repository::{CertificateRepository, EnrollmentRepository, RepositoryError};
use crate::config::CertificateConfig;

/// Service composing the eligibility rules, certificate lifecycle, and storage.
pub struct CertificateService<E, C> {
    enrollments: Arc<E>,
    certificates: Arc<C>,
    config: CertificateConfig,
}

static CERTIFICATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_certificate_id() -> CertificateId {
    CertificateId(CERTIFICATE_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

impl<E, C> CertificateService<E, C>
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    pub fn new(enrollments: Arc<E>, certificates: Arc<C>, config: CertificateConfig) -> Self {
        Self {
            enrollments,
            certificates,
            config,
        }
    }

    /// Store or replace the local projection of an enrollment.
    pub fn register_enrollment(
        &self,
        enrollment: Enrollment,
    ) -> Result<Enrollment, CertificateServiceError> {
        let stored = self.enrollments.upsert(enrollment)?;
        info!(enrollment_id = %stored.id, status = stored.status.label(), "enrollment registered");
        Ok(stored)
    }

    pub fn eligibility(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<EligibilityReport, CertificateServiceError> {
        let enrollment = self.enrollment(enrollment_id)?;
        let certificate = self.certificates.fetch_by_enrollment(enrollment_id)?;
        Ok(
            EligibilityReport::evaluate(&enrollment.standing(), certificate.as_ref())
                .with_enrollment(enrollment_id),
        )
    }

    /// Issue a certificate for an enrollment that passes every eligibility rule.
    pub fn generate(
        &self,
        enrollment_id: EnrollmentId,
        issue_date: NaiveDate,
    ) -> Result<Certificate, CertificateServiceError> {
        let enrollment = self.enrollment(enrollment_id)?;

        if let Some(existing) = self.certificates.fetch_by_enrollment(enrollment_id)? {
            return Err(CertificateServiceError::AlreadyIssued {
                enrollment_id,
                certificate_id: existing.id,
            });
        }

        let standing = enrollment.standing();
        let report = EligibilityReport::evaluate(&standing, None);
        if !report.can_generate {
            let message = certificate_validation_message(&standing).to_string();
            warn!(%enrollment_id, %message, "certificate generation refused");
            return Err(CertificateServiceError::Ineligible {
                enrollment_id,
                message,
                details: report.details,
            });
        }

        let expiration_date = match self.config.validity_days {
            Some(days) => Some(
                issue_date
                    .checked_add_days(Days::new(u64::from(days)))
                    .ok_or(CertificateServiceError::ExpirationOutOfRange {
                        issue_date,
                        validity_days: days,
                    })?,
            ),
            None => None,
        };

        let certificate = Certificate {
            id: next_certificate_id(),
            enrollment_id,
            status: CertificateStatus::Active,
            issue_date,
            expiration_date,
            verification_token: VerificationToken::generate(),
        };

        let stored = self.certificates.insert(certificate)?;
        info!(
            %enrollment_id,
            certificate_id = %stored.id,
            ?stored.expiration_date,
            "certificate issued"
        );
        Ok(stored)
    }

    pub fn revoke(
        &self,
        certificate_id: CertificateId,
    ) -> Result<Certificate, CertificateServiceError> {
        let mut certificate = self.certificate(certificate_id)?;
        certificate.revoke()?;
        self.certificates.update(certificate.clone())?;
        info!(%certificate_id, "certificate revoked");
        Ok(certificate)
    }

    pub fn reactivate(
        &self,
        certificate_id: CertificateId,
    ) -> Result<Certificate, CertificateServiceError> {
        let mut certificate = self.certificate(certificate_id)?;
        certificate.reactivate()?;
        self.certificates.update(certificate.clone())?;
        info!(%certificate_id, "certificate reactivated");
        Ok(certificate)
    }

    /// Public lookup behind the QR code.
    pub fn verify(
        &self,
        token: &VerificationToken,
        today: NaiveDate,
    ) -> Result<VerificationOutcome, CertificateServiceError> {
        let certificate = self
            .certificates
            .fetch_by_token(token)?
            .ok_or(RepositoryError::NotFound)?;

        // the sweep may not have run yet
        let status = if certificate.status == CertificateStatus::Active
            && certificate.is_past_expiration(today)
        {
            CertificateStatus::Expired
        } else {
            certificate.status
        };

        Ok(VerificationOutcome {
            valid: certificate.is_valid_on(today),
            status,
            certificate,
        })
    }

    /// Expire every active certificate whose expiration date is before `today`.
    pub fn expire_due(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CertificateId>, CertificateServiceError> {
        let mut expired = Vec::new();
        for mut certificate in self.certificates.list()? {
            if certificate.expire_if_due(today) {
                expired.push(certificate.id);
                self.certificates.update(certificate)?;
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), %today, "certificates expired");
        }
        Ok(expired)
    }

    pub fn certificate(
        &self,
        certificate_id: CertificateId,
    ) -> Result<Certificate, CertificateServiceError> {
        let certificate = self
            .certificates
            .fetch(certificate_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(certificate)
    }

    fn enrollment(&self, enrollment_id: EnrollmentId) -> Result<Enrollment, CertificateServiceError> {
        let enrollment = self
            .enrollments
            .fetch(enrollment_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(enrollment)
    }
}

/// Result of a public certificate lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub valid: bool,
    pub status: CertificateStatus,
    pub certificate: Certificate,
}

/// Error raised by the certificate service.
#[derive(Debug, thiserror::Error)]
pub enum CertificateServiceError {
    #[error("enrollment {enrollment_id} is not eligible for a certificate: {message}")]
    Ineligible {
        enrollment_id: EnrollmentId,
        message: String,
        details: ValidationDetails,
    },
    #[error("enrollment {enrollment_id} already has certificate {certificate_id}")]
    AlreadyIssued {
        enrollment_id: EnrollmentId,
        certificate_id: CertificateId,
    },
    #[error("{validity_days} day validity window from {issue_date} is past the calendar range")]
    ExpirationOutOfRange {
        issue_date: NaiveDate,
        validity_days: u32,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
