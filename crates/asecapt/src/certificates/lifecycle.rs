use chrono::NaiveDate;

use super::domain::{Certificate, CertificateStatus};

/// Rejected certificate status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("certificate is already revoked")]
    AlreadyRevoked,
    #[error("certificate is already active")]
    AlreadyActive,
    #[error("certificate has expired and can no longer change status")]
    Expired,
}

impl Certificate {
    pub fn revoke(&mut self) -> Result<(), TransitionError> {
        match self.status {
            CertificateStatus::Active => {
                self.status = CertificateStatus::Revoked;
                Ok(())
            }
            CertificateStatus::Revoked => Err(TransitionError::AlreadyRevoked),
            CertificateStatus::Expired => Err(TransitionError::Expired),
        }
    }

    pub fn reactivate(&mut self) -> Result<(), TransitionError> {
        match self.status {
            CertificateStatus::Revoked => {
                self.status = CertificateStatus::Active;
                Ok(())
            }
            CertificateStatus::Active => Err(TransitionError::AlreadyActive),
            CertificateStatus::Expired => Err(TransitionError::Expired),
        }
    }

    /// Marks an active certificate expired once its expiration date has passed.
    /// Returns whether the status changed.
    pub fn expire_if_due(&mut self, today: NaiveDate) -> bool {
        if self.status == CertificateStatus::Active && self.is_past_expiration(today) {
            self.status = CertificateStatus::Expired;
            return true;
        }
        false
    }

    pub fn is_past_expiration(&self, today: NaiveDate) -> bool {
        self.expiration_date
            .map(|expires_on| expires_on < today)
            .unwrap_or(false)
    }

    /// Whether a public verification on `today` should accept this certificate.
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        self.status == CertificateStatus::Active && !self.is_past_expiration(today)
    }
}
