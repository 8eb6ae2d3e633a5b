//! Certificate eligibility rules for a single enrollment.
//!
//! Every function here is total over partially graded input: a missing grade or
//! attendance value is a failing condition, never an error.

mod policy;
mod rules;

pub use policy::ValidationMessage;

use serde::{Deserialize, Serialize};

use super::domain::{Certificate, CertificateStatus, EnrollmentId, EnrollmentStanding};

/// Minimum final grade, inclusive.
pub const MIN_PASSING_GRADE: f64 = 60.0;
/// Minimum attendance percentage, inclusive.
pub const MIN_ATTENDANCE: f64 = 80.0;

/// Independent failure flags so a view can list every unmet requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub not_completed: bool,
    pub missing_grade: bool,
    pub missing_attendance: bool,
    pub low_grade: bool,
    pub low_attendance: bool,
}

impl ValidationDetails {
    pub fn is_clear(&self) -> bool {
        !(self.not_completed
            || self.missing_grade
            || self.missing_attendance
            || self.low_grade
            || self.low_attendance)
    }
}

pub fn can_generate_certificate(standing: &EnrollmentStanding) -> bool {
    rules::validation_details(standing).is_clear()
}

pub fn certificate_validation_details(standing: &EnrollmentStanding) -> ValidationDetails {
    rules::validation_details(standing)
}

pub fn certificate_validation_message(standing: &EnrollmentStanding) -> ValidationMessage {
    let details = rules::validation_details(standing);
    policy::select_message(standing, &details)
}

/// Display bucket for an enrollment and its certificate, if one was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStatus {
    NoCertificateIneligible,
    NoCertificateEligible,
    CertificateActive,
    CertificateRevoked,
    CertificateExpired,
}

impl DisplayStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DisplayStatus::NoCertificateIneligible => "no-certificate-ineligible",
            DisplayStatus::NoCertificateEligible => "no-certificate-eligible",
            DisplayStatus::CertificateActive => "certificate-active",
            DisplayStatus::CertificateRevoked => "certificate-revoked",
            DisplayStatus::CertificateExpired => "certificate-expired",
        }
    }
}

/// An issued certificate decides the bucket on its own; eligibility only
/// matters before issuance.
pub fn display_status(
    standing: &EnrollmentStanding,
    certificate: Option<&Certificate>,
) -> DisplayStatus {
    match certificate.map(|certificate| certificate.status) {
        Some(CertificateStatus::Active) => DisplayStatus::CertificateActive,
        Some(CertificateStatus::Revoked) => DisplayStatus::CertificateRevoked,
        Some(CertificateStatus::Expired) => DisplayStatus::CertificateExpired,
        None if can_generate_certificate(standing) => DisplayStatus::NoCertificateEligible,
        None => DisplayStatus::NoCertificateIneligible,
    }
}

/// Evaluation output returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<EnrollmentId>,
    pub can_generate: bool,
    pub details: ValidationDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub display_status: DisplayStatus,
}

impl EligibilityReport {
    pub fn evaluate(standing: &EnrollmentStanding, certificate: Option<&Certificate>) -> Self {
        let details = rules::validation_details(standing);
        let can_generate = details.is_clear();
        let message =
            (!can_generate).then(|| policy::select_message(standing, &details).to_string());

        Self {
            enrollment_id: None,
            can_generate,
            details,
            message,
            display_status: display_status(standing, certificate),
        }
    }

    pub fn with_enrollment(mut self, enrollment_id: EnrollmentId) -> Self {
        self.enrollment_id = Some(enrollment_id);
        self
    }
}
