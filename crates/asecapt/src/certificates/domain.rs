use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for enrollments owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(pub u64);

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for issued certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub u64);

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque public lookup token printed on the certificate QR code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(pub String);

impl VerificationToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of an enrollment as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Suspended,
    Cancelled,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::InProgress => "in_progress",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Suspended => "suspended",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enrolled" => Some(Self::Enrolled),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "suspended" => Some(Self::Suspended),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A grade or attendance percentage on the closed `[0, 100]` scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self, EnrollmentError> {
        if value.is_nan() || !(0.0..=Self::MAX).contains(&value) {
            return Err(EnrollmentError::ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = EnrollmentError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected enrollment input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("score {0} must be within 0 and 100")]
    ScoreOutOfRange(f64),
}

/// The slice of an enrollment that decides certificate eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStanding {
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub final_grade: Option<Score>,
    #[serde(default)]
    pub attendance_percentage: Option<Score>,
}

/// A student's registration in one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub final_grade: Option<Score>,
    #[serde(default)]
    pub attendance_percentage: Option<Score>,
    pub enrollment_date: NaiveDate,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
}

impl Enrollment {
    pub fn standing(&self) -> EnrollmentStanding {
        EnrollmentStanding {
            status: self.status,
            final_grade: self.final_grade,
            attendance_percentage: self.attendance_percentage,
        }
    }
}

/// Status of an issued certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CertificateStatus::Active => "active",
            CertificateStatus::Revoked => "revoked",
            CertificateStatus::Expired => "expired",
        }
    }
}

/// Credential issued for one completed enrollment.
///
/// The token and issue date never change once issued; only `status` moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: CertificateId,
    pub enrollment_id: EnrollmentId,
    pub status: CertificateStatus,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    pub verification_token: VerificationToken,
}
