use std::sync::Arc;

use chrono::Duration;

use super::common::*;
use crate::certificates::domain::{CertificateStatus, EnrollmentId, EnrollmentStatus};
use crate::certificates::repository::RepositoryError;
use crate::certificates::{
    CertificateService, CertificateServiceError, DisplayStatus, TransitionError,
};
use crate::config::CertificateConfig;

#[test]
fn generate_issues_active_certificate_for_eligible_enrollment() {
    let (service, _, certificates) = build_service(CertificateConfig::default());
    service
        .register_enrollment(eligible_enrollment(1))
        .expect("enrollment stored");

    let certificate = service
        .generate(EnrollmentId(1), issue_date())
        .expect("certificate issued");

    assert_eq!(certificate.enrollment_id, EnrollmentId(1));
    assert_eq!(certificate.status, CertificateStatus::Active);
    assert_eq!(certificate.issue_date, issue_date());
    assert!(certificate.expiration_date.is_none());
    assert!(!certificate.verification_token.as_str().is_empty());
    assert_eq!(certificates.stored(), vec![certificate]);
}

#[test]
fn generate_applies_configured_validity_window() {
    let (service, _, _) = build_service(CertificateConfig {
        validity_days: Some(365),
    });
    service
        .register_enrollment(eligible_enrollment(2))
        .expect("enrollment stored");

    let certificate = service
        .generate(EnrollmentId(2), issue_date())
        .expect("certificate issued");

    assert_eq!(
        certificate.expiration_date,
        Some(issue_date() + Duration::days(365))
    );
}

#[test]
fn generate_rejects_validity_window_past_calendar_range() {
    let (service, _, certificates) = build_service(CertificateConfig {
        validity_days: Some(u32::MAX),
    });
    service
        .register_enrollment(eligible_enrollment(20))
        .expect("enrollment stored");

    let err = service
        .generate(EnrollmentId(20), issue_date())
        .expect_err("window cannot be represented");

    match err {
        CertificateServiceError::ExpirationOutOfRange {
            issue_date: from,
            validity_days,
        } => {
            assert_eq!(from, issue_date());
            assert_eq!(validity_days, u32::MAX);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(certificates.stored().is_empty());
}

#[test]
fn generate_refuses_ineligible_enrollment_with_reason() {
    let (service, _, certificates) = build_service(CertificateConfig::default());
    service
        .register_enrollment(enrollment(3, completed(Some(55.0), Some(90.0))))
        .expect("enrollment stored");

    let err = service
        .generate(EnrollmentId(3), issue_date())
        .expect_err("low grade refused");

    match err {
        CertificateServiceError::Ineligible {
            enrollment_id,
            message,
            details,
        } => {
            assert_eq!(enrollment_id, EnrollmentId(3));
            assert_eq!(message, "Nota insuficiente: 55 (mín. 60)");
            assert!(details.low_grade);
        }
        other => panic!("expected ineligible error, got {other:?}"),
    }
    assert!(certificates.stored().is_empty());
}

#[test]
fn generate_refuses_second_certificate() {
    let (service, _, _) = build_service(CertificateConfig::default());
    service
        .register_enrollment(eligible_enrollment(4))
        .expect("enrollment stored");
    let first = service
        .generate(EnrollmentId(4), issue_date())
        .expect("first issue");

    let err = service
        .generate(EnrollmentId(4), issue_date())
        .expect_err("duplicate refused");

    match err {
        CertificateServiceError::AlreadyIssued {
            enrollment_id,
            certificate_id,
        } => {
            assert_eq!(enrollment_id, EnrollmentId(4));
            assert_eq!(certificate_id, first.id);
        }
        other => panic!("expected already issued, got {other:?}"),
    }
}

#[test]
fn generate_reports_unknown_enrollment() {
    let (service, _, _) = build_service(CertificateConfig::default());

    let err = service
        .generate(EnrollmentId(404), issue_date())
        .expect_err("unknown enrollment");

    assert!(matches!(
        err,
        CertificateServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn eligibility_reflects_certificate_lifecycle() {
    let (service, _, _) = build_service(CertificateConfig::default());
    service
        .register_enrollment(eligible_enrollment(5))
        .expect("enrollment stored");

    let before = service.eligibility(EnrollmentId(5)).expect("report");
    assert_eq!(before.enrollment_id, Some(EnrollmentId(5)));
    assert_eq!(before.display_status, DisplayStatus::NoCertificateEligible);

    let certificate = service
        .generate(EnrollmentId(5), issue_date())
        .expect("issued");
    let issued = service.eligibility(EnrollmentId(5)).expect("report");
    assert_eq!(issued.display_status, DisplayStatus::CertificateActive);

    service.revoke(certificate.id).expect("revoked");
    let revoked = service.eligibility(EnrollmentId(5)).expect("report");
    assert_eq!(revoked.display_status, DisplayStatus::CertificateRevoked);

    service.reactivate(certificate.id).expect("reactivated");
    let reactivated = service.eligibility(EnrollmentId(5)).expect("report");
    assert_eq!(reactivated.display_status, DisplayStatus::CertificateActive);
}

#[test]
fn revoke_and_reactivate_skip_eligibility_checks() {
    let (service, _, _) = build_service(CertificateConfig::default());
    service
        .register_enrollment(eligible_enrollment(6))
        .expect("enrollment stored");
    let certificate = service
        .generate(EnrollmentId(6), issue_date())
        .expect("issued");

    // backend later downgrades the enrollment
    service
        .register_enrollment(enrollment(
            6,
            standing(EnrollmentStatus::Suspended, Some(85.0), Some(90.0)),
        ))
        .expect("enrollment updated");

    let revoked = service.revoke(certificate.id).expect("revoked");
    assert_eq!(revoked.status, CertificateStatus::Revoked);
    let reactivated = service.reactivate(certificate.id).expect("reactivated");
    assert_eq!(reactivated.status, CertificateStatus::Active);
}

#[test]
fn double_revoke_surfaces_transition_error() {
    let (service, _, _) = build_service(CertificateConfig::default());
    service
        .register_enrollment(eligible_enrollment(7))
        .expect("enrollment stored");
    let certificate = service
        .generate(EnrollmentId(7), issue_date())
        .expect("issued");
    service.revoke(certificate.id).expect("revoked");

    let err = service.revoke(certificate.id).expect_err("already revoked");

    assert!(matches!(
        err,
        CertificateServiceError::Transition(TransitionError::AlreadyRevoked)
    ));
}

#[test]
fn verify_reports_validity_by_token() {
    let (service, _, _) = build_service(CertificateConfig {
        validity_days: Some(30),
    });
    service
        .register_enrollment(eligible_enrollment(8))
        .expect("enrollment stored");
    let certificate = service
        .generate(EnrollmentId(8), issue_date())
        .expect("issued");

    let outcome = service
        .verify(&certificate.verification_token, issue_date())
        .expect("token found");
    assert!(outcome.valid);
    assert_eq!(outcome.status, CertificateStatus::Active);
    assert_eq!(outcome.certificate.id, certificate.id);

    let late = service
        .verify(&certificate.verification_token, issue_date() + Duration::days(31))
        .expect("token found");
    assert!(!late.valid);
    assert_eq!(late.status, CertificateStatus::Expired);
    assert_eq!(late.certificate.status, CertificateStatus::Active);

    service.revoke(certificate.id).expect("revoked");
    let revoked = service
        .verify(&certificate.verification_token, issue_date())
        .expect("token found");
    assert!(!revoked.valid);
    assert_eq!(revoked.status, CertificateStatus::Revoked);
}

#[test]
fn verify_unknown_token_is_not_found() {
    let (service, _, _) = build_service(CertificateConfig::default());

    let err = service
        .verify(
            &crate::certificates::VerificationToken("UNKNOWN".to_string()),
            issue_date(),
        )
        .expect_err("unknown token");

    assert!(matches!(
        err,
        CertificateServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn expire_due_sweeps_only_past_due_active_certificates() {
    let (service, _, certificates) = build_service(CertificateConfig {
        validity_days: Some(10),
    });
    for id in [20, 21] {
        service
            .register_enrollment(eligible_enrollment(id))
            .expect("enrollment stored");
    }
    let due = service
        .generate(EnrollmentId(20), issue_date())
        .expect("issued");
    let revoked = service
        .generate(EnrollmentId(21), issue_date())
        .expect("issued");
    service.revoke(revoked.id).expect("revoked");

    let untouched = service
        .expire_due(issue_date() + Duration::days(10))
        .expect("sweep runs");
    assert!(untouched.is_empty());

    let expired = service
        .expire_due(issue_date() + Duration::days(11))
        .expect("sweep runs");
    assert_eq!(expired, vec![due.id]);

    let statuses: Vec<_> = certificates
        .stored()
        .into_iter()
        .map(|certificate| (certificate.id, certificate.status))
        .collect();
    assert!(statuses.contains(&(due.id, CertificateStatus::Expired)));
    assert!(statuses.contains(&(revoked.id, CertificateStatus::Revoked)));
}

#[test]
fn repository_outage_is_propagated() {
    let service = CertificateService::new(
        Arc::new(MemoryEnrollments::default()),
        Arc::new(UnavailableCertificates),
        CertificateConfig::default(),
    );
    service
        .register_enrollment(eligible_enrollment(30))
        .expect("enrollment stored");

    let err = service
        .generate(EnrollmentId(30), issue_date())
        .expect_err("outage");

    assert!(matches!(
        err,
        CertificateServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}
