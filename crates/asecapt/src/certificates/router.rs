use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde_json::json;
use tracing::error;

use super::domain::{CertificateId, Enrollment, EnrollmentId, EnrollmentStanding, VerificationToken};
use super::eligibility::EligibilityReport;
use super::repository::{CertificateRepository, EnrollmentRepository, RepositoryError};
use super::service::{CertificateService, CertificateServiceError};

/// Router builder exposing eligibility, issuance, and verification endpoints.
pub fn certificate_router<E, C>(service: Arc<CertificateService<E, C>>) -> Router
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    Router::new()
        .route("/api/v1/eligibility", post(evaluate_handler))
        .route("/api/v1/enrollments", post(register_handler::<E, C>))
        .route(
            "/api/v1/enrollments/:enrollment_id/eligibility",
            get(eligibility_handler::<E, C>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/certificate",
            post(generate_handler::<E, C>),
        )
        .route(
            "/api/v1/certificates/:certificate_id/revoke",
            post(revoke_handler::<E, C>),
        )
        .route(
            "/api/v1/certificates/:certificate_id/reactivate",
            post(reactivate_handler::<E, C>),
        )
        .route("/api/v1/verify/:token", get(verify_handler::<E, C>))
        .with_state(service)
}

pub(crate) async fn evaluate_handler(
    payload: Result<axum::Json<EnrollmentStanding>, JsonRejection>,
) -> Response {
    let axum::Json(standing) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let report = EligibilityReport::evaluate(&standing, None);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn register_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    payload: Result<axum::Json<Enrollment>, JsonRejection>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    let axum::Json(enrollment) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.register_enrollment(enrollment) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn eligibility_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    Path(enrollment_id): Path<u64>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    match service.eligibility(EnrollmentId(enrollment_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn generate_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    Path(enrollment_id): Path<u64>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    let issue_date = Local::now().date_naive();
    match service.generate(EnrollmentId(enrollment_id), issue_date) {
        Ok(certificate) => (StatusCode::CREATED, axum::Json(certificate)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn revoke_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    Path(certificate_id): Path<u64>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    match service.revoke(CertificateId(certificate_id)) {
        Ok(certificate) => (StatusCode::OK, axum::Json(certificate)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reactivate_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    Path(certificate_id): Path<u64>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    match service.reactivate(CertificateId(certificate_id)) {
        Ok(certificate) => (StatusCode::OK, axum::Json(certificate)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verify_handler<E, C>(
    State(service): State<Arc<CertificateService<E, C>>>,
    Path(token): Path<String>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    C: CertificateRepository + 'static,
{
    let today = Local::now().date_naive();
    match service.verify(&VerificationToken(token), today) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (rejection.status(), axum::Json(payload)).into_response()
}

fn error_response(err: CertificateServiceError) -> Response {
    match err {
        CertificateServiceError::Ineligible {
            enrollment_id,
            message,
            details,
        } => {
            let payload = json!({
                "error": "enrollment is not eligible for a certificate",
                "enrollmentId": enrollment_id,
                "message": message,
                "details": details,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        err @ (CertificateServiceError::AlreadyIssued { .. }
        | CertificateServiceError::Transition(_)
        | CertificateServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        CertificateServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "record not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            error!(error = %other, "certificate request failed");
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
