use crate::infra::{InMemoryCertificateRepository, InMemoryEnrollmentRepository};
use asecapt::certificates::{
    CertificateService, Enrollment, EnrollmentId, EnrollmentStatus, Score,
};
use asecapt::config::CertificateConfig;
use asecapt::error::AppError;
use asecapt::roster::{RosterImporter, RosterSummary};
use chrono::{Days, Duration, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RosterReportArgs {
    /// Roster CSV export to evaluate
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the summary as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Issue date used for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Certificate validity in days; omit for certificates that never expire.
    #[arg(long)]
    pub(crate) validity_days: Option<u32>,
}

pub(crate) fn run_roster_report(args: RosterReportArgs) -> Result<(), AppError> {
    let RosterReportArgs { csv, json } = args;

    let enrollments = RosterImporter::from_path(&csv)?;
    let summary = RosterSummary::evaluate(&enrollments);

    if json {
        let payload = serde_json::to_string_pretty(&summary)?;
        println!("{payload}");
        return Ok(());
    }

    println!("Roster eligibility: {}", csv.display());
    for report in &summary.reports {
        let id = report
            .enrollment_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &report.message {
            Some(message) => println!(
                "- enrollment {id}: {} ({message})",
                report.display_status.label()
            ),
            None => println!("- enrollment {id}: {}", report.display_status.label()),
        }
    }
    println!(
        "\n{} enrollments | {} eligible | {} ineligible",
        summary.total, summary.eligible, summary.ineligible
    );

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        validity_days,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let service = CertificateService::new(
        Arc::new(InMemoryEnrollmentRepository::default()),
        Arc::new(InMemoryCertificateRepository::default()),
        CertificateConfig { validity_days },
    );

    println!("Certificate workflow demo (issue date {today})");
    println!("\nEnrollments");
    for enrollment in demo_enrollments(today) {
        let id = enrollment.id;
        let stored = match service.register_enrollment(enrollment) {
            Ok(stored) => stored,
            Err(err) => {
                println!("  Enrollment {id} rejected: {err}");
                continue;
            }
        };
        match service.eligibility(id) {
            Ok(report) => println!(
                "- {} [{}] -> {}{}",
                id,
                stored.status.label(),
                report.display_status.label(),
                report
                    .message
                    .map(|message| format!(" ({message})"))
                    .unwrap_or_default()
            ),
            Err(err) => println!("- {id}: eligibility unavailable: {err}"),
        }
    }

    println!("\nIssuance");
    let mut issued = Vec::new();
    for id in [1, 2, 3, 4].map(EnrollmentId) {
        match service.generate(id, today) {
            Ok(certificate) => {
                println!(
                    "- enrollment {id}: certificate {} token {}",
                    certificate.id,
                    certificate.verification_token.as_str()
                );
                issued.push(certificate);
            }
            Err(err) => println!("- enrollment {id}: {err}"),
        }
    }

    let Some(certificate) = issued.first() else {
        println!("\nNo certificates issued; skipping lifecycle walkthrough");
        return Ok(());
    };

    println!("\nLifecycle for certificate {}", certificate.id);
    for step in ["revoke", "revoke", "reactivate"] {
        let result = match step {
            "revoke" => service.revoke(certificate.id),
            _ => service.reactivate(certificate.id),
        };
        match result {
            Ok(updated) => println!("- {step}: now {}", updated.status.label()),
            Err(err) => println!("- {step}: refused ({err})"),
        }
    }

    println!("\nVerification");
    let mut checkpoints = vec![today];
    if let Some(after_expiry) = validity_days
        .and_then(|days| today.checked_add_days(Days::new(u64::from(days) + 1)))
    {
        checkpoints.push(after_expiry);
    }
    for day in checkpoints {
        if let Err(err) = service.expire_due(day) {
            println!("- expiration sweep unavailable: {err}");
        }
        match service.verify(&certificate.verification_token, day) {
            Ok(outcome) => println!(
                "- {day}: {} ({})",
                if outcome.valid { "valid" } else { "not valid" },
                outcome.status.label()
            ),
            Err(err) => println!("- {day}: lookup failed: {err}"),
        }
    }

    Ok(())
}

fn demo_enrollments(today: NaiveDate) -> Vec<Enrollment> {
    let enrolled_on = today - Duration::days(180);
    let started_on = today - Duration::days(160);
    let rows: [(u64, EnrollmentStatus, Option<f64>, Option<f64>); 4] = [
        (1, EnrollmentStatus::Completed, Some(86.0), Some(94.0)),
        (2, EnrollmentStatus::Completed, Some(59.9), Some(97.0)),
        (3, EnrollmentStatus::InProgress, None, Some(70.0)),
        (4, EnrollmentStatus::Completed, None, None),
    ];

    rows.into_iter()
        .map(|(id, status, grade, attendance)| Enrollment {
            id: EnrollmentId(id),
            status,
            final_grade: grade.and_then(|value| Score::new(value).ok()),
            attendance_percentage: attendance.and_then(|value| Score::new(value).ok()),
            enrollment_date: enrolled_on,
            start_date: Some(started_on),
            completion_date: (status == EnrollmentStatus::Completed).then_some(today),
        })
        .collect()
}
