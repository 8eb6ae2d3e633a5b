//! Batch eligibility over a CSV roster export.

mod parser;

use crate::certificates::{EligibilityReport, Enrollment};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, detail: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { line, detail } => {
                write!(f, "roster line {}: {}", line, detail)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Enrollment>, RosterImportError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Enrollment>, RosterImportError> {
        parser::parse_enrollments(reader)
    }
}

/// Eligibility totals for an imported roster. Roster rows carry no certificates,
/// so every report lands in one of the two "no certificate" buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub total: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub reports: Vec<EligibilityReport>,
}

impl RosterSummary {
    pub fn evaluate(enrollments: &[Enrollment]) -> Self {
        let reports: Vec<EligibilityReport> = enrollments
            .iter()
            .map(|enrollment| {
                EligibilityReport::evaluate(&enrollment.standing(), None)
                    .with_enrollment(enrollment.id)
            })
            .collect();
        let eligible = reports.iter().filter(|report| report.can_generate).count();

        Self {
            total: reports.len(),
            eligible,
            ineligible: reports.len() - eligible,
            reports,
        }
    }
}
