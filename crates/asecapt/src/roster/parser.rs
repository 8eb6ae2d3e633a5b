use crate::certificates::{Enrollment, EnrollmentId, EnrollmentStatus, Score};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::RosterImportError;

pub(crate) fn parse_enrollments<R: Read>(reader: R) -> Result<Vec<Enrollment>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(RosterImportError::Csv)?
        .clone();
    let mut record = csv::StringRecord::new();
    let mut enrollments = Vec::new();

    // quoted fields may span lines, so report where the record starts
    while csv_reader
        .read_record(&mut record)
        .map_err(RosterImportError::Csv)?
    {
        let line = record.position().map_or(0, |position| position.line());
        let row: RosterRow = record
            .deserialize(Some(&headers))
            .map_err(RosterImportError::Csv)?;
        enrollments.push(row.into_enrollment(line)?);
    }

    Ok(enrollments)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Enrollment ID")]
    enrollment_id: u64,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Final Grade", default, deserialize_with = "empty_string_as_none")]
    final_grade: Option<String>,
    #[serde(rename = "Attendance", default, deserialize_with = "empty_string_as_none")]
    attendance: Option<String>,
    #[serde(rename = "Enrollment Date")]
    enrollment_date: String,
    #[serde(
        rename = "Completion Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    completion_date: Option<String>,
}

impl RosterRow {
    fn into_enrollment(self, line: u64) -> Result<Enrollment, RosterImportError> {
        let status = EnrollmentStatus::from_label(&self.status).ok_or_else(|| {
            RosterImportError::InvalidRow {
                line,
                detail: format!("unknown status '{}'", self.status),
            }
        })?;

        Ok(Enrollment {
            id: EnrollmentId(self.enrollment_id),
            status,
            final_grade: parse_score(self.final_grade.as_deref(), "final grade", line)?,
            attendance_percentage: parse_score(self.attendance.as_deref(), "attendance", line)?,
            enrollment_date: parse_date(&self.enrollment_date, line)?,
            start_date: None,
            completion_date: self
                .completion_date
                .as_deref()
                .map(|raw| parse_date(raw, line))
                .transpose()?,
        })
    }
}

fn parse_score(
    raw: Option<&str>,
    field: &str,
    line: u64,
) -> Result<Option<Score>, RosterImportError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let value = raw
        .trim()
        .trim_end_matches('%')
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| RosterImportError::InvalidRow {
            line,
            detail: format!("{field} '{raw}' is not a number"),
        })?;

    Score::new(value)
        .map(Some)
        .map_err(|err| RosterImportError::InvalidRow {
            line,
            detail: format!("{field}: {err}"),
        })
}

fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, RosterImportError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| RosterImportError::InvalidRow {
        line,
        detail: format!("date '{raw}' must be YYYY-MM-DD"),
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
