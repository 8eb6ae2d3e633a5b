use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::domain::EnrollmentStanding;
use super::rules::recorded;
use super::{ValidationDetails, MIN_ATTENDANCE, MIN_PASSING_GRADE};

/// The single reason shown next to a disabled "generate certificate" action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValidationMessage {
    NotCompleted,
    MissingGrade,
    MissingAttendance,
    MissingGradeAndAttendance,
    LowGrade { grade: f64, minimum: f64 },
    LowAttendance { attendance: f64, minimum: f64 },
    RequirementsNotMet,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMessage::NotCompleted => write!(f, "Curso no completado"),
            ValidationMessage::MissingGrade => write!(f, "Falta asignar nota final"),
            ValidationMessage::MissingAttendance => write!(f, "Falta asignar asistencia"),
            ValidationMessage::MissingGradeAndAttendance => write!(f, "Falta nota y asistencia"),
            ValidationMessage::LowGrade { grade, minimum } => {
                write!(f, "Nota insuficiente: {grade} (mín. {minimum})")
            }
            ValidationMessage::LowAttendance {
                attendance,
                minimum,
            } => write!(
                f,
                "Asistencia insuficiente: {attendance}% (mín. {minimum}%)"
            ),
            ValidationMessage::RequirementsNotMet => write!(f, "Requisitos no cumplidos"),
        }
    }
}

/// First matching condition wins; the order is part of the contract.
pub(crate) fn select_message(
    standing: &EnrollmentStanding,
    details: &ValidationDetails,
) -> ValidationMessage {
    if details.not_completed {
        return ValidationMessage::NotCompleted;
    }

    if details.missing_grade {
        return ValidationMessage::MissingGrade;
    }

    if details.missing_attendance {
        return ValidationMessage::MissingAttendance;
    }

    // Shadowed by the two checks above; kept so the published order stays intact.
    if details.missing_grade && details.missing_attendance {
        return ValidationMessage::MissingGradeAndAttendance;
    }

    if details.low_grade {
        if let Some(grade) = recorded(standing.final_grade) {
            return ValidationMessage::LowGrade {
                grade,
                minimum: MIN_PASSING_GRADE,
            };
        }
    }

    if details.low_attendance {
        if let Some(attendance) = recorded(standing.attendance_percentage) {
            return ValidationMessage::LowAttendance {
                attendance,
                minimum: MIN_ATTENDANCE,
            };
        }
    }

    ValidationMessage::RequirementsNotMet
}
