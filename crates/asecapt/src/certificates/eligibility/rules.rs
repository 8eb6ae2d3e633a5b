use super::super::domain::{EnrollmentStanding, EnrollmentStatus, Score};
use super::{ValidationDetails, MIN_ATTENDANCE, MIN_PASSING_GRADE};

pub(crate) fn validation_details(standing: &EnrollmentStanding) -> ValidationDetails {
    let grade = recorded(standing.final_grade);
    let attendance = recorded(standing.attendance_percentage);

    ValidationDetails {
        not_completed: standing.status != EnrollmentStatus::Completed,
        missing_grade: grade.is_none(),
        missing_attendance: attendance.is_none(),
        low_grade: grade.is_some_and(|value| value < MIN_PASSING_GRADE),
        low_attendance: attendance.is_some_and(|value| value < MIN_ATTENDANCE),
    }
}

/// A score of zero counts as not yet recorded.
pub(crate) fn recorded(score: Option<Score>) -> Option<f64> {
    score.map(Score::value).filter(|value| *value > 0.0)
}
