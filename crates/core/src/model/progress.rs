use thiserror::Error;

use crate::model::ids::{CourseId, StudentAddress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("completed modules ({completed}) exceed total modules ({total})")]
    CompletedExceedsTotal { completed: u32, total: u32 },
}

/// Aggregated view of a student's progress in one course.
///
/// Derived entirely from recorded sessions and recomputed on every query;
/// the client never stores it. A student/course pair with no sessions is a
/// valid state and yields the zero-valued summary, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    student: StudentAddress,
    course_id: CourseId,
    completed_modules: u32,
    total_modules: u32,
    sessions_recorded: u32,
    time_spent_s: u64,
    completion_ratio: f64,
}

impl ProgressSummary {
    /// Build a summary from aggregate counts, deriving the completion ratio.
    ///
    /// The ratio is `completed_modules / total_modules`, or zero when the
    /// course reports no modules, so it always lands in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CompletedExceedsTotal` if the counts are
    /// inconsistent.
    pub fn from_counts(
        student: StudentAddress,
        course_id: CourseId,
        completed_modules: u32,
        total_modules: u32,
        sessions_recorded: u32,
        time_spent_s: u64,
    ) -> Result<Self, ProgressError> {
        if completed_modules > total_modules {
            return Err(ProgressError::CompletedExceedsTotal {
                completed: completed_modules,
                total: total_modules,
            });
        }
        let completion_ratio = if total_modules == 0 {
            0.0
        } else {
            f64::from(completed_modules) / f64::from(total_modules)
        };
        Ok(Self {
            student,
            course_id,
            completed_modules,
            total_modules,
            sessions_recorded,
            time_spent_s,
            completion_ratio,
        })
    }

    /// The zero-valued summary for a pair with no recorded sessions.
    #[must_use]
    pub fn empty(student: StudentAddress, course_id: CourseId) -> Self {
        Self {
            student,
            course_id,
            completed_modules: 0,
            total_modules: 0,
            sessions_recorded: 0,
            time_spent_s: 0,
            completion_ratio: 0.0,
        }
    }

    #[must_use]
    pub fn student(&self) -> &StudentAddress {
        &self.student
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn completed_modules(&self) -> u32 {
        self.completed_modules
    }

    #[must_use]
    pub fn total_modules(&self) -> u32 {
        self.total_modules
    }

    #[must_use]
    pub fn sessions_recorded(&self) -> u32 {
        self.sessions_recorded
    }

    #[must_use]
    pub fn time_spent_s(&self) -> u64 {
        self.time_spent_s
    }

    /// Completion ratio in `[0, 1]`.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        self.completion_ratio
    }

    /// True when no sessions have been recorded for the pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions_recorded == 0
    }
}
