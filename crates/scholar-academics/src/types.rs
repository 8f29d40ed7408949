use scholar_types::{Address, CourseId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub instructor: Address,
    pub approved: bool,
}

/// One active exam request slot per course. A later `start_exam` on the same
/// course overwrites the slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExamRequest {
    pub student: Address,
    pub approved: bool,
}

/// One result slot per student across all courses. A second exam for a
/// different course writes into the same slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: u32,
    pub submitted: bool,
    pub disputed: bool,
}

/// Process-wide pause switch for submission-class operations.
/// Last writer wins; there is no queuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Active,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicsConfig {
    /// Minimum submitted, undisputed score qualifying a student for the
    /// top-student snapshot.
    pub min_top_score: u32,
}

impl Default for AcademicsConfig {
    fn default() -> Self {
        Self { min_top_score: 70 }
    }
}
