/*!
# Course & Exam State Machine

Source of truth for the academic side of the system:

- course registration, admin approval and student enrollment;
- the per-student exam pipeline: request, instructor approval, result
  submission, optional dispute and verification;
- the process-wide submission pause flag;
- the [`TopStudentOracle`] the proposal engine queries cross-module.

All mutating entry points take the caller identity explicitly and are gated
through the role registry; guard failures abort with no partial mutation.
*/

pub mod engine;
pub mod error;
pub mod oracle;
pub mod types;

pub use engine::AcademicsEngine;
pub use error::{AcademicsError, Result};
pub use oracle::TopStudentOracle;
pub use types::{AcademicsConfig, Course, ExamRequest, ExamResult, SubmissionState};
