use scholar_registry::RegistryError;
use scholar_types::{Address, CourseId, ErrorKind};
use thiserror::Error;

/// Academics operation result type
pub type Result<T> = std::result::Result<T, AcademicsError>;

/// Course and exam pipeline errors
#[derive(Debug, Error)]
pub enum AcademicsError {
    #[error("Caller {0} is not a student")]
    NotStudent(Address),

    #[error("Caller {0} is not an instructor")]
    NotInstructor(Address),

    #[error("Caller {0} is not a verified instructor")]
    NotVerifiedInstructor(Address),

    #[error("Caller {caller} is not the instructor assigned to course {course_id}")]
    NotCourseInstructor { course_id: CourseId, caller: Address },

    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("Course {0} is not approved")]
    CourseNotApproved(CourseId),

    #[error("Course {0} is already approved")]
    CourseAlreadyApproved(CourseId),

    #[error("Student {student} is not enrolled in course {course_id}")]
    NotEnrolled { student: Address, course_id: CourseId },

    #[error("No exam request exists for course {0}")]
    ExamRequestNotFound(CourseId),

    #[error("Result already submitted for {0}")]
    AlreadySubmitted(Address),

    #[error("No submitted result for {0}")]
    NoSubmission(Address),

    #[error("Score submissions are paused")]
    SubmissionsPaused,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl AcademicsError {
    /// Cross-crate failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcademicsError::NotStudent(_)
            | AcademicsError::NotInstructor(_)
            | AcademicsError::NotVerifiedInstructor(_)
            | AcademicsError::NotCourseInstructor { .. } => ErrorKind::Authorization,
            AcademicsError::CourseNotFound(_) | AcademicsError::ExamRequestNotFound(_) => {
                ErrorKind::Reference
            }
            AcademicsError::CourseNotApproved(_)
            | AcademicsError::CourseAlreadyApproved(_)
            | AcademicsError::NotEnrolled { .. }
            | AcademicsError::AlreadySubmitted(_)
            | AcademicsError::NoSubmission(_)
            | AcademicsError::SubmissionsPaused => ErrorKind::State,
            AcademicsError::Registry(inner) => inner.kind(),
        }
    }
}
