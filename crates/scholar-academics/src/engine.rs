use crate::types::{AcademicsConfig, Course, ExamRequest, ExamResult, SubmissionState};
use crate::{AcademicsError, Result};
use chrono::Utc;
use scholar_events::{EventBus, SystemEvent};
use scholar_registry::{AccessController, RoleRegistry};
use scholar_types::{Address, CourseId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

struct AcademicsBook {
    courses: HashMap<CourseId, Course>,
    next_course_id: CourseId,
    enrollments: HashMap<Address, Vec<CourseId>>,
    exam_requests: HashMap<CourseId, ExamRequest>,
    exam_results: HashMap<Address, ExamResult>,
    submissions: SubmissionState,
}

/// Course and exam state machine.
///
/// Guards run first, then all local mutation happens under one write guard,
/// then the success event fires. There is no external interaction anywhere in
/// this engine.
pub struct AcademicsEngine {
    access: Arc<AccessController>,
    roles: Arc<RoleRegistry>,
    config: AcademicsConfig,
    book: RwLock<AcademicsBook>,
    events: EventBus,
}

impl AcademicsEngine {
    pub fn new(
        access: Arc<AccessController>,
        roles: Arc<RoleRegistry>,
        config: AcademicsConfig,
        events: EventBus,
    ) -> Self {
        Self {
            access,
            roles,
            config,
            book: RwLock::new(AcademicsBook {
                courses: HashMap::new(),
                next_course_id: 1,
                enrollments: HashMap::new(),
                exam_requests: HashMap::new(),
                exam_results: HashMap::new(),
                submissions: SubmissionState::Active,
            }),
            events,
        }
    }

    async fn require_student(&self, caller: Address) -> Result<()> {
        if !self.roles.is_student(caller).await {
            return Err(AcademicsError::NotStudent(caller));
        }
        Ok(())
    }

    async fn require_instructor(&self, caller: Address) -> Result<()> {
        if !self.roles.is_instructor(caller).await {
            return Err(AcademicsError::NotInstructor(caller));
        }
        Ok(())
    }

    async fn require_verified_instructor(&self, caller: Address) -> Result<()> {
        if !self.roles.is_verified_instructor(caller).await {
            return Err(AcademicsError::NotVerifiedInstructor(caller));
        }
        Ok(())
    }

    /// Register a course. Instructor-only; allocates the next dense id.
    pub async fn register_course(&self, caller: Address, name: String) -> Result<CourseId> {
        self.require_instructor(caller).await?;

        let mut book = self.book.write().await;
        let id = book.next_course_id;
        book.next_course_id += 1;
        book.courses.insert(
            id,
            Course {
                id,
                name: name.clone(),
                instructor: caller,
                approved: false,
            },
        );
        drop(book);

        info!(course_id = id, name = %name, instructor = %caller, "📚 Course registered");
        self.events.emit(SystemEvent::CourseRegistered {
            course_id: id,
            name,
            instructor: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(id)
    }

    /// Approve a course. Admin-gated; approval is one-way and re-approval is
    /// rejected.
    pub async fn approve_course(&self, caller: Address, course_id: CourseId) -> Result<()> {
        self.access.require_root(caller).await?;

        let mut book = self.book.write().await;
        let course = book
            .courses
            .get_mut(&course_id)
            .ok_or(AcademicsError::CourseNotFound(course_id))?;
        if course.approved {
            return Err(AcademicsError::CourseAlreadyApproved(course_id));
        }
        course.approved = true;
        drop(book);

        info!(course_id, "✅ Course approved");
        self.events.emit(SystemEvent::CourseApproved {
            course_id,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Enroll the calling student in an approved course. The enrollment
    /// sequence is append-only and not de-duplicated.
    pub async fn enroll_in_course(&self, caller: Address, course_id: CourseId) -> Result<()> {
        self.require_student(caller).await?;

        let mut book = self.book.write().await;
        let course = book
            .courses
            .get(&course_id)
            .ok_or(AcademicsError::CourseNotFound(course_id))?;
        if !course.approved {
            return Err(AcademicsError::CourseNotApproved(course_id));
        }
        book.enrollments.entry(caller).or_default().push(course_id);
        drop(book);

        info!(course_id, student = %caller, "📝 Student enrolled");
        self.events.emit(SystemEvent::StudentEnrolled {
            course_id,
            student: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Request an exam for a course the caller is enrolled in. Overwrites the
    /// course's single request slot.
    pub async fn start_exam(&self, caller: Address, course_id: CourseId) -> Result<()> {
        self.require_student(caller).await?;

        let mut book = self.book.write().await;
        if !book.courses.contains_key(&course_id) {
            return Err(AcademicsError::CourseNotFound(course_id));
        }
        let enrolled = book
            .enrollments
            .get(&caller)
            .is_some_and(|courses| courses.contains(&course_id));
        if !enrolled {
            return Err(AcademicsError::NotEnrolled {
                student: caller,
                course_id,
            });
        }

        if book.exam_requests.contains_key(&course_id) {
            warn!(course_id, "Overwriting existing exam request slot");
        }
        book.exam_requests.insert(
            course_id,
            ExamRequest {
                student: caller,
                approved: false,
            },
        );
        drop(book);

        info!(course_id, student = %caller, "🎫 Exam requested");
        self.events.emit(SystemEvent::ExamStarted {
            course_id,
            student: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Approve the pending exam request on a course. Verified-instructor-only
    /// and restricted to the course's assigned instructor.
    pub async fn approve_exam(&self, caller: Address, course_id: CourseId) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let mut book = self.book.write().await;
        let course = book
            .courses
            .get(&course_id)
            .ok_or(AcademicsError::CourseNotFound(course_id))?;
        if course.instructor != caller {
            return Err(AcademicsError::NotCourseInstructor { course_id, caller });
        }
        let request = book
            .exam_requests
            .get_mut(&course_id)
            .ok_or(AcademicsError::ExamRequestNotFound(course_id))?;
        request.approved = true;
        let student = request.student;
        drop(book);

        info!(course_id, student = %student, "✅ Exam approved");
        self.events.emit(SystemEvent::ExamApproved {
            course_id,
            student: student.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Submit a result into a student's slot. Verified-instructor-only,
    /// blocked while submissions are paused, and the slot must not already be
    /// submitted.
    pub async fn submit_exam_result(
        &self,
        caller: Address,
        student: Address,
        score: u32,
    ) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let mut book = self.book.write().await;
        if book.submissions == SubmissionState::Paused {
            return Err(AcademicsError::SubmissionsPaused);
        }
        if book.exam_results.get(&student).is_some_and(|r| r.submitted) {
            return Err(AcademicsError::AlreadySubmitted(student));
        }
        book.exam_results.insert(
            student,
            ExamResult {
                score,
                submitted: true,
                disputed: false,
            },
        );
        drop(book);

        info!(student = %student, score, submitted_by = %caller, "🧾 Result submitted");
        self.events.emit(SystemEvent::ResultSubmitted {
            student: student.to_string(),
            score,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Overwrite a student's score unconditionally. Any verified instructor
    /// may do this; there is no ownership check against course assignment.
    pub async fn update_score_history(
        &self,
        caller: Address,
        student: Address,
        score: u32,
    ) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let mut book = self.book.write().await;
        if book.submissions == SubmissionState::Paused {
            return Err(AcademicsError::SubmissionsPaused);
        }
        let entry = book.exam_results.entry(student).or_insert(ExamResult {
            score: 0,
            submitted: false,
            disputed: false,
        });
        entry.score = score;
        entry.submitted = true;
        drop(book);

        info!(student = %student, score, updated_by = %caller, "♻️ Score overwritten");
        self.events.emit(SystemEvent::ScoreUpdated {
            student: student.to_string(),
            score,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Dispute the caller's own submitted score.
    pub async fn dispute_score(&self, caller: Address) -> Result<()> {
        self.require_student(caller).await?;

        let mut book = self.book.write().await;
        let result = book
            .exam_results
            .get_mut(&caller)
            .filter(|r| r.submitted)
            .ok_or(AcademicsError::NoSubmission(caller))?;
        result.disputed = true;
        drop(book);

        info!(student = %caller, "⚖️ Score disputed");
        self.events.emit(SystemEvent::ScoreDisputed {
            student: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Attest a student's submitted score. Purely informational: emits the
    /// notification and mutates nothing, including the dispute flag.
    pub async fn verify_score(&self, caller: Address, student: Address) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let book = self.book.read().await;
        if !book.exam_results.get(&student).is_some_and(|r| r.submitted) {
            return Err(AcademicsError::NoSubmission(student));
        }
        drop(book);

        info!(student = %student, verifier = %caller, "🔎 Score verified");
        self.events.emit(SystemEvent::ScoreVerified {
            student: student.to_string(),
            verifier: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Pause submission-class operations. Any verified instructor may toggle;
    /// last writer wins.
    pub async fn pause_score_submissions(&self, caller: Address) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let mut book = self.book.write().await;
        book.submissions = SubmissionState::Paused;
        drop(book);

        warn!(by = %caller, "⏸️ Score submissions paused");
        self.events.emit(SystemEvent::SubmissionsPaused {
            by: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Resume submission-class operations.
    pub async fn resume_score_submissions(&self, caller: Address) -> Result<()> {
        self.require_verified_instructor(caller).await?;

        let mut book = self.book.write().await;
        book.submissions = SubmissionState::Active;
        drop(book);

        info!(by = %caller, "▶️ Score submissions resumed");
        self.events.emit(SystemEvent::SubmissionsResumed {
            by: caller.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    // Read surface

    pub async fn course(&self, course_id: CourseId) -> Option<Course> {
        let book = self.book.read().await;
        book.courses.get(&course_id).cloned()
    }

    pub async fn course_count(&self) -> u64 {
        let book = self.book.read().await;
        book.next_course_id - 1
    }

    pub async fn enrollments_of(&self, student: Address) -> Vec<CourseId> {
        let book = self.book.read().await;
        book.enrollments.get(&student).cloned().unwrap_or_default()
    }

    pub async fn exam_request(&self, course_id: CourseId) -> Option<ExamRequest> {
        let book = self.book.read().await;
        book.exam_requests.get(&course_id).copied()
    }

    pub async fn exam_result(&self, student: Address) -> Option<ExamResult> {
        let book = self.book.read().await;
        book.exam_results.get(&student).copied()
    }

    pub async fn submission_state(&self) -> SubmissionState {
        let book = self.book.read().await;
        book.submissions
    }

    /// Snapshot of qualifying students: submitted, undisputed results at or
    /// above the configured cutoff, highest score first. Order carries no
    /// ranking guarantee beyond determinism.
    pub async fn top_students_snapshot(&self) -> Vec<Address> {
        let book = self.book.read().await;
        let mut qualifying: Vec<(Address, u32)> = book
            .exam_results
            .iter()
            .filter(|(_, r)| r.submitted && !r.disputed && r.score >= self.config.min_top_score)
            .map(|(addr, r)| (*addr, r.score))
            .collect();
        qualifying.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        qualifying.into_iter().map(|(addr, _)| addr).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_types::{ContentRef, ErrorKind};

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn detail(b: u8) -> ContentRef {
        ContentRef::from_bytes([b; 32])
    }

    struct Fixture {
        engine: AcademicsEngine,
        roles: Arc<RoleRegistry>,
        admin: Address,
    }

    async fn fixture() -> Fixture {
        let admin = addr(1);
        let events = EventBus::new();
        let access = Arc::new(AccessController::new(admin, events.clone()));
        let roles = Arc::new(RoleRegistry::new(access.clone(), events.clone()));
        let engine = AcademicsEngine::new(
            access,
            roles.clone(),
            AcademicsConfig::default(),
            events,
        );
        Fixture {
            engine,
            roles,
            admin,
        }
    }

    async fn with_student(f: &Fixture, address: Address, matric: &str) {
        f.roles
            .register_student(f.admin, matric.into(), address, detail(1))
            .await
            .unwrap();
    }

    async fn with_verified_instructor(f: &Fixture, address: Address) {
        f.roles
            .register_instructor(f.admin, address, 5, detail(2))
            .await
            .unwrap();
        f.roles.verify_instructor(f.admin, address).await.unwrap();
    }

    #[tokio::test]
    async fn test_course_ids_dense_from_one() {
        let f = fixture().await;
        let instructor = addr(20);
        with_verified_instructor(&f, instructor).await;

        for expected in 1..=5u64 {
            let id = f
                .engine
                .register_course(instructor, format!("Course {}", expected))
                .await
                .unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(f.engine.course_count().await, 5);
    }

    #[tokio::test]
    async fn test_non_instructor_cannot_register_course() {
        let f = fixture().await;
        let student = addr(10);
        with_student(&f, student, "M001").await;

        let err = f
            .engine
            .register_course(student, "Algebra".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(f.engine.course_count().await, 0);
    }

    #[tokio::test]
    async fn test_enrollment_requires_approval() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();

        // Before approval: state failure, no mutation
        let err = f.engine.enroll_in_course(student, course).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(f.engine.enrollments_of(student).await.is_empty());

        f.engine.approve_course(f.admin, course).await.unwrap();
        f.engine.enroll_in_course(student, course).await.unwrap();
        assert_eq!(f.engine.enrollments_of(student).await, vec![course]);
    }

    #[tokio::test]
    async fn test_re_approval_rejected() {
        let f = fixture().await;
        let instructor = addr(20);
        with_verified_instructor(&f, instructor).await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();
        let err = f.engine.approve_course(f.admin, course).await.unwrap_err();
        assert!(matches!(err, AcademicsError::CourseAlreadyApproved(_)));
    }

    #[tokio::test]
    async fn test_unknown_course_is_reference_failure() {
        let f = fixture().await;
        let err = f.engine.approve_course(f.admin, 42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[tokio::test]
    async fn test_enrollment_not_deduplicated() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();

        f.engine.enroll_in_course(student, course).await.unwrap();
        f.engine.enroll_in_course(student, course).await.unwrap();
        assert_eq!(f.engine.enrollments_of(student).await, vec![course, course]);
    }

    #[tokio::test]
    async fn test_exam_pipeline_happy_path() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();
        f.engine.enroll_in_course(student, course).await.unwrap();

        f.engine.start_exam(student, course).await.unwrap();
        let request = f.engine.exam_request(course).await.unwrap();
        assert_eq!(request.student, student);
        assert!(!request.approved);

        f.engine.approve_exam(instructor, course).await.unwrap();
        assert!(f.engine.exam_request(course).await.unwrap().approved);

        f.engine
            .submit_exam_result(instructor, student, 85)
            .await
            .unwrap();
        let result = f.engine.exam_result(student).await.unwrap();
        assert_eq!(result.score, 85);
        assert!(result.submitted);
        assert!(!result.disputed);

        f.engine.dispute_score(student).await.unwrap();
        assert!(f.engine.exam_result(student).await.unwrap().disputed);

        // Verification mutates nothing, including the dispute flag
        f.engine.verify_score(instructor, student).await.unwrap();
        let result = f.engine.exam_result(student).await.unwrap();
        assert!(result.disputed);
        assert_eq!(result.score, 85);
    }

    #[tokio::test]
    async fn test_start_exam_requires_enrollment() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();

        let err = f.engine.start_exam(student, course).await.unwrap_err();
        assert!(matches!(err, AcademicsError::NotEnrolled { .. }));
        assert!(f.engine.exam_request(course).await.is_none());
    }

    #[tokio::test]
    async fn test_start_exam_overwrites_slot() {
        let f = fixture().await;
        let instructor = addr(20);
        let (s1, s2) = (addr(10), addr(11));
        with_verified_instructor(&f, instructor).await;
        with_student(&f, s1, "M001").await;
        with_student(&f, s2, "M002").await;

        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();
        f.engine.enroll_in_course(s1, course).await.unwrap();
        f.engine.enroll_in_course(s2, course).await.unwrap();

        f.engine.start_exam(s1, course).await.unwrap();
        f.engine.approve_exam(instructor, course).await.unwrap();
        f.engine.start_exam(s2, course).await.unwrap();

        // Second request replaced the slot and reset approval
        let request = f.engine.exam_request(course).await.unwrap();
        assert_eq!(request.student, s2);
        assert!(!request.approved);
    }

    #[tokio::test]
    async fn test_approve_exam_requires_assigned_instructor() {
        let f = fixture().await;
        let (owner, other) = (addr(20), addr(21));
        let student = addr(10);
        with_verified_instructor(&f, owner).await;
        with_verified_instructor(&f, other).await;
        with_student(&f, student, "M001").await;

        let course = f
            .engine
            .register_course(owner, "Algebra".into())
            .await
            .unwrap();
        f.engine.approve_course(f.admin, course).await.unwrap();
        f.engine.enroll_in_course(student, course).await.unwrap();
        f.engine.start_exam(student, course).await.unwrap();

        let err = f.engine.approve_exam(other, course).await.unwrap_err();
        assert!(matches!(err, AcademicsError::NotCourseInstructor { .. }));
        assert!(!f.engine.exam_request(course).await.unwrap().approved);
    }

    #[tokio::test]
    async fn test_double_submission_rejected() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        f.engine
            .submit_exam_result(instructor, student, 60)
            .await
            .unwrap();
        let err = f
            .engine
            .submit_exam_result(instructor, student, 95)
            .await
            .unwrap_err();
        assert!(matches!(err, AcademicsError::AlreadySubmitted(_)));
        assert_eq!(f.engine.exam_result(student).await.unwrap().score, 60);
    }

    #[tokio::test]
    async fn test_update_score_history_overwrites() {
        let f = fixture().await;
        let (i1, i2) = (addr(20), addr(21));
        let student = addr(10);
        with_verified_instructor(&f, i1).await;
        with_verified_instructor(&f, i2).await;
        with_student(&f, student, "M001").await;

        f.engine.submit_exam_result(i1, student, 60).await.unwrap();
        // Any verified instructor may overwrite, no course ownership check
        f.engine.update_score_history(i2, student, 95).await.unwrap();
        assert_eq!(f.engine.exam_result(student).await.unwrap().score, 95);
    }

    #[tokio::test]
    async fn test_pause_blocks_submission_class_only() {
        let f = fixture().await;
        let instructor = addr(20);
        let student = addr(10);
        with_verified_instructor(&f, instructor).await;
        with_student(&f, student, "M001").await;

        f.engine.pause_score_submissions(instructor).await.unwrap();
        assert_eq!(f.engine.submission_state().await, SubmissionState::Paused);

        let err = f
            .engine
            .submit_exam_result(instructor, student, 80)
            .await
            .unwrap_err();
        assert!(matches!(err, AcademicsError::SubmissionsPaused));
        let err = f
            .engine
            .update_score_history(instructor, student, 80)
            .await
            .unwrap_err();
        assert!(matches!(err, AcademicsError::SubmissionsPaused));

        // Non-submission operations unaffected
        let course = f
            .engine
            .register_course(instructor, "Algebra".into())
            .await
            .unwrap();
        assert_eq!(course, 1);

        f.engine.resume_score_submissions(instructor).await.unwrap();
        f.engine
            .submit_exam_result(instructor, student, 80)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pause_requires_verified_instructor() {
        let f = fixture().await;
        let instructor = addr(20);
        f.roles
            .register_instructor(f.admin, instructor, 3, detail(1))
            .await
            .unwrap();

        // Unverified instructor cannot toggle
        let err = f
            .engine
            .pause_score_submissions(instructor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(f.engine.submission_state().await, SubmissionState::Active);
    }

    #[tokio::test]
    async fn test_dispute_requires_submission() {
        let f = fixture().await;
        let student = addr(10);
        with_student(&f, student, "M001").await;

        let err = f.engine.dispute_score(student).await.unwrap_err();
        assert!(matches!(err, AcademicsError::NoSubmission(_)));
    }

    #[tokio::test]
    async fn test_top_students_snapshot() {
        let f = fixture().await;
        let instructor = addr(20);
        with_verified_instructor(&f, instructor).await;
        let (a, b, c, d) = (addr(10), addr(11), addr(12), addr(13));
        for (s, m) in [(a, "M1"), (b, "M2"), (c, "M3"), (d, "M4")] {
            with_student(&f, s, m).await;
        }

        f.engine.submit_exam_result(instructor, a, 90).await.unwrap();
        f.engine.submit_exam_result(instructor, b, 70).await.unwrap();
        f.engine.submit_exam_result(instructor, c, 69).await.unwrap(); // below cutoff
        f.engine.submit_exam_result(instructor, d, 95).await.unwrap();
        f.engine.dispute_score(d).await.unwrap(); // disputed, excluded

        assert_eq!(f.engine.top_students_snapshot().await, vec![a, b]);
    }
}
