use crate::engine::AcademicsEngine;
use async_trait::async_trait;
use scholar_types::Address;

/// Read-only eligibility seam the proposal engine queries.
///
/// Implementations return the current qualifying set; callers snapshot the
/// result and do not observe later changes.
#[async_trait]
pub trait TopStudentOracle: Send + Sync {
    async fn top_students(&self) -> Vec<Address>;
}

#[async_trait]
impl TopStudentOracle for AcademicsEngine {
    async fn top_students(&self) -> Vec<Address> {
        self.top_students_snapshot().await
    }
}
