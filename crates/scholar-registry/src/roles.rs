use crate::{AccessController, RegistryError, Result};
use chrono::{DateTime, Utc};
use scholar_events::{EventBus, SystemEvent};
use scholar_types::{Address, ContentRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Set-once role flags for an address. No operation clears a flag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    pub is_student: bool,
    pub is_instructor: bool,
    pub instructor_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub address: Address,
    pub matric: String,
    pub detail_ref: ContentRef,
    pub cgpa: f64,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorRecord {
    pub address: Address,
    pub experience_years: u32,
    pub detail_ref: ContentRef,
    pub verified: bool,
    pub registered_at: DateTime<Utc>,
}

struct RoleBook {
    flags: HashMap<Address, RoleFlags>,
    students: HashMap<Address, StudentRecord>,
    matric_index: HashMap<String, Address>,
    instructors: HashMap<Address, InstructorRecord>,
}

/// Registry of student and instructor credentials.
///
/// All mutations are admin-gated through the [`AccessController`]; reads are
/// open. Records persist indefinitely — the registry is the audit trail.
pub struct RoleRegistry {
    access: Arc<AccessController>,
    book: RwLock<RoleBook>,
    events: EventBus,
}

impl RoleRegistry {
    pub fn new(access: Arc<AccessController>, events: EventBus) -> Self {
        Self {
            access,
            book: RwLock::new(RoleBook {
                flags: HashMap::new(),
                students: HashMap::new(),
                matric_index: HashMap::new(),
                instructors: HashMap::new(),
            }),
            events,
        }
    }

    /// Register a student credential. Admin-gated; fails if the address is
    /// already a student or the matric number is taken.
    pub async fn register_student(
        &self,
        caller: Address,
        matric: String,
        address: Address,
        detail_ref: ContentRef,
    ) -> Result<()> {
        self.access.require_root(caller).await?;

        let mut book = self.book.write().await;
        if book.flags.get(&address).is_some_and(|f| f.is_student) {
            return Err(RegistryError::AlreadyRegistered {
                role: "student",
                address,
            });
        }
        if book.matric_index.contains_key(&matric) {
            return Err(RegistryError::MatricTaken(matric));
        }

        book.flags.entry(address).or_default().is_student = true;
        book.matric_index.insert(matric.clone(), address);
        book.students.insert(
            address,
            StudentRecord {
                address,
                matric: matric.clone(),
                detail_ref,
                cgpa: 0.0,
                registered_at: Utc::now(),
            },
        );
        drop(book);

        info!(address = %address, matric = %matric, "🎓 Student registered");
        self.events.emit(SystemEvent::StudentRegistered {
            address: address.to_string(),
            matric,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Register an instructor credential. Admin-gated; fails if the address
    /// is already an instructor.
    pub async fn register_instructor(
        &self,
        caller: Address,
        address: Address,
        experience_years: u32,
        detail_ref: ContentRef,
    ) -> Result<()> {
        self.access.require_root(caller).await?;

        let mut book = self.book.write().await;
        if book.flags.get(&address).is_some_and(|f| f.is_instructor) {
            return Err(RegistryError::AlreadyRegistered {
                role: "instructor",
                address,
            });
        }

        book.flags.entry(address).or_default().is_instructor = true;
        book.instructors.insert(
            address,
            InstructorRecord {
                address,
                experience_years,
                detail_ref,
                verified: false,
                registered_at: Utc::now(),
            },
        );
        drop(book);

        info!(address = %address, experience_years, "🧑‍🏫 Instructor registered");
        self.events.emit(SystemEvent::InstructorRegistered {
            address: address.to_string(),
            experience_years,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Promote an instructor to verified, unlocking scoring and pause
    /// privileges. Admin-gated; the target must already be an instructor.
    pub async fn verify_instructor(&self, caller: Address, address: Address) -> Result<()> {
        self.access.require_root(caller).await?;

        let mut book = self.book.write().await;
        {
            let flags = book
                .flags
                .get_mut(&address)
                .filter(|f| f.is_instructor)
                .ok_or(RegistryError::NotAnInstructor(address))?;
            if flags.instructor_verified {
                return Err(RegistryError::AlreadyVerified(address));
            }
            flags.instructor_verified = true;
        }
        if let Some(record) = book.instructors.get_mut(&address) {
            record.verified = true;
        }
        drop(book);

        info!(address = %address, "✅ Instructor verified");
        self.events.emit(SystemEvent::InstructorVerified {
            address: address.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn is_student(&self, address: Address) -> bool {
        let book = self.book.read().await;
        book.flags.get(&address).is_some_and(|f| f.is_student)
    }

    pub async fn is_instructor(&self, address: Address) -> bool {
        let book = self.book.read().await;
        book.flags.get(&address).is_some_and(|f| f.is_instructor)
    }

    pub async fn is_verified_instructor(&self, address: Address) -> bool {
        let book = self.book.read().await;
        book.flags
            .get(&address)
            .is_some_and(|f| f.instructor_verified)
    }

    pub async fn student(&self, address: Address) -> Option<StudentRecord> {
        let book = self.book.read().await;
        book.students.get(&address).cloned()
    }

    pub async fn student_by_matric(&self, matric: &str) -> Option<StudentRecord> {
        let book = self.book.read().await;
        let address = book.matric_index.get(matric)?;
        book.students.get(address).cloned()
    }

    pub async fn instructor(&self, address: Address) -> Option<InstructorRecord> {
        let book = self.book.read().await;
        book.instructors.get(&address).cloned()
    }
}
