//! Enrollment Use Cases
//!
//! Self-service join/leave and the admin participant roster. Leaving cascades
//! to the user's submissions for the mission; admin removal does not.

use crate::domain::entities::Enrollment;
use crate::domain::repository::{CatalogRepository, EnrollmentRepository, UserRepository};
use crate::error::{GamificationError, GamificationResult};
use kernel::id::{MissionId, UserId};
use std::sync::Arc;

/// Join Mission Use Case
pub struct JoinMissionUseCase<C, E>
where
    C: CatalogRepository,
    E: EnrollmentRepository,
{
    catalog_repo: Arc<C>,
    enrollment_repo: Arc<E>,
}

impl<C, E> JoinMissionUseCase<C, E>
where
    C: CatalogRepository,
    E: EnrollmentRepository,
{
    pub fn new(catalog_repo: Arc<C>, enrollment_repo: Arc<E>) -> Self {
        Self {
            catalog_repo,
            enrollment_repo,
        }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Enrollment> {
        if self
            .enrollment_repo
            .find_enrollment(user_id, mission_id)
            .await?
            .is_some()
        {
            return Err(GamificationError::AlreadyEnrolled);
        }

        let mission = self
            .catalog_repo
            .find_mission(mission_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or(GamificationError::MissionUnavailable)?;

        let enrollment = Enrollment::join(user_id, &mission);
        self.enrollment_repo.create_enrollment(&enrollment).await?;

        tracing::info!(
            user_id = %user_id,
            mission_id = %mission_id,
            payment_status = %enrollment.payment_status,
            "Joined mission"
        );

        Ok(enrollment)
    }
}

/// Leave Mission Use Case
pub struct LeaveMissionUseCase<E>
where
    E: EnrollmentRepository,
{
    enrollment_repo: Arc<E>,
}

impl<E> LeaveMissionUseCase<E>
where
    E: EnrollmentRepository,
{
    pub fn new(enrollment_repo: Arc<E>) -> Self {
        Self { enrollment_repo }
    }

    /// Returns the number of submissions removed. Points stay credited.
    pub async fn execute(&self, user_id: UserId, mission_id: MissionId) -> GamificationResult<u64> {
        let removed = self
            .enrollment_repo
            .delete_with_submissions(user_id, mission_id)
            .await?
            .ok_or(GamificationError::EnrollmentNotFound)?;

        tracing::info!(
            user_id = %user_id,
            mission_id = %mission_id,
            removed_submissions = removed,
            "Left mission"
        );

        Ok(removed)
    }
}

/// Admin force-enroll
pub struct AddParticipantUseCase<C, U, E>
where
    C: CatalogRepository,
    U: UserRepository,
    E: EnrollmentRepository,
{
    catalog_repo: Arc<C>,
    user_repo: Arc<U>,
    enrollment_repo: Arc<E>,
}

impl<C, U, E> AddParticipantUseCase<C, U, E>
where
    C: CatalogRepository,
    U: UserRepository,
    E: EnrollmentRepository,
{
    pub fn new(catalog_repo: Arc<C>, user_repo: Arc<U>, enrollment_repo: Arc<E>) -> Self {
        Self {
            catalog_repo,
            user_repo,
            enrollment_repo,
        }
    }

    pub async fn execute(
        &self,
        admin_id: UserId,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Enrollment> {
        self.catalog_repo
            .find_mission(mission_id)
            .await?
            .ok_or(GamificationError::MissionNotFound)?;
        self.user_repo
            .find_user(user_id)
            .await?
            .ok_or(GamificationError::UserNotFound)?;

        let enrollment = self
            .enrollment_repo
            .upsert_confirmed(&Enrollment::confirmed(user_id, mission_id))
            .await?;

        tracing::info!(
            admin_id = %admin_id,
            user_id = %user_id,
            mission_id = %mission_id,
            "Participant added"
        );

        Ok(enrollment)
    }
}

/// Admin removal of the enrollment row only
pub struct RemoveParticipantUseCase<E>
where
    E: EnrollmentRepository,
{
    enrollment_repo: Arc<E>,
}

impl<E> RemoveParticipantUseCase<E>
where
    E: EnrollmentRepository,
{
    pub fn new(enrollment_repo: Arc<E>) -> Self {
        Self { enrollment_repo }
    }

    pub async fn execute(
        &self,
        admin_id: UserId,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<()> {
        // Submissions are kept; see LeaveMissionUseCase for the cascading path.
        if !self
            .enrollment_repo
            .delete_enrollment(user_id, mission_id)
            .await?
        {
            return Err(GamificationError::EnrollmentNotFound);
        }

        tracing::info!(
            admin_id = %admin_id,
            user_id = %user_id,
            mission_id = %mission_id,
            "Participant removed"
        );

        Ok(())
    }
}
