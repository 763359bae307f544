//! Profile Use Case

use crate::domain::entities::{PointLog, User};
use crate::domain::repository::UserRepository;
use crate::error::{GamificationError, GamificationResult};
use kernel::id::UserId;
use std::sync::Arc;

/// Profile Use Case
pub struct ProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn me(&self, user_id: UserId) -> GamificationResult<User> {
        self.user_repo
            .find_user(user_id)
            .await?
            .ok_or(GamificationError::UserNotFound)
    }

    /// Newest first
    pub async fn point_history(&self, user_id: UserId, limit: i64) -> GamificationResult<Vec<PointLog>> {
        self.user_repo.list_point_logs(user_id, limit.max(1)).await
    }
}
