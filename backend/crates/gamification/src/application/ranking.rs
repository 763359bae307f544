//! Ranking Use Case
//!
//! Read-only views over user totals and completed submissions.

use crate::application::config::GamificationConfig;
use crate::domain::entities::{MissionScore, MissionTopScorer, RankedUser};
use crate::domain::repository::{CatalogRepository, RankingRepository};
use crate::error::{GamificationError, GamificationResult};
use kernel::id::{MissionId, UserId};
use std::sync::Arc;

/// One row of a mission's leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionRankingEntry {
    pub position: usize,
    pub score: MissionScore,
    pub is_current_user: bool,
}

/// Ranking Use Case
pub struct RankingUseCase<C, R>
where
    C: CatalogRepository,
    R: RankingRepository,
{
    catalog_repo: Arc<C>,
    ranking_repo: Arc<R>,
    config: Arc<GamificationConfig>,
}

impl<C, R> RankingUseCase<C, R>
where
    C: CatalogRepository,
    R: RankingRepository,
{
    pub fn new(catalog_repo: Arc<C>, ranking_repo: Arc<R>, config: Arc<GamificationConfig>) -> Self {
        Self {
            catalog_repo,
            ranking_repo,
            config,
        }
    }

    pub async fn global(&self) -> GamificationResult<Vec<RankedUser>> {
        self.ranking_repo
            .global_ranking(self.config.global_ranking_limit)
            .await
    }

    pub async fn top_per_mission(&self) -> GamificationResult<Vec<MissionTopScorer>> {
        self.ranking_repo.mission_top_scorers().await
    }

    pub async fn mission(
        &self,
        mission_id: MissionId,
        current_user: UserId,
    ) -> GamificationResult<Vec<MissionRankingEntry>> {
        self.catalog_repo
            .find_mission(mission_id)
            .await?
            .ok_or(GamificationError::MissionNotFound)?;

        let scores = self
            .ranking_repo
            .mission_ranking(mission_id, self.config.mission_ranking_limit)
            .await?;

        Ok(scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| MissionRankingEntry {
                position: i + 1,
                is_current_user: score.user_id == current_user,
                score,
            })
            .collect())
    }
}
