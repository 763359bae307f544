//! Application Configuration
//!
//! Configuration for the gamification application layer.

/// Gamification application configuration
#[derive(Debug, Clone)]
pub struct GamificationConfig {
    /// Global ranking page size
    pub global_ranking_limit: i64,
    /// Entries in a single mission's ranking
    pub mission_ranking_limit: i64,
    /// Point history entries returned to the current user
    pub point_history_limit: i64,
    /// Validation queue page size
    pub pending_queue_limit: i64,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            global_ranking_limit: 100,
            mission_ranking_limit: 5,
            point_history_limit: 50,
            pending_queue_limit: 100,
        }
    }
}

impl GamificationConfig {
    /// Create config for development (small pages make paging visible)
    pub fn development() -> Self {
        Self {
            global_ranking_limit: 20,
            point_history_limit: 20,
            ..Default::default()
        }
    }

    pub fn with_ranking_limits(global: i64, mission: i64) -> Self {
        Self {
            global_ranking_limit: global.max(1),
            mission_ranking_limit: mission.max(1),
            ..Default::default()
        }
    }
}
