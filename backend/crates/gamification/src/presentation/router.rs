//! Gamification Router
//!
//! Routes are grouped by the roles they admit; each group carries its
//! allow-list as data and one role-gate layer.

use crate::application::config::GamificationConfig;
use crate::domain::repository::GamificationStore;
use crate::infra::postgres::PgGamificationRepository;
use crate::presentation::handlers::{self, GamificationAppState};
use auth::{AuthConfig, RoleGate, UserRole, require_roles};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;

/// Any authenticated role
pub const MEMBER_ROLES: &[UserRole] = &[UserRole::Participant, UserRole::Validator, UserRole::Admin];

/// Submission reviewers
pub const REVIEWER_ROLES: &[UserRole] = &[UserRole::Validator, UserRole::Admin];

/// Catalog and roster curation
pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];

/// Create the gamification router with PostgreSQL repository
pub fn gamification_router(
    repo: PgGamificationRepository,
    config: GamificationConfig,
    auth_config: Arc<AuthConfig>,
) -> Router {
    gamification_router_generic(repo, config, auth_config)
}

/// Create a generic gamification router for any repository implementation
pub fn gamification_router_generic<R>(
    repo: R,
    config: GamificationConfig,
    auth_config: Arc<AuthConfig>,
) -> Router
where
    R: GamificationStore,
{
    let state = GamificationAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };
    let gate = RoleGate::new(auth_config, MEMBER_ROLES);

    let members = Router::new()
        .route("/me", get(handlers::me::<R>))
        .route("/me/points", get(handlers::point_history::<R>))
        .route("/missions", get(handlers::list_missions::<R>))
        .route(
            "/missions/{mission_id}/tasks",
            get(handlers::list_mission_tasks::<R>),
        )
        .route(
            "/missions/{mission_id}/join",
            post(handlers::join_mission::<R>).delete(handlers::leave_mission::<R>),
        )
        .route(
            "/missions/{mission_id}/tasks/{task_id}/submit",
            post(handlers::submit_task::<R>),
        )
        .route("/quizzes/{quiz_id}", get(handlers::get_quiz::<R>))
        .route("/quizzes/{quiz_id}/submit", post(handlers::submit_quiz::<R>))
        .route("/ranking", get(handlers::global_ranking::<R>))
        .route("/ranking/missions", get(handlers::mission_top_scorers::<R>))
        .route(
            "/ranking/missions/{mission_id}",
            get(handlers::mission_ranking::<R>),
        )
        .route_layer(middleware::from_fn_with_state(gate.clone(), require_roles));

    let reviewers = Router::new()
        .route(
            "/admin/submissions/pending",
            get(handlers::pending_submissions::<R>),
        )
        .route(
            "/admin/submissions/{submission_id}/validate",
            post(handlers::validate_submission::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            gate.allowing(REVIEWER_ROLES),
            require_roles,
        ));

    let admins = Router::new()
        .route("/admin/missions", post(handlers::create_mission::<R>))
        .route(
            "/admin/missions/{mission_id}/tasks",
            post(handlers::create_task::<R>),
        )
        .route("/admin/tasks/{task_id}/quiz", post(handlers::create_quiz::<R>))
        .route(
            "/admin/missions/{mission_id}/participants",
            post(handlers::add_participant::<R>),
        )
        .route(
            "/admin/missions/{mission_id}/participants/{user_id}",
            delete(handlers::remove_participant::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            gate.allowing(ADMIN_ROLES),
            require_roles,
        ));

    Router::new()
        .merge(members)
        .merge(reviewers)
        .merge(admins)
        .route("/health", get(handlers::health))
        .with_state(state)
}
