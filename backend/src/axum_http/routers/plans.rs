use crate::{axum_http::auth::AuthUser, usecases::plans::PlanUseCase};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use tradebook::{
    domain::{
        clock::{Clock, SystemClock},
        repositories::{app_users::UserRepository, plan_records::PlanRecordRepository},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{app_users::UserPostgres, plan_records::PlanRecordPostgres},
    },
};

#[derive(Debug, Deserialize)]
pub struct UpgradePlanRequest {
    plan: String,
    duration: Option<String>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let plan_record_repository = PlanRecordPostgres::new(Arc::clone(&db_pool));
    let usecase = PlanUseCase::new(
        Arc::new(user_repository),
        Arc::new(plan_record_repository),
        Arc::new(SystemClock),
    );

    Router::new()
        .route(
            "/me",
            get(get_effective_plan::<UserPostgres, PlanRecordPostgres, SystemClock>),
        )
        .route(
            "/upgrade",
            post(upgrade_plan::<UserPostgres, PlanRecordPostgres, SystemClock>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn get_effective_plan<U, P, C>(
    State(usecase): State<Arc<PlanUseCase<U, P, C>>>,
    AuthUser { user_id, email, .. }: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    match usecase.get_effective_plan(user_id, email).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, %user_id, "plans: failed to resolve effective plan");
            }
            (status, err.to_string()).into_response()
        }
    }
}

pub async fn upgrade_plan<U, P, C>(
    State(usecase): State<Arc<PlanUseCase<U, P, C>>>,
    AuthUser { user_id, email, .. }: AuthUser,
    Json(request): Json<UpgradePlanRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    match usecase
        .upgrade_plan(user_id, email, &request.plan, request.duration.as_deref())
        .await
    {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, %user_id, "plans: failed to apply plan change");
            }
            (status, err.to_string()).into_response()
        }
    }
}
