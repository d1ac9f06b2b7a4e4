use crate::{
    axum_http::{auth::AdminUser, error_responses::AppError},
    usecases::admin_reports::AdminReportUseCase,
};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;
use tracing::error;
use tradebook::{
    domain::{
        clock::{Clock, SystemClock},
        repositories::admin_reports::AdminReportRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::admin_reports::AdminReportPostgres,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let repository = AdminReportPostgres::new(Arc::clone(&db_pool));
    // One cache instance for the whole process; every request shares the slot.
    let usecase = AdminReportUseCase::new(Arc::new(repository), Arc::new(SystemClock));

    Router::new()
        .route(
            "/report",
            get(get_report::<AdminReportPostgres, SystemClock>),
        )
        .with_state(Arc::new(usecase))
}

pub async fn get_report<R, C>(
    State(usecase): State<Arc<AdminReportUseCase<R, C>>>,
    AdminUser(admin): AdminUser,
) -> impl IntoResponse
where
    R: AdminReportRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    match usecase.get_report().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => {
            error!(
                error = %err,
                admin_id = %admin.user_id,
                "admin_reports: failed to build report"
            );
            AppError::Internal(err).into_response()
        }
    }
}
