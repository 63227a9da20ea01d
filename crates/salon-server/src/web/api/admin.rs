use crate::booking;
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::api::middleware::Session;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use salon_common::models::booking::BookingStatus;
use salon_common::validation::ValidationError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/admin/bookings
#[tracing::instrument(skip(state, user))]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // "all" and an empty value both mean no filter
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.parse::<BookingStatus>().map_err(|e| {
            ValidationError::Invalid {
                field: "status",
                message: e.to_string(),
            }
        })?),
    };

    let overview = booking::admin_overview(state.store.as_ref(), &user, status).await?;
    Ok(Json(overview))
}

/// DELETE /api/admin/bookings/{id}
#[tracing::instrument(skip(state, user))]
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    booking::admin_delete(state.store.as_ref(), &user, id).await?;
    Ok(Json(json!({"status": "deleted", "booking_id": id})))
}
