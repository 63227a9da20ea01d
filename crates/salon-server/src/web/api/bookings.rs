use crate::booking;
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::api::middleware::Session;
use crate::web::api::UserPayload;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use salon_common::validation::{BookingInput, ValidationError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub booking: BookingInput,
    /// Discount percentage the client applied, if any
    pub discount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub booking_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub booking_id: Option<Uuid>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/bookings/create
#[tracing::instrument(skip(state, user, req))]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
    WithRejection(Json(req), _): WithRejection<Json<CreateBookingRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let created = booking::create(state.store.as_ref(), &user, &req.booking, req.discount).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserPayload::from(created.user),
            "booking": created.booking,
            "threshold_used": created.threshold_used,
        })),
    ))
}

/// POST /api/bookings/cancel
#[tracing::instrument(skip(state, user, req))]
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
    WithRejection(Json(req), _): WithRejection<Json<CancelRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = req
        .booking_id
        .ok_or(ValidationError::Missing("booking_id"))?;
    let booking = booking::cancel(
        state.store.as_ref(),
        &user,
        booking_id,
        req.notes.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "booking": booking })))
}

/// POST /api/bookings/reschedule
#[tracing::instrument(skip(state, user, req))]
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
    WithRejection(Json(req), _): WithRejection<Json<RescheduleRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = req
        .booking_id
        .ok_or(ValidationError::Missing("booking_id"))?;
    let booking = booking::reschedule(
        state.store.as_ref(),
        &state.config.bookings,
        &user,
        booking_id,
        req.date.as_deref(),
        req.time.as_deref(),
        req.notes.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "booking": booking })))
}

/// GET /api/bookings/list
#[tracing::instrument(skip(state, user))]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Session(user): Session,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = booking::list_for_user(state.store.as_ref(), &user).await?;
    Ok(Json(json!({ "bookings": bookings })))
}
