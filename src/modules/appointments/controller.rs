use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::modules::appointments::crud::{AppointmentCrud, QueryScope};
use crate::modules::appointments::model::{
    Appointment, AppointmentStatus, Notes, PriceSnapshot, Reminders,
};
use crate::modules::appointments::schema::{
    AppointmentListResponse, AppointmentResponse, CreateAppointmentRequest,
    SingleAppointmentResponse,
};
use crate::modules::services::crud::ServiceCrud;
use crate::modules::users::crud::UserCrud;
use crate::services::auth::AuthUser;
use crate::AppState;

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    let scope = QueryScope::for_caller(&auth);

    let rows = AppointmentCrud::new(state.db.clone())
        .find_scoped(&scope)
        .await?;
    let data: Vec<AppointmentResponse> = rows.into_iter().map(Into::into).collect();

    Ok(Json(AppointmentListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// Book an appointment. The insert is unconditional: declared availability,
/// advance-booking bounds, and staff double-booking are not checked here.
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<SingleAppointmentResponse>), ApiError> {
    let service = ServiceCrud::new(state.db.clone())
        .find_by_id(&req.service_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Unknown service reference".to_string()))?;

    let staff = UserCrud::new(state.db.clone())
        .find_by_id(&req.staff_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Unknown staff reference".to_string()))?;

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        client_id: auth.id.clone(),
        service_id: service.id.clone(),
        staff_id: staff.id.clone(),
        date_time: req.date_time,
        duration: service.duration,
        status: AppointmentStatus::Scheduled,
        notes: SqlJson(Notes {
            client: req.notes,
            staff: None,
            internal: None,
        }),
        price: SqlJson(PriceSnapshot {
            amount: service.price.0.amount,
            currency: service.price.0.currency.as_str().to_string(),
            paid: false,
            payment_method: None,
            payment_date: None,
        }),
        reminders: SqlJson(Reminders::default()),
        cancellation: None,
        rescheduling: None,
        rating: None,
        created_by: auth.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let crud = AppointmentCrud::new(state.db.clone());
    crud.create(&appointment).await?;

    let expanded = crud
        .find_expanded_by_id(&appointment.id)
        .await?
        .ok_or_else(|| ApiError::Internal("appointment vanished after insert".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(SingleAppointmentResponse {
            success: true,
            data: expanded.into(),
        }),
    ))
}
