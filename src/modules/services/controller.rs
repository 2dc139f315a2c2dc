use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::modules::services::crud::ServiceCrud;
use crate::modules::services::model::{normalize_primary_image, Price, Service, Statistics};
use crate::modules::services::schema::{
    CreateServiceRequest, ServiceListResponse, ServiceResponse, SingleServiceResponse,
    StaffSummary,
};
use crate::modules::users::model::Role;
use crate::services::auth::AuthUser;
use crate::AppState;

/// Expand staff id lists into summaries for a batch of services.
async fn expand_staff(
    crud: &ServiceCrud,
    services: Vec<Service>,
) -> Result<Vec<ServiceResponse>, ApiError> {
    let all_ids: Vec<String> = services
        .iter()
        .flat_map(|s| s.staff_members.0.iter().cloned())
        .collect();
    let summaries = crud.staff_summaries(&all_ids).await?;

    Ok(services
        .into_iter()
        .map(|service| {
            let staff: Vec<StaffSummary> = service
                .staff_members
                .0
                .iter()
                .filter_map(|id| summaries.get(id).cloned())
                .collect();
            ServiceResponse::from_service(service, staff)
        })
        .collect())
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    let crud = ServiceCrud::new(state.db.clone());
    let services = crud.find_all_active().await?;
    let data = expand_staff(&crud, services).await?;

    Ok(Json(ServiceListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SingleServiceResponse>, ApiError> {
    let crud = ServiceCrud::new(state.db.clone());

    let service = crud
        .find_by_id(&id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| ApiError::NotFound("Service".to_string()))?;

    let mut data = expand_staff(&crud, vec![service]).await?;

    Ok(Json(SingleServiceResponse {
        success: true,
        data: data.remove(0),
    }))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<SingleServiceResponse>), ApiError> {
    auth.require_role(&[Role::Admin])?;
    req.validate()?;

    let mut images = req.images;
    normalize_primary_image(&mut images);

    let tags: Vec<String> = req.tags.into_iter().map(|t| t.to_lowercase()).collect();

    let now = Utc::now();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        duration: req.duration,
        price: SqlJson(Price {
            amount: req.price.amount,
            currency: req.price.currency,
        }),
        category: req.category.as_str().to_string(),
        is_active: true,
        staff_members: SqlJson(req.staff_members),
        availability: SqlJson(req.availability.unwrap_or_default()),
        buffer_time: SqlJson(req.buffer_time.unwrap_or_default()),
        max_advance_booking: req.max_advance_booking,
        min_advance_booking: req.min_advance_booking,
        tags: SqlJson(tags),
        images: SqlJson(images),
        requirements: SqlJson(req.requirements),
        preparation_instructions: req.preparation_instructions,
        aftercare_instructions: req.aftercare_instructions,
        booking_settings: SqlJson(req.booking_settings.unwrap_or_default()),
        statistics: SqlJson(Statistics::default()),
        created_by: auth.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let crud = ServiceCrud::new(state.db.clone());
    crud.create(&service).await?;

    let mut data = expand_staff(&crud, vec![service]).await?;

    Ok((
        StatusCode::CREATED,
        Json(SingleServiceResponse {
            success: true,
            data: data.remove(0),
        }),
    ))
}

