use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{
    BookingSettings, BufferTime, Category, Price, Service, ServiceImage, Statistics,
    WeeklyAvailability,
};

// =============================================================================
// CREATE
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct PriceRequest {
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub amount: f64,
    pub currency: super::model::Currency,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 100, message = "Service name cannot exceed 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: String,
    #[validate(range(
        min = 15,
        max = 480,
        message = "Duration must be between 15 minutes and 8 hours (480 minutes)"
    ))]
    pub duration: u32,
    #[validate(nested)]
    pub price: PriceRequest,
    pub category: Category,
    #[serde(default)]
    pub staff_members: Vec<String>,
    #[serde(default)]
    pub availability: Option<WeeklyAvailability>,
    #[serde(default)]
    pub buffer_time: Option<BufferTime>,
    #[validate(range(min = 1, max = 365, message = "Max advance booking must be 1-365 days"))]
    #[serde(default = "default_max_advance")]
    pub max_advance_booking: u32,
    #[validate(range(min = 0, max = 168, message = "Min advance booking must be 0-168 hours"))]
    #[serde(default)]
    pub min_advance_booking: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<ServiceImage>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[validate(length(max = 2000, message = "Preparation instructions cannot exceed 2000 characters"))]
    #[serde(default)]
    pub preparation_instructions: Option<String>,
    #[validate(length(max = 2000, message = "Aftercare instructions cannot exceed 2000 characters"))]
    #[serde(default)]
    pub aftercare_instructions: Option<String>,
    #[serde(default)]
    pub booking_settings: Option<BookingSettings>,
}

fn default_max_advance() -> u32 {
    30
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Staff reference expanded for public listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration: u32,
    pub price: Price,
    pub category: String,
    pub is_active: bool,
    pub staff_members: Vec<StaffSummary>,
    pub availability: WeeklyAvailability,
    pub buffer_time: BufferTime,
    pub max_advance_booking: u32,
    pub min_advance_booking: u32,
    pub tags: Vec<String>,
    pub images: Vec<ServiceImage>,
    pub requirements: Vec<String>,
    pub preparation_instructions: Option<String>,
    pub aftercare_instructions: Option<String>,
    pub booking_settings: BookingSettings,
    pub statistics: Statistics,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceResponse {
    pub fn from_service(service: Service, staff: Vec<StaffSummary>) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            duration: service.duration,
            price: service.price.0,
            category: service.category,
            is_active: service.is_active,
            staff_members: staff,
            availability: service.availability.0,
            buffer_time: service.buffer_time.0,
            max_advance_booking: service.max_advance_booking,
            min_advance_booking: service.min_advance_booking,
            tags: service.tags.0,
            images: service.images.0,
            requirements: service.requirements.0,
            preparation_instructions: service.preparation_instructions,
            aftercare_instructions: service.aftercare_instructions,
            booking_settings: service.booking_settings.0,
            statistics: service.statistics.0,
            created_by: service.created_by,
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ServiceResponse>,
}

#[derive(Debug, Serialize)]
pub struct SingleServiceResponse {
    pub success: bool,
    pub data: ServiceResponse,
}
