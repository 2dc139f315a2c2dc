use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crud::ExpandedAppointment;
use super::model::{AppointmentStatus, Notes, PriceSnapshot, Reminders};
use crate::modules::services::model::Price;

// =============================================================================
// CREATE
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub service_id: String,
    pub staff_id: String,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub price: Price,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub client: ClientSummary,
    pub service: ServiceSummary,
    pub staff: StaffSummary,
    pub date_time: DateTime<Utc>,
    pub duration: u32,
    pub status: AppointmentStatus,
    pub notes: Notes,
    pub price: PriceSnapshot,
    pub reminders: Reminders,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExpandedAppointment> for AppointmentResponse {
    fn from(row: ExpandedAppointment) -> Self {
        Self {
            id: row.id,
            client: ClientSummary {
                id: row.client_id,
                first_name: row.client_first_name,
                last_name: row.client_last_name,
                email: row.client_email,
                phone: row.client_phone,
            },
            service: ServiceSummary {
                id: row.service_id,
                name: row.service_name,
                duration: row.service_duration,
                price: row.service_price.0,
            },
            staff: StaffSummary {
                id: row.staff_id,
                first_name: row.staff_first_name,
                last_name: row.staff_last_name,
                email: row.staff_email,
            },
            date_time: row.date_time,
            duration: row.duration,
            status: row.status,
            notes: row.notes.0,
            price: row.price.0,
            reminders: row.reminders.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<AppointmentResponse>,
}

#[derive(Debug, Serialize)]
pub struct SingleAppointmentResponse {
    pub success: bool,
    pub data: AppointmentResponse,
}
