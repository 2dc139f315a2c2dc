use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
    Rescheduled,
}

// The column is VARCHAR (not a MySQL ENUM), so the sqlx impls delegate to
// `str` instead of `derive(sqlx::Type)`, which only accepts ENUM columns.
impl AppointmentStatus {
    fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }
}

impl sqlx::Type<sqlx::MySql> for AppointmentStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <str as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for AppointmentStatus {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::MySql as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::MySql>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for AppointmentStatus {
    fn decode(
        value: <sqlx::MySql as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        match <&str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)? {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            "no-show" => Ok(AppointmentStatus::NoShow),
            "rescheduled" => Ok(AppointmentStatus::Rescheduled),
            other => Err(format!("invalid value {:?} for enum AppointmentStatus", other).into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Notes {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub staff: Option<String>,
    #[serde(default)]
    pub internal: Option<String>,
}

/// Price captured at booking time; later service edits do not reprice
/// existing appointments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub amount: f64,
    pub currency: String,
    pub paid: bool,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReminderChannel {
    pub sent: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Reminders {
    pub email: ReminderChannel,
    pub sms: ReminderChannel,
    pub push: ReminderChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub refund_status: String, // none | pending | processed | failed
    #[serde(default)]
    pub refund_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rescheduling {
    pub previous_date_time: DateTime<Utc>,
    pub rescheduled_at: DateTime<Utc>,
    pub rescheduled_by: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub reschedule_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub score: u8,
    #[serde(default)]
    pub review: Option<String>,
    pub review_date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub service_id: String,
    pub staff_id: String,
    pub date_time: DateTime<Utc>,
    pub duration: u32,
    pub status: AppointmentStatus,
    pub notes: Json<Notes>,
    pub price: Json<PriceSnapshot>,
    pub reminders: Json<Reminders>,
    pub cancellation: Option<Json<Cancellation>>,
    pub rescheduling: Option<Json<Rescheduling>>,
    pub rating: Option<Json<Rating>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
