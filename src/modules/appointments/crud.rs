use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, MySql, Pool};

use super::model::{Appointment, AppointmentStatus, Notes, PriceSnapshot, Reminders};
use crate::modules::users::model::Role;
use crate::services::auth::AuthUser;

/// Visibility scope for appointment queries. One tagged variant instead of
/// per-handler role branching: admins see everything, staff see their
/// assignments, clients see their own bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    Admin,
    Staff(String),
    Client(String),
}

impl QueryScope {
    pub fn for_caller(caller: &AuthUser) -> Self {
        match caller.role {
            Role::Admin => QueryScope::Admin,
            Role::Staff => QueryScope::Staff(caller.id.clone()),
            Role::Client => QueryScope::Client(caller.id.clone()),
        }
    }
}

/// Appointment joined with client, service, and staff display fields.
#[derive(Debug, FromRow)]
pub struct ExpandedAppointment {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_first_name: String,
    pub client_last_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: String,
    pub service_duration: u32,
    pub service_price: Json<crate::modules::services::model::Price>,
    pub staff_first_name: String,
    pub staff_last_name: String,
    pub staff_email: String,
}

const EXPANDED_SELECT: &str = r#"
    SELECT
        a.id, a.client_id, a.service_id, a.staff_id,
        a.date_time, a.duration, a.status, a.notes, a.price, a.reminders,
        a.created_at, a.updated_at,
        c.first_name AS client_first_name,
        c.last_name  AS client_last_name,
        c.email      AS client_email,
        c.phone      AS client_phone,
        s.name       AS service_name,
        s.duration   AS service_duration,
        s.price      AS service_price,
        st.first_name AS staff_first_name,
        st.last_name  AS staff_last_name,
        st.email      AS staff_email
    FROM appointments a
    JOIN users c    ON c.id = a.client_id
    JOIN services s ON s.id = a.service_id
    JOIN users st   ON st.id = a.staff_id
"#;

pub struct AppointmentCrud {
    pool: Pool<MySql>,
}

impl AppointmentCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, appointment: &Appointment) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, client_id, service_id, staff_id, date_time, duration, status,
                notes, price, reminders, cancellation, rescheduling, rating,
                created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.client_id)
        .bind(&appointment.service_id)
        .bind(&appointment.staff_id)
        .bind(appointment.date_time)
        .bind(appointment.duration)
        .bind(appointment.status)
        .bind(&appointment.notes)
        .bind(&appointment.price)
        .bind(&appointment.reminders)
        .bind(&appointment.cancellation)
        .bind(&appointment.rescheduling)
        .bind(&appointment.rating)
        .bind(&appointment.created_by)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Scoped listing, expanded and sorted by start time ascending.
    pub async fn find_scoped(
        &self,
        scope: &QueryScope,
    ) -> Result<Vec<ExpandedAppointment>, sqlx::Error> {
        match scope {
            QueryScope::Admin => {
                let sql = format!("{} ORDER BY a.date_time ASC", EXPANDED_SELECT);
                sqlx::query_as::<_, ExpandedAppointment>(&sql)
                    .fetch_all(&self.pool)
                    .await
            }
            QueryScope::Staff(id) => {
                let sql = format!(
                    "{} WHERE a.staff_id = ? ORDER BY a.date_time ASC",
                    EXPANDED_SELECT
                );
                sqlx::query_as::<_, ExpandedAppointment>(&sql)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
            }
            QueryScope::Client(id) => {
                let sql = format!(
                    "{} WHERE a.client_id = ? ORDER BY a.date_time ASC",
                    EXPANDED_SELECT
                );
                sqlx::query_as::<_, ExpandedAppointment>(&sql)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    pub async fn find_expanded_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ExpandedAppointment>, sqlx::Error> {
        let sql = format!("{} WHERE a.id = ?", EXPANDED_SELECT);
        sqlx::query_as::<_, ExpandedAppointment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: "u-42".to_string(),
            role,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@medbook.com".to_string(),
        }
    }

    #[test]
    fn admin_scope_is_unbounded() {
        assert_eq!(QueryScope::for_caller(&caller(Role::Admin)), QueryScope::Admin);
    }

    #[test]
    fn staff_scope_is_keyed_to_caller_id() {
        assert_eq!(
            QueryScope::for_caller(&caller(Role::Staff)),
            QueryScope::Staff("u-42".to_string())
        );
    }

    #[test]
    fn client_scope_is_keyed_to_caller_id() {
        assert_eq!(
            QueryScope::for_caller(&caller(Role::Client)),
            QueryScope::Client("u-42".to_string())
        );
    }
}
