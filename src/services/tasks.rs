//! Time-triggered housekeeping jobs.
//!
//! Both jobs are idempotent and safe to skip or repeat, so the trigger
//! cadence is a deployment choice rather than a correctness requirement.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::types::Json;

use crate::config::DbPool;
use crate::modules::appointments::model::Reminders;

/// Delivery seam for reminder notifications. The core only flags and hands
/// off; an email/SMS provider integration implements this.
#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send_email_reminder(
        &self,
        email: &str,
        first_name: &str,
        service_name: &str,
        date_time: chrono::DateTime<Utc>,
    );
}

/// Stub sender: logs the handoff and does nothing else.
pub struct LogReminderSender;

#[async_trait]
impl ReminderSender for LogReminderSender {
    async fn send_email_reminder(
        &self,
        email: &str,
        _first_name: &str,
        service_name: &str,
        date_time: chrono::DateTime<Utc>,
    ) {
        tracing::info!(%email, %service_name, %date_time, "reminder handed off for delivery");
    }
}

/// Strip email-verification and password-reset tokens whose expiry has
/// passed. Returns (verification rows, reset rows) affected.
pub async fn cleanup_expired_tokens(db: &DbPool) -> Result<(u64, u64), sqlx::Error> {
    let verification = sqlx::query(
        r#"
        UPDATE users
        SET email_verification_token = NULL,
            email_verification_expires = NULL
        WHERE email_verification_token IS NOT NULL
          AND email_verification_expires < NOW()
        "#,
    )
    .execute(db)
    .await?
    .rows_affected();

    let reset = sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = NULL,
            reset_password_expires = NULL
        WHERE reset_password_token IS NOT NULL
          AND reset_password_expires < NOW()
        "#,
    )
    .execute(db)
    .await?
    .rows_affected();

    Ok((verification, reset))
}

#[derive(Debug, sqlx::FromRow)]
struct DueReminder {
    id: String,
    date_time: chrono::DateTime<Utc>,
    reminders: Json<Reminders>,
    client_email: String,
    client_first_name: String,
    service_name: String,
}

/// Flag next-day appointments for email reminders, once each.
///
/// Selection: start instant within the next full calendar day (UTC), status
/// scheduled or confirmed, email reminder not yet sent. Each match is marked
/// sent before the handoff; re-runs the same day select nothing. Marking and
/// delivery are not atomic, matching the observed system.
pub async fn send_appointment_reminders(
    db: &DbPool,
    sender: &dyn ReminderSender,
) -> Result<u64, sqlx::Error> {
    let tomorrow = (Utc::now() + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    let day_after = tomorrow + ChronoDuration::days(1);

    let due = sqlx::query_as::<_, DueReminder>(
        r#"
        SELECT
            a.id, a.date_time, a.reminders,
            c.email      AS client_email,
            c.first_name AS client_first_name,
            s.name       AS service_name
        FROM appointments a
        JOIN users c    ON c.id = a.client_id
        JOIN services s ON s.id = a.service_id
        WHERE a.date_time >= ? AND a.date_time < ?
          AND a.status IN ('scheduled', 'confirmed')
          AND JSON_UNQUOTE(JSON_EXTRACT(a.reminders, '$.email.sent')) = 'false'
        "#,
    )
    .bind(tomorrow)
    .bind(day_after)
    .fetch_all(db)
    .await?;

    tracing::info!(count = due.len(), "appointments due for reminder");

    let mut sent = 0u64;
    for appointment in due {
        let mut reminders = appointment.reminders.0;
        reminders.email.sent = true;
        reminders.email.sent_at = Some(Utc::now());

        // Mark first to prevent reprocessing, then hand off.
        let marked = sqlx::query(
            "UPDATE appointments SET reminders = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(Json(reminders))
        .bind(&appointment.id)
        .execute(db)
        .await;

        match marked {
            Ok(_) => {
                sender
                    .send_email_reminder(
                        &appointment.client_email,
                        &appointment.client_first_name,
                        &appointment.service_name,
                        appointment.date_time,
                    )
                    .await;
                sent += 1;
            }
            Err(e) => {
                tracing::error!(appointment_id = %appointment.id, error = %e, "failed to mark reminder sent");
            }
        }
    }

    Ok(sent)
}

/// Spawn both jobs on a daily cadence. Failures abort that cycle only.
pub fn spawn_scheduled_tasks(db: DbPool, sender: Arc<dyn ReminderSender>) {
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    let cleanup_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DAY);
        loop {
            interval.tick().await;
            match cleanup_expired_tokens(&cleanup_db).await {
                Ok((verification, reset)) => {
                    tracing::info!(verification, reset, "token cleanup completed");
                }
                Err(e) => tracing::error!(error = %e, "token cleanup failed"),
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DAY);
        loop {
            interval.tick().await;
            match send_appointment_reminders(&db, sender.as_ref()).await {
                Ok(sent) => tracing::info!(sent, "reminder sweep completed"),
                Err(e) => tracing::error!(error = %e, "reminder sweep failed"),
            }
        }
    });
}
