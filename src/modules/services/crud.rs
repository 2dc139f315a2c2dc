use std::collections::HashMap;

use sqlx::{MySql, Pool};

use super::model::Service;
use super::schema::StaffSummary;

pub struct ServiceCrud {
    pool: Pool<MySql>,
}

impl ServiceCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, service: &Service) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, description, duration, price, category, is_active,
                staff_members, availability, buffer_time,
                max_advance_booking, min_advance_booking,
                tags, images, requirements,
                preparation_instructions, aftercare_instructions,
                booking_settings, statistics, created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration)
        .bind(&service.price)
        .bind(&service.category)
        .bind(service.is_active)
        .bind(&service.staff_members)
        .bind(&service.availability)
        .bind(&service.buffer_time)
        .bind(service.max_advance_booking)
        .bind(service.min_advance_booking)
        .bind(&service.tags)
        .bind(&service.images)
        .bind(&service.requirements)
        .bind(&service.preparation_instructions)
        .bind(&service.aftercare_instructions)
        .bind(&service.booking_settings)
        .bind(&service.statistics)
        .bind(&service.created_by)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Active services only, sorted by name. The public catalogue view.
    pub async fn find_all_active(&self) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Resolve a set of staff user ids to their public summaries, keyed by id.
    pub async fn staff_summaries(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, StaffSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, first_name, last_name, email FROM users WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, (String, String, String, String)>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, first_name, last_name, email)| {
                (
                    id.clone(),
                    StaffSummary {
                        id,
                        first_name,
                        last_name,
                        email,
                    },
                )
            })
            .collect())
    }
}
