use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Consultation,
    Treatment,
    Therapy,
    Checkup,
    Procedure,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Consultation => "consultation",
            Category::Treatment => "treatment",
            Category::Therapy => "therapy",
            Category::Checkup => "checkup",
            Category::Procedure => "procedure",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: String, // "09:00"
    pub end_time: String,   // "17:00"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub enabled: bool,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

/// Declared weekly booking windows. Stored with the service but not
/// consulted by the booking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub monday: DayAvailability,
    pub tuesday: DayAvailability,
    pub wednesday: DayAvailability,
    pub thursday: DayAvailability,
    pub friday: DayAvailability,
    pub saturday: DayAvailability,
    pub sunday: DayAvailability,
}

impl Default for WeeklyAvailability {
    fn default() -> Self {
        let weekday = DayAvailability {
            enabled: true,
            slots: Vec::new(),
        };
        let weekend = DayAvailability {
            enabled: false,
            slots: Vec::new(),
        };
        Self {
            monday: weekday.clone(),
            tuesday: weekday.clone(),
            wednesday: weekday.clone(),
            thursday: weekday.clone(),
            friday: weekday,
            saturday: weekend.clone(),
            sunday: weekend,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImage {
    pub url: String,
    pub alt: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BufferTime {
    pub before: u32,
    pub after: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CancellationPolicy {
    Flexible,
    #[default]
    Moderate,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSettings {
    pub allow_online_booking: bool,
    pub require_approval: bool,
    pub cancellation_policy: CancellationPolicy,
    #[serde(default)]
    pub refund_policy: Option<String>,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            allow_online_booking: true,
            require_approval: false,
            cancellation_policy: CancellationPolicy::Moderate,
            refund_policy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_bookings: u64,
    pub average_rating: f64,
    pub total_reviews: u64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration: u32,
    pub price: Json<Price>,
    pub category: String,
    pub is_active: bool,
    pub staff_members: Json<Vec<String>>,
    pub availability: Json<WeeklyAvailability>,
    pub buffer_time: Json<BufferTime>,
    pub max_advance_booking: u32,
    pub min_advance_booking: u32,
    pub tags: Json<Vec<String>>,
    pub images: Json<Vec<ServiceImage>>,
    pub requirements: Json<Vec<String>>,
    pub preparation_instructions: Option<String>,
    pub aftercare_instructions: Option<String>,
    pub booking_settings: Json<BookingSettings>,
    pub statistics: Json<Statistics>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enforce the single-primary-image invariant before any write: with no
/// primary, the first image is promoted; with several, all but the first
/// primary are demoted.
pub fn normalize_primary_image(images: &mut [ServiceImage]) {
    if images.is_empty() {
        return;
    }

    let primary_count = images.iter().filter(|i| i.is_primary).count();

    if primary_count == 0 {
        images[0].is_primary = true;
        return;
    }

    if primary_count > 1 {
        let mut found = false;
        for image in images.iter_mut() {
            if image.is_primary {
                if found {
                    image.is_primary = false;
                } else {
                    found = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, is_primary: bool) -> ServiceImage {
        ServiceImage {
            url: url.to_string(),
            alt: String::new(),
            is_primary,
        }
    }

    #[test]
    fn empty_image_list_is_left_alone() {
        let mut images: Vec<ServiceImage> = Vec::new();
        normalize_primary_image(&mut images);
        assert!(images.is_empty());
    }

    #[test]
    fn first_image_promoted_when_no_primary() {
        let mut images = vec![image("a", false), image("b", false)];
        normalize_primary_image(&mut images);
        assert!(images[0].is_primary);
        assert!(!images[1].is_primary);
    }

    #[test]
    fn extra_primaries_are_demoted() {
        let mut images = vec![image("a", false), image("b", true), image("c", true)];
        normalize_primary_image(&mut images);
        let primaries: Vec<_> = images.iter().filter(|i| i.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].url, "b");
    }

    #[test]
    fn single_primary_is_preserved() {
        let mut images = vec![image("a", false), image("b", true)];
        normalize_primary_image(&mut images);
        assert!(!images[0].is_primary);
        assert!(images[1].is_primary);
    }

    #[test]
    fn weekdays_enabled_by_default_weekends_not() {
        let availability = WeeklyAvailability::default();
        assert!(availability.monday.enabled);
        assert!(availability.friday.enabled);
        assert!(!availability.saturday.enabled);
        assert!(!availability.sunday.enabled);
    }
}
