//! Appointment domain model and status lifecycle.
//!
//! An appointment reserves one provider for a contiguous interval on a
//! single calendar date. Intervals are half-open `[start, start+dur)`
//! at minute resolution, so an appointment ending exactly when another
//! begins does not conflict.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BooklineError, BooklineResult};

/// Minimum bookable duration in minutes.
pub const MIN_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// `completed` and `cancelled` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
        )
    }

    /// Validate a transition, rejecting anything the lifecycle does
    /// not permit — including any attempt to leave a terminal status.
    pub fn ensure_transition_to(&self, next: AppointmentStatus) -> BooklineResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(BooklineError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_name: String,
    pub client_last_name: String,
    pub client_phone: String,
    pub provider_id: Uuid,
    /// Denormalized display name of the provider at booking time.
    pub provider_name: String,
    pub date: NaiveDate,
    /// Start of the reserved interval, minute resolution.
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub service: String,
    pub total_cost: f64,
    pub status: AppointmentStatus,
    /// Only meaningful while status = confirmed; not cleared on
    /// transition away.
    pub deposit: Option<f64>,
    pub comments: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Start of the interval as minutes from midnight.
    pub fn start_minute(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    /// Exclusive end of the interval as minutes from midnight. May
    /// exceed 24h for a booking that runs past midnight.
    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointment {
    pub client_name: String,
    pub client_last_name: String,
    pub client_phone: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub service: String,
    pub total_cost: f64,
    pub deposit: Option<f64>,
    pub comments: Option<String>,
    /// Overwritten by the scheduling engine with the acting user's id.
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppointment {
    pub client_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_phone: Option<String>,
    pub provider_id: Option<Uuid>,
    pub provider_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub service: Option<String>,
    pub total_cost: Option<f64>,
    pub status: Option<AppointmentStatus>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub deposit: Option<Option<f64>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub comments: Option<Option<String>>,
}

impl UpdateAppointment {
    /// Whether the patch touches any of the fields that define the
    /// reserved interval. The scheduling engine always fills all four
    /// slot fields together when any of them changes, so that the
    /// store can re-run the overlap check on the final values.
    pub fn changes_slot(&self) -> bool {
        self.provider_id.is_some()
            || self.date.is_some()
            || self.start.is_some()
            || self.duration_minutes.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub provider_id: Option<Uuid>,
    /// Exact calendar date.
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on date.
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on date.
    pub to_date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}
