//! Scheduling engine — enforces the no-overlap invariant per provider
//! and mediates every booking mutation.
//!
//! Intervals are half-open `[start, start+duration)` in minutes, so an
//! appointment ending exactly when another begins does not conflict.
//! The engine re-reads occupancy from the store on every decision; the
//! check-then-write window that leaves open is closed by the store's
//! own serialization point, whose rejection surfaces as the same
//! conflict error as a failed pre-check.

use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::info;
use uuid::Uuid;

use bookline_auth::policy::{self, Action};
use bookline_auth::token::SessionClaims;
use bookline_core::error::{BooklineError, BooklineResult};
use bookline_core::models::appointment::{
    Appointment, AppointmentFilter, AppointmentStatus, CreateAppointment, MIN_DURATION_MINUTES,
    UpdateAppointment,
};
use bookline_core::repository::AppointmentRepository;

/// One reserved interval on a provider's day, for calendar rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupiedSlot {
    /// Minutes from midnight, inclusive.
    pub start_minute: u32,
    /// Minutes from midnight, exclusive. May exceed 24h for a booking
    /// that runs past midnight.
    pub end_minute: u32,
    pub appointment_id: Uuid,
}

/// Calendar-view listing: a single day, optionally narrowed to one
/// provider. Non-admin callers are always narrowed to themselves.
#[derive(Debug, Clone, Default)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    pub provider_id: Option<Uuid>,
}

/// Management-view listing across providers.
#[derive(Debug, Clone, Default)]
pub struct RangeQuery {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

/// Scheduling service.
///
/// Generic over the repository so this crate carries no dependency on
/// the database crate.
pub struct SchedulingEngine<R: AppointmentRepository> {
    repo: R,
}

impl<R: AppointmentRepository> SchedulingEngine<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All reserved (non-cancelled) intervals for a provider on a
    /// date, sorted by start ascending with ties broken on appointment
    /// id. Ties cannot arise once the conflict check is enforced, but
    /// manually edited data must still produce a deterministic order.
    pub async fn list_occupancy(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> BooklineResult<Vec<OccupiedSlot>> {
        let occupied = self.occupied(provider_id, date, None).await?;
        let mut slots: Vec<OccupiedSlot> = occupied
            .iter()
            .map(|a| OccupiedSlot {
                start_minute: a.start_minute(),
                end_minute: a.end_minute(),
                appointment_id: a.id,
            })
            .collect();
        slots.sort_by_key(|s| (s.start_minute, s.appointment_id));
        Ok(slots)
    }

    /// True iff no non-cancelled interval for the provider on the date
    /// overlaps `[start, start+duration)`.
    pub async fn is_slot_free(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> BooklineResult<bool> {
        let (start_minute, end_minute) = interval_of(start, duration_minutes)?;
        let occupied = self.occupied(provider_id, date, None).await?;
        Ok(!overlaps_any(&occupied, start_minute, end_minute))
    }

    /// Book a new appointment. Requires the create capability;
    /// persists with status = pending and the acting user as creator.
    pub async fn create(
        &self,
        input: CreateAppointment,
        claims: &SessionClaims,
    ) -> BooklineResult<Appointment> {
        policy::require(claims, Action::CreateAppointment)?;

        validate_details(&input)?;
        let (start_minute, end_minute) = interval_of(input.start, input.duration_minutes)?;

        let occupied = self.occupied(input.provider_id, input.date, None).await?;
        if overlaps_any(&occupied, start_minute, end_minute) {
            return Err(conflict(input.provider_id, input.date, input.start));
        }

        let input = CreateAppointment {
            created_by: claims.user_id()?,
            ..input
        };
        // The store re-checks the slot inside its own transaction; a
        // concurrent writer that slipped past the check above loses
        // there and gets the same Conflict.
        let appt = self.repo.insert(input).await?;
        info!(
            appointment_id = %appt.id,
            provider_id = %appt.provider_id,
            date = %appt.date,
            "appointment created"
        );
        Ok(appt)
    }

    /// Apply a patch. Slot moves are re-checked against all *other*
    /// appointments of the target provider/date; status changes go
    /// through the lifecycle rules.
    pub async fn update(
        &self,
        id: Uuid,
        mut patch: UpdateAppointment,
        claims: &SessionClaims,
    ) -> BooklineResult<Appointment> {
        policy::require(claims, Action::ModifyAppointment)?;

        let current = self.repo.get_by_id(id).await?;

        if let Some(next) = patch.status {
            // Re-asserting the current status is a no-op, not a
            // transition.
            if next != current.status {
                current.status.ensure_transition_to(next)?;
            }
        }

        validate_patch(&patch)?;

        if patch.changes_slot() {
            let provider_id = patch.provider_id.unwrap_or(current.provider_id);
            let date = patch.date.unwrap_or(current.date);
            let start = patch.start.unwrap_or(current.start);
            let duration_minutes = patch.duration_minutes.unwrap_or(current.duration_minutes);

            if duration_minutes < MIN_DURATION_MINUTES {
                return Err(BooklineError::Validation {
                    message: format!(
                        "duration must be at least {MIN_DURATION_MINUTES} minutes"
                    ),
                });
            }
            let (start_minute, end_minute) = interval_of(start, duration_minutes)?;

            let occupied = self.occupied(provider_id, date, Some(id)).await?;
            if overlaps_any(&occupied, start_minute, end_minute) {
                return Err(conflict(provider_id, date, start));
            }

            // Hand the store the complete final slot so its
            // serialization point re-checks the same values.
            patch.provider_id = Some(provider_id);
            patch.date = Some(date);
            patch.start = Some(start);
            patch.duration_minutes = Some(duration_minutes);
        }

        self.repo.update(id, patch).await
    }

    /// Transition to cancelled, freeing the interval immediately.
    ///
    /// Cancelling an already-cancelled appointment is an idempotent
    /// no-op; cancelling a completed one is an invalid transition.
    pub async fn cancel(&self, id: Uuid, claims: &SessionClaims) -> BooklineResult<Appointment> {
        policy::require(claims, Action::ModifyAppointment)?;

        let current = self.repo.get_by_id(id).await?;
        if current.status == AppointmentStatus::Cancelled {
            return Ok(current);
        }
        current
            .status
            .ensure_transition_to(AppointmentStatus::Cancelled)?;

        let appt = self
            .repo
            .update(
                id,
                UpdateAppointment {
                    status: Some(AppointmentStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await?;
        info!(appointment_id = %appt.id, "appointment cancelled");
        Ok(appt)
    }

    /// Physical removal, used by management flows. Distinct from
    /// cancellation and not history-preserving.
    pub async fn remove(&self, id: Uuid, claims: &SessionClaims) -> BooklineResult<()> {
        policy::require(claims, Action::ModifyAppointment)?;
        self.repo.delete(id).await?;
        info!(appointment_id = %id, "appointment removed");
        Ok(())
    }

    /// Calendar listing, sorted by (date, start). Non-admin callers
    /// see only their own appointments regardless of the requested
    /// provider filter.
    pub async fn list_day(
        &self,
        query: DayQuery,
        claims: &SessionClaims,
    ) -> BooklineResult<Vec<Appointment>> {
        policy::require(claims, Action::ReadOwnAppointments)?;

        let mut filter = AppointmentFilter {
            provider_id: query.provider_id,
            date: query.date,
            ..Default::default()
        };
        if !claims.is_admin() {
            filter.provider_id = Some(claims.user_id()?);
        }
        self.repo.find(filter).await
    }

    /// Management listing across providers, sorted by (date, start).
    pub async fn list_range(
        &self,
        query: RangeQuery,
        claims: &SessionClaims,
    ) -> BooklineResult<Vec<Appointment>> {
        policy::require(claims, Action::ReadAllAppointments)?;

        self.repo
            .find(AppointmentFilter {
                from_date: query.from_date,
                to_date: query.to_date,
                status: query.status,
                ..Default::default()
            })
            .await
    }

    /// Current non-cancelled appointments for a provider+date,
    /// optionally excluding one record (the one being edited).
    async fn occupied(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> BooklineResult<Vec<Appointment>> {
        let appts = self
            .repo
            .find(AppointmentFilter {
                provider_id: Some(provider_id),
                date: Some(date),
                ..Default::default()
            })
            .await?;
        Ok(appts
            .into_iter()
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .filter(|a| Some(a.id) != exclude)
            .collect())
    }
}

/// Half-open interval in minutes from midnight for a start time and
/// duration. Zero duration and sub-minute start times are invalid
/// input, rejected rather than clamped.
fn interval_of(start: NaiveTime, duration_minutes: u32) -> BooklineResult<(u32, u32)> {
    if duration_minutes == 0 {
        return Err(BooklineError::Validation {
            message: "duration must be a positive number of minutes".into(),
        });
    }
    if start.second() != 0 || start.nanosecond() != 0 {
        return Err(BooklineError::Validation {
            message: "start time must be at whole-minute resolution".into(),
        });
    }
    let start_minute = start.hour() * 60 + start.minute();
    Ok((start_minute, start_minute + duration_minutes))
}

/// `[a0,a1)` and `[b0,b1)` overlap iff `a0 < b1 && b0 < a1`.
fn overlaps_any(occupied: &[Appointment], start_minute: u32, end_minute: u32) -> bool {
    occupied
        .iter()
        .any(|a| a.start_minute() < end_minute && start_minute < a.end_minute())
}

fn conflict(provider_id: Uuid, date: NaiveDate, start: NaiveTime) -> BooklineError {
    BooklineError::Conflict {
        message: format!(
            "provider {provider_id} already has an overlapping appointment on {date} around {start}"
        ),
    }
}

fn validate_details(input: &CreateAppointment) -> BooklineResult<()> {
    let required = [
        ("client_name", &input.client_name),
        ("client_last_name", &input.client_last_name),
        ("client_phone", &input.client_phone),
        ("provider_name", &input.provider_name),
        ("service", &input.service),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(BooklineError::Validation {
                message: format!("{field} is required"),
            });
        }
    }
    if input.duration_minutes < MIN_DURATION_MINUTES {
        return Err(BooklineError::Validation {
            message: format!("duration must be at least {MIN_DURATION_MINUTES} minutes"),
        });
    }
    ensure_non_negative("total_cost", input.total_cost)?;
    if let Some(deposit) = input.deposit {
        ensure_non_negative("deposit", deposit)?;
    }
    Ok(())
}

fn validate_patch(patch: &UpdateAppointment) -> BooklineResult<()> {
    let patched = [
        ("client_name", &patch.client_name),
        ("client_last_name", &patch.client_last_name),
        ("client_phone", &patch.client_phone),
        ("provider_name", &patch.provider_name),
        ("service", &patch.service),
    ];
    for (field, value) in patched {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(BooklineError::Validation {
                    message: format!("{field} must not be empty"),
                });
            }
        }
    }
    if let Some(cost) = patch.total_cost {
        ensure_non_negative("total_cost", cost)?;
    }
    if let Some(Some(deposit)) = patch.deposit {
        ensure_non_negative("deposit", deposit)?;
    }
    Ok(())
}

fn ensure_non_negative(field: &str, value: f64) -> BooklineResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BooklineError::Validation {
            message: format!("{field} must be a non-negative amount"),
        });
    }
    Ok(())
}
