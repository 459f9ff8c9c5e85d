//! SurrealDB implementation of [`AppointmentRepository`].
//!
//! The engine's occupancy pre-check is not atomic with the write, so
//! every insert (and every update that moves the reserved interval)
//! runs inside a transaction that re-checks overlap against the
//! current table state and throws; the thrown marker is mapped to
//! [`DbError::Conflict`], making a lost race indistinguishable from a
//! pre-check conflict for the caller.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use bookline_core::error::BooklineResult;
use bookline_core::models::appointment::{
    Appointment, AppointmentFilter, AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use bookline_core::repository::AppointmentRepository;

use crate::error::DbError;

/// Marker thrown by the in-transaction overlap check.
const SLOT_CONFLICT: &str = "slot_conflict";

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AppointmentRowWithId {
    record_id: String,
    client_name: String,
    client_last_name: String,
    client_phone: String,
    provider_id: String,
    provider_name: String,
    date: String,
    start_minute: u32,
    duration_minutes: u32,
    /// Denormalized for the in-transaction overlap check; the model
    /// recomputes it from start + duration.
    #[allow(dead_code)]
    end_minute: u32,
    service: String,
    total_cost: f64,
    status: String,
    deposit: Option<f64>,
    comments: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn time_from_minute(minute: u32) -> Result<NaiveTime, DbError> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
        .ok_or_else(|| DbError::Query(format!("stored start_minute out of range: {minute}")))
}

fn start_minute_of(start: NaiveTime) -> u32 {
    start.hour() * 60 + start.minute()
}

impl AppointmentRowWithId {
    fn try_into_appointment(self) -> Result<Appointment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let provider_id = Uuid::parse_str(&self.provider_id)
            .map_err(|e| DbError::Query(format!("invalid provider UUID: {e}")))?;
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Query(format!("invalid creator UUID: {e}")))?;
        let date = self
            .date
            .parse::<NaiveDate>()
            .map_err(|e| DbError::Query(format!("invalid stored date: {e}")))?;
        let status = self
            .status
            .parse::<AppointmentStatus>()
            .map_err(DbError::Query)?;

        Ok(Appointment {
            id,
            client_name: self.client_name,
            client_last_name: self.client_last_name,
            client_phone: self.client_phone,
            provider_id,
            provider_name: self.provider_name,
            date,
            start: time_from_minute(self.start_minute)?,
            duration_minutes: self.duration_minutes,
            service: self.service,
            total_cost: self.total_cost,
            status,
            deposit: self.deposit,
            comments: self.comments,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Map a query/check error, recognizing the thrown conflict marker.
fn map_write_err(e: impl std::fmt::Display) -> DbError {
    let msg = e.to_string();
    if msg.contains(SLOT_CONFLICT) {
        DbError::Conflict {
            message: "an overlapping appointment already exists for this provider".into(),
        }
    } else {
        DbError::Query(msg)
    }
}

/// SurrealDB implementation of the Appointment repository.
#[derive(Clone)]
pub struct SurrealAppointmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppointmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppointmentRepository for SurrealAppointmentRepository<C> {
    async fn insert(&self, input: CreateAppointment) -> BooklineResult<Appointment> {
        let id = Uuid::new_v4();
        let start_minute = start_minute_of(input.start);
        let end_minute = start_minute + input.duration_minutes;

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $clash = array::len((SELECT VALUE id FROM appointment \
                     WHERE provider_id = $provider_id AND date = $date \
                     AND status != 'cancelled' \
                     AND start_minute < $end_minute \
                     AND end_minute > $start_minute)); \
                 IF $clash > 0 { THROW 'slot_conflict' }; \
                 CREATE type::record('appointment', $id) SET \
                     client_name = $client_name, \
                     client_last_name = $client_last_name, \
                     client_phone = $client_phone, \
                     provider_id = $provider_id, \
                     provider_name = $provider_name, \
                     date = $date, \
                     start_minute = $start_minute, \
                     duration_minutes = $duration_minutes, \
                     end_minute = $end_minute, \
                     service = $service, \
                     total_cost = $total_cost, \
                     status = 'pending', \
                     deposit = $deposit, \
                     comments = $comments, \
                     created_by = $created_by \
                     RETURN NONE; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("client_name", input.client_name))
            .bind(("client_last_name", input.client_last_name))
            .bind(("client_phone", input.client_phone))
            .bind(("provider_id", input.provider_id.to_string()))
            .bind(("provider_name", input.provider_name))
            .bind(("date", input.date.to_string()))
            .bind(("start_minute", start_minute))
            .bind(("duration_minutes", input.duration_minutes))
            .bind(("end_minute", end_minute))
            .bind(("service", input.service))
            .bind(("total_cost", input.total_cost))
            .bind(("deposit", input.deposit))
            .bind(("comments", input.comments))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(map_write_err)?;

        result.check().map_err(map_write_err)?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> BooklineResult<Appointment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM \
                 type::record('appointment', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        Ok(row.try_into_appointment()?)
    }

    async fn update(&self, id: Uuid, patch: UpdateAppointment) -> BooklineResult<Appointment> {
        let id_str = id.to_string();
        let slot_change = patch.changes_slot();

        let mut sets = Vec::new();
        if patch.client_name.is_some() {
            sets.push("client_name = $client_name");
        }
        if patch.client_last_name.is_some() {
            sets.push("client_last_name = $client_last_name");
        }
        if patch.client_phone.is_some() {
            sets.push("client_phone = $client_phone");
        }
        if slot_change {
            // The engine supplies all four slot fields together.
            sets.push("provider_id = $provider_id");
            sets.push("date = $date");
            sets.push("start_minute = $start_minute");
            sets.push("duration_minutes = $duration_minutes");
            sets.push("end_minute = $end_minute");
        }
        if patch.provider_name.is_some() {
            sets.push("provider_name = $provider_name");
        }
        if patch.service.is_some() {
            sets.push("service = $service");
        }
        if patch.total_cost.is_some() {
            sets.push("total_cost = $total_cost");
        }
        if patch.status.is_some() {
            sets.push("status = $status");
        }
        if patch.deposit.is_some() {
            sets.push("deposit = $deposit");
        }
        if patch.comments.is_some() {
            sets.push("comments = $comments");
        }
        sets.push("updated_at = time::now()");

        let update_stmt = format!(
            "UPDATE type::record('appointment', $id) SET {} RETURN NONE",
            sets.join(", ")
        );
        // A slot move races against concurrent bookings exactly like
        // an insert; wrap the same overlap re-check around it,
        // excluding the record being edited.
        let query = if slot_change {
            format!(
                "BEGIN TRANSACTION; \
                 LET $clash = array::len((SELECT VALUE id FROM appointment \
                     WHERE provider_id = $provider_id AND date = $date \
                     AND status != 'cancelled' \
                     AND meta::id(id) != $id \
                     AND start_minute < $end_minute \
                     AND end_minute > $start_minute)); \
                 IF $clash > 0 {{ THROW 'slot_conflict' }}; \
                 {update_stmt}; \
                 COMMIT TRANSACTION;"
            )
        } else {
            format!("{update_stmt};")
        };

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(client_name) = patch.client_name {
            builder = builder.bind(("client_name", client_name));
        }
        if let Some(client_last_name) = patch.client_last_name {
            builder = builder.bind(("client_last_name", client_last_name));
        }
        if let Some(client_phone) = patch.client_phone {
            builder = builder.bind(("client_phone", client_phone));
        }
        if slot_change {
            let (provider_id, date, start, duration) = match (
                patch.provider_id,
                patch.date,
                patch.start,
                patch.duration_minutes,
            ) {
                (Some(p), Some(d), Some(s), Some(m)) => (p, d, s, m),
                _ => {
                    return Err(DbError::Query(
                        "slot patch must carry provider, date, start, and duration".into(),
                    )
                    .into());
                }
            };
            let start_minute = start_minute_of(start);
            builder = builder
                .bind(("provider_id", provider_id.to_string()))
                .bind(("date", date.to_string()))
                .bind(("start_minute", start_minute))
                .bind(("duration_minutes", duration))
                .bind(("end_minute", start_minute + duration));
        }
        if let Some(provider_name) = patch.provider_name {
            builder = builder.bind(("provider_name", provider_name));
        }
        if let Some(service) = patch.service {
            builder = builder.bind(("service", service));
        }
        if let Some(total_cost) = patch.total_cost {
            builder = builder.bind(("total_cost", total_cost));
        }
        if let Some(status) = patch.status {
            builder = builder.bind(("status", status.to_string()));
        }
        if let Some(deposit) = patch.deposit {
            // Outer Some = field is patched; inner None clears it.
            builder = builder.bind(("deposit", deposit));
        }
        if let Some(comments) = patch.comments {
            builder = builder.bind(("comments", comments));
        }

        let result = builder.await.map_err(map_write_err)?;
        result.check().map_err(map_write_err)?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> BooklineResult<()> {
        // Surface NotFound for a missing record before the DELETE,
        // which succeeds silently either way.
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('appointment', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn find(&self, filter: AppointmentFilter) -> BooklineResult<Vec<Appointment>> {
        let mut conditions = Vec::new();
        if filter.provider_id.is_some() {
            conditions.push("provider_id = $provider_id");
        }
        if filter.date.is_some() {
            conditions.push("date = $date");
        }
        if filter.from_date.is_some() {
            // ISO date strings are zero-padded, so string comparison
            // is chronological.
            conditions.push("date >= $from_date");
        }
        if filter.to_date.is_some() {
            conditions.push("date <= $to_date");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM appointment \
             {where_clause}ORDER BY date ASC, start_minute ASC"
        );

        let mut builder = self.db.query(&query);
        if let Some(provider_id) = filter.provider_id {
            builder = builder.bind(("provider_id", provider_id.to_string()));
        }
        if let Some(date) = filter.date {
            builder = builder.bind(("date", date.to_string()));
        }
        if let Some(from_date) = filter.from_date {
            builder = builder.bind(("from_date", from_date.to_string()));
        }
        if let Some(to_date) = filter.to_date {
            builder = builder.bind(("to_date", to_date.to_string()));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AppointmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let appointments = rows
            .into_iter()
            .map(|row| row.try_into_appointment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(appointments)
    }
}
