//! Period statistics over the appointment set.
//!
//! Revenue counts completed appointments only; deposits count
//! confirmed appointments with a present deposit. Non-admin callers
//! are always narrowed to their own appointments before the store is
//! queried, regardless of any caller-supplied scope.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use bookline_auth::policy::{self, Action};
use bookline_auth::token::SessionClaims;
use bookline_core::error::BooklineResult;
use bookline_core::models::appointment::{AppointmentFilter, AppointmentStatus};
use bookline_core::repository::AppointmentRepository;

/// Reporting period, as a lower bound on appointment date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPeriod {
    /// Start of the current local day.
    Day,
    /// Now minus 7×24h.
    Week,
    /// First of the current local month.
    #[default]
    Month,
}

impl std::str::FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(StatsPeriod::Day),
            "week" => Ok(StatsPeriod::Week),
            "month" => Ok(StatsPeriod::Month),
            other => Err(format!("unknown stats period: {other}")),
        }
    }
}

/// Inclusive lower bound on appointment date for a period.
pub fn period_lower_bound(period: StatsPeriod, now: NaiveDateTime) -> NaiveDate {
    match period {
        StatsPeriod::Day => now.date(),
        StatsPeriod::Week => (now - Duration::days(7)).date(),
        StatsPeriod::Month => now.date().with_day(1).unwrap_or_else(|| now.date()),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSummary {
    pub total: u64,
    pub by_status: StatusCounts,
    /// Sum of total_cost over completed appointments.
    pub total_revenue: f64,
    /// Sum of present deposits over confirmed appointments.
    pub total_deposits: f64,
}

/// Statistics service.
pub struct StatsAggregator<R: AppointmentRepository> {
    repo: R,
}

impl<R: AppointmentRepository> StatsAggregator<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Summarize the caller-visible appointment set since the start of
    /// the period, measured against the current local time.
    pub async fn summarize(
        &self,
        period: StatsPeriod,
        claims: &SessionClaims,
    ) -> BooklineResult<StatsSummary> {
        self.summarize_at(period, claims, Local::now().naive_local())
            .await
    }

    /// [`summarize`](Self::summarize) against an explicit clock.
    pub async fn summarize_at(
        &self,
        period: StatsPeriod,
        claims: &SessionClaims,
        now: NaiveDateTime,
    ) -> BooklineResult<StatsSummary> {
        policy::require(claims, Action::ReadOwnAppointments)?;

        let mut filter = AppointmentFilter {
            from_date: Some(period_lower_bound(period, now)),
            ..Default::default()
        };
        if !claims.is_admin() {
            filter.provider_id = Some(claims.user_id()?);
        }

        let appointments = self.repo.find(filter).await?;

        let mut summary = StatsSummary {
            total: appointments.len() as u64,
            by_status: StatusCounts::default(),
            total_revenue: 0.0,
            total_deposits: 0.0,
        };
        for appt in &appointments {
            match appt.status {
                AppointmentStatus::Pending => summary.by_status.pending += 1,
                AppointmentStatus::Confirmed => {
                    summary.by_status.confirmed += 1;
                    summary.total_deposits += appt.deposit.unwrap_or(0.0);
                }
                AppointmentStatus::Completed => {
                    summary.by_status.completed += 1;
                    summary.total_revenue += appt.total_cost;
                }
                AppointmentStatus::Cancelled => summary.by_status.cancelled += 1,
            }
        }
        Ok(summary)
    }
}
