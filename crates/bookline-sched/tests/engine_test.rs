//! Integration tests for the scheduling engine against an in-memory
//! SurrealDB instance.

use chrono::{NaiveDate, NaiveTime};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

use bookline_auth::token::SessionClaims;
use bookline_core::error::BooklineError;
use bookline_core::models::appointment::{
    AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use bookline_core::models::user::Role;
use bookline_core::repository::AppointmentRepository;
use bookline_db::repository::SurrealAppointmentRepository;
use bookline_sched::engine::{DayQuery, RangeQuery, SchedulingEngine};

async fn setup() -> (
    SchedulingEngine<SurrealAppointmentRepository<Db>>,
    SurrealAppointmentRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    bookline_db::run_migrations(&db).await.unwrap();

    let repo = SurrealAppointmentRepository::new(db.clone());
    (SchedulingEngine::new(repo.clone()), repo)
}

fn claims(user_id: Uuid, role: Role, can_create: bool, can_modify: bool) -> SessionClaims {
    SessionClaims {
        sub: user_id.to_string(),
        email: "provider@example.com".into(),
        role,
        can_create_appointments: can_create,
        can_modify_appointments: can_modify,
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn booking(provider_id: Uuid, day: &str, start: NaiveTime, minutes: u32) -> CreateAppointment {
    CreateAppointment {
        client_name: "Ana".into(),
        client_last_name: "Ruiz".into(),
        client_phone: "600111222".into(),
        provider_id,
        provider_name: "Maria".into(),
        date: date(day),
        start,
        duration_minutes: minutes,
        service: "Haircut".into(),
        total_cost: 25.0,
        deposit: None,
        comments: None,
        created_by: Uuid::nil(),
    }
}

#[tokio::test]
async fn create_without_capability_is_forbidden() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(provider, Role::Provider, false, false);

    let result = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await;
    assert!(matches!(result, Err(BooklineError::Forbidden { .. })));
}

#[tokio::test]
async fn booking_scenario_overlap_and_abutment() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Provider, true, false);

    // 10:00–11:00 books fine and starts out pending.
    let first = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();
    assert_eq!(first.status, AppointmentStatus::Pending);
    assert_eq!(first.created_by, actor.user_id().unwrap());

    // 10:30–11:30 overlaps 10:00–11:00.
    let overlapping = engine
        .create(booking(provider, "2024-06-01", time(10, 30), 60), &actor)
        .await;
    assert!(matches!(overlapping, Err(BooklineError::Conflict { .. })));

    // 11:00–11:30 abuts the first interval and does not conflict.
    let abutting = engine
        .create(booking(provider, "2024-06-01", time(11, 0), 30), &actor)
        .await;
    assert!(abutting.is_ok());

    // A different provider can hold the same interval.
    let other_provider = Uuid::new_v4();
    let parallel = engine
        .create(booking(other_provider, "2024-06-01", time(10, 0), 60), &actor)
        .await;
    assert!(parallel.is_ok());
}

#[tokio::test]
async fn short_or_zero_duration_is_invalid_regardless_of_conflicts() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, false, false);

    let short = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 20), &actor)
        .await;
    assert!(matches!(short, Err(BooklineError::Validation { .. })));

    let zero = engine
        .is_slot_free(provider, date("2024-06-01"), time(10, 0), 0)
        .await;
    assert!(matches!(zero, Err(BooklineError::Validation { .. })));
}

#[tokio::test]
async fn slot_freedom_matches_the_half_open_interval_rule() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, false, false);

    engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();

    let d = date("2024-06-01");
    assert!(!engine.is_slot_free(provider, d, time(10, 30), 60).await.unwrap());
    assert!(!engine.is_slot_free(provider, d, time(9, 30), 31).await.unwrap());
    // Ends exactly at the existing start.
    assert!(engine.is_slot_free(provider, d, time(9, 0), 60).await.unwrap());
    // Starts exactly at the existing end.
    assert!(engine.is_slot_free(provider, d, time(11, 0), 60).await.unwrap());
    // Other date is unaffected.
    assert!(
        engine
            .is_slot_free(provider, date("2024-06-02"), time(10, 30), 60)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn occupancy_is_sorted_and_excludes_cancelled() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, false, false);

    let late = engine
        .create(booking(provider, "2024-06-01", time(16, 0), 30), &actor)
        .await
        .unwrap();
    let early = engine
        .create(booking(provider, "2024-06-01", time(9, 0), 45), &actor)
        .await
        .unwrap();
    let cancelled = engine
        .create(booking(provider, "2024-06-01", time(12, 0), 60), &actor)
        .await
        .unwrap();
    engine.cancel(cancelled.id, &actor).await.unwrap();

    let slots = engine
        .list_occupancy(provider, date("2024-06-01"))
        .await
        .unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].appointment_id, early.id);
    assert_eq!(slots[0].start_minute, 9 * 60);
    assert_eq!(slots[0].end_minute, 9 * 60 + 45);
    assert_eq!(slots[1].appointment_id, late.id);

    // Half-open intervals returned are pairwise disjoint.
    for pair in slots.windows(2) {
        assert!(pair[0].end_minute <= pair[1].start_minute);
    }
}

#[tokio::test]
async fn update_rechecks_conflicts_excluding_the_record_itself() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, true, true);

    let a = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();
    let b = engine
        .create(booking(provider, "2024-06-01", time(12, 0), 60), &actor)
        .await
        .unwrap();

    // Moving B onto A conflicts.
    let onto_a = engine
        .update(
            b.id,
            UpdateAppointment {
                start: Some(time(10, 30)),
                ..Default::default()
            },
            &actor,
        )
        .await;
    assert!(matches!(onto_a, Err(BooklineError::Conflict { .. })));

    // Shifting A within its own old interval must not conflict with
    // itself.
    let shifted = engine
        .update(
            a.id,
            UpdateAppointment {
                start: Some(time(10, 30)),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(shifted.start, time(10, 30));

    // Abutting the shifted A is fine.
    let abut = engine
        .update(
            b.id,
            UpdateAppointment {
                start: Some(time(11, 30)),
                ..Default::default()
            },
            &actor,
        )
        .await;
    assert!(abut.is_ok());
}

#[tokio::test]
async fn update_without_capability_is_forbidden_before_existence() {
    let (engine, _repo) = setup().await;
    let actor = claims(Uuid::new_v4(), Role::Provider, true, false);

    // Unknown id, but the caller must see Forbidden, not NotFound.
    let result = engine
        .update(Uuid::new_v4(), UpdateAppointment::default(), &actor)
        .await;
    assert!(matches!(result, Err(BooklineError::Forbidden { .. })));

    let modifier = claims(Uuid::new_v4(), Role::Provider, true, true);
    let result = engine
        .update(Uuid::new_v4(), UpdateAppointment::default(), &modifier)
        .await;
    assert!(matches!(result, Err(BooklineError::NotFound { .. })));
}

#[tokio::test]
async fn lifecycle_transitions_via_update() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, true, true);

    let appt = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();

    // pending -> completed skips confirmation.
    let skip = engine
        .update(
            appt.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
            &actor,
        )
        .await;
    assert!(matches!(skip, Err(BooklineError::InvalidTransition { .. })));

    let confirmed = engine
        .update(
            appt.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Confirmed),
                deposit: Some(Some(10.0)),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert_eq!(confirmed.deposit, Some(10.0));

    let completed = engine
        .update(
            appt.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    // Terminal: nothing leaves completed.
    for next in [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
    ] {
        let result = engine
            .update(
                appt.id,
                UpdateAppointment {
                    status: Some(next),
                    ..Default::default()
                },
                &actor,
            )
            .await;
        assert!(matches!(result, Err(BooklineError::InvalidTransition { .. })));
    }
}

#[tokio::test]
async fn cancel_frees_the_slot_and_is_idempotent() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Admin, true, true);

    let appt = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();

    let cancelled = engine.cancel(appt.id, &actor).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    // Second cancel is a no-op on the same terminal state.
    let again = engine.cancel(appt.id, &actor).await.unwrap();
    assert_eq!(again.status, AppointmentStatus::Cancelled);
    assert_eq!(again.updated_at, cancelled.updated_at);

    // The interval is free again.
    let rebooked = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await;
    assert!(rebooked.is_ok());

    // But a completed appointment cannot be cancelled.
    let other = engine
        .create(booking(provider, "2024-06-01", time(14, 0), 30), &actor)
        .await
        .unwrap();
    engine
        .update(
            other.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    engine
        .update(
            other.id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    let result = engine.cancel(other.id, &actor).await;
    assert!(matches!(result, Err(BooklineError::InvalidTransition { .. })));
}

#[tokio::test]
async fn remove_deletes_the_record() {
    let (engine, repo) = setup().await;
    let provider = Uuid::new_v4();
    let actor = claims(Uuid::new_v4(), Role::Provider, true, true);

    let appt = engine
        .create(booking(provider, "2024-06-01", time(10, 0), 60), &actor)
        .await
        .unwrap();

    engine.remove(appt.id, &actor).await.unwrap();
    assert!(matches!(
        repo.get_by_id(appt.id).await,
        Err(BooklineError::NotFound { .. })
    ));

    // Removing again reports the absence.
    assert!(matches!(
        engine.remove(appt.id, &actor).await,
        Err(BooklineError::NotFound { .. })
    ));

    let reader = claims(Uuid::new_v4(), Role::Provider, true, false);
    assert!(matches!(
        engine.remove(Uuid::new_v4(), &reader).await,
        Err(BooklineError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn store_level_conflict_is_indistinguishable_from_precheck() {
    let (_engine, repo) = setup().await;
    let provider = Uuid::new_v4();

    // Bypass the engine entirely: two writers that both believed the
    // slot was free. The store's transactional check rejects the
    // second with the same Conflict category.
    repo.insert(booking(provider, "2024-06-01", time(10, 0), 60))
        .await
        .unwrap();
    let second = repo
        .insert(booking(provider, "2024-06-01", time(10, 30), 60))
        .await;
    assert!(matches!(second, Err(BooklineError::Conflict { .. })));
}

#[tokio::test]
async fn day_listing_is_scoped_for_non_admins() {
    let (engine, _repo) = setup().await;
    let mine = Uuid::new_v4();
    let theirs = Uuid::new_v4();
    let admin = claims(Uuid::new_v4(), Role::Admin, true, true);

    engine
        .create(booking(mine, "2024-06-01", time(10, 0), 60), &admin)
        .await
        .unwrap();
    engine
        .create(booking(theirs, "2024-06-01", time(10, 0), 60), &admin)
        .await
        .unwrap();

    // A provider asking for someone else's calendar still only sees
    // their own.
    let me = claims(mine, Role::Provider, true, false);
    let listed = engine
        .list_day(
            DayQuery {
                date: Some(date("2024-06-01")),
                provider_id: Some(theirs),
            },
            &me,
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].provider_id, mine);

    // Admins see the full day.
    let all = engine
        .list_day(
            DayQuery {
                date: Some(date("2024-06-01")),
                provider_id: None,
            },
            &admin,
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn range_listing_filters_and_sorts() {
    let (engine, _repo) = setup().await;
    let provider = Uuid::new_v4();
    let admin = claims(Uuid::new_v4(), Role::Admin, true, true);

    let june_late = engine
        .create(booking(provider, "2024-06-20", time(9, 0), 30), &admin)
        .await
        .unwrap();
    let june_early = engine
        .create(booking(provider, "2024-06-05", time(15, 0), 30), &admin)
        .await
        .unwrap();
    engine
        .create(booking(provider, "2024-07-02", time(9, 0), 30), &admin)
        .await
        .unwrap();
    engine.cancel(june_late.id, &admin).await.unwrap();

    let june = engine
        .list_range(
            RangeQuery {
                from_date: Some(date("2024-06-01")),
                to_date: Some(date("2024-06-30")),
                status: None,
            },
            &admin,
        )
        .await
        .unwrap();
    assert_eq!(june.len(), 2);
    assert_eq!(june[0].id, june_early.id);
    assert_eq!(june[1].id, june_late.id);

    let cancelled_only = engine
        .list_range(
            RangeQuery {
                from_date: None,
                to_date: None,
                status: Some(AppointmentStatus::Cancelled),
            },
            &admin,
        )
        .await
        .unwrap();
    assert_eq!(cancelled_only.len(), 1);
    assert_eq!(cancelled_only[0].id, june_late.id);

    // Providers may read the full calendar too.
    let provider_claims = claims(provider, Role::Provider, false, false);
    let seen = engine
        .list_range(RangeQuery::default(), &provider_claims)
        .await
        .unwrap();
    assert_eq!(seen.len(), 3);
}
