use crate::domain::models::StrictModeTimer;
use crate::domain::strict_mode::{TimeLeft, TimerDuration, MAX_TIMER_DURATION_MS};
use crate::infrastructure::auth::AuthGateway;
use crate::infrastructure::date_provider::DateProvider;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::timer_repository::TimerRepository;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrictModeError {
    #[error("User not authenticated")]
    NotAuthenticated,
    #[error("Invalid timer duration")]
    InvalidDuration,
    #[error("Timer duration exceeds maximum allowed (30 days)")]
    DurationTooLong,
    #[error("Strict mode timer is already active")]
    TimerAlreadyActive,
    #[error("No active timer to extend")]
    NoActiveTimer,
    #[error("Invalid extension duration")]
    InvalidExtension,
    #[error("Extended timer duration exceeds maximum allowed (30 days)")]
    ExtensionTooLong,
    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrictModeStatus {
    Inactive,
    Active {
        ended_at: String,
        time_left: TimeLeft,
    },
}

impl StrictModeStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Strict-mode timer: no timer, running, or elapsed (which reads as no timer).
pub struct StrictModeService<R, A>
where
    R: TimerRepository,
    A: AuthGateway,
{
    timer_repository: Arc<R>,
    auth: Arc<A>,
    date_provider: Arc<dyn DateProvider>,
}

impl<R, A> StrictModeService<R, A>
where
    R: TimerRepository,
    A: AuthGateway,
{
    pub fn new(timer_repository: Arc<R>, auth: Arc<A>, date_provider: Arc<dyn DateProvider>) -> Self {
        Self {
            timer_repository,
            auth,
            date_provider,
        }
    }

    pub fn date_provider(&self) -> &Arc<dyn DateProvider> {
        &self.date_provider
    }

    pub fn start_timer(&self, duration: TimerDuration) -> Result<StrictModeTimer, StrictModeError> {
        let user_id = self.require_user()?;
        let duration_ms = duration.as_millis();
        if duration_ms <= 0 {
            return Err(StrictModeError::InvalidDuration);
        }
        if duration_ms > MAX_TIMER_DURATION_MS {
            return Err(StrictModeError::DurationTooLong);
        }
        // a running timer only moves through extend_timer
        let now_ms = self.date_provider.now_ms();
        if self.active_ended_at_ms(&user_id, now_ms)?.is_some() {
            return Err(StrictModeError::TimerAlreadyActive);
        }

        let ended_at = self.date_provider.ms_to_iso_string(now_ms + duration_ms)?;
        self.timer_repository.save_timer(&user_id, &ended_at)?;
        Ok(StrictModeTimer { ended_at })
    }

    pub fn extend_timer(&self, additional: TimerDuration) -> Result<StrictModeTimer, StrictModeError> {
        let user_id = self.require_user()?;
        let now_ms = self.date_provider.now_ms();
        let Some(ended_at_ms) = self.active_ended_at_ms(&user_id, now_ms)? else {
            return Err(StrictModeError::NoActiveTimer);
        };

        let additional_ms = additional.as_millis();
        if additional_ms <= 0 {
            return Err(StrictModeError::InvalidExtension);
        }
        let remaining_ms = ended_at_ms - now_ms;
        if remaining_ms.saturating_add(additional_ms) > MAX_TIMER_DURATION_MS {
            return Err(StrictModeError::ExtensionTooLong);
        }

        let ended_at = self
            .date_provider
            .ms_to_iso_string(ended_at_ms + additional_ms)?;
        self.timer_repository.save_timer(&user_id, &ended_at)?;
        Ok(StrictModeTimer { ended_at })
    }

    /// Signed-out users have no strict mode.
    pub fn status(&self) -> Result<StrictModeStatus, StrictModeError> {
        let Some(user_id) = self.auth.current_user_id() else {
            return Ok(StrictModeStatus::Inactive);
        };
        let now_ms = self.date_provider.now_ms();
        match self.active_ended_at_ms(&user_id, now_ms)? {
            Some(ended_at_ms) => Ok(StrictModeStatus::Active {
                ended_at: self.date_provider.ms_to_iso_string(ended_at_ms)?,
                time_left: TimeLeft::from_millis(ended_at_ms - now_ms),
            }),
            None => Ok(StrictModeStatus::Inactive),
        }
    }

    pub fn is_active(&self) -> Result<bool, StrictModeError> {
        Ok(self.status()?.is_active())
    }

    fn require_user(&self) -> Result<String, StrictModeError> {
        self.auth
            .current_user_id()
            .ok_or(StrictModeError::NotAuthenticated)
    }

    fn active_ended_at_ms(&self, user_id: &str, now_ms: i64) -> Result<Option<i64>, StrictModeError> {
        let Some(stored) = self.timer_repository.load_timer(user_id)? else {
            return Ok(None);
        };
        let ended_at_ms = self.date_provider.parse_iso_string(&stored)?;
        Ok((ended_at_ms > now_ms).then_some(ended_at_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::InMemoryAuthGateway;
    use crate::infrastructure::date_provider::StubDateProvider;
    use crate::infrastructure::timer_repository::InMemoryTimerRepository;
    use proptest::prelude::*;

    const MINUTE_MS: i64 = 60 * 1000;
    const HOUR_MS: i64 = 60 * MINUTE_MS;

    struct Fixture {
        repository: Arc<InMemoryTimerRepository>,
        auth: Arc<InMemoryAuthGateway>,
        clock: Arc<StubDateProvider>,
        service: StrictModeService<InMemoryTimerRepository, InMemoryAuthGateway>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryTimerRepository::default());
        let auth = Arc::new(InMemoryAuthGateway::signed_in("user-1"));
        let clock = Arc::new(StubDateProvider::from_iso("2026-02-16T09:00:00Z").expect("clock"));
        let service = StrictModeService::new(
            Arc::clone(&repository),
            Arc::clone(&auth),
            Arc::clone(&clock) as Arc<dyn DateProvider>,
        );
        Fixture {
            repository,
            auth,
            clock,
            service,
        }
    }

    fn stored(fixture: &Fixture) -> Option<String> {
        fixture.repository.load_timer("user-1").expect("load timer")
    }

    #[test]
    fn start_timer_persists_expiry() {
        let fixture = fixture();
        let timer = fixture
            .service
            .start_timer(TimerDuration::new(0, 1, 0))
            .expect("start");
        assert_eq!(timer.ended_at, "2026-02-16T10:00:00.000Z");
        assert_eq!(stored(&fixture), Some(timer.ended_at));
    }

    #[test]
    fn start_timer_rejects_invalid_durations() {
        let fixture = fixture();
        assert!(matches!(
            fixture.service.start_timer(TimerDuration::default()),
            Err(StrictModeError::InvalidDuration)
        ));
        assert!(matches!(
            fixture.service.start_timer(TimerDuration::minutes(-1)),
            Err(StrictModeError::InvalidDuration)
        ));
        let too_long = fixture
            .service
            .start_timer(TimerDuration::new(30, 0, 1))
            .expect_err("too long");
        assert_eq!(
            too_long.to_string(),
            "Timer duration exceeds maximum allowed (30 days)"
        );
        assert!(fixture.service.start_timer(TimerDuration::new(30, 0, 0)).is_ok());
    }

    #[test]
    fn start_timer_cannot_replace_a_running_timer() {
        let fixture = fixture();
        let long = fixture
            .service
            .start_timer(TimerDuration::new(29, 0, 0))
            .expect("start");
        let error = fixture
            .service
            .start_timer(TimerDuration::minutes(1))
            .expect_err("running timer");
        assert!(matches!(error, StrictModeError::TimerAlreadyActive));
        assert_eq!(stored(&fixture), Some(long.ended_at));
    }

    #[test]
    fn start_timer_after_expiry_begins_a_new_timer() {
        let fixture = fixture();
        fixture
            .service
            .start_timer(TimerDuration::minutes(5))
            .expect("first start");
        fixture.clock.advance_ms(5 * MINUTE_MS);
        let restarted = fixture
            .service
            .start_timer(TimerDuration::minutes(10))
            .expect("restart after expiry");
        assert_eq!(restarted.ended_at, "2026-02-16T09:15:00.000Z");
        assert_eq!(stored(&fixture), Some(restarted.ended_at));
    }

    #[test]
    fn timer_use_cases_require_a_user() {
        let fixture = fixture();
        fixture.auth.sign_out();
        let start = fixture
            .service
            .start_timer(TimerDuration::hours(1))
            .expect_err("unauthenticated start");
        assert_eq!(start.to_string(), "User not authenticated");
        let extend = fixture
            .service
            .extend_timer(TimerDuration::minutes(30))
            .expect_err("unauthenticated extend");
        assert_eq!(extend.to_string(), "User not authenticated");
        assert_eq!(
            fixture.service.status().expect("status"),
            StrictModeStatus::Inactive
        );
    }

    #[test]
    fn extend_adds_to_existing_expiry() {
        let fixture = fixture();
        let original = fixture
            .service
            .start_timer(TimerDuration::new(0, 1, 0))
            .expect("start");
        fixture.clock.advance_ms(10 * MINUTE_MS);
        let extended = fixture
            .service
            .extend_timer(TimerDuration::new(0, 0, 30))
            .expect("extend");

        let original_ms = fixture
            .clock
            .parse_iso_string(&original.ended_at)
            .expect("parse original");
        let extended_ms = fixture
            .clock
            .parse_iso_string(&extended.ended_at)
            .expect("parse extended");
        assert_eq!(extended_ms, original_ms + 30 * MINUTE_MS);
        assert_eq!(stored(&fixture), Some(extended.ended_at));
    }

    #[test]
    fn extend_without_timer_fails() {
        let fixture = fixture();
        let error = fixture
            .service
            .extend_timer(TimerDuration::minutes(30))
            .expect_err("no timer");
        assert_eq!(error.to_string(), "No active timer to extend");
    }

    #[test]
    fn extend_after_expiry_fails() {
        let fixture = fixture();
        fixture
            .repository
            .save_timer("user-1", "2026-02-16T08:59:59.000Z")
            .expect("seed expired timer");
        assert!(matches!(
            fixture.service.extend_timer(TimerDuration::minutes(30)),
            Err(StrictModeError::NoActiveTimer)
        ));

        fixture
            .service
            .start_timer(TimerDuration::minutes(5))
            .expect("start");
        fixture.clock.advance_ms(5 * MINUTE_MS);
        assert!(matches!(
            fixture.service.extend_timer(TimerDuration::minutes(30)),
            Err(StrictModeError::NoActiveTimer)
        ));
        assert!(!fixture.service.is_active().expect("is active"));
    }

    #[test]
    fn extend_rejects_non_positive_extension() {
        let fixture = fixture();
        fixture
            .service
            .start_timer(TimerDuration::hours(1))
            .expect("start");
        let error = fixture
            .service
            .extend_timer(TimerDuration::default())
            .expect_err("zero extension");
        assert_eq!(error.to_string(), "Invalid extension duration");
    }

    #[test]
    fn extend_beyond_thirty_days_leaves_state_unchanged() {
        let fixture = fixture();
        let started = fixture
            .service
            .start_timer(TimerDuration::hours(2))
            .expect("start");
        let error = fixture
            .service
            .extend_timer(TimerDuration::new(29, 23, 0))
            .expect_err("too long");
        assert_eq!(
            error.to_string(),
            "Extended timer duration exceeds maximum allowed (30 days)"
        );
        assert_eq!(stored(&fixture), Some(started.ended_at));
    }

    #[test]
    fn status_reports_time_left() {
        let fixture = fixture();
        assert_eq!(
            fixture.service.status().expect("status"),
            StrictModeStatus::Inactive
        );
        fixture
            .service
            .start_timer(TimerDuration::new(1, 2, 3))
            .expect("start");
        fixture.clock.advance_ms(HOUR_MS);

        match fixture.service.status().expect("status") {
            StrictModeStatus::Active { ended_at, time_left } => {
                assert_eq!(ended_at, "2026-02-17T11:03:00.000Z");
                assert_eq!(time_left.days, 1);
                assert_eq!(time_left.hours, 1);
                assert_eq!(time_left.minutes, 3);
            }
            StrictModeStatus::Inactive => panic!("expected active timer"),
        }
    }

    #[test]
    fn corrupt_stored_timer_surfaces_as_infra_error() {
        let fixture = fixture();
        fixture
            .repository
            .save_timer("user-1", "not-a-date")
            .expect("seed corrupt timer");
        assert!(matches!(
            fixture.service.status(),
            Err(StrictModeError::Infra(InfraError::InvalidTimestamp(_)))
        ));
    }

    // Feature: sirenblock, Property 3: extension moves the expiry by exactly the extension
    proptest! {
        #[test]
        fn property3_extension_shifts_expiry_exactly(
            start_minutes in 1i64..(24 * 60),
            extension_minutes in 1i64..(24 * 60),
            elapsed_minutes in 0i64..(24 * 60)
        ) {
            prop_assume!(elapsed_minutes < start_minutes);
            let fixture = fixture();
            let started = fixture.service.start_timer(TimerDuration::minutes(start_minutes)).expect("start");
            fixture.clock.advance_ms(elapsed_minutes * MINUTE_MS);

            let extended = fixture.service.extend_timer(TimerDuration::minutes(extension_minutes)).expect("extend");
            let started_ms = fixture.clock.parse_iso_string(&started.ended_at).expect("parse");
            let extended_ms = fixture.clock.parse_iso_string(&extended.ended_at).expect("parse");
            prop_assert_eq!(extended_ms - started_ms, extension_minutes * MINUTE_MS);
        }
    }
}
