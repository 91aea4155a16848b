// --------------------------------------------------
// Notification scheduler.
//
// A single tokio task owns the current schedule, settings,
// dismissal state and the one pending wake-up. Each loop turn
// computes the next deadline with `next_deadline`, then waits on
// either that deadline or an incoming command. Dropping the sleep
// future at the end of a turn cancels the old wake-up, so at most
// one is ever pending.
// --------------------------------------------------

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::Duration,
};

use crate::clock::Clock;
use crate::models::Prayer;
use crate::settings::NotificationSettings;
use crate::trigger::{evaluate, Decision, DismissalState};
use crate::windows::{next_window, PrayerSchedule};

// Re-check delay once every boundary of the day has passed, to catch rollover.
pub const FALLBACK_RECHECK_S: i64 = 60;

// Sleep slightly past a boundary so the evaluation lands inside it.
const WAKE_BUFFER: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Armed { deadline: NaiveDateTime },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveAlert {
    pub prayer: Prayer,
    pub until: NaiveDateTime,
}

#[derive(Debug)]
pub enum Command {
    ScheduleLoaded(PrayerSchedule),
    SettingsChanged(NotificationSettings),
    Dismiss,
}

// What the display side can observe.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: SchedulerState,
    pub alert: Option<ActiveAlert>,
    pub dismissed_for: Option<Prayer>,
    pub schedule_date: Option<NaiveDate>,
    pub fires: u64,
}

type Evaluator =
    fn(&PrayerSchedule, &NotificationSettings, NaiveDateTime, &mut DismissalState) -> Decision;

// Earliest future sub-window boundary, anchored to today.
//
// Idle when there is no schedule, notifications are off, or nothing is configured.
// Falls back to now + 60s when all of today's boundaries have passed.
pub fn next_deadline(
    schedule: Option<&PrayerSchedule>,
    settings: &NotificationSettings,
    now: NaiveDateTime,
) -> SchedulerState {
    if schedule.is_none() || !settings.enabled || !settings.any_configured() {
        return SchedulerState::Idle;
    }

    let today = now.date();
    let earliest = Prayer::ALL
        .into_iter()
        .filter_map(|p| settings.sub_window(p).bounds())
        .flat_map(|(start, end)| [start, end])
        .map(|t| today.and_time(t))
        .filter(|t| *t > now)
        .min();

    SchedulerState::Armed {
        deadline: earliest.unwrap_or(now + chrono::Duration::seconds(FALLBACK_RECHECK_S)),
    }
}

#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<Snapshot>,
}

impl SchedulerHandle {
    pub async fn schedule_loaded(&self, schedule: PrayerSchedule) {
        self.send(Command::ScheduleLoaded(schedule)).await;
    }

    pub async fn settings_changed(&self, settings: NotificationSettings) {
        self.send(Command::SettingsChanged(settings)).await;
    }

    pub async fn dismiss(&self) {
        self.send(Command::Dismiss).await;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    async fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command).await {
            warn!("scheduler stopped, dropping {:?}", e.0);
        }
    }
}

pub fn spawn(
    clock: Arc<dyn Clock>,
    settings: NotificationSettings,
) -> (SchedulerHandle, JoinHandle<()>) {
    spawn_with(clock, settings, evaluate)
}

fn spawn_with(
    clock: Arc<dyn Clock>,
    settings: NotificationSettings,
    evaluator: Evaluator,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::channel(16);
    let (snapshot_tx, snapshot) = watch::channel(Snapshot {
        state: SchedulerState::Idle,
        alert: None,
        dismissed_for: None,
        schedule_date: None,
        fires: 0,
    });

    let driver = Driver {
        clock,
        evaluator,
        schedule: None,
        settings,
        dismissal: DismissalState::default(),
        alert: None,
        state: SchedulerState::Idle,
        fires: 0,
        snapshot_tx,
    };

    let task = tokio::spawn(driver.run(rx));
    (SchedulerHandle { commands, snapshot }, task)
}

struct Driver {
    clock: Arc<dyn Clock>,
    evaluator: Evaluator,
    schedule: Option<PrayerSchedule>,
    settings: NotificationSettings,
    dismissal: DismissalState,
    alert: Option<ActiveAlert>,
    state: SchedulerState,
    fires: u64,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        loop {
            let now = self.clock.now();
            let state = next_deadline(self.schedule.as_ref(), &self.settings, now);
            if state != self.state {
                match state {
                    SchedulerState::Idle => info!("scheduler idle"),
                    SchedulerState::Armed { deadline } => debug!("scheduler armed for {deadline}"),
                }
            }
            self.state = state;
            self.publish();

            // One sleep covers both the sub-window deadline and a pending dismissal's expiry.
            let expiry = self.dismissal_expiry(now);
            let wake_at = match state {
                SchedulerState::Idle => expiry,
                SchedulerState::Armed { deadline } => {
                    Some(expiry.map_or(deadline, |e| e.min(deadline)))
                }
            };
            let wait = wake_at
                .map(|at| (at - now).to_std().unwrap_or(Duration::ZERO) + WAKE_BUFFER);

            tokio::select! {
                _ = sleep_or_forever(wait) => {
                    self.fires += 1;
                    self.evaluate_now();
                }
                command = rx.recv() => {
                    match command {
                        Some(command) => self.apply(command),
                        None => {
                            info!("scheduler channel closed, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::ScheduleLoaded(schedule) => {
                info!("scheduler received schedule for {}", schedule.date());
                self.schedule = Some(schedule);
            }
            Command::SettingsChanged(settings) => {
                self.settings = settings;
            }
            Command::Dismiss => {
                if let Some(schedule) = &self.schedule {
                    let prayer = self.dismissal.dismiss(schedule, self.clock.now());
                    info!("alert dismissed for {prayer}");
                }
                self.alert = None;
                return;
            }
        }
        self.evaluate_now();
    }

    // A dismissal lasts until the next prayer window opens.
    fn dismissal_expiry(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.dismissal.dismissed_for()?;
        let schedule = self.schedule.as_ref()?;
        Some(next_window(schedule, now).time)
    }

    // Evaluation runs behind a failure boundary; the loop re-arms regardless.
    fn evaluate_now(&mut self) {
        let Some(schedule) = &self.schedule else {
            return;
        };
        let now = self.clock.now();
        let evaluator = self.evaluator;
        let settings = &self.settings;
        let dismissal = &mut self.dismissal;

        let decision = match catch_unwind(AssertUnwindSafe(|| {
            evaluator(schedule, settings, now, dismissal)
        })) {
            Ok(decision) => decision,
            Err(_) => {
                error!("trigger evaluation panicked at {now}, keeping previous alert state");
                return;
            }
        };

        match decision {
            Decision::Show { prayer, until } => {
                if self.alert.is_none() {
                    info!("showing alert for {prayer} until {until}");
                }
                self.alert = Some(ActiveAlert { prayer, until });
            }
            Decision::Hide => {
                if let Some(alert) = self.alert.take() {
                    info!("hiding alert for {}", alert.prayer);
                }
            }
            Decision::NoChange => {}
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Snapshot {
            state: self.state,
            alert: self.alert,
            dismissed_for: self.dismissal.dismissed_for(),
            schedule_date: self.schedule.as_ref().map(PrayerSchedule::date),
            fires: self.fires,
        });
    }
}

async fn sleep_or_forever(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::settings::SubWindow;
    use crate::windows::parse_hhmm;
    use crate::windows::tests::{at, sample_schedule};

    fn with_sub_windows(windows: &[(Prayer, &str, &str)]) -> NotificationSettings {
        let mut s = NotificationSettings::default();
        for (prayer, start, end) in windows {
            s.prayers.insert(
                *prayer,
                SubWindow::new(parse_hhmm(start).unwrap(), parse_hhmm(end).unwrap()),
            );
        }
        s
    }

    #[test]
    fn deadline_is_earliest_future_boundary() {
        let s = with_sub_windows(&[
            (Prayer::Asr, "15:50", "16:00"),
            (Prayer::Maghrib, "18:25", "18:40"),
        ]);
        let schedule = sample_schedule();
        let armed = |hhmm| next_deadline(Some(&schedule), &s, at(hhmm));

        assert_eq!(armed("12:00"), SchedulerState::Armed { deadline: at("15:50") });
        assert_eq!(armed("15:50"), SchedulerState::Armed { deadline: at("16:00") });
        assert_eq!(armed("17:00"), SchedulerState::Armed { deadline: at("18:25") });
    }

    #[test]
    fn deadline_falls_back_after_last_boundary() {
        let s = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        assert_eq!(
            next_deadline(Some(&sample_schedule()), &s, at("21:00")),
            SchedulerState::Armed {
                deadline: at("21:01")
            }
        );
    }

    #[test]
    fn idle_without_schedule_settings_or_enable() {
        let s = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        let schedule = sample_schedule();
        assert_eq!(next_deadline(None, &s, at("12:00")), SchedulerState::Idle);

        let mut off = s.clone();
        off.enabled = false;
        assert_eq!(next_deadline(Some(&schedule), &off, at("12:00")), SchedulerState::Idle);

        let empty = NotificationSettings::default();
        assert_eq!(next_deadline(Some(&schedule), &empty, at("12:00")), SchedulerState::Idle);

        // a half-filled sub-window never triggers, so it does not arm either
        let mut half = NotificationSettings::default();
        half.prayers.insert(
            Prayer::Asr,
            SubWindow {
                start: parse_hhmm("15:50"),
                end: None,
            },
        );
        assert_eq!(next_deadline(Some(&schedule), &half, at("12:00")), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn shows_then_hides_at_sub_window_boundaries() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:40")));
        let (handle, _task) = spawn(clock, with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]));

        handle.schedule_loaded(sample_schedule()).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.state, SchedulerState::Armed { deadline: at("15:50") });
        assert_eq!(snap.alert, None);

        // 15:51:01
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.fires, 1);
        assert_eq!(
            snap.alert,
            Some(ActiveAlert {
                prayer: Prayer::Asr,
                until: at("16:00")
            })
        );
        assert_eq!(snap.state, SchedulerState::Armed { deadline: at("16:00") });

        // 16:01:01
        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.alert, None);
        assert!(snap.fires >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_reschedules_leave_one_pending_wakeup() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:40")));
        let settings = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        let (handle, _task) = spawn(clock, settings.clone());

        handle.schedule_loaded(sample_schedule()).await;
        for _ in 0..5 {
            handle.settings_changed(settings.clone()).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.snapshot().fires, 0);

        // 15:55:01, past the 15:50 boundary only
        tokio::time::sleep(Duration::from_secs(15 * 60)).await;
        assert_eq!(handle.snapshot().fires, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_goes_idle_and_hides_the_alert() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:52")));
        let settings = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        let (handle, _task) = spawn(clock, settings.clone());

        handle.schedule_loaded(sample_schedule()).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.snapshot().alert.is_some());

        let mut off = settings;
        off.enabled = false;
        handle.settings_changed(off).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let snap = handle.snapshot();
        assert_eq!(snap.state, SchedulerState::Idle);
        assert_eq!(snap.alert, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dismissal_suppresses_until_prayer_changes() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:52")));
        let settings = with_sub_windows(&[
            (Prayer::Asr, "15:50", "16:00"),
            (Prayer::Maghrib, "18:25", "18:40"),
        ]);
        let (handle, _task) = spawn(clock, settings);

        handle.schedule_loaded(sample_schedule()).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.snapshot().alert.is_some());

        handle.dismiss().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.alert, None);
        assert_eq!(snap.dismissed_for, Some(Prayer::Asr));

        // 18:21:00, Maghrib has begun but its sub-window has not
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 28 * 60 + 58)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.dismissed_for, None);
        assert_eq!(snap.alert, None);
        assert_eq!(snap.state, SchedulerState::Armed { deadline: at("18:25") });

        // 18:30:02
        tokio::time::sleep(Duration::from_secs(9 * 60 + 2)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.dismissed_for, None);
        assert_eq!(snap.alert.map(|a| a.prayer), Some(Prayer::Maghrib));
    }

    #[tokio::test(start_paused = true)]
    async fn dismissal_expires_while_notifications_are_off() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:52")));
        let settings = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        let (handle, _task) = spawn(clock, settings.clone());

        handle.schedule_loaded(sample_schedule()).await;
        handle.dismiss().await;
        let mut off = settings;
        off.enabled = false;
        handle.settings_changed(off).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.state, SchedulerState::Idle);
        assert_eq!(snap.dismissed_for, Some(Prayer::Asr));

        // 18:20:30, Maghrib has begun
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 28 * 60 + 29)).await;
        assert_eq!(handle.snapshot().dismissed_for, None);
    }

    fn failing_evaluator(
        _: &PrayerSchedule,
        _: &NotificationSettings,
        now: NaiveDateTime,
        _: &mut DismissalState,
    ) -> Decision {
        panic!("evaluation failed at {now}");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_evaluation_still_rearms() {
        let clock = Arc::new(VirtualClock::starting_at(at("15:40")));
        let settings = with_sub_windows(&[(Prayer::Asr, "15:50", "16:00")]);
        let (handle, task) = spawn_with(clock, settings, failing_evaluator);

        handle.schedule_loaded(sample_schedule()).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.snapshot().state, SchedulerState::Armed { deadline: at("15:50") });

        // 15:51:01
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.fires, 1);
        assert_eq!(snap.alert, None);
        assert_eq!(snap.state, SchedulerState::Armed { deadline: at("16:00") });

        // 16:00:30
        tokio::time::sleep(Duration::from_secs(9 * 60 + 29)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.fires, 2);
        assert!(matches!(snap.state, SchedulerState::Armed { .. }));
        assert!(!task.is_finished());
    }
}
