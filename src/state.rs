use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api_client::PrayerApiClient;
use crate::clock::Clock;
use crate::models::{DayTimings, Location};
use crate::scheduler::SchedulerHandle;
use crate::store::KvStore;
use crate::windows::PrayerSchedule;

// The most recent successfully loaded day.
#[derive(Debug, Clone)]
pub struct LoadedDay {
    pub location: Location,
    pub timings: DayTimings,
    pub schedule: PrayerSchedule,
}

/// Shared handles passed to every HTTP handler and background loop.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub client: PrayerApiClient,
    pub clock: Arc<dyn Clock>,
    pub scheduler: SchedulerHandle,
    pub today: Arc<RwLock<Option<LoadedDay>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KvStore>,
        client: PrayerApiClient,
        clock: Arc<dyn Clock>,
        scheduler: SchedulerHandle,
    ) -> Self {
        AppState {
            store,
            client,
            clock,
            scheduler,
            today: Arc::new(RwLock::new(None)),
        }
    }
}
