use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::entities::location::{GeoPoint, LocationSample};
use crate::store::Store;

/// Largest simulated drift per tick on each axis, in degrees.
const MAX_JITTER_DEG: f64 = 0.001;

/// Simulated GPS feeds: one periodic task per in-progress trip, keyed by
/// (driver, booking). At most one live timer exists per pair.
pub struct LocationFeed {
    store: Arc<Store>,
    tick: Duration,
    tasks: Mutex<HashMap<(Uuid, Uuid), JoinHandle<()>>>,
}

impl LocationFeed {
    pub fn new(store: Arc<Store>, tick: Duration) -> Self {
        Self {
            store,
            tick,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a sample at `origin` and begin ticking. Starting a feed that is
    /// already running is a no-op, not a second timer.
    pub async fn start(&self, tenant_id: Uuid, driver_id: Uuid, booking_id: Uuid, origin: GeoPoint) {
        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(&(driver_id, booking_id)) {
            return;
        }

        self.store
            .samples
            .put(LocationSample {
                booking_id,
                tenant_id,
                driver_id,
                lat: origin.lat,
                lng: origin.lng,
                updated_at: Utc::now(),
            })
            .await;

        let store = Arc::clone(&self.store);
        let tick = self.tick;
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(tick);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick fires immediately; the seed sample
            // already covers that instant.
            timer.tick().await;
            loop {
                timer.tick().await;
                record_tick(&store, driver_id, booking_id).await;
            }
        });
        tasks.insert((driver_id, booking_id), handle);
        tracing::debug!(%driver_id, %booking_id, "location feed started");
    }

    /// Cancel the timer and drop the sample. The task is joined before the
    /// sample is removed, so no tick lands after this returns.
    pub async fn stop(&self, driver_id: Uuid, booking_id: Uuid) {
        let handle = self.tasks.lock().await.remove(&(driver_id, booking_id));
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            self.store.samples.remove(booking_id).await;
            tracing::debug!(%driver_id, %booking_id, "location feed stopped");
        }
    }

    /// Number of live feeds, for diagnostics.
    pub async fn active(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

/// One simulated movement step for an active trip.
async fn record_tick(store: &Store, driver_id: Uuid, booking_id: Uuid) {
    let mut samples = store.samples.write().await;
    let Some(sample) = samples.get_mut(&booking_id) else {
        return;
    };
    if sample.driver_id != driver_id {
        return;
    }

    let mut rng = rand::thread_rng();
    sample.lat += rng.gen_range(-MAX_JITTER_DEG..=MAX_JITTER_DEG);
    sample.lng += rng.gen_range(-MAX_JITTER_DEG..=MAX_JITTER_DEG);
    sample.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures;
    use crate::error::AppError;

    fn fast_feed(store: &Arc<Store>) -> LocationFeed {
        LocationFeed::new(Arc::clone(store), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn start_seeds_sample_at_origin() {
        let world = fixtures::world().await;
        let feed = fast_feed(&world.store);
        let booking_id = Uuid::new_v4();

        feed.start(world.tenant.id, world.driver.id, booking_id, fixtures::CENTER)
            .await;

        let sample = world.store.samples.get(world.tenant.id, booking_id).await.unwrap();
        assert_eq!(sample.lat, fixtures::CENTER.lat);
        assert_eq!(sample.lng, fixtures::CENTER.lng);
        assert_eq!(sample.driver_id, world.driver.id);

        feed.stop(world.driver.id, booking_id).await;
    }

    #[tokio::test]
    async fn ticks_drift_within_bounds() {
        let world = fixtures::world().await;
        let feed = fast_feed(&world.store);
        let booking_id = Uuid::new_v4();

        feed.start(world.tenant.id, world.driver.id, booking_id, fixtures::CENTER)
            .await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        let sample = world.store.samples.get(world.tenant.id, booking_id).await.unwrap();
        // Roughly ten ticks of at most 0.001 degrees each; generous slack
        // for scheduler jitter.
        assert!((sample.lat - fixtures::CENTER.lat).abs() <= 25.0 * MAX_JITTER_DEG);
        assert!((sample.lng - fixtures::CENTER.lng).abs() <= 25.0 * MAX_JITTER_DEG);
        assert!(sample.updated_at > chrono::Utc::now() - chrono::Duration::seconds(5));

        feed.stop(world.driver.id, booking_id).await;
    }

    #[tokio::test]
    async fn double_start_is_a_noop() {
        let world = fixtures::world().await;
        let feed = fast_feed(&world.store);
        let booking_id = Uuid::new_v4();

        feed.start(world.tenant.id, world.driver.id, booking_id, fixtures::CENTER)
            .await;
        feed.start(world.tenant.id, world.driver.id, booking_id, fixtures::CENTER)
            .await;

        assert_eq!(feed.active().await, 1);
        feed.stop(world.driver.id, booking_id).await;
        assert_eq!(feed.active().await, 0);
    }

    #[tokio::test]
    async fn stop_removes_sample_and_halts_ticks() {
        let world = fixtures::world().await;
        let feed = fast_feed(&world.store);
        let booking_id = Uuid::new_v4();

        feed.start(world.tenant.id, world.driver.id, booking_id, fixtures::CENTER)
            .await;
        feed.stop(world.driver.id, booking_id).await;

        assert!(matches!(
            world.store.samples.get(world.tenant.id, booking_id).await,
            Err(AppError::NotFound(_))
        ));

        // Nothing resurrects the sample once the task is joined.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(world.store.samples.get(world.tenant.id, booking_id).await.is_err());
    }

    #[tokio::test]
    async fn stop_of_unknown_feed_is_harmless() {
        let world = fixtures::world().await;
        let feed = fast_feed(&world.store);
        feed.stop(Uuid::new_v4(), Uuid::new_v4()).await;
        assert_eq!(feed.active().await, 0);
    }
}
