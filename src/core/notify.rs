use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::entities::booking::{Booking, BookingStatus};
use crate::store::Store;

use super::booking::BookingFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Assigned,
    Confirmed,
    Started,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub booking_id: Uuid,
    pub kind: ChangeKind,
}

/// The slice of a booking the detector compares between polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingSnapshot {
    pub id: Uuid,
    pub status: BookingStatus,
    pub driver_id: Option<Uuid>,
}

impl From<&Booking> for BookingSnapshot {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            status: booking.status,
            driver_id: booking.driver_id,
        }
    }
}

/// Derive notification events purely from two snapshots; no dedup state is
/// kept anywhere, so the same pair of snapshots always yields the same
/// events. A booking missing from `prev` is compared against an unassigned
/// Pending baseline, so a transition that happened between polls still
/// surfaces; a booking missing from `curr` yields nothing.
pub fn diff(prev: &[BookingSnapshot], curr: &[BookingSnapshot]) -> Vec<ChangeEvent> {
    let before: HashMap<Uuid, &BookingSnapshot> = prev.iter().map(|snap| (snap.id, snap)).collect();

    let mut events = Vec::new();
    for now in curr {
        let (was_status, was_driver) = match before.get(&now.id) {
            Some(snap) => (snap.status, snap.driver_id),
            None => (BookingStatus::Pending, None),
        };

        if was_driver.is_none() && now.driver_id.is_some() {
            events.push(ChangeEvent {
                booking_id: now.id,
                kind: ChangeKind::Assigned,
            });
        }
        for (status, kind) in [
            (BookingStatus::Confirmed, ChangeKind::Confirmed),
            (BookingStatus::InProgress, ChangeKind::Started),
            (BookingStatus::Completed, ChangeKind::Completed),
        ] {
            if was_status != status && now.status == status {
                events.push(ChangeEvent {
                    booking_id: now.id,
                    kind,
                });
            }
        }
    }
    events
}

/// Spawn a polling observer over the store. The first snapshot of the
/// session is a baseline and emits nothing — a restarted observer therefore
/// never re-fires events it has already shown. The task ends when the
/// returned receiver is dropped.
pub fn subscribe(
    store: Arc<Store>,
    tenant_id: Uuid,
    filter: BookingFilter,
    poll: Duration,
) -> mpsc::Receiver<ChangeEvent> {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut prev: Option<Vec<BookingSnapshot>> = None;
        loop {
            if tx.is_closed() {
                return;
            }

            let curr: Vec<BookingSnapshot> = store
                .bookings
                .list(tenant_id, |booking| filter.matches(booking))
                .await
                .iter()
                .map(BookingSnapshot::from)
                .collect();

            if let Some(prev) = &prev {
                for event in diff(prev, &curr) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            prev = Some(curr);

            tokio::time::sleep(poll).await;
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::booking::NewBooking;
    use crate::core::{dispatch, fixtures};
    use crate::entities::booking::{BookingDetails, PaymentMethod};

    fn snap(id: Uuid, status: BookingStatus, driver_id: Option<Uuid>) -> BookingSnapshot {
        BookingSnapshot {
            id,
            status,
            driver_id,
        }
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let id = Uuid::new_v4();
        let state = vec![snap(id, BookingStatus::Confirmed, Some(Uuid::new_v4()))];
        assert!(diff(&state, &state).is_empty());
    }

    #[test]
    fn confirmation_emits_exactly_one_event() {
        let id = Uuid::new_v4();
        let prev = vec![snap(id, BookingStatus::Pending, None)];
        let curr = vec![snap(id, BookingStatus::Confirmed, None)];

        let events = diff(&prev, &curr);
        assert_eq!(
            events,
            vec![ChangeEvent {
                booking_id: id,
                kind: ChangeKind::Confirmed
            }]
        );
    }

    #[test]
    fn dispatch_emits_assigned_and_confirmed() {
        let id = Uuid::new_v4();
        let driver = Uuid::new_v4();
        let prev = vec![snap(id, BookingStatus::Pending, None)];
        let curr = vec![snap(id, BookingStatus::Confirmed, Some(driver))];

        let kinds: Vec<ChangeKind> = diff(&prev, &curr).iter().map(|event| event.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Assigned, ChangeKind::Confirmed]);
    }

    #[test]
    fn replaying_the_same_transition_never_refires() {
        let id = Uuid::new_v4();
        let prev = vec![snap(id, BookingStatus::Pending, None)];
        let curr = vec![snap(id, BookingStatus::Confirmed, Some(Uuid::new_v4()))];

        let first = diff(&prev, &curr);
        assert_eq!(first.len(), 2);
        // Once the poller carries the new snapshot forward, the pair
        // (booking, kind) cannot fire again.
        assert!(diff(&curr, &curr).is_empty());
    }

    #[test]
    fn booking_appearing_mid_session_is_diffed_against_pending() {
        let id = Uuid::new_v4();
        let curr = vec![snap(id, BookingStatus::InProgress, Some(Uuid::new_v4()))];

        let kinds: Vec<ChangeKind> = diff(&[], &curr).iter().map(|event| event.kind).collect();
        // Assigned plus Started; Confirmed was never observed.
        assert_eq!(kinds, vec![ChangeKind::Assigned, ChangeKind::Started]);
    }

    #[tokio::test]
    async fn subscriber_sees_dispatch_events() {
        let world = fixtures::world().await;

        let mut rx = subscribe(
            Arc::clone(&world.store),
            world.tenant.id,
            Default::default(),
            Duration::from_millis(10),
        );

        // Let the observer take its baseline before anything exists.
        tokio::time::sleep(Duration::from_millis(30)).await;

        let booking = crate::core::booking::create_booking(
            &world.store,
            world.tenant.id,
            world.customer.id,
            world.customer.role,
            NewBooking {
                route_id: None,
                details: BookingDetails::PointToPoint {
                    passengers: 1,
                    pickup: fixtures::CENTER,
                    dropoff: fixtures::CENTER,
                },
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();

        dispatch::assign(
            &world.store,
            world.tenant.id,
            booking.id,
            world.driver.id,
            world.vehicle.id,
        )
        .await
        .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.kind, ChangeKind::Assigned);
        assert_eq!(second.kind, ChangeKind::Confirmed);
        assert_eq!(first.booking_id, booking.id);
    }
}
