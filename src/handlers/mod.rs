pub mod admin;
pub mod auth;
pub mod customer;
pub mod driver;
pub mod operator;

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::booking::BookingFilter;
use crate::core::notify::{self, ChangeEvent};
use crate::AppState;

/// Adapt a change-detector subscription into a server-sent-events response.
/// Dropping the connection drops the receiver, which ends the poller task.
pub(crate) fn change_stream(
    state: &AppState,
    tenant_id: Uuid,
    filter: BookingFilter,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let rx = notify::subscribe(
        Arc::clone(&state.store),
        tenant_id,
        filter,
        state.config.notify_poll,
    );

    let stream = futures::stream::unfold(rx, |mut rx: mpsc::Receiver<ChangeEvent>| async move {
        let change = rx.recv().await?;
        let event = Event::default()
            .event("booking-change")
            .json_data(&change)
            .unwrap_or_else(|_| Event::default());
        Some((Ok(event), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
