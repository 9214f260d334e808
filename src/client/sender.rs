//! The paced sender task.
//!
//! Owns the write half of the connection and an ordered queue of
//! outbound lines. Lines are released while the flood preventer
//! reports no delay; otherwise the task sleeps for
//! `max(delay, MIN_SEND_WAIT)` before looking again.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::event::Event;
use crate::flood::{FloodConfig, FloodPreventer};
use crate::line::LineCodec;
use crate::transport::IrcStream;

use super::Shared;

/// Floor for the pacing tick, per the send-scheduler contract.
pub(super) const MIN_SEND_WAIT: Duration = Duration::from_millis(50);

/// One queued line with its completion token.
#[derive(Debug)]
pub(super) struct Outgoing {
    pub line: String,
    pub token: u64,
}

type Writer = SplitSink<Framed<IrcStream, LineCodec>, String>;

pub(super) async fn sender_task(
    mut writer: Writer,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
    flood: Option<FloodConfig>,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut preventer = flood.map(FloodPreventer::new);
    let mut queue: VecDeque<Outgoing> = VecDeque::new();

    loop {
        if queue.is_empty() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                item = rx.recv() => match item {
                    Some(item) => queue.push_back(item),
                    None => return,
                },
            }
            continue;
        }

        let delay = preventer
            .as_mut()
            .map_or(Duration::ZERO, |p| p.get_send_delay());

        if delay.is_zero() {
            if let Some(item) = queue.pop_front() {
                if let Err(err) = writer.send(item.line).await {
                    debug!(%err, "write failed; stopping sender");
                    shared.emit(Event::Error {
                        message: format!("write failed: {}", err),
                    });
                    shared.force_disconnect();
                    return;
                }
                if let Some(preventer) = preventer.as_mut() {
                    preventer.on_sent();
                }
                shared.emit(Event::RawMessageSent { token: item.token });
            }
        } else {
            let wait = delay.max(MIN_SEND_WAIT);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                item = rx.recv() => {
                    if let Some(item) = item {
                        queue.push_back(item);
                    }
                }
            }
        }
    }
}
