// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Fan-out of annotated frames to streaming subscribers

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::video::Frame;

/// Lazy, non-restartable sequence of annotated frames
pub type FrameStream = BoxStream<'static, Arc<Frame>>;

/// Broadcasts every annotated frame produced by the detection loop
#[derive(Clone)]
pub struct FrameBus {
    frame_tx: broadcast::Sender<Arc<Frame>>,
}

impl FrameBus {
    /// Bus buffering at most `capacity` frames per subscriber
    pub fn new(capacity: usize) -> Self {
        let (frame_tx, _) = broadcast::channel(capacity.max(1));
        Self { frame_tx }
    }

    /// Hand a frame to every current subscriber
    pub fn publish(&self, frame: Frame) {
        // No subscribers is not an error.
        let _ = self.frame_tx.send(Arc::new(frame));
    }

    /// Live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.frame_tx.receiver_count()
    }

    /// Stream starting with the next published frame.
    ///
    /// Slow subscribers skip frames they fell behind on rather than stalling
    /// the detection loop. The stream ends only when the bus is dropped.
    pub fn subscribe(&self) -> FrameStream {
        let rx = self.frame_tx.subscribe();
        stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => return Some((frame, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Frame subscriber lagged, skipped {} frames", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_frames_in_order() {
        let bus = FrameBus::new(8);
        let mut frames = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        for index in 0..3 {
            let mut frame = Frame::blank(4, 4);
            frame.index = index;
            bus.publish(frame);
        }

        for expected in 0..3 {
            let frame = frames.next().await.unwrap();
            assert_eq!(frame.index, expected);
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_ahead() {
        let bus = FrameBus::new(2);
        let mut frames = bus.subscribe();

        for index in 0..5 {
            let mut frame = Frame::blank(2, 2);
            frame.index = index;
            bus.publish(frame);
        }

        let first = frames.next().await.unwrap();
        assert!(first.index >= 3);
    }

    #[tokio::test]
    async fn test_stream_ends_when_bus_dropped() {
        let bus = FrameBus::new(2);
        let mut frames = bus.subscribe();
        drop(bus);
        assert!(frames.next().await.is_none());
    }
}
