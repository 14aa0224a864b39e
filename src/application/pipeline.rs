//! Bounded frame hand-off between the capture loop and the encoder

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::capture::Frame;

/// Frames that may wait between capture and encoding
pub const DEFAULT_PIPELINE_CAPACITY: usize = 8;

/// Pipeline errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Frame pipeline is closed")]
    Closed,
}

/// Single-producer/single-consumer frame queue.
///
/// Frames move by value, so once pushed a frame is owned by the queue
/// until the consumer takes it. When the queue is full, `push` waits for
/// the consumer to catch up. Dropping or closing the producer lets the
/// consumer drain what is left and then observe the end of the stream.
pub struct FramePipeline;

impl FramePipeline {
    /// Create a pipeline holding at most `capacity` frames
    pub fn bounded(capacity: usize) -> (FrameProducer, FrameConsumer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (FrameProducer { tx, pushed: 0 }, FrameConsumer { rx, taken: 0 })
    }
}

/// Sending half, owned by the capture loop
#[derive(Debug)]
pub struct FrameProducer {
    tx: mpsc::Sender<Frame>,
    pushed: u64,
}

impl FrameProducer {
    /// Enqueue a frame, waiting while the queue is full
    pub async fn push(&mut self, frame: Frame) -> Result<(), PipelineError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| PipelineError::Closed)?;
        self.pushed += 1;
        Ok(())
    }

    /// Frames accepted so far
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// True once the consumer is gone or has closed the queue
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the sending side; queued frames remain available to the consumer
    pub fn close(self) {}
}

/// Receiving half, owned by the encoding task
#[derive(Debug)]
pub struct FrameConsumer {
    rx: mpsc::Receiver<Frame>,
    taken: u64,
}

impl FrameConsumer {
    /// Next frame, or `None` once the producer is closed and the queue drained
    pub async fn next(&mut self) -> Option<Frame> {
        let frame = self.rx.recv().await?;
        self.taken += 1;
        Some(frame)
    }

    /// Frames taken so far
    pub fn taken(&self) -> u64 {
        self.taken
    }

    /// Refuse further pushes; frames already queued can still be drained
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn frame(sequence: u64) -> Frame {
        Frame::new(sequence, 1, 1, vec![0; 4], Utc::now(), Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn drains_everything_after_producer_closes() {
        let (mut producer, mut consumer) = FramePipeline::bounded(4);
        for seq in 1..=3 {
            producer.push(frame(seq)).await.unwrap();
        }
        producer.close();

        let mut seen = Vec::new();
        while let Some(f) = consumer.next().await {
            seen.push(f.sequence());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(consumer.taken(), 3);
    }

    #[tokio::test]
    async fn push_after_consumer_closed_fails() {
        let (mut producer, mut consumer) = FramePipeline::bounded(2);
        consumer.close();
        assert_eq!(producer.push(frame(1)).await, Err(PipelineError::Closed));
        assert!(producer.is_closed());
    }

    #[tokio::test]
    async fn full_queue_applies_back_pressure() {
        let (mut producer, mut consumer) = FramePipeline::bounded(1);
        producer.push(frame(1)).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), producer.push(frame(2))).await;
        assert!(blocked.is_err(), "second push should wait for the consumer");

        assert_eq!(consumer.next().await.map(|f| f.sequence()), Some(1));
        producer.push(frame(3)).await.unwrap();
        assert_eq!(consumer.next().await.map(|f| f.sequence()), Some(3));
    }

    #[tokio::test]
    async fn frames_are_moved_not_shared() {
        let (mut producer, mut consumer) = FramePipeline::bounded(2);
        let mut buffer = vec![7u8; 4];
        let f = Frame::new(1, 1, 1, buffer.clone(), Utc::now(), Duration::ZERO).unwrap();
        producer.push(f).await.unwrap();
        buffer.fill(0);

        let received = consumer.next().await.unwrap();
        assert_eq!(received.pixels(), &[7, 7, 7, 7]);
    }
}
