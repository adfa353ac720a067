//! Mock capture source for unit testing.
//!
//! Allows tests to inject synthetic [`PointerEvent`]s without a native hook.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};

use relay_core::PointerEvent;

use super::{CaptureError, CaptureSource, CAPTURE_CHANNEL_CAPACITY};

/// A [`CaptureSource`] driven by [`MockCaptureSource::inject`].
#[derive(Default)]
pub struct MockCaptureSource {
    sender: Mutex<Option<mpsc::Sender<PointerEvent>>>,
}

impl MockCaptureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects an event as if it had been captured from hardware.
    pub fn inject(&self, event: PointerEvent) -> Result<(), CaptureError> {
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let sender = guard.as_ref().ok_or(CaptureError::NotStarted)?;
        sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => CaptureError::Unavailable("capture channel full".into()),
            TrySendError::Closed(_) => CaptureError::ChannelClosed,
        })
    }
}

impl CaptureSource for MockCaptureSource {
    fn start(&self) -> Result<mpsc::Receiver<PointerEvent>, CaptureError> {
        let mut guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel(CAPTURE_CHANNEL_CAPACITY);
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_capture_source_delivers_injected_events() {
        // Arrange
        let source = MockCaptureSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.inject(PointerEvent::moved(3, 4)).unwrap();

        // Assert
        assert_eq!(rx.recv().await, Some(PointerEvent::moved(3, 4)));
    }

    #[tokio::test]
    async fn test_mock_capture_source_stop_closes_channel() {
        let source = MockCaptureSource::new();
        let mut rx = source.start().unwrap();

        source.stop();

        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_inject_before_start_is_not_started() {
        let source = MockCaptureSource::new();
        assert_eq!(
            source.inject(PointerEvent::click(0, 0)),
            Err(CaptureError::NotStarted)
        );
    }

    #[test]
    fn test_start_twice_is_already_started() {
        let source = MockCaptureSource::new();
        let _rx = source.start().unwrap();
        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));
    }
}
