//! A live feed of incoming messages.

use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::messaging::transport::ReceivedMessage;

type OnClose = Box<dyn FnOnce() + Send + Sync>;

/// Messages pushed by a transport until `close` is called or the value is
/// dropped. Closing runs the transport's release hook exactly once.
pub struct Subscription {
    rx: mpsc::Receiver<ReceivedMessage>,
    on_close: Option<OnClose>,
    closed: bool,
}

impl Subscription {
    /// A subscription plus the sender a transport feeds it through.
    pub fn channel(buffer: usize) -> (mpsc::Sender<ReceivedMessage>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            tx,
            Self {
                rx,
                on_close: None,
                closed: false,
            },
        )
    }

    /// Register the hook that releases transport-side resources.
    pub fn on_close(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Next message, or `None` once closed and drained.
    pub async fn next(&mut self) -> Option<ReceivedMessage> {
        self.rx.recv().await
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.rx.close();
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Stream for Subscription {
    type Item = ReceivedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
