//! # Cancellable Streams
//!
//! Platform location callbacks and remote snapshot listeners both push values
//! at us from somewhere else. This module turns that into a pair:
//!
//! - [`Emitter<T>`] - held by the producer (the provider adapter, the document
//!   store). Cloneable, cheap, and aware of whether anyone is still listening.
//! - [`Subscription<T>`] - held by the consumer (a tracking session). Yields
//!   values with [`Subscription::recv`] until the producer goes away or the
//!   subscription is cancelled.
//!
//! Both halves share one [`CancellationToken`]. Once it fires, `recv` returns
//! `None` even if values are still buffered, and emitters report the
//! subscription as gone so producers can detach their listener.
//!
//! ```rust
//! use order_tracker::framework::subscription;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (emitter, mut sub) = subscription::channel::<u32>(8);
//!     assert!(emitter.emit(1).await);
//!     assert_eq!(sub.recv().await, Some(1));
//!
//!     sub.cancel();
//!     assert!(!emitter.emit(2).await);
//!     assert_eq!(sub.recv().await, None);
//! }
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Creates a connected emitter / subscription pair with the given buffer.
pub fn channel<T>(buffer: usize) -> (Emitter<T>, Subscription<T>) {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    let token = CancellationToken::new();
    let emitter = Emitter {
        sender,
        token: token.clone(),
    };
    let subscription = Subscription { receiver, token };
    (emitter, subscription)
}

/// Consumer half of a cancellable stream.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: mpsc::Receiver<T>,
    token: CancellationToken,
}

impl<T> Subscription<T> {
    /// Waits for the next value.
    ///
    /// Returns `None` once the subscription is cancelled or every emitter has
    /// been dropped. Cancellation wins over buffered values.
    pub async fn recv(&mut self) -> Option<T> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            item = self.receiver.recv() => item,
        }
    }

    /// Stops delivery. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A handle that can cancel this subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Producer half of a cancellable stream.
#[derive(Debug)]
pub struct Emitter<T> {
    sender: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T> Emitter<T> {
    /// Delivers a value, waiting for buffer space if needed.
    ///
    /// Returns `false` if the subscriber cancelled or went away; the value is
    /// dropped in that case.
    pub async fn emit(&self, item: T) -> bool {
        if self.is_closed() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            sent = self.sender.send(item) => sent.is_ok(),
        }
    }

    /// Delivers a value without waiting. A full buffer drops the value.
    pub fn try_emit(&self, item: T) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.sender.try_send(item) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("Subscriber buffer full, value dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// True once the subscriber cancelled or dropped its half.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves when the subscriber cancels.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_flow_in_order() {
        let (emitter, mut sub) = channel(4);
        for i in 0..3 {
            assert!(emitter.emit(i).await);
        }
        assert_eq!(sub.recv().await, Some(0));
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, Some(2));
    }

    #[tokio::test]
    async fn test_cancel_drops_buffered_values() {
        let (emitter, mut sub) = channel(4);
        assert!(emitter.emit("late").await);
        sub.cancel();
        assert_eq!(sub.recv().await, None);
        assert!(emitter.is_closed());
        assert!(!emitter.try_emit("later"));
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (_emitter, sub) = channel::<u8>(1);
        let handle = sub.cancel_handle();
        sub.cancel();
        handle.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());
    }

    #[tokio::test]
    async fn test_stream_ends_when_emitters_drop() {
        let (emitter, mut sub) = channel(2);
        emitter.try_emit(7);
        drop(emitter);
        assert_eq!(sub.recv().await, Some(7));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropping_subscription_cancels() {
        let (emitter, sub) = channel::<u8>(1);
        drop(sub);
        emitter.cancelled().await;
        assert!(emitter.is_closed());
    }

    #[tokio::test]
    async fn test_try_emit_on_full_buffer_drops() {
        let (emitter, mut sub) = channel(1);
        assert!(emitter.try_emit(1));
        assert!(!emitter.try_emit(2));
        assert_eq!(sub.recv().await, Some(1));
    }
}
