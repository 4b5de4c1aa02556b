//! Asynchronous event consumption.
//!
//! [`EventStream`] is returned by
//! [`ManagedObject::listen_stream`](crate::ManagedObject::listen_stream). Each
//! stream owns a FIFO buffer plus a single waiting-consumer slot:
//!
//! - emission pushes onto the buffer and wakes the consumer, if one waits
//! - polling pops the oldest buffered event, or parks the consumer
//! - unlinking the object closes the stream; the buffer is discarded and the
//!   next poll yields `None`
//!
//! Dropping the stream (for instance when the consumer's loop body bails out
//! with `?`) closes it as well, so the object stops buffering for it.

use crate::event::ManagedEvent;
use futures::stream::{FusedStream, Stream};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
pub(crate) struct StreamState {
    queue: VecDeque<ManagedEvent>,
    waiting: Option<Waker>,
    closed: bool,
}

pub(crate) type SharedStream = Rc<RefCell<StreamState>>;

impl StreamState {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Buffer `event` for the stream and wake its consumer.
pub(crate) fn push(stream: &SharedStream, event: ManagedEvent) {
    let waker = {
        let mut state = stream.borrow_mut();
        if state.closed {
            return;
        }
        state.queue.push_back(event);
        state.waiting.take()
    };
    if let Some(waker) = waker {
        waker.wake();
    }
}

/// Terminate the stream, discarding anything still buffered.
pub(crate) fn close(stream: &SharedStream) {
    let (waker, discarded) = {
        let mut state = stream.borrow_mut();
        state.closed = true;
        (state.waiting.take(), std::mem::take(&mut state.queue))
    };
    // Buffered events hold their source object; release them outside the borrow.
    drop(discarded);
    if let Some(waker) = waker {
        waker.wake();
    }
}

/// An ordered, single-pass stream of events emitted by one object.
///
/// # Example
///
/// ```rust,ignore
/// use futures::StreamExt;
///
/// let mut events = object.listen_stream();
/// while let Some(event) = events.next().await {
///     println!("{}", event.name());
/// }
/// // The loop ends once `object` is unlinked.
/// ```
pub struct EventStream {
    state: SharedStream,
}

impl EventStream {
    pub(crate) fn new(state: SharedStream) -> Self {
        Self { state }
    }

    /// Create a stream that is already finished.
    pub(crate) fn closed() -> Self {
        let state = Rc::new(RefCell::new(StreamState {
            closed: true,
            ..StreamState::default()
        }));
        Self { state }
    }

    /// Number of events buffered and not yet consumed.
    pub fn pending_len(&self) -> usize {
        self.state.borrow().queue.len()
    }
}

impl Stream for EventStream {
    type Item = ManagedEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.state.borrow_mut();
        if let Some(event) = state.queue.pop_front() {
            return Poll::Ready(Some(event));
        }
        if state.closed {
            return Poll::Ready(None);
        }
        state.waiting = Some(cx.waker().clone());
        Poll::Pending
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let state = self.state.borrow();
        let buffered = state.queue.len();
        if state.closed {
            (buffered, Some(buffered))
        } else {
            (buffered, None)
        }
    }
}

impl FusedStream for EventStream {
    fn is_terminated(&self) -> bool {
        let state = self.state.borrow();
        state.closed && state.queue.is_empty()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        close(&self.state);
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventStream")
            .field("buffered", &state.queue.len())
            .field("closed", &state.closed)
            .finish()
    }
}
