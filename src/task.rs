//! Cooperative task helpers.
//!
//! Loading runs as plain futures that the game loop polls once per update,
//! so results are only observed between frames and never during a render.

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// A boxed future polled on demand from the update loop.
pub struct Task<T> {
    future: Option<Pin<Box<dyn Future<Output = T>>>>,
}

impl<T> Task<T> {
    pub fn spawn(future: impl Future<Output = T> + 'static) -> Self {
        Self {
            future: Some(Box::pin(future)),
        }
    }

    /// Polls once. Returns the output the first time the future completes,
    /// `None` while pending and on every call after completion.
    pub fn poll(&mut self) -> Option<T> {
        let future = self.future.as_mut()?;
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(out) => {
                self.future = None;
                Some(out)
            }
            Poll::Pending => None,
        }
    }
}

/// Drives a future to completion on the current thread.
///
/// Only suitable for futures that make progress without an external reactor,
/// such as reads from a [`MemorySource`](crate::MemorySource).
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = std::pin::pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(out) = future.as_mut().poll(&mut cx) {
            return out;
        }
        std::thread::yield_now();
    }
}

enum Slot<F, T> {
    Pending(Pin<Box<F>>),
    Done(Option<T>),
}

/// Polls every future concurrently and resolves once all succeed, in input
/// order. The first error wins; futures still in flight are dropped.
pub async fn try_join_all<I, F, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut slots: Vec<Slot<F, T>> = futures
        .into_iter()
        .map(|f| Slot::Pending(Box::pin(f)))
        .collect();

    poll_fn(move |cx| {
        let mut pending = false;
        for slot in slots.iter_mut() {
            if let Slot::Pending(fut) = slot {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(value)) => *slot = Slot::Done(Some(value)),
                    Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                    Poll::Pending => pending = true,
                }
            }
        }
        if pending {
            return Poll::Pending;
        }
        Poll::Ready(Ok(slots
            .iter_mut()
            .filter_map(|slot| match slot {
                Slot::Done(value) => value.take(),
                Slot::Pending(_) => None,
            })
            .collect()))
    })
    .await
}
