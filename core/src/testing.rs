//! Helpers for driving deferred invocations by hand.
use futures_util::task::AtomicWaker;
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    task::{Context, Poll},
};

struct Shared<T, E> {
    result: Mutex<Option<Result<T, E>>>,
    waker: AtomicWaker,
    polls: AtomicUsize,
}

/// Future that stays pending until its [`Trigger`] settles it.
pub struct Gate<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// Settles the paired [`Gate`].
pub struct Trigger<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// Creates connected Gate and Trigger.
///
/// ```rust
/// use fntry_core::{testing::gate, try_invoke};
///
/// let (gate, trigger) = gate::<u8, String>();
/// let invocation = try_invoke(move || gate, ());
///
/// trigger.succeed(7);
/// assert_eq!(invocation.wait().into_value(), Some(7));
/// ```
pub fn gate<T, E>() -> (Gate<T, E>, Trigger<T, E>) {
    let shared = Arc::new(Shared {
        result: Mutex::new(None),
        waker: AtomicWaker::new(),
        polls: AtomicUsize::new(0),
    });

    (
        Gate {
            shared: shared.clone(),
        },
        Trigger { shared },
    )
}

impl<T, E> Trigger<T, E> {
    pub fn succeed(self, value: T) {
        self.settle(Ok(value))
    }

    pub fn fail(self, error: E) {
        self.settle(Err(error))
    }

    /// Number of times the paired Gate has been polled so far.
    pub fn polls(&self) -> usize {
        self.shared.polls.load(Ordering::SeqCst)
    }

    fn settle(self, result: Result<T, E>) {
        *self
            .shared
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(result);
        self.shared.waker.wake();
    }
}

impl<T, E> Future for Gate<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared.polls.fetch_add(1, Ordering::SeqCst);
        self.shared.waker.register(cx.waker());

        match self
            .shared
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}
