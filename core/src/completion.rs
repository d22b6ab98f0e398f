use crate::outcome::{Failure, Outcome, Panic};
use futures_util::{
    future::{BoxFuture, FusedFuture},
    FutureExt,
};
use std::{
    fmt,
    future::{Future, IntoFuture},
    mem,
    panic::AssertUnwindSafe,
    pin::Pin,
    task::{Context, Poll},
};

/// Marker for callables that settle before returning, i.e. return `Result<T, E>`.
#[derive(Debug)]
pub enum Immediate {}

/// Marker for callables that return a future of `Result<T, E>`.
#[derive(Debug)]
pub enum Deferred {}

/// Trait implemented by everything a wrapped callable may return.
///
/// M is a marker type that keeps the `Result` and the `Future` implementations
/// apart, it's inferred at the call site and never has to be written by hand.
pub trait Completion<'a, M>: Sized {
    type Value: 'a;
    type Error: 'a;

    /// Turns returned value into an Invocation.
    fn settle(self) -> Invocation<'a, Self::Value, Self::Error>;
}

/// Returned error becomes a raised failure, no suspension happens.
impl<'a, T, E> Completion<'a, Immediate> for Result<T, E>
where
    T: 'a,
    E: 'a,
{
    type Value = T;
    type Error = E;

    fn settle(self) -> Invocation<'a, T, E> {
        Invocation::Ready(Outcome::from(self))
    }
}

/// Returned future is observed until it completes. Errors it resolves with
/// and panics raised while polling it end up in the Outcome.
impl<'a, F, T, E> Completion<'a, Deferred> for F
where
    F: Future<Output = Result<T, E>> + Send + 'a,
    T: 'a,
    E: 'a,
{
    type Value = T;
    type Error = E;

    fn settle(self) -> Invocation<'a, T, E> {
        Invocation::Pending(PendingOutcome::new(self))
    }
}

/// Result of a single wrapped invocation.
///
/// Callers that don't care which variant they got can `.await` it,
/// both variants resolve to an Outcome:
///
/// ```rust
/// use fntry_core::try_invoke;
///
/// async fn handler() {
///     let outcome = try_invoke(|| async { Ok::<_, String>(1) }, ()).await;
///     assert_eq!(outcome.value(), Some(&1));
/// }
/// ```
pub enum Invocation<'a, T, E> {
    /// Callable has already settled.
    Ready(Outcome<T, E>),

    /// Callable returned a future that is still running.
    Pending(PendingOutcome<'a, T, E>),
}

impl<'a, T, E> Invocation<'a, T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Invocation::Pending(_))
    }

    /// Returns Outcome if invocation settled synchronously.
    pub fn ready(self) -> Option<Outcome<T, E>> {
        match self {
            Invocation::Ready(outcome) => Some(outcome),
            Invocation::Pending(_) => None,
        }
    }

    /// Turns either variant into a future of Outcome.
    pub fn into_pending(self) -> PendingOutcome<'a, T, E> {
        match self {
            Invocation::Ready(outcome) => PendingOutcome::resolved(outcome),
            Invocation::Pending(pending) => pending,
        }
    }

    /// Blocks current thread until Outcome is available.
    ///
    /// Must not be called from within an async context, use `.await` there.
    pub fn wait(self) -> Outcome<T, E> {
        match self {
            Invocation::Ready(outcome) => outcome,
            Invocation::Pending(pending) => futures_executor::block_on(pending),
        }
    }
}

impl<'a, T, E> IntoFuture for Invocation<'a, T, E> {
    type Output = Outcome<T, E>;
    type IntoFuture = PendingOutcome<'a, T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.into_pending()
    }
}

impl<'a, T, E> fmt::Debug for Invocation<'a, T, E>
where
    T: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Invocation::Pending(pending) => f.debug_tuple("Pending").field(pending).finish(),
        }
    }
}

enum State<'a, T, E> {
    Resolved(Outcome<T, E>),
    Running(BoxFuture<'a, Outcome<T, E>>),
    Done,
}

/// Future of an Outcome. It never fails: errors and panics of the underlying
/// computation are delivered inside the Outcome it resolves with.
///
/// Resolves exactly once, polling it afterwards returns `Poll::Pending`.
pub struct PendingOutcome<'a, T, E> {
    state: State<'a, T, E>,
}

impl<'a, T, E> PendingOutcome<'a, T, E> {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
        T: 'a,
        E: 'a,
    {
        let future = AssertUnwindSafe(future)
            .catch_unwind()
            .map(|caught| match caught {
                Ok(result) => Outcome::from(result),
                Err(payload) => {
                    Outcome::failure(Failure::Panicked(Panic::from_payload(payload.as_ref())))
                }
            });

        Self {
            state: State::Running(future.boxed()),
        }
    }

    pub(crate) fn resolved(outcome: Outcome<T, E>) -> Self {
        Self {
            state: State::Resolved(outcome),
        }
    }

    /// Calls `f` with the Outcome right before it's handed to the poller.
    pub(crate) fn inspect<O>(self, f: O) -> Self
    where
        O: FnOnce(&Outcome<T, E>) + Send + 'a,
        T: 'a,
        E: 'a,
    {
        let state = match self.state {
            State::Running(future) => State::Running(future.inspect(f).boxed()),
            State::Resolved(outcome) => {
                f(&outcome);
                State::Resolved(outcome)
            }
            State::Done => State::Done,
        };

        Self { state }
    }
}

// Outcome is moved out on completion and never pinned.
impl<'a, T, E> Unpin for PendingOutcome<'a, T, E> {}

impl<'a, T, E> Future for PendingOutcome<'a, T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match mem::replace(&mut this.state, State::Done) {
            State::Resolved(outcome) => Poll::Ready(outcome),
            State::Running(mut future) => match future.poll_unpin(cx) {
                Poll::Ready(outcome) => Poll::Ready(outcome),
                Poll::Pending => {
                    this.state = State::Running(future);
                    Poll::Pending
                }
            },
            State::Done => Poll::Pending,
        }
    }
}

impl<'a, T, E> FusedFuture for PendingOutcome<'a, T, E> {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<'a, T, E> fmt::Debug for PendingOutcome<'a, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Resolved(_) => "resolved",
            State::Running(_) => "running",
            State::Done => "done",
        };
        f.debug_struct("PendingOutcome").field("state", &state).finish()
    }
}
