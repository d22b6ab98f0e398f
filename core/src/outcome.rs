use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::any::Any;

/// Positional view of an [`Outcome`], always ordered as `(error, value, failed)`.
pub type Parts<T, E> = (Option<Failure<E>>, Option<T>, bool);

/// Message recovered from a panic raised while a wrapped callable was running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("callable panicked: {message}")]
pub struct Panic {
    #[serde(rename = "panic")]
    message: String,
}

impl Panic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds Panic from payload returned by `catch_unwind`. Only `&str` and
    /// `String` payloads carry a readable message.
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything a wrapped callable can fail with.
///
/// `Raised` holds the error the callable returned (or its future resolved with),
/// `Panicked` holds the message of a panic caught during the call or while polling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure<E> {
    #[error("{0}")]
    Raised(E),

    #[error(transparent)]
    Panicked(#[from] Panic),
}

impl<E> Failure<E> {
    /// Returns raised error, None for panics.
    pub fn raised(&self) -> Option<&E> {
        match self {
            Failure::Raised(e) => Some(e),
            Failure::Panicked(_) => None,
        }
    }

    pub fn into_raised(self) -> Option<E> {
        match self {
            Failure::Raised(e) => Some(e),
            Failure::Panicked(_) => None,
        }
    }

    pub fn panic(&self) -> Option<&Panic> {
        match self {
            Failure::Raised(_) => None,
            Failure::Panicked(p) => Some(p),
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panicked(_))
    }

    /// Maps raised error leaving panics untouched.
    pub fn map<F, O>(self, op: O) -> Failure<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            Failure::Raised(e) => Failure::Raised(op(e)),
            Failure::Panicked(p) => Failure::Panicked(p),
        }
    }
}

/// Raised errors serialize as themselves, panics as `{"panic": message}`.
impl<E> Serialize for Failure<E>
where
    E: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Failure::Raised(e) => e.serialize(serializer),
            Failure::Panicked(p) => p.serialize(serializer),
        }
    }
}

/// Normalized record of a single invocation.
///
/// Outcome can be read by name or by position, in `(error, value, failed)` order:
///
/// ```rust
/// use fntry_core::outcome::Outcome;
///
/// let outcome: Outcome<i32, String> = Outcome::success(42);
///
/// assert_eq!(outcome.value(), Some(&42));
/// assert!(outcome.error().is_none());
/// assert!(!outcome.failed());
///
/// let (error, value, failed) = outcome.into_parts();
/// assert_eq!((error, value, failed), (None, Some(42), false));
/// ```
///
/// Both views read the same private state, so exactly one of
/// `value().is_some()` and `failed()` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T, E> {
    state: Result<T, Failure<E>>,
}

impl<T, E> Outcome<T, E> {
    pub fn success(value: T) -> Self {
        Self { state: Ok(value) }
    }

    pub fn failure(failure: impl Into<Failure<E>>) -> Self {
        Self {
            state: Err(failure.into()),
        }
    }

    /// Shorthand for `Outcome::failure(Failure::Raised(error))`.
    pub fn raised(error: E) -> Self {
        Self {
            state: Err(Failure::Raised(error)),
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.state.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Failure<E>> {
        self.state.as_ref().err()
    }

    pub fn failed(&self) -> bool {
        self.state.is_err()
    }

    /// Borrowed positional view, `(error, value, failed)`.
    pub fn as_parts(&self) -> (Option<&Failure<E>>, Option<&T>, bool) {
        (self.error(), self.value(), self.failed())
    }

    /// Owned positional view, `(error, value, failed)`.
    pub fn into_parts(self) -> Parts<T, E> {
        match self.state {
            Ok(value) => (None, Some(value), false),
            Err(failure) => (Some(failure), None, true),
        }
    }

    pub fn into_result(self) -> Result<T, Failure<E>> {
        self.state
    }

    pub fn into_value(self) -> Option<T> {
        self.state.ok()
    }

    pub fn into_error(self) -> Option<Failure<E>> {
        self.state.err()
    }

    pub fn map<U, O>(self, op: O) -> Outcome<U, E>
    where
        O: FnOnce(T) -> U,
    {
        Outcome {
            state: self.state.map(op),
        }
    }

    /// Maps raised error, panics stay panics.
    pub fn map_err<F, O>(self, op: O) -> Outcome<T, F>
    where
        O: FnOnce(E) -> F,
    {
        Outcome {
            state: self.state.map_err(|failure| failure.map(op)),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self {
            state: result.map_err(Failure::Raised),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, Failure<E>> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.state
    }
}

/// Allows `let (error, value, failed) = outcome.into();`.
impl<T, E> From<Outcome<T, E>> for Parts<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_parts()
    }
}

/// Serializes to `{"value": .., "error": .., "failed": ..}` with null in absent slot.
impl<T, E> Serialize for Outcome<T, E>
where
    T: Serialize,
    E: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Outcome", 3)?;
        state.serialize_field("value", &self.value())?;
        state.serialize_field("error", &self.error())?;
        state.serialize_field("failed", &self.failed())?;
        state.end()
    }
}
