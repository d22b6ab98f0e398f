use crate::{
    callable::{Callable, Method},
    completion::{Completion, Invocation},
    observer::{Mode, Observer, Settlement},
    outcome::{Failure, Outcome, Panic},
};
use log::{log, trace, Level};
use std::panic::{self, AssertUnwindSafe};

const DEFAULT_LABEL: &str = "anonymous";

/// Invokes callable once without receiver and captures how it finished.
///
/// Callable's errors, panics and futures never leave through the return value,
/// everything ends up in the Outcome:
///
/// ```rust
/// use fntry_core::try_invoke;
///
/// let outcome = try_invoke(|raw: &str| raw.parse::<i64>(), ("}",)).wait();
///
/// assert!(outcome.failed());
/// assert!(outcome.value().is_none());
/// ```
pub fn try_invoke<'a, F, Args, M>(
    callable: F,
    args: Args,
) -> Invocation<
    'a,
    <F::Output as Completion<'a, M>>::Value,
    <F::Output as Completion<'a, M>>::Error,
>
where
    F: Callable<Args>,
    F::Output: Completion<'a, M>,
{
    Wrapper::default().invoke::<_, _, M>(callable, args)
}

/// Invokes callable once bound to `receiver`, just like `receiver.method(args..)` would.
///
/// ```rust
/// use fntry_core::try_invoke_with;
///
/// let outcome = try_invoke_with(str::parse::<u16>, "8080", ()).wait();
/// assert_eq!(outcome.into_value(), Some(8080));
/// ```
pub fn try_invoke_with<'a, F, Recv, Args, M>(
    callable: F,
    receiver: Recv,
    args: Args,
) -> Invocation<
    'a,
    <F::Output as Completion<'a, M>>::Value,
    <F::Output as Completion<'a, M>>::Error,
>
where
    F: Method<Recv, Args>,
    F::Output: Completion<'a, M>,
{
    Wrapper::default().invoke_with::<_, _, _, M>(callable, receiver, args)
}

/// Configured wrapper. Label and failure level only shape the log records,
/// observers get notified about every invocation.
///
/// ```rust
/// use fntry_core::{observer::LogObserver, Wrapper};
///
/// let wrapper = Wrapper::new()
///     .label("load-config")
///     .failure_level(log::Level::Warn)
///     .observer(LogObserver::default());
///
/// let outcome = wrapper.invoke(|| std::fs::read_to_string("/nonexistent"), ()).wait();
/// assert!(outcome.failed());
/// ```
#[derive(Clone)]
pub struct Wrapper {
    label: String,

    /// Level at which captured failures are logged.
    failure_level: Level,

    /// Registered observers, run in registration order.
    observers: Vec<Box<dyn Observer>>,
}

impl Default for Wrapper {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            failure_level: Level::Debug,
            observers: vec![],
        }
    }
}

impl Wrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets label used in log records and settlements.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets level of the record emitted for each captured failure.
    pub fn failure_level(mut self, level: Level) -> Self {
        self.failure_level = level;
        self
    }

    /// Registers new observer.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: Observer + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    /// Invokes callable with unpacked `args`.
    pub fn invoke<'a, F, Args, M>(
        &self,
        callable: F,
        args: Args,
    ) -> Invocation<
        'a,
        <F::Output as Completion<'a, M>>::Value,
        <F::Output as Completion<'a, M>>::Error,
    >
    where
        F: Callable<Args>,
        F::Output: Completion<'a, M>,
    {
        self.run::<_, _, M>(move || callable.call_with(args))
    }

    /// Invokes callable with `receiver` in method's self position, followed by `args`.
    pub fn invoke_with<'a, F, Recv, Args, M>(
        &self,
        callable: F,
        receiver: Recv,
        args: Args,
    ) -> Invocation<
        'a,
        <F::Output as Completion<'a, M>>::Value,
        <F::Output as Completion<'a, M>>::Error,
    >
    where
        F: Method<Recv, Args>,
        F::Output: Completion<'a, M>,
    {
        self.run::<_, _, M>(move || callable.call_on(receiver, args))
    }

    /// Runs the single call and observes whatever it produced.
    fn run<'a, G, C, M>(&self, call: G) -> Invocation<'a, C::Value, C::Error>
    where
        G: FnOnce() -> C,
        C: Completion<'a, M>,
    {
        trace!("Wrapper::run - label: {}", self.label);
        for o in &self.observers {
            self.notify("on_invoke", || o.on_invoke(&self.label));
        }

        let invocation = match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(completion) => completion.settle(),
            Err(payload) => Invocation::Ready(Outcome::failure(Failure::Panicked(
                Panic::from_payload(payload.as_ref()),
            ))),
        };

        match invocation {
            Invocation::Ready(outcome) => {
                self.settled(Mode::Immediate, &outcome);
                Invocation::Ready(outcome)
            }
            Invocation::Pending(pending) => {
                let wrapper = self.clone();
                Invocation::Pending(
                    pending.inspect(move |outcome| wrapper.settled(Mode::Deferred, outcome)),
                )
            }
        }
    }

    fn settled<T, E>(&self, mode: Mode, outcome: &Outcome<T, E>) {
        let panic = outcome.error().and_then(Failure::panic);

        if outcome.failed() {
            match panic {
                Some(p) => log!(
                    self.failure_level,
                    "Wrapper::settled - {} ({:?}) panicked: {}",
                    self.label,
                    mode,
                    p.message()
                ),
                None => log!(
                    self.failure_level,
                    "Wrapper::settled - {} ({:?}) raised an error",
                    self.label,
                    mode
                ),
            }
        }

        let settlement = Settlement {
            label: &self.label,
            mode,
            failed: outcome.failed(),
            panicked: panic.is_some(),
        };
        for o in &self.observers {
            self.notify("on_settle", || o.on_settle(&settlement));
        }
    }

    /// Runs single observer hook. A panicking observer is logged and skipped,
    /// it never replaces the Outcome.
    fn notify<H>(&self, hook: &str, call: H)
    where
        H: FnOnce(),
    {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
            log!(
                self.failure_level,
                "Wrapper::settled - {} observer panicked in {}: {}",
                self.label,
                hook,
                Panic::from_payload(payload.as_ref()).message()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Observer for Recorder {
        fn on_invoke(&self, label: &str) {
            self.events.lock().unwrap().push(format!("invoke {}", label));
        }

        fn on_settle(&self, s: &Settlement<'_>) {
            self.events.lock().unwrap().push(format!(
                "settle {} {:?} failed={} panicked={}",
                s.label, s.mode, s.failed, s.panicked
            ));
        }
    }

    #[test]
    fn test_immediate_success() {
        let recorder = Recorder::default();
        let wrapper = Wrapper::new().label("sum").observer(recorder.clone());

        let outcome = wrapper
            .invoke(|a: i32, b: i32| Ok::<_, String>(a + b), (2, 3))
            .ready()
            .expect("should settle immediately");

        assert_eq!(outcome.value(), Some(&5));
        assert_eq!(
            recorder.events(),
            vec![
                "invoke sum".to_string(),
                "settle sum Immediate failed=false panicked=false".to_string()
            ]
        );
    }

    #[test]
    fn test_panic_is_absorbed() {
        let recorder = Recorder::default();
        let wrapper = Wrapper::new().label("explode").observer(recorder.clone());

        let outcome = wrapper
            .invoke(
                || -> Result<(), String> { panic!("kaboom") },
                (),
            )
            .wait();

        assert!(outcome.failed());
        assert_eq!(
            outcome.error().and_then(Failure::panic).map(Panic::message),
            Some("kaboom")
        );
        assert_eq!(
            recorder.events().last().map(String::as_str),
            Some("settle explode Immediate failed=true panicked=true")
        );
    }

    #[test]
    fn test_deferred_settlement_observed_on_completion() {
        let recorder = Recorder::default();
        let wrapper = Wrapper::new().label("fetch").observer(recorder.clone());

        let invocation = wrapper.invoke(|| async { Err::<u8, _>("network down") }, ());

        assert!(invocation.is_pending());
        assert_eq!(recorder.events(), vec!["invoke fetch".to_string()]);

        let outcome = invocation.wait();
        assert_eq!(outcome.into_parts(), (Some(Failure::Raised("network down")), None, true));
        assert_eq!(
            recorder.events().last().map(String::as_str),
            Some("settle fetch Deferred failed=true panicked=false")
        );
    }

    #[derive(Clone)]
    struct Faulty;

    impl Observer for Faulty {
        fn on_invoke(&self, _label: &str) {
            panic!("observer failed on invoke");
        }

        fn on_settle(&self, _settlement: &Settlement<'_>) {
            panic!("observer failed on settle");
        }
    }

    #[test]
    fn test_panicking_observer_keeps_immediate_outcome() {
        let recorder = Recorder::default();
        let wrapper = Wrapper::new()
            .label("faulty")
            .observer(Faulty)
            .observer(recorder.clone());

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            wrapper.invoke(|| Ok::<u8, ()>(1), ()).ready()
        }));

        assert_eq!(
            caught.expect("observer panic must not escape"),
            Some(Outcome::success(1))
        );
        assert_eq!(
            recorder.events(),
            vec![
                "invoke faulty".to_string(),
                "settle faulty Immediate failed=false panicked=false".to_string()
            ]
        );
    }

    #[test]
    fn test_panicking_observer_keeps_deferred_outcome() {
        let recorder = Recorder::default();
        let wrapper = Wrapper::new()
            .label("faulty")
            .observer(Faulty)
            .observer(recorder.clone());

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            wrapper
                .invoke(|| async { Err::<u8, _>("network down") }, ())
                .wait()
        }));

        assert_eq!(
            caught.expect("observer panic must not escape"),
            Outcome::raised("network down")
        );
        assert_eq!(
            recorder.events().last().map(String::as_str),
            Some("settle faulty Deferred failed=true panicked=false")
        );
    }

    #[test]
    fn test_pending_outcome_can_cross_threads() {
        let invocation = Wrapper::new()
            .observer(Recorder::default())
            .invoke(|| async { Ok::<_, String>(9) }, ());

        let outcome = std::thread::spawn(move || invocation.wait())
            .join()
            .expect("waiting thread panicked");
        assert_eq!(outcome, Outcome::success(9));
    }

    #[test]
    fn test_invoke_with_binds_receiver() {
        let mut names = vec!["a".to_string()];

        let outcome = Wrapper::new()
            .invoke_with(
                |names: &mut Vec<String>, name: String| -> Result<usize, ()> {
                    names.push(name);
                    Ok(names.len())
                },
                &mut names,
                ("b".to_string(),),
            )
            .wait();

        assert_eq!(outcome.into_value(), Some(2));
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_callable_invoked_once() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let outcome = try_invoke(
            move || {
                *counter.lock().unwrap() += 1;
                Err::<(), _>("no")
            },
            (),
        )
        .wait();

        assert!(outcome.failed());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
