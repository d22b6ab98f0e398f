use log::{debug, trace};

/// How a wrapped invocation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Outcome was available before the wrapper returned.
    Immediate,

    /// Outcome was delivered once the returned future completed.
    Deferred,
}

/// Summary handed to observers once an Outcome is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement<'s> {
    /// Label of the wrapper that ran the invocation.
    pub label: &'s str,
    pub mode: Mode,
    pub failed: bool,

    /// True if failure comes from a caught panic rather than a returned error.
    pub panicked: bool,
}

/// Splitting ObserverClone into its own trait allows a blanket implementation
/// for all 'static observers that implement Clone, while keeping Observer
/// object safe.
pub trait ObserverClone {
    fn clone_box(&self) -> Box<dyn Observer>;
}

impl<T> ObserverClone for T
where
    T: 'static + Observer + Clone,
{
    fn clone_box(&self) -> Box<dyn Observer> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Observer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait Observer: ObserverClone + Send + Sync {
    /// Run right before the callable is invoked.
    fn on_invoke(&self, _label: &str) {}

    /// Run once the Outcome is populated. For deferred invocations it happens
    /// when the future completes, before the Outcome reaches whoever awaits it.
    fn on_settle(&self, _settlement: &Settlement<'_>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver {}

impl Observer for LogObserver {
    fn on_invoke(&self, label: &str) {
        trace!("LogObserver::on_invoke - label: {}", label);
    }

    fn on_settle(&self, settlement: &Settlement<'_>) {
        debug!("LogObserver::on_settle - settlement: {:?}", settlement);
    }
}
