pub mod callable;
pub mod completion;
pub mod observer;
pub mod outcome;
pub mod testing;
pub mod wrapper;

pub use callable::CallableExt;
pub use completion::{Invocation, PendingOutcome};
pub use outcome::{Failure, Outcome, Panic};
pub use wrapper::{try_invoke, try_invoke_with, Wrapper};
