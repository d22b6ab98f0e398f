use crate::{
    completion::{Completion, Invocation},
    wrapper::Wrapper,
};

/// Anything that can be called once with an argument tuple.
///
/// Arguments are moved into the call in the order they appear in the tuple,
/// nothing is cloned on the way.
pub trait Callable<Args> {
    type Output;

    /// Calls self with unpacked `args`.
    fn call_with(self, args: Args) -> Self::Output;
}

/// Anything that can be called once as a method, with receiver passed
/// before the argument tuple.
///
/// `Method::call_on(Counter::add, &mut counter, (1,))` is exactly `counter.add(1)`.
/// Receiver may be `&T`, `&mut T` or `T`, depending on the method's self type.
pub trait Method<Recv, Args> {
    type Output;

    /// Calls self with `receiver` as first parameter, followed by unpacked `args`.
    fn call_on(self, receiver: Recv, args: Args) -> Self::Output;
}

macro_rules! implement_callable {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, clippy::unused_unit)]
        impl<F, R, $($ty,)*> Callable<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> R,
        {
            type Output = R;

            fn call_with(self, ($($ty,)*): ($($ty,)*)) -> R {
                self($($ty,)*)
            }
        }

        #[allow(non_snake_case, clippy::unused_unit)]
        impl<F, R, Recv, $($ty,)*> Method<Recv, ($($ty,)*)> for F
        where
            F: FnOnce(Recv, $($ty,)*) -> R,
        {
            type Output = R;

            fn call_on(self, receiver: Recv, ($($ty,)*): ($($ty,)*)) -> R {
                self(receiver, $($ty,)*)
            }
        }
    };
}

implement_callable!();
implement_callable!(T1);
implement_callable!(T1, T2);
implement_callable!(T1, T2, T3);
implement_callable!(T1, T2, T3, T4);
implement_callable!(T1, T2, T3, T4, T5);
implement_callable!(T1, T2, T3, T4, T5, T6);

/// Gives every callable an outcome-producing way of being called.
///
/// Nothing changes for code that doesn't import this trait.
///
/// ```rust
/// use fntry_core::CallableExt;
///
/// let outcome = (|s: &str| s.parse::<u32>()).try_call(("12",)).wait();
/// assert_eq!(outcome.value(), Some(&12));
///
/// let outcome = str::parse::<u32>.try_call_with("x", ()).wait();
/// assert!(outcome.failed());
/// ```
pub trait CallableExt: Sized {
    /// Wrapped call without receiver, see [`crate::try_invoke`].
    fn try_call<'a, Args, M>(
        self,
        args: Args,
    ) -> Invocation<
        'a,
        <<Self as Callable<Args>>::Output as Completion<'a, M>>::Value,
        <<Self as Callable<Args>>::Output as Completion<'a, M>>::Error,
    >
    where
        Self: Callable<Args>,
        <Self as Callable<Args>>::Output: Completion<'a, M>,
    {
        Wrapper::default().invoke::<_, _, M>(self, args)
    }

    /// Wrapped call bound to `receiver`, see [`crate::try_invoke_with`].
    fn try_call_with<'a, Recv, Args, M>(
        self,
        receiver: Recv,
        args: Args,
    ) -> Invocation<
        'a,
        <<Self as Method<Recv, Args>>::Output as Completion<'a, M>>::Value,
        <<Self as Method<Recv, Args>>::Output as Completion<'a, M>>::Error,
    >
    where
        Self: Method<Recv, Args>,
        <Self as Method<Recv, Args>>::Output: Completion<'a, M>,
    {
        Wrapper::default().invoke_with::<_, _, _, M>(self, receiver, args)
    }
}

impl<F> CallableExt for F {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hits: u32,
    }

    impl Counter {
        fn add(&mut self, n: u32) -> u32 {
            self.hits += n;
            self.hits
        }

        fn peek(&self) -> u32 {
            self.hits
        }
    }

    #[test]
    fn test_call_with_forwards_in_order() {
        let f = |a: u8, b: &str, c: Vec<u8>| format!("{}{}{}", a, b, c.len());
        assert_eq!(f.call_with((1, "-", vec![0, 0])), "1-2");

        let nothing = || 5;
        assert_eq!(nothing.call_with(()), 5);
    }

    #[test]
    fn test_call_with_moves_arguments() {
        let data = vec![1, 2, 3];
        let ptr = data.as_ptr();

        let returned = (|v: Vec<i32>| v).call_with((data,));
        assert_eq!(returned.as_ptr(), ptr);
    }

    #[test]
    fn test_call_on_behaves_like_method_call() {
        let mut counter = Counter { hits: 1 };

        assert_eq!(Counter::add.call_on(&mut counter, (2,)), 3);
        assert_eq!(Counter::peek.call_on(&counter, ()), 3);
        assert_eq!(counter.add(2), 5);
    }

    #[test]
    fn test_six_arguments() {
        let f = |a: u8, b: u8, c: u8, d: u8, e: u8, g: u8| [a, b, c, d, e, g];
        assert_eq!(f.call_with((1, 2, 3, 4, 5, 6)), [1, 2, 3, 4, 5, 6]);
    }
}
