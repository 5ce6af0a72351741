//! Values that are either available now or settle later.
//!
//! Validators, completion sources and actions may answer synchronously or
//! with a future. `Deferred` keeps the synchronous path synchronous: callers
//! can inspect [`Deferred::into_ready`] and only reach for an executor when a
//! future is actually involved.

use futures_util::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::{Future, IntoFuture};

pub enum Deferred<'a, T> {
    Ready(T),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T: Send + 'a> Deferred<'a, T> {
    pub fn ready(value: T) -> Self {
        Self::Ready(value)
    }

    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'a,
    {
        Self::Pending(fut.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The value if it is already available, otherwise `self` back.
    pub fn into_ready(self) -> Result<T, Self> {
        match self {
            Self::Ready(v) => Ok(v),
            pending => Err(pending),
        }
    }

    pub fn map<U, F>(self, f: F) -> Deferred<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        match self {
            Self::Ready(v) => Deferred::Ready(f(v)),
            Self::Pending(fut) => Deferred::Pending(fut.map(f).boxed()),
        }
    }

    /// Chain another possibly-deferred step.
    pub fn and_then<U, F>(self, f: F) -> Deferred<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> Deferred<'a, U> + Send + 'a,
    {
        match self {
            Self::Ready(v) => f(v),
            Self::Pending(fut) => Deferred::Pending(
                async move {
                    let v = fut.await;
                    f(v).await
                }
                .boxed(),
            ),
        }
    }

    /// Shorten the lifetime so that later steps may borrow.
    pub fn narrow<'b>(self) -> Deferred<'b, T>
    where
        'a: 'b,
    {
        match self {
            Self::Ready(v) => Deferred::Ready(v),
            Self::Pending(fut) => Deferred::Pending(fut),
        }
    }

    pub async fn settle(self) -> T {
        match self {
            Self::Ready(v) => v,
            Self::Pending(fut) => fut.await,
        }
    }
}

impl<'a, T: Send + 'a> IntoFuture for Deferred<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(v) => future::ready(v).boxed(),
            Self::Pending(fut) => fut,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_stays_synchronous_when_ready() {
        let d = Deferred::ready(2).map(|v| v * 3);
        assert!(matches!(d.into_ready(), Ok(6)));
    }

    #[tokio::test]
    async fn pending_values_settle_through_await() {
        let d = Deferred::pending(async { 4 }).and_then(|v| Deferred::ready(v + 1));
        assert!(!d.is_ready());
        assert_eq!(d.await, 5);
    }
}
