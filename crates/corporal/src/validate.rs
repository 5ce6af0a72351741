//! Validation orchestrator.
//!
//! Binders record one entry per bound field. Entries that are already settled
//! stay synchronous; as soon as one is pending the whole result becomes a
//! single deferred value that resolves after every entry has settled. The
//! first failure in declaration order (arguments, then options) wins.

use crate::deferred::Deferred;
use crate::error::Error;
use crate::value::{Value, Values};
use futures_util::future::{BoxFuture, FutureExt, join_all};
use std::future::IntoFuture;

/// One field's eventual value.
pub(crate) type Settled = Deferred<'static, Result<Value, Error>>;

/// Validated `(arguments, options)` bags.
pub type Bound = (Values, Values);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Argument,
    Option,
}

struct Entry {
    target: Target,
    key: String,
    value: Settled,
}

#[derive(Default)]
pub(crate) struct Ledger {
    entries: Vec<Entry>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a field. A value that already failed halts binding.
    pub(crate) fn record(
        &mut self,
        target: Target,
        key: impl Into<String>,
        value: Settled,
    ) -> Result<(), Error> {
        let key = key.into();
        let value = match value.into_ready() {
            Ok(Err(err)) => {
                tracing::trace!(%key, error = %err, "field rejected");
                return Err(err);
            }
            Ok(Ok(v)) => Deferred::ready(Ok(v)),
            Err(pending) => pending,
        };
        tracing::trace!(%key, ready = value.is_ready(), "field recorded");
        self.entries.push(Entry { target, key, value });
        Ok(())
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| !e.value.is_ready())
    }

    /// Merge every entry into the bound bags. `halted` is the error that
    /// stopped binding early, if any; it ranks after every recorded entry.
    pub(crate) fn finish(self, halted: Option<Error>) -> Deferred<'static, Result<Bound, Error>> {
        let pending = self.has_pending();
        if pending {
            tracing::debug!(
                fields = self.entries.len(),
                "waiting for asynchronous validators"
            );
        }
        let (meta, values): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .map(|e| ((e.target, e.key), e.value))
            .unzip();
        let joined = async move {
            let settled = join_all(values.into_iter().map(IntoFuture::into_future)).await;
            let mut args = Values::new();
            let mut options = Values::new();
            for ((target, key), result) in meta.into_iter().zip(settled) {
                let value = result?;
                match target {
                    Target::Argument => args.insert(key, value),
                    Target::Option => options.insert(key, value),
                };
            }
            match halted {
                Some(err) => Err(err),
                None => Ok((args, options)),
            }
        };
        settle_eagerly(joined.boxed(), pending)
    }
}

/// Combine per-element outcomes into one list value, first failure wins.
pub(crate) fn gather(items: Vec<Settled>) -> Settled {
    let pending = items.iter().any(|i| !i.is_ready());
    let joined = async move {
        join_all(items.into_iter().map(IntoFuture::into_future))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    };
    settle_eagerly(joined.boxed(), pending)
}

/// Poll once when nothing user-supplied is pending, so that fully synchronous
/// validation never needs an executor.
fn settle_eagerly<T: Send + 'static>(
    mut fut: BoxFuture<'static, T>,
    pending: bool,
) -> Deferred<'static, T> {
    if !pending && let Some(v) = (&mut fut).now_or_never() {
        return Deferred::ready(v);
    }
    Deferred::Pending(fut)
}
