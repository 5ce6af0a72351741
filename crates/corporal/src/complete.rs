use crate::deferred::Deferred;
use crate::validator::Validator;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type Candidates = Deferred<'static, anyhow::Result<Vec<String>>>;

/// User-supplied completion source for an argument or option.
#[derive(Clone)]
pub struct Completer(Arc<dyn Fn() -> Candidates + Send + Sync>);

impl Completer {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        Self(Arc::new(move || Deferred::ready(f())))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<String>>> + Send + 'static,
    {
        Self(Arc::new(move || Deferred::pending(f())))
    }

    pub fn candidates(&self) -> Candidates {
        (self.0)()
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completer(..)")
    }
}

/// Completion source's candidates, or the validator's static choices when no
/// source is set.
pub(crate) async fn candidates(
    completer: Option<&Completer>,
    validator: Option<&Validator>,
) -> anyhow::Result<Vec<String>> {
    match completer {
        Some(c) => c.candidates().await,
        None => Ok(validator.map(Validator::choices_list).unwrap_or_default()),
    }
}
