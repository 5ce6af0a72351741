//! Uniform validator contract.
//!
//! Every validator shape collapses into [`Validator`] when it is declared.
//! Running one yields an [`Outcome`], which is ready for choice sets, patterns,
//! type codes and synchronous functions and pending for future-returning ones.

use crate::coerce::TypeFlags;
use crate::deferred::Deferred;
use crate::value::Value;
use anyhow::anyhow;
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result of running a validator on one raw token.
pub type Outcome = Deferred<'static, anyhow::Result<Value>>;

type ValidateFn = Arc<dyn Fn(&str) -> Outcome + Send + Sync>;

#[derive(Clone)]
pub enum Validator {
    /// The token must equal one member (case-sensitive).
    Choices(Vec<String>),
    /// The token must match; the value stays the original string.
    Pattern(Regex),
    /// Bit-flag type coercion.
    Type(TypeFlags),
    /// User function, synchronous or returning a future.
    Function(ValidateFn),
    /// A shape that cannot validate anything. Reported when exercised.
    Invalid(String),
}

impl Validator {
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices(items.into_iter().map(Into::into).collect())
    }

    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Regex::new(re).map(Self::Pattern)
    }

    /// Type code such as `INT` or `LIST | FLOAT`. Ill-formed codes produce
    /// [`Validator::Invalid`].
    pub fn of_type(code: u32) -> Self {
        match TypeFlags::from_code(code) {
            Ok(flags) => Self::Type(flags),
            Err(reason) => {
                tracing::warn!(code, "ill-formed type validator: {reason}");
                Self::Invalid(reason)
            }
        }
    }

    /// Synchronous function; an `Err` is the failure reason.
    pub fn sync<F, V>(f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<V> + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::Function(Arc::new(move |raw: &str| -> Outcome {
            Deferred::ready(f(raw).map(Into::into))
        }))
    }

    /// Function returning a future; validation becomes asynchronous.
    pub fn future<F, Fut, V>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
        V: Into<Value>,
    {
        Self::Function(Arc::new(move |raw: &str| -> Outcome {
            let fut = f(raw.to_string());
            Deferred::pending(async move { fut.await.map(Into::into) })
        }))
    }

    /// Function that decides per call whether to answer now or later.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str) -> Outcome + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// Static choices. Only the choice-set form has any.
    pub fn choices_list(&self) -> Vec<String> {
        match self {
            Self::Choices(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn type_flags(&self) -> Option<TypeFlags> {
        match self {
            Self::Type(flags) => Some(*flags),
            _ => None,
        }
    }

    /// Run the validator on one raw token.
    ///
    /// The outer `Err` is a configuration defect (an ill-formed validator),
    /// the inner one a rejected value.
    pub fn validate(&self, raw: &str) -> Result<Outcome, String> {
        let outcome = match self {
            Self::Choices(items) => {
                if items.iter().any(|c| c == raw) {
                    Deferred::ready(Ok(Value::Str(raw.to_string())))
                } else {
                    Deferred::ready(Err(anyhow!("Must be one of: {}", items.join(", "))))
                }
            }
            Self::Pattern(re) => {
                if re.is_match(raw) {
                    Deferred::ready(Ok(Value::Str(raw.to_string())))
                } else {
                    Deferred::ready(Err(anyhow!("Does not match pattern /{}/", re.as_str())))
                }
            }
            Self::Type(flags) => Deferred::ready(flags.coerce(Some(raw)).map_err(Into::into)),
            Self::Function(f) => f(raw),
            Self::Invalid(reason) => return Err(reason.clone()),
        };
        Ok(outcome)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choices(items) => f.debug_tuple("Choices").field(items).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Type(flags) => f.debug_tuple("Type").field(&flags.code()).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

impl From<u32> for Validator {
    fn from(code: u32) -> Self {
        Self::of_type(code)
    }
}

impl From<Regex> for Validator {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl<const N: usize> From<[&str; N]> for Validator {
    fn from(items: [&str; N]) -> Self {
        Self::choices(items)
    }
}

impl From<Vec<String>> for Validator {
    fn from(items: Vec<String>) -> Self {
        Self::Choices(items)
    }
}

impl From<Vec<&str>> for Validator {
    fn from(items: Vec<&str>) -> Self {
        Self::choices(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{INT, LIST, STRING};

    fn settle_now(v: &Validator, raw: &str) -> anyhow::Result<Value> {
        match v.validate(raw).unwrap().into_ready() {
            Ok(result) => result,
            Err(_) => panic!("expected a ready outcome"),
        }
    }

    #[test]
    fn choices_are_case_sensitive() {
        let v = Validator::from(["margherita", "hawaiian"]);
        assert_eq!(settle_now(&v, "hawaiian").unwrap(), Value::from("hawaiian"));
        let err = settle_now(&v, "Hawaiian").unwrap_err();
        assert!(err.to_string().contains("margherita, hawaiian"));
        assert_eq!(v.choices_list(), vec!["margherita", "hawaiian"]);
    }

    #[test]
    fn patterns_keep_the_original_string() {
        let v = Validator::pattern(r"^\d+$").unwrap();
        assert_eq!(settle_now(&v, "0042").unwrap(), Value::from("0042"));
        assert!(settle_now(&v, "x1").is_err());
        assert!(v.choices_list().is_empty());
    }

    #[test]
    fn type_codes_coerce() {
        assert_eq!(settle_now(&Validator::from(INT), "12").unwrap(), Value::Int(12));
        assert_eq!(
            settle_now(&Validator::from(LIST | STRING), "a,b").unwrap(),
            Value::from(vec!["a", "b"])
        );
        assert!(Validator::from(INT).choices_list().is_empty());
    }

    #[test]
    fn ill_formed_validators_fail_when_exercised() {
        let v = Validator::from(256);
        assert!(matches!(v, Validator::Invalid(_)));
        assert!(v.validate("anything").is_err());
    }

    #[test]
    fn sync_functions_map_their_result() {
        let v = Validator::sync(|raw| {
            if raw == "bad" {
                anyhow::bail!("no bad values")
            }
            Ok(raw.to_uppercase())
        });
        assert_eq!(settle_now(&v, "ok").unwrap(), Value::from("OK"));
        assert_eq!(settle_now(&v, "bad").unwrap_err().to_string(), "no bad values");
        assert!(v.choices_list().is_empty());
    }

    #[tokio::test]
    async fn future_functions_are_pending() {
        let v = Validator::future(|raw| async move { Ok(raw.len() as i64) });
        let outcome = v.validate("four").unwrap();
        assert!(!outcome.is_ready());
        assert_eq!(outcome.await.unwrap(), Value::Int(4));
    }
}
