//! POSIX-like argv tokenizer.
//!
//! This crate splits raw arguments into positional tokens and an ordered map of
//! flag occurrences. It knows nothing about commands, validators or help; the
//! `corporal` crate builds the semantic layer on top of [`ParsedArgv`].

use indexmap::IndexMap;

/// Value recorded for a flag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Flag present without a value (`--verbose`).
    Switch,
    /// A single value (`--out a.txt`, `--out=a.txt`, `-oa.txt`).
    Value(String),
    /// The flag occurred more than once; occurrences are kept in order.
    Many(Vec<Option<String>>),
}

impl FlagValue {
    fn from_occurrence(value: Option<String>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Switch,
        }
    }

    fn push(&mut self, value: Option<String>) {
        let previous = std::mem::replace(self, Self::Many(Vec::new()));
        let mut all = match previous {
            Self::Switch => vec![None],
            Self::Value(v) => vec![Some(v)],
            Self::Many(all) => all,
        };
        all.push(value);
        *self = Self::Many(all);
    }

    /// Every occurrence of the flag, `None` meaning "present without a value".
    pub fn occurrences(&self) -> Vec<Option<&str>> {
        match self {
            Self::Switch => vec![None],
            Self::Value(v) => vec![Some(v.as_str())],
            Self::Many(all) => all.iter().map(|v| v.as_deref()).collect(),
        }
    }
}

/// Tokenizer output: positional tokens plus flag occurrences keyed by their
/// bare name (`t` for `-t`, `time` for `--time`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgv {
    positionals: Vec<String>,
    flags: IndexMap<String, FlagValue>,
    /// Key of every flag occurrence, in command-line order.
    sequence: Vec<String>,
}

impl ParsedArgv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn flags(&self) -> &IndexMap<String, FlagValue> {
        &self.flags
    }

    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.get(key)
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    /// Occurrences of any of `keys`, merged in command-line order. Used to
    /// read `-t a --tag b -t c` as one option given three times.
    pub fn occurrences(&self, keys: &[&str]) -> Vec<Option<&str>> {
        let per_key: Vec<Vec<Option<&str>>> = keys
            .iter()
            .map(|k| self.flags.get(*k).map(FlagValue::occurrences).unwrap_or_default())
            .collect();
        let mut seen = vec![0usize; keys.len()];
        let mut out = Vec::new();
        for key in &self.sequence {
            let Some(slot) = keys.iter().position(|k| *k == key.as_str()) else {
                continue;
            };
            if let Some(value) = per_key[slot].get(seen[slot]) {
                out.push(*value);
            }
            seen[slot] += 1;
        }
        out
    }

    /// Record one occurrence of `key`.
    pub fn push_flag(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        self.sequence.push(key.clone());
        match self.flags.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.flags.insert(key, FlagValue::from_occurrence(value));
            }
        }
    }

    pub fn push_positional(&mut self, value: impl Into<String>) {
        self.positionals.push(value.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagKind {
    Switch,
    Value,
    Undeclared,
}

/// Declares how flags consume the following argument.
///
/// Without a schema, parsing cannot reliably distinguish between:
/// - a boolean flag followed by a positional (`--verbose file.txt`)
/// - a value flag followed by its value (`--output out.txt`)
///
/// Undeclared flags take the next argument as a value only when it does not
/// itself look like a flag.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    value_flags: Vec<String>,
    switches: Vec<String>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a flag that takes a value (e.g. `--output`, `-o`).
    pub fn value_flag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.value_flags.iter().any(|s| s == &name) {
            self.value_flags.push(name);
        }
        self
    }

    /// Declare a flag that never takes a value (e.g. `--verbose`, `-v`).
    pub fn switch(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.switches.iter().any(|s| s == &name) {
            self.switches.push(name);
        }
        self
    }

    fn kind(&self, flag: &str) -> FlagKind {
        if self.switches.iter().any(|s| s == flag) {
            FlagKind::Switch
        } else if self.value_flags.iter().any(|s| s == flag) {
            FlagKind::Value
        } else {
            FlagKind::Undeclared
        }
    }
}

/// Whether `arg` is a negative number such as `-3`, `-1.5` or `-2e3`.
///
/// Negative numbers are always values, never flags.
pub fn is_negative_number(arg: &str) -> bool {
    let Some(body) = arg.strip_prefix('-') else {
        return false;
    };
    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (body, None),
    };
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && e.chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// Whether `arg` would be read as a flag rather than a value.
pub fn looks_like_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && !is_negative_number(arg)
}

/// Split `argv` (program name already removed) into positionals and flags.
///
/// - `--key=value`, `--key value`, `-k value`, `-kvalue`
/// - combined short switches `-abc`; the first value-taking letter takes the
///   rest of the token (or the next argument) as its value
/// - `--` stops flag parsing; `-` alone is positional
pub fn tokenize<S: AsRef<str>>(argv: &[S], schema: &Schema) -> ParsedArgv {
    let mut out = ParsedArgv::default();
    let mut i = 0usize;
    let mut after_separator = false;

    while i < argv.len() {
        let arg = argv[i].as_ref();
        i += 1;

        if after_separator || !looks_like_flag(arg) {
            out.push_positional(arg);
            continue;
        }
        if arg == "--" {
            after_separator = true;
            continue;
        }

        if let Some(body) = arg.strip_prefix("--") {
            if let Some((name, value)) = body.split_once('=') {
                out.push_flag(name, Some(value.to_string()));
                continue;
            }
            let value = take_value(argv, &mut i, schema.kind(arg));
            out.push_flag(body, value);
            continue;
        }

        // Short flags: -v, -o value, -abc, -ofile, -o=file
        let body = &arg[1..];
        let mut chars = body.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            let flag = format!("-{c}");
            let rest = &body[idx + c.len_utf8()..];
            if let Some(value) = rest.strip_prefix('=') {
                out.push_flag(c.to_string(), Some(value.to_string()));
                break;
            }
            let kind = schema.kind(&flag);
            let is_last = chars.peek().is_none();
            match kind {
                FlagKind::Value if !rest.is_empty() => {
                    out.push_flag(c.to_string(), Some(rest.to_string()));
                    break;
                }
                FlagKind::Value | FlagKind::Undeclared if is_last => {
                    let value = take_value(argv, &mut i, kind);
                    out.push_flag(c.to_string(), value);
                }
                _ => out.push_flag(c.to_string(), None),
            }
        }
    }

    out
}

fn take_value<S: AsRef<str>>(argv: &[S], i: &mut usize, kind: FlagKind) -> Option<String> {
    if kind == FlagKind::Switch {
        return None;
    }
    let next = argv.get(*i)?.as_ref();
    if next == "--" || looks_like_flag(next) {
        return None;
    }
    *i += 1;
    Some(next.to_string())
}

/// Argument name collection for flag matching.
pub trait FlagNames<'a> {
    type Iter: Iterator<Item = &'a str>;
    fn iter(self) -> Self::Iter;
}

impl<'a> FlagNames<'a> for &'a str {
    type Iter = std::iter::Once<&'a str>;

    fn iter(self) -> Self::Iter {
        std::iter::once(self)
    }
}

impl<'a> FlagNames<'a> for &'a [&'a str] {
    type Iter = std::iter::Copied<std::slice::Iter<'a, &'a str>>;

    fn iter(self) -> Self::Iter {
        self.iter().copied()
    }
}

impl<'a, const N: usize> FlagNames<'a> for [&'a str; N] {
    type Iter = std::array::IntoIter<&'a str, N>;

    fn iter(self) -> Self::Iter {
        self.into_iter()
    }
}

/// Check if a flag like `--verbose` appears in raw argv, before any full
/// tokenization. Parsing stops at `--`.
pub fn flag<'a, N, S>(argv: &[S], names: N) -> bool
where
    N: FlagNames<'a>,
    S: AsRef<str>,
{
    let names: Vec<&str> = names.iter().collect();
    argv.iter()
        .map(|a| a.as_ref())
        .take_while(|a| *a != "--")
        .any(|a| names.iter().any(|name| a == *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn switches_do_not_consume_the_next_token() {
        let schema = Schema::new().switch("-b").switch("--bool");
        let parsed = tokenize(&argv(&["cmd", "-b", "1"]), &schema);
        assert_eq!(parsed.positionals(), ["cmd", "1"]);
        assert_eq!(parsed.flag("b"), Some(&FlagValue::Switch));

        let parsed = tokenize(&argv(&["cmd", "--bool", "1"]), &schema);
        assert_eq!(parsed.positionals(), ["cmd", "1"]);
        assert_eq!(parsed.flag("bool"), Some(&FlagValue::Switch));
    }

    #[test]
    fn negative_numbers_are_positional() {
        let parsed = tokenize(&argv(&["solve", "1", "2", "-3"]), &Schema::new());
        assert_eq!(parsed.positionals(), ["solve", "1", "2", "-3"]);
        assert!(parsed.flags().is_empty());
    }

    #[test]
    fn value_flags_accept_negative_numbers() {
        let schema = Schema::new().value_flag("-n");
        let parsed = tokenize(&argv(&["-n", "-4", "rest"]), &schema);
        assert_eq!(parsed.flag("n"), Some(&FlagValue::Value("-4".to_string())));
        assert_eq!(parsed.positionals(), ["rest"]);
    }

    #[test]
    fn long_equals_and_attached_short_values() {
        let schema = Schema::new().switch("-v").value_flag("-o");
        let parsed = tokenize(&argv(&["--time=12", "-voout.txt", "in.txt"]), &schema);
        assert_eq!(parsed.flag("time"), Some(&FlagValue::Value("12".to_string())));
        assert_eq!(parsed.flag("v"), Some(&FlagValue::Switch));
        assert_eq!(parsed.flag("o"), Some(&FlagValue::Value("out.txt".to_string())));
        assert_eq!(parsed.positionals(), ["in.txt"]);
    }

    #[test]
    fn value_flag_without_value_is_recorded_as_switch() {
        let schema = Schema::new().value_flag("-f").switch("-x");
        let parsed = tokenize(&argv(&["-f", "-x"]), &schema);
        assert_eq!(parsed.flag("f"), Some(&FlagValue::Switch));
        assert_eq!(parsed.flag("x"), Some(&FlagValue::Switch));
    }

    #[test]
    fn repeated_flags_keep_every_occurrence() {
        let schema = Schema::new().value_flag("--list");
        let parsed = tokenize(&argv(&["--list", "1.0", "--list", "fake"]), &schema);
        let Some(FlagValue::Many(all)) = parsed.flag("list") else {
            panic!("expected Many");
        };
        assert_eq!(all, &vec![Some("1.0".to_string()), Some("fake".to_string())]);
    }

    #[test]
    fn separator_stops_flag_parsing() {
        let parsed = tokenize(&argv(&["a", "--", "--not-a-flag", "-"]), &Schema::new());
        assert_eq!(parsed.positionals(), ["a", "--not-a-flag", "-"]);
        assert!(parsed.flags().is_empty());
    }

    #[test]
    fn undeclared_flags_only_take_non_flag_values() {
        let parsed = tokenize(&argv(&["--foo", "bar", "--baz", "-q"]), &Schema::new());
        assert_eq!(parsed.flag("foo"), Some(&FlagValue::Value("bar".to_string())));
        assert_eq!(parsed.flag("baz"), Some(&FlagValue::Switch));
        assert_eq!(parsed.flag("q"), Some(&FlagValue::Switch));
    }

    #[test]
    fn negative_number_detection() {
        assert!(is_negative_number("-3"));
        assert!(is_negative_number("-1.5"));
        assert!(is_negative_number("-2e-3"));
        assert!(!is_negative_number("-x"));
        assert!(!is_negative_number("-"));
        assert!(!is_negative_number("-1.2.3"));
        assert!(!is_negative_number("3"));
    }

    #[test]
    fn flag_prescan_stops_at_separator() {
        let raw = argv(&["order", "-v", "--", "--quiet"]);
        assert!(flag(&raw, ["-v", "--verbose"]));
        assert!(!flag(&raw, "--quiet"));
    }

    #[test]
    fn occurrences_merge_keys_in_command_line_order() {
        let schema = Schema::new()
            .value_flag("-t")
            .value_flag("--tag")
            .value_flag("-n")
            .value_flag("--num");
        let raw = argv(&["cmd", "-t", "a", "--tag", "b", "-t", "c", "--num", "1", "-n", "2"]);
        let parsed = tokenize(&raw, &schema);
        assert_eq!(parsed.occurrences(&["t", "tag"]), [Some("a"), Some("b"), Some("c")]);
        assert_eq!(parsed.occurrences(&["n", "num"]), [Some("1"), Some("2")]);
        assert_eq!(parsed.occurrences(&["tag", "t"]), [Some("a"), Some("b"), Some("c")]);
        assert!(parsed.occurrences(&["missing"]).is_empty());
    }
}
