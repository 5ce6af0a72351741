use corporal::{
    ArgSpec, Error, Exit, FLOAT, INT, LIST, MemoryReporter, OptSpec, ParsedArgv, Program,
    REPEATABLE, Resolution, STRING, Validator, Value,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Harness {
    program: Program,
    reporter: Arc<MemoryReporter>,
    calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        let reporter = Arc::new(MemoryReporter::new());
        let program = Program::new()
            .with_name("test")
            .with_version("1.0.0")
            .with_reporter(reporter.clone());
        Self {
            program,
            reporter,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn run_now(&self, argv: &[&str]) -> Exit {
        match self.program.parse(argv).into_ready() {
            Ok(exit) => exit,
            Err(_) => panic!("expected a synchronous run for {argv:?}"),
        }
    }
}

fn tokens(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}

#[test]
fn unknown_option_suggests_close_long_names() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .option(OptSpec::new("--foor", "").unwrap())
        .unwrap()
        .option(OptSpec::new("--afoo", "").unwrap())
        .unwrap()
        .option(OptSpec::new("--footx", "").unwrap())
        .unwrap()
        .action(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(h.run_now(&["--foo"]), Exit::Failure);
    assert_eq!(h.calls(), 0);
    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    let corporal::Report::Fatal { name, message, .. } = &reports[0] else {
        panic!("expected Fatal");
    };
    assert_eq!(*name, "UnknownOptionError");
    assert_eq!(
        message,
        "Unknown option --foo. Did you mean --foor or maybe --afoo or maybe --footx ?"
    );
}

#[test]
fn mixed_short_and_long_occurrences_keep_their_order() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .command("cmd", "")
        .option(
            OptSpec::new("-t, --tag <tag>", "")
                .unwrap()
                .with_validator(REPEATABLE | STRING),
        )
        .unwrap()
        .option(OptSpec::new("-n, --num <n>", "").unwrap().with_validator(INT))
        .unwrap()
        .action(move |_, options| {
            assert_eq!(options.get("tag"), Some(&Value::from(vec!["a", "b", "c"])));
            assert_eq!(options.get_i64("num"), Some(2));
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let argv = ["cmd", "-t", "a", "--tag", "b", "-t", "c", "--num", "1", "-n", "2"];
    assert_eq!(h.run_now(&argv), Exit::Success);
    assert_eq!(h.calls(), 1);
    assert!(h.reporter.fatal_names().is_empty());
}

#[test]
fn implicit_boolean_leaves_following_token_positional() {
    let mut h = Harness::new();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.program
        .command("cmd", "")
        .argument(ArgSpec::new("<a>", "").unwrap().with_validator(INT))
        .unwrap()
        .option(OptSpec::new("-b, --bool", "").unwrap())
        .unwrap()
        .action(move |args, options| {
            let mut sink = sink.lock().unwrap();
            sink.push((args.get_i64("a"), options.get_bool("bool")));
            Ok(())
        });

    assert_eq!(h.run_now(&["cmd", "-b", "1"]), Exit::Success);
    assert_eq!(h.run_now(&["cmd", "1"]), Exit::Success);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Some(1), Some(true)), (Some(1), Some(false))]
    );
}

#[test]
fn negative_numbers_bind_as_arguments() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .command("solve", "")
        .argument(ArgSpec::new("<a>", "").unwrap().with_validator(INT))
        .unwrap()
        .argument(ArgSpec::new("<b>", "").unwrap().with_validator(INT))
        .unwrap()
        .argument(ArgSpec::new("<c>", "").unwrap().with_validator(INT))
        .unwrap()
        .action(move |args, _| {
            assert_eq!(args.get_i64("c"), Some(-3));
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(h.run_now(&["solve", "1", "2", "-3"]), Exit::Success);
    assert_eq!(h.calls(), 1);
    assert!(h.reporter.fatal_names().is_empty());
}

#[test]
fn optional_and_variadic_arguments() {
    let mut h = Harness::new();
    h.program
        .command("foo", "")
        .argument(ArgSpec::new("[foo]", "").unwrap().with_default("bar"))
        .unwrap()
        .argument(ArgSpec::new("[other-foo...]", "").unwrap());

    let parsed = corporal_argv::tokenize(
        &["foo", "bar", "im", "a", "variadic", "arg"],
        &corporal_argv::Schema::new(),
    );
    let resolved = h.program.resolve(&parsed).into_ready();
    let Ok(Ok(Resolution::Invocation { args, .. })) = resolved else {
        panic!("expected Invocation");
    };
    assert_eq!(args.get_str("foo"), Some("bar"));
    assert_eq!(
        args.get("otherFoo"),
        Some(&Value::from(vec!["im", "a", "variadic", "arg"]))
    );
}

#[test]
fn float_lists_fail_as_a_whole() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .option(
            OptSpec::new("--list <list>", "")
                .unwrap()
                .with_validator(LIST | FLOAT),
        )
        .unwrap()
        .action(move |_, options| {
            assert_eq!(options.get("list"), Some(&Value::from(vec![1.0, 0.0])));
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(h.run_now(&["--list", "1.0,0"]), Exit::Success);
    assert_eq!(h.run_now(&["--list", "1.0,0,fake"]), Exit::Failure);
    assert_eq!(h.run_now(&["--list", "1.0", "--list", "fake"]), Exit::Failure);
    assert_eq!(h.calls(), 1);
    assert_eq!(
        h.reporter.fatal_names(),
        vec!["InvalidOptionValueError", "InvalidOptionValueError"]
    );
}

#[tokio::test]
async fn async_validators_report_one_error_after_settling() {
    let mut h = Harness::new();
    let calls = h.counter();
    let settled = Arc::new(AtomicUsize::new(0));
    let (first, second) = (settled.clone(), settled.clone());
    h.program
        .option(
            OptSpec::new("-a <a>", "")
                .unwrap()
                .with_validator(Validator::future(move |raw| {
                    let first = first.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        first.fetch_add(1, Ordering::SeqCst);
                        Ok(raw)
                    }
                })),
        )
        .unwrap()
        .option(
            OptSpec::new("-b <b>", "")
                .unwrap()
                .with_validator(Validator::future(move |raw| {
                    let second = second.clone();
                    async move {
                        second.fetch_add(1, Ordering::SeqCst);
                        Err::<String, _>(anyhow::anyhow!("{raw} is rejected"))
                    }
                })),
        )
        .unwrap()
        .action(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let run = h.program.parse(&["-a", "x", "-b", "y"]);
    assert!(!run.is_ready());
    assert_eq!(run.await, Exit::Failure);
    assert_eq!(settled.load(Ordering::SeqCst), 2);
    assert_eq!(h.calls(), 0);
    assert_eq!(h.reporter.fatal_names(), vec!["InvalidOptionValueError"]);
}

#[test]
fn missing_required_option_reports_once() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .command("issue118", "")
        .option(OptSpec::new("-z <zz>", "").unwrap().required(true))
        .unwrap()
        .action(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(h.run_now(&["issue118"]), Exit::Failure);
    assert_eq!(h.calls(), 0);
    let reports = h.reporter.reports();
    assert_eq!(
        reports,
        vec![corporal::Report::Fatal {
            name: "MissingOptionError",
            message: "Missing option -z.".to_string(),
            verbose: false,
        }]
    );
}

#[test]
fn resolution_is_idempotent() {
    let mut h = Harness::new();
    h.program
        .command("order", "")
        .argument(ArgSpec::new("<what>", "").unwrap())
        .unwrap()
        .argument(ArgSpec::new("[how-much]", "").unwrap().with_validator(INT))
        .unwrap()
        .option(OptSpec::new("-t, --tag <tag>", "").unwrap().with_validator(LIST))
        .unwrap();

    let mut parsed = ParsedArgv::new();
    for token in tokens(&["order", "pizza", "-1"]) {
        parsed.push_positional(token);
    }
    parsed.push_flag("t", Some("a,b".to_string()));

    let snapshot = |program: &Program| {
        let resolved = program.resolve(&parsed).into_ready();
        let Ok(Ok(Resolution::Invocation {
            command,
            args,
            options,
            ..
        })) = resolved
        else {
            panic!("expected Invocation");
        };
        (command.name().to_string(), args, options)
    };
    let first = snapshot(&h.program);
    let second = snapshot(&h.program);
    assert_eq!(first, second);
    assert_eq!(first.1.get_i64("howMuch"), Some(-1));
    assert_eq!(first.2.get("tag"), Some(&Value::from(vec!["a", "b"])));
}

#[tokio::test]
async fn rejected_async_action_is_reported_once() {
    let mut h = Harness::new();
    h.program
        .command("return", "")
        .argument(ArgSpec::new("<order-id>", "").unwrap())
        .unwrap()
        .action_async(|args, _| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let id = args.get_str("orderId").unwrap_or("?");
            Err::<(), _>(anyhow::anyhow!("order {id} cannot be returned"))
        });

    assert_eq!(h.program.parse(&["return", "#82792"]).await, Exit::Failure);
    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    let corporal::Report::Fatal { name, message, .. } = &reports[0] else {
        panic!("expected Fatal");
    };
    assert_eq!(*name, "ActionError");
    assert_eq!(message, "order #82792 cannot be returned");
}

#[test]
fn alias_routes_to_the_command() {
    let mut h = Harness::new();
    let calls = h.counter();
    h.program
        .command("order", "Order a pizza")
        .alias("give-it-to-me")
        .argument(ArgSpec::new("<kind>", "").unwrap().with_validator(["margherita", "hawaiian"]))
        .unwrap()
        .action(move |args, _| {
            assert_eq!(args.get_str("kind"), Some("hawaiian"));
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(h.run_now(&["give-it-to-me", "hawaiian"]), Exit::Success);
    assert_eq!(h.run_now(&["give-it-to-me", "pepperoni"]), Exit::Failure);
    assert_eq!(h.calls(), 1);
    assert_eq!(h.reporter.fatal_names(), vec!["InvalidArgumentValueError"]);
}

#[test]
fn declaration_errors_surface_immediately() {
    let mut h = Harness::new();
    let err = OptSpec::new("-f, --file <file> extra", "").unwrap_err();
    assert!(matches!(err, Error::OptionSyntax { .. }));

    let cmd = h.program.command("dup", "");
    cmd.option(OptSpec::new("-f, --file <file>", "").unwrap()).unwrap();
    let err = cmd.option(OptSpec::new("--file", "").unwrap()).unwrap_err();
    assert_eq!(err.name(), "DuplicateOptionError");
    assert!(h.reporter.reports().is_empty());
}

#[tokio::test]
async fn completion_sources() {
    let kind = ArgSpec::new("<kind>", "")
        .unwrap()
        .with_validator(["margherita", "hawaiian", "fredo"]);
    assert_eq!(kind.complete().await.unwrap(), kind.choices());

    let account = ArgSpec::new("<account>", "").unwrap().with_completer(
        corporal::Completer::future(|| async {
            Ok(vec!["account-1".to_string(), "account-2".to_string()])
        }),
    );
    assert!(account.choices().is_empty());
    assert_eq!(account.complete().await.unwrap(), vec!["account-1", "account-2"]);
}
