use anyhow::{Result, bail};
use corporal::{ArgSpec, Completer, FLOAT, INT, LIST, OptSpec, Program, Validator, Values};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

const KINDS: [&str; 3] = ["margherita", "hawaiian", "fredo"];

fn main() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    init_tracing(&argv);
    let program = build_program()?;

    let exit = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { program.parse(&argv).await });
    std::process::exit(exit.code());
}

fn build_program() -> Result<Program> {
    let mut program = Program::new()
        .with_name("pizza")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_description("Order and return pizzas")
        .with_help("My Custom help !!");

    program
        .command("order", "Order a pizza")
        .help("My Custom help about the order command !!")
        .alias("give-it-to-me")
        .argument(ArgSpec::new("<kind>", "Kind of pizza")?.with_validator(KINDS))?
        .argument(
            ArgSpec::new("<from-store>", "Which store to order from")?.with_completer(
                Completer::sync(|| Ok((1..=5).map(|n| format!("store-{n}")).collect())),
            ),
        )?
        .argument(
            ArgSpec::new("<account>", "Which account id to use")?.with_completer(
                Completer::future(|| async {
                    Ok(vec!["account-1".to_string(), "account-2".to_string()])
                }),
            ),
        )?
        .option(
            OptSpec::new("-n, --number <num>", "Number of pizza")?
                .with_validator(INT)
                .with_default(1),
        )?
        .option(OptSpec::new("-d, --discount <amount>", "Discount offer")?.with_validator(FLOAT))?
        .option(
            OptSpec::new("-p, --pay-by <mean>", "Pay by option")?.with_completer(Completer::future(
                || async { Ok(vec!["cash".to_string(), "credit-card".to_string()]) },
            )),
        )?
        .option(
            OptSpec::new("-e <ingredients>", "Add extra ingredients")?
                .with_validator(["pepperoni", "onion", "cheese"]),
        )?
        .option(
            OptSpec::new("--add-ingredients <ingredients>", "Add extra ingredients")?
                .with_validator(LIST),
        )?
        .action(|args, options| print_call("order", args, options));

    program
        .command("return", "Return an order")
        .argument(
            ArgSpec::new("<order-id>", "Order id")?
                .with_validator(Validator::future(check_order_id))
                .with_completer(Completer::future(|| async {
                    Ok(["#82792", "#71727", "#526Z52"].map(String::from).to_vec())
                })),
        )?
        .argument(ArgSpec::new("<to-store>", "Store id")?)?
        .option(
            OptSpec::new("--ask-change <other-kind-pizza>", "Ask for other kind of pizza")?
                .with_completer(Completer::sync(|| Ok(KINDS.map(String::from).to_vec()))),
        )?
        .option(OptSpec::new("--say-something <something>", "Say something to the manager")?)?
        .action_async(|args, options| async move {
            let ret = confirm_return().await;
            print_call("return", &args, &options)?;
            println!("return confirmed with: {ret}");
            anyhow::Ok(())
        });

    let manifest = program.schema().to_json_pretty()?;
    program
        .command("schema", "Print the program declaration as JSON")
        .hidden(true)
        .action(move |_, _| {
            println!("{manifest}");
            Ok(())
        });

    Ok(program)
}

async fn check_order_id(raw: String) -> Result<String> {
    tokio::time::sleep(Duration::from_millis(5)).await;
    if !raw.starts_with('#') || raw.len() < 2 {
        bail!("order ids look like #82792");
    }
    Ok(raw)
}

async fn confirm_return() -> &'static str {
    tokio::time::sleep(Duration::from_millis(10)).await;
    "wooooo"
}

fn print_call(command: &str, args: &Values, options: &Values) -> Result<()> {
    tracing::debug!(command, "action called");
    println!("Command '{command}' called with:");
    println!("arguments: {}", serde_json::to_string(args)?);
    println!("options: {}", serde_json::to_string(options)?);
    Ok(())
}

/// `RUST_LOG` wins; otherwise the global verbosity flags pick the level.
fn init_tracing(argv: &[String]) {
    let level = if corporal_argv::flag(argv, "--silent") {
        "off"
    } else if corporal_argv::flag(argv, "--quiet") {
        "warn"
    } else if corporal_argv::flag(argv, ["-v", "--verbose"]) {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
