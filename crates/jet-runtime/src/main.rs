//! Jet - entry point
//!
//! Runs a built-in handler once and prints its response.

use std::path::PathBuf;
use std::process::ExitCode;

use jet_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
use jet_core::fixtures::{GreetingHandler, LoggingGreetingHandler};
use jet_runtime::{Host, HostBuilder, HostError, HostResult, ResponseEnvelope};
use tracing::{error, info};

const DEFAULT_REQUEST: &str = r#"{"to": "Alice"}"#;
const DEFAULT_CONTEXT: &str = r#"{"current_user": {"name": "Alice"}}"#;

/// Built-in handlers the binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerName {
    Greeting,
    LoggingGreeting,
}

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
    /// Request JSON.
    request: String,
    /// Context JSON.
    context: String,
    /// Which handler to run.
    handler: HandlerName,
    /// Indent the printed response.
    pretty: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            config: None,
            request: DEFAULT_REQUEST.to_string(),
            context: DEFAULT_CONTEXT.to_string(),
            handler: HandlerName::Greeting,
            pretty: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    parsed.config = Some(PathBuf::from(required_value(&arg, args.next())));
                }
                "--request" | "-r" => {
                    parsed.request = required_value(&arg, args.next());
                }
                "--context" | "-x" => {
                    parsed.context = required_value(&arg, args.next());
                }
                "--handler" => {
                    parsed.handler = match required_value(&arg, args.next()).as_str() {
                        "greeting" => HandlerName::Greeting,
                        "logging-greeting" => HandlerName::LoggingGreeting,
                        other => {
                            eprintln!("Unknown handler: {other}");
                            eprintln!("Available handlers: greeting, logging-greeting");
                            std::process::exit(1);
                        }
                    };
                }
                "--pretty" => parsed.pretty = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("jet {}", jet_runtime::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        parsed
    }
}

fn required_value(flag: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Missing value for {flag}");
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"Jet - run a handler once

USAGE:
    jet [OPTIONS]

OPTIONS:
    -c, --config <PATH>      Path to configuration file (TOML or JSON)
    -r, --request <JSON>     Request passed to the handler (default: {{"to": "Alice"}})
    -x, --context <JSON>     Context passed to the handler
                             (default: {{"current_user": {{"name": "Alice"}}}})
        --handler <NAME>     greeting (default) or logging-greeting
        --pretty             Indent the printed response
    -h, --help               Print help information
    -v, --version            Print version information

ENVIRONMENT VARIABLES:
    JET__RUNTIME__INVOCATION_TIMEOUT_MS   Invocation timeout (default: none)
    JET__CAPABILITIES__FETCH__ENABLED     Grant the fetch capability (default: true)
    JET__CAPABILITIES__FILES__ROOT        Sandbox root for file access
    JET__LOGGING__LEVEL                   Log filter (default: info)
    JET__LOGGING__FORMAT                  json or pretty (default: json)

EXAMPLES:
    jet --request '{{"to": "Alice"}}' --context '{{"current_user": {{"name": "Bob"}}}}'
"#
    );
}

fn host_builder(handler: HandlerName) -> HostBuilder {
    match handler {
        HandlerName::Greeting => Host::builder().handler(GreetingHandler),
        HandlerName::LoggingGreeting => Host::builder().handler(LoggingGreetingHandler),
    }
}

async fn run(args: Args) -> HostResult<String> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_file(path)?,
        None => ConfigLoader::new(),
    };
    let config = loader
        .with_dotenv()?
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()?;

    jet_telemetry::init_logging(&config.logging.to_log_config())?;
    info!(version = jet_runtime::VERSION, handler = ?args.handler, "Starting jet");

    let host = host_builder(args.handler).config(config).build()?;
    let outcome = host.invoke_json(&args.request, &args.context).await;
    let response = outcome.into_result()?;

    let envelope = ResponseEnvelope::new(&response);
    if args.pretty {
        envelope.to_json_pretty()
    } else {
        envelope.to_json()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(json) => {
            println!("Response: {json}");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn report(e: &HostError) -> ExitCode {
    error!(error = %e, "Invocation did not produce a response");
    eprintln!("error: {e}");
    ExitCode::from(e.exit_code())
}
