use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hub::mail::{AddressEntry, Addresses};
use hub::{logging, Hub, HubConfig, Query, Request, TransportSpec};

#[derive(Parser, Debug)]
#[command(name = "hub", version, about = "Render components, map routes and send mail")]
struct Cli {
    /// Configuration file (default: ./hub.yaml, ./hub.yml or ./hub.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch a component and print its output
    Render(RenderArgs),
    /// Convert between query variables and URL segments
    #[command(subcommand)]
    Route(RouteCommand),
    /// Mail transport utilities
    #[command(subcommand)]
    Mail(MailCommand),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Component name, with or without the com_ prefix
    component: String,
    #[arg(long)]
    controller: Option<String>,
    #[arg(long)]
    task: Option<String>,
    /// Extra request variables as key=value
    #[arg(short = 'p', long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,
    /// Print output and document head as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum RouteCommand {
    /// key=value pairs to segments
    Build {
        component: String,
        #[arg(value_parser = parse_pair)]
        vars: Vec<(String, String)>,
    },
    /// Segments to query variables
    Parse {
        component: String,
        segments: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum MailCommand {
    /// Show the transport DSN the configuration resolves to
    Dsn,
    /// Send a plain-text message
    Send {
        #[arg(long, required = true)]
        to: Vec<String>,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Registered transporter name; defaults to the configured DSN
        #[arg(long)]
        transport: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn main() -> Result<()> {
    logging::init(logging::DEFAULT_FILTER);
    let cli = Cli::parse();
    let config = HubConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let mut hub = Hub::new(config);

    match cli.command {
        Command::Render(args) => render(&mut hub, args),
        Command::Route(RouteCommand::Build { component, vars }) => {
            let mut query: Query = vars.into_iter().collect();
            let segments = hub.build_route(&component, &mut query)?;
            let out = serde_json::json!({ "segments": segments, "query": query });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Command::Route(RouteCommand::Parse {
            component,
            segments,
        }) => {
            let query = hub.parse_route(&component, &segments)?;
            println!("{}", serde_json::to_string_pretty(&query)?);
            Ok(())
        }
        Command::Mail(MailCommand::Dsn) => {
            match configured_dsn(&hub) {
                Some(dsn) => println!("{dsn}"),
                None => bail!("mailer `{}` has no transport", hub.config().mail.mailer),
            }
            Ok(())
        }
        Command::Mail(MailCommand::Send {
            to,
            subject,
            body,
            transport,
        }) => {
            let mut message = hub.message();
            if message.from().is_empty() {
                bail!("set `mailfrom` in the configuration to send mail");
            }
            let recipients: Addresses = to.iter().map(|t| AddressEntry::from(t.as_str())).collect();
            message.set_to(recipients)?;
            message.set_subject(subject).set_body(body, None);

            let spec = transport
                .as_deref()
                .map(TransportSpec::from)
                .unwrap_or_default();
            if !hub.send_mail(&mut message, spec)? {
                let failed = message.failures().unwrap_or_default().join(", ");
                bail!("delivery failed: {failed}");
            }
            if let Some(rejected) = message.failures().filter(|f| !f.is_empty()) {
                eprintln!("rejected: {}", rejected.join(", "));
            }
            Ok(())
        }
    }
}

fn render(hub: &mut Hub, args: RenderArgs) -> Result<()> {
    let mut request = Request::from_query(args.params.into_iter().collect());
    if let Some(controller) = args.controller {
        request.set("controller", controller);
    }
    if let Some(task) = args.task {
        request.set("task", task);
    }

    let page = hub
        .render(&args.component, &request)
        .with_context(|| format!("rendering {}", args.component))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print!("{}", page.output);
    }
    Ok(())
}

fn configured_dsn(hub: &Hub) -> Option<String> {
    let raw = hub::mail::dsn::build(&hub.config().mail)?;
    Some(match hub::mail::Dsn::parse(&raw) {
        Ok(dsn) => dsn.to_string(),
        Err(e) => e.to_string(),
    })
}
