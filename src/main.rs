use anyhow::Context;
use apid::app::{handle_fatal_error, init_logging, AppConfig};
use apid::config::{load_and_validate, ConfigError};
use apid::http::{HttpClient, Request, Response, TimedClient};
use apid::template::TemplateEvaluator;
use apid::ApidError;
use clap::{Parser, Subcommand};
use http::header::{HeaderName, HeaderValue};
use http::Method;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Execution engine for declarative API transaction tests
#[derive(Parser)]
#[command(name = "apid", version)]
#[command(about = "Validate apid documents, render templates and probe HTTP timings", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Shell used for `{% %}` commands (defaults to $SHELL)
    #[arg(long, global = true)]
    shell: Option<String>,

    /// Maximum run time of a single command, e.g. "10s" or "500ms"
    #[arg(long, global = true, default_value = "10s", value_parser = humantime::parse_duration)]
    command_timeout: Duration,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and report every validation problem
    Check {
        /// Path to a YAML or JSON document
        config: PathBuf,
    },
    /// Render a template against a document's variables
    Render {
        /// Path to a YAML or JSON document
        config: PathBuf,
        /// Template text, e.g. "{{ var.api }}/users"
        template: String,
        /// Layer this transaction's variables over the document's
        #[arg(short, long)]
        transaction: Option<String>,
    },
    /// Send one request and print its phase timings
    Request {
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Header as "Name: value", repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Accept invalid certificates and host names
        #[arg(short = 'k', long)]
        insecure: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app = AppConfig::new(cli.verbose)
        .with_shell(cli.shell)
        .with_command_timeout(cli.command_timeout);

    init_logging(&app);

    let result = match cli.command {
        Commands::Check { config } => run_check(config).await,
        Commands::Render {
            config,
            template,
            transaction,
        } => run_render(&app, config, template, transaction).await,
        Commands::Request {
            url,
            method,
            headers,
            data,
            insecure,
        } => run_request(url, method, headers, data, insecure).await,
    };

    if let Err(e) = result {
        handle_fatal_error(e, app.verbose);
    }
}

async fn run_check(path: PathBuf) -> anyhow::Result<()> {
    let config = load_and_validate(&path).await.map_err(ApidError::from)?;
    let steps: usize = config.transactions().iter().map(|t| t.steps().len()).sum();
    println!(
        "{}: ok ({} transaction(s), {} step(s))",
        path.display(),
        config.transactions().len(),
        steps
    );
    Ok(())
}

async fn run_render(
    app: &AppConfig,
    path: PathBuf,
    template: String,
    transaction: Option<String>,
) -> anyhow::Result<()> {
    let config = load_and_validate(&path).await.map_err(ApidError::from)?;
    let transaction = match transaction {
        Some(id) => Some(
            config
                .transaction(&id)
                .ok_or_else(|| ApidError::from(ConfigError::TransactionNotFound(id.clone())))?,
        ),
        None => None,
    };

    let vars = config.scope_for(transaction);
    debug!("Rendering with {} flattened variable(s)", vars.flatten().len());

    let evaluator = TemplateEvaluator::new(app.shell_executor());
    let rendered = evaluator
        .render(&template, &vars)
        .await
        .map_err(ApidError::from)?;
    println!("{rendered}");
    Ok(())
}

async fn run_request(
    url: String,
    method: String,
    headers: Vec<String>,
    data: Option<String>,
    insecure: bool,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{method}'"))?;

    let mut request = Request::new(method, &url)
        .map_err(ApidError::from)?
        .with_skip_verify(insecure);
    for header in &headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header '{header}' is not in \"Name: value\" form"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("invalid header name in '{header}'"))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid header value in '{header}'"))?;
        request = request.with_header(name, value);
    }
    if let Some(data) = data {
        request = request.with_body(data);
    }

    let client = TimedClient::new().map_err(ApidError::from)?;
    let response = client.execute(request).await.map_err(ApidError::from)?;
    print_timings(&response);
    println!("{}", response.text());
    Ok(())
}

fn print_timings(response: &Response) {
    let timings = &response.timings;
    eprintln!("status:            {}", response.status);
    eprintln!("dns lookup:        {:?}", timings.dns_lookup);
    eprintln!("tcp connection:    {:?}", timings.tcp_connection);
    eprintln!("tls handshake:     {:?}", timings.tls_handshake);
    eprintln!("server processing: {:?}", timings.server_processing);
    eprintln!("content transfer:  {:?}", timings.content_transfer);
    eprintln!("total:             {:?}", timings.total());
}
