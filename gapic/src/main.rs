//! # Gapic CLI Entry Point
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    `tracing` subscriber (`RUST_LOG`, `warn` by default, written to stderr).
//! 2. **Configuration**: Maps the flags (and an optional options file) onto `ClientOptions`.
//! 3. **Connection**: Resolves the endpoint and credentials and connects through `gapic_core`.
//! 4. **Execution**: Runs a unary call or walks a paged call, printing results as they arrive.
mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, RequestArgs};
use formatter::FormattedString;
use gapic_core::{
    ClientOptions, Credentials, GapicClient,
    config::ServiceDefaults,
    prost_reflect::DescriptorPool,
    request::FieldSet,
};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let client = connect_or_exit(&args).await;

    match args.command {
        Commands::Call { method, request } => run_call(&client, &method, request).await,
        Commands::List {
            method,
            request,
            pages,
            max_pages,
        } => run_list(&client, &method, request, pages, max_pages).await,
    }
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    eprintln!("{}", err.into());
    process::exit(1);
}

fn load_descriptor_pool(args: &Cli) -> anyhow::Result<DescriptorPool> {
    let path = args
        .descriptor_set
        .as_ref()
        .context("--descriptor-set is required")?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read descriptor set '{}'", path.display()))?;
    DescriptorPool::decode(bytes.as_slice())
        .with_context(|| format!("Failed to decode descriptor set '{}'", path.display()))
}

fn client_options(args: &Cli) -> anyhow::Result<ClientOptions> {
    let mut options = match &args.options_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file '{}'", path.display()))?;
            ClientOptions::from_json(&json)
                .with_context(|| format!("Invalid options file '{}'", path.display()))?
        }
        None => ClientOptions::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        options = options.with_api_endpoint(endpoint);
    }
    if let Some(path) = &args.credentials_file {
        options = options.with_credentials_file(path);
    }
    if let Some(key) = &args.api_key {
        options = options.with_api_key(key);
    }
    if args.anonymous {
        options = options.with_credentials(Credentials::anonymous());
    }
    if let Some(project) = &args.quota_project {
        options = options.with_quota_project_id(project);
    }
    if !args.scopes.is_empty() {
        options = options.with_scopes(args.scopes.iter().cloned());
    }

    Ok(options)
}

async fn connect_or_exit(args: &Cli) -> GapicClient {
    let pool = load_descriptor_pool(args).unwrap_or_else(|err| exit_with(err));
    let options = client_options(args).unwrap_or_else(|err| exit_with(err));

    tracing::debug!(default_endpoint = %args.default_endpoint, "connecting");
    match GapicClient::builder(ServiceDefaults::new(&args.default_endpoint), pool)
        .options(options)
        .connect()
        .await
    {
        Ok(client) => client,
        Err(err) => exit_with(err),
    }
}

async fn run_call(client: &GapicClient, method: &str, request: RequestArgs) {
    let fields: FieldSet = request.fields.into_iter().collect();

    match client.call_with(method, request.body, fields).await {
        Ok(value) => println!("{}", FormattedString::from(value)),
        Err(err) => exit_with(err),
    }
}

async fn run_list(
    client: &GapicClient,
    method: &str,
    request: RequestArgs,
    pages: bool,
    max_pages: Option<usize>,
) {
    let fields: FieldSet = request.fields.into_iter().collect();

    let mut pager = match client.list_with(method, request.body, fields).await {
        Ok(pager) => pager,
        Err(err) => exit_with(err),
    };

    let mut fetched = 0;
    while max_pages.is_none_or(|max| fetched < max) {
        match pager.next_page().await {
            Some(Ok(page)) if pages => println!("{}", FormattedString::from(page)),
            Some(Ok(page)) => {
                for item in page.items {
                    println!("{}", FormattedString::from(item));
                }
            }
            Some(Err(err)) => exit_with(err),
            None => break,
        }
        fetched += 1;
    }
}
