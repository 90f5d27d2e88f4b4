//! # CLI
//!
//! The command-line interface of `gapic`, defined with `clap`.
//!
//! Global flags map onto `ClientOptions`; the subcommands pick the method and build the request,
//! either from a JSON `--body` or from repeated `--field key=value` pairs.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gapic",
    version,
    about = "Call paged gRPC APIs from the command line"
)]
pub struct Cli {
    /// Path to the descriptor set (.bin) describing the API
    #[arg(long, global = true)]
    pub descriptor_set: Option<PathBuf>,

    /// Endpoint used when no --endpoint is given; its mTLS variant is derived from it
    #[arg(
        long,
        global = true,
        default_value = "servicemanagement.googleapis.com"
    )]
    pub default_endpoint: String,

    /// Explicit API endpoint (e.g. localhost:8080 or http://localhost:8080)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// JSON file with client options; flags take precedence over its values
    #[arg(long, global = true)]
    pub options_file: Option<PathBuf>,

    /// Credentials file to authorize calls with
    #[arg(long, global = true)]
    pub credentials_file: Option<PathBuf>,

    /// API key to authorize calls with
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Send calls without any credentials (local emulators)
    #[arg(long, global = true)]
    pub anonymous: bool,

    /// Project billed for the calls
    #[arg(long, global = true)]
    pub quota_project: Option<String>,

    /// OAuth scope to request; repeatable
    #[arg(long = "scope", global = true)]
    pub scopes: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Perform a unary call and print the response
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// gapic --descriptor-set api.bin call pkg.Service/GetThing --field name=things/1
    /// ```
    Call {
        /// Method (package.Service/Method)
        #[arg(value_parser = parse_method)]
        method: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Perform a paged call and print every item, fetching pages as needed
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// gapic --descriptor-set api.bin list pkg.Service/ListThings --field parent=projects/p
    /// ```
    List {
        /// Method (package.Service/Method)
        #[arg(value_parser = parse_method)]
        method: String,

        #[command(flatten)]
        request: RequestArgs,

        /// Print whole pages, including their continuation token, instead of items
        #[arg(long)]
        pages: bool,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
}

#[derive(Args)]
pub struct RequestArgs {
    /// Full request as a JSON object. Cannot be combined with --field
    #[arg(long, value_parser = parse_body)]
    pub body: Option<serde_json::Value>,

    /// Single request field as key=value; values are parsed as JSON when possible
    #[arg(short = 'f', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, serde_json::Value)>,
}

fn parse_method(value: &str) -> Result<String, String> {
    let (service, method) = value.split_once('/').ok_or_else(|| {
        format!("Invalid method format: '{value}'. Expected 'package.Service/Method'")
    })?;

    if service.trim().is_empty() || method.trim().is_empty() {
        return Err("Service and Method names cannot be empty".to_string());
    }

    Ok(value.to_string())
}

fn parse_field(value: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = value
        .split_once('=')
        .ok_or_else(|| "Format must be 'key=value'".to_string())?;

    let parsed = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::from(raw));
    Ok((key.trim().to_string(), parsed))
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    match serde_json::from_str(value) {
        Ok(body @ serde_json::Value::Object(_)) => Ok(body),
        Ok(_) => Err("The request body must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON: {e}")),
    }
}
