//! JSON:API params CLI
//!
//! Command-line interface for deserializing JSON:API documents, reconciling
//! validation errors, and negotiating extensions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsonapi_params::{
    error_document, init_tracing, load_document, load_mapping, reconcile,
    response_content_type, Config, DocumentCoordinator, DocumentError, ErrorsInput, ExtensionSet,
    FieldMapping, LogFormat, Pointers, RequestScope, BULK_EXTENSION,
};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "jsonapi-params")]
#[command(about = "Deserialize JSON:API documents and attribute validation errors to JSON Pointers")]
#[command(version)]
struct Cli {
    /// Log line format on stderr: compact or json (default: $JSONAPI_PARAMS_LOG_FORMAT, else compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a JSON:API document and record the pointer of every key
    Deserialize {
        /// Document file
        document: PathBuf,

        /// Request Content-Type header (e.g. 'application/vnd.api+json; ext="bulk"')
        #[arg(long)]
        content_type: Option<String>,

        /// Supported extensions (overrides config file and JSONAPI_EXTENSIONS)
        #[arg(long = "supported-ext", value_delimiter = ',')]
        supported_ext: Vec<String>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON field mapping file
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Params key the deserialized resource is stored under
        #[arg(long, default_value = "resource")]
        key: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Render field errors as a JSON:API error document
    Reconcile {
        /// Field errors: an object (single) or an array of objects (bulk)
        errors: PathBuf,

        /// Pointers printed by `deserialize`
        #[arg(long)]
        pointers: Option<PathBuf>,

        /// Reconcile positionally against bulk pointers
        #[arg(long)]
        bulk: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Compute active extensions and the response Content-Type
    Negotiate {
        /// Supported extensions (overrides config file and JSONAPI_EXTENSIONS)
        #[arg(long = "supported-ext", value_delimiter = ',')]
        supported_ext: Vec<String>,

        /// Extensions the response delivers
        #[arg(long, value_delimiter = ',')]
        deliver: Vec<String>,

        /// Request Content-Type header
        #[arg(long)]
        request_header: Option<String>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format.unwrap_or_else(LogFormat::from_env));

    let result = match cli.command {
        Commands::Deserialize {
            document,
            content_type,
            supported_ext,
            config,
            mapping,
            key,
            pretty,
        } => run_deserialize(DeserializeArgs {
            document,
            content_type,
            supported_ext,
            config,
            mapping,
            key,
            pretty,
        }),

        Commands::Reconcile {
            errors,
            pointers,
            bulk,
            pretty,
        } => run_reconcile(&errors, pointers.as_deref(), bulk, pretty),

        Commands::Negotiate {
            supported_ext,
            deliver,
            request_header,
            config,
        } => run_negotiate(supported_ext, deliver, request_header, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct DeserializeArgs {
    document: PathBuf,
    content_type: Option<String>,
    supported_ext: Vec<String>,
    config: Option<PathBuf>,
    mapping: Option<PathBuf>,
    key: String,
    pretty: bool,
}

fn run_deserialize(args: DeserializeArgs) -> Result<(), u8> {
    let DeserializeArgs {
        document,
        content_type,
        supported_ext,
        config,
        mapping,
        key,
        pretty,
    } = args;

    let config = load_config(config.as_deref(), supported_ext)?;
    let mapping = match mapping {
        Some(path) => load_mapping(&path).map_err(report)?,
        None => FieldMapping::new(),
    };
    let document = load_document(&document).map_err(report)?;

    let coordinator = DocumentCoordinator::new(key, mapping);
    let mut scope = RequestScope::new(content_type.as_deref());
    let mode = coordinator
        .deserialize_into(&mut scope, Some(&document), &config)
        .map_err(report)?;

    let (params, pointers) = scope.into_parts();
    let output = json!({
        "mode": mode,
        "params": params,
        "pointers": pointers,
    });
    print_json(&output, pretty)
}

fn run_reconcile(
    errors_path: &Path,
    pointers_path: Option<&Path>,
    bulk: bool,
    pretty: bool,
) -> Result<(), u8> {
    let errors = load_document(errors_path).map_err(report)?;
    let errors = ErrorsInput::from_value(&errors).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let pointers = match pointers_path {
        Some(path) => {
            let value = load_document(path).map_err(report)?;
            let pointers: Pointers = serde_json::from_value(value)
                .map_err(|source| report(DocumentError::InvalidJson { source }))?;
            Some(pointers)
        }
        None => None,
    };

    let triples = reconcile(&errors, pointers.as_ref(), bulk).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    print_json(&error_document(&triples), pretty)
}

fn run_negotiate(
    supported_ext: Vec<String>,
    deliver: Vec<String>,
    request_header: Option<String>,
    config: Option<&Path>,
) -> Result<(), u8> {
    let config = load_config(config, supported_ext)?;
    let delivered: ExtensionSet = deliver.into_iter().collect();
    let supported = &config.supported_extensions;

    let mut output = json!({
        "content_type": response_content_type(&delivered, supported),
    });
    if let Some(header) = request_header {
        let scope = RequestScope::new(Some(header.as_str()));
        output["requested"] = json!(scope.requested_extensions());
        output["active"] = json!(scope.active_extensions(&config));
        output["bulk"] = Value::Bool(scope.extension_request(BULK_EXTENSION, &config));
    }
    print_json(&output, false)
}

/// Config file, then environment, then `--supported-ext`.
fn load_config(path: Option<&Path>, supported_ext: Vec<String>) -> Result<Config, u8> {
    let config = match path {
        Some(path) => Config::from_file(path).map_err(report)?,
        None => Config::new(),
    }
    .merge_env();

    if supported_ext.is_empty() {
        Ok(config)
    } else {
        Ok(config.with_extensions(supported_ext))
    }
}

fn report(e: DocumentError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", output);
    Ok(())
}
