//! Validation Schema CLI
//!
//! Command-line interface for translating schema descriptions into OpenAPI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use tracing::level_filters::LevelFilter;
use validation_swagger::{
    load_components, load_description, translate, Components, Dialect, TranslateOptions,
    DEFAULT_MAX_DEPTH,
};

#[derive(Parser)]
#[command(name = "validation-swagger")]
#[command(about = "Translate validation schema descriptions into OpenAPI schema objects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate one schema description
    Translate {
        /// Schema description file (JSON)
        schema: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Translate several descriptions in order, sharing one component registry
    Assemble {
        /// Schema description files (JSON)
        #[arg(required = true)]
        schemas: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct OptionArgs {
    /// Existing components (a registry or an earlier translation result)
    #[arg(long)]
    components: Option<PathBuf>,

    /// Output dialect
    #[arg(long, value_enum, default_value_t = DialectArg::Openapi3)]
    dialect: DialectArg,

    /// Keep single-branch alternatives wrapped in their union keyword
    #[arg(long)]
    wrap_single_branch: bool,

    /// Fail when a named schema is defined twice with different fragments
    #[arg(long)]
    strict_definitions: bool,

    /// Do not emit additionalProperties: false for objects
    #[arg(long)]
    open_objects: bool,

    /// Maximum nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Include the --components input in the emitted components
    #[arg(long)]
    merge_components: bool,

    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    #[value(name = "openapi3")]
    Openapi3,
    #[value(name = "swagger2")]
    Swagger2,
}

impl From<DialectArg> for Dialect {
    fn from(val: DialectArg) -> Self {
        match val {
            DialectArg::Openapi3 => Dialect::OpenApi3,
            DialectArg::Swagger2 => Dialect::Swagger2,
        }
    }
}

impl OptionArgs {
    fn translate_options(&self) -> TranslateOptions {
        TranslateOptions::new()
            .dialect(self.dialect.into())
            .unwrap_single_branch(!self.wrap_single_branch)
            .strict_definitions(self.strict_definitions)
            .close_objects(!self.open_objects)
            .max_depth(self.max_depth)
    }

    fn existing_components(&self) -> Result<Components, u8> {
        match &self.components {
            Some(path) => load_components(path).map_err(|e| {
                eprintln!("Error loading components: {}", e);
                e.exit_code() as u8
            }),
            None => Ok(Components::new()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Translate { schema, options } => run_translate(&schema, &options),
        Commands::Assemble { schemas, options } => run_assemble(&schemas, &options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_translate(schema_path: &Path, args: &OptionArgs) -> Result<(), u8> {
    let existing = args.existing_components()?;
    let options = args.translate_options();

    let schema = load_description(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let result = translate(&schema, &existing, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let components = if args.merge_components {
        existing.merged(&result.components)
    } else {
        result.components.clone()
    };

    let output = json!({
        "swagger": result.swagger.unwrap_or(Value::Bool(false)),
        "components": components.to_value(),
    });
    write_output(&output, args)
}

fn run_assemble(schema_paths: &[PathBuf], args: &OptionArgs) -> Result<(), u8> {
    let existing = args.existing_components()?;
    let options = args.translate_options();

    let mut discovered = Components::new();
    let mut fragments = Map::new();

    for path in schema_paths {
        let schema = load_description(path).map_err(|e| {
            eprintln!("Error in {}: {}", path.display(), e);
            e.exit_code() as u8
        })?;

        let known = existing.merged(&discovered);
        let result = translate(&schema, &known, &options).map_err(|e| {
            eprintln!("Error in {}: {}", path.display(), e);
            e.exit_code() as u8
        })?;

        let merge = if options.strict_definitions {
            discovered.merge_strict(&result.components)
        } else {
            discovered.merge(&result.components);
            Ok(())
        };
        merge.map_err(|e| {
            eprintln!("Error in {}: {}", path.display(), e);
            e.exit_code() as u8
        })?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::debug!(file = %path.display(), name = %name, "translated schema");
        if fragments.contains_key(&name) {
            tracing::warn!(name = %name, "duplicate file stem, later schema wins");
        }
        fragments.insert(name, result.swagger.unwrap_or(Value::Bool(false)));
    }

    let components = if args.merge_components {
        existing.merged(&discovered)
    } else {
        discovered
    };

    let output = json!({
        "schemas": Value::Object(fragments),
        "components": components.to_value(),
    });
    write_output(&output, args)
}

fn write_output(value: &Value, args: &OptionArgs) -> Result<(), u8> {
    let json_output = if args.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
