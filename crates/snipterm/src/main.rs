//! SnipTerm - keyboard snippets for terminal sessions
//!
//! Command-line front end: validate, inspect, expand and edit the snippets
//! bound in the config file.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use keymap::{
    BindingError, KeyChord, LoadPolicy, SessionDirectory, SnippetBinding, SnippetTable,
    WriterInput,
};
use settings::{Config, SnippetEntry};
use snippet::{SnippetError, Step};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Parser)]
#[command(name = "snipterm", version, about = "Keyboard snippets for terminal sessions")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile every configured snippet and report the ones that fail.
    Check,
    /// List bound chords with their descriptions and variables.
    List,
    /// Write the text a chord would type to stdout.
    Expand {
        /// Key chord, e.g. `ctrl-shift-h` or `<Control>F5`.
        keys: String,
        /// Working directory exposed as $PWD (defaults to the current one).
        #[arg(long, value_name = "DIR")]
        pwd: Option<PathBuf>,
        /// Extra variable, may be repeated.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
    /// Compile a template and print its steps.
    Compile {
        template: String,
        /// Print the steps as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a binding to the config file, replacing any binding for the same chord.
    Bind {
        keys: String,
        snippet: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Create the config file with commented examples if it does not exist.
    Init,
    /// Re-check the config file every time it changes.
    Watch,
}

impl Command {
    /// Log filter used when neither debug mode nor RUST_LOG is set.
    fn default_filter(&self) -> &'static str {
        match self {
            Command::Watch => "info",
            _ => "warn",
        }
    }
}

fn parse_var(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, _)) if name.is_empty() => Err(format!("missing variable name in '{arg}'")),
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(format!("expected NAME=VALUE, got '{arg}'")),
    }
}

/// Check if debug mode is enabled via environment variable.
fn is_debug_mode() -> bool {
    std::env::var("SNIPTERM_DEBUG").is_ok()
}

/// Initialize the logging system. Logs go to stderr; stdout carries snippet output.
fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if is_debug_mode() {
        "snipterm=trace,keymap=trace,snippet=trace,settings=trace,info"
    } else {
        default_filter
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "SnipTerm v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
        info!("Set RUST_LOG for custom log levels, e.g. RUST_LOG=keymap=debug");
    }
}

/// Honor `SNIPTERM_CONFIG_DIR` before anything asks for the config location.
fn init_paths() {
    if let Some(dir) = std::env::var_os("SNIPTERM_CONFIG_DIR") {
        let dir = snipterm_paths::expand_tilde(Path::new(&dir));
        debug!("Config directory overridden: {:?}", dir);
        snipterm_paths::set_config_dir(dir);
    }
}

fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => std::path::absolute(snipterm_paths::expand_tilde(path))
            .with_context(|| format!("Invalid config path: {:?}", path)),
        None => settings::config_path().context("Could not determine config file location"),
    }
}

fn read_existing_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!(
            "No config file at {:?} (run `snipterm init` to create one)",
            path
        );
    }
    settings::read_config(path)
}

/// Escape control characters so a template echoes on a single line.
fn escape_controls(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() {
                c.escape_debug().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Terminal columns `c` takes up once echoed by [`escape_controls`].
fn echoed_width(c: char) -> usize {
    if c.is_control() {
        c.escape_debug().count()
    } else {
        c.width().unwrap_or(0)
    }
}

/// Render a compile error with a caret under the offending character.
fn render_diagnostic(err: &SnippetError) -> String {
    let template = err.template();
    let column: usize = template.chars().take(err.position()).map(echoed_width).sum();
    format!(
        "{}\n    {}\n    {}^",
        escape_controls(&err.to_string()),
        escape_controls(template),
        " ".repeat(column)
    )
}

fn describe_binding_error(err: &BindingError) -> String {
    match err {
        BindingError::Snippet { keys, source } => {
            format!("{keys}: {}", render_diagnostic(source))
        }
        other => other.to_string(),
    }
}

fn run_check(path: &Path, out: &mut impl Write) -> Result<()> {
    let config = read_existing_config(path)?;
    let mut failures = 0;

    for entry in &config.snippets {
        match SnippetBinding::compile(entry) {
            Ok(binding) => writeln!(out, "ok     {}", binding.chord)?,
            Err(e) => {
                failures += 1;
                writeln!(out, "error  {}", describe_binding_error(&e))?;
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} snippets failed to compile",
            failures,
            config.snippets.len()
        );
    }
    debug!("All {} snippets compiled", config.snippets.len());
    Ok(())
}

fn run_list(path: &Path, out: &mut impl Write) -> Result<()> {
    let config = read_existing_config(path)?;
    let table = SnippetTable::from_entries(&config.snippets, LoadPolicy::SkipInvalid)
        .map_err(|e| anyhow!(describe_binding_error(&e)))?;

    for binding in table.iter() {
        let label = binding.description.as_deref().unwrap_or(binding.template.as_str());
        write!(out, "{:<24} {}", binding.chord.to_string(), label)?;
        let variables = binding.snippet.variables();
        if !variables.is_empty() {
            write!(out, "  (uses {})", variables.join(", "))?;
        }
        writeln!(out)?;
    }

    if !table.rejected().is_empty() {
        warn!(
            "{} snippets were skipped, run `snipterm check` for details",
            table.rejected().len()
        );
    }
    Ok(())
}

fn run_expand(
    path: &Path,
    keys: &str,
    pwd: Option<&Path>,
    vars: &[(String, String)],
    out: &mut impl Write,
) -> Result<()> {
    let config = read_existing_config(path)?;
    let table =
        SnippetTable::from_config(&config).map_err(|e| anyhow!(describe_binding_error(&e)))?;
    let chord: KeyChord = keys.parse()?;

    let working_dir = match pwd {
        Some(dir) => snipterm_paths::expand_tilde(dir),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let mut environment = SessionDirectory::new(working_dir).environment();
    environment.extend(vars.iter().cloned());

    let mut input = WriterInput::new(out);
    if !table.dispatch(&chord, &environment, &mut input)? {
        bail!("No snippet bound to {}", chord);
    }
    Ok(())
}

fn run_compile(template: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let compiled = snippet::compile(template).map_err(|e| anyhow!(render_diagnostic(&e)))?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&compiled)?)?;
        return Ok(());
    }

    for step in compiled.steps() {
        match step {
            Step::Literal(c) => writeln!(out, "literal   {:?}", c)?,
            Step::VariableRef(name) => writeln!(out, "variable  {}", name)?,
        }
    }
    writeln!(out, "canonical {}", compiled)?;
    Ok(())
}

fn run_bind(path: &Path, entry: SnippetEntry, out: &mut impl Write) -> Result<()> {
    let binding =
        SnippetBinding::compile(&entry).map_err(|e| anyhow!(describe_binding_error(&e)))?;
    // Store the canonical chord so re-binding it replaces the old entry,
    // unless that spelling would not parse back (keys such as `a-b`).
    let canonical = binding.chord.to_string();
    let keys = match canonical.parse::<KeyChord>() {
        Ok(reparsed) if reparsed == binding.chord => canonical,
        _ => {
            debug!("Keeping '{}' as written, '{}' does not parse back", entry.keys, canonical);
            entry.keys.clone()
        }
    };
    let entry = SnippetEntry { keys, ..entry };
    settings::add_snippet(path, &entry)?;
    writeln!(out, "bound {} in {:?}", entry.keys, path)?;
    Ok(())
}

fn run_init(path: &Path, out: &mut impl Write) -> Result<()> {
    if settings::ensure_config_file_at(path)? {
        writeln!(out, "created {:?}", path)?;
    } else {
        writeln!(out, "config already exists at {:?}", path)?;
    }
    Ok(())
}

fn report_reload(config: &Config) {
    match SnippetTable::from_config(config) {
        Ok(table) => {
            info!("Loaded {} snippets", table.len());
            for rejected in table.rejected() {
                warn!("Skipped {}", describe_binding_error(rejected));
            }
        }
        Err(e) => error!("Config rejected: {}", describe_binding_error(&e)),
    }
}

fn run_watch(path: PathBuf) -> Result<()> {
    report_reload(&settings::load_config_from(&path));
    let _watcher = settings::watch_config_at(path.clone(), |config| report_reload(&config))
        .with_context(|| format!("Failed to watch config: {:?}", path))?;
    info!("Watching {:?} for changes (Ctrl-C to stop)", path);
    loop {
        std::thread::park();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.default_filter());
    init_paths();

    let path = config_file(cli.config.as_deref())?;
    debug!("Using config file {:?}", path);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Check => run_check(&path, &mut out),
        Command::List => run_list(&path, &mut out),
        Command::Expand { keys, pwd, vars } => {
            run_expand(&path, &keys, pwd.as_deref(), &vars, &mut out)
        }
        Command::Compile { template, json } => run_compile(&template, json, &mut out),
        Command::Bind {
            keys,
            snippet,
            description,
        } => {
            let mut entry = SnippetEntry::new(keys, snippet);
            entry.description = description;
            run_bind(&path, entry, &mut out)
        }
        Command::Init => run_init(&path, &mut out),
        Command::Watch => run_watch(path),
    }
}
