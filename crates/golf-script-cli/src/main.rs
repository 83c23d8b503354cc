//! golf-script CLI - run, check and explore generator scripts

mod repl;
mod settings;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use golf_script::{
    Script, ScriptOptions, ScriptWatcher, Scoping, Val, ValType, Vec2, Vec3, WatchEvent,
    parse_source, tokenize,
};
use settings::Settings;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "golf-script")]
#[command(about = "Run and inspect golf generator scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Let called functions see their caller's locals
    #[arg(long, global = true)]
    dynamic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a script, running its top-level statements
    Run {
        /// Script file
        file: PathBuf,
    },

    /// Lex and parse a script without running it
    Check {
        /// Script file
        file: PathBuf,
    },

    /// Print the token stream of a script
    Tokens {
        /// Script file
        file: PathBuf,
    },

    /// Load a script and call one of its functions
    Call {
        /// Script file
        file: PathBuf,

        /// Function to call
        function: String,

        /// Arguments, parsed according to the declared parameter types.
        /// Vectors are written as comma-separated components, e.g. 1,0,2
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Reload a script every time it is saved
    Watch {
        /// Script file to watch
        file: PathBuf,

        /// Zero-argument function to run after each reload
        #[arg(short, long, default_value = "generate")]
        function: String,
    },

    /// Interactive prompt
    Repl {
        /// Script to load into the session first
        #[arg(short, long)]
        load: Option<PathBuf>,
    },

    /// Show the settings file, optionally writing the defaults to it
    Config {
        /// Write the current settings to disk
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::load_settings();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let scoping = if cli.dynamic {
        Scoping::Dynamic
    } else {
        settings.scoping()
    };

    match cli.command {
        Commands::Run { file } => run_script(&file, scoping)?,
        Commands::Check { file } => check_script(&file)?,
        Commands::Tokens { file } => print_tokens(&file)?,
        Commands::Call {
            file,
            function,
            args,
        } => call_function(&file, &function, &args, scoping)?,
        Commands::Watch { file, function } => run_watch(&file, &function, scoping, &settings)?,
        Commands::Repl { load } => repl::run_repl(load.as_deref(), scoping, &settings)?,
        Commands::Config { init } => show_config(&settings, init)?,
    }

    Ok(())
}

fn read_source(file: &Path) -> Result<String> {
    std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read script file {}", file.display()))
}

fn load(file: &Path, scoping: Scoping) -> Result<Script> {
    let source = read_source(file)?;
    let options = ScriptOptions::default().with_scoping(scoping);
    Ok(Script::load_with_options(file, &source, options)?)
}

fn run_script(file: &Path, scoping: Scoping) -> Result<()> {
    let script = load(file, scoping)?;
    tracing::info!(
        "{} ran {} top-level statements",
        file.display(),
        script.program().len()
    );
    Ok(())
}

fn check_script(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let (_, stmts) = parse_source(&file.display().to_string(), &source)?;
    println!("{}: ok ({} statements)", file.display(), stmts.len());
    Ok(())
}

fn print_tokens(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let tokens = tokenize(&source).map_err(|e| anyhow!("{}:{}", file.display(), e))?;
    for token in &tokens {
        println!("{:>8}  {}", token.pos.to_string(), token.describe());
    }
    Ok(())
}

/// Parse a command-line argument as a value of type `ty`
fn parse_arg(ty: ValType, text: &str) -> Result<Val> {
    let floats = |n: usize| -> Result<Vec<f32>> {
        let parts = text
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid {} '{}'", ty, text))?;
        if parts.len() != n {
            bail!("Expected {} components for {}, got {}", n, ty, parts.len());
        }
        Ok(parts)
    };

    Ok(match ty {
        ValType::Int => Val::Int(
            text.parse()
                .with_context(|| format!("Invalid int '{}'", text))?,
        ),
        ValType::Float => Val::Float(
            text.parse()
                .with_context(|| format!("Invalid float '{}'", text))?,
        ),
        ValType::Bool => Val::Bool(
            text.parse()
                .with_context(|| format!("Invalid bool '{}'", text))?,
        ),
        ValType::String => Val::string(text),
        ValType::Vec2 => {
            let v = floats(2)?;
            Val::Vec2(Vec2::new(v[0], v[1]))
        }
        ValType::Vec3 => {
            let v = floats(3)?;
            Val::Vec3(Vec3::new(v[0], v[1], v[2]))
        }
        other => bail!("Parameters of type {} cannot be passed from the command line", other),
    })
}

fn call_function(file: &Path, function: &str, args: &[String], scoping: Scoping) -> Result<()> {
    let mut script = load(file, scoping)?;
    let Some(sig) = script.fn_signature(function) else {
        bail!("{} does not declare a function named '{}'", file.display(), function);
    };
    if sig.params.len() != args.len() {
        bail!(
            "'{}' takes {} arguments, got {}",
            function,
            sig.params.len(),
            args.len()
        );
    }

    let vals = sig
        .params
        .iter()
        .zip(args)
        .map(|((name, ty), text)| {
            parse_arg(*ty, text).with_context(|| format!("Argument '{}'", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let result = script.eval_fn(function, &vals)?;
    if result != Val::Void {
        println!("{}", script.display(&result));
    }
    Ok(())
}

fn run_watch(file: &Path, function: &str, scoping: Scoping, settings: &Settings) -> Result<()> {
    if !file.exists() {
        bail!("Script file not found: {}", file.display());
    }

    let mut watcher = ScriptWatcher::new(Some(settings.watch_debounce_ms))?;
    watcher.watch(file)?;

    for path in watcher.watched() {
        println!("Watching {}", path.display());
    }
    println!("Press Ctrl+C to stop\n");

    reload_and_report(file, function, scoping);
    while let Some(event) = watcher.recv() {
        match event {
            WatchEvent::Modified(_) => {
                // Editors often emit several events per save
                let _ = watcher.drain_events();
                reload_and_report(file, function, scoping);
            }
            WatchEvent::Error(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

fn reload_and_report(file: &Path, function: &str, scoping: Scoping) {
    let mut script = match load(file, scoping) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return;
        }
    };
    match script.fn_signature(function) {
        Some(sig) if sig.params.is_empty() => match script.eval_fn(function, &[]) {
            Ok(Val::Void) => println!("{}() done", function),
            Ok(val) => println!("{}() => {}", function, script.display(&val)),
            Err(e) => eprintln!("Error in {}(): {}", function, e),
        },
        Some(sig) => println!(
            "Reloaded; {}() takes {} arguments, not calling it",
            function,
            sig.params.len()
        ),
        None => println!("Reloaded {}", file.display()),
    }
}

fn show_config(settings: &Settings, init: bool) -> Result<()> {
    if init {
        let path = settings::save_settings(settings)?;
        println!("Wrote {}", path.display());
    } else if let Some(path) = settings::settings_path() {
        println!("# {}", path.display());
    }
    println!(
        "{}",
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?
    );
    Ok(())
}
