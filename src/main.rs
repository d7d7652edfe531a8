//! Classroom Studio — server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config) and init logger
//!   5. Build the LLM provider and prompt library
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Serve HTTP until shutdown

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use classroom_studio::bootstrap::logger;
use classroom_studio::config::{self, Config};
use classroom_studio::error::AppError;
use classroom_studio::llm::providers;
use classroom_studio::prompt::PromptLibrary;
use classroom_studio::server::{self, AppState};
use classroom_studio::tools;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some(), config.log_file.as_deref())?;

    info!(
        studio = %config.studio_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        provider = %config.llm.provider,
        "config loaded"
    );

    let llm = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;

    let prompts = PromptLibrary::new(&config.prompts.dir);
    let missing = prompts.missing();
    if !missing.is_empty() {
        warn!(
            dir = %prompts.dir().display(),
            missing = ?missing,
            "prompt templates not found on disk — using built-in copies"
        );
    }

    let shutdown = CancellationToken::new();

    // Ctrl-C handler — cancels the token so the server drains and exits.
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, missing.len());

    let state = AppState::new(&config, llm, prompts);
    server::run(&config.server.bind, config.server.max_body_bytes, state, shutdown).await?;
    Ok(())
}

fn print_startup_summary(config: &Config, builtin_templates: usize) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let llm_line = format!(
        "provider={} model={} timeout={}s",
        config.llm.provider, config.llm.openai.model, config.llm.openai.timeout_seconds
    );
    let media_line = format!(
        "image={} speech={} voice={}",
        config.llm.openai.image_model, config.llm.openai.speech_model, config.llm.openai.voice
    );
    let tools_line = tools::catalog().iter().map(|t| t.id).collect::<Vec<_>>().join(", ");
    let prompts_line = if builtin_templates == 0 {
        format!("{}", config.prompts.dir.display())
    } else {
        format!("{} ({builtin_templates} built-in)", config.prompts.dir.display())
    };
    let pdf_line = if cfg!(all(unix, feature = "pdf")) { "pdf: enabled" } else { "pdf: not compiled in" };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 🍎 Classroom Studio                                          ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🧾 Studio: {:<49}║", config.studio_name);
    println!("║ 🧠 PID: {:<52}║", std::process::id());
    println!("║ 🌐 HTTP: {:<51}║", config.server.bind);
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🧠 LLM                                                       ║");
    println!("║   {}║", fit(llm_line));
    println!("║   {}║", fit(media_line));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🧰 Tools                                                     ║");
    println!("║   {}║", fit(tools_line));
    println!("║   {}║", fit(format!("prompts: {prompts_line}")));
    println!("║   {}║", fit(pdf_line.to_string()));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

// Hand-rolled flags; the set is small enough not to need an argument parser.
struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    bind: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut bind = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: classroom-studio [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -b, --bind <ADDR>          Listen address, overrides [server] bind");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "-b" | "--bind" => match iter.next() {
                Some(addr) => bind = Some(addr),
                None => {
                    eprintln!("error: -b/--bind requires an address argument");
                    std::process::exit(1);
                }
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    CliArgs { log_level: logger::level_for_verbosity(verbosity), config_path, bind }
}
