//! DigiManifest CLI
//!
//! Usage:
//!   digimanifest --serve                               # HTTP API server
//!   digimanifest --code-of-day                         # Today's code
//!   digimanifest --list-codes                          # Code catalog
//!   digimanifest --generate --user alice --count 3     # One-shot generation
//!   digimanifest --generate --user alice --json        # JSON output

use std::sync::Arc;
use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digimanifest::core::{
    run_server, InMemoryRepository, JsonFileRepository, ManifestationOrchestrator, QuotaPolicy,
    Repository,
};
use digimanifest::types::{GenerationError, ManifestationEvent, UserTier};
use digimanifest::{FREE_DAILY_LIMIT, FREE_MAX_AMOUNT, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "digimanifest",
    version = VERSION,
    about = "DigiManifest - Manifestation generation and quota engine",
    long_about = "Generates synthetic incoming-funds notifications from per-user settings,\n\
                  enforcing the Free tier's daily limit and amount ceiling.\n\n\
                  Modes:\n  \
                  --serve        HTTP API server\n  \
                  --generate     One-shot generation for --user\n  \
                  --code-of-day  Print today's code\n  \
                  --list-codes   Print the code catalog"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, env = "DIGIMANIFEST_ADDR", default_value = "127.0.0.1:8001")]
    addr: String,

    /// Directory for JSON user documents (in-memory when absent)
    #[arg(long, env = "DIGIMANIFEST_DATA_DIR")]
    data_dir: Option<String>,

    /// Free tier generations per UTC day
    #[arg(long, default_value_t = FREE_DAILY_LIMIT)]
    free_daily_limit: u32,

    /// Free tier ceiling on max_amount
    #[arg(long, default_value_t = FREE_MAX_AMOUNT)]
    free_max_amount: f64,

    /// Fixed RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print today's code and exit
    #[arg(long)]
    code_of_day: bool,

    /// Print the code catalog and exit
    #[arg(long)]
    list_codes: bool,

    /// Generate manifestations for --user
    #[arg(short, long)]
    generate: bool,

    /// User id for --generate
    #[arg(short, long)]
    user: Option<String>,

    /// Treat the user as Pro
    #[arg(long)]
    pro: bool,

    /// Number of generations
    #[arg(short, long, default_value_t = 1)]
    count: u32,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("digimanifest={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let orchestrator = build_orchestrator(&args).await?;

    if args.serve {
        run_serve(&args, orchestrator).await
    } else if args.code_of_day {
        print_code_of_day(&orchestrator, args.json)
    } else if args.list_codes {
        print_codes(&orchestrator, args.json)
    } else if args.generate {
        run_generate(&args, &orchestrator).await
    } else {
        bail!("no mode given; use --serve, --generate, --code-of-day or --list-codes (see --help)")
    }
}

/// Repository, policy and RNG from the command line
async fn build_orchestrator(args: &Args) -> anyhow::Result<ManifestationOrchestrator> {
    let repository: Arc<dyn Repository> = match &args.data_dir {
        Some(dir) => {
            let repo = JsonFileRepository::open(dir)
                .with_context(|| format!("cannot open data directory {}", dir))?;
            info!(data_dir = %dir, "using JSON file repository");
            Arc::new(repo)
        }
        None => {
            info!("using in-memory repository");
            Arc::new(InMemoryRepository::new())
        }
    };

    let policy = QuotaPolicy {
        free_daily_limit: args.free_daily_limit,
        free_max_amount: args.free_max_amount,
    };
    if !(policy.free_max_amount.is_finite() && policy.free_max_amount > 0.0) {
        bail!("--free-max-amount must be a positive number");
    }

    let orchestrator = ManifestationOrchestrator::start(repository, policy)
        .await
        .context("engine startup failed")?;

    Ok(match args.seed {
        Some(seed) => orchestrator.with_seed(seed),
        None => orchestrator,
    })
}

/// Run HTTP API server
async fn run_serve(args: &Args, orchestrator: ManifestationOrchestrator) -> anyhow::Result<()> {
    info!("======================================");
    info!("  DigiManifest API v{}", VERSION);
    info!("======================================");
    info!("Listen: {}", args.addr);
    info!("Free tier: {} per day, max amount {:.2}", args.free_daily_limit, args.free_max_amount);
    info!("Codes: {}", orchestrator.catalog().len());

    run_server(&args.addr, orchestrator)
        .await
        .with_context(|| format!("server on {} failed", args.addr))
}

fn print_code_of_day(orchestrator: &ManifestationOrchestrator, json: bool) -> anyhow::Result<()> {
    let today = orchestrator.today();
    let code = orchestrator.code_of_day_on(today);

    if json {
        let out = serde_json::json!({
            "date": today.format("%Y-%m-%d").to_string(),
            "code": code,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} {}  {}",
            today.format("%Y-%m-%d").to_string().dimmed(),
            code.code.bold().cyan(),
            code.label
        );
    }
    Ok(())
}

fn print_codes(orchestrator: &ManifestationOrchestrator, json: bool) -> anyhow::Result<()> {
    let codes = orchestrator.catalog().codes();
    if json {
        println!("{}", serde_json::to_string_pretty(codes)?);
    } else {
        for code in codes {
            println!("{:>14}  {}", code.code.cyan(), code.label);
        }
    }
    Ok(())
}

/// One-shot generation; stops at the first refusal
async fn run_generate(args: &Args, orchestrator: &ManifestationOrchestrator) -> anyhow::Result<()> {
    let Some(user) = args.user.as_deref() else {
        bail!("--generate needs --user <id>");
    };
    let tier = UserTier::from_is_pro(args.pro);

    for _ in 0..args.count {
        match orchestrator.generate(user, tier).await {
            Ok(event) => print_event(&event, args.json)?,
            Err(GenerationError::QuotaExceeded(e)) => {
                if args.json {
                    let out = serde_json::json!({ "error": "quota_exceeded", "message": e.to_string() });
                    println!("{}", serde_json::to_string(&out)?);
                } else {
                    println!("{} {}", "⛔".yellow(), e.to_string().yellow());
                }
                break;
            }
            Err(e) => return Err(e).context("generation failed"),
        }
    }

    let quota = orchestrator.quota_status(user, tier).await?;
    if !args.json {
        let limit = quota
            .daily_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "∞".to_string());
        println!(
            "{} {} {}/{} today",
            tier.emoji(),
            tier.to_string().bold(),
            quota.used_today,
            limit
        );
    }
    Ok(())
}

fn print_event(event: &ManifestationEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    println!(
        "{} {} from {} via {}",
        event.category.label(),
        format!("${:.2}", event.amount).green().bold(),
        event.sender,
        event.bank.dimmed()
    );
    if let Some(code) = &event.code {
        println!("   {} {}", code.code.cyan(), code.label.dimmed());
    }
    Ok(())
}
