use anyhow::Context;
use clap::Parser;
use stats_etl::core::page_fetcher::StatsClient;
use stats_etl::core::ConfigProvider;
use stats_etl::utils::error::ErrorSeverity;
use stats_etl::utils::{logger, validation::Validate};
use stats_etl::{EtlEngine, LocalStorage, StatsPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-stats")]
#[command(about = "Collect season stats using a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "stats-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override worker count from config (0 collects sequentially)
    #[arg(long)]
    workers: Option<usize>,

    /// Show the request plan without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.collect.verbose;
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::info!("🚀 Starting TOML-based stats collection");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(workers) = args.workers {
        config.collect.workers = Some(workers);
        tracing::info!("🔧 Workers overridden to: {}", workers);
    }
    config.collect.verbose = verbose;

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be sent");
        print_plan(&config).context("failed to build the request plan")?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = StatsPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Stats collection completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Stats collection failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_plan(config: &TomlConfig) -> stats_etl::Result<()> {
    let mode = match config.workers().filter(|n| *n > 0) {
        Some(n) => format!("{} workers", n),
        None => "sequential".to_string(),
    };

    println!("📋 Endpoint: {}", config.api_endpoint());
    println!("📋 Mode: {}, sleep between pages: {}s", mode, config.sleep_seconds());
    for year in config.years() {
        let query = StatsClient::query_for(*year, 0)?
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        println!("   {} -> GET {}?{}", year, config.api_endpoint(), query);
    }
    println!(
        "📋 Output: {}/{}.{{{}}}",
        config.output_path(),
        config.file_stem(),
        config.output_formats().join(",")
    );
    Ok(())
}
