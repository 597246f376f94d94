use clap::Parser;
use tokio::io::BufReader;
use unleash_provider::utils::error::{ErrorSeverity, ProviderError};
use unleash_provider::utils::logger;
use unleash_provider::{CliConfig, Provider, ProviderEngine, Request};

fn exit_code(e: &ProviderError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: ProviderError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e).max(1));
}

async fn run(cli: CliConfig) -> Result<(), ProviderError> {
    let file = cli.load_file()?;
    let mut provider =
        Provider::new(env!("CARGO_PKG_VERSION")).with_timeout(cli.timeout(&file));

    if cli.schema {
        println!("{}", serde_json::to_string_pretty(&provider.schema())?);
        return Ok(());
    }

    // 有 CLI/環境變數/設定檔時先行設定，否則等待 configure 請求
    if let Some(config) = cli.provider_config(&file)? {
        tracing::debug!("Provider config: {:?}", config);
        provider.configure_with(&config)?;
    }

    let mut engine = ProviderEngine::new(provider);

    if let Some(path) = &cli.request {
        let raw = tokio::fs::read_to_string(path).await?;
        let request: Request = serde_json::from_str(&raw)?;
        let response = engine.handle(request).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        if response.has_errors() {
            std::process::exit(1);
        }
        return Ok(());
    }

    tracing::info!("🚀 Serving provider requests on stdin");
    let handled = engine
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    tracing::info!("✅ Handled {} requests", handled);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 設定檔的日誌設定只在旗標未指定時生效
    let file_logging = cli.load_file().unwrap_or_default();
    let verbose = cli.verbose || file_logging.debug_logging();
    if cli.json_logs || file_logging.json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting terraform-provider-unleash {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        fail(e);
    }
}
