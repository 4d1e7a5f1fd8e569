use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickerlens_core::config::Settings;
use tickerlens_core::provider::YahooProvider;
use tickerlens_core::AnalysisError;

mod render;

#[derive(Debug, Parser)]
#[command(name = "tickerlens", about = "Analyst-based single stock analyzer")]
struct Args {
    /// Stock symbol. Indian stocks use the NSE symbol with .NS (TCS.NS, INFY.NS); US stocks use the ticker (AAPL, MSFT).
    symbol: String,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Days of daily price history to fetch. Overrides HISTORY_DAYS.
    #[arg(long)]
    history_days: Option<i64>,

    /// Number of headlines to show. Overrides NEWS_LIMIT.
    #[arg(long)]
    news_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let settings = apply_overrides(Settings::load_from_env(), &args)?;
    let sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooProvider::from_settings(&settings)?;
    let options = settings.report_options();

    let result =
        tickerlens_core::report::analyze(&provider, &args.symbol, chrono::Utc::now(), &options)
            .await;

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{}", err.user_message());
            if matches!(err, AnalysisError::ProviderUnavailable { .. }) {
                let err = anyhow::Error::new(err);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(symbol = %args.symbol, error = %format!("{err:#}"), "analysis failed");
            } else {
                tracing::warn!(symbol = %args.symbol, error = %err, "analysis rejected");
            }
            // Flush pending Sentry events before exiting.
            drop(sentry_guard);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_text(&report, &options.currency_symbol));
    }

    Ok(())
}

/// Flags win over the environment; validation sees the merged values.
fn apply_overrides(mut settings: Settings, args: &Args) -> anyhow::Result<Settings> {
    if let Some(days) = args.history_days {
        settings.history_days = days;
    }
    if let Some(limit) = args.news_limit {
        settings.news_limit = limit;
    }
    settings.validate()?;
    Ok(settings)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
