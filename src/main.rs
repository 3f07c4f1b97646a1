// candle-signals: command-line front end for the signal engine.
mod about;
mod cli;
mod config;

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{ChartArgs, Cli, Command};
use config::{AppConfig, ThemePalette};
use engine::chart::ChartComposer;
use engine::config::EngineSettings;
use engine::data::{BarSource, CsvFileSource, YahooChartSource};
use engine::services::{ChartRequest, SignalPipeline, SignalSummary};
use shared::models::{Percentage, Polarity, Thresholds};
use shared::utils::{format_price, format_session_date};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `--json` output stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "candle_signals=info,engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let app_config = match &cli.config {
        Some(path) => AppConfig::load_from(path).with_context(|| format!("Loading config {}", path.display()))?,
        None => AppConfig::load_default().context("Loading built-in config")?,
    };
    tracing::debug!(version = %app_config.version, stocks = app_config.stocks.len(), "Config loaded");

    match cli.command {
        Command::Stocks => print!("{}", about::stock_table(&app_config)),
        Command::About => print!("{}", about::about_text(&app_config)),
        Command::Chart(args) => run_chart(args, &app_config).await?,
    }
    Ok(())
}

fn resolve_symbol(args: &ChartArgs, app_config: &AppConfig) -> anyhow::Result<String> {
    if let Some(query) = &args.stock {
        let stock = app_config
            .find_stock(query)
            .ok_or_else(|| anyhow!("Unknown stock '{}'. Run `candle-signals stocks` for the list.", query))?;
        return Ok(stock.ticker.clone());
    }
    match args.ticker.as_deref().map(str::trim) {
        Some(ticker) if !ticker.is_empty() => Ok(ticker.to_string()),
        _ => Err(anyhow!("Either --stock or --ticker is required")),
    }
}

async fn run_chart(args: ChartArgs, app_config: &AppConfig) -> anyhow::Result<()> {
    let settings = EngineSettings::from_env()?;
    let symbol = resolve_symbol(&args, app_config)?;

    let defaults = app_config.defaults;
    let candles = args.candles.unwrap_or(defaults.candles);
    let days = args.days.unwrap_or(defaults.days);
    let thresholds = Thresholds::new(
        Percentage::new(f64::from(args.bullish.unwrap_or(defaults.bullish)))?,
        Percentage::new(f64::from(args.bearish.unwrap_or(defaults.bearish)))?,
    );

    let source: Arc<dyn BarSource> = match &args.csv {
        Some(path) => Arc::new(CsvFileSource::new(path)),
        None => Arc::new(YahooChartSource::new(&settings)?),
    };
    let theme = args.theme.unwrap_or(app_config.app.theme);
    let style = ThemePalette::for_theme(theme).chart_style(&app_config.chart);
    let pipeline = SignalPipeline::new(source, ChartComposer::new(style), settings.malformed_bars);

    let request = ChartRequest::new(symbol, candles as usize, days, thresholds).with_y_label(app_config.y_label());
    let outcome = pipeline
        .generate_chart(&request)
        .await
        .with_context(|| format!("Could not build chart for {}", request.symbol))?;

    let output = args.output.unwrap_or_else(|| PathBuf::from(&app_config.app.output));
    outcome.chart.write_to(&output)?;

    let summary = outcome.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary_text(&summary, &output));
    }
    Ok(())
}

fn summary_text(summary: &SignalSummary, output: &std::path::Path) -> String {
    let mut text = format!(
        "{} | {} | {} candles | {} buy, {} sell\n",
        summary.symbol, summary.strategy, summary.candles, summary.buy_count, summary.sell_count
    );
    if summary.skipped_bars > 0 {
        text.push_str(&format!("skipped {} malformed bars\n", summary.skipped_bars));
    }
    for row in &summary.signals {
        let label = match row.polarity {
            Polarity::Buy => "BUY ",
            Polarity::Sell => "SELL",
        };
        text.push_str(&format!(
            "  {}  {}  {:>12}  body {:.1}%\n",
            format_session_date(&row.date),
            label,
            format_price(row.price),
            row.body_pct
        ));
    }
    text.push_str(&format!("chart written to {}\n", output.display()));
    text
}
