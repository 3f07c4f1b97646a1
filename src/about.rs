// Text views for the `about` and `stocks` subcommands.
use crate::config::AppConfig;

const FEATURES: [&str; 3] = [
    "Fetch past daily data from Yahoo Finance",
    "Candlestick patterns with buy/sell signal markers",
    "Adjustable candle count, lookback period and body thresholds",
];

pub fn about_text(config: &AppConfig) -> String {
    let mut text = format!(
        "{} (v{})\n\n\
         Analyzes stock price trends with candlestick charts and buy/sell signals.\n\
         A candle is marked as a buy when its bullish body covers at least the\n\
         bullish threshold of its high-low range, and as a sell when its bearish\n\
         body covers at least the bearish threshold.\n\nFeatures:\n",
        config.app.name, config.version
    );
    for feature in FEATURES {
        text.push_str(&format!("  - {}\n", feature));
    }
    text.push_str("\nDeveloped by Veerakumar Murugesan.\n");
    text
}

pub fn stock_table(config: &AppConfig) -> String {
    let width = config.stocks.iter().map(|s| s.name.len()).max().unwrap_or(0);
    config
        .stocks
        .iter()
        .map(|s| format!("{:<width$}  {}\n", s.name, s.ticker, width = width))
        .collect()
}
