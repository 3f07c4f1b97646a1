// Candlestick chart renderer.
// Layout, top to bottom: title, price panel (candles, grid, markers), volume
// panel, date axis. Markers are written after the candles so they paint on top.
use std::fmt::Write;

use shared::models::{Bar, MarkerSet, Polarity};
use shared::utils::{format_price, format_session_date, format_volume};

use super::scale::LinearScale;
use super::{ChartImage, ChartStyle};
use crate::error::EngineError;
use crate::signals::SignalWindow;

const MARGIN_LEFT: f64 = 96.0;
const MARGIN_RIGHT: f64 = 28.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 44.0;
const PANEL_GAP: f64 = 12.0;
const BODY_WIDTH_RATIO: f64 = 0.6;
const PRICE_PADDING: f64 = 0.05;
const PRICE_TICKS: usize = 6;
const MAX_DATE_LABELS: usize = 10;
const MIN_WIDTH: u32 = 240;
const MIN_HEIGHT: u32 = 180;

pub struct ChartComposer {
    style: ChartStyle,
}

struct Layout {
    plot_left: f64,
    plot_width: f64,
    price_top: f64,
    price_height: f64,
    volume_top: f64,
    volume_height: f64,
}

impl Layout {
    fn plot_right(&self) -> f64 {
        self.plot_left + self.plot_width
    }
}

impl ChartComposer {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Renders the window as candles with a volume panel and overlays one
    /// glyph per marker whose timestamp is in the window. Sessions without a
    /// marker get no glyph.
    pub fn render(
        &self,
        window: &SignalWindow<'_>,
        markers: &MarkerSet,
        title: &str,
        y_label: &str,
    ) -> Result<ChartImage, EngineError> {
        self.validate_style()?;

        let mut svg = String::with_capacity(4096 + window.len() * 512);
        self.write_document(&mut svg, window.bars(), markers, title, y_label)
            .map_err(|e| EngineError::RenderError(format!("Failed to compose SVG: {}", e)))?;

        tracing::debug!(
            symbol = %window.symbol(),
            candles = window.len(),
            markers = markers.len(),
            bytes = svg.len(),
            "Chart composed"
        );
        Ok(ChartImage::new(svg, self.style.width, self.style.height))
    }

    fn validate_style(&self) -> Result<(), EngineError> {
        let s = &self.style;
        if s.width < MIN_WIDTH || s.height < MIN_HEIGHT {
            return Err(EngineError::RenderError(format!(
                "Chart must be at least {}x{} px, got {}x{}",
                MIN_WIDTH, MIN_HEIGHT, s.width, s.height
            )));
        }
        if !(0.0..=0.5).contains(&s.volume_ratio) {
            return Err(EngineError::RenderError(format!(
                "Volume panel ratio must be within [0, 0.5], got {}",
                s.volume_ratio
            )));
        }
        if !s.marker_size.is_finite() || s.marker_size <= 0.0 {
            return Err(EngineError::RenderError(format!(
                "Marker size must be positive, got {}",
                s.marker_size
            )));
        }
        Ok(())
    }

    fn layout(&self) -> Layout {
        let width = f64::from(self.style.width);
        let height = f64::from(self.style.height);
        let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;
        let volume_height = plot_height * self.style.volume_ratio;
        let gap = if volume_height > 0.0 { PANEL_GAP } else { 0.0 };
        let price_height = plot_height - volume_height - gap;
        Layout {
            plot_left: MARGIN_LEFT,
            plot_width: width - MARGIN_LEFT - MARGIN_RIGHT,
            price_top: MARGIN_TOP,
            price_height,
            volume_top: MARGIN_TOP + price_height + gap,
            volume_height,
        }
    }

    fn write_document(
        &self,
        out: &mut String,
        bars: &[Bar],
        markers: &MarkerSet,
        title: &str,
        y_label: &str,
    ) -> std::fmt::Result {
        let s = &self.style;
        let width = f64::from(s.width);
        let height = f64::from(s.height);
        let layout = self.layout();

        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = s.width,
            h = s.height
        )?;
        writeln!(out, r#"<rect class="background" x="0" y="0" width="{}" height="{}" fill="{}"/>"#, s.width, s.height, escape(&s.background))?;
        writeln!(
            out,
            r#"<text class="title" x="{:.2}" y="30" text-anchor="middle" font-size="18" fill="{}">{}</text>"#,
            width / 2.0,
            escape(&s.foreground),
            escape(title)
        )?;
        writeln!(
            out,
            r#"<text class="y-label" transform="translate(18,{:.2}) rotate(-90)" text-anchor="middle" font-size="13" fill="{}">{}</text>"#,
            layout.price_top + layout.price_height / 2.0,
            escape(&s.foreground),
            escape(y_label)
        )?;

        // Non-finite bars cannot be placed on an axis.
        let drawable: Vec<(usize, &Bar)> = bars
            .iter()
            .enumerate()
            .filter(|(_, b)| [b.open, b.high, b.low, b.close].iter().all(|v| v.is_finite()))
            .collect();

        if drawable.is_empty() {
            writeln!(
                out,
                r#"<text class="no-data" x="{:.2}" y="{:.2}" text-anchor="middle" font-size="16" fill="{}">No data</text>"#,
                width / 2.0,
                height / 2.0,
                escape(&s.foreground)
            )?;
            return writeln!(out, "</svg>");
        }

        let low = drawable.iter().map(|(_, b)| b.low.min(b.high)).fold(f64::INFINITY, f64::min);
        let high = drawable.iter().map(|(_, b)| b.high.max(b.low)).fold(f64::NEG_INFINITY, f64::max);
        let price = LinearScale::padded(low, high, PRICE_PADDING, layout.price_top, layout.price_height);

        let max_volume = drawable
            .iter()
            .map(|(_, b)| b.volume)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        let volume = LinearScale::from_zero(max_volume, layout.volume_top, layout.volume_height);

        let slot = layout.plot_width / bars.len() as f64;
        let body_width = (slot * BODY_WIDTH_RATIO).max(1.0);
        let center = |i: usize| layout.plot_left + slot * (i as f64 + 0.5);

        self.write_price_grid(out, &layout, &price)?;
        if layout.volume_height > 0.0 {
            self.write_volume_frame(out, &layout, max_volume)?;
        }

        writeln!(out, r#"<g class="candles">"#)?;
        for &(i, bar) in &drawable {
            let cx = center(i);
            let (class, color) = if bar.close >= bar.open {
                ("bullish", &s.bullish_color)
            } else {
                ("bearish", &s.bearish_color)
            };
            let color = escape(color);

            writeln!(
                out,
                r#"<line class="wick {}" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
                class,
                cx,
                price.to_y(bar.high),
                cx,
                price.to_y(bar.low),
                color
            )?;

            let body_top = price.to_y(bar.open.max(bar.close));
            let body_bottom = price.to_y(bar.open.min(bar.close));
            writeln!(
                out,
                r#"<rect class="candle-body {}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{}"><title>{} O {} H {} L {} C {}</title></rect>"#,
                class,
                cx - body_width / 2.0,
                body_top,
                body_width,
                (body_bottom - body_top).max(1.0),
                color,
                color,
                bar.timestamp.format("%Y-%m-%d"),
                format_price(bar.open),
                format_price(bar.high),
                format_price(bar.low),
                format_price(bar.close)
            )?;

            if layout.volume_height > 0.0 && bar.volume.is_finite() && bar.volume > 0.0 {
                let top = volume.to_y(bar.volume);
                writeln!(
                    out,
                    r#"<rect class="volume-bar {}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="0.6"/>"#,
                    class,
                    cx - body_width / 2.0,
                    top,
                    body_width,
                    (layout.volume_top + layout.volume_height - top).max(0.0),
                    color
                )?;
            }
        }
        writeln!(out, "</g>")?;

        self.write_date_axis(out, bars, &center, height)?;

        writeln!(out, r#"<g class="markers">"#)?;
        for &(i, bar) in &drawable {
            if let Some(marker) = markers.get(&bar.timestamp) {
                if marker.price.is_finite() {
                    self.write_marker(out, marker.polarity, center(i), price.to_y(marker.price), &marker.timestamp.format("%Y-%m-%d").to_string(), marker.price)?;
                }
            }
        }
        writeln!(out, "</g>")?;

        self.write_legend(out, &layout)?;
        writeln!(out, "</svg>")
    }

    fn write_price_grid(&self, out: &mut String, layout: &Layout, price: &LinearScale) -> std::fmt::Result {
        let s = &self.style;
        writeln!(out, r#"<g class="price-grid">"#)?;
        for tick in price.ticks(PRICE_TICKS) {
            let y = price.to_y(tick);
            writeln!(
                out,
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-dasharray="3,3"/>"#,
                layout.plot_left,
                y,
                layout.plot_right(),
                y,
                escape(&s.grid)
            )?;
            writeln!(
                out,
                r#"<text class="price-label" x="{:.2}" y="{:.2}" text-anchor="end" font-size="11" fill="{}">{}</text>"#,
                layout.plot_left - 8.0,
                y + 4.0,
                escape(&s.foreground),
                format_price(tick)
            )?;
        }
        writeln!(
            out,
            r#"<rect class="price-frame" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}"/>"#,
            layout.plot_left,
            layout.price_top,
            layout.plot_width,
            layout.price_height,
            escape(&s.foreground)
        )?;
        writeln!(out, "</g>")
    }

    fn write_volume_frame(&self, out: &mut String, layout: &Layout, max_volume: f64) -> std::fmt::Result {
        let s = &self.style;
        writeln!(
            out,
            r#"<rect class="volume-frame" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}"/>"#,
            layout.plot_left,
            layout.volume_top,
            layout.plot_width,
            layout.volume_height,
            escape(&s.foreground)
        )?;
        writeln!(
            out,
            r#"<text class="volume-label" x="{:.2}" y="{:.2}" text-anchor="end" font-size="11" fill="{}">Volume {}</text>"#,
            layout.plot_left - 8.0,
            layout.volume_top + 11.0,
            escape(&s.foreground),
            format_volume(max_volume)
        )
    }

    fn write_date_axis(
        &self,
        out: &mut String,
        bars: &[Bar],
        center: &dyn Fn(usize) -> f64,
        height: f64,
    ) -> std::fmt::Result {
        let step = bars.len().div_ceil(MAX_DATE_LABELS).max(1);
        let y = height - MARGIN_BOTTOM + 18.0;
        writeln!(out, r#"<g class="date-axis">"#)?;
        for (i, bar) in bars.iter().enumerate().step_by(step) {
            writeln!(
                out,
                r#"<text class="date-label" x="{:.2}" y="{:.2}" text-anchor="middle" font-size="11" fill="{}">{}</text>"#,
                center(i),
                y,
                escape(&self.style.foreground),
                format_session_date(&bar.timestamp)
            )?;
        }
        writeln!(out, "</g>")
    }

    fn write_marker(&self, out: &mut String, polarity: Polarity, cx: f64, cy: f64, date: &str, price: f64) -> std::fmt::Result {
        let size = self.style.marker_size;
        let half = size / 2.0;
        let (class, color, points, label) = match polarity {
            Polarity::Buy => (
                "buy",
                &self.style.buy_marker_color,
                format!("{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}", cx, cy - size * 0.6, cx - half, cy + size * 0.4, cx + half, cy + size * 0.4),
                "Buy",
            ),
            Polarity::Sell => (
                "sell",
                &self.style.sell_marker_color,
                format!("{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}", cx, cy + size * 0.6, cx - half, cy - size * 0.4, cx + half, cy - size * 0.4),
                "Sell",
            ),
        };
        writeln!(
            out,
            r#"<polygon class="marker {}" points="{}" fill="{}" stroke="{}" stroke-width="0.5"><title>{} {} on {}</title></polygon>"#,
            class,
            points,
            escape(color),
            escape(&self.style.foreground),
            label,
            format_price(price),
            date
        )
    }

    fn write_legend(&self, out: &mut String, layout: &Layout) -> std::fmt::Result {
        let s = &self.style;
        let x = layout.plot_right() - 110.0;
        let y = layout.price_top + 16.0;
        writeln!(out, r#"<g class="legend">"#)?;
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="104" height="42" fill="{}" fill-opacity="0.85" stroke="{}"/>"#,
            x - 6.0,
            y - 12.0,
            escape(&s.background),
            escape(&s.grid)
        )?;
        let entries = [
            ("buy", &s.buy_marker_color, "Buy Signal", format!("{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}", x + 5.0, y - 6.0, x, y + 3.0, x + 10.0, y + 3.0)),
            ("sell", &s.sell_marker_color, "Sell Signal", format!("{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}", x + 5.0, y + 27.0, x, y + 18.0, x + 10.0, y + 18.0)),
        ];
        for (row, (class, color, label, points)) in entries.iter().enumerate() {
            writeln!(out, r#"<polygon class="legend-glyph {}" points="{}" fill="{}"/>"#, class, points, escape(color))?;
            writeln!(
                out,
                r#"<text x="{:.2}" y="{:.2}" font-size="11" fill="{}">{}</text>"#,
                x + 16.0,
                y + 3.0 + 20.0 * row as f64,
                escape(&s.foreground),
                label
            )?;
        }
        writeln!(out, "</g>")
    }
}

impl Default for ChartComposer {
    fn default() -> Self {
        Self::new(ChartStyle::default())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
