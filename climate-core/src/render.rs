//! HTML for the three display regions.
//!
//! Markup is assembled from [`Markup`] and [`Table`] values; every piece of
//! payload text goes through [`escape`] on the way in.

use std::fmt::Write as _;

use crate::{
    display::SlotSnapshot,
    error::RenderError,
    model::{ClimateForecast, Envelope, FireRecord, SlickRecord},
};

pub const FETCHING_CLIMATE: &str = "Fetching climate data...";
pub const FETCHING_FIRE: &str = "Fetching fire data...";
pub const FETCHING_SLICK: &str = "Fetching oil slick data...";

pub const ERROR_CLIMATE: &str = "Error fetching climate data.";
pub const ERROR_FIRE: &str = "Error fetching fire data.";
pub const ERROR_SLICK: &str = "Error fetching oil slick data.";

const NO_MESSAGE: &str = "No message";
const TABLE_CLASS: &str = "table table-bordered table-striped";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Number to text the way a browser's `String(x)` does it: shortest
/// round-trip digits, switching to exponent form below `1e-6` and from `1e21`.
pub fn js_number(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return (if x > 0.0 { "Infinity" } else { "-Infinity" }).to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }

    // `{:e}` gives the shortest round-trip digits as `d.ddde<exp>`.
    let sci = format!("{:e}", x.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{x}");
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return format!("{x}");
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Decimal point position relative to the start of `digits`.
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if exp < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{first}e{sign}{}", exp.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exp.abs())
        }
    };

    if x < 0.0 { format!("-{body}") } else { body }
}

/// Fixed-point formatting with browser `toFixed` rounding: exact ties go
/// away from zero instead of to even.
pub fn to_fixed(x: f64, digits: usize) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return js_number(x);
    }

    let factor = 10f64.powi(digits as i32);
    let scaled = x * factor;
    // Only a product computed without rounding can sit exactly on a tie.
    let exact = x.mul_add(factor, -scaled) == 0.0;
    if exact && scaled.fract().abs() == 0.5 {
        format!("{:.*}", digits, scaled.round() / factor)
    } else {
        format!("{:.*}", digits, x)
    }
}

/// Fixed-column table; header and cell text are escaped when written.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn write_into(&self, out: &mut String) {
        let _ = write!(out, "<table class=\"{TABLE_CLASS}\">\n<thead>\n<tr>");
        for header in &self.headers {
            let _ = write!(out, "<th>{}</th>", escape(header));
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in row {
                let _ = write!(out, "<td>{}</td>", escape(cell));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>");
    }
}

/// Display-region markup under construction.
#[derive(Debug, Default)]
pub struct Markup {
    html: String,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<strong>text</strong>` on its own line.
    pub fn heading(mut self, text: &str) -> Self {
        let _ = writeln!(self.html, "<strong>{}</strong><br>", escape(text));
        self
    }

    /// `<strong>label</strong> value` on its own line.
    pub fn field(mut self, label: &str, value: &str) -> Self {
        let _ = writeln!(
            self.html,
            "<strong>{}</strong> {}<br>",
            escape(label),
            escape(value)
        );
        self
    }

    pub fn blank_line(mut self) -> Self {
        self.html.push_str("<br>\n");
        self
    }

    pub fn table(mut self, caption: &str, table: &Table) -> Self {
        let _ = writeln!(self.html, "<strong>{}</strong>", escape(caption));
        table.write_into(&mut self.html);
        self
    }

    pub fn finish(self) -> String {
        self.html
    }
}

/// A cell past the end of its series prints `undefined`; a JSON `null` prints `null`.
fn series_cell(series: &[Option<f64>], index: usize) -> String {
    match series.get(index) {
        None => "undefined".to_string(),
        Some(None) => "null".to_string(),
        Some(Some(value)) => js_number(*value),
    }
}

pub fn render_climate(forecast: &ClimateForecast) -> String {
    let units = &forecast.daily_units;
    let daily = &forecast.daily;

    let mut table = Table::new([
        "Date".to_string(),
        format!("Max Temp ({})", units.temperature_2m_max),
        format!("Min Temp ({})", units.temperature_2m_min),
    ]);

    for (i, date) in daily.time.iter().enumerate() {
        let max = series_cell(&daily.temperature_2m_max, i);
        let min = series_cell(&daily.temperature_2m_min, i);
        table.push_row(vec![
            date.clone(),
            format!("{max} {}", units.temperature_2m_max),
            format!("{min} {}", units.temperature_2m_min),
        ]);
    }

    Markup::new()
        .heading(&format!(
            "Climate Forecast for ({}, {})",
            js_number(forecast.latitude),
            js_number(forecast.longitude)
        ))
        .field("Elevation:", &format!("{} m", js_number(forecast.elevation)))
        .field("Timezone:", &forecast.timezone)
        .blank_line()
        .table("Daily Forecast (next 16 days):", &table)
        .finish()
}

pub fn render_fires(envelope: &Envelope<Vec<FireRecord>>) -> String {
    let mut table = Table::new([
        "Latitude",
        "Longitude",
        "Brightness",
        "Acquisition Date",
        "FRP",
    ]);

    for fire in &envelope.data {
        table.push_row(vec![
            fire.latitude.to_string(),
            fire.longitude.to_string(),
            fire.bright_ti4.to_string(),
            fire.acq_date.to_string(),
            fire.frp.to_string(),
        ]);
    }

    Markup::new()
        .field("Message:", message_or_default(envelope))
        .table("Fire Data:", &table)
        .finish()
}

pub fn render_slicks(envelope: &Envelope<Vec<SlickRecord>>) -> Result<String, RenderError> {
    let mut table = Table::new([
        "ID",
        "Area (sq.m)",
        "Machine Confidence",
        "Detection Timestamp",
        "Classification",
    ]);

    for (index, slick) in envelope.data.iter().enumerate() {
        let area = slick
            .area
            .as_f64()
            .ok_or(RenderError::NotANumber { field: "area", index })?;
        let confidence = slick
            .machine_confidence
            .as_f64()
            .ok_or(RenderError::NotANumber { field: "machine_confidence", index })?;

        table.push_row(vec![
            slick.id.to_string(),
            to_fixed(area, 0),
            to_fixed(confidence, 3),
            slick.slick_timestamp.to_string(),
            slick.classification.to_string(),
        ]);
    }

    Ok(Markup::new()
        .field("Message:", message_or_default(envelope))
        .table("Results:", &table)
        .finish())
}

fn message_or_default<T>(envelope: &Envelope<T>) -> &str {
    envelope
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(NO_MESSAGE)
}

/// Standalone document holding every display region, in the given order.
pub fn render_page(regions: &[(&str, SlotSnapshot)]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Climate Dashboard</title>\n</head>\n<body>\n",
    );

    for (id, slot) in regions {
        let style = if slot.visible { "" } else { " style=\"display:none\"" };
        let _ = write!(
            out,
            "<div id=\"{}\"{style}>\n{}\n</div>\n",
            escape(id),
            slot.html
        );
    }

    out.push_str("</body>\n</html>\n");
    out
}
