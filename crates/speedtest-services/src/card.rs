//! Shareable result cards.
//!
//! `CardRenderer` is the seam; the HTTP edge only needs "metrics in, encoded
//! image and filename out". The bundled `SvgCardRenderer` draws a 1200×630
//! social-preview card as SVG so no raster/font stack is required.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCard {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping: f64,
    pub jitter: f64,
    pub quality_score: i64,
    pub grade: String,
    pub isp: String,
    pub location: String,
    pub server_region: String,
    pub timestamp: String,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl ShareCard {
    fn check_finite(&self) -> Result<(), CardError> {
        let metrics = [
            ("download_mbps", self.download_mbps),
            ("upload_mbps", self.upload_mbps),
            ("ping", self.ping),
            ("jitter", self.jitter),
        ];
        match metrics.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(CardError::NonFinite(*name)),
            None => Ok(()),
        }
    }
}

fn default_theme() -> String {
    "dark".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCard {
    pub image_base64: String,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
}

pub trait CardRenderer: Send + Sync {
    fn render(
        &self,
        card: &ShareCard,
        rendered_at: DateTime<Utc>,
    ) -> Result<RenderedCard, CardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// Anything other than "dark" renders light, as the web client does.
    pub fn from_name(name: &str) -> Self {
        if name == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: "#111827",
                card: "#1f2937",
                text_primary: "#ffffff",
                text_secondary: "#9ca3af",
            },
            Theme::Light => Palette {
                background: "#f9fafb",
                card: "#ffffff",
                text_primary: "#111827",
                text_secondary: "#6b7280",
            },
        }
    }
}

struct Palette {
    background: &'static str,
    card: &'static str,
    text_primary: &'static str,
    text_secondary: &'static str,
}

const ACCENT: &str = "#3b82f6";
const DOWNLOAD: &str = "#22c55e";
const UPLOAD: &str = "#a855f7";

fn grade_color(grade: &str) -> &'static str {
    match grade {
        "A+" | "A" => "#22c55e",
        "B" => "#eab308",
        "C" => "#f97316",
        "D" | "F" => "#ef4444",
        _ => ACCENT,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgCardRenderer;

impl SvgCardRenderer {
    pub fn svg(&self, card: &ShareCard) -> String {
        let p = Theme::from_name(&card.theme).palette();
        let text = |x: u32, y: u32, size: u32, fill: &str, weight: &str, body: &str| {
            format!(
                r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" fill="{fill}">{}</text>"#,
                escape(body)
            )
        };

        let mut parts = vec![
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630" viewBox="0 0 1200 630" font-family="DejaVu Sans, system-ui, sans-serif">"#
                .to_string(),
            format!(r#"<rect width="1200" height="630" fill="{}"/>"#, p.background),
            format!(
                r#"<rect x="40" y="40" width="1120" height="550" rx="16" fill="{}" stroke="{ACCENT}" stroke-width="2"/>"#,
                p.card
            ),
            text(80, 100, 36, ACCENT, "bold", "Speed Test Results"),
            format!(
                r#"<circle cx="1050" cy="100" r="50" fill="{}"/>"#,
                grade_color(&card.grade)
            ),
            text(1025, 115, 36, "#ffffff", "bold", &card.grade),
            text(
                1015,
                175,
                18,
                p.text_secondary,
                "normal",
                &format!("Score: {}", card.quality_score),
            ),
        ];

        let metrics = [
            (80, "↓ DOWNLOAD", DOWNLOAD, format!("{:.1}", card.download_mbps), "Mbps"),
            (450, "↑ UPLOAD", UPLOAD, format!("{:.1}", card.upload_mbps), "Mbps"),
            (800, "PING", ACCENT, format!("{:.0}", card.ping), "ms"),
            (1000, "JITTER", p.text_secondary, format!("{:.1}", card.jitter), "ms"),
        ];
        for (x, label, color, value, unit) in &metrics {
            parts.push(text(*x, 205, 24, color, "normal", label));
            parts.push(text(*x, 285, 72, p.text_primary, "bold", value));
            parts.push(text(*x, 320, 24, p.text_secondary, "normal", unit));
        }

        parts.push(format!(
            r#"<line x1="80" y1="350" x2="1120" y2="350" stroke="{}" stroke-width="1"/>"#,
            p.text_secondary
        ));

        let info = [
            (80, 405, "ISP:", truncate(&card.isp, 40)),
            (80, 450, "Location:", truncate(&card.location, 35)),
            (650, 405, "Server:", truncate(&card.server_region, 25)),
            (650, 450, "Tested:", truncate(&card.timestamp, 25)),
        ];
        for (x, y, label, value) in &info {
            parts.push(text(*x, *y, 24, p.text_secondary, "normal", label));
            parts.push(text(x + 130, *y, 24, p.text_primary, "normal", value));
        }

        parts.push(text(80, 560, 24, ACCENT, "normal", "SpeedTest Dashboard"));
        parts.push(text(920, 560, 24, p.text_secondary, "normal", "speedtest.app"));
        parts.push("</svg>".to_string());
        parts.join("\n")
    }
}

impl CardRenderer for SvgCardRenderer {
    fn render(
        &self,
        card: &ShareCard,
        rendered_at: DateTime<Utc>,
    ) -> Result<RenderedCard, CardError> {
        card.check_finite()?;
        let svg = self.svg(card);
        Ok(RenderedCard {
            image_base64: base64::engine::general_purpose::STANDARD.encode(svg.as_bytes()),
            filename: format!(
                "speedtest_result_{}.svg",
                rendered_at.format("%Y%m%d_%H%M%S")
            ),
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
