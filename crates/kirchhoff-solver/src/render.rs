//! Waveform rendering to standalone SVG documents.

use std::fmt::Write;

use kirchhoff_core::units::format_coefficient;
use kirchhoff_core::{Artifact, ConversionError, Renderer};

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const TICKS: usize = 5;

/// Line plot of one waveform against time.
///
/// Holds only its canvas size; every call renders from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
        }
    }
}

impl SvgRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// SVG document for `samples` over `times`.
    pub fn to_svg(
        &self,
        name: &str,
        times: &[f64],
        samples: &[f64],
    ) -> Result<String, ConversionError> {
        if times.len() != samples.len() {
            return Err(ConversionError::new(format!(
                "cannot plot {name}: {} times for {} samples",
                times.len(),
                samples.len()
            )));
        }
        if times.is_empty() {
            return Err(ConversionError::new(format!("cannot plot {name}: no samples")));
        }
        if times.iter().chain(samples).any(|v| !v.is_finite()) {
            return Err(ConversionError::new(format!(
                "cannot plot {name}: non-finite sample"
            )));
        }

        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (h - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

        let (t_min, t_max) = padded_range(times, 0.0);
        let (y_min, y_max) = padded_range(samples, 0.05);
        let x_of = |t: f64| MARGIN_LEFT + (t - t_min) / (t_max - t_min) * plot_w;
        let y_of = |y: f64| MARGIN_TOP + (y_max - y) / (y_max - y_min) * plot_h;

        let title = escape(&format!("{name} vs Time"));
        let label = escape(name);

        let mut svg = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="24" text-anchor="middle" font-family="sans-serif" font-size="16">{title}</text>"#,
            w / 2.0
        );

        // Grid and tick labels.
        for k in 0..=TICKS {
            let frac = k as f64 / TICKS as f64;
            let t = t_min + frac * (t_max - t_min);
            let y = y_min + frac * (y_max - y_min);
            let (x_px, y_px) = (x_of(t), y_of(y));
            let _ = writeln!(
                svg,
                r##"<line x1="{x_px:.1}" y1="{:.1}" x2="{x_px:.1}" y2="{:.1}" stroke="#ddd"/>"##,
                MARGIN_TOP,
                MARGIN_TOP + plot_h
            );
            let _ = writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{y_px:.1}" x2="{:.1}" y2="{y_px:.1}" stroke="#ddd"/>"##,
                MARGIN_LEFT,
                MARGIN_LEFT + plot_w
            );
            let _ = writeln!(
                svg,
                r#"<text x="{x_px:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="11">{}</text>"#,
                MARGIN_TOP + plot_h + 16.0,
                format_coefficient(t)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-family="sans-serif" font-size="11">{}</text>"#,
                MARGIN_LEFT - 6.0,
                y_px + 4.0,
                format_coefficient(y)
            );
        }

        let _ = writeln!(
            svg,
            r#"<rect x="{MARGIN_LEFT:.1}" y="{MARGIN_TOP:.1}" width="{plot_w:.1}" height="{plot_h:.1}" fill="none" stroke="black"/>"#
        );

        let points: Vec<String> = times
            .iter()
            .zip(samples)
            .map(|(&t, &y)| format!("{:.2},{:.2}", x_of(t), y_of(y)))
            .collect();
        let _ = writeln!(
            svg,
            r##"<polyline fill="none" stroke="#1f77b4" stroke-width="2" points="{}"/>"##,
            points.join(" ")
        );

        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="13">Time (s)</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            h - 12.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="16" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="13" transform="rotate(-90 16 {:.1})">{label}</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            MARGIN_TOP + plot_h / 2.0
        );
        svg.push_str("</svg>\n");

        Ok(svg)
    }
}

impl Renderer for SvgRenderer {
    fn render(
        &self,
        name: &str,
        times: &[f64],
        samples: &[f64],
    ) -> Result<Artifact, ConversionError> {
        let svg = self.to_svg(name, times, samples)?;
        Ok(Artifact {
            name: name.to_string(),
            format: "svg".to_string(),
            bytes: svg.into_bytes(),
        })
    }
}

/// Min and max of `values`, widened so the range is never empty.
fn padded_range(values: &[f64], pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
        let half = lo.abs().max(1.0) * 0.5;
        return (lo - half, hi + half);
    }
    (lo - pad * span, hi + pad * span)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
