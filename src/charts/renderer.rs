//! Static Chart Renderer
//! Writes the five report charts as PNG files with plotters.
//!
//! Figure sizes are given in inches and scaled by the configured DPI, so
//! the default 300 DPI produces print-resolution images:
//! 1. Top priority RED districts (bar chart with the RED threshold)
//! 2. Zone distribution (pie)
//! 3. Enrolments vs updates (log-log scatter by zone)
//! 4. Anomaly detection (UER vs z-score with the ±2.5 band)
//! 5. Youth ratio vs UER (scatter by zone)

use crate::report::{AnalysisReport, TOP_PRIORITY_COUNT};
use crate::stats::{RegionMetrics, ANOMALY_Z_THRESHOLD};
use crate::zones::{ZoneStrategy, RED_UER_THRESHOLD};
use plotters::element::Pie;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TOP_RED_CHART: &str = "1_top_red_districts.png";
pub const ZONE_DISTRIBUTION_CHART: &str = "2_zone_distribution.png";
pub const ENROLMENT_UPDATE_CHART: &str = "3_enrolments_vs_updates.png";
pub const ANOMALY_CHART: &str = "4_anomaly_detection.png";
pub const DEMOGRAPHIC_CHART: &str = "5_demographic_insights.png";

// Zone colors
const RED_ZONE: RGBColor = RGBColor(255, 77, 77);
const YELLOW_ZONE: RGBColor = RGBColor(255, 204, 0);
const GREEN_ZONE: RGBColor = RGBColor(102, 179, 255);
const NORMAL_POINT: RGBColor = RGBColor(204, 204, 204);

const FONT: &str = "sans-serif";

type DrawResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
#[error("Failed to render {chart}: {message}")]
pub struct ChartError {
    pub chart: &'static str,
    pub message: String,
}

pub fn zone_color(zone: ZoneStrategy) -> RGBColor {
    match zone {
        ZoneStrategy::Red => RED_ZONE,
        ZoneStrategy::Yellow => YELLOW_ZONE,
        ZoneStrategy::Green => GREEN_ZONE,
    }
}

/// Decade-aligned bounds covering every positive value, for log axes.
pub fn log_axis_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 1.0..10.0;
    }

    let lo = 10f64.powf(lo.log10().floor());
    let mut hi = 10f64.powf(hi.log10().ceil());
    if hi <= lo {
        hi = lo * 10.0;
    }
    lo..hi
}

/// `0..max` with five percent headroom, never narrower than `0..floor`.
pub fn padded_range(values: impl IntoIterator<Item = f64>, floor: f64) -> Range<f64> {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(floor, f64::max);
    0.0..max * 1.05
}

/// Renders report charts into a directory.
pub struct ChartRenderer {
    dpi: u32,
}

impl ChartRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.max(1) }
    }

    /// Render all five charts. Each entry is the written path or the
    /// failure for that chart.
    pub fn render_all(&self, report: &AnalysisReport, dir: &Path) -> Vec<Result<PathBuf, ChartError>> {
        vec![
            self.render(TOP_RED_CHART, dir, |p| self.draw_top_red(p, report)),
            self.render(ZONE_DISTRIBUTION_CHART, dir, |p| self.draw_zone_distribution(p, report)),
            self.render(ENROLMENT_UPDATE_CHART, dir, |p| {
                self.draw_enrolments_vs_updates(p, &report.districts)
            }),
            self.render(ANOMALY_CHART, dir, |p| self.draw_anomalies(p, &report.districts)),
            self.render(DEMOGRAPHIC_CHART, dir, |p| self.draw_demographics(p, &report.districts)),
        ]
    }

    fn render(
        &self,
        chart: &'static str,
        dir: &Path,
        draw: impl FnOnce(&Path) -> DrawResult,
    ) -> Result<PathBuf, ChartError> {
        let path = dir.join(chart);
        match draw(&path) {
            Ok(()) => Ok(path),
            Err(e) => Err(ChartError {
                chart,
                message: e.to_string(),
            }),
        }
    }

    fn pixels(&self, inches: f64) -> u32 {
        (inches * self.dpi as f64).round() as u32
    }

    /// Font size in pixels for a size given in points.
    fn font(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn marker(&self) -> i32 {
        self.font(5.0).round() as i32
    }

    fn draw_top_red(&self, path: &Path, report: &AnalysisReport) -> DrawResult {
        let top = report.top_priority(TOP_PRIORITY_COUNT);
        let labels: Vec<String> = top
            .iter()
            .map(|m| format!("{} ({})", m.key().district, m.key().state))
            .collect();

        let root = BitMapBackend::new(path, (self.pixels(12.0), self.pixels(6.0))).into_drawing_area();
        root.fill(&WHITE)?;

        let y_range = padded_range(top.iter().map(|m| m.uer()), RED_UER_THRESHOLD);
        let mut chart = ChartBuilder::on(&root)
            .caption(
                "TOP 5 PRIORITY DISTRICTS - Highest Maintenance Load",
                (FONT, self.font(14.0)).into_font().style(FontStyle::Bold),
            )
            .margin(self.pixels(0.2))
            .x_label_area_size(self.pixels(0.6))
            .y_label_area_size(self.pixels(0.9))
            .build_cartesian_2d((0usize..labels.len().max(1)).into_segmented(), y_range)?;

        let label_of = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("District")
            .y_desc("Updates per Enrolment (UER)")
            .x_label_formatter(&label_of)
            .label_style((FONT, self.font(10.0)))
            .axis_desc_style((FONT, self.font(12.0)).into_font().style(FontStyle::Bold))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(RED_ZONE.mix(0.8).filled())
                .margin(self.pixels(0.3))
                .data(top.iter().enumerate().map(|(i, m)| (i, m.uer()))),
        )?;

        chart
            .draw_series(LineSeries::new(
                vec![
                    (SegmentValue::Exact(0), RED_UER_THRESHOLD),
                    (SegmentValue::Last, RED_UER_THRESHOLD),
                ],
                RED.mix(0.5).stroke_width(self.marker() as u32 / 2),
            ))?
            .label("RED Zone Threshold")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart
            .configure_series_labels()
            .label_font((FONT, self.font(10.0)))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_zone_distribution(&self, path: &Path, report: &AnalysisReport) -> DrawResult {
        let root = BitMapBackend::new(path, (self.pixels(10.0), self.pixels(8.0))).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(
            "National Infrastructure Distribution",
            (FONT, self.font(14.0)).into_font().style(FontStyle::Bold),
        )?;

        let present: Vec<(ZoneStrategy, usize)> = report
            .zone_distribution()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();
        let sizes: Vec<f64> = present.iter().map(|(_, c)| *c as f64).collect();
        let colors: Vec<RGBColor> = present.iter().map(|(z, _)| zone_color(*z)).collect();
        let labels: Vec<&str> = present.iter().map(|(z, _)| z.label()).collect();

        if !sizes.is_empty() {
            let (w, h) = area.dim_in_pixel();
            let center = (w as i32 / 2, h as i32 / 2);
            let radius = w.min(h) as f64 * 0.32;

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(140.0);
            pie.label_style((FONT, self.font(11.0)).into_font().color(&BLACK));
            pie.percentages((FONT, self.font(11.0)).into_font().color(&BLACK));
            area.draw(&pie)?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_enrolments_vs_updates(&self, path: &Path, districts: &[RegionMetrics]) -> DrawResult {
        let root = BitMapBackend::new(path, (self.pixels(14.0), self.pixels(8.0))).into_drawing_area();
        root.fill(&WHITE)?;

        // log axes cannot show zero
        let points: Vec<&RegionMetrics> = districts
            .iter()
            .filter(|m| m.enrolments() > 0.0 && m.updates() > 0.0)
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "District Clustering: Enrolments vs. Updates",
                (FONT, self.font(14.0)).into_font().style(FontStyle::Bold),
            )
            .margin(self.pixels(0.2))
            .x_label_area_size(self.pixels(0.6))
            .y_label_area_size(self.pixels(0.9))
            .build_cartesian_2d(
                log_axis_range(points.iter().map(|m| m.enrolments())).log_scale(),
                log_axis_range(points.iter().map(|m| m.updates())).log_scale(),
            )?;

        chart
            .configure_mesh()
            .x_desc("Total Enrolments (Log Scale)")
            .y_desc("Total Updates (Log Scale)")
            .label_style((FONT, self.font(10.0)))
            .axis_desc_style((FONT, self.font(12.0)).into_font().style(FontStyle::Bold))
            .draw()?;

        let r = self.marker();
        for zone in ZoneStrategy::ALL {
            let color = zone_color(zone);
            chart
                .draw_series(
                    points
                        .iter()
                        .filter(|m| m.zone == zone)
                        .map(|m| Circle::new((m.enrolments(), m.updates()), r, color.mix(0.6).filled())),
                )?
                .label(zone.label())
                .legend(move |(x, y)| Circle::new((x, y), r, color.filled()));
        }

        chart
            .configure_series_labels()
            .label_font((FONT, self.font(10.0)))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_anomalies(&self, path: &Path, districts: &[RegionMetrics]) -> DrawResult {
        let root = BitMapBackend::new(path, (self.pixels(14.0), self.pixels(7.0))).into_drawing_area();
        root.fill(&WHITE)?;

        let scored: Vec<(f64, f64, bool)> = districts
            .iter()
            .filter_map(|m| m.uer_zscore.map(|z| (m.uer(), z, m.is_anomaly)))
            .collect();

        let x_range = padded_range(scored.iter().map(|(uer, _, _)| *uer), 1.0);
        let z_max = scored
            .iter()
            .map(|(_, z, _)| z.abs())
            .fold(ANOMALY_Z_THRESHOLD + 0.5, f64::max)
            * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Anomaly Detection: Districts with Unusual Demand Patterns",
                (FONT, self.font(14.0)).into_font().style(FontStyle::Bold),
            )
            .margin(self.pixels(0.2))
            .x_label_area_size(self.pixels(0.6))
            .y_label_area_size(self.pixels(0.8))
            .build_cartesian_2d(x_range.clone(), -z_max..z_max)?;

        chart
            .configure_mesh()
            .x_desc("UER (Updates per Enrolment)")
            .y_desc("Z-Score")
            .label_style((FONT, self.font(10.0)))
            .axis_desc_style((FONT, self.font(12.0)).into_font().style(FontStyle::Bold))
            .draw()?;

        let r = self.marker();
        chart.draw_series(scored.iter().map(|(uer, z, anomalous)| {
            let color = if *anomalous { RED_ZONE } else { NORMAL_POINT };
            Circle::new((*uer, *z), r, color.mix(0.6).filled())
        }))?;

        for (bound, label) in [
            (ANOMALY_Z_THRESHOLD, "Anomaly Threshold (+2.5σ)"),
            (-ANOMALY_Z_THRESHOLD, "Anomaly Threshold (-2.5σ)"),
        ] {
            chart
                .draw_series(LineSeries::new(
                    vec![(x_range.start, bound), (x_range.end, bound)],
                    RED.mix(0.7).stroke_width(r as u32 / 2),
                ))?
                .label(label)
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        }

        chart
            .configure_series_labels()
            .label_font((FONT, self.font(10.0)))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_demographics(&self, path: &Path, districts: &[RegionMetrics]) -> DrawResult {
        let root = BitMapBackend::new(path, (self.pixels(14.0), self.pixels(7.0))).into_drawing_area();
        root.fill(&WHITE)?;

        let points: Vec<(f64, f64, ZoneStrategy)> = districts
            .iter()
            .filter_map(|m| m.youth_ratio().map(|y| (y, m.uer(), m.zone)))
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Youth Demographics vs. Infrastructure Demand",
                (FONT, self.font(14.0)).into_font().style(FontStyle::Bold),
            )
            .margin(self.pixels(0.2))
            .x_label_area_size(self.pixels(0.6))
            .y_label_area_size(self.pixels(0.8))
            .build_cartesian_2d(0.0..1.0, padded_range(points.iter().map(|(_, uer, _)| *uer), 1.0))?;

        chart
            .configure_mesh()
            .x_desc("Youth Ratio (0-17 years / Total Population)")
            .y_desc("UER (Updates per Enrolment)")
            .label_style((FONT, self.font(10.0)))
            .axis_desc_style((FONT, self.font(12.0)).into_font().style(FontStyle::Bold))
            .draw()?;

        let r = self.marker();
        for zone in ZoneStrategy::ALL {
            let color = zone_color(zone);
            chart
                .draw_series(
                    points
                        .iter()
                        .filter(|(_, _, z)| *z == zone)
                        .map(|(youth, uer, _)| Circle::new((*youth, *uer), r, color.mix(0.6).filled())),
                )?
                .label(zone.short_name())
                .legend(move |(x, y)| Circle::new((x, y), r, color.filled()));
        }

        chart
            .configure_series_labels()
            .label_font((FONT, self.font(10.0)))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_axis_range_is_decade_aligned() {
        let range = log_axis_range([37.0, 0.0, 4200.0]);
        assert_eq!(range.start, 10.0);
        assert_eq!(range.end, 10000.0);
    }

    #[test]
    fn test_log_axis_range_degenerate_inputs() {
        assert_eq!(log_axis_range(Vec::<f64>::new()), 1.0..10.0);
        assert_eq!(log_axis_range([0.0, -3.0]), 1.0..10.0);
        let exact = log_axis_range([100.0]);
        assert_eq!(exact.start, 100.0);
        assert_eq!(exact.end, 1000.0);
    }

    #[test]
    fn test_padded_range_respects_floor() {
        assert_eq!(padded_range([10.0, 20.0], 50.0), 0.0..52.5);
        assert_eq!(padded_range([100.0], 50.0), 0.0..105.0);
        assert_eq!(padded_range([f64::NAN], 1.0), 0.0..1.05);
    }

    #[test]
    fn test_pixel_scaling() {
        let renderer = ChartRenderer::new(300);
        assert_eq!(renderer.pixels(12.0), 3600);
        assert!((renderer.font(12.0) - 50.0).abs() < 1e-9);
        assert_eq!(ChartRenderer::new(0).pixels(2.0), 2);
    }

    #[test]
    fn test_zone_colors_are_distinct() {
        assert_ne!(zone_color(ZoneStrategy::Red), zone_color(ZoneStrategy::Yellow));
        assert_ne!(zone_color(ZoneStrategy::Yellow), zone_color(ZoneStrategy::Green));
    }
}
