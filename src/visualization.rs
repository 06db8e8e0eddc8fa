//! Visualization utilities for optimization results.
//!
//! Generates SVG histograms of the catalog's price and emissions
//! distributions with the selected flight marked, so a run's outcome can be
//! judged against the whole candidate pool.

use crate::catalog::FlightCatalog;
use crate::genetic::BestFlight;
use std::fs::File;
use std::io::Write;
use std::path::Path;
#[cfg(not(feature = "resvg"))]
use std::process::Command;
#[cfg(feature = "resvg")]
use resvg::render;
#[cfg(feature = "resvg")]
use resvg::usvg;
#[cfg(feature = "resvg")]
use resvg::usvg::TreeParsing;
#[cfg(feature = "resvg")]
use resvg::FitTo;
#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};

/// SVG histogram generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Number of histogram bins
    pub bins: usize,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 500.0,
            margin: 50.0,
            bins: 20,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram of catalog prices with the selected flight marked.
    pub fn generate_price_svg(&self, catalog: &FlightCatalog, best: &BestFlight) -> String {
        let prices: Vec<u32> = catalog.records().iter().map(|r| r.price).collect();
        self.generate_histogram_svg("Price distribution", "Price", &prices, best.price)
    }

    /// Histogram of catalog emissions with the selected flight marked.
    pub fn generate_emissions_svg(&self, catalog: &FlightCatalog, best: &BestFlight) -> String {
        let emissions: Vec<u32> = catalog.records().iter().map(|r| r.emissions).collect();
        self.generate_histogram_svg(
            "Emissions distribution (kg CO2e)",
            "Emissions",
            &emissions,
            best.emissions,
        )
    }

    fn generate_histogram_svg(
        &self,
        title: &str,
        axis: &str,
        values: &[u32],
        selected: u32,
    ) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .bar {{ fill: #3498db; fill-opacity: 0.7; stroke: #2c3e50; stroke-width: 1; }}
    .best {{ stroke: #e74c3c; stroke-width: 2; stroke-dasharray: 6,4; }}
    .min {{ stroke: #2ecc71; stroke-width: 2; stroke-dasharray: 6,4; }}
    .max {{ stroke: #f39c12; stroke-width: 2; stroke-dasharray: 6,4; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 11px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">{}</text>
"#,
            self.margin, title
        ));

        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;

        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        let span = (max.saturating_sub(min)).max(1) as f64;

        // Bin counts over [min, max]; the top value lands in the last bin.
        let mut counts = vec![0usize; self.bins];
        for &v in values {
            let bin = (((v - min) as f64 / span) * self.bins as f64) as usize;
            counts[bin.min(self.bins - 1)] += 1;
        }

        let peak = counts.iter().copied().max().unwrap_or(1).max(1) as f64;
        let bar_width = plot_width / self.bins as f64;
        let base_y = self.height - self.margin;

        for (i, &count) in counts.iter().enumerate() {
            let bar_height = count as f64 / peak * plot_height;
            let x = self.margin + i as f64 * bar_width;
            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="bar"/>
"##,
                x,
                base_y - bar_height,
                bar_width,
                bar_height
            ));
        }

        // Vertical marker lines: value -> x position within [min, max].
        let to_x =
            |v: u32| -> f64 { self.margin + (v.saturating_sub(min)) as f64 / span * plot_width };

        for (value, class, name) in [
            (selected, "best", "Selected"),
            (min, "min", "Min"),
            (max, "max", "Max"),
        ] {
            let x = to_x(value);
            svg.push_str(&format!(
                r##"<line x1="{:.2}" y1="{}" x2="{:.2}" y2="{}" class="{}"/>
<text x="{:.2}" y="{}" class="label">{}: {}</text>
"##,
                x,
                self.margin,
                x,
                base_y,
                class,
                x + 3.0,
                self.margin + 12.0,
                name,
                value
            ));
        }

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
<text x="{}" y="{}" class="label">{}</text>
"##,
            self.margin,
            base_y,
            self.width - self.margin,
            base_y,
            self.width / 2.0,
            base_y + 20.0,
            axis
        ));

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG. Uses the native resvg renderer when the feature is
    /// enabled, otherwise tries external converters (`rsvg-convert`,
    /// `magick`, `inkscape`).
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let path = path.as_ref();

        #[cfg(feature = "resvg")]
        {
            let opt = usvg::Options::default();
            let rtree = usvg::Tree::from_str(svg, &opt).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("usvg parse error: {}", e))
            })?;
            let mut pixmap = Pixmap::new(self.width as u32, self.height as u32).ok_or_else(
                || std::io::Error::new(std::io::ErrorKind::Other, "Failed to create pixmap"),
            )?;
            render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut()).ok_or_else(
                || std::io::Error::new(std::io::ErrorKind::Other, "resvg render failed"),
            )?;
            pixmap.save_png(path).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("save_png failed: {}", e))
            })?;
            Ok(())
        }

        #[cfg(not(feature = "resvg"))]
        {
            let tmp_svg = path.with_extension("svg.tmp");
            {
                let mut f = File::create(&tmp_svg)?;
                f.write_all(svg.as_bytes())?;
            }

            let tmp = tmp_svg.to_string_lossy().to_string();
            let out = path.to_string_lossy().to_string();
            let converters: [(&str, Vec<&str>); 3] = [
                ("rsvg-convert", vec!["-o", &out, &tmp]),
                ("magick", vec!["convert", &tmp, &out]),
                (
                    "inkscape",
                    vec![&tmp, "--export-type=png", "--export-filename", &out],
                ),
            ];

            for (cmd, args) in converters {
                if let Ok(status) = Command::new(cmd).args(&args).status() {
                    if status.success() {
                        let _ = std::fs::remove_file(&tmp_svg);
                        return Ok(());
                    }
                }
            }

            let _ = std::fs::remove_file(&tmp_svg);
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FlightRecord;
    use crate::genetic::{GaConfig, GeneticAlgorithm};

    fn create_test_catalog() -> FlightCatalog {
        FlightCatalog::new(vec![
            FlightRecord::new(0, 1000, 300, "1 stop", 14),
            FlightRecord::new(1, 500, 250, "1 stop", 14),
            FlightRecord::new(2, 2500, 900, "1 stop", 14),
        ])
    }

    fn run_small_ga(catalog: &FlightCatalog) -> BestFlight {
        let config = GaConfig {
            population_size: 10,
            generations: 20,
            ..Default::default()
        };
        GeneticAlgorithm::new(catalog.clone(), config)
            .unwrap()
            .run()
            .unwrap()
    }

    #[test]
    fn test_price_histogram_svg() {
        let catalog = create_test_catalog();
        let best = run_small_ga(&catalog);

        let viz = Visualizer::new();
        let svg = viz.generate_price_svg(&catalog, &best);

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Price distribution"));
        assert!(svg.contains("Selected"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_emissions_histogram_marks_bounds() {
        let catalog = create_test_catalog();
        let best = run_small_ga(&catalog);

        let viz = Visualizer::new();
        let svg = viz.generate_emissions_svg(&catalog, &best);

        assert!(svg.contains("Min: 250"));
        assert!(svg.contains("Max: 900"));
    }
}
