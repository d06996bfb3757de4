//! Daily contribution chart rendered to SVG
//!
//! Load components are stacked above zero, the protective impact hangs below
//! it, and the tic count is drawn as a line on a secondary axis.

use plotters::prelude::*;

use crate::analysis::ContributionRow;
use crate::error::ExportError;

const STRESS: RGBColor = RGBColor(0xFF, 0x8C, 0x42);
const STUDY: RGBColor = RGBColor(0x43, 0xAA, 0x8B);
const SLEEP_PENALTY: RGBColor = RGBColor(0x90, 0x5F, 0xD0);
const AGGRAVATING: RGBColor = RGBColor(0x2D, 0x7D, 0xD2);
const PROTECTIVE: RGBColor = RGBColor(0xF5, 0xE6, 0x63);
const TICS: RGBColor = RGBColor(0xEE, 0x42, 0x66);

const BAR_HALF_WIDTH: f64 = 0.35;

fn chart_error<E: std::fmt::Display>(err: E) -> ExportError {
    ExportError::Chart(err.to_string())
}

/// Render the contribution table as an SVG document
pub fn render_svg(rows: &[ContributionRow]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Chart("no days to chart".to_string()));
    }

    let top = rows
        .iter()
        .map(|r| r.component_sum())
        .fold(0.0_f64, f64::max)
        .max(1.0)
        * 1.1;
    let bottom = rows
        .iter()
        .map(|r| r.negative_custom)
        .fold(0.0_f64, f64::min)
        * 1.1;
    let max_tics = rows.iter().map(|r| r.tic_count).max().unwrap_or(0).max(1) as f64 * 1.1;
    let x_range = -0.5..(rows.len() as f64 - 0.5);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (1000, 520)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .right_y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), bottom.min(-1.0)..top)
            .map_err(chart_error)?
            .set_secondary_coord(x_range, 0.0..max_tics);

        let labels: Vec<String> = rows.iter().map(|r| r.date.format("%b %d").to_string()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows.len().min(14))
            .x_label_formatter(&|x| {
                let index = x.round();
                if index >= 0.0 && (index as usize) < labels.len() {
                    labels[index as usize].clone()
                } else {
                    String::new()
                }
            })
            .y_desc("Load")
            .draw()
            .map_err(chart_error)?;
        chart
            .configure_secondary_axes()
            .y_desc("Tics")
            .draw()
            .map_err(chart_error)?;

        let stacks = [
            (STRESS, "Stress"),
            (STUDY, "Study"),
            (SLEEP_PENALTY, "Sleep penalty"),
            (AGGRAVATING, "Things making it worse"),
        ];
        for (layer, &(color, label)) in stacks.iter().enumerate() {
            let bars = rows.iter().enumerate().filter_map(|(i, row)| {
                let values = [row.stress, row.study, row.sleep_penalty, row.positive_custom];
                let base: f64 = values[..layer].iter().sum();
                let height = values[layer];
                (height > 0.0).then(|| {
                    let x = i as f64;
                    Rectangle::new(
                        [(x - BAR_HALF_WIDTH, base), (x + BAR_HALF_WIDTH, base + height)],
                        color.filled(),
                    )
                })
            });
            chart
                .draw_series(bars)
                .map_err(chart_error)?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .draw_series(rows.iter().enumerate().filter(|(_, r)| r.negative_custom < 0.0).map(
                |(i, row)| {
                    let x = i as f64;
                    Rectangle::new(
                        [(x - BAR_HALF_WIDTH, row.negative_custom), (x + BAR_HALF_WIDTH, 0.0)],
                        PROTECTIVE.filled(),
                    )
                },
            ))
            .map_err(chart_error)?
            .label("Things helping you")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], PROTECTIVE.filled()));

        chart
            .draw_secondary_series(LineSeries::new(
                rows.iter().enumerate().map(|(i, r)| (i as f64, r.tic_count as f64)),
                TICS.stroke_width(3),
            ))
            .map_err(chart_error)?
            .label("Tic count")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], TICS.stroke_width(3)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    Ok(svg)
}
