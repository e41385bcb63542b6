//! Grouped bar chart of the leading rows' numeric columns

use crate::error::Result;
use crate::model::Table;

const WIDTH: u32 = 860;
const HEIGHT: u32 = 420;

/// Values plotted by the chart: one bar group per row, one bar per numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// Numeric column names, in table order
    pub series: Vec<String>,
    /// `groups[row][series]`; missing cells have no bar
    pub groups: Vec<Vec<Option<f64>>>,
}

impl ChartData {
    /// Numeric columns of the first `row_limit` rows, or `None` when there are no numeric columns
    pub fn from_table(table: &Table, row_limit: usize) -> Option<Self> {
        let numeric = table.numeric_column_indices();
        if numeric.is_empty() {
            return None;
        }

        let series = numeric.iter().map(|&i| table.columns[i].name.clone()).collect();
        let groups = table
            .rows
            .iter()
            .take(row_limit)
            .map(|row| {
                numeric
                    .iter()
                    .map(|&i| row.get(i).and_then(|c| c.as_f64()))
                    .collect()
            })
            .collect();

        Some(Self { series, groups })
    }

    /// Y-axis range, always including zero and never empty
    pub fn value_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .groups
            .iter()
            .flatten()
            .flatten()
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if hi - lo < f64::EPSILON {
            (lo, lo + 1.0)
        } else {
            let pad = (hi - lo) * 0.05;
            (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
        }
    }
}

/// Render the chart as an SVG document
#[cfg(feature = "charts")]
pub fn render_bar_chart(data: &ChartData) -> Result<String> {
    use plotters::prelude::*;

    use crate::error::PipelineError;

    fn chart_err(e: impl std::fmt::Display) -> PipelineError {
        PipelineError::Chart(e.to_string())
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let groups = data.groups.len().max(1);
        let (lo, hi) = data.value_range();
        let mut chart = ChartBuilder::on(&root)
            .caption("Bar chart of the first rows", ("sans-serif", 18))
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(56)
            .build_cartesian_2d(0f64..groups as f64, lo..hi)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups)
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .x_desc("row")
            .draw()
            .map_err(chart_err)?;

        let bar = 0.8 / data.series.len() as f64;
        for (j, name) in data.series.iter().enumerate() {
            let color = Palette99::pick(j).to_rgba();
            chart
                .draw_series(data.groups.iter().enumerate().filter_map(|(i, values)| {
                    values[j].map(|v| {
                        let x0 = i as f64 + 0.1 + j as f64 * bar;
                        Rectangle::new([(x0, 0.0), (x0 + bar, v)], color.filled())
                    })
                }))
                .map_err(chart_err)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

#[cfg(not(feature = "charts"))]
pub fn render_bar_chart(_data: &ChartData) -> Result<String> {
    Err(crate::error::PipelineError::MissingDependency {
        operation: "Chart rendering",
        capability: "charts",
    })
}
