//! Chart Renderer
//! Draws the descriptive charts with plotters. Standalone charts render into
//! in-memory RGB buffers; only the combined summary figure is written to disk.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use tracing::info;

use crate::charts::style::{
    ChartStyle, HIST_BLUE, MONTHLY_GREEN, PASTEL, REGRESSION_GREEN, SCATTER_PURPLE, SUMMARY_BLUE,
    SUMMARY_ORANGE,
};
use crate::data::{RoleMap, ORDER_MONTH};
use crate::stats::StatsCalculator;

type AreaResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Histogram of transaction sales amounts.
    pub fn sales_histogram(values: &[f64], style: &ChartStyle) -> Result<Vec<u8>> {
        let (w, h) = style.figure;
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_histogram(
                &root,
                values,
                style.hist_bins,
                HIST_BLUE,
                "Sales Distribution",
                "Sales",
                "Frequency",
            )?;
            root.present()?;
        }
        Ok(buffer)
    }

    /// Boxplot of profit grouped by category.
    pub fn profit_by_category_boxplot(
        groups: &[(String, Vec<f64>)],
        style: &ChartStyle,
    ) -> Result<Vec<u8>> {
        let (w, h) = style.figure;
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_boxplot(&root, groups, "Profit by Category", "Category", "Profit")?;
            root.present()?;
        }
        Ok(buffer)
    }

    /// Scatter of sales vs profit.
    pub fn sales_profit_scatter(pairs: &[(f64, f64)], style: &ChartStyle) -> Result<Vec<u8>> {
        let (w, h) = style.figure;
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_scatter(
                &root,
                pairs,
                SCATTER_PURPLE,
                None,
                "Sales vs Profit",
                "Sales",
                "Profit",
            )?;
            root.present()?;
        }
        Ok(buffer)
    }

    /// Scatter of sales vs profit with a least-squares regression line.
    pub fn sales_profit_regression(pairs: &[(f64, f64)], style: &ChartStyle) -> Result<Vec<u8>> {
        let fit = StatsCalculator::linear_fit(pairs);
        let (w, h) = style.figure;
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_scatter(
                &root,
                pairs,
                REGRESSION_GREEN,
                fit,
                "Sales vs Profit (Regression)",
                "Sales",
                "Profit",
            )?;
            root.present()?;
        }
        Ok(buffer)
    }

    /// Annotated correlation heatmap over the numeric columns.
    pub fn correlation_heatmap(
        labels: &[String],
        matrix: &[Vec<f64>],
        style: &ChartStyle,
    ) -> Result<Vec<u8>> {
        let (w, h) = style.heatmap;
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_heatmap(&root, labels, matrix, "Correlation Matrix")?;
            root.present()?;
        }
        Ok(buffer)
    }

    /// Write the 2x2 summary figure to `path`, overwriting any existing file.
    /// Quadrants whose roles are absent render a placeholder message instead.
    pub fn summary_figure(
        df: &DataFrame,
        roles: &RoleMap,
        style: &ChartStyle,
        path: &str,
    ) -> Result<()> {
        let root = BitMapBackend::new(path, style.summary).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled("Superstore 2012 Overview", ("sans-serif", 28))?;
        let areas = root.split_evenly((2, 2));

        match &roles.sales {
            Some(sales) => {
                let values = StatsCalculator::column_values(df, sales);
                draw_histogram(
                    &areas[0],
                    &values,
                    style.summary_hist_bins,
                    SUMMARY_BLUE,
                    "Sales (Histogram)",
                    "Sales",
                    "Frequency",
                )?;
            }
            None => draw_placeholder(&areas[0], "Sales not available")?,
        }

        match (&roles.profit, &roles.segment) {
            (Some(profit), Some(segment)) => {
                let groups = StatsCalculator::grouped_values(df, segment, profit);
                draw_boxplot(&areas[1], &groups, "Profit by Segment", "Segment", "Profit")?;
            }
            _ => draw_placeholder(&areas[1], "Segment/Profit not available")?,
        }

        match (&roles.sales, &roles.profit) {
            (Some(sales), Some(profit)) => {
                let pairs = StatsCalculator::paired_values(df, sales, profit);
                draw_scatter(
                    &areas[2],
                    &pairs,
                    SUMMARY_ORANGE,
                    None,
                    "Sales vs Profit",
                    "Sales",
                    "Profit",
                )?;
            }
            _ => draw_placeholder(&areas[2], "Sales/Profit not available")?,
        }

        match &roles.sales {
            Some(sales) if df.column(ORDER_MONTH).is_ok() => {
                let totals = StatsCalculator::monthly_totals(df, sales)?;
                if totals.is_empty() {
                    draw_placeholder(&areas[3], "OrderMonth/Sales not available")?;
                } else {
                    draw_monthly_line(&areas[3], &totals, "Sales by Month", "Month", "Sales")?;
                }
            }
            _ => draw_placeholder(&areas[3], "OrderMonth/Sales not available")?,
        }

        root.present()?;
        info!(%path, "summary figure written");
        Ok(())
    }
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    bins: usize,
    color: RGBColor,
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AreaResult<DB> {
    let bars = histogram_bins(values, bins);
    let (x_min, x_max) = if bars.is_empty() {
        (0.0, 1.0)
    } else {
        (bars[0].0, bars[bars.len() - 1].1)
    };
    let y_max = bars.iter().map(|&(_, _, c)| c).max().unwrap_or(1).max(1) as f64 * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(bars.iter().map(|&(x0, x1, count)| {
        Rectangle::new([(x0, 0.0), (x1, count as f64)], color.mix(0.8).filled())
    }))?;

    Ok(())
}

fn draw_boxplot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[(String, Vec<f64>)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AreaResult<DB> {
    let groups: Vec<&(String, Vec<f64>)> =
        groups.iter().filter(|(_, vals)| !vals.is_empty()).collect();
    if groups.is_empty() {
        return draw_placeholder(area, "no data");
    }

    let (y_min, y_max) = padded_range(groups.iter().flat_map(|(_, vals)| vals.iter().copied()));
    let n = groups.len();

    // quartile boxes carry f32 values, so the value axis must be f32 too
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n).into_segmented(), (y_min as f32)..(y_max as f32))?;

    let names: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(n + 1)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                names.get(*i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(groups.iter().enumerate().map(|(i, (_, vals))| {
        let color = PASTEL[i % PASTEL.len()];
        Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(vals))
            .width(25)
            .whisker_width(0.5)
            .style(color.stroke_width(2))
    }))?;

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    pairs: &[(f64, f64)],
    color: RGBColor,
    fit: Option<(f64, f64)>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AreaResult<DB> {
    let (x_min, x_max) = padded_range(pairs.iter().map(|&(x, _)| x));
    let (y_min, y_max) = padded_range(pairs.iter().map(|&(_, y)| y));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(
        pairs
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 2, color.mix(0.6).filled())),
    )?;

    if let Some((slope, intercept)) = fit {
        chart.draw_series(LineSeries::new(
            [
                (x_min, slope * x_min + intercept),
                (x_max, slope * x_max + intercept),
            ],
            color.stroke_width(2),
        ))?;
    }

    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    labels: &[String],
    matrix: &[Vec<f64>],
    title: &str,
) -> AreaResult<DB> {
    let n = labels.len();
    if n == 0 {
        return draw_placeholder(area, "no numeric columns");
    }

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

    let x_names = labels.to_vec();
    let y_names = labels.to_vec();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(j) | SegmentValue::Exact(j) => {
                x_names.get(*j).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        // row 0 is drawn at the top, so the y axis reads top-down
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(k) | SegmentValue::Exact(k) if *k < n => {
                y_names[n - 1 - *k].clone()
            }
            _ => String::new(),
        })
        .draw()?;

    for (i, row) in matrix.iter().enumerate() {
        let y = n - 1 - i;
        for (j, &value) in row.iter().enumerate() {
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                diverging_color(value).filled(),
            )))?;

            let text_color = if value.abs() > 0.6 && !value.is_nan() {
                WHITE.to_rgba()
            } else {
                BLACK.to_rgba()
            };
            let label = if value.is_nan() {
                "-".to_string()
            } else {
                format!("{value:.2}")
            };
            chart.draw_series(std::iter::once(Text::new(
                label,
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(y)),
                ("sans-serif", 13)
                    .into_font()
                    .color(&text_color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            )))?;
        }
    }

    Ok(())
}

fn draw_monthly_line<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    totals: &[(i32, f64)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AreaResult<DB> {
    let (x_min, x_max) = padded_range(totals.iter().map(|&(d, _)| d as f64));
    let (y_lo, y_hi) = padded_range(totals.iter().map(|&(_, v)| v));
    // anchor the baseline at zero unless some totals are negative
    let y_min = y_lo.min(0.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|days| {
            (NaiveDate::default() + Duration::days(*days as i64))
                .format("%Y-%m")
                .to_string()
        })
        .draw()?;

    let points: Vec<(f64, f64)> = totals.iter().map(|&(d, v)| (d as f64, v)).collect();
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        MONTHLY_GREEN.stroke_width(2),
    ))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, MONTHLY_GREEN.filled())),
    )?;

    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    message: &str,
) -> AreaResult<DB> {
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        message.to_string(),
        ((w / 2) as i32, (h / 2) as i32),
        ("sans-serif", 16)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    ))?;
    Ok(())
}

/// Equal-width bins over [min, max]; the last bin is right-closed.
fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (min + i as f64 * width, min + (i + 1) as f64 * width, c))
        .collect()
}

/// Blue-white-red diverging fill over [-1, 1]; NaN maps to the midpoint.
fn diverging_color(value: f64) -> RGBColor {
    let v = if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    };
    let blend = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    if v < 0.0 {
        let t = -v;
        RGBColor(blend(255, 0x2E, t), blend(255, 0x5C, t), blend(255, 0x8A, t))
    } else {
        RGBColor(blend(255, 0xC0, v), blend(255, 0x3A, v), blend(255, 0x3A, v))
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn small_style() -> ChartStyle {
        ChartStyle {
            figure: (320, 240),
            heatmap: (320, 240),
            summary: (640, 480),
            ..Default::default()
        }
    }

    fn has_ink(buffer: &[u8]) -> bool {
        buffer.iter().any(|&b| b != 0xFF)
    }

    #[test]
    fn boxplot_renders_two_groups() {
        let groups = vec![
            ("Consumer".to_string(), vec![1.0, 2.0, 3.0, 4.0, 10.0]),
            ("Corporate".to_string(), vec![-2.0, 0.5, 1.5, 2.5]),
        ];
        let buffer = ChartRenderer::profit_by_category_boxplot(&groups, &small_style()).unwrap();
        assert_eq!(buffer.len(), 320 * 240 * 3);
        assert!(has_ink(&buffer));
    }

    #[test]
    fn standalone_charts_render_into_buffers() {
        let style = small_style();

        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert!(has_ink(&ChartRenderer::sales_histogram(&values, &style).unwrap()));

        let pairs: Vec<(f64, f64)> = (0..50).map(|i| (i as f64, 0.5 * i as f64 - 3.0)).collect();
        assert!(has_ink(
            &ChartRenderer::sales_profit_scatter(&pairs, &style).unwrap()
        ));
        assert!(has_ink(
            &ChartRenderer::sales_profit_regression(&pairs, &style).unwrap()
        ));
    }

    #[test]
    fn heatmap_renders_annotated_cells() {
        let labels = vec!["Sales".to_string(), "Profit".to_string()];
        let matrix = vec![vec![1.0, -0.8], vec![f64::NAN, 1.0]];
        let buffer = ChartRenderer::correlation_heatmap(&labels, &matrix, &small_style()).unwrap();
        assert!(has_ink(&buffer));
    }

    #[test]
    fn monthly_line_handles_all_negative_totals() {
        let totals = [(100, -5.0), (131, -2.0)];
        let (w, h) = (320u32, 240u32);
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            draw_monthly_line(&root, &totals, "Sales by Month", "Month", "Sales").unwrap();
            root.present().unwrap();
        }
        assert!(has_ink(&buffer));
    }

    #[test]
    fn summary_figure_writes_the_png() {
        let months = Column::new("OrderMonth".into(), vec![Some(15340i32), Some(15371)])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            months,
            Column::new("Sales".into(), vec![10.0, 20.0]),
            Column::new("Profit".into(), vec![1.0, -2.0]),
            Column::new("Segment".into(), vec!["Consumer", "Corporate"]),
        ])
        .unwrap();
        let roles = RoleMap {
            order_date: Some("Order Date".to_string()),
            sales: Some("Sales".to_string()),
            profit: Some("Profit".to_string()),
            segment: Some("Segment".to_string()),
            ..Default::default()
        };

        let dir = std::env::temp_dir().join("storelens_renderer_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("overview.png");

        ChartRenderer::summary_figure(&df, &roles, &small_style(), path.to_str().unwrap())
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn bins_partition_the_value_range() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let bars = histogram_bins(&values, 5);
        assert_eq!(bars.len(), 5);
        assert_eq!(bars.iter().map(|&(_, _, c)| c).sum::<usize>(), values.len());
        assert!((bars[0].0 - 0.0).abs() < 1e-12);
        assert!((bars[4].1 - 9.0).abs() < 1e-12);
        // the maximum lands in the last (right-closed) bin
        assert_eq!(bars[4].2, 2);
    }

    #[test]
    fn bins_handle_degenerate_inputs() {
        assert!(histogram_bins(&[], 10).is_empty());
        let constant = histogram_bins(&[5.0, 5.0, 5.0], 4);
        assert_eq!(constant.iter().map(|&(_, _, c)| c).sum::<usize>(), 3);
    }

    #[test]
    fn diverging_color_hits_the_anchors() {
        assert_eq!(diverging_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(-1.0), RGBColor(0x2E, 0x5C, 0x8A));
        assert_eq!(diverging_color(1.0), RGBColor(0xC0, 0x3A, 0x3A));
        assert_eq!(diverging_color(f64::NAN), RGBColor(255, 255, 255));
    }

    #[test]
    fn padded_range_defaults_when_empty() {
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_range([2.0, 4.0].into_iter());
        assert!(lo < 2.0 && hi > 4.0);
    }
}
