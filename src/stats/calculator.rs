//! Statistics Calculator Module
//! Numeric extraction and the summary computations behind the charts.

use polars::prelude::*;
use std::collections::HashMap;

use crate::data::ORDER_MONTH;

/// Handles the numeric summaries the renderer consumes.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Extract a column as finite f64 values, skipping nulls and NaN.
    pub fn column_values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .ok()
            .and_then(|col| col.cast(&DataType::Float64).ok())
            .and_then(|col| col.f64().ok().cloned())
            .map(|ca| ca.into_iter().flatten().filter(|v| v.is_finite()).collect())
            .unwrap_or_default()
    }

    /// Extract rows where both columns hold a finite numeric value.
    pub fn paired_values(df: &DataFrame, x: &str, y: &str) -> Vec<(f64, f64)> {
        let Ok(xs) = df
            .column(x)
            .and_then(|col| col.cast(&DataType::Float64))
        else {
            return Vec::new();
        };
        let Ok(ys) = df
            .column(y)
            .and_then(|col| col.cast(&DataType::Float64))
        else {
            return Vec::new();
        };
        let (Ok(xs), Ok(ys)) = (xs.f64(), ys.f64()) else {
            return Vec::new();
        };

        xs.into_iter()
            .zip(ys)
            .filter_map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((a, b)),
                _ => None,
            })
            .collect()
    }

    /// Split a numeric column into per-group value lists, in first-seen
    /// group order. Null groups and non-finite values are skipped.
    pub fn grouped_values(df: &DataFrame, group: &str, value: &str) -> Vec<(String, Vec<f64>)> {
        let Ok(groups) = df.column(group) else {
            return Vec::new();
        };
        let Ok(values) = df.column(value).and_then(|c| c.cast(&DataType::Float64)) else {
            return Vec::new();
        };
        let Ok(values) = values.f64() else {
            return Vec::new();
        };

        let mut order: Vec<String> = Vec::new();
        let mut by_group: HashMap<String, Vec<f64>> = HashMap::new();
        for i in 0..df.height() {
            let (Ok(g), Some(v)) = (groups.get(i), values.get(i)) else {
                continue;
            };
            if g.is_null() || !v.is_finite() {
                continue;
            }
            let key = g.to_string().trim_matches('"').to_string();
            if !by_group.contains_key(&key) {
                order.push(key.clone());
            }
            by_group.entry(key).or_default().push(v);
        }

        order
            .into_iter()
            .map(|key| {
                let vals = by_group.remove(&key).unwrap_or_default();
                (key, vals)
            })
            .collect()
    }

    /// Column names with a numeric dtype.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Pearson correlation over paired samples. NaN when undefined.
    pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
        let n = pairs.len();
        if n < 2 {
            return f64::NAN;
        }

        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in pairs {
            cov += (x - mean_x) * (y - mean_y);
            var_x += (x - mean_x).powi(2);
            var_y += (y - mean_y).powi(2);
        }

        let denom = (var_x * var_y).sqrt();
        if denom == 0.0 {
            f64::NAN
        } else {
            cov / denom
        }
    }

    /// Pairwise-complete Pearson correlation matrix over the named columns.
    pub fn pearson_matrix(df: &DataFrame, names: &[String]) -> Vec<Vec<f64>> {
        let mut matrix = vec![vec![f64::NAN; names.len()]; names.len()];
        for (i, a) in names.iter().enumerate() {
            for (j, b) in names.iter().enumerate() {
                matrix[i][j] = if i == j {
                    1.0
                } else {
                    Self::pearson(&Self::paired_values(df, a, b))
                };
            }
        }
        matrix
    }

    /// Least-squares fit `y = slope * x + intercept`. None when degenerate.
    pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
        let n = pairs.len();
        if n < 2 {
            return None;
        }

        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        for (x, y) in pairs {
            cov += (x - mean_x) * (y - mean_y);
            var_x += (x - mean_x).powi(2);
        }

        if var_x == 0.0 {
            return None;
        }
        let slope = cov / var_x;
        Some((slope, mean_y - slope * mean_x))
    }

    /// Sum the sales column per `OrderMonth`, sorted chronologically.
    /// Returned as (days since epoch, total) pairs; null months are skipped.
    pub fn monthly_totals(df: &DataFrame, sales: &str) -> PolarsResult<Vec<(i32, f64)>> {
        let agg = df
            .clone()
            .lazy()
            .filter(col(ORDER_MONTH).is_not_null())
            .group_by([col(ORDER_MONTH)])
            .agg([col(sales).cast(DataType::Float64).sum()])
            .sort([ORDER_MONTH], Default::default())
            .collect()?;

        let months = agg.column(ORDER_MONTH)?;
        let totals = agg.column(sales)?.f64()?.clone();

        let mut out = Vec::with_capacity(agg.height());
        for i in 0..agg.height() {
            if let (AnyValue::Date(d), Some(total)) = (months.get(i)?, totals.get(i)) {
                out.push((d, total));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn pearson_detects_perfect_correlation() {
        let pos: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64)).collect();
        assert!((StatsCalculator::pearson(&pos) - 1.0).abs() < 1e-12);

        let neg: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, -3.0 * i as f64)).collect();
        assert!((StatsCalculator::pearson(&neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_nan_without_variance() {
        let flat = [(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)];
        assert!(StatsCalculator::pearson(&flat).is_nan());
        assert!(StatsCalculator::pearson(&[]).is_nan());
    }

    #[test]
    fn linear_fit_recovers_an_exact_line() {
        let pairs: Vec<(f64, f64)> = (0..20).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let (slope, intercept) = StatsCalculator::linear_fit(&pairs).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn paired_values_skip_incomplete_rows() {
        let df = df!(
            "Sales" => &[Some(1.0), None, Some(3.0)],
            "Profit" => &[Some(0.5), Some(0.2), None],
        )
        .unwrap();
        let pairs = StatsCalculator::paired_values(&df, "Sales", "Profit");
        assert_eq!(pairs, vec![(1.0, 0.5)]);
    }

    #[test]
    fn grouped_values_preserve_first_seen_order() {
        let df = df!(
            "Segment" => &[Some("Consumer"), Some("Corporate"), Some("Consumer"), None],
            "Profit" => &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
        )
        .unwrap();
        let groups = StatsCalculator::grouped_values(&df, "Segment", "Profit");
        assert_eq!(
            groups,
            vec![
                ("Consumer".to_string(), vec![1.0, 3.0]),
                ("Corporate".to_string(), vec![2.0]),
            ]
        );
    }

    #[test]
    fn numeric_columns_exclude_strings_and_dates() {
        let months = Column::new("OrderMonth".into(), vec![Some(0i32), Some(31)])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            months,
            Column::new("Sales".into(), vec![1.0, 2.0]),
            Column::new("Category".into(), vec!["A", "B"]),
        ])
        .unwrap();
        assert_eq!(StatsCalculator::numeric_columns(&df), vec!["Sales"]);
    }

    #[test]
    fn monthly_totals_aggregate_and_sort() {
        let months = Column::new(
            "OrderMonth".into(),
            vec![Some(131i32), Some(100), Some(100), None],
        )
        .cast(&DataType::Date)
        .unwrap();
        let df = DataFrame::new(vec![
            months,
            Column::new("Sales".into(), vec![3.0, 1.0, 2.0, 9.0]),
        ])
        .unwrap();

        let totals = StatsCalculator::monthly_totals(&df, "Sales").unwrap();
        assert_eq!(totals, vec![(100, 3.0), (131, 3.0)]);
    }
}
