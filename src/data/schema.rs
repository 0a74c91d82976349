//! Schema Normalizer
//! Reconciles variant column names to a fixed set of semantic roles and
//! derives the cleaned table that every chart step consumes.

use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Name of the derived first-of-month column.
pub const ORDER_MONTH: &str = "OrderMonth";

/// Accepted calendar date layouts, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// A canonical semantic meaning that may be satisfied by one of several
/// differently-named source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    OrderDate,
    ShipDate,
    Sales,
    Profit,
    Quantity,
    Discount,
    Category,
    SubCategory,
    Segment,
    Region,
}

impl Role {
    /// Candidate source-column names, covering the English and Spanish
    /// dataset variants. Order encodes preference: first match wins.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Role::OrderDate => &["Order Date", "OrderDate", "Date"],
            Role::ShipDate => &["Ship Date", "ShipDate"],
            Role::Sales => &["Sales", "Venta", "Ventas"],
            Role::Profit => &["Profit", "Beneficio", "Profit/Loss"],
            Role::Quantity => &["Quantity", "Qty", "Unidades"],
            Role::Discount => &["Discount", "Descuento"],
            Role::Category => &["Category", "Categoría"],
            Role::SubCategory => &["Sub-Category", "SubCategory", "Subcategoría"],
            Role::Segment => &["Segment", "Segmento"],
            Role::Region => &["Region", "Región"],
        }
    }
}

/// Resolved binding from each role to an actual source column name, or `None`
/// when no column satisfies the role. Built once per run, never mutated.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    pub order_date: Option<String>,
    pub ship_date: Option<String>,
    pub sales: Option<String>,
    pub profit: Option<String>,
    pub quantity: Option<String>,
    pub discount: Option<String>,
    pub category: Option<String>,
    pub subcat: Option<String>,
    pub segment: Option<String>,
    pub region: Option<String>,
}

impl RoleMap {
    pub fn resolve(df: &DataFrame) -> RoleMap {
        RoleMap {
            order_date: resolve_role(df, Role::OrderDate.candidates()),
            ship_date: resolve_role(df, Role::ShipDate.candidates()),
            sales: resolve_role(df, Role::Sales.candidates()),
            profit: resolve_role(df, Role::Profit.candidates()),
            quantity: resolve_role(df, Role::Quantity.candidates()),
            discount: resolve_role(df, Role::Discount.candidates()),
            category: resolve_role(df, Role::Category.candidates()),
            subcat: resolve_role(df, Role::SubCategory.candidates()),
            segment: resolve_role(df, Role::Segment.candidates()),
            region: resolve_role(df, Role::Region.candidates()),
        }
    }
}

impl fmt::Display for RoleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = [
            ("order_date", &self.order_date),
            ("ship_date", &self.ship_date),
            ("sales", &self.sales),
            ("profit", &self.profit),
            ("quantity", &self.quantity),
            ("discount", &self.discount),
            ("category", &self.category),
            ("subcat", &self.subcat),
            ("segment", &self.segment),
            ("region", &self.region),
        ];
        for (i, (role, column)) in pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{role}={}", column.as_deref().unwrap_or("-"))?;
        }
        Ok(())
    }
}

/// Find the first candidate that names a column in `df`, ignoring case and
/// surrounding whitespace. A second pass additionally strips spaces and
/// hyphens from both sides. `None` is the normal outcome for optional roles,
/// not an error.
pub fn resolve_role(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let exact: HashMap<String, &String> =
        names.iter().map(|c| (c.trim().to_lowercase(), c)).collect();
    for cand in candidates {
        if let Some(original) = exact.get(&cand.trim().to_lowercase()) {
            return Some((*original).clone());
        }
    }

    let stripped: HashMap<String, &String> = names
        .iter()
        .map(|c| (c.to_lowercase().replace([' ', '-'], ""), c))
        .collect();
    for cand in candidates {
        if let Some(original) = stripped.get(&cand.to_lowercase().replace([' ', '-'], "")) {
            return Some((*original).clone());
        }
    }

    None
}

/// Build the cleaned table: resolve roles, parse dates, derive `OrderMonth`,
/// project onto recognized columns, drop exact duplicate rows, and zero-fill
/// missing sales/profit values. Row order is preserved from the input.
pub fn normalize(df: &DataFrame) -> Result<(DataFrame, RoleMap), SchemaError> {
    let roles = RoleMap::resolve(df);
    debug!(%roles, "resolved semantic roles");

    let mut columns: Vec<Column> = Vec::new();
    let mut order_month: Option<Column> = None;

    if let Some(name) = &roles.order_date {
        let (dates, months) = parse_date_column(df.column(name)?)?;
        columns.push(dates);
        order_month = Some(months);
    }
    if let Some(name) = &roles.ship_date {
        // Candidate lists are disjoint from order_date, so this is always a
        // distinct column. Parsed for collaborators; unused downstream.
        let (dates, _) = parse_date_column(df.column(name)?)?;
        columns.push(dates);
    }
    for name in [
        &roles.sales,
        &roles.profit,
        &roles.quantity,
        &roles.discount,
        &roles.category,
        &roles.subcat,
        &roles.segment,
        &roles.region,
    ]
    .into_iter()
    .flatten()
    {
        columns.push(df.column(name)?.clone());
    }
    if let Some(months) = order_month {
        columns.push(months);
    }

    let clean = DataFrame::new(columns)?;
    let mut clean = drop_duplicate_rows(&clean)?;

    for name in [&roles.sales, &roles.profit].into_iter().flatten() {
        if clean.column(name)?.null_count() > 0 {
            let filled = clean
                .column(name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?
                .fill_null(FillNullStrategy::Zero)?;
            clean.with_column(filled.into_column())?;
        }
    }

    Ok((clean, roles))
}

/// Parse a column of raw date values. Unparseable entries become null rather
/// than an error. Returns the parsed Date column (same name) and the derived
/// first-of-month column.
fn parse_date_column(column: &Column) -> Result<(Column, Column), SchemaError> {
    let mut days: Vec<Option<i32>> = Vec::with_capacity(column.len());
    let mut months: Vec<Option<i32>> = Vec::with_capacity(column.len());

    for i in 0..column.len() {
        let date = match column.get(i)? {
            AnyValue::Date(d) => Some(NaiveDate::default() + Duration::days(d as i64)),
            AnyValue::String(s) => parse_date(s),
            AnyValue::StringOwned(s) => parse_date(s.as_str()),
            _ => None,
        };
        days.push(date.map(epoch_days));
        months.push(date.map(|d| epoch_days(truncate_to_month(d))));
    }

    let dates = Column::new(column.name().clone(), days).cast(&DataType::Date)?;
    let months = Column::new(ORDER_MONTH.into(), months).cast(&DataType::Date)?;
    Ok((dates, months))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn truncate_to_month(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d)
}

/// Days since 1970-01-01, the physical representation of a polars Date.
fn epoch_days(d: NaiveDate) -> i32 {
    (d - NaiveDate::default()).num_days() as i32
}

/// Remove exact full-row duplicates, keeping the first occurrence.
fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame, SchemaError> {
    if df.width() == 0 {
        return Ok(df.clone());
    }

    let columns = df.get_columns();
    let mut seen: HashSet<String> = HashSet::with_capacity(df.height());
    let mut keep: Vec<bool> = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let mut key = String::new();
        for column in columns {
            key.push_str(&column.get(i)?.to_string());
            key.push('\u{1f}');
        }
        keep.push(seen.insert(key));
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}
