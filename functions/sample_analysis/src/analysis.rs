use crate::dataset::{Table, FULL_NAME, ID, SENIORITY, YEARS_IN_COMPANY};
use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Aggregates over a table, grouped by seniority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub number_of_columns: usize,
    pub number_of_rows: usize,
    pub seniority_counts: BTreeMap<String, usize>,
    // Whole number when every year count is whole
    pub total_years: Number,
    pub avg_years_in_company: f64,
    pub grouped_by_seniority: BTreeMap<String, Vec<Map<String, Value>>>,
    pub avg_years_by_seniority: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    MissingColumn(String),
    // Averages are undefined without rows
    EmptyTable,
    RaggedRow { row: usize, expected: usize, found: usize },
    InvalidValue { row: usize, column: String, value: Value },
    NonFiniteTotal,
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MissingColumn(column) => write!(f, "missing column '{column}'"),
            AnalysisError::EmptyTable => f.write_str("table has no rows"),
            AnalysisError::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} values, expected {expected}"),
            AnalysisError::InvalidValue { row, column, value } => {
                write!(f, "row {row} has invalid '{column}' value {value}")
            }
            AnalysisError::NonFiniteTotal => f.write_str("total of years is not a finite number"),
        }
    }
}

impl std::error::Error for AnalysisError {}

pub fn analyze(table: &Table) -> Result<AnalysisReport, AnalysisError> {
    let seniority_idx: usize = column(table, SENIORITY)?;
    let years_idx: usize = column(table, YEARS_IN_COMPANY)?;

    if table.rows.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    let mut seniority_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut grouped_by_seniority: BTreeMap<String, Vec<Map<String, Value>>> = BTreeMap::new();
    let mut years_by_seniority: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut total_years: f64 = 0.0;
    let mut integral_total: Option<i64> = Some(0);

    for (index, row) in table.rows.iter().enumerate() {
        if row.len() != table.columns.len() {
            return Err(AnalysisError::RaggedRow {
                row: index,
                expected: table.columns.len(),
                found: row.len(),
            });
        }

        let seniority: String = row[seniority_idx]
            .as_str()
            .ok_or_else(|| invalid(index, SENIORITY, &row[seniority_idx]))?
            .to_string();
        let years: f64 = row[years_idx]
            .as_f64()
            .ok_or_else(|| invalid(index, YEARS_IN_COMPANY, &row[years_idx]))?;

        *seniority_counts.entry(seniority.clone()).or_default() += 1;
        total_years += years;
        integral_total = integral_total
            .zip(row[years_idx].as_i64())
            .and_then(|(total, years)| total.checked_add(years));

        grouped_by_seniority
            .entry(seniority.clone())
            .or_default()
            .push(table.row_map(row));
        years_by_seniority.entry(seniority).or_default().push(years);
    }

    let avg_years_by_seniority: BTreeMap<String, f64> = years_by_seniority
        .iter()
        .filter_map(|(seniority, years)| Some((seniority.clone(), mean(years)?)))
        .collect();

    Ok(AnalysisReport {
        number_of_columns: table.columns.len(),
        number_of_rows: table.rows.len(),
        seniority_counts,
        total_years: total(integral_total, total_years)?,
        avg_years_in_company: round2(total_years / table.rows.len() as f64),
        grouped_by_seniority,
        avg_years_by_seniority,
    })
}

/// Identifier and name of every row, keyed by identifier.
pub fn project_rows(table: &Table) -> Result<BTreeMap<String, Value>, AnalysisError> {
    let id_idx: usize = column(table, ID)?;
    let name_idx: usize = column(table, FULL_NAME)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let id: &Value = row.get(id_idx).ok_or_else(|| invalid(index, ID, &Value::Null))?;
            let name: &Value = row
                .get(name_idx)
                .ok_or_else(|| invalid(index, FULL_NAME, &Value::Null))?;

            let key: String = match id {
                Value::String(id) => id.clone(),
                other => other.to_string(),
            };

            Ok((key, json!({ "Full_Name": name, "ID": id })))
        })
        .collect()
}

fn column(table: &Table, name: &str) -> Result<usize, AnalysisError> {
    table
        .column_index(name)
        .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
}

fn invalid(row: usize, column: &str, value: &Value) -> AnalysisError {
    AnalysisError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.clone(),
    }
}

fn total(integral: Option<i64>, float: f64) -> Result<Number, AnalysisError> {
    match integral {
        Some(total) => Ok(Number::from(total)),
        None => Number::from_f64(float).ok_or(AnalysisError::NonFiniteTotal),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
