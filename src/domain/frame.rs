//! A small named-column table.
//!
//! Training partitions and single-row inference inputs share this shape so the
//! column transformer can look columns up by name in both cases.

use crate::domain::{Record, Target};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. All columns must have the same length and unique names.
    pub fn push(&mut self, name: impl Into<String>, data: ColumnData) -> Result<(), AppError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(AppError::schema(format!("Duplicate column `{name}`.")));
        }
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(AppError::schema(format!(
                    "Column `{name}` has {} rows, expected {}.",
                    data.len(),
                    first.data.len()
                )));
            }
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    pub fn with_numeric(mut self, name: &str, values: Vec<f64>) -> Result<Self, AppError> {
        self.push(name, ColumnData::Numeric(values))?;
        Ok(self)
    }

    pub fn with_categorical(mut self, name: &str, values: Vec<String>) -> Result<Self, AppError> {
        self.push(name, ColumnData::Categorical(values))?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64], AppError> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(v)) => Ok(v),
            Some(ColumnData::Categorical(_)) => Err(AppError::schema(format!(
                "Column `{name}` must be numeric."
            ))),
            None => Err(AppError::schema(format!("Missing column `{name}`."))),
        }
    }

    pub fn categorical(&self, name: &str) -> Result<&[String], AppError> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Categorical(v)) => Ok(v),
            Some(ColumnData::Numeric(_)) => Err(AppError::schema(format!(
                "Column `{name}` must be categorical."
            ))),
            None => Err(AppError::schema(format!("Missing column `{name}`."))),
        }
    }

    /// Copy the given rows (in the given order) into a new frame.
    pub fn select_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
        }
    }

    /// Split records into the target's input frame and target vector.
    pub fn from_records(records: &[Record], target: Target) -> Result<(Frame, Vec<f64>), AppError> {
        let mut frame = Frame::new();
        for &name in target.feature_columns() {
            let data = if Target::is_categorical(name) {
                ColumnData::Categorical(
                    records
                        .iter()
                        .map(|r| r.categorical(name).unwrap_or_default().to_string())
                        .collect(),
                )
            } else {
                ColumnData::Numeric(
                    records
                        .iter()
                        .map(|r| r.numeric(name).unwrap_or(f64::NAN))
                        .collect(),
                )
            };
            frame.push(name, data)?;
        }

        let y = records
            .iter()
            .map(|r| r.numeric(target.column()).unwrap_or(f64::NAN))
            .collect();
        Ok((frame, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Clarity, Color, Cut};

    fn record(carat: f64, price: u32) -> Record {
        Record {
            carat,
            cut: Cut::Ideal,
            color: Color::E,
            clarity: Clarity::Si1,
            depth: 61.5,
            table: 55.0,
            price,
            x: 3.95,
            y: 3.98,
            z: 2.43,
        }
    }

    #[test]
    fn from_records_drops_the_target_column() {
        let records = vec![record(0.23, 326), record(0.31, 335)];
        let (frame, y) = Frame::from_records(&records, Target::Price).unwrap();
        assert_eq!(frame.column_names(), Target::Price.feature_columns());
        assert!(frame.column("price").is_none());
        assert_eq!(y, vec![326.0, 335.0]);

        let (frame, y) = Frame::from_records(&records, Target::Carat).unwrap();
        assert!(frame.column("carat").is_none());
        assert_eq!(frame.numeric("price").unwrap(), &[326.0, 335.0]);
        assert_eq!(y, vec![0.23, 0.31]);
    }

    #[test]
    fn push_rejects_ragged_and_duplicate_columns() {
        let frame = Frame::new().with_numeric("a", vec![1.0, 2.0]).unwrap();
        assert!(frame.clone().with_numeric("b", vec![1.0]).is_err());
        assert!(frame.with_numeric("a", vec![3.0, 4.0]).is_err());
    }

    #[test]
    fn typed_access_checks_column_kind() {
        let frame = Frame::new()
            .with_categorical("cut", vec!["Ideal".to_string()])
            .unwrap();
        assert!(frame.numeric("cut").is_err());
        assert!(frame.categorical("missing").is_err());
        assert_eq!(frame.categorical("cut").unwrap()[0], "Ideal");
    }

    #[test]
    fn select_rows_reorders() {
        let frame = Frame::new().with_numeric("a", vec![1.0, 2.0, 3.0]).unwrap();
        let picked = frame.select_rows(&[2, 0]);
        assert_eq!(picked.numeric("a").unwrap(), &[3.0, 1.0]);
    }
}
