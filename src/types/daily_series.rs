use crate::types::variable::Variable;
use chrono::NaiveDate;

/// One aggregated scalar for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// Scalars per day for one variable, in the order the source files were read.
///
/// Dates are the files' own timestamps and are only meaningful for grouping cells
/// into days; the aligner re-addresses the values onto the historical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    variable: Variable,
    values: Vec<DailyValue>,
}

impl DailySeries {
    pub fn new(variable: Variable, values: Vec<DailyValue>) -> Self {
        Self { variable, values }
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn values(&self) -> &[DailyValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<DailyValue> {
        self.values
    }
}
