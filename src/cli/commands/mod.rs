//! Command implementations.

pub mod export;
pub mod import;
pub mod sync;

use tabled::{Table, Tabled, settings::Style};

/// One row of the end-of-run summary table.
#[derive(Tabled)]
pub(crate) struct CountRow {
    #[tabled(rename = "Result")]
    pub metric: &'static str,
    #[tabled(rename = "Count")]
    pub count: usize,
}

pub(crate) fn counts_table(rows: Vec<CountRow>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
