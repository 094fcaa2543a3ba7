//! Tests for table assembly

use std::io::Cursor;

use super::assembler::TableAssembler;
use crate::app::models::Table;
use crate::app::services::record_io::RecordReader;
use crate::config::GeotableConfig;

mod polygon_tests;

/// Assemble one table from ASCII text
pub fn table_from(text: &str, config: &GeotableConfig) -> Option<Table> {
    let mut reader = RecordReader::from_reader(Cursor::new(text.to_string()), config).unwrap();
    TableAssembler::new(config).read_table(&mut reader).unwrap()
}
