//! Tests for dataset output

use std::io::Cursor;

use crate::app::models::Dataset;
use crate::app::services::record_io::RecordReader;
use crate::app::services::table_assembly::TableAssembler;
use crate::config::GeotableConfig;


/// Assemble a dataset with one table per text
pub fn dataset_from(texts: &[&str], config: &GeotableConfig) -> Dataset {
    let readers: Vec<RecordReader> = texts
        .iter()
        .map(|text| RecordReader::from_reader(Cursor::new(text.to_string()), config).unwrap())
        .collect();
    TableAssembler::new(config)
        .read_dataset(readers)
        .unwrap()
        .unwrap()
}
