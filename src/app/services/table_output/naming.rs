//! Output file naming for per-table and per-segment writes

use std::path::PathBuf;

use crate::app::models::{Segment, Table, WriteMode};
use crate::{Error, Result};

/// Placeholder replaced by the table number
pub const TABLE_PLACEHOLDER: &str = "{table}";
/// Placeholder replaced by the segment number within its table
pub const SEGMENT_PLACEHOLDER: &str = "{segment}";

/// Substitute table and segment numbers into a file name template
pub fn render_template(template: &str, table: usize, segment: usize) -> PathBuf {
    PathBuf::from(
        template
            .replace(TABLE_PLACEHOLDER, &table.to_string())
            .replace(SEGMENT_PLACEHOLDER, &segment.to_string()),
    )
}

/// File for one table, preferring the table's own override
pub fn table_path(table: &Table, template: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = &table.output_file {
        return Ok(path.clone());
    }
    template
        .map(|t| render_template(t, table.id, 0))
        .ok_or_else(|| {
            Error::configuration(format!(
                "Table {} has no output file and no file template is set",
                table.id
            ))
        })
}

/// File for one segment, preferring the segment's own override
pub fn segment_path(
    table: &Table,
    index: usize,
    segment: &Segment,
    template: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = &segment.output_file {
        return Ok(path.clone());
    }
    template
        .map(|t| render_template(t, table.id, index))
        .ok_or_else(|| {
            Error::configuration(format!(
                "Segment {} of table {} has no output file and no file template is set",
                index, table.id
            ))
        })
}

/// Check a template can tell apart every file `mode` produces
pub fn check_template(mode: WriteMode, template: &str) -> Result<()> {
    let missing = match mode {
        WriteMode::SingleStream => None,
        WriteMode::PerTable => (!template.contains(TABLE_PLACEHOLDER)).then_some(TABLE_PLACEHOLDER),
        WriteMode::PerSegment => {
            (!template.contains(SEGMENT_PLACEHOLDER)).then_some(SEGMENT_PLACEHOLDER)
        }
    };
    match missing {
        Some(placeholder) => Err(Error::configuration(format!(
            "File template '{}' needs a {} placeholder for {:?} output",
            template, placeholder, mode
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("out/t{table}_s{segment}.txt", 2, 7),
            PathBuf::from("out/t2_s7.txt")
        );
        assert_eq!(render_template("all.txt", 3, 1), PathBuf::from("all.txt"));
    }

    #[test]
    fn test_overrides_win_over_template() {
        let mut table = Table::new(2);
        table.id = 4;
        assert_eq!(
            table_path(&table, Some("t{table}.txt")).unwrap(),
            PathBuf::from("t4.txt")
        );
        assert!(table_path(&table, None).is_err());

        table.output_file = Some(PathBuf::from("named.txt"));
        assert_eq!(table_path(&table, None).unwrap(), PathBuf::from("named.txt"));

        let mut segment = Segment::new();
        assert_eq!(
            segment_path(&table, 1, &segment, Some("s{segment}.txt")).unwrap(),
            PathBuf::from("s1.txt")
        );
        segment.output_file = Some(PathBuf::from("own.txt"));
        assert_eq!(
            segment_path(&table, 1, &segment, None).unwrap(),
            PathBuf::from("own.txt")
        );
    }

    #[test]
    fn test_check_template() {
        assert!(check_template(WriteMode::PerTable, "t{table}.txt").is_ok());
        assert!(check_template(WriteMode::PerTable, "t.txt").is_err());
        assert!(check_template(WriteMode::PerSegment, "t{table}.txt").is_err());
        assert!(check_template(WriteMode::PerSegment, "t{table}_{segment}.txt").is_ok());
        assert!(check_template(WriteMode::SingleStream, "all.txt").is_ok());
    }
}
