//! Per-student summary table (the document's EFC tab)

use crate::table::Table;

/// Copy the configured columns from the enriched roster; columns the roster
/// does not have are hand-entry columns and start blank after the copied ones.
///
/// The first configured field is the student id and is always kept first.
pub fn build_summary(roster: &Table, fields: &[String]) -> Table {
    let Some((index, rest)) = fields.split_first() else {
        return Table::default();
    };

    let mut columns: Vec<&str> = vec![index.as_str()];
    columns.extend(
        rest.iter()
            .filter(|f| roster.has_column(f))
            .map(String::as_str),
    );
    columns.extend(
        rest.iter()
            .filter(|f| !roster.has_column(f))
            .map(String::as_str),
    );

    let summary = roster.select(&columns);
    log::debug!(
        "Summary table: {} students, {} columns",
        summary.len(),
        summary.columns().len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_blank_columns_follow_copied_ones() {
        let roster = Table::from_rows(
            ["StudentID", "LastFirst", "EFC", "GPA"],
            vec![vec![Value::Int(1001), Value::from("Doe, Jane"), Value::Int(0), Value::Float(3.2)]],
        );
        let fields: Vec<String> = ["StudentID", "Notes", "LastFirst", "EFC"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let summary = build_summary(&roster, &fields);
        assert_eq!(
            summary.columns(),
            &["StudentID".to_string(), "LastFirst".to_string(), "EFC".to_string(), "Notes".to_string()]
        );
        assert_eq!(summary.rows()[0][3], Value::Null);
        assert_eq!(summary.rows()[0][0], Value::Int(1001));
    }

    #[test]
    fn test_no_fields() {
        let roster = Table::new(["StudentID"]);
        assert!(build_summary(&roster, &[]).columns().is_empty());
    }
}
