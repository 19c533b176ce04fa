//! Renders the grounding schema text for the generation pipeline.
//!
//! A free function over `get_tables()` output rather than shared adapter
//! state, so both adapter variants reuse it without a common base.

use crate::models::TableInfo;
use crate::services::database::DatabaseType;

/// Human-readable table/column description followed by example queries in the
/// adapter's own dialect. Terse enough for a model context budget, complete
/// enough to disambiguate column names across tables.
pub fn render_schema_text(tables: &[TableInfo], db_type: DatabaseType) -> String {
    let mut schema = String::from("Таблицы в базе данных:\n\n");

    for (index, table) in tables.iter().enumerate() {
        schema.push_str(&format!("{}. {}:\n", index + 1, table.name));
        for column in &table.columns {
            let nullable = if column.nullable { " (nullable)" } else { "" };
            schema.push_str(&format!(
                "   - {}: {}{}\n",
                column.name, column.data_type, nullable
            ));
        }
        schema.push('\n');
    }

    match db_type {
        DatabaseType::PostgreSql => schema.push_str(
            "\nПримеры PostgreSQL запросов:\n\
             - SELECT * FROM employees WHERE department = 'IT';\n\
             - SELECT name, salary FROM employees ORDER BY salary DESC LIMIT 5;\n\
             - SELECT COUNT(*) FROM sales WHERE sale_date >= CURRENT_DATE - INTERVAL '30 days';",
        ),
        DatabaseType::ClickHouse => schema.push_str(
            "\nПримеры ClickHouse запросов:\n\
             - SELECT * FROM employees WHERE department = 'IT';\n\
             - SELECT name, salary FROM employees ORDER BY salary DESC LIMIT 5;\n\
             - SELECT count() FROM sales WHERE sale_date >= today() - 30;",
        ),
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnInfo;

    fn sample_tables() -> Vec<TableInfo> {
        vec![
            TableInfo::new(
                "employees",
                vec![
                    ColumnInfo::new("id", "integer", false),
                    ColumnInfo::new("name", "text", false),
                    ColumnInfo::new("salary", "integer", true),
                ],
            ),
            TableInfo::new(
                "products",
                vec![
                    ColumnInfo::new("id", "integer", false),
                    ColumnInfo::new("price", "numeric", true),
                ],
            ),
        ]
    }

    #[test]
    fn test_contains_all_tables_and_columns_in_order() {
        let text = render_schema_text(&sample_tables(), DatabaseType::PostgreSql);

        assert!(text.contains("1. employees:"));
        assert!(text.contains("2. products:"));
        assert!(text.contains("- id: integer"));
        assert!(text.contains("- name: text"));
        assert!(text.contains("- salary: integer (nullable)"));
        assert!(text.contains("- price: numeric (nullable)"));

        // Column-definition order is preserved
        let id_pos = text.find("- id: integer").unwrap();
        let name_pos = text.find("- name: text").unwrap();
        let salary_pos = text.find("- salary: integer").unwrap();
        assert!(id_pos < name_pos && name_pos < salary_pos);
    }

    #[test]
    fn test_examples_follow_the_dialect() {
        let pg = render_schema_text(&sample_tables(), DatabaseType::PostgreSql);
        assert!(pg.contains("Примеры PostgreSQL запросов"));
        assert!(pg.contains("INTERVAL '30 days'"));

        let ch = render_schema_text(&sample_tables(), DatabaseType::ClickHouse);
        assert!(ch.contains("Примеры ClickHouse запросов"));
        assert!(ch.contains("today() - 30"));
    }

    #[test]
    fn test_empty_schema_still_renders_header() {
        let text = render_schema_text(&[], DatabaseType::PostgreSql);
        assert!(text.starts_with("Таблицы в базе данных:"));
    }
}
