use std::path::Path;

use duckdb::Connection;
use estat_density_area_models::AreaRecord;

use crate::columns::ColumnMap;
use crate::normalize::{RawRow, RowLoader};
use crate::{DatasetError, LoadReport};

/// Reads a Parquet file through an in-memory `DuckDB` connection.
///
/// Every column is cast to `VARCHAR` so that integer, float, and string
/// encodings of the same field all pass through the same validation as
/// CSV input.
pub fn read_path(path: &Path) -> Result<(Vec<AreaRecord>, LoadReport), DatasetError> {
    let conn = Connection::open_in_memory()?;
    let source = format!(
        "read_parquet('{}')",
        path.display().to_string().replace('\'', "''")
    );

    let headers = {
        let mut stmt = conn.prepare(&format!("DESCRIBE SELECT * FROM {source}"))?;
        let mut rows = stmt.query([])?;
        let mut headers = Vec::new();
        while let Some(row) = rows.next()? {
            headers.push(row.get::<_, String>(0)?);
        }
        headers
    };
    log::debug!("Parquet columns: {}", headers.join(", "));

    let columns = ColumnMap::resolve(&headers)?;
    let select = |index: Option<usize>| {
        index.map_or_else(
            || "NULL".to_string(),
            |i| format!("CAST(\"{}\" AS VARCHAR)", headers[i].replace('"', "\"\"")),
        )
    };
    let sql = format!(
        "SELECT {}, {}, {}, {}, {}, {}, {}, {} FROM {source}",
        select(Some(columns.area)),
        select(columns.area_name),
        select(Some(columns.industry_code)),
        select(columns.industry_name),
        select(Some(columns.establishments)),
        select(Some(columns.employees)),
        select(Some(columns.population)),
        select(columns.time_period),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut loader = RowLoader::new();
    let mut index = 0;

    while let Some(row) = rows.next()? {
        index += 1;
        let cells: Vec<Option<String>> = (0..8)
            .map(|i| row.get::<_, Option<String>>(i))
            .collect::<Result<_, _>>()?;
        let cell = |i: usize| cells[i].as_deref();

        loader.push(&RawRow {
            index,
            area: cell(0),
            area_name: cell(1),
            industry_code: cell(2),
            industry_name: cell(3),
            establishments: cell(4),
            employees: cell(5),
            population: cell(6),
            time_period: cell(7),
        });
    }

    Ok(loader.finish())
}
