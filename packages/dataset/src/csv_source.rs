use std::io::Read;
use std::path::Path;

use estat_density_area_models::AreaRecord;

use crate::columns::ColumnMap;
use crate::normalize::{RawRow, RowLoader};
use crate::{DatasetError, LoadReport};

pub fn read_path(path: &Path) -> Result<(Vec<AreaRecord>, LoadReport), DatasetError> {
    let file = std::fs::File::open(path)?;
    read(std::io::BufReader::new(file))
}

pub fn read<R: Read>(reader: R) -> Result<(Vec<AreaRecord>, LoadReport), DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::resolve(reader.headers()?.iter())?;
    let mut loader = RowLoader::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |index: usize| record.get(index);
        let optional = |index: Option<usize>| index.and_then(|i| record.get(i));

        loader.push(&RawRow {
            index: i + 1,
            area: cell(columns.area),
            area_name: optional(columns.area_name),
            industry_code: cell(columns.industry_code),
            industry_name: optional(columns.industry_name),
            establishments: cell(columns.establishments),
            employees: cell(columns.employees),
            population: cell(columns.population),
            time_period: optional(columns.time_period),
        });
    }

    Ok(loader.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_trailing_cells_load_as_null() {
        let data = "area,sicCode,establishments,employees,population\n\
                    14101,A,1,10,280000\n\
                    14102,A\n";
        let (records, report) = read(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].population, 0);
        assert_eq!(report.rows_rejected, 0);
        assert_eq!(report.suppressed_cells, 3);
    }

    #[test]
    fn quoted_thousands() {
        let data = "areaCode,industryCode,establishments,employees,population,timePeriod\n\
                    \"01100\",E,\"1,200\",\"34,000\",\"1,952,356\",2020\n";
        let (records, _) = read(data.as_bytes()).unwrap();
        assert_eq!(records[0].area_code.as_str(), "01100");
        assert_eq!(records[0].employees, 34_000);
        assert_eq!(records[0].population, 1_952_356);
        assert_eq!(records[0].time_period, "2020");
    }
}
