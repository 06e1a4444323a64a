use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::pipeline::ReportError;
use crate::utils::excel_serial_to_string;

/// Type alias for a sheet row: 1-based row number and normalized cell texts
pub type SheetRow = (usize, Vec<String>);

/// Rectangular region of a sheet, 1-based and inclusive.
///
/// Open maxima extend to the last used row/column of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub min_row: u32,
    pub max_row: Option<u32>,
    pub min_col: u32,
    pub max_col: Option<u32>,
}

impl Area {
    pub fn new(min_row: u32, max_row: Option<u32>, min_col: u32, max_col: Option<u32>) -> Self {
        Area {
            min_row,
            max_row,
            min_col,
            max_col,
        }
    }

    /// Rows from `min_row` to the end of the sheet within fixed columns.
    pub fn columns_from(min_row: u32, min_col: u32, max_col: u32) -> Self {
        Area::new(min_row, None, min_col, Some(max_col))
    }
}

/// A sheet addressed by name or by zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRef<'a> {
    Name(&'a str),
    Index(usize),
}

/// Tabular reader over the sheets of one workbook.
pub trait SheetSource {
    fn sheet_names(&self) -> Vec<String>;

    /// Read the non-empty rows of `area`.
    ///
    /// Returns `Ok(None)` when the sheet does not exist.
    fn read_region(
        &mut self,
        sheet: SheetRef<'_>,
        area: Area,
    ) -> Result<Option<Vec<SheetRow>>, ReportError>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|sheet| sheet == name)
    }

    /// Text of a single cell (1-based), `None` when the sheet or cell is empty.
    fn cell(
        &mut self,
        sheet: SheetRef<'_>,
        row: u32,
        col: u32,
    ) -> Result<Option<String>, ReportError> {
        let rows = self.read_region(sheet, Area::new(row, Some(row), col, Some(col)))?;
        Ok(rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(|(_, cells)| cells.into_iter().next())
            .filter(|text| !text.is_empty()))
    }
}

/// `.xlsx`/`.xlsm` workbook read through calamine.
pub struct XlsxWorkbook {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl XlsxWorkbook {
    pub fn open(path: &Path) -> Result<Self, ReportError> {
        let workbook = open_workbook::<Xlsx<_>, _>(path).map_err(|e| ReportError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(XlsxWorkbook {
            path: path.to_path_buf(),
            workbook,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetSource for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_region(
        &mut self,
        sheet: SheetRef<'_>,
        area: Area,
    ) -> Result<Option<Vec<SheetRow>>, ReportError> {
        let range = match sheet {
            SheetRef::Name(name) => {
                if !self.has_sheet(name) {
                    return Ok(None);
                }
                self.workbook.worksheet_range(name)
            }
            SheetRef::Index(index) => match self.workbook.worksheet_range_at(index) {
                Some(range) => range,
                None => return Ok(None),
            },
        };
        let range = range.map_err(|e| ReportError::Workbook {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        Ok(Some(rows_in_area(&range, area)))
    }
}

/// Collect the rows of `area`, skipping rows whose cells are all empty.
fn rows_in_area(range: &Range<Data>, area: Area) -> Vec<SheetRow> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    let max_row = area.max_row.unwrap_or(end_row + 1);
    let max_col = area.max_col.unwrap_or(end_col + 1);

    let mut rows = Vec::new();
    for row in area.min_row.max(1)..=max_row {
        let cells: Vec<String> = (area.min_col.max(1)..=max_col)
            .map(|col| {
                range
                    .get_value((row - 1, col - 1))
                    .map(cell_to_string)
                    .unwrap_or_default()
            })
            .collect();
        if cells.iter().any(|cell| !cell.is_empty()) {
            rows.push((row as usize, cells));
        }
    }
    rows
}

/// Normalize a cell to text; numeric zero stays "0".
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => {
            excel_serial_to_string(dt.as_f64()).unwrap_or_else(|| dt.as_f64().to_string())
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    }
}
