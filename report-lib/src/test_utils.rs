// Test utilities available to both unit and integration tests
// Only compiled when testing or with the test feature

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::diagnostics::{DataQualityIssue, Diagnostics};
use crate::model::RawRow;
use crate::pipeline::ReportError;
use crate::resources::{FileCategory, FileResolver};
use crate::workbook::{Area, SheetRef, SheetRow, SheetSource};

/// Builds a results-sheet row; source rows count from 2 like the real sheet.
pub fn raw_row(cells: [&str; 7], index: usize) -> RawRow {
    let cells: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
    RawRow::from_cells(&cells, index + 2)
}

/// Numbers the given cell arrays as consecutive sheet rows.
pub fn raw_rows(rows: &[[&str; 7]]) -> Vec<RawRow> {
    rows.iter()
        .enumerate()
        .map(|(i, cells)| raw_row(*cells, i))
        .collect()
}

/// In-memory workbook; every sheet is a grid addressed from A1.
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    sheets: Vec<(String, Vec<Vec<String>>)>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: &[&[&str]]) -> Self {
        let grid = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        self.sheets.push((name.to_string(), grid));
        self
    }

    pub fn without_sheet(mut self, name: &str) -> Self {
        self.sheets.retain(|(sheet, _)| sheet != name);
        self
    }

    /// Replace the text of one cell (1-based), growing the grid as needed.
    pub fn with_cell(mut self, sheet: &str, row: usize, col: usize, text: &str) -> Self {
        if let Some((_, grid)) = self.sheets.iter_mut().find(|(name, _)| name == sheet) {
            if grid.len() < row {
                grid.resize(row, Vec::new());
            }
            let cells = &mut grid[row - 1];
            if cells.len() < col {
                cells.resize(col, String::new());
            }
            cells[col - 1] = text.to_string();
        }
        self
    }

    /// Sheets in workbook order, for writing the same data to a real file.
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &[Vec<String>])> {
        self.sheets
            .iter()
            .map(|(name, grid)| (name.as_str(), grid.as_slice()))
    }

    fn grid(&self, sheet: SheetRef<'_>) -> Option<&Vec<Vec<String>>> {
        match sheet {
            SheetRef::Name(name) => self
                .sheets
                .iter()
                .find(|(sheet, _)| sheet == name)
                .map(|(_, grid)| grid),
            SheetRef::Index(index) => self.sheets.get(index).map(|(_, grid)| grid),
        }
    }
}

impl SheetSource for MemorySheets {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_region(
        &mut self,
        sheet: SheetRef<'_>,
        area: Area,
    ) -> Result<Option<Vec<SheetRow>>, ReportError> {
        let Some(grid) = self.grid(sheet) else {
            return Ok(None);
        };
        let width = grid.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let max_row = area.max_row.unwrap_or(grid.len() as u32);
        let max_col = area.max_col.unwrap_or(width);

        let mut rows = Vec::new();
        for row in area.min_row.max(1)..=max_row {
            let cells: Vec<String> = (area.min_col.max(1)..=max_col)
                .map(|col| {
                    grid.get(row as usize - 1)
                        .and_then(|cells| cells.get(col as usize - 1))
                        .map(|cell| cell.trim().to_string())
                        .unwrap_or_default()
                })
                .collect();
            if cells.iter().any(|cell| !cell.is_empty()) {
                rows.push((row as usize, cells));
            }
        }
        Ok(Some(rows))
    }
}

/// Resolves only the file names it was given, without touching the disk.
#[derive(Debug, Clone, Default)]
pub struct KnownFiles {
    files: BTreeSet<String>,
}

impl KnownFiles {
    pub fn new(files: &[&str]) -> Self {
        KnownFiles {
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FileResolver for KnownFiles {
    fn resolve_file(
        &self,
        name: &str,
        category: FileCategory,
        _display_name: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<PathBuf> {
        let name = name.trim();
        if self.files.contains(name) {
            let folder = match category {
                FileCategory::Template => "templates",
                FileCategory::Images => "images",
                FileCategory::Data => "data",
            };
            return Some(PathBuf::from(folder).join(name));
        }
        diagnostics.push(DataQualityIssue::MissingFile {
            file: name.to_string(),
        });
        None
    }
}

/// A workbook with every sheet a complete report needs.
///
/// The results sheet holds two parts. The first has a tested heading with a
/// reference item, an all-not-applicable heading and a heading mixing a
/// failed item with a not-applicable group; the second has a notes-only
/// heading and one passed item.
pub fn sample_workbook() -> MemorySheets {
    MemorySheets::new()
        .with_sheet(
            "检验结果",
            &[
                &["序号", "检验项目", "子项", "单位", "技术要求", "检验结果", "备注"],
                &["第一部分", "网络信息安全", "", "", "", "", ""],
                &["1", "接口要求", "", "", "", "", ""],
                &["1.1", "以太网接口（电口）", "", "", "", "", ""],
                &["1", "接口速率", "", "Mbps", "≥100", "1000", ""],
                &["2", "端口数量", "", "个", "≥4", "8", ""],
                &["*3", "接口指示灯", "", "/", "应具备", "具备", ""],
                &["1.2", "光口（设备支持该功能时测试）", "", "", "", "", ""],
                &["4", "光口速率", "", "Mbps", "≥1000", "/", ""],
                &["5", "光口数量", "", "个", "≥2", "--", ""],
                &["2", "安全要求", "", "", "", "", ""],
                &["6", "登录认证", "", "/", "应支持", "支持", "不合格"],
                &["7", "密码策略", "", "/", "应支持复杂度校验", "不支持", ""],
                &["8", "", "", "/", "应支持定期更换", "不支持", ""],
                &["第二部分", "互联互通", "", "", "", "", ""],
                &["3", "协议要求", "", "", "", "", ""],
                &["$说明", "以下项目仅作记录", "", "", "", "", ""],
                &["4", "时间同步", "", "", "", "", ""],
                &["9", "NTP", "", "/", "应支持", "支持", ""],
            ],
        )
        .with_sheet(
            "map",
            &[
                &["", "", "显示名称", "变量名"],
                &["", "", "报告编号", "report_number"],
                &["", "", "委托单位", "manufacturer"],
                &["", "", "设备名称", "equipment_type"],
                &["", "", "设备型号", "equipment_model"],
                &["", "", "其他说明", "toc_other"],
                &["", "", "拍摄时间", "photo_date"],
                &["", "", "拍摄地点", "photo_place"],
            ],
        )
        .with_sheet(
            "基本信息",
            &[
                &["", "", "项目", "内容"],
                &["", "", "报告编号", "BD2024-017"],
                &["", "", "委托单位", "博鼎科技有限公司"],
                &["", "", "设备名称", "工业交换机"],
                &["", "", "设备型号", "SW3000"],
                &["", "", "其他说明", "/"],
            ],
        )
        .with_sheet(
            "检验样品照片",
            &[
                &["", "项目", "内容"],
                &["", "拍摄时间", "2024-05-06"],
                &["", "拍摄地点", "实验室"],
                &[],
                &["", "名称", "文件", "隐藏"],
                &["", "正面", "front.jpg", ""],
                &["", "背面", "back.jpg", "是"],
            ],
        )
        .with_sheet(
            "检验依据",
            &[
                &["序号", "标准号", "标准名称"],
                &["1", "GB/T 1234-2020", "工业以太网交换机技术要求"],
                &["2", "GB/T 5678-2021", "工业以太网交换机测试方法"],
                &["3", "", ""],
            ],
        )
        .with_sheet(
            "检验人员",
            &[
                &["序号", "测试项目", "主检", "审核", "检验时间"],
                &["1", "接口要求", "张三", "李四", "2024-05-07"],
                &["2", "安全要求", "", "", ""],
            ],
        )
        .with_sheet(
            "检验用仪表",
            &[
                &["序号", "仪表名称", "型号", "生产厂家", "出厂编号", "硬件版本", "软件版本", "有效期至", "来源", "状态", ""],
                &["1", "网络测试仪", "N2X", "Keysight", "SN001", "", "", "2025-01-01", "自有", "正常", ""],
                &["2", "示波器", "DSO", "Rigol", "SN002", "", "", "2023-01-01", "自有", "故障", ""],
            ],
        )
}
