//! A1 区域引用解析 (`Sheet1!C4:C16`, `C1`, `A1:Z`)

use crate::error::SinkError;
use once_cell::sync::Lazy;
use regex::Regex;

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<sheet>[^!]+)!)?(?P<c1>[A-Za-z]{1,3})(?P<r1>[0-9]+)(?::(?P<c2>[A-Za-z]{1,3})(?P<r2>[0-9]+)?)?$")
        .expect("static regex")
});

/// 单元格坐标 (0起始)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

/// 区域引用
///
/// `end_row == None` 表示行方向不设上限 (例如 `A1:Z`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub start: CellRef,
    pub end_col: u32,
    pub end_row: Option<u32>,
}

impl RangeRef {
    pub fn parse(text: &str) -> Result<Self, SinkError> {
        let caps = RANGE_RE
            .captures(text.trim())
            .ok_or_else(|| SinkError::InvalidRange(text.to_string()))?;

        let invalid = || SinkError::InvalidRange(text.to_string());
        let sheet = caps
            .name("sheet")
            .map(|m| m.as_str().trim_matches('\'').to_string());
        let start_col = column_index(&caps["c1"]);
        let start_row = row_index(&caps["r1"]).ok_or_else(invalid)?;

        let (end_col, end_row) = match caps.name("c2") {
            None => (start_col, Some(start_row)),
            Some(c2) => {
                let end_row = match caps.name("r2") {
                    Some(r2) => Some(row_index(r2.as_str()).ok_or_else(invalid)?),
                    None => None,
                };
                (column_index(c2.as_str()), end_row)
            }
        };

        if end_col < start_col || end_row.is_some_and(|row| row < start_row) {
            return Err(invalid());
        }

        Ok(Self {
            sheet,
            start: CellRef {
                row: start_row,
                col: start_col,
            },
            end_col,
            end_row,
        })
    }

    pub fn is_single_cell(&self) -> bool {
        self.end_col == self.start.col && self.end_row == Some(self.start.row)
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.col >= self.start.col
            && cell.col <= self.end_col
            && cell.row >= self.start.row
            && self.end_row.map_or(true, |end| cell.row <= end)
    }

    pub fn width(&self) -> u32 {
        self.end_col - self.start.col + 1
    }
}

/// 列字母转索引 (A → 0, Z → 25, AA → 26)
pub fn column_index(letters: &str) -> u32 {
    letters
        .bytes()
        .map(|b| u32::from(b.to_ascii_uppercase() - b'A') + 1)
        .fold(0, |acc, v| acc * 26 + v)
        - 1
}

/// 行号转索引 (1 → 0), 行号 0 非法
fn row_index(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_with_sheet() {
        let range = RangeRef::parse("Sheet1!C4").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(range.start, CellRef { row: 3, col: 2 });
        assert!(range.is_single_cell());
    }

    #[test]
    fn test_column_range_and_open_end() {
        let range = RangeRef::parse("C4:C16").unwrap();
        assert_eq!(range.sheet, None);
        assert_eq!(range.end_row, Some(15));
        assert!(range.contains(CellRef { row: 10, col: 2 }));
        assert!(!range.contains(CellRef { row: 16, col: 2 }));

        let open = RangeRef::parse("A1:Z").unwrap();
        assert_eq!(open.end_row, None);
        assert_eq!(open.width(), 26);
        assert!(open.contains(CellRef { row: 9999, col: 25 }));
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_index("A"), 0);
        assert_eq!(column_index("z"), 25);
        assert_eq!(column_index("AA"), 26);
        assert_eq!(column_index("AZ"), 51);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(RangeRef::parse("").is_err());
        assert!(RangeRef::parse("C0").is_err());
        assert!(RangeRef::parse("4C").is_err());
        assert!(RangeRef::parse("D4:C4").is_err());
        assert!(RangeRef::parse("C9:C4").is_err());
    }
}
