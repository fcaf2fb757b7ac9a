//! Tab-separated rendering of a sheet's printable area.
//!
//! Rows are printed top to bottom over [`Sheet::printable_size`]; fields are
//! separated by `\t` and every row ends with `\n`. Positions without a cell
//! print as empty fields.

use std::io::{self, Write};

use crate::sheet::Sheet;
use gridcalc_engine::engine::{CellLookup, Position, Size};

const FIELD_SEPARATOR: &str = "\t";
const RECORD_SEPARATOR: &str = "\n";

impl Sheet {
    /// Write every cell's computed value.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |sheet, pos| {
            sheet.grid.value_at(pos).map(|value| value.to_string())
        })
    }

    /// Write every cell's input text.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |sheet, pos| sheet.grid.get(&pos).map(|cell| cell.text()))
    }

    fn print_with<W, F>(&self, out: &mut W, field: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(&Sheet, Position) -> Option<String>,
    {
        let size = self.printable_size();
        if size.is_empty() {
            return Ok(());
        }
        let Size { rows, cols } = size;
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    out.write_all(FIELD_SEPARATOR.as_bytes())?;
                }
                if let Some(text) = field(self, Position::new(row, col)) {
                    out.write_all(text.as_bytes())?;
                }
            }
            out.write_all(RECORD_SEPARATOR.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(sheet: &Sheet, values: bool) -> String {
        let mut out = Vec::new();
        if values {
            sheet.print_values(&mut out).unwrap();
        } else {
            sheet.print_texts(&mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    fn pos(name: &str) -> Position {
        Position::from_str(name).unwrap()
    }

    #[test]
    fn test_empty_sheet_prints_nothing() {
        let sheet = Sheet::new();
        assert_eq!(render(&sheet, true), "");
        assert_eq!(render(&sheet, false), "");
    }

    #[test]
    fn test_print_values_and_texts() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("A2"), "=A1+1").unwrap();
        sheet.set_cell(pos("B2"), "=1/0").unwrap();
        sheet.set_cell(pos("C1"), "'=escaped").unwrap();

        assert_eq!(render(&sheet, true), "2\t\t=escaped\n3\t#ARITHM!\t\n");
        assert_eq!(render(&sheet, false), "2\t\t'=escaped\n=A1+1\t=1/0\t\n");
    }

    #[test]
    fn test_referenced_empty_cells_print_as_empty_fields() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B2"), "=A1 + 5").unwrap();
        assert_eq!(render(&sheet, true), "\t\n\t5\n");
        assert_eq!(render(&sheet, false), "\t\n\t=A1 + 5\n");
    }

    #[test]
    fn test_referenced_cells_widen_printed_area() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=C3").unwrap();
        assert_eq!(render(&sheet, true), "0\t\t\n\t\t\n\t\t\n");
    }
}
