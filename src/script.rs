//! Line-oriented command scripts.
//!
//! One command per line:
//!
//! ```text
//! # comment
//! set A1 5
//! set B1 =A1 * 2
//! get B1
//! values
//! ```
//!
//! A failing command is reported on the error stream and the script carries on.

use crate::error::{CliError, Result};
use gridcalc_core::{CellValue, GridcalcError, Position, Sheet, Size};
use gridcalc_engine::engine::FORMULA_SIGN;
use std::io::{BufRead, Write};

const COMMENT_SIGN: char = '#';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `set <A1> <text>`: text may be empty and may contain spaces.
    Set(Position, String),
    Clear(Position),
    /// Print the computed value.
    Get(Position),
    /// Print the input text.
    Text(Position),
    /// Print the positions the cell's formula reads.
    Refs(Position),
    Size,
    Values,
    Texts,
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Command>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with(COMMENT_SIGN) {
        return Ok(None);
    }

    let parse_error = |message: String| CliError::Parse {
        line: line_no,
        message,
    };

    let (verb, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let position = |arg: &str| -> Result<Position> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(parse_error(format!("`{}` needs a cell reference", verb)));
        }
        Position::from_str(arg)
            .ok_or_else(|| parse_error(format!("invalid cell reference: {}", arg)))
    };
    let no_args = |command: Command| -> Result<Option<Command>> {
        if rest.trim().is_empty() {
            Ok(Some(command))
        } else {
            Err(parse_error(format!("`{}` takes no arguments", verb)))
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let rest = rest.trim_start();
            let (name, text) = rest.split_once(' ').unwrap_or((rest, ""));
            Ok(Some(Command::Set(position(name)?, text.to_string())))
        }
        "clear" => Ok(Some(Command::Clear(position(rest)?))),
        "get" => Ok(Some(Command::Get(position(rest)?))),
        "text" => Ok(Some(Command::Text(position(rest)?))),
        "refs" => Ok(Some(Command::Refs(position(rest)?))),
        "size" => no_args(Command::Size),
        "values" => no_args(Command::Values),
        "texts" => no_args(Command::Texts),
        other => Err(parse_error(format!("unknown command: {}", other))),
    }
}

/// Apply one command to `sheet`, writing any output to `out`.
pub fn execute<W: Write>(
    sheet: &mut Sheet,
    command: &Command,
    out: &mut W,
    line_no: usize,
) -> Result<()> {
    let sheet_error = |source: GridcalcError| CliError::Sheet {
        line: line_no,
        source,
    };

    match command {
        Command::Set(pos, text) => sheet.set_cell(*pos, text).map_err(sheet_error)?,
        Command::Clear(pos) => sheet.clear_cell(*pos).map_err(sheet_error)?,
        Command::Get(pos) => {
            let value = sheet
                .cell(*pos)
                .map_err(sheet_error)?
                .map(|cell| cell.value())
                .unwrap_or_default();
            writeln!(out, "{}", value)?;
        }
        Command::Text(pos) => {
            let text = sheet
                .cell(*pos)
                .map_err(sheet_error)?
                .map(|cell| cell.text())
                .unwrap_or_default();
            writeln!(out, "{}", text)?;
        }
        Command::Refs(pos) => {
            let refs: Vec<String> = sheet
                .cell(*pos)
                .map_err(sheet_error)?
                .map(|cell| cell.referenced_cells())
                .unwrap_or_default()
                .iter()
                .map(Position::to_string)
                .collect();
            writeln!(out, "{}", refs.join(" "))?;
        }
        Command::Size => {
            let Size { rows, cols } = sheet.printable_size();
            writeln!(out, "{} {}", rows, cols)?;
        }
        Command::Values => sheet.print_values(out)?,
        Command::Texts => sheet.print_texts(out)?,
    }
    Ok(())
}

/// Run every line of `input` against `sheet`.
///
/// Parse and sheet errors are written to `err` as `error: ...` and counted;
/// only I/O failures abort the run. Returns the number of failed commands.
pub fn run_script<R, W, E>(sheet: &mut Sheet, input: R, out: &mut W, err: &mut E) -> Result<usize>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut failures = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let outcome = parse_line(&line, line_no).and_then(|command| match command {
            Some(command) => execute(sheet, &command, out, line_no),
            None => Ok(()),
        });
        match outcome {
            Ok(()) => {}
            Err(CliError::Io(e)) => return Err(CliError::Io(e)),
            Err(e) => {
                failures += 1;
                writeln!(err, "error: {}", e)?;
            }
        }
    }
    out.flush()?;
    Ok(failures)
}

/// Evaluate a single formula in an empty sheet. The leading `=` is optional.
pub fn evaluate_formula(sheet: &mut Sheet, formula: &str) -> gridcalc_core::Result<CellValue> {
    let body = formula.trim();
    let body = body.strip_prefix(FORMULA_SIGN).unwrap_or(body);
    let pos = Position::new(0, 0);
    sheet.set_cell(pos, &format!("{}{}", FORMULA_SIGN, body))?;
    Ok(sheet
        .cell(pos)?
        .map(|cell| cell.value())
        .unwrap_or_default())
}
