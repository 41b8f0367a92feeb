//! GLPK backend: colon-delimited header block plus fixed-width tables.
//!
//! `glpsol` writes a solution file with a key/value header up to the first
//! blank line, then one fixed-width table for rows and one for columns:
//!
//! ```text
//! Status:     OPTIMAL
//! Objective:  obj = 262.5 (MINimum)
//!
//!    No.   Row name   St   Activity     Lower bound   Upper bound    Marginal
//! ------ ------------ -- ------------- ------------- ------------- -------------
//!      1 c0           NS        262.5         262.5             =          1.25
//! ```
//!
//! Column spans are inferred from the dashes ruler, since blank cells make
//! plain whitespace splitting shift fields around. Tokens prefixed `x`
//! contribute their Activity as variable values, tokens prefixed `c` their
//! Marginal as duals, with blank or unparseable marginals coerced to zero.

use crate::backend::{basis_path, remove_files, run_command, SolveOptions, SolverBackend};
use crate::error::{SolveError, SolveResult};
use crate::outcome::{Solution, SolverOutcome, TerminationCondition};
use crate::SolverKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Backend shelling out to the `glpsol` executable.
pub struct GlpkBackend {
    binary: PathBuf,
}

impl GlpkBackend {
    /// Locate the `glpsol` executable and build a backend around it.
    pub fn new() -> SolveResult<Self> {
        Ok(Self {
            binary: crate::find_binary(SolverKind::Glpk)?,
        })
    }

    /// Use an explicit executable path.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl SolverBackend for GlpkBackend {
    fn solve(&self, problem: &Path, opts: &SolveOptions) -> SolveResult<SolverOutcome> {
        let solution_fn = opts.solution_path_for(problem);

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--lp")
            .arg(problem)
            .arg("--output")
            .arg(&solution_fn);
        if let Some(log) = &opts.log_path {
            cmd.arg("--log").arg(log);
        }
        if let Some(warm) = &opts.warmstart {
            cmd.arg("--ini").arg(warm);
        }
        let basis = opts.store_basis.then(|| basis_path(&solution_fn));
        if let Some(basis) = &basis {
            cmd.arg("-w").arg(basis);
        }
        for fragment in &opts.options {
            for part in fragment.split_whitespace() {
                cmd.arg(part);
            }
        }

        // glpsol writes its own log; nothing useful comes over stdout.
        run_command(cmd, None)?;

        let (status, termination, solution) = parse_solution(&solution_fn)?;
        info!(%termination, "glpk finished");
        if !termination.is_optimal() {
            return Ok(SolverOutcome::no_solution(status, termination));
        }
        if !opts.keep_files {
            remove_files([problem, solution_fn.as_path()]);
        }
        Ok(SolverOutcome {
            status,
            termination,
            solution,
            basis_path: basis,
        })
    }
}

/// Parse a glpsol solution file into the normalized result triple.
pub fn parse_solution(
    path: &Path,
) -> SolveResult<(String, TerminationCondition, Option<Solution>)> {
    let data = std::fs::read_to_string(path).map_err(|source| SolveError::MissingSolution {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = data.lines();

    // Colon-separated key/value block up to the first blank line.
    let mut status = None;
    let mut objective_text = None;
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "Status" => status = Some(value.trim().to_lowercase()),
                "Objective" => objective_text = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    let status = status.ok_or_else(|| malformed(path, "no Status line in header"))?;
    let termination = TerminationCondition::from_status(&status);
    if !termination.is_optimal() {
        return Ok((status, termination, None));
    }

    let objective_text =
        objective_text.ok_or_else(|| malformed(path, "no Objective line in header"))?;
    let objective = parse_objective(&objective_text)
        .ok_or_else(|| malformed(path, &format!("bad objective {objective_text:?}")))?;

    let mut solution = Solution {
        objective,
        ..Default::default()
    };
    let mut table = FixedWidthTable::default();
    for line in lines {
        let Some(row) = table.feed(line) else {
            continue;
        };
        let name = row.name;
        if name.starts_with('x') {
            let value = row
                .activity
                .parse()
                .map_err(|_| malformed(path, &format!("bad activity for {name:?}")))?;
            solution.variables.insert(name.to_string(), value);
        } else if name.starts_with('c') {
            // Marginals are blank for basic rows and may read "< eps";
            // both coerce to zero.
            let dual = row.marginal.parse().unwrap_or(0.0);
            solution.duals.insert(name.to_string(), dual);
        }
    }
    Ok((status, termination, Some(solution)))
}

/// Extract the numeric objective from text like `obj = 262.5 (MINimum)` by
/// keeping only digits, signs and the decimal point.
fn parse_objective(text: &str) -> Option<f64> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    numeric.parse().ok()
}

struct FixedWidthRow<'a> {
    name: &'a str,
    activity: &'a str,
    marginal: &'a str,
}

/// Incremental fixed-width reader for the glpsol Rows/Columns tables.
///
/// Spans come from the dashes ruler; the line right before the ruler is the
/// header naming the columns. Everything that is not a data row of a known
/// table (blank separators, repeated headers, the Karush-Kuhn-Tucker
/// trailer) falls out naturally because its name cell does not carry an
/// `x`/`c` token.
#[derive(Default)]
struct FixedWidthTable {
    spans: Vec<(usize, usize)>,
    name_col: usize,
    activity_col: usize,
    marginal_col: usize,
    header: String,
}

impl FixedWidthTable {
    fn feed<'a>(&mut self, line: &'a str) -> Option<FixedWidthRow<'a>> {
        if line.trim().is_empty() {
            return None;
        }
        if line.starts_with("---") {
            self.reset_spans(line);
            return None;
        }
        if self.spans.is_empty() {
            self.header = line.to_string();
            return None;
        }
        let cell = |col: usize| -> &'a str {
            let (start, end) = self.spans[col];
            line.get(start..end.min(line.len())).unwrap_or("").trim()
        };
        let name = cell(self.name_col);
        if name.is_empty() {
            return None;
        }
        let row = FixedWidthRow {
            name,
            activity: cell(self.activity_col),
            marginal: cell(self.marginal_col),
        };
        self.header = line.to_string();
        Some(row)
    }

    fn reset_spans(&mut self, ruler: &str) {
        self.spans.clear();
        let mut start = None;
        for (i, c) in ruler.char_indices() {
            match (c == '-', start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    self.spans.push((s, i));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            self.spans.push((s, ruler.len()));
        }
        // Map the header the ruler belongs to onto the spans.
        let header = std::mem::take(&mut self.header);
        for (col, &(start, end)) in self.spans.iter().enumerate() {
            let label = header
                .get(start..end.min(header.len()))
                .unwrap_or("")
                .to_lowercase();
            if label.contains("name") {
                self.name_col = col;
            } else if label.contains("activity") {
                self.activity_col = col;
            } else if label.contains("marginal") {
                self.marginal_col = col;
            }
        }
    }
}

fn malformed(path: &Path, message: impl Into<String>) -> SolveError {
    SolveError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROW_HEADER: &str =
        "   No.   Row name   St   Activity     Lower bound   Upper bound    Marginal";
    const COL_HEADER: &str =
        "   No. Column name  St   Activity     Lower bound   Upper bound    Marginal";
    const RULER: &str =
        "------ ------------ -- ------------- ------------- ------------- -------------";

    /// One glpsol table row in the exact widths the ruler describes.
    fn row(no: &str, name: &str, st: &str, fields: [&str; 4]) -> String {
        format!(
            "{:>6} {:<12} {:>2} {:>13} {:>13} {:>13} {:>13}",
            no, name, st, fields[0], fields[1], fields[2], fields[3]
        )
    }

    fn optimal_fixture() -> String {
        let mut text = String::from(
            "Problem:    lp\n\
             Rows:       2\n\
             Columns:    2\n\
             Non-zeros:  4\n\
             Status:     OPTIMAL\n\
             Objective:  obj = 262.5 (MINimum)\n\n",
        );
        for line in [
            ROW_HEADER.to_string(),
            RULER.to_string(),
            row("1", "c0", "NS", ["262.5", "262.5", "=", "1.25"]),
            row("2", "c1", "B", ["80", "", "100", ""]),
            String::new(),
            COL_HEADER.to_string(),
            RULER.to_string(),
            row("1", "x0", "B", ["7.5", "0", "", ""]),
            row("2", "x1", "NL", ["0", "0", "", "0.5"]),
            String::new(),
            "Karush-Kuhn-Tucker optimality conditions:".to_string(),
            "End of output".to_string(),
        ] {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }

    fn write_solution(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.sol");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn optimal_solution_parses_both_tables() {
        let (_dir, path) = write_solution(&optimal_fixture());
        let (status, termination, solution) = parse_solution(&path).unwrap();
        assert_eq!(status, "optimal");
        assert_eq!(termination, TerminationCondition::Optimal);
        let solution = solution.unwrap();
        assert_eq!(solution.objective, 262.5);
        assert_eq!(solution.variables["x0"], 7.5);
        assert_eq!(solution.variables["x1"], 0.0);
        assert_eq!(solution.duals["c0"], 1.25);
        // Blank marginal coerces to zero.
        assert_eq!(solution.duals["c1"], 0.0);
    }

    #[test]
    fn non_optimal_returns_no_values() {
        let (_dir, path) = write_solution(
            "Status:     UNDEFINED\nObjective:  obj = 0 (MINimum)\n\n",
        );
        let (status, termination, solution) = parse_solution(&path).unwrap();
        assert_eq!(status, "undefined");
        assert_eq!(termination, TerminationCondition::Other);
        assert!(solution.is_none());
    }

    #[test]
    fn infeasible_status_maps() {
        let (_dir, path) = write_solution("Status:     INFEASIBLE (FINAL)\n\n");
        let (_, termination, solution) = parse_solution(&path).unwrap();
        assert_eq!(termination, TerminationCondition::Infeasible);
        assert!(solution.is_none());
    }

    #[test]
    fn objective_strips_annotation() {
        assert_eq!(parse_objective("obj = 262.5 (MINimum)"), Some(262.5));
        assert_eq!(parse_objective("obj = -42 (MAXimum)"), Some(-42.0));
        assert_eq!(parse_objective("no numbers here"), None);
    }

    #[test]
    fn missing_status_is_a_parse_error() {
        let (_dir, path) = write_solution("Problem:    lp\n\n");
        assert!(matches!(
            parse_solution(&path).unwrap_err(),
            SolveError::Parse { .. }
        ));
    }
}
