//! Simulation output tables and the queries the viewers run on them.

/// `output.csv` split into a header row and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Min/max/mean of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl OutputTable {
    /// First row becomes the headers; an empty input is an empty table.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let headers = rows.remove(0);
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Parseable values of a column, in row order; unparseable cells are skipped.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| parse_cell(cell)))
                .collect(),
        )
    }

    /// `[x, y]` points from rows where both cells parse.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Option<Vec<[f64; 2]>> {
        let xi = self.column_index(x)?;
        let yi = self.column_index(y)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| {
                    let xv = row.get(xi).and_then(|c| parse_cell(c))?;
                    let yv = row.get(yi).and_then(|c| parse_cell(c))?;
                    Some([xv, yv])
                })
                .collect(),
        )
    }

    /// Columns whose every non-empty cell is numeric.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut any = false;
                let all = self.rows.iter().all(|row| match row.get(*idx) {
                    Some(cell) if cell.trim().is_empty() => true,
                    Some(cell) => {
                        any = true;
                        parse_cell(cell).is_some()
                    }
                    None => true,
                });
                all && any
            })
            .map(|(_, name)| name.trim().to_string())
            .collect()
    }

    pub fn summarize(&self) -> Vec<ColumnSummary> {
        self.numeric_column_names()
            .into_iter()
            .filter_map(|name| {
                let values = self.numeric_column(&name)?;
                if values.is_empty() {
                    return None;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                Some(ColumnSummary {
                    name,
                    count: values.len(),
                    min,
                    max,
                    mean,
                })
            })
            .collect()
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
