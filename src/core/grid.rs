//! Grid types exchanged with the simulation service.
//!
//! A [`Grid`] keeps the JSON value exactly as the service sent it, so the
//! cell encoding (`0/1`, `true/false`, ...) round-trips unchanged on the next
//! request. Shape is never validated: a grid that is not an array of arrays
//! simply reads as having fewer rows/cells.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One generation of a two-dimensional automaton: rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid(Value);

/// Ordered grids exchanged in one request/response cycle. Index order is the
/// display identity of each grid.
pub type GridSet = Vec<Grid>;

/// Truthiness of a single cell value.
///
/// `null`, `false`, `0` and `""` are dead; every other scalar (and any
/// nested array/object) counts as alive.
pub fn is_alive(cell: &Value) -> bool {
    match cell {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Grid {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Builds a grid from booleans, encoded as `0/1` the way the service
    /// emits them.
    pub fn from_cells(cells: &[Vec<bool>]) -> Self {
        let rows = cells
            .iter()
            .map(|row| Value::Array(row.iter().map(|&c| Value::from(u8::from(c))).collect()))
            .collect();
        Self(Value::Array(rows))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Rows as raw cell slices. Non-array rows read as empty.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        let rows: &[Value] = self.0.as_array().map(Vec::as_slice).unwrap_or(&[]);
        rows.iter()
            .map(|row| row.as_array().map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn row_count(&self) -> usize {
        self.0.as_array().map_or(0, Vec::len)
    }

    /// Width as reported by the first row.
    pub fn col_count(&self) -> usize {
        self.rows().next().map_or(0, <[Value]>::len)
    }

    /// `(rows, cols)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.row_count(), self.col_count())
    }

    /// Out-of-range coordinates read as dead.
    pub fn cell(&self, row: usize, col: usize) -> bool {
        self.rows()
            .nth(row)
            .and_then(|r| r.get(col))
            .is_some_and(is_alive)
    }

    pub fn live_count(&self) -> usize {
        self.rows()
            .map(|row| row.iter().filter(|c| is_alive(c)).count())
            .sum()
    }
}

impl From<Value> for Grid {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_scalar_rules() {
        assert!(!is_alive(&json!(null)));
        assert!(!is_alive(&json!(false)));
        assert!(!is_alive(&json!(0)));
        assert!(!is_alive(&json!(0.0)));
        assert!(!is_alive(&json!("")));

        assert!(is_alive(&json!(true)));
        assert!(is_alive(&json!(1)));
        assert!(is_alive(&json!(-3)));
        assert!(is_alive(&json!("x")));
    }

    #[test]
    fn dims_come_from_first_row() {
        let g = Grid::from_value(json!([[0, 1, 0], [1, 0, 1]]));
        assert_eq!(g.dims(), (2, 3));
        assert!(g.cell(0, 1));
        assert!(!g.cell(0, 0));
        assert!(!g.cell(5, 5));
        assert_eq!(g.live_count(), 3);
    }

    #[test]
    fn malformed_grids_degrade_without_panicking() {
        let g = Grid::from_value(json!([[1, 1], "not a row", [1]]));
        assert_eq!(g.row_count(), 3);
        assert_eq!(g.col_count(), 2);
        assert!(!g.cell(1, 0));
        assert!(g.cell(2, 0));

        let scalar = Grid::from_value(json!(7));
        assert_eq!(scalar.dims(), (0, 0));
        assert_eq!(scalar.live_count(), 0);
    }

    #[test]
    fn from_cells_uses_integer_encoding() {
        let g = Grid::from_cells(&[vec![true, false], vec![false, true]]);
        assert_eq!(g.as_value(), &json!([[1, 0], [0, 1]]));
    }

    #[test]
    fn serializes_transparently() {
        let g = Grid::from_value(json!([[true, false]]));
        assert_eq!(serde_json::to_string(&g).unwrap(), "[[true,false]]");
    }
}
