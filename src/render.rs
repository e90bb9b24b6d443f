//! Plain-text rendering of controller state.

use std::fmt::Write as _;

use lifeview::{ControllerState, Grid};

const ALIVE: char = '█';
const DEAD: char = '·';

/// Status bar: play state, grid count, speed.
pub fn status_line(state: &ControllerState) -> String {
    format!(
        "[{}]  {} grid(s)  Speed: {} ms{}",
        if state.playing { "playing" } else { "paused" },
        state.grids.len(),
        state.interval_ms,
        if state.fetching { " (updating…)" } else { "" },
    )
}

/// One grid with its index and `rows × cols` header.
pub fn grid_card(index: usize, grid: &Grid) -> String {
    let (rows, cols) = grid.dims();
    let mut out = format!("#{index}  {rows} × {cols}\n");
    for row in 0..rows {
        for col in 0..cols {
            out.push(if grid.cell(row, col) { ALIVE } else { DEAD });
        }
        out.push('\n');
    }
    out
}

/// Full screen for the current state. Loading and error states replace the
/// grid view entirely.
pub fn frame(state: &ControllerState) -> String {
    if state.initial_loading {
        return "Loading…\n".to_string();
    }
    if let Some(err) = &state.error {
        return format!("Error: {err}  (r = retry)\n");
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(state));
    for (index, grid) in state.grids.iter().enumerate() {
        out.push('\n');
        out.push_str(&grid_card(index, grid));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(grids: Vec<Grid>) -> ControllerState {
        ControllerState {
            grids,
            initial_loading: false,
            fetching: false,
            error: None,
            playing: false,
            interval_ms: 500,
        }
    }

    #[test]
    fn status_line_reports_count_and_speed() {
        let mut s = state(vec![Grid::from_value(json!([[1]]))]);
        assert_eq!(status_line(&s), "[paused]  1 grid(s)  Speed: 500 ms");
        s.playing = true;
        s.fetching = true;
        assert_eq!(status_line(&s), "[playing]  1 grid(s)  Speed: 500 ms (updating…)");
    }

    #[test]
    fn grid_card_draws_cells() {
        let g = Grid::from_value(json!([[0, 1], [1, 0]]));
        assert_eq!(grid_card(3, &g), "#3  2 × 2\n·█\n█·\n");
    }

    #[test]
    fn loading_and_error_replace_content() {
        let mut s = state(vec![Grid::from_value(json!([[1]]))]);
        s.initial_loading = true;
        assert_eq!(frame(&s), "Loading…\n");

        s.initial_loading = false;
        s.error = Some("HTTP 500".to_string());
        assert_eq!(frame(&s), "Error: HTTP 500  (r = retry)\n");
    }

    #[test]
    fn frame_lists_every_grid_in_order() {
        let s = state(vec![
            Grid::from_value(json!([[1]])),
            Grid::from_value(json!([[0, 0]])),
        ]);
        let text = frame(&s);
        let first = text.find("#0").unwrap();
        let second = text.find("#1  1 × 2").unwrap();
        assert!(first < second);
    }
}
