//! Wire types for the line-delimited JSON protocol between the game server
//! and the bridge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Position;

/// One input line from the event stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// Session geometry and mode, sent once per connection.
    #[serde(rename = "oneTimeData")]
    OneTimeData(SessionSetup),
    /// Entity snapshot, sent every tick.
    #[serde(rename = "drawables")]
    Drawables(Vec<Drawable>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetup {
    pub game_bounds_dimensions: BoundsDimensions,
    pub path_grid_dimensions: GridDimensions,
    /// Expanded unwalkable regions; carried on the wire but not consumed.
    #[serde(default)]
    pub unwalkable_cells_expanded: Value,
    #[serde(default)]
    pub eval_mode: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundsDimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridDimensions {
    pub cols: i32,
    pub rows: i32,
}

pub const KIND_AGENT: &str = "agent";
pub const KIND_PLAYER: &str = "player";

/// A continuous-world entity. Fields this bridge does not interpret are kept
/// in `extra` so the echoed output is lossless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawable {
    #[serde(rename = "type")]
    pub kind: String,
    pub top_left_x: f64,
    pub top_left_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_y: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Drawable {
    pub fn is_agent(&self) -> bool {
        self.kind == KIND_AGENT
    }

    pub fn is_player(&self) -> bool {
        self.kind == KIND_PLAYER
    }

    pub fn center_x(&self) -> f64 {
        self.top_left_x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top_left_y + self.height / 2.0
    }

    /// Quantize the entity center into its grid cell and remember the cell
    /// on the drawable so the echo carries it.
    pub fn update_cell(&mut self, cell_width: f64, cell_height: f64) -> Position {
        let cell = Position::new(
            (self.center_x() / cell_width).floor() as i32,
            (self.center_y() / cell_height).floor() as i32,
        );
        self.cell_x = Some(cell.x);
        self.cell_y = Some(cell.y);
        cell
    }

    /// Anchor the entity centered on `cell`.
    pub fn place_at_cell(&mut self, cell: Position, cell_width: f64, cell_height: f64) {
        self.top_left_x = cell.x as f64 * cell_width + cell_width / 2.0 - self.width / 2.0;
        self.top_left_y = cell.y as f64 * cell_height + cell_height / 2.0 - self.height / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_time_data() {
        let line = r#"{"type":"oneTimeData","data":{"gameBoundsDimensions":{"width":512,"height":512},"pathGridDimensions":{"cols":10,"rows":10},"unwalkableCellsExpanded":[],"evalMode":true}}"#;
        let event: Event = serde_json::from_str(line).unwrap();
        match event {
            Event::OneTimeData(setup) => {
                assert_eq!(setup.game_bounds_dimensions.width, 512.0);
                assert_eq!(setup.path_grid_dimensions.cols, 10);
                assert!(setup.eval_mode);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_drawables_and_preserve_unknown_fields() {
        let line = r#"{"type":"drawables","data":[{"type":"agent","topLeftX":96.0,"topLeftY":144.0,"width":20,"height":20,"speed":5,"color":"blue","score":17}]}"#;
        let event: Event = serde_json::from_str(line).unwrap();
        let drawables = match event {
            Event::Drawables(d) => d,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(drawables.len(), 1);
        let drawable = &drawables[0];
        assert!(drawable.is_agent());
        assert_eq!(drawable.extra.get("color"), Some(&Value::from("blue")));

        let echoed = serde_json::to_value(drawable).unwrap();
        assert_eq!(echoed["color"], "blue");
        assert_eq!(echoed["score"], 17);
        assert_eq!(echoed["type"], "agent");
    }

    #[test]
    fn test_update_cell_quantizes_center() {
        let mut drawable = Drawable {
            kind: KIND_AGENT.to_string(),
            top_left_x: 96.0,
            top_left_y: 144.0,
            width: 20.0,
            height: 20.0,
            speed: 5.0,
            cell_x: None,
            cell_y: None,
            extra: Map::new(),
        };
        // Center (106, 154) in 51.2-pixel cells -> cell (2, 3).
        let cell = drawable.update_cell(51.2, 51.2);
        assert_eq!(cell, Position::new(2, 3));
        assert_eq!(drawable.cell_x, Some(2));
        assert_eq!(drawable.cell_y, Some(3));
    }

    #[test]
    fn test_place_at_cell_centers_entity() {
        let mut drawable = Drawable {
            kind: KIND_PLAYER.to_string(),
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: 20.0,
            height: 30.0,
            speed: 5.0,
            cell_x: None,
            cell_y: None,
            extra: Map::new(),
        };
        drawable.place_at_cell(Position::new(4, 2), 50.0, 50.0);
        assert_eq!(drawable.top_left_x, 4.0 * 50.0 + 25.0 - 10.0);
        assert_eq!(drawable.top_left_y, 2.0 * 50.0 + 25.0 - 15.0);
        let cell = drawable.update_cell(50.0, 50.0);
        assert_eq!(cell, Position::new(4, 2));
    }
}
