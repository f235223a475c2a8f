use egui::Align2;
use egui::Pos2;

use crate::color::Rgba;

/// Dash pattern: painted length followed by gap length, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
}

impl Dash {
    pub const fn new(on: f32, off: f32) -> Self {
        Self { on, off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: Rgba,
    pub dash: Option<Dash>,
}

impl LineStyle {
    pub const fn solid(width: f32, color: Rgba) -> Self {
        Self { width, color, dash: None }
    }

    pub const fn dashed(width: f32, color: Rgba, dash: Dash) -> Self {
        Self { width, color, dash: Some(dash) }
    }
}

/// A single drawing primitive in screen space. A render produces an ordered
/// list of these; later commands paint over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole canvas.
    Clear { color: Rgba },
    /// Straight segments through `points`, joining the last to the first when `closed`.
    Path { points: Vec<Pos2>, closed: bool, style: LineStyle },
    CircleOutline { center: Pos2, radius: f32, style: LineStyle },
    Disc { center: Pos2, radius: f32, color: Rgba },
    Text { pos: Pos2, anchor: Align2, text: String, size: f32, color: Rgba },
}

impl DrawCommand {
    pub fn line(from: Pos2, to: Pos2, style: LineStyle) -> Self {
        DrawCommand::Path { points: vec![from, to], closed: false, style }
    }

    pub fn polygon(points: Vec<Pos2>, style: LineStyle) -> Self {
        DrawCommand::Path { points, closed: true, style }
    }
}
