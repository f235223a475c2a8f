use std::f64::consts::TAU;

use egui::Align2;
use egui::Pos2;
use egui::Vec2;
use itertools::Itertools;

use crate::color::Rgba;
use crate::config::ClassConfig;
use crate::config::VisualConfig;
use crate::draw_command::Dash;
use crate::draw_command::DrawCommand;
use crate::draw_command::LineStyle;
use crate::frame_store::DetectedObject;
use crate::frame_store::FrameStore;
use crate::geometry::CanvasTransform;
use crate::geometry::convex_hull;
use crate::object_types::ObjectTypeRegistry;

// ─── Constants ───────────────────────────────────────────────────────────────

const BACKGROUND: Rgba = Rgba::BLACK;
const AXIS_COLOR: Rgba = Rgba::WHITE;
const GRID_COLOR: Rgba = Rgba::rgba(255, 255, 255, 51);
const CROSSHAIR_COLOR: Rgba = Rgba::rgba(255, 255, 255, 102);
const AXIS_STEPS: u32 = 5;

/// Alpha applied to an object's outline and center dot when it is not hovered.
pub const DIM_STROKE_ALPHA: u8 = 0xcc;
/// Alpha of the dashed trace drawn under each outline.
pub const TRACE_ALPHA: u8 = 0x66;
/// Alpha of the reticle for objects that are neither locked nor hovered.
pub const DIM_RETICLE_ALPHA: u8 = 0xaa;
pub const HULL_OPACITY: f32 = 0.59;

const RETICLE_RING_OFFSET: f32 = 10.0;
const RETICLE_BRACKET_OFFSET: f32 = 20.0;
const RETICLE_CROSS_SIZE: f32 = 15.0;
const RETICLE_BRACKET_SIZE: f32 = 8.0;
const HOVER_RADIUS_BONUS: f32 = 2.0;
const LABEL_OFFSET: Vec2 = Vec2::new(15.0, -5.0);
const SUBLABEL_OFFSET: Vec2 = Vec2::new(15.0, 8.0);

pub const RADAR_RING_COUNT: usize = 3;
const RADAR_BASE_RADIUS: f64 = 40.0;
const RADAR_RING_SPACING: f64 = 25.0;
const RADAR_PULSE_AMPLITUDE: f64 = 10.0;
/// Ring phase advance per millisecond of animation clock.
const RADAR_PULSE_RATE: f64 = 0.002;
const RADAR_RING_PHASE: f64 = 0.8;
/// Sweep angle advance per millisecond of animation clock.
const RADAR_SWEEP_RATE: f64 = 0.01;
/// Sweep phase offset between consecutive agents.
const RADAR_AGENT_PHASE: f64 = 1.2;
const RADAR_DOT_DISTANCE: f64 = 0.7;
const RADAR_DOT_RADIUS: f32 = 2.0;

// ─── Radar animation ────────────────────────────────────────────────────────

/// Animated state of one radar ring at a given clock reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarRing {
    pub radius: f64,
    pub alpha: f64,
    /// Sweep direction in screen space (radians, y down).
    pub sweep_angle: f64,
}

impl RadarRing {
    /// `clock_ms` is wall-clock milliseconds. `agent_index` is the agent's
    /// position among the frame's agents and offsets its sweep.
    pub fn at(clock_ms: f64, ring: usize, agent_index: usize) -> Self {
        let k = ring as f64;
        let phase = (clock_ms * RADAR_PULSE_RATE + k * RADAR_RING_PHASE).rem_euclid(TAU);
        let radius = RADAR_BASE_RADIUS + k * RADAR_RING_SPACING + phase.sin() * RADAR_PULSE_AMPLITUDE;
        let alpha = (phase.sin() * 0.3 + 0.4) * (1.0 - k * 0.2);
        let sweep_angle = (clock_ms * RADAR_SWEEP_RATE + agent_index as f64 * RADAR_AGENT_PHASE).rem_euclid(TAU);
        Self { radius, alpha, sweep_angle }
    }

    fn point_at(&self, center: Pos2, distance: f64) -> Pos2 {
        Pos2::new(
            center.x + (self.sweep_angle.cos() * distance) as f32,
            center.y + (self.sweep_angle.sin() * distance) as f32,
        )
    }
}

/// Milliseconds since the Unix epoch, sampled once per render.
pub fn wall_clock_ms() -> f64 {
    jiff::Timestamp::now().as_millisecond() as f64
}

// ─── Renderer ───────────────────────────────────────────────────────────────

/// Turns the frame store's current state into a full-canvas list of draw
/// commands: grid, resource hull, objects, agent radar, in that order.
pub struct FrameRenderer {
    visual: VisualConfig,
    classes: ClassConfig,
    registry: ObjectTypeRegistry,
    origin: Pos2,
    size: Vec2,
}

impl FrameRenderer {
    pub fn new(visual: VisualConfig, classes: ClassConfig, registry: ObjectTypeRegistry) -> Self {
        Self { visual, classes, registry, origin: Pos2::ZERO, size: Vec2::ZERO }
    }

    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.size
    }

    /// Record the canvas rectangle from the surrounding layout. Returns `true`
    /// when the size changed.
    pub fn set_canvas(&mut self, origin: Pos2, size: Vec2) -> bool {
        self.origin = origin;
        let resized = self.size != size;
        self.size = size;
        resized
    }

    fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(self.origin, self.size, self.visual.margin)
    }

    /// Full redraw using the current wall clock for animation.
    pub fn render(&self, store: &FrameStore) -> Vec<DrawCommand> {
        self.render_at(store, wall_clock_ms())
    }

    /// Full redraw at a fixed animation clock reading. Deterministic for a
    /// given store state, canvas and clock.
    pub fn render_at(&self, store: &FrameStore, clock_ms: f64) -> Vec<DrawCommand> {
        let transform = self.transform();
        let mut commands = Vec::new();

        self.draw_grid(&transform, &mut commands);

        let objects = store.objects();
        if objects.is_empty() {
            return commands;
        }

        self.draw_resource_hull(objects, &transform, &mut commands);

        let hovered = store.hovered();
        for (index, object) in objects.iter().enumerate() {
            self.draw_object(object, index, hovered == Some(index), &transform, &mut commands);
        }

        self.draw_agent_radar(objects, clock_ms, &transform, &mut commands);

        commands
    }

    fn draw_grid(&self, t: &CanvasTransform, out: &mut Vec<DrawCommand>) {
        out.push(DrawCommand::Clear { color: BACKGROUND });

        let grid = LineStyle::solid(0.5, GRID_COLOR);
        let step = self.visual.grid_size;
        let mut x = 0.0;
        while x <= t.size.x {
            out.push(DrawCommand::line(t.origin + Vec2::new(x, 0.0), t.origin + Vec2::new(x, t.size.y), grid));
            x += step;
        }
        let mut y = 0.0;
        while y <= t.size.y {
            out.push(DrawCommand::line(t.origin + Vec2::new(0.0, y), t.origin + Vec2::new(t.size.x, y), grid));
            y += step;
        }

        let axis = LineStyle::solid(1.0, AXIS_COLOR);
        out.push(DrawCommand::line(Pos2::new(t.left(), t.bottom()), Pos2::new(t.right(), t.bottom()), axis));
        out.push(DrawCommand::line(Pos2::new(t.left(), t.bottom()), Pos2::new(t.left(), t.top()), axis));

        let plot = t.plot_size();
        for i in 0..=AXIS_STEPS {
            let fraction = i as f32 / AXIS_STEPS as f32;
            let text = format!("{fraction:.1}");
            out.push(DrawCommand::Text {
                pos: Pos2::new(t.left() + fraction * plot.x, t.bottom() + 5.0),
                anchor: Align2::CENTER_TOP,
                text: text.clone(),
                size: 10.0,
                color: AXIS_COLOR,
            });
            out.push(DrawCommand::Text {
                pos: Pos2::new(t.left() - 5.0, t.bottom() - fraction * plot.y),
                anchor: Align2::RIGHT_CENTER,
                text,
                size: 10.0,
                color: AXIS_COLOR,
            });
        }

        let crosshair = LineStyle::dashed(1.0, CROSSHAIR_COLOR, Dash::new(5.0, 5.0));
        let center = t.center();
        out.push(DrawCommand::line(Pos2::new(center.x, t.top()), Pos2::new(center.x, t.bottom()), crosshair));
        out.push(DrawCommand::line(Pos2::new(t.left(), center.y), Pos2::new(t.right(), center.y), crosshair));
    }

    fn draw_resource_hull(&self, objects: &[DetectedObject], t: &CanvasTransform, out: &mut Vec<DrawCommand>) {
        let centers =
            objects.iter().filter(|o| o.class_id == self.classes.resource).map(DetectedObject::center).collect_vec();

        let hull = convex_hull(&centers);
        if hull.is_empty() {
            return;
        }

        let color = self.registry.lookup(self.classes.resource).colors.primary.with_opacity(HULL_OPACITY);
        out.push(DrawCommand::polygon(
            hull.into_iter().map(|p| t.to_screen(p)).collect_vec(),
            LineStyle::solid(1.0, color),
        ));
    }

    fn draw_object(
        &self,
        object: &DetectedObject,
        index: usize,
        is_hovered: bool,
        t: &CanvasTransform,
        out: &mut Vec<DrawCommand>,
    ) {
        let object_type = self.registry.lookup(object.class_id);
        let primary = object_type.colors.primary;
        let secondary = object_type.colors.secondary;
        let stroke_color = if is_hovered { primary } else { primary.with_alpha(DIM_STROKE_ALPHA) };

        let outline: Vec<Pos2> = object.corners().iter().map(|&p| t.to_screen(p)).collect();
        out.push(DrawCommand::polygon(
            outline.clone(),
            LineStyle::dashed(1.0, primary.with_alpha(TRACE_ALPHA), Dash::new(2.0, 2.0)),
        ));
        out.push(DrawCommand::polygon(outline, LineStyle::solid(if is_hovered { 2.0 } else { 1.0 }, stroke_color)));

        let center = t.to_screen(object.center());
        let radius = self.visual.point_radius;
        self.draw_reticle(center, radius, object.is_locked() || is_hovered, primary, secondary, out);

        out.push(DrawCommand::Disc {
            center,
            radius: if is_hovered { radius + HOVER_RADIUS_BONUS } else { radius },
            color: stroke_color,
        });

        let confidence = (object.confidence * 100.0).round() as i64;
        out.push(DrawCommand::Text {
            pos: center + LABEL_OFFSET,
            anchor: Align2::LEFT_BOTTOM,
            text: self.registry.object_id(object.class_id, index),
            size: if is_hovered { 12.0 } else { 10.0 },
            color: primary,
        });
        out.push(DrawCommand::Text {
            pos: center + SUBLABEL_OFFSET,
            anchor: Align2::LEFT_BOTTOM,
            text: format!("{} [{}%]", object_type.name, confidence),
            size: 8.0,
            color: secondary,
        });
    }

    fn draw_reticle(
        &self,
        center: Pos2,
        radius: f32,
        emphasized: bool,
        primary: Rgba,
        secondary: Rgba,
        out: &mut Vec<DrawCommand>,
    ) {
        let dim = |c: Rgba| if emphasized { c } else { c.with_alpha(DIM_RETICLE_ALPHA) };
        let ring = LineStyle::solid(1.0, dim(primary));

        out.push(DrawCommand::CircleOutline { center, radius: radius + RETICLE_RING_OFFSET, style: ring });

        let s = RETICLE_CROSS_SIZE;
        out.push(DrawCommand::line(center - Vec2::new(s, 0.0), center + Vec2::new(s, 0.0), ring));
        out.push(DrawCommand::line(center - Vec2::new(0.0, s), center + Vec2::new(0.0, s), ring));

        let bracket = LineStyle::solid(1.0, dim(secondary));
        let reach = radius + RETICLE_BRACKET_OFFSET;
        for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = center + Vec2::new(dx * reach, dy * reach);
            out.push(DrawCommand::Path {
                points: vec![
                    corner + Vec2::new(0.0, dy * RETICLE_BRACKET_SIZE),
                    corner,
                    corner + Vec2::new(dx * RETICLE_BRACKET_SIZE, 0.0),
                ],
                closed: false,
                style: bracket,
            });
        }
    }

    fn draw_agent_radar(
        &self,
        objects: &[DetectedObject],
        clock_ms: f64,
        t: &CanvasTransform,
        out: &mut Vec<DrawCommand>,
    ) {
        let colors = self.registry.lookup(self.classes.agent).colors;

        for (agent_index, agent) in objects.iter().filter(|o| o.class_id == self.classes.agent).enumerate() {
            let center = t.to_screen(agent.center());

            for ring in 0..RADAR_RING_COUNT {
                let state = RadarRing::at(clock_ms, ring, agent_index);
                let alpha = state.alpha as f32;

                out.push(DrawCommand::CircleOutline {
                    center,
                    radius: state.radius as f32,
                    style: LineStyle::dashed(
                        2.0 - ring as f32 * 0.3,
                        colors.primary.with_opacity(alpha),
                        Dash::new(4.0, 4.0),
                    ),
                });
                out.push(DrawCommand::line(
                    center,
                    state.point_at(center, state.radius),
                    LineStyle::solid(1.0, colors.secondary.with_opacity(alpha * 0.8)),
                ));
                out.push(DrawCommand::Disc {
                    center: state.point_at(center, state.radius * RADAR_DOT_DISTANCE),
                    radius: RADAR_DOT_RADIUS,
                    color: colors.secondary.with_opacity(alpha),
                });
            }
        }
    }
}
