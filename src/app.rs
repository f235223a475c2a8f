use std::f32::consts::TAU;
use std::time::Instant;

use egui::Color32;
use egui::CornerRadius;
use egui::FontId;
use egui::Pos2;
use egui::Rect;
use egui::Shape;
use egui::Stroke;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::draw_command::DrawCommand;
use crate::draw_command::LineStyle;
use crate::frame_source::FrameSource;
use crate::frame_store::FrameStore;
use crate::icons;
use crate::loader::FrameLoader;
use crate::object_types::ObjectTypeRegistry;
use crate::panel::DataPanel;
use crate::playback::LoadOutcome;
use crate::playback::PlaybackController;
use crate::playback::PlaybackState;
use crate::renderer::FrameRenderer;

/// Segments used to approximate a dashed circle.
const CIRCLE_SEGMENTS: usize = 64;
const PANEL_WIDTH: f32 = 280.0;

pub struct ReplayViewerApp {
    store: FrameStore,
    renderer: FrameRenderer,
    controller: PlaybackController,
    loader: FrameLoader,
    panel: DataPanel,
}

impl ReplayViewerApp {
    /// Called once before the first frame. Kicks off the initial frame load.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        registry: ObjectTypeRegistry,
        source: Box<dyn FrameSource>,
    ) -> Self {
        // Include phosphor icons
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let repaint_ctx = cc.egui_ctx.clone();
        let loader = FrameLoader::spawn(source, move || repaint_ctx.request_repaint());

        let mut controller = PlaybackController::new(&config.playback);
        loader.request(controller.start());

        Self {
            store: FrameStore::new(&config.playback),
            renderer: FrameRenderer::new(config.visual, config.classes, registry),
            controller,
            loader,
            panel: DataPanel,
        }
    }

    fn drain_loads(&mut self, ctx: &egui::Context, now: Instant) {
        while let Some(response) = self.loader.try_recv() {
            match self.controller.complete(response, &mut self.store, now) {
                LoadOutcome::Applied | LoadOutcome::Failed => ctx.request_repaint(),
                LoadOutcome::Stale => {}
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context, now: Instant) {
        let (toggle, forward, backward) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowLeft),
            )
        });

        if toggle {
            self.controller.toggle(now);
        }
        let current = self.store.frame_number();
        let step = if forward {
            self.controller.step_forward(current)
        } else if backward {
            self.controller.step_backward(current)
        } else {
            None
        };
        if let Some(request) = step {
            self.loader.request(request);
        }
    }
}

impl eframe::App for ReplayViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_loads(ctx, now);
        self.handle_keys(ctx, now);
        if let Some(request) = self.controller.poll_timer(now, self.store.frame_number()) {
            self.loader.request(request);
        }

        egui::TopBottomPanel::bottom("controls_hint").show(ctx, |ui| {
            let hint = match self.controller.state() {
                PlaybackState::Playing => format!("{} SPACE pause", icons::KEYBOARD),
                PlaybackState::Paused => format!("{} SPACE play  \u{2190}/\u{2192} step", icons::KEYBOARD),
            };
            ui.label(egui::RichText::new(hint).monospace().weak());
        });

        egui::SidePanel::right("data_panel").resizable(true).default_width(PANEL_WIDTH).show(ctx, |ui| {
            let hovered = self.panel.show(ui, &self.store, self.renderer.registry(), self.controller.state());
            if hovered != self.store.hovered_raw() {
                self.store.set_hovered(hovered);
                ctx.request_repaint();
            }
        });

        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
            let rect = response.rect;
            if self.renderer.set_canvas(rect.min, rect.size()) {
                debug!(width = rect.width(), height = rect.height(), "Canvas resized");
            }
            for command in self.renderer.render(&self.store) {
                paint_command(&painter, rect, command);
            }
        });

        if let Some(wait) = self.controller.time_until_tick(now) {
            ctx.request_repaint_after(wait);
        }
    }
}

fn paint_command(painter: &egui::Painter, rect: Rect, command: DrawCommand) {
    match command {
        DrawCommand::Clear { color } => {
            painter.rect_filled(rect, CornerRadius::ZERO, Color32::from(color));
        }
        DrawCommand::Path { points, closed, style } => {
            painter.extend(path_shapes(points, closed, &style));
        }
        DrawCommand::CircleOutline { center, radius, style } => {
            painter.extend(circle_shapes(center, radius, &style));
        }
        DrawCommand::Disc { center, radius, color } => {
            painter.circle_filled(center, radius, Color32::from(color));
        }
        DrawCommand::Text { pos, anchor, text, size, color } => {
            painter.text(pos, anchor, text, FontId::monospace(size), Color32::from(color));
        }
    }
}

fn stroke(style: &LineStyle) -> Stroke {
    Stroke::new(style.width, Color32::from(style.color))
}

fn path_shapes(mut points: Vec<Pos2>, closed: bool, style: &LineStyle) -> Vec<Shape> {
    if points.len() < 2 {
        return Vec::new();
    }
    match style.dash {
        Some(dash) => {
            if closed {
                points.push(points[0]);
            }
            Shape::dashed_line(&points, stroke(style), dash.on, dash.off)
        }
        None if closed => vec![Shape::closed_line(points, stroke(style))],
        None => vec![Shape::line(points, stroke(style))],
    }
}

fn circle_shapes(center: Pos2, radius: f32, style: &LineStyle) -> Vec<Shape> {
    if style.dash.is_none() {
        return vec![Shape::circle_stroke(center, radius, stroke(style))];
    }
    let points = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
            center + radius * egui::vec2(angle.cos(), angle.sin())
        })
        .collect();
    path_shapes(points, true, style)
}
