use egui::Color32;
use egui::RichText;

use crate::color::Rgba;
use crate::frame_store::FrameStore;
use crate::geometry::Point;
use crate::icon_str;
use crate::icons;
use crate::object_types::ObjectTypeRegistry;
use crate::playback::PlaybackState;

const TRACK_CONFIDENCE: f64 = 0.5;
const NOTICE_COLOR: Color32 = Color32::from_rgb(0xff, 0xaa, 0x00);
const HIGHLIGHT_FILL: Color32 = Color32::from_rgb(40, 40, 40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Locked,
    Track,
    Detect,
}

impl TargetStatus {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > crate::frame_store::LOCK_CONFIDENCE {
            TargetStatus::Locked
        } else if confidence > TRACK_CONFIDENCE {
            TargetStatus::Track
        } else {
            TargetStatus::Detect
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetStatus::Locked => "LOCKED",
            TargetStatus::Track => "TRACK",
            TargetStatus::Detect => "DETECT",
        }
    }
}

/// `0.5` → `000.500000`.
pub fn format_coordinate(value: f64) -> String {
    format!("{value:010.6}")
}

/// `0.953` → ` 95.3%`.
pub fn format_confidence(value: f64) -> String {
    format!("{:>6}", format!("{:.1}%", value * 100.0))
}

/// Everything shown for one object in the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEntry {
    pub index: usize,
    pub id: String,
    pub class_name: String,
    pub center: Point,
    pub confidence: f64,
    pub status: TargetStatus,
    pub primary: Rgba,
    pub secondary: Rgba,
    pub highlighted: bool,
}

pub fn panel_entries(store: &FrameStore, registry: &ObjectTypeRegistry) -> Vec<PanelEntry> {
    let hovered = store.hovered();
    store
        .objects()
        .iter()
        .enumerate()
        .map(|(index, object)| {
            let object_type = registry.lookup(object.class_id);
            PanelEntry {
                index,
                id: registry.object_id(object.class_id, index),
                class_name: object_type.name.clone(),
                center: object.center(),
                confidence: object.confidence,
                status: TargetStatus::from_confidence(object.confidence),
                primary: object_type.colors.primary,
                secondary: object_type.colors.secondary,
                highlighted: hovered == Some(index),
            }
        })
        .collect()
}

/// Frame summary lines shown above the object list.
pub fn header_lines(store: &FrameStore, state: PlaybackState, timestamp: &str) -> [String; 4] {
    [
        format!("FRAME_ID: {:04}", store.frame_number()),
        format!("TIMESTAMP: {timestamp}"),
        format!("TARGETS: {:02}", store.objects().len()),
        format!("STATUS: {}", state.label()),
    ]
}

/// Side panel listing the current frame's objects. Hovering an entry selects
/// the object on the canvas.
#[derive(Default)]
pub struct DataPanel;

impl DataPanel {
    /// Draws the panel and returns the index of the entry under the pointer.
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        store: &FrameStore,
        registry: &ObjectTypeRegistry,
        state: PlaybackState,
    ) -> Option<usize> {
        let timestamp = jiff::Timestamp::now().strftime("%H:%M:%S").to_string();
        let state_icon = match state {
            PlaybackState::Playing => icons::PLAY,
            PlaybackState::Paused => icons::PAUSE,
        };

        ui.vertical(|ui| {
            for (i, line) in header_lines(store, state, &timestamp).into_iter().enumerate() {
                let text = if i == 3 { format!("{state_icon} {line}") } else { line };
                ui.label(RichText::new(text).monospace());
            }
        });
        ui.separator();

        let mut hovered = None;
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            let entries = panel_entries(store, registry);
            if entries.is_empty() {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(icon_str!(icons::WARNING, "SYS_MSG")).monospace().strong());
                    ui.label(RichText::new("NO TARGETS DETECTED").monospace().color(NOTICE_COLOR));
                    ui.label(RichText::new("SCANNING...").monospace());
                });
                return;
            }

            for entry in entries {
                let mut frame = egui::Frame::group(ui.style());
                if entry.highlighted {
                    frame = frame.fill(HIGHLIGHT_FILL);
                }
                let response = frame
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new(&entry.id).monospace().strong().color(Color32::from(entry.primary)));
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("CLASS:").monospace());
                            ui.label(
                                RichText::new(&entry.class_name).monospace().strong().color(Color32::from(entry.primary)),
                            );
                        });
                        ui.label(RichText::new(format!("POS_X: {}", format_coordinate(entry.center.x))).monospace());
                        ui.label(RichText::new(format!("POS_Y: {}", format_coordinate(entry.center.y))).monospace());
                        ui.label(RichText::new(format!("CONF: {}", format_confidence(entry.confidence))).monospace());
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("STAT:").monospace());
                            ui.label(
                                RichText::new(entry.status.label())
                                    .monospace()
                                    .strong()
                                    .color(Color32::from(entry.secondary)),
                            );
                        });
                    })
                    .response;
                if response.contains_pointer() {
                    hovered = Some(entry.index);
                }
            }
        });
        hovered
    }
}
