// crates/visoai-ui/src/modules/timeline.rs
//
// Transport bar, one range slider per track, and the playhead lane.
//
// Each slider spans its own track's full duration. The playhead lane is
// scaled against the longer of the two tracks.

use egui::{pos2, vec2, Align, Color32, Layout, Rect, RichText, Sense, Shape, Stroke, Ui};

use visoai_core::commands::EditorCommand;
use visoai_core::helpers::scale::TimelineScale;
use visoai_core::helpers::time::{format_duration, format_time};
use visoai_core::track::TrackKind;

use super::{EditorModule, PanelView};
use crate::helpers::format::fit_label;
use crate::helpers::range_slider::{range_slider, SLIDER_H};
use crate::theme::{track_color, ACCENT, DARK_BG_0, DARK_BG_2, DARK_BORDER, DARK_TEXT_DIM, PLAYHEAD};

const LABEL_W: f32 = 150.0;
const LANE_H:  f32 = 26.0;
const VOL_W:   f32 = 90.0;

pub struct TimelineModule;

impl EditorModule for TimelineModule {
    fn name(&self) -> &str { "Timeline" }

    fn ui(&mut self, ui: &mut Ui, view: &PanelView<'_>, cmd: &mut Vec<EditorCommand>) {
        let editor  = view.editor;
        let playing = editor.is_playing();
        let has_video = editor.tracks().video.is_some();

        if ui.input(|i| i.key_pressed(egui::Key::Space)) && has_video {
            cmd.push(EditorCommand::TogglePlayback);
        }

        // ── Transport ────────────────────────────────────────────────────────
        egui::Frame::new()
            .fill(DARK_BG_2)
            .inner_margin(egui::Margin { left: 8, right: 8, top: 5, bottom: 5 })
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    // Playback always restarts from the video trim start, so
                    // there is no pause.
                    let (label, action) = if playing {
                        ("⏹ Stop", EditorCommand::Stop)
                    } else {
                        ("▶ Play", EditorCommand::Play)
                    };
                    if ui.add_enabled(has_video, egui::Button::new(label)).clicked() {
                        cmd.push(action);
                    }

                    ui.separator();
                    let end = editor.tracks().video.as_ref().map(|t| t.trim_end()).unwrap_or(0.0);
                    ui.label(
                        RichText::new(format!("{} / {}", format_time(editor.current_time()), format_time(end)))
                            .monospace()
                            .color(if playing { ACCENT } else { DARK_TEXT_DIM }),
                    );

                    ui.separator();
                    ui.label("🔊");
                    let mut vol = view.volume;
                    let slider = egui::Slider::new(&mut vol, 0.0..=1.0).show_value(false);
                    if ui.add_sized([VOL_W, 18.0], slider).changed() {
                        cmd.push(EditorCommand::SetVolume(vol));
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("🎵 Load audio").clicked() {
                            cmd.push(EditorCommand::PickFile(TrackKind::Audio));
                        }
                        if ui.button("🎬 Load video").clicked() {
                            cmd.push(EditorCommand::PickFile(TrackKind::Video));
                        }
                        if view.loading > 0 {
                            ui.spinner();
                            ui.label(RichText::new("Loading…").size(11.0).color(DARK_TEXT_DIM));
                        }
                    });
                });
            });

        ui.add_space(6.0);

        // ── Track rows ───────────────────────────────────────────────────────
        for kind in TrackKind::ALL {
            ui.horizontal(|ui| {
                ui.allocate_ui_with_layout(
                    vec2(LABEL_W, SLIDER_H),
                    Layout::top_down(Align::Min),
                    |ui| track_label(ui, view, kind),
                );
                match editor.tracks().get(kind) {
                    Some(track) => {
                        range_slider(ui, kind, &track.trim, !playing, cmd);
                    }
                    None => {
                        let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), SLIDER_H), Sense::hover());
                        ui.painter().rect_stroke(
                            rect.shrink(2.0), 3.0, Stroke::new(1.0, DARK_BORDER), egui::StrokeKind::Inside,
                        );
                        ui.painter().text(
                            rect.center(), egui::Align2::CENTER_CENTER,
                            format!("No {kind} loaded"),
                            egui::FontId::proportional(11.0), DARK_TEXT_DIM,
                        );
                    }
                }
            });
            ui.add_space(4.0);
        }

        // ── Playhead lane ────────────────────────────────────────────────────
        ui.horizontal(|ui| {
            ui.add_space(LABEL_W + ui.spacing().item_spacing.x);
            playhead_lane(ui, view);
        });
    }
}

fn track_label(ui: &mut Ui, view: &PanelView<'_>, kind: TrackKind) {
    let title = match kind {
        TrackKind::Video => "VIDEO",
        TrackKind::Audio => "AUDIO",
    };
    let track = view.editor.tracks().get(kind);
    ui.horizontal(|ui| {
        ui.label(RichText::new(title).size(10.0).strong().color(track_color(kind)));
        if let Some(t) = track {
            ui.label(RichText::new(fit_label(&t.label, LABEL_W - 48.0)).size(10.0))
                .on_hover_text(t.label.as_str());
        }
    });
    if let Some(t) = track {
        ui.label(
            RichText::new(format!(
                "{} → {} ({})",
                format_time(t.trim_start()), format_time(t.trim_end()), format_duration(t.trim.span()),
            ))
            .size(9.5).monospace().color(DARK_TEXT_DIM),
        );
    }
}

fn playhead_lane(ui: &mut Ui, view: &PanelView<'_>) {
    let editor   = view.editor;
    let longest  = editor.tracks().longest_duration();
    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), LANE_H), Sense::hover());
    let painter  = ui.painter_at(rect);
    painter.rect_filled(rect, 3.0, DARK_BG_0);

    let scale = TimelineScale::new(rect.left(), rect.width(), longest);
    if scale.duration() <= 0.0 {
        return;
    }

    // Trim selections of both tracks, as thin bars.
    for (i, kind) in TrackKind::ALL.into_iter().enumerate() {
        if let Some(t) = editor.tracks().get(kind) {
            let y = rect.top() + 5.0 + i as f32 * 5.0;
            let bar = Rect::from_min_max(
                pos2(scale.secs_to_x(t.trim_start()), y),
                pos2(scale.secs_to_x(t.trim_end()), y + 3.0),
            );
            painter.rect_filled(bar, 1.0, track_color(kind).gamma_multiply(0.7));
        }
    }

    // Second ticks, thinned out so labels never collide.
    let px_per_sec = rect.width() as f64 / longest;
    let step = [1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0]
        .into_iter()
        .find(|s| s * px_per_sec >= 48.0)
        .unwrap_or(600.0);
    let mut t = 0.0;
    while t <= longest {
        let x = scale.secs_to_x(t);
        painter.line_segment(
            [pos2(x, rect.bottom() - 6.0), pos2(x, rect.bottom())],
            Stroke::new(1.0, DARK_BORDER),
        );
        painter.text(
            pos2(x + 2.0, rect.bottom() - 7.0), egui::Align2::LEFT_BOTTOM,
            format_duration(t), egui::FontId::monospace(8.5), DARK_TEXT_DIM,
        );
        t += step;
    }

    let x = scale.secs_to_x(editor.current_time());
    painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], Stroke::new(1.5, PLAYHEAD));
    painter.add(Shape::convex_polygon(
        vec![pos2(x - 5.0, rect.top()), pos2(x + 5.0, rect.top()), pos2(x, rect.top() + 6.0)],
        PLAYHEAD,
        Stroke::NONE,
    ));
    if editor.is_playing() {
        painter.rect_stroke(rect, 3.0, Stroke::new(1.0, Color32::from_white_alpha(24)), egui::StrokeKind::Inside);
    }
}
