// crates/visoai-ui/src/modules/export_module.rs
//
// Render settings, the render button, job status, and Save As… for the
// finished file. Status comes from the Editor's RenderJob; this panel never
// talks to the worker directly.

use egui::{Color32, Margin, RichText, Stroke, Ui};

use visoai_core::commands::EditorCommand;
use visoai_core::config::VideoCodecMode;
use visoai_core::helpers::time::format_duration;
use visoai_core::render_job::RenderStatus;

use super::{EditorModule, PanelView};
use crate::theme::{ACCENT, DARK_BG_0, DARK_BG_2, DARK_BORDER, DARK_TEXT_DIM, ERROR, TRACK_AUDIO};

const BAR_BG: Color32 = DARK_BG_0;

pub struct ExportModule;

fn codec_label(mode: &VideoCodecMode) -> &'static str {
    match mode {
        VideoCodecMode::Reencode { .. } => "Re-encode (frame accurate)",
        VideoCodecMode::Copy            => "Stream copy (fast)",
    }
}

impl EditorModule for ExportModule {
    fn name(&self) -> &str { "Export" }

    fn ui(&mut self, ui: &mut Ui, view: &PanelView<'_>, cmd: &mut Vec<EditorCommand>) {
        egui::Frame::new()
            .fill(DARK_BG_2)
            .inner_margin(Margin { left: 8, right: 8, top: 6, bottom: 6 })
            .show(ui, |ui| {
                ui.label(RichText::new("🎞 Export").size(12.0).strong());
            });
        ui.add_space(6.0);

        let render   = view.editor.render();
        let encoding = render.is_encoding();

        // ── Settings ─────────────────────────────────────────────────────────
        ui.label(RichText::new("Video").size(10.0).color(DARK_TEXT_DIM));
        let current = &view.config.codec.video;
        ui.add_enabled_ui(!encoding, |ui| {
            egui::ComboBox::from_id_salt("video_codec")
                .width(ui.available_width())
                .selected_text(codec_label(current))
                .show_ui(ui, |ui| {
                    for mode in [VideoCodecMode::default(), VideoCodecMode::Copy] {
                        let selected = std::mem::discriminant(&mode) == std::mem::discriminant(current);
                        if ui.selectable_label(selected, codec_label(&mode)).clicked() && !selected {
                            cmd.push(EditorCommand::SetVideoCodec(mode));
                        }
                    }
                });
        });
        ui.label(
            RichText::new(format!("Audio: AAC {} kb/s", view.config.codec.audio_bitrate_kbps))
                .size(10.0).color(DARK_TEXT_DIM),
        );
        ui.add_space(8.0);

        // ── Alignment summary ────────────────────────────────────────────────
        match view.editor.reconcile_preview() {
            Some(plan) => {
                ui.label(RichText::new(format!(
                    "Output {}  ·  audio {}",
                    format_duration(plan.video_len), format_duration(plan.audio_len),
                )).size(10.0));
                if plan.needs_delay() {
                    ui.label(RichText::new(format!("Audio delayed {:.2}s", plan.leading_delay))
                        .size(10.0).color(DARK_TEXT_DIM));
                }
                if plan.needs_padding() {
                    ui.label(RichText::new(format!("{:.2}s of silence appended", plan.silence_padding))
                        .size(10.0).color(DARK_TEXT_DIM));
                }
            }
            None => {
                ui.label(RichText::new("Load a video and an audio track to render")
                    .size(10.0).color(DARK_TEXT_DIM));
            }
        }
        ui.add_space(8.0);

        let can_render = !encoding && view.editor.reconcile_preview().is_some();
        let render_btn = egui::Button::new(RichText::new("⚙  Render").size(12.0).strong())
            .min_size(egui::vec2(ui.available_width(), 30.0));
        if ui.add_enabled(can_render, render_btn).clicked() {
            cmd.push(EditorCommand::Render);
        }
        ui.add_space(10.0);

        // ── Status ───────────────────────────────────────────────────────────
        match render.status() {
            RenderStatus::Idle => {}
            RenderStatus::Encoding => {
                let pct = render.progress_percent();
                ui.label(RichText::new(format!("Rendering… {pct}%")).size(11.0).color(ACCENT));
                let (bar, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 8.0), egui::Sense::hover());
                let p = ui.painter();
                p.rect_filled(bar, 4.0, BAR_BG);
                if pct > 0 {
                    let mut fill = bar;
                    fill.max.x = bar.min.x + bar.width() * (pct as f32 / 100.0);
                    p.rect_filled(fill, 4.0, ACCENT);
                }
                ui.ctx().request_repaint();
            }
            RenderStatus::Done => {
                banner(ui, Color32::from_rgb(24, 52, 34), TRACK_AUDIO, "✔  Render complete");
                ui.add_space(6.0);
                let save = egui::Button::new(RichText::new("💾  Save As…").size(11.0))
                    .min_size(egui::vec2(ui.available_width(), 28.0));
                if ui.add(save).clicked() {
                    cmd.push(EditorCommand::SaveOutput);
                }
            }
            RenderStatus::Failed => {
                let msg = render.error_message().unwrap_or("unknown error");
                banner(ui, Color32::from_rgb(60, 25, 25), ERROR, &format!("✖  {msg}"));
                ui.add_space(6.0);
                let dismiss = egui::Button::new(RichText::new("Dismiss").size(11.0).color(DARK_TEXT_DIM))
                    .stroke(Stroke::new(1.0, DARK_BORDER))
                    .min_size(egui::vec2(ui.available_width(), 26.0));
                if ui.add(dismiss).clicked() {
                    cmd.push(EditorCommand::DismissRenderError);
                }
            }
        }
    }
}

fn banner(ui: &mut Ui, fill: Color32, color: Color32, text: &str) {
    egui::Frame::new()
        .fill(fill)
        .stroke(Stroke::new(1.0, color))
        .corner_radius(egui::CornerRadius::same(4))
        .inner_margin(Margin::same(8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(text).size(11.0).color(color));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_labels_are_distinct() {
        assert_ne!(codec_label(&VideoCodecMode::default()), codec_label(&VideoCodecMode::Copy));
        let custom = VideoCodecMode::Reencode { preset: "slow".into() };
        assert_eq!(codec_label(&custom), codec_label(&VideoCodecMode::default()));
    }
}
