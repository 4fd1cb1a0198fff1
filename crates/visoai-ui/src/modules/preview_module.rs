// crates/visoai-ui/src/modules/preview_module.rs
use egui::{pos2, Color32, Rect, RichText, Sense, Stroke, Ui, Vec2};

use visoai_core::commands::EditorCommand;
use visoai_core::helpers::time::format_time;
use visoai_core::track::TrackKind;

use super::{EditorModule, PanelView};
use crate::theme::{ACCENT, DARK_BG_2, DARK_BORDER, DARK_TEXT_DIM};

const FOOTER_H: f32 = 22.0;

pub struct PreviewModule;

/// Largest `aspect`-shaped box that fits inside `avail`.
pub fn fit_aspect(avail: Vec2, aspect: f32) -> Vec2 {
    if !(aspect.is_finite() && aspect > 0.0) || avail.x <= 0.0 || avail.y <= 0.0 {
        return Vec2::ZERO;
    }
    let h = avail.x / aspect;
    if h <= avail.y { Vec2::new(avail.x, h) } else { Vec2::new(avail.y * aspect, avail.y) }
}

impl EditorModule for PreviewModule {
    fn name(&self) -> &str { "Preview" }

    fn ui(&mut self, ui: &mut Ui, view: &PanelView<'_>, _cmd: &mut Vec<EditorCommand>) {
        let editor = view.editor;

        egui::Frame::new()
            .fill(DARK_BG_2)
            .inner_margin(egui::Margin { left: 8, right: 8, top: 5, bottom: 5 })
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("📺 Preview").size(12.0).strong());
                    if let Some(t) = editor.tracks().get(TrackKind::Video) {
                        ui.label(RichText::new(&t.label).size(11.0).color(DARK_TEXT_DIM));
                    }
                });
            });
        ui.add_space(4.0);

        let aspect = view.video_size
            .map(|(w, h)| w as f32 / h.max(1) as f32)
            .or_else(|| view.frame.map(|f| f.aspect_ratio()))
            .unwrap_or(16.0 / 9.0);

        let avail  = Vec2::new(ui.available_width(), (ui.available_height() - FOOTER_H).max(60.0));
        let (outer, _) = ui.allocate_exact_size(avail, Sense::hover());
        let canvas = Rect::from_center_size(outer.center(), fit_aspect(avail, aspect));
        let painter = ui.painter();

        let border = if editor.is_playing() {
            Stroke::new(1.5, ACCENT.gamma_multiply(0.55))
        } else {
            Stroke::new(1.0, DARK_BORDER)
        };
        painter.rect_stroke(canvas.expand(1.0), 4.0, border, egui::StrokeKind::Outside);
        painter.rect_filled(canvas, 3.0, Color32::BLACK);

        match view.frame {
            Some(tex) => {
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(tex.id(), canvas, uv, Color32::WHITE);
            }
            None => {
                let msg = if editor.tracks().video.is_some() { "Decoding…" } else { "Load a video to preview" };
                painter.text(
                    canvas.center(), egui::Align2::CENTER_CENTER, msg,
                    egui::FontId::proportional(13.0), DARK_TEXT_DIM,
                );
            }
        }

        ui.horizontal(|ui| {
            ui.label(RichText::new(format_time(editor.current_time())).monospace().size(11.0));
            if editor.clock().has_pending_audio_start() {
                ui.label(RichText::new("audio starts later").size(10.0).color(DARK_TEXT_DIM));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_source_fills_width() {
        let s = fit_aspect(Vec2::new(800.0, 600.0), 16.0 / 9.0);
        assert_eq!(s.x, 800.0);
        assert!((s.y - 450.0).abs() < 0.01);
    }

    #[test]
    fn tall_source_fills_height() {
        let s = fit_aspect(Vec2::new(800.0, 600.0), 9.0 / 16.0);
        assert_eq!(s.y, 600.0);
        assert!((s.x - 337.5).abs() < 0.01);
    }

    #[test]
    fn degenerate_inputs_give_zero() {
        assert_eq!(fit_aspect(Vec2::new(800.0, 600.0), 0.0), Vec2::ZERO);
        assert_eq!(fit_aspect(Vec2::new(0.0, 600.0), 1.0), Vec2::ZERO);
    }
}
