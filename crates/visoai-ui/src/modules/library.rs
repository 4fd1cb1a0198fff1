// crates/visoai-ui/src/modules/library.rs
//
// Stored videos from the user-video backend. Loading one installs it as the
// video track and its own soundtrack as the audio track.

use egui::{Align, Layout, RichText, Ui};

use visoai_core::commands::EditorCommand;

use super::{EditorModule, PanelView};
use crate::helpers::format::{fit_label, prompt_title};
use crate::theme::{DARK_BG_2, DARK_BG_3, DARK_TEXT_DIM};

pub struct LibraryModule;

impl EditorModule for LibraryModule {
    fn name(&self) -> &str { "Stored videos" }

    fn ui(&mut self, ui: &mut Ui, view: &PanelView<'_>, cmd: &mut Vec<EditorCommand>) {
        let lib = view.library;

        // First paint fetches the list once.
        if !lib.fetched && !lib.refreshing {
            cmd.push(EditorCommand::RefreshLibrary);
        }

        egui::Frame::new()
            .fill(DARK_BG_2)
            .inner_margin(egui::Margin { left: 8, right: 8, top: 6, bottom: 6 })
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("🗂 Stored videos").size(12.0).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.add_enabled(!lib.refreshing, egui::Button::new(RichText::new("⟳").size(11.0)))
                            .on_hover_text("Refresh")
                            .clicked()
                        {
                            cmd.push(EditorCommand::RefreshLibrary);
                        }
                        if lib.refreshing {
                            ui.spinner();
                        }
                    });
                });
            });

        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if lib.videos.is_empty() {
                ui.add_space(30.0);
                ui.vertical_centered(|ui| {
                    let msg = if lib.refreshing { "Fetching…" } else { "No stored videos" };
                    ui.label(RichText::new(msg).size(11.0).color(DARK_TEXT_DIM));
                });
                return;
            }

            let row_w = ui.available_width();
            for video in &lib.videos {
                let busy = lib.busy == Some(video.id);
                egui::Frame::new()
                    .fill(DARK_BG_3)
                    .corner_radius(4)
                    .inner_margin(egui::Margin::same(6))
                    .show(ui, |ui| {
                        ui.set_width(row_w - 12.0);
                        let title = prompt_title(&video.prompt, video.id);
                        ui.label(RichText::new(fit_label(&title, row_w - 24.0)).size(11.0))
                            .on_hover_text(video.prompt.as_str());
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(format!("#{}", video.id)).size(9.5).color(DARK_TEXT_DIM));
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                let idle = lib.busy.is_none();
                                if ui.add_enabled(idle, egui::Button::new(RichText::new("🗑").size(10.0)))
                                    .on_hover_text("Delete from storage")
                                    .clicked()
                                {
                                    cmd.push(EditorCommand::DeleteStoredVideo(video.id));
                                }
                                if ui.add_enabled(idle, egui::Button::new(RichText::new("Load").size(10.0))).clicked() {
                                    cmd.push(EditorCommand::LoadStoredVideo(video.id));
                                }
                                if busy {
                                    ui.spinner();
                                }
                            });
                        });
                    });
                ui.add_space(4.0);
            }
        });
    }
}
