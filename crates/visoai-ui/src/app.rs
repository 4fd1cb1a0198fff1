// crates/visoai-ui/src/app.rs (visoai-ui)
use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui;
use rfd::FileDialog;
use serde::{Deserialize, Serialize};

use visoai_core::commands::EditorCommand;
use visoai_core::config::EditorConfig;
use visoai_core::editor::Editor;
use visoai_core::error::RenderFailure;
use visoai_core::media_types::MediaResult;
use visoai_core::playback::{MediaElement, TickHandle, TickOutcome};
use visoai_core::track::{LoadedMedia, TrackKind};
use visoai_core::trim::TrimUpdate;
use visoai_media::{FfmpegCli, MediaWorker};

use crate::context::AppContext;
use crate::helpers::format::prompt_title;
use crate::modules::{
    audio_module::AudioModule,
    export_module::ExportModule,
    library::LibraryModule,
    preview_module::PreviewModule,
    timeline::TimelineModule,
    video_module::{VideoElement, VideoModule},
    EditorModule, PanelView,
};
use crate::theme::{configure_style, ACCENT, DARK_TEXT_DIM};

const VIDEO_EXTS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac", "opus"];

/// Track a dropped file belongs on, by extension.
pub fn kind_for_path(path: &Path) -> Option<TrackKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if VIDEO_EXTS.contains(&ext.as_str()) {
        Some(TrackKind::Video)
    } else if AUDIO_EXTS.contains(&ext.as_str()) {
        Some(TrackKind::Audio)
    } else {
        None
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct AppStorage {
    config: EditorConfig,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct VisoAiApp {
    editor:       Editor,
    config:       EditorConfig,
    context:      AppContext,
    library:      LibraryModule,
    preview:      PreviewModule,
    timeline:     TimelineModule,
    export:       ExportModule,
    /// The two media elements driven by the playback clock.
    audio:        AudioModule,
    video:        VideoModule,
    /// Handle of the running playback session; None when stopped.
    tick:         Option<TickHandle>,
    /// egui input time at the start of this frame, in seconds.
    now:          f64,
    /// Commands emitted by panels each frame, processed after the UI pass.
    pending_cmds: Vec<EditorCommand>,
}

impl VisoAiApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        configure_style(&cc.egui_ctx);
        cc.egui_ctx.options_mut(|o| {
            o.theme_preference = egui::ThemePreference::Dark;
        });

        let config = cc.storage
            .and_then(|s| eframe::get_value::<AppStorage>(s, eframe::APP_KEY))
            .map(|s| s.config)
            .unwrap_or_default()
            .with_env_overrides();
        log::info!("[app] backend {}", config.backend_url);

        let ffmpeg       = FfmpegCli::resolve(config.ffmpeg_path.as_deref());
        let media_worker = MediaWorker::new(ffmpeg)?;

        Ok(Self {
            editor:       Editor::new(config.min_span()),
            config,
            context:      AppContext::new(media_worker),
            library:      LibraryModule,
            preview:      PreviewModule,
            timeline:     TimelineModule,
            export:       ExportModule,
            audio:        AudioModule::new(),
            video:        VideoModule::new(),
            tick:         None,
            now:          0.0,
            pending_cmds: Vec::new(),
        })
    }

    /// Run `f` against the editor with both media elements borrowed.
    fn with_elements<R>(
        &mut self,
        f: impl FnOnce(&mut Editor, &mut dyn MediaElement, &mut dyn MediaElement) -> R,
    ) -> R {
        let mut video = VideoElement { module: &mut self.video, worker: &self.context.media_worker };
        f(&mut self.editor, &mut video, &mut self.audio)
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    fn start_playback(&mut self) {
        let now = self.now;
        match self.with_elements(|ed, v, a| ed.start_playback(v, a, now)) {
            Some(handle) => self.tick = Some(handle),
            None         => self.context.notify("Load a video before playing"),
        }
    }

    fn stop_playback(&mut self) {
        self.with_elements(|ed, v, a| ed.stop_playback(v, a));
        self.tick = None;
    }

    fn tick_playback(&mut self, ctx: &egui::Context) {
        if let Some(handle) = self.tick {
            let now = self.now;
            match self.with_elements(|ed, v, a| ed.tick(handle, v, a, now)) {
                TickOutcome::Playing { .. } => ctx.request_repaint(),
                TickOutcome::Finished { current_time } => {
                    log::debug!("[app] playback finished at {current_time:.3}s");
                    self.tick = None;
                }
                TickOutcome::Stale => self.tick = None,
            }
        }
        for notice in self.editor.take_playback_notices() {
            self.context.notify(notice.to_string());
        }
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    fn load_file(&mut self, kind: TrackKind, path: PathBuf) {
        log::info!("[app] load {kind} from {}", path.display());
        self.context.pending_loads += 1;
        self.context.media_worker.load_file(kind, path);
    }

    fn install(&mut self, media: LoadedMedia) {
        let kind  = media.kind;
        let stray = media.owned.then(|| media.path.clone());

        match self.with_elements(|ed, v, a| ed.install_track(media, v, a).map(|t| t.label.clone())) {
            Ok(label) => {
                self.tick = None;
                let path = self.editor.preview_path(kind).map(Path::to_path_buf);
                match kind {
                    TrackKind::Video => self.video.set_source(path),
                    TrackKind::Audio => self.audio.set_source(path),
                }
                log::info!("[app] {kind} track ready: {label}");
            }
            Err(e) => {
                if let Some(p) = stray {
                    let _ = std::fs::remove_file(p);
                }
                self.context.notify(e.to_string());
            }
        }
    }

    fn pick_file(&mut self, kind: TrackKind) {
        let (name, exts) = match kind {
            TrackKind::Video => ("Video", VIDEO_EXTS),
            TrackKind::Audio => ("Audio", AUDIO_EXTS),
        };
        if let Some(path) = FileDialog::new().add_filter(name, exts).pick_file() {
            self.pending_cmds.push(EditorCommand::LoadFile { kind, path });
        }
    }

    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let files = ctx.input(|i| i.raw.dropped_files.clone());
        for path in files.into_iter().filter_map(|f| f.path) {
            match kind_for_path(&path) {
                Some(kind) => self.pending_cmds.push(EditorCommand::LoadFile { kind, path }),
                None       => self.context.notify(format!("Unsupported file: {}", path.display())),
            }
        }
    }

    // ── Render ────────────────────────────────────────────────────────────────

    fn render(&mut self) {
        let req = match self.editor.begin_render(&self.config.codec) {
            Ok(req) => req,
            Err(e)  => {
                self.context.notify(e.to_string());
                return;
            }
        };
        let job_id = req.job_id;
        let every  = Duration::from_millis(self.config.progress_poll_ms.max(16));
        if let Err(e) = self.context.media_worker.start_render(req, every) {
            // The worker is still busy with a job the editor already dropped.
            self.editor.on_render_failed(job_id, RenderFailure { step: "start".into(), message: e.to_string() });
            self.context.notify(e.to_string());
        }
    }

    fn save_output(&mut self) {
        let Some(src) = self.editor.render_output_path().map(Path::to_path_buf) else {
            self.context.notify("Nothing rendered yet");
            return;
        };
        let Some(dest) = FileDialog::new()
            .set_file_name(&self.config.download_name)
            .add_filter("MP4", &["mp4"])
            .save_file()
        else {
            return;
        };
        match std::fs::copy(&src, &dest) {
            Ok(bytes) => {
                log::info!("[app] saved {bytes} bytes to {}", dest.display());
                self.context.notify(format!("Saved {}", dest.display()));
            }
            Err(e) => self.context.notify(format!("Save failed: {e}")),
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    fn process_command(&mut self, cmd: EditorCommand) {
        match cmd {
            // ── Playback ─────────────────────────────────────────────────────
            EditorCommand::Play => self.start_playback(),
            EditorCommand::Stop => self.stop_playback(),
            EditorCommand::TogglePlayback => {
                if self.editor.is_playing() { self.stop_playback() } else { self.start_playback() }
            }
            EditorCommand::SetVolume(v) => self.audio.set_volume(v),

            // ── Media loading ────────────────────────────────────────────────
            EditorCommand::PickFile(kind) => self.pick_file(kind),
            EditorCommand::LoadFile { kind, path } => self.load_file(kind, path),

            // ── Timeline ─────────────────────────────────────────────────────
            EditorCommand::SetTrim { kind, start, end } => {
                if let TrimUpdate::Rejected = self.editor.update_trim(kind, start, end) {
                    log::debug!("[app] trim {kind} {start}..{end} rejected");
                }
            }

            // ── Stored-video library ─────────────────────────────────────────
            EditorCommand::RefreshLibrary => {
                if !self.context.library.refreshing {
                    self.context.library.refreshing = true;
                    self.context.backend.list(self.config.endpoint("user-videos/"), self.config.token.clone());
                }
            }
            EditorCommand::LoadStoredVideo(id) => {
                match self.context.library.find(id).cloned() {
                    Some(video) => {
                        self.context.library.busy = Some(id);
                        let label = prompt_title(&video.prompt, id);
                        self.context.backend.decode(video, label);
                    }
                    None => self.context.notify(format!("Stored video #{id} is no longer listed")),
                }
            }
            EditorCommand::DeleteStoredVideo(id) => {
                self.context.library.busy = Some(id);
                let url = self.config.endpoint(&format!("delete-video/{id}/"));
                self.context.backend.delete(url, self.config.token.clone(), id);
            }

            // ── Export ───────────────────────────────────────────────────────
            EditorCommand::Render             => self.render(),
            EditorCommand::SaveOutput         => self.save_output(),
            EditorCommand::DismissRenderError => self.editor.dismiss_render_failure(),
            EditorCommand::SetVideoCodec(mode) => {
                log::info!("[app] video codec → {mode:?}");
                self.config.codec.video = mode;
            }

            // ── View ─────────────────────────────────────────────────────────
            EditorCommand::DismissNotice(idx) => self.context.dismiss_notice(idx),
        }
    }

    fn poll_media(&mut self, ctx: &egui::Context) {
        self.context.ingest_backend_results();

        while let Ok(result) = self.context.media_worker.rx.try_recv() {
            match result {
                MediaResult::TrackLoaded(media) => {
                    self.context.pending_loads = self.context.pending_loads.saturating_sub(1);
                    self.install(media);
                }
                MediaResult::StoredVideoLoaded { video, audio } => {
                    self.context.pending_loads = self.context.pending_loads.saturating_sub(1);
                    self.install(video);
                    self.install(audio);
                }
                MediaResult::LoadFailed(e) => {
                    self.context.pending_loads = self.context.pending_loads.saturating_sub(1);
                    self.context.notify(e.to_string());
                }
                MediaResult::RenderProgress { job_id, fraction } => {
                    self.editor.on_render_progress(job_id, fraction);
                }
                MediaResult::RenderDone { job_id, path } => {
                    if self.editor.on_render_done(job_id, path.clone()) {
                        self.context.notify("Render complete");
                    } else {
                        let _ = std::fs::remove_file(&path);
                    }
                }
                MediaResult::RenderFailed { job_id, failure } => {
                    if self.editor.on_render_failed(job_id, failure.clone()) {
                        self.context.notify(failure.to_string());
                    }
                }
                MediaResult::VideoSize { width, height } => {
                    self.context.video_size = Some((width, height));
                }
            }
        }

        self.video.poll(&self.context.media_worker, self.editor.current_time(), ctx);
    }
}

// ── eframe::App ───────────────────────────────────────────────────────────────

impl eframe::App for VisoAiApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &AppStorage { config: self.config.clone() });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let released = self.with_elements(|ed, v, a| ed.teardown(v, a));
        log::info!("[app] exit: released {released} preview handles");
        self.context.media_worker.shutdown();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.now = ctx.input(|i| i.time);
        self.audio.warm_up();
        self.handle_drag_and_drop(ctx);
        self.poll_media(ctx);

        let view = PanelView {
            editor:     &self.editor,
            config:     &self.config,
            library:    &self.context.library,
            frame:      self.video.texture(),
            video_size: self.context.video_size,
            volume:     self.audio.volume(),
            loading:    self.context.pending_loads,
        };
        let notices = &self.context.notices;

        egui::TopBottomPanel::top("top_panel")
            .exact_height(36.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(egui::RichText::new("✦ VisoAI Editor").strong().size(15.0).color(ACCENT));
                    ui.separator();
                    if notices.is_empty() {
                        ui.label(
                            egui::RichText::new("Drop a video and an audio file, trim, render")
                                .size(12.0).color(DARK_TEXT_DIM),
                        );
                    }
                    for (i, n) in notices.iter().enumerate().rev() {
                        ui.label(egui::RichText::new(n).size(11.0));
                        if ui.small_button("✕").clicked() {
                            self.pending_cmds.push(EditorCommand::DismissNotice(i));
                        }
                        ui.separator();
                    }
                });
            });

        egui::TopBottomPanel::bottom("timeline_panel")
            .resizable(true)
            .min_height(150.0)
            .default_height(170.0)
            .show(ctx, |ui| {
                self.timeline.ui(ui, &view, &mut self.pending_cmds);
            });

        egui::SidePanel::left("library_panel")
            .resizable(true)
            .default_width(230.0)
            .min_width(170.0)
            .show(ctx, |ui| {
                self.library.ui(ui, &view, &mut self.pending_cmds);
            });

        egui::SidePanel::right("export_panel")
            .resizable(true)
            .default_width(230.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                self.export.ui(ui, &view, &mut self.pending_cmds);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview.ui(ui, &view, &mut self.pending_cmds);
        });

        // ── Process commands emitted by panels this frame ─────────────────────
        let cmds: Vec<EditorCommand> = self.pending_cmds.drain(..).collect();
        for cmd in cmds {
            self.process_command(cmd);
        }

        self.tick_playback(ctx);

        if self.editor.render().is_encoding() || self.context.pending_loads > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_files_route_by_extension() {
        assert_eq!(kind_for_path(Path::new("/tmp/clip.MP4")), Some(TrackKind::Video));
        assert_eq!(kind_for_path(Path::new("song.mp3")), Some(TrackKind::Audio));
        assert_eq!(kind_for_path(Path::new("notes.txt")), None);
        assert_eq!(kind_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn storage_never_contains_the_token() {
        let mut config = EditorConfig::default();
        config.token = Some("tok".into());
        let json = serde_json::to_string(&AppStorage { config }).unwrap();
        assert!(!json.contains("tok"));
        let back: AppStorage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.config.token, None);
    }
}
