// crates/visoai-ui/src/modules/mod.rs
//
// Panel registry. Panels implement EditorModule, read a PanelView, and emit
// EditorCommands; app.rs applies the commands after the UI pass.
//
// audio_module and video_module have no panel. They are the editor's two
// media elements and implement visoai_core::playback::MediaElement.

pub mod audio_module;
pub mod export_module;
pub mod library;
pub mod preview_module;
pub mod timeline;
pub mod video_module;

use egui::{TextureHandle, Ui};

use visoai_core::commands::EditorCommand;
use visoai_core::config::EditorConfig;
use visoai_core::editor::Editor;

use crate::context::LibraryState;

/// Read-only snapshot handed to every panel for one frame.
pub struct PanelView<'a> {
    pub editor:     &'a Editor,
    pub config:     &'a EditorConfig,
    pub library:    &'a LibraryState,
    /// Latest decoded preview frame of the video track.
    pub frame:      Option<&'a TextureHandle>,
    pub video_size: Option<(u32, u32)>,
    pub volume:     f32,
    /// Number of probe/load jobs still running.
    pub loading:    usize,
}

pub trait EditorModule {
    fn name(&self) -> &str;
    fn ui(&mut self, ui: &mut Ui, view: &PanelView<'_>, cmd: &mut Vec<EditorCommand>);
}
