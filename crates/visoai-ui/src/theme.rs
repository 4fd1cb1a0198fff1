// crates/visoai-ui/src/theme.rs
use egui::{Color32, Context, Stroke, Style, Visuals};

use visoai_core::track::TrackKind;

// ── Palette ──────────────────────────────────────────────────────────────────
pub const ACCENT:        Color32 = Color32::from_rgb(120, 140, 255);
pub const ACCENT_DIM:    Color32 = Color32::from_rgb( 70,  84, 170);
pub const ACCENT_HOVER:  Color32 = Color32::from_rgb(160, 175, 255);

pub const DARK_BG_0:     Color32 = Color32::from_rgb( 13,  13,  17);
pub const DARK_BG_1:     Color32 = Color32::from_rgb( 19,  19,  25);
pub const DARK_BG_2:     Color32 = Color32::from_rgb( 27,  27,  35);
pub const DARK_BG_3:     Color32 = Color32::from_rgb( 37,  37,  47);
pub const DARK_BG_4:     Color32 = Color32::from_rgb( 49,  49,  61);

pub const DARK_TEXT:     Color32 = Color32::from_rgb(222, 222, 232);
pub const DARK_TEXT_DIM: Color32 = Color32::from_rgb(122, 122, 140);
pub const DARK_BORDER:   Color32 = Color32::from_rgb( 56,  56,  70);

pub const TRACK_VIDEO:   Color32 = Color32::from_rgb( 59, 130, 246);
pub const TRACK_AUDIO:   Color32 = Color32::from_rgb( 34, 197,  94);
pub const PLAYHEAD:      Color32 = Color32::from_rgb(239,  68,  68);
pub const ERROR:         Color32 = Color32::from_rgb(235,  87,  87);

pub fn track_color(kind: TrackKind) -> Color32 {
    match kind {
        TrackKind::Video => TRACK_VIDEO,
        TrackKind::Audio => TRACK_AUDIO,
    }
}

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();

    style.spacing.item_spacing     = egui::vec2(6.0, 5.0);
    style.spacing.window_margin    = egui::Margin::same(10);
    style.spacing.button_padding   = egui::vec2(10.0, 5.0);
    style.spacing.scroll.bar_width = 8.0;

    let cr = egui::CornerRadius::same(4);

    let mut v = Visuals::dark();
    v.panel_fill       = DARK_BG_1;
    v.window_fill      = DARK_BG_2;
    v.faint_bg_color   = DARK_BG_0;
    v.extreme_bg_color = DARK_BG_0;
    v.window_stroke    = Stroke::new(1.0, DARK_BORDER);

    v.selection.bg_fill = ACCENT_DIM;
    v.selection.stroke  = Stroke::new(1.0, ACCENT);
    v.hyperlink_color   = ACCENT_HOVER;

    for (w, bg, stroke, fg) in [
        (&mut v.widgets.noninteractive, DARK_BG_2,  DARK_BORDER, Stroke::new(1.0, DARK_TEXT_DIM)),
        (&mut v.widgets.inactive,       DARK_BG_3,  DARK_BORDER, Stroke::new(1.0, DARK_TEXT)),
        (&mut v.widgets.hovered,        DARK_BG_4,  ACCENT_DIM,  Stroke::new(1.5, ACCENT_HOVER)),
        (&mut v.widgets.active,         ACCENT_DIM, ACCENT,      Stroke::new(2.0, Color32::WHITE)),
        (&mut v.widgets.open,           DARK_BG_4,  ACCENT_DIM,  Stroke::new(1.5, ACCENT_HOVER)),
    ] {
        w.bg_fill       = bg;
        w.weak_bg_fill  = bg;
        w.bg_stroke     = Stroke::new(1.0, stroke);
        w.fg_stroke     = fg;
        w.corner_radius = cr;
    }

    v.override_text_color  = Some(DARK_TEXT);
    v.window_corner_radius = cr;
    v.menu_corner_radius   = cr;

    ctx.set_style(style);
    ctx.set_visuals(v);
}
