// crates/visoai-ui/src/helpers/range_slider.rs
//
// Two-thumb range slider over one track's full duration. Paints the rail,
// the selected region between the thumbs, and the thumbs themselves. Drags
// become SetTrim commands; the trim model does all clamping.

use egui::{pos2, vec2, Color32, CursorIcon, Rect, Response, Sense, Stroke, StrokeKind, Ui};

use visoai_core::commands::EditorCommand;
use visoai_core::helpers::scale::TimelineScale;
use visoai_core::track::TrackKind;
use visoai_core::trim::{Thumb, TrimRange};

use crate::theme::{track_color, DARK_BG_3, DARK_BORDER, DARK_TEXT};

pub const SLIDER_H: f32 = 28.0;
const THUMB_W:     f32 = 10.0;
const RAIL_H:      f32 = 14.0;

/// Thumb centres travel over the rect inset by half a thumb on each side.
pub fn slider_scale(rect: Rect, total: f64) -> TimelineScale {
    TimelineScale::new(rect.left() + THUMB_W / 2.0, rect.width() - THUMB_W, total)
}

/// The `(start, end)` pair proposed when `thumb` is dragged to `secs`.
pub fn drag_proposal(trim: &TrimRange, thumb: Thumb, secs: f64) -> (f64, f64) {
    match thumb {
        Thumb::Start => (secs, trim.end()),
        Thumb::End   => (trim.start(), secs),
    }
}

pub fn range_slider(
    ui:      &mut Ui,
    kind:    TrackKind,
    trim:    &TrimRange,
    enabled: bool,
    cmd:     &mut Vec<EditorCommand>,
) -> Response {
    let (rect, response) = ui.allocate_exact_size(vec2(ui.available_width(), SLIDER_H), Sense::hover());
    let scale   = slider_scale(rect, trim.total());
    let color   = track_color(kind);
    let painter = ui.painter_at(rect.expand(1.0));

    let rail = Rect::from_center_size(rect.center(), vec2(rect.width(), RAIL_H));
    painter.rect(rail, 3.0, DARK_BG_3, Stroke::new(1.0, DARK_BORDER), StrokeKind::Inside);

    let x0 = scale.secs_to_x(trim.start());
    let x1 = scale.secs_to_x(trim.end());
    let valid = Rect::from_min_max(pos2(x0, rail.top()), pos2(x1, rail.bottom()));
    painter.rect_filled(valid, 3.0, color.gamma_multiply(if enabled { 0.85 } else { 0.35 }));

    let id    = ui.id().with(("trim", kind));
    let sense = if enabled { Sense::drag() } else { Sense::hover() };
    for (thumb, x) in [(Thumb::Start, x0), (Thumb::End, x1)] {
        let thumb_rect = Rect::from_center_size(pos2(x, rect.center().y), vec2(THUMB_W, SLIDER_H - 4.0));
        let resp = ui.interact(thumb_rect, id.with(thumb), sense);
        let resp = if enabled { resp.on_hover_cursor(CursorIcon::ResizeHorizontal) } else { resp };

        if resp.dragged() {
            if let Some(secs) = resp.interact_pointer_pos().and_then(|p| scale.x_to_secs(p.x)) {
                let (start, end) = drag_proposal(trim, thumb, secs);
                cmd.push(EditorCommand::SetTrim { kind, start, end });
            }
        }

        let fill = if resp.dragged() || resp.hovered() { Color32::WHITE } else { DARK_TEXT };
        painter.rect(thumb_rect, 2.0, fill, Stroke::new(1.5, color), StrokeKind::Inside);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_keeps_the_other_thumb() {
        let trim = TrimRange::new(10.0);
        assert_eq!(drag_proposal(&trim, Thumb::Start, 3.0), (3.0, 10.0));
        assert_eq!(drag_proposal(&trim, Thumb::End, 4.5), (0.0, 4.5));
    }

    #[test]
    fn thumb_positions_map_back_to_seconds() {
        let rect  = Rect::from_min_size(pos2(100.0, 0.0), vec2(410.0, SLIDER_H));
        let scale = slider_scale(rect, 20.0);
        assert_eq!(scale.secs_to_x(0.0), 105.0);
        assert_eq!(scale.secs_to_x(20.0), 505.0);

        let back = scale.x_to_secs(scale.secs_to_x(7.5)).unwrap();
        assert!((back - 7.5).abs() < 20.0 / 400.0);
        // Pointer left of the rail clamps to zero.
        assert_eq!(scale.x_to_secs(0.0), Some(0.0));
    }

    #[test]
    fn empty_track_has_no_scale() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(300.0, SLIDER_H));
        assert_eq!(slider_scale(rect, 0.0).x_to_secs(150.0), None);
    }
}
