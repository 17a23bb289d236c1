//! Canvas view: pointer input in, `DrawList` out

use eframe::egui;
use egui::{Align2, FontId, Pos2, Sense, Stroke, StrokeKind};

use crate::core::render::Shape as DrawShape;
use crate::core::{AchievementId, Bounds, DrawList, DropPayload, InteractionEvent, Point, Rgba, SandboxSession};
use crate::theme::{colors, rgba};

use super::session::CanvasBus;

/// Concentric rings used to approximate a radial gradient
const GRADIENT_STEPS: usize = 8;

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

fn paint(painter: &egui::Painter, origin: Pos2, list: &DrawList) {
    let at = |p: Point| Pos2::new(origin.x + p.x, origin.y + p.y);

    for shape in &list.shapes {
        match shape {
            DrawShape::Line { from, to, width, color } => {
                painter.line_segment([at(*from), at(*to)], Stroke::new(*width, rgba(*color)));
            }
            DrawShape::DashedLine { from, to, width, color, dash, gap } => {
                painter.extend(egui::Shape::dashed_line(
                    &[at(*from), at(*to)],
                    Stroke::new(*width, rgba(*color)),
                    *dash,
                    *gap,
                ));
            }
            DrawShape::Circle { center, radius, fill } => {
                painter.circle_filled(at(*center), *radius, rgba(*fill));
            }
            DrawShape::Ring { center, radius, width, color } => {
                painter.circle_stroke(at(*center), *radius, Stroke::new(*width, rgba(*color)));
            }
            DrawShape::RoundedRect { center, width, height, corner, fill, stroke } => {
                let rect = egui::Rect::from_center_size(at(*center), egui::vec2(*width, *height));
                let stroke = stroke
                    .map(|(w, c)| Stroke::new(w, rgba(c)))
                    .unwrap_or(Stroke::NONE);
                painter.rect(rect, *corner, rgba(*fill), stroke, StrokeKind::Middle);
            }
            DrawShape::Text { pos, text, size, color, bold } => {
                let font = if *bold {
                    FontId::monospace(*size)
                } else {
                    FontId::proportional(*size)
                };
                painter.text(at(*pos), Align2::CENTER_CENTER, text, font, rgba(*color));
            }
            DrawShape::GradientDisc { center, radius, inner, outer } => {
                // Outermost first so inner rings paint over it
                for step in (0..GRADIENT_STEPS).rev() {
                    let t = (step + 1) as f32 / GRADIENT_STEPS as f32;
                    let c = Rgba(
                        lerp(inner.0, outer.0, t),
                        lerp(inner.1, outer.1, t),
                        lerp(inner.2, outer.2, t),
                        lerp(inner.3, outer.3, t),
                    );
                    painter.circle_filled(at(*center), radius * t, rgba(c));
                }
            }
            DrawShape::Star { center, radius, color } => {
                painter.circle_filled(at(*center), *radius, rgba(*color));
            }
        }
    }
}

/// Draw the session into the remaining space and route pointer input.
///
/// Returns achievement triggers raised by the interaction.
pub(crate) fn show(ui: &mut egui::Ui, session: &mut SandboxSession<CanvasBus>) -> Vec<AchievementId> {
    let size = ui.available_size();
    let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, colors::BG_CANVAS);

    let bounds = Bounds::new(rect.width(), rect.height());
    if session.bounds() != bounds {
        session.resize(bounds);
    }

    let local = |p: Pos2| Point::new(p.x - rect.min.x, p.y - rect.min.y);
    let mut events: Vec<InteractionEvent> = Vec::new();

    // Palette drop
    if let Some(payload) = response.dnd_release_payload::<DropPayload>() {
        if let Some(pos) = response.hover_pos() {
            events.extend(session.drop_item(&payload, local(pos)));
        }
    }

    let (primary_pressed, primary_released, pointer) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.interact_pos(),
        )
    });

    match response.hover_pos() {
        Some(pos) => {
            let p = local(pos);
            session.pointer_move(p);
            if primary_pressed {
                events.extend(session.pointer_down(p));
            }
        }
        None if response.dragged() => {
            if let Some(pos) = pointer {
                session.pointer_move(local(pos));
            }
        }
        None => {
            if session.interaction().pointer().is_some() {
                session.pointer_leave();
            }
        }
    }

    if primary_released {
        if let Some(pos) = pointer {
            session.pointer_up(local(pos));
        }
    }

    if response.secondary_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.extend(session.remove_at(local(pos)));
        }
    }

    paint(&painter, rect.min, &session.render());

    SandboxSession::<CanvasBus>::achievements_for(&events)
}
