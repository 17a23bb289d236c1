//! Frame renderer producing a platform-neutral draw list
//!
//! The renderer only reads the store. All motion happens in
//! [`Simulation::step`](super::simulation::Simulation::step) before it runs.

use super::config::SandboxConfig;
use super::entities::{Mode, NodeVariant, PacketKind, Point, Rgb};
use super::interaction::InteractionHandler;
use super::modifiers::GlobalModifiers;
use super::simulation::{Bounds, Simulation};
use super::store::EntityStore;

/// Spacing of the background grid in pixels
pub const BACKGROUND_GRID: f32 = 40.0;
const STAR_COUNT: u32 = 120;

// ============================================================================
// Colors
// ============================================================================

/// 8-bit RGBA, unpremultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const fn opaque(c: Rgb) -> Self {
        Rgba(c.0, c.1, c.2, 255)
    }

    pub const fn with_alpha(c: Rgb, a: u8) -> Self {
        Rgba(c.0, c.1, c.2, a)
    }
}

mod palette {
    use super::Rgb;

    pub const GRID: Rgb = Rgb::hex("#1e293b");
    pub const MESH_EDGE: Rgb = Rgb::hex("#1e3a8a");
    pub const PING: Rgb = Rgb::hex("#3b82f6");
    pub const MESSAGE: Rgb = Rgb::hex("#10b981");
    pub const LOCAL: Rgb = Rgb::hex("#10b981");
    pub const SIMULATED: Rgb = Rgb::hex("#3b82f6");
    pub const REMOTE: Rgb = Rgb::hex("#a855f7");
    pub const SELECTION: Rgb = Rgb::hex("#60a5fa");
    pub const GRID_LINK: Rgb = Rgb::hex("#334155");
    pub const FLOW_OUT: Rgb = Rgb::hex("#22c55e");
    pub const FLOW_IN: Rgb = Rgb::hex("#ef4444");
    pub const FLOW_IDLE: Rgb = Rgb::hex("#f59e0b");
    pub const BOND: Rgb = Rgb::hex("#475569");
    pub const BOND_STABLE: Rgb = Rgb::hex("#a855f7");
    pub const ELECTRON: Rgb = Rgb::hex("#22d3ee");
}

// ============================================================================
// Draw list
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Rgba,
    },
    DashedLine {
        from: Point,
        to: Point,
        width: f32,
        color: Rgba,
        dash: f32,
        gap: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Rgba,
    },
    Ring {
        center: Point,
        radius: f32,
        width: f32,
        color: Rgba,
    },
    RoundedRect {
        center: Point,
        width: f32,
        height: f32,
        corner: f32,
        fill: Rgba,
        stroke: Option<(f32, Rgba)>,
    },
    Text {
        pos: Point,
        text: String,
        size: f32,
        color: Rgba,
        bold: bool,
    },
    /// Radial gradient from `inner` at the center to `outer` at the rim
    GradientDisc {
        center: Point,
        radius: f32,
        inner: Rgba,
        outer: Rgba,
    },
    Star {
        center: Point,
        radius: f32,
        color: Rgba,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub shapes: Vec<Shape>,
}

impl DrawList {
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn text(&mut self, pos: Point, text: impl Into<String>, size: f32, color: Rgba, bold: bool) {
        self.push(Shape::Text {
            pos,
            text: text.into(),
            size,
            color,
            bold,
        });
    }
}

/// Everything a frame needs to draw, borrowed for the duration of the call.
pub struct FrameView<'a> {
    pub store: &'a EntityStore,
    pub interaction: &'a InteractionHandler,
    pub simulation: &'a Simulation,
    pub modifiers: GlobalModifiers,
    pub config: &'a SandboxConfig,
    pub bounds: Bounds,
}

/// Build the draw list for the active mode.
pub fn render(view: &FrameView<'_>) -> DrawList {
    let mut out = DrawList::default();
    if view.modifiers.gravity_failure {
        starfield(&mut out, view.bounds, view.simulation.frame());
    } else {
        grid(&mut out, view.bounds);
    }
    match view.interaction.mode() {
        Mode::Mesh => render_mesh(&mut out, view),
        Mode::Energy => render_energy(&mut out, view),
        Mode::Nano => render_nano(&mut out, view),
    }
    out
}

fn grid(out: &mut DrawList, bounds: Bounds) {
    let color = Rgba::with_alpha(palette::GRID, 96);
    let mut x = 0.0;
    while x <= bounds.width {
        out.push(Shape::Line {
            from: Point::new(x, 0.0),
            to: Point::new(x, bounds.height),
            width: 1.0,
            color,
        });
        x += BACKGROUND_GRID;
    }
    let mut y = 0.0;
    while y <= bounds.height {
        out.push(Shape::Line {
            from: Point::new(0.0, y),
            to: Point::new(bounds.width, y),
            width: 1.0,
            color,
        });
        y += BACKGROUND_GRID;
    }
}

/// Integer hash (splitmix-style) for star placement; stable across frames.
fn hash(mut v: u32) -> u32 {
    v = (v ^ (v >> 16)).wrapping_mul(0x7feb_352d);
    v = (v ^ (v >> 15)).wrapping_mul(0x846c_a68b);
    v ^ (v >> 16)
}

fn unit(v: u32) -> f32 {
    (v >> 8) as f32 / (1u32 << 24) as f32
}

fn starfield(out: &mut DrawList, bounds: Bounds, frame: u64) {
    for i in 0..STAR_COUNT {
        let h = hash(i.wrapping_add(0x9e37_79b9));
        let x = unit(h) * bounds.width;
        let y = unit(hash(h)) * bounds.height;
        // Slow twinkle, offset per star
        let phase = ((frame as f32 * 0.05) + i as f32).sin() * 0.5 + 0.5;
        let alpha = 80 + (phase * 175.0) as u8;
        out.push(Shape::Star {
            center: Point::new(x, y),
            radius: 1.0 + unit(hash(h ^ 0x5bd1_e995)),
            color: Rgba::with_alpha(Rgb::WHITE, alpha),
        });
    }
}

// ============================================================================
// Mesh
// ============================================================================

fn render_mesh(out: &mut DrawList, view: &FrameView<'_>) {
    let store = view.store;
    let nodes: Vec<_> = store.nodes().collect();

    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.pos.distance(b.pos) < view.config.mesh_link_distance {
                out.push(Shape::Line {
                    from: a.pos,
                    to: b.pos,
                    width: 1.0,
                    color: Rgba::with_alpha(palette::MESH_EDGE, 160),
                });
            }
        }
    }

    for p in store.packets() {
        let color = match p.kind {
            PacketKind::Ping => palette::PING,
            PacketKind::Message => palette::MESSAGE,
        };
        out.push(Shape::Circle {
            center: p.position(),
            radius: 4.0,
            fill: Rgba::opaque(color),
        });
    }

    let selected = view.interaction.selected_node();
    for node in &nodes {
        if selected == Some(node.id.as_str()) {
            out.push(Shape::Ring {
                center: node.pos,
                radius: node.radius + 8.0,
                width: 2.0,
                color: Rgba::opaque(palette::SELECTION),
            });
        }
        let fill = match node.variant {
            NodeVariant::Local => palette::LOCAL,
            NodeVariant::Simulated => palette::SIMULATED,
            NodeVariant::Remote => palette::REMOTE,
        };
        out.push(Shape::Circle {
            center: node.pos,
            radius: node.radius,
            fill: Rgba::opaque(fill),
        });
        out.text(
            Point::new(node.pos.x, node.pos.y + node.radius + 15.0),
            node.id.clone(),
            10.0,
            Rgba::with_alpha(Rgb::WHITE, 204),
            false,
        );
    }
}

// ============================================================================
// Energy
// ============================================================================

/// Position a grid item is drawn at: the live pointer while dragging.
fn live(pos: Point, dragging: bool, pointer: Option<Point>) -> Point {
    if dragging {
        pointer.unwrap_or(pos)
    } else {
        pos
    }
}

/// `+150W`, `-2000W`, `0W`
pub fn format_watts(power: f32) -> String {
    if power > 0.0 {
        format!("+{power:.0}W")
    } else {
        format!("{power:.0}W")
    }
}

fn render_energy(out: &mut DrawList, view: &FrameView<'_>) {
    let pointer = view.interaction.pointer();
    let comps = view.store.components();
    let positions: Vec<Point> = comps
        .iter()
        .map(|c| live(c.pos, c.dragging, pointer))
        .collect();

    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i].distance(positions[j]) < view.config.energy_link_distance {
                out.push(Shape::DashedLine {
                    from: positions[i],
                    to: positions[j],
                    width: 2.0,
                    color: Rgba::opaque(palette::GRID_LINK),
                    dash: 5.0,
                    gap: 5.0,
                });
            }
        }
    }

    if positions.len() > 1 {
        let n = positions.len() as f32;
        let centroid = Point::new(
            positions.iter().map(|p| p.x).sum::<f32>() / n,
            positions.iter().map(|p| p.y).sum::<f32>() / n,
        );
        let phase = view.simulation.flow_phase();
        for (c, &pos) in comps.iter().zip(&positions) {
            let color = if c.power > 0.0 {
                palette::FLOW_OUT
            } else if c.power < 0.0 {
                palette::FLOW_IN
            } else {
                palette::FLOW_IDLE
            };
            out.push(Shape::Circle {
                center: pos.lerp(centroid, phase),
                radius: 3.0,
                fill: Rgba::opaque(color),
            });
        }
    }

    for (c, &pos) in comps.iter().zip(&positions) {
        let stroke_alpha = if c.dragging { 255 } else { 64 };
        out.push(Shape::RoundedRect {
            center: pos,
            width: c.width,
            height: c.height,
            corner: 8.0,
            fill: Rgba::opaque(c.color),
            stroke: Some((2.0, Rgba::with_alpha(Rgb::WHITE, stroke_alpha))),
        });
        out.text(pos, c.label, 9.0, Rgba::opaque(Rgb::BLACK), true);
        out.text(
            Point::new(pos.x, pos.y + c.height / 2.0 + 10.0),
            format_watts(c.power),
            9.0,
            Rgba::with_alpha(Rgb::WHITE, 180),
            false,
        );
    }
}

// ============================================================================
// Nano
// ============================================================================

fn render_nano(out: &mut DrawList, view: &FrameView<'_>) {
    let store = view.store;
    let pointer = view.interaction.pointer();
    let stable = store.is_stable();
    let (bond_color, bond_width) = if stable {
        (palette::BOND_STABLE, 6.0)
    } else {
        (palette::BOND, 3.0)
    };
    let phase = view.simulation.electron_phase();

    for (i, bond) in store.bonds().iter().enumerate() {
        let Some((a, b)) = store.bond_endpoints(bond) else {
            continue;
        };
        let pa = live(a.pos, a.dragging, pointer);
        let pb = live(b.pos, b.dragging, pointer);
        out.push(Shape::Line {
            from: pa,
            to: pb,
            width: bond_width,
            color: Rgba::opaque(bond_color),
        });
        // Stagger markers so parallel bonds do not pulse in lockstep
        let t = (phase + i as f32 * 0.37).fract();
        out.push(Shape::Circle {
            center: pa.lerp(pb, t),
            radius: 2.5,
            fill: Rgba::opaque(palette::ELECTRON),
        });
    }

    if let (Some(source), Some(p)) = (view.interaction.bond_source(), pointer) {
        if let Some(atom) = store.atom(source) {
            out.push(Shape::DashedLine {
                from: live(atom.pos, atom.dragging, pointer),
                to: p,
                width: 2.0,
                color: Rgba::with_alpha(Rgb::WHITE, 128),
                dash: 5.0,
                gap: 5.0,
            });
        }
    }

    let hovered = view.interaction.hovered_atom();
    for atom in store.atoms() {
        let pos = live(atom.pos, atom.dragging, pointer);
        let grow = if atom.dragging || hovered == Some(atom.id) {
            3.0
        } else {
            0.0
        };
        out.push(Shape::GradientDisc {
            center: pos,
            radius: atom.radius + grow,
            inner: Rgba::opaque(Rgb::WHITE),
            outer: Rgba::opaque(atom.color),
        });
        out.text(pos, atom.element, 10.0, Rgba::opaque(Rgb::BLACK), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{element_spec, energy_spec};
    use crate::core::entities::MeshNode;

    struct Fixture {
        store: EntityStore,
        interaction: InteractionHandler,
        simulation: Simulation,
        config: SandboxConfig,
        modifiers: GlobalModifiers,
    }

    impl Fixture {
        fn new(mode: Mode) -> Self {
            Self {
                store: EntityStore::new(MeshNode::new(
                    "PEER-1000",
                    "Field Engineer",
                    Point::new(400.0, 300.0),
                    20.0,
                    NodeVariant::Local,
                )),
                interaction: InteractionHandler::new(mode),
                simulation: Simulation::new(),
                config: SandboxConfig::default(),
                modifiers: GlobalModifiers::default(),
            }
        }

        fn draw(&self) -> DrawList {
            render(&FrameView {
                store: &self.store,
                interaction: &self.interaction,
                simulation: &self.simulation,
                modifiers: self.modifiers,
                config: &self.config,
                bounds: Bounds::new(800.0, 600.0),
            })
        }
    }

    fn count(list: &DrawList, pred: impl Fn(&Shape) -> bool) -> usize {
        list.shapes.iter().filter(|s| pred(s)).count()
    }

    fn texts(list: &DrawList) -> Vec<&str> {
        list.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn background_switches_to_starfield() {
        let mut f = Fixture::new(Mode::Mesh);
        let plain = f.draw();
        assert_eq!(count(&plain, |s| matches!(s, Shape::Star { .. })), 0);
        // 800/40 + 1 vertical, 600/40 + 1 horizontal
        assert_eq!(count(&plain, |s| matches!(s, Shape::Line { .. })), 21 + 16);

        f.modifiers.gravity_failure = true;
        let stars = f.draw();
        assert_eq!(count(&stars, |s| matches!(s, Shape::Star { .. })), STAR_COUNT as usize);
    }

    #[test]
    fn mesh_edges_only_within_link_distance() {
        let mut f = Fixture::new(Mode::Mesh);
        f.modifiers.gravity_failure = true; // no grid lines
        f.store.insert_peer(MeshNode::new("AI-1", "Relay Node", Point::new(500.0, 300.0), 15.0, NodeVariant::Simulated));
        f.store.insert_peer(MeshNode::new("AI-2", "Relay Node", Point::new(790.0, 300.0), 15.0, NodeVariant::Simulated));
        let list = f.draw();
        // local-AI1 (100) and AI1-AI2 (290), not local-AI2 (390)
        assert_eq!(count(&list, |s| matches!(s, Shape::Line { .. })), 2);
        assert_eq!(texts(&list), vec!["PEER-1000", "AI-1", "AI-2"]);
    }

    #[test]
    fn selected_node_gets_ring() {
        let mut f = Fixture::new(Mode::Mesh);
        assert_eq!(count(&f.draw(), |s| matches!(s, Shape::Ring { .. })), 0);
        f.interaction.select_node(Some("PEER-1000".into()));
        assert_eq!(count(&f.draw(), |s| matches!(s, Shape::Ring { .. })), 1);
    }

    #[test]
    fn packets_drawn_at_interpolated_position() {
        let mut f = Fixture::new(Mode::Mesh);
        f.modifiers.gravity_failure = true;
        f.store.push_packet(Point::new(0.0, 0.0), Point::new(100.0, 0.0), PacketKind::Ping, 0.05, None);
        f.store.packets_mut()[0].progress = 0.5;
        let list = f.draw();
        assert!(list.shapes.iter().any(|s| matches!(
            s,
            Shape::Circle { center, radius, .. } if *center == Point::new(50.0, 0.0) && *radius == 4.0
        )));
    }

    #[test]
    fn energy_draws_signed_wattage_and_live_drag_position() {
        let mut f = Fixture::new(Mode::Energy);
        let solar = f.store.insert_component(energy_spec("solar").unwrap(), Point::new(100.0, 100.0));
        f.store.insert_component(energy_spec("home").unwrap(), Point::new(200.0, 100.0));
        let list = f.draw();
        let t = texts(&list);
        assert!(t.contains(&"+150W"));
        assert!(t.contains(&"-2000W"));
        assert_eq!(count(&list, |s| matches!(s, Shape::DashedLine { .. })), 1);

        // Drag the solar panel; it renders at the pointer
        f.interaction.pointer_down(&mut f.store, &f.config, Point::new(100.0, 100.0));
        f.interaction.pointer_move(&mut f.store, &f.config, Point::new(330.0, 410.0));
        assert!(f.store.component(solar).unwrap().dragging);
        let list = f.draw();
        assert!(list.shapes.iter().any(|s| matches!(
            s,
            Shape::RoundedRect { center, .. } if *center == Point::new(330.0, 410.0)
        )));
    }

    #[test]
    fn watts_format() {
        assert_eq!(format_watts(150.0), "+150W");
        assert_eq!(format_watts(-2000.0), "-2000W");
        assert_eq!(format_watts(0.0), "0W");
    }

    #[test]
    fn nano_skips_inert_bonds_and_styles_stable() {
        let mut f = Fixture::new(Mode::Nano);
        f.modifiers.gravity_failure = true;
        let c = element_spec("C").unwrap();
        let ids: Vec<_> = (0..4)
            .map(|i| f.store.insert_atom(c, Point::new(100.0 * i as f32, 100.0)))
            .collect();
        f.store.add_bond(ids[0], ids[1], 3);
        f.store.add_bond(ids[1], ids[2], 3);
        let widths = |list: &DrawList| -> Vec<f32> {
            list.shapes
                .iter()
                .filter_map(|s| match s {
                    Shape::Line { width, .. } => Some(*width),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(widths(&f.draw()), vec![3.0, 3.0]);

        f.store.add_bond(ids[2], ids[3], 3);
        assert_eq!(widths(&f.draw()), vec![6.0, 6.0, 6.0]);

        f.store.remove_atom(ids[3]);
        assert_eq!(widths(&f.draw()), vec![6.0, 6.0]);
    }

    #[test]
    fn armed_source_draws_preview_to_pointer() {
        let mut f = Fixture::new(Mode::Nano);
        let h = element_spec("H").unwrap();
        f.store.insert_atom(h, Point::new(100.0, 100.0));
        f.interaction.pointer_down(&mut f.store, &f.config, Point::new(100.0, 100.0));
        f.interaction.pointer_up(&mut f.store, &f.config, Point::new(100.0, 100.0));
        f.interaction.pointer_move(&mut f.store, &f.config, Point::new(300.0, 200.0));
        let list = f.draw();
        assert!(list.shapes.iter().any(|s| matches!(
            s,
            Shape::DashedLine { from, to, .. }
                if *from == Point::new(100.0, 100.0) && *to == Point::new(300.0, 200.0)
        )));
    }

    #[test]
    fn hovered_atom_is_enlarged() {
        let mut f = Fixture::new(Mode::Nano);
        let h = element_spec("H").unwrap();
        f.store.insert_atom(h, Point::new(100.0, 100.0));
        f.interaction.pointer_move(&mut f.store, &f.config, Point::new(102.0, 100.0));
        let list = f.draw();
        assert!(list.shapes.iter().any(|s| matches!(
            s,
            Shape::GradientDisc { radius, .. } if *radius == 15.0
        )));
    }
}
