//! A board of cards: each card is a container holding a face (drawn) and a
//! hit area (interactive) that share the container's transform.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use canopy_engine::SceneError;
use canopy_engine::coords::{Bounds, ColorRgba};
use canopy_engine::event::{EventKind, HitTestNode, PointerEvent};
use canopy_engine::render::{AttributeFormat, GpuBackend, ProgramDesc, ProgramInfo};
use canopy_engine::scene::{NodeId, SceneTree};
use canopy_engine::graph::SceneGraph;
use canopy_engine::upload::{BufferLayout, BufferWriter, DrawCounts, UniformKind};
use glam::{Mat4, Vec3};

pub const CARD_W: f32 = 180.0;
pub const CARD_H: f32 = 120.0;
const GAP: f32 = 24.0;
const COLUMNS: usize = 4;

const IDLE_OPACITY: f32 = 0.82;

pub fn card_program() -> ProgramDesc {
    ProgramDesc::new("cards", include_str!("shaders/card.wgsl"))
        .with_uniform("u_projection", UniformKind::Mat4)
        .with_uniform("u_opacity", UniformKind::Float)
        .with_instance_attribute("a_rect", AttributeFormat::Float32x4)
        .with_instance_attribute("a_color", AttributeFormat::Float32x4)
}

/// One solid rectangle of fixed size; props are its color.
pub struct CardLayout {
    size: (f32, f32),
    color: ColorRgba,
}

impl BufferLayout for CardLayout {
    type Props = ColorRgba;

    fn attributes(&self) -> &[&'static str] {
        &["a_rect", "a_color"]
    }

    fn init(&mut self, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        writer.write("a_rect", &[0.0, 0.0, self.size.0, self.size.1])?;
        writer.write("a_color", &self.color.to_array())?;
        Ok(DrawCounts::instanced(6, 1))
    }

    fn write(&mut self, color: &ColorRgba, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        self.color = *color;
        writer.write("a_color", &color.to_array())?;
        Ok(DrawCounts::instanced(6, 1))
    }
}

/// Handed to every handler of a card's hit area.
struct Card {
    index: usize,
    face: NodeId,
    color: ColorRgba,
    selected: Cell<bool>,
}

const PALETTE: [(u8, u8, u8); 6] = [
    (229, 115, 115),
    (255, 183, 77),
    (129, 199, 132),
    (79, 195, 247),
    (149, 117, 205),
    (240, 98, 146),
];

const SELECTED: ColorRgba = ColorRgba::new(1.0, 1.0, 1.0, 1.0);

/// Builds `count` cards under the root. Returns the faces, which need their
/// projection refreshed every frame.
pub fn build(
    scene: &mut SceneGraph,
    gpu: &mut dyn GpuBackend,
    program: &Rc<ProgramInfo>,
    count: usize,
) -> Result<Vec<NodeId>> {
    let top = Rc::new(Cell::new(0));
    let mut faces = Vec::with_capacity(count);
    let root = scene.tree().root();

    for index in 0..count {
        let (r, g, b) = PALETTE[index % PALETTE.len()];
        let color = ColorRgba::from_rgba8(r, g, b, 255);

        let face = scene.create_render_node(
            gpu,
            program,
            CardLayout {
                size: (CARD_W, CARD_H),
                color,
            },
        )?;
        let hit = scene.create_hit_test(card_hit_area(
            Card {
                index,
                face,
                color,
                selected: Cell::new(false),
            },
            top.clone(),
        ));
        let card = scene.create_container();

        let col = (index % COLUMNS) as f32;
        let row = (index / COLUMNS) as f32;
        let at = Vec3::new(GAP + col * (CARD_W + GAP), GAP + row * (CARD_H + GAP), 0.0);

        let tree = scene.tree_mut();
        tree.set_transform(card, Mat4::from_translation(at))?;
        tree.add_child(card, face)?;
        tree.add_child(card, hit)?;
        tree.add_child(root, card)?;
        tree.set_uniform(face, "u_opacity", IDLE_OPACITY)?;
        faces.push(face);
    }

    log::info!("studio: {count} cards mounted");
    Ok(faces)
}

fn card_hit_area(card: Card, top: Rc<Cell<i32>>) -> HitTestNode {
    HitTestNode::new(Bounds::from_size(CARD_W, CARD_H))
        .with_cursor("pointer")
        .with_payload(card)
        .on(EventKind::PointerEnter, |ev, tree| set_opacity(ev, tree, 1.0))
        .on(EventKind::PointerLeave, |ev, tree| set_opacity(ev, tree, IDLE_OPACITY))
        .on(EventKind::Click, move |ev, tree| {
            let Some(card) = ev.payload::<Card>() else {
                return Ok(());
            };
            let selected = !card.selected.get();
            card.selected.set(selected);
            tree.update(card.face, &if selected { SELECTED } else { card.color })?;

            // Bring the card's container to the front of its siblings.
            if let Some(container) = tree.parent(card.face) {
                top.set(top.get() + 1);
                tree.set_z_index(container, top.get())?;
            }
            log::info!("studio: card {} {}", card.index, if selected { "selected" } else { "cleared" });
            ev.stop_propagation();
            Ok(())
        })
}

fn set_opacity(ev: &mut PointerEvent, tree: &mut SceneTree, opacity: f32) -> anyhow::Result<()> {
    if let Some(card) = ev.payload::<Card>() {
        tree.set_uniform(card.face, "u_opacity", opacity)?;
    }
    Ok(())
}
