//! A drifting field of small squares drawn behind the board as one instanced
//! render node. Every frame rewrites all instance rects.

use std::rc::Rc;

use anyhow::Result;
use canopy_engine::SceneError;
use canopy_engine::coords::ColorRgba;
use canopy_engine::graph::SceneGraph;
use canopy_engine::render::{GpuBackend, ProgramInfo};
use canopy_engine::scene::NodeId;
use canopy_engine::upload::{BufferLayout, BufferWriter, DrawCounts};

pub const FIELD_INSTANCES: usize = 20_000;

const DOT: f32 = 3.0;
const DRIFT: f32 = 14.0;

/// Animation time and the area to spread the field over, in logical pixels.
#[derive(Debug, Clone, Copy)]
pub struct FieldFrame {
    pub time: f32,
    pub width: f32,
    pub height: f32,
}

pub struct FieldLayout {
    count: usize,
}

impl BufferLayout for FieldLayout {
    type Props = FieldFrame;

    fn attributes(&self) -> &[&'static str] {
        &["a_rect", "a_color"]
    }

    // Colors never change; only the rects are rewritten per frame.
    fn init(&mut self, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        let colors = writer.attribute("a_color", self.count * 4)?;
        for (i, dst) in colors.chunks_exact_mut(4).enumerate() {
            let shade = 0.35 + 0.4 * unit(i as u32 ^ 0xA5A5);
            let color = ColorRgba::new(shade * 0.6, shade * 0.8, shade, 0.35);
            dst.copy_from_slice(&color.to_array());
        }
        Ok(DrawCounts::instanced(6, 0))
    }

    fn write(&mut self, frame: &FieldFrame, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        let rects = writer.attribute("a_rect", self.count * 4)?;
        for (i, dst) in rects.chunks_exact_mut(4).enumerate() {
            let seed = i as u32;
            let phase = unit(seed.wrapping_add(0x51ED)) * std::f32::consts::TAU;
            let speed = 0.3 + unit(seed.wrapping_add(0x2F6B));
            let x = unit(seed) * frame.width + (frame.time * speed + phase).sin() * DRIFT;
            let y = unit(seed.wrapping_mul(7).wrapping_add(3)) * frame.height
                + (frame.time * speed * 0.7 + phase).cos() * DRIFT;
            dst.copy_from_slice(&[x, y, DOT, DOT]);
        }
        Ok(DrawCounts::instanced(6, self.count as u32))
    }
}

/// Mounts the field under the root, behind every card.
pub fn build(scene: &mut SceneGraph, gpu: &mut dyn GpuBackend, program: &Rc<ProgramInfo>) -> Result<NodeId> {
    let field = scene.create_render_node(gpu, program, FieldLayout { count: FIELD_INSTANCES })?;
    let root = scene.tree().root();

    let tree = scene.tree_mut();
    tree.set_z_index(field, -1)?;
    tree.set_uniform(field, "u_opacity", 1.0f32)?;
    tree.add_child(root, field)?;

    log::info!("studio: field of {FIELD_INSTANCES} instances mounted");
    Ok(field)
}

/// Deterministic hash of `seed` into `0..1`.
fn unit(seed: u32) -> f32 {
    let mut x = seed.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    (x >> 8) as f32 / (1u32 << 24) as f32
}
