//! [`GpuBackend`] over wgpu.
//!
//! Shader conventions (WGSL):
//! - the program's uniforms are the members of one struct bound at
//!   `@group(0) @binding(0)`, in declaration order, with standard uniform layout;
//! - attribute `i` is read from `@location(i)`, one vertex buffer per attribute.
//!
//! Draw calls are recorded during the frame and replayed into a single render
//! pass in `end_frame`. Uniform block contents are staged into a per-frame arena
//! and bound with dynamic offsets, so every draw sees the values that were
//! current when it was issued.

use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{anyhow, bail, Context, Result};

use crate::coords::ColorRgba;
use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::upload::{UniformKind, UniformValue};

use super::backend::{
    AttributeFormat, AttributeLocation, DrawCall, GpuBackend, ProgramDesc, ProgramId, RasterState,
    UniformLocation, VertexArrayId,
};

/// Byte offsets of each member of a uniform block, plus its total size.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct BlockLayout {
    pub offsets: Vec<u32>,
    pub size: u32,
}

/// Lays out `kinds` as members of a WGSL uniform-address-space struct.
pub(crate) fn uniform_block_layout(kinds: &[UniformKind]) -> BlockLayout {
    let mut offsets = Vec::with_capacity(kinds.len());
    let mut cursor = 0u32;
    for kind in kinds {
        let (size, align) = match kind {
            UniformKind::Float => (4, 4),
            UniformKind::Vec4 => (16, 16),
            UniformKind::Mat4 => (64, 16),
        };
        cursor = cursor.next_multiple_of(align);
        offsets.push(cursor);
        cursor += size;
    }
    BlockLayout {
        offsets,
        size: cursor.next_multiple_of(16).max(16),
    }
}

fn write_value(block: &mut [u8], offset: u32, value: &UniformValue) {
    let start = offset as usize;
    match value {
        UniformValue::Float(v) => block[start..start + 4].copy_from_slice(bytemuck::bytes_of(v)),
        UniformValue::Vec4(v) => {
            block[start..start + 16].copy_from_slice(bytemuck::cast_slice(&v.to_array()))
        }
        UniformValue::Mat4(m) => {
            block[start..start + 64].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
        }
    }
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

struct GpuProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    uniforms: Vec<(String, UniformKind)>,
    attributes: Vec<(String, AttributeFormat, bool)>,
    layout: BlockLayout,
    /// `None` for programs without uniforms.
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    /// Bind group over the uniform arena, tagged with the arena generation it targets.
    bind_group: Option<(u64, wgpu::BindGroup)>,
    /// CPU copy of the uniform block.
    block: Vec<u8>,
    /// Arena offset of the latest staged copy of `block` in this frame.
    staged: Option<u32>,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    /// In floats.
    capacity: usize,
    /// Floats written by the last upload.
    len: usize,
}

struct VertexArray {
    program: ProgramId,
    buffers: Vec<Option<VertexBuffer>>,
}

struct DrawOp {
    program: ProgramId,
    vao: VertexArrayId,
    uniform_offset: Option<u32>,
    call: DrawCall,
}

/// Uniform staging for one frame, flushed to a single GPU buffer.
struct UniformArena {
    staging: Vec<u8>,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    generation: u64,
    align: u32,
}

impl UniformArena {
    fn push(&mut self, block: &[u8]) -> u32 {
        let offset = self.staging.len().next_multiple_of(self.align as usize);
        self.staging.resize(offset, 0);
        self.staging.extend_from_slice(block);
        offset as u32
    }

    /// Copies the staged bytes to the GPU, reallocating on growth.
    fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.staging.is_empty() {
            return;
        }
        let needed = self.staging.len() as u64;
        if self.buffer.is_none() || needed > self.capacity {
            let capacity = needed.next_power_of_two().max(4096);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("canopy uniform arena"),
                size: capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
            self.generation += 1;
            log::debug!("wgpu: uniform arena grown to {capacity} bytes");
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, &self.staging);
        }
    }
}

/// wgpu implementation of [`GpuBackend`], drawing into a window surface.
pub struct WgpuBackend {
    gpu: Gpu<'static>,
    programs: Vec<GpuProgram>,
    vaos: HashMap<u32, VertexArray>,
    next_vao: u32,
    raster: RasterState,
    viewport: (u32, u32),
    current: Option<ProgramId>,
    frame: Option<GpuFrame>,
    clear: ColorRgba,
    ops: Vec<DrawOp>,
    arena: UniformArena,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu<'static>) -> Self {
        let align = gpu.device().limits().min_uniform_buffer_offset_alignment.max(16);
        let viewport = gpu.size();
        Self {
            gpu,
            programs: Vec::new(),
            vaos: HashMap::new(),
            next_vao: 0,
            raster: RasterState::FLAT_2D,
            viewport,
            current: None,
            frame: None,
            clear: ColorRgba::TRANSPARENT,
            ops: Vec::new(),
            arena: UniformArena {
                staging: Vec::new(),
                buffer: None,
                capacity: 0,
                generation: 0,
                align,
            },
        }
    }

    pub fn gpu(&self) -> &Gpu<'static> {
        &self.gpu
    }

    /// Resizes the surface. Called by the host on window resize.
    pub fn resize(&mut self, size: (u32, u32)) {
        self.gpu.resize(size);
    }

    fn program(&self, id: ProgramId) -> Option<&GpuProgram> {
        self.programs.get(id.0 as usize)
    }

    fn build_pipeline(
        &self,
        desc: &ProgramDesc,
        module: &wgpu::ShaderModule,
        bind_group_layout: Option<&wgpu::BindGroupLayout>,
    ) -> wgpu::RenderPipeline {
        let device = self.gpu.device();
        let label = format!("canopy {} pipeline", desc.label);

        let bgls: Vec<&wgpu::BindGroupLayout> = bind_group_layout.into_iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label.as_str()),
            bind_group_layouts: &bgls,
            immediate_size: 0,
        });

        let attrs: Vec<[wgpu::VertexAttribute; 1]> = desc
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| {
                [wgpu::VertexAttribute {
                    format: vertex_format(a.format),
                    offset: 0,
                    shader_location: i as u32,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .attributes
            .iter()
            .zip(&attrs)
            .map(|(a, attr)| wgpu::VertexBufferLayout {
                array_stride: a.format.byte_size(),
                step_mode: if a.instanced {
                    wgpu::VertexStepMode::Instance
                } else {
                    wgpu::VertexStepMode::Vertex
                },
                attributes: attr,
            })
            .collect();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label.as_str()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(desc.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(desc.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: self.raster.alpha_blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.raster.cull_faces.then_some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    /// Makes sure every program with uniforms has a bind group over the current arena buffer.
    fn refresh_bind_groups(&mut self) {
        let Some(arena) = &self.arena.buffer else { return };
        let generation = self.arena.generation;
        let device = self.gpu.device();
        for p in &mut self.programs {
            let Some(bgl) = &p.bind_group_layout else { continue };
            if matches!(&p.bind_group, Some((g, _)) if *g == generation) {
                continue;
            }
            let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("canopy uniform bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: arena,
                        offset: 0,
                        size: NonZeroU64::new(p.layout.size as u64),
                    }),
                }],
            });
            p.bind_group = Some((generation, bg));
        }
    }

    /// Checks that every attribute buffer of `vao` holds enough elements for `call`.
    fn op_is_complete(&self, program: &GpuProgram, vao: &VertexArray, call: DrawCall) -> bool {
        program.attributes.iter().zip(&vao.buffers).all(|((name, format, instanced), buf)| {
            let Some(buf) = buf else {
                log::warn!("wgpu: `{}` attribute `{name}` was never uploaded; draw skipped", program.label);
                return false;
            };
            let available = buf.len / format.components() as usize;
            let needed = match instanced {
                true => call.instance_count.unwrap_or(1),
                false => call.vertex_count,
            };
            let needed = needed as usize;
            if available < needed {
                log::warn!(
                    "wgpu: `{}` attribute `{name}` holds {available} elements, draw needs {needed}; skipped",
                    program.label
                );
                return false;
            }
            true
        })
    }
}

impl GpuBackend for WgpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId> {
        let device = self.gpu.device();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(desc.source.as_str().into()),
        });
        let info = pollster::block_on(module.get_compilation_info());
        if let Some(msg) = info
            .messages
            .iter()
            .find(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        {
            bail!("shader `{}` failed to compile: {}", desc.label, msg.message);
        }

        let kinds: Vec<UniformKind> = desc.uniforms.iter().map(|u| u.kind).collect();
        let layout = uniform_block_layout(&kinds);

        let bind_group_layout = (!desc.uniforms.is_empty()).then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("canopy uniform block"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(layout.size as u64),
                    },
                    count: None,
                }],
            })
        });

        let pipeline = self.build_pipeline(desc, &module, bind_group_layout.as_ref());

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            label: desc.label.clone(),
            pipeline,
            uniforms: desc.uniforms.iter().map(|u| (u.name.clone(), u.kind)).collect(),
            attributes: desc
                .attributes
                .iter()
                .map(|a| (a.name.clone(), a.format, a.instanced))
                .collect(),
            block: vec![0; layout.size as usize],
            layout,
            bind_group_layout,
            bind_group: None,
            staged: None,
        });
        log::debug!("wgpu: built program `{}` as {id:?}", desc.label);
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let i = self.program(program)?.uniforms.iter().position(|(n, _)| n == name)?;
        Some(UniformLocation(i as u32))
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let i = self.program(program)?.attributes.iter().position(|(n, _, _)| n == name)?;
        Some(AttributeLocation(i as u32))
    }

    fn create_vertex_array(&mut self, program: ProgramId) -> Result<VertexArrayId> {
        let p = self
            .program(program)
            .ok_or_else(|| anyhow!("unknown program {program:?}"))?;
        let buffers = p.attributes.iter().map(|_| None).collect();
        let id = VertexArrayId(self.next_vao);
        self.next_vao = self.next_vao.checked_add(1).context("vertex array ids exhausted")?;
        self.vaos.insert(id.0, VertexArray { program, buffers });
        Ok(id)
    }

    fn release_vertex_array(&mut self, vao: VertexArrayId) {
        if self.vaos.remove(&vao.0).is_none() {
            log::debug!("wgpu: release of unknown {vao:?}");
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        if self.gpu.size() != (width, height) {
            self.gpu.resize((width, height));
        }
    }

    fn set_raster_state(&mut self, state: &RasterState) {
        if self.raster != *state {
            // Pipelines capture the state they were built with.
            log::debug!("wgpu: raster state changed; applies to programs built from now on");
            self.raster = *state;
        }
    }

    fn begin_frame(&mut self, clear: ColorRgba) -> Result<bool> {
        self.frame = None;
        self.ops.clear();
        self.arena.staging.clear();
        for p in &mut self.programs {
            p.staged = None;
        }

        let (w, h) = self.gpu.size();
        if w == 0 || h == 0 {
            return Ok(false);
        }

        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                self.clear = clear;
                Ok(true)
            }
            Err(err) => match self.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => Err(anyhow!("surface error: out of memory")),
                action => {
                    log::debug!("wgpu: frame skipped ({action:?})");
                    Ok(false)
                }
            },
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
    }

    fn upload_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let Some(p) = self.programs.get_mut(program.0 as usize) else {
            return;
        };
        let Some(&offset) = p.layout.offsets.get(location.0 as usize) else {
            return;
        };
        write_value(&mut p.block, offset, value);
        p.staged = None;
    }

    fn upload_attribute(&mut self, vao: VertexArrayId, location: AttributeLocation, data: &[f32]) {
        let Some(entry) = self.vaos.get_mut(&vao.0) else {
            log::debug!("wgpu: upload to unknown {vao:?}");
            return;
        };
        let Some(slot) = entry.buffers.get_mut(location.0 as usize) else {
            return;
        };

        let grow = slot.as_ref().is_none_or(|b| data.len() > b.capacity);
        if grow {
            let capacity = data.len().next_power_of_two().max(64);
            let buffer = self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("canopy attribute buffer"),
                size: (capacity * std::mem::size_of::<f32>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            log::trace!("wgpu: {vao:?} attribute {} grown to {capacity} floats", location.0);
            *slot = Some(VertexBuffer {
                buffer,
                capacity,
                len: 0,
            });
        }

        if let Some(buf) = slot {
            if !data.is_empty() {
                self.gpu.queue().write_buffer(&buf.buffer, 0, bytemuck::cast_slice(data));
            }
            buf.len = data.len();
        }
    }

    fn draw(&mut self, vao: VertexArrayId, call: DrawCall) {
        if self.frame.is_none() {
            return;
        }
        let Some(program) = self.vaos.get(&vao.0).map(|v| v.program) else {
            log::debug!("wgpu: draw with unknown {vao:?}");
            return;
        };
        if self.current != Some(program) {
            log::warn!("wgpu: {vao:?} drawn while {:?} is bound; using its own program", self.current);
        }
        let Some(p) = self.programs.get_mut(program.0 as usize) else {
            return;
        };

        let uniform_offset = if p.bind_group_layout.is_some() {
            let offset = match p.staged {
                Some(offset) => offset,
                None => {
                    let offset = self.arena.push(&p.block);
                    p.staged = Some(offset);
                    offset
                }
            };
            Some(offset)
        } else {
            None
        };

        self.ops.push(DrawOp {
            program,
            vao,
            uniform_offset,
            call,
        });
    }

    fn end_frame(&mut self) -> Result<()> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(());
        };

        self.arena.flush(self.gpu.device(), self.gpu.queue());
        self.refresh_bind_groups();

        let (sw, sh) = self.gpu.size();
        let (vw, vh) = (self.viewport.0.min(sw), self.viewport.1.min(sh));

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("canopy scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.clear.r as f64,
                            g: self.clear.g as f64,
                            b: self.clear.b as f64,
                            a: self.clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if vw > 0 && vh > 0 {
                pass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);

                for op in &self.ops {
                    let (Some(p), Some(vao)) = (self.program(op.program), self.vaos.get(&op.vao.0)) else {
                        continue;
                    };
                    if !self.op_is_complete(p, vao, op.call) {
                        continue;
                    }

                    pass.set_pipeline(&p.pipeline);
                    if let (Some(offset), Some((_, bg))) = (op.uniform_offset, &p.bind_group) {
                        pass.set_bind_group(0, bg, &[offset]);
                    }
                    for (slot, buf) in vao.buffers.iter().enumerate() {
                        if let Some(buf) = buf {
                            pass.set_vertex_buffer(slot as u32, buf.buffer.slice(..));
                        }
                    }
                    pass.draw(0..op.call.vertex_count, 0..op.call.instance_count.unwrap_or(1));
                }
            }
        }

        self.gpu.submit(frame);
        self.ops.clear();
        Ok(())
    }
}
