//! Render engines: produce a colour texture for a time code and camera.
//!
//! [`RenderEngine`] is the seam where a full imaging engine plugs in. The
//! built-in [`PreviewEngine`] draws a ground grid, world axes and the
//! bounds of every boundable prim as lines, evaluated at the frame's time
//! code so animated translates move.

use std::sync::Arc;

use usdview_core::Stage;
use usdview_math::{Bounds3, DMat4, DVec3, UpAxis};
use wgpu::util::DeviceExt;

/// Colour format of engine output textures.
pub const ENGINE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Inputs for one engine frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest {
    pub time_code: f64,
    /// Target size in pixels, never zero
    pub size: (u32, u32),
    pub view: DMat4,
    pub projection: DMat4,
    pub clear_color: wgpu::Color,
}

/// Something that renders a stage into a texture.
pub trait RenderEngine {
    /// Prepare for drawing `stage`. Called once before the first frame and
    /// whenever the stage changes.
    fn set_stage(&mut self, stage: Arc<Stage>);

    /// Encode a frame and return its colour texture, or `None` when the
    /// engine has nothing to show.
    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        request: &RenderRequest,
    ) -> Option<&wgpu::Texture>;
}

/// Colour and depth attachments sized to the viewport.
pub struct RenderTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Engine Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ENGINE_COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Engine Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            color,
            color_view,
            depth_view,
            size,
        }
    }
}

/// Camera uniform data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Line vertex (position + colour)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    fn new(position: DVec3, color: [f32; 4]) -> Self {
        Self {
            position: position.as_vec3().to_array(),
            color,
        }
    }
}

const GRID_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.6];
const BOUNDS_COLOR: [f32; 4] = [1.0, 0.8, 0.2, 1.0];
const AXIS_COLORS: [[f32; 4]; 3] = [
    [1.0, 0.2, 0.2, 1.0],
    [0.2, 1.0, 0.2, 1.0],
    [0.2, 0.5, 1.0, 1.0],
];

/// Edges of a box as index pairs into [`Bounds3::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Line list for a square grid of `2 * half_cells` cells of `spacing` on
/// the ground plane perpendicular to `up`.
pub fn grid_lines(up: UpAxis, half_cells: i32, spacing: f64) -> Vec<LineVertex> {
    let (u, v) = match up {
        UpAxis::Y => (DVec3::X, DVec3::Z),
        UpAxis::Z => (DVec3::X, DVec3::Y),
    };
    let extent = half_cells as f64 * spacing;

    let mut lines = Vec::with_capacity((half_cells as usize * 2 + 1) * 4);
    for i in -half_cells..=half_cells {
        let offset = i as f64 * spacing;
        lines.push(LineVertex::new(u * offset - v * extent, GRID_COLOR));
        lines.push(LineVertex::new(u * offset + v * extent, GRID_COLOR));
        lines.push(LineVertex::new(v * offset - u * extent, GRID_COLOR));
        lines.push(LineVertex::new(v * offset + u * extent, GRID_COLOR));
    }
    lines
}

/// World X, Y, Z axes of `length` from the origin.
pub fn axis_lines(length: f64) -> Vec<LineVertex> {
    [DVec3::X, DVec3::Y, DVec3::Z]
        .iter()
        .zip(AXIS_COLORS)
        .flat_map(|(&axis, color)| {
            [
                LineVertex::new(DVec3::ZERO, color),
                LineVertex::new(axis * length, color),
            ]
        })
        .collect()
}

/// The 12 edges of `bounds` as a line list; empty for an empty box.
pub fn box_lines(bounds: &Bounds3, color: [f32; 4]) -> Vec<LineVertex> {
    if bounds.is_empty() {
        return Vec::new();
    }
    let corners = bounds.corners();
    BOX_EDGES
        .iter()
        .flat_map(|&(a, b)| {
            [
                LineVertex::new(corners[a], color),
                LineVertex::new(corners[b], color),
            ]
        })
        .collect()
}

/// Line-drawing stand-in for a full imaging engine.
pub struct PreviewEngine {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    static_lines: Vec<LineVertex>,
    stage: Option<Arc<Stage>>,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: usize,
    target: Option<RenderTarget>,
}

impl PreviewEngine {
    pub fn new(device: &wgpu::Device) -> Self {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Preview Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: DMat4::IDENTITY.as_mat4().to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Preview Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Preview Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Preview Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/preview.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Preview Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Preview Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[LineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ENGINE_COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // No culling for lines
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            static_lines: Vec::new(),
            stage: None,
            vertex_buffer: None,
            vertex_capacity: 0,
            target: None,
        }
    }

    /// Lines for one frame: grid and axes, then every prim box at `time_code`.
    fn frame_lines(&self, time_code: f64) -> Vec<LineVertex> {
        let mut lines = self.static_lines.clone();
        if let Some(stage) = &self.stage {
            for (_, bounds) in stage.prim_boxes_at(time_code) {
                lines.extend(box_lines(&bounds, BOUNDS_COLOR));
            }
        }
        lines
    }

    fn upload_lines(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, lines: &[LineVertex]) {
        if lines.len() > self.vertex_capacity || self.vertex_buffer.is_none() {
            let capacity = lines.len().next_power_of_two().max(64);
            self.vertex_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Preview Vertex Buffer"),
                size: (capacity * std::mem::size_of::<LineVertex>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = capacity;
        }

        if let Some(buffer) = &self.vertex_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(lines));
        }
    }
}

impl RenderEngine for PreviewEngine {
    fn set_stage(&mut self, stage: Arc<Stage>) {
        let bounds = stage.world_bounds_or_default();
        let spacing = grid_spacing(&bounds);

        let mut lines = grid_lines(stage.up_axis(), 10, spacing);
        lines.extend(axis_lines(spacing * 2.0));
        self.static_lines = lines;
        self.stage = Some(stage);

        log::info!(
            "Preview engine ready: {} static lines, grid spacing {:.2}",
            self.static_lines.len() / 2,
            spacing
        );
    }

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        request: &RenderRequest,
    ) -> Option<&wgpu::Texture> {
        if request.size.0 == 0 || request.size.1 == 0 {
            return None;
        }

        if self.target.as_ref().map(|t| t.size) != Some(request.size) {
            self.target = Some(RenderTarget::new(device, request.size));
        }

        let view_proj = (request.projection * request.view).as_mat4();
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform {
                view_proj: view_proj.to_cols_array_2d(),
            }]),
        );

        let lines = self.frame_lines(request.time_code);
        self.upload_lines(device, queue, &lines);

        let target = self.target.as_ref()?;
        let vertex_buffer = self.vertex_buffer.as_ref()?;

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Preview Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(request.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..lines.len() as u32, 0..1);
        }

        Some(&target.color)
    }
}

/// Grid cell size: a power of ten near a tenth of the scene size.
pub fn grid_spacing(bounds: &Bounds3) -> f64 {
    let size = bounds.size().max_element();
    if !size.is_finite() || size <= 0.0 {
        return 1.0;
    }
    10f64.powf((size / 10.0).log10().round()).max(1e-3)
}
