//! Render pipeline for the ring surface.
//!
//! One full-viewport quad, drawn as a four-vertex triangle strip with no
//! vertex buffer. The wraparound and zoom/pan live entirely in
//! `shaders/line_scan.wgsl`; the host only uploads the 32-byte
//! [`SurfaceParams`](scan_core::SurfaceParams) block.
//!
//! GPU objects are shared with egui through `callback_resources`:
//! [`LineScanPipeline`] is installed once at startup, and the bind group of
//! the live surface is swapped in and out by [`crate::gpu::GpuDevice`].

use eframe::egui_wgpu::{self, wgpu};
use egui::PaintCallbackInfo;

const SHADER_SOURCE: &str = include_str!("shaders/line_scan.wgsl");

/// Pipeline, bind group layout and sampler for the ring surface.
pub struct LineScanPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl LineScanPipeline {
    /// Build the pipeline for `target_format`.
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_scan_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("line_scan_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line_scan_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_scan_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(target_format.into())],
            }),
            multiview: None,
            cache: None,
        });

        // Default filtering is nearest: one texel per pixel value, no blur.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("line_scan_sampler"),
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }

    /// Build the pipeline and register it with egui's renderer.
    pub fn install(render_state: &egui_wgpu::RenderState) {
        let pipeline = Self::new(&render_state.device, render_state.target_format);
        render_state
            .renderer
            .write()
            .callback_resources
            .insert(pipeline);
        tracing::debug!(format = ?render_state.target_format, "Line-scan pipeline installed");
    }

    /// Bind a surface texture and its parameter buffer.
    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("line_scan_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }
}

/// Bind group of the currently allocated surface.
pub(crate) struct ActiveSurface {
    pub(crate) bind_group: wgpu::BindGroup,
}

/// Paint callback issuing the single quad draw.
///
/// Draws nothing until both the pipeline and a surface are registered.
pub struct LineScanCallback;

impl egui_wgpu::CallbackTrait for LineScanCallback {
    fn paint(
        &self,
        _info: PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        callback_resources: &egui_wgpu::CallbackResources,
    ) {
        let (Some(pipeline), Some(surface)) = (
            callback_resources.get::<LineScanPipeline>(),
            callback_resources.get::<ActiveSurface>(),
        ) else {
            return;
        };
        render_pass.set_pipeline(&pipeline.pipeline);
        render_pass.set_bind_group(0, &surface.bind_group, &[]);
        render_pass.draw(0..4, 0..1);
    }
}

/// Paint the ring surface into `rect`.
pub fn paint_callback(rect: egui::Rect) -> egui::PaintCallback {
    egui_wgpu::Callback::new_paint_callback(rect, LineScanCallback)
}
