//! wgpu-backed ring surface.

use eframe::egui_wgpu::{self, wgpu};
use scan_core::ring::{RenderDevice, RowSurface, SurfaceParams, SURFACE_PARAMS_SIZE};
use scan_core::{Result, ScanError, StreamGeometry, STATUS_NO_ADAPTER};

use crate::render::{ActiveSurface, LineScanPipeline};

/// Allocates ring surfaces on eframe's wgpu device.
///
/// Without a render state (glow fallback, no adapter) every allocation fails
/// with [`ScanError::DeviceUnavailable`].
pub struct GpuDevice {
    render_state: Option<egui_wgpu::RenderState>,
}

impl GpuDevice {
    /// Wrap eframe's render state; installs the pipeline when present.
    pub fn new(render_state: Option<egui_wgpu::RenderState>) -> Self {
        match &render_state {
            Some(state) => {
                LineScanPipeline::install(state);
                let info = state.adapter.get_info();
                tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter acquired");
            }
            None => tracing::warn!("No wgpu render state; the canvas will stay empty"),
        }
        Self { render_state }
    }

    /// Whether surfaces can be allocated at all.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.render_state.is_some()
    }
}

impl RenderDevice for GpuDevice {
    type Surface = GpuSurface;

    fn allocate(&mut self, geometry: StreamGeometry) -> Result<GpuSurface> {
        let Some(state) = &self.render_state else {
            return Err(ScanError::DeviceUnavailable(STATUS_NO_ADAPTER.into()));
        };

        let limit = state.device.limits().max_texture_dimension_2d;
        if geometry.width > limit || geometry.max_lines > limit {
            return Err(ScanError::InvalidGeometry(format!(
                "{}x{} exceeds the device texture limit of {limit}",
                geometry.width, geometry.max_lines
            )));
        }

        let texture = state.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("line_scan_ring"),
            size: wgpu::Extent3d {
                width: geometry.width,
                height: geometry.max_lines,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let params = state.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line_scan_params"),
            size: SURFACE_PARAMS_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut renderer = state.renderer.write();
        let Some(pipeline) = renderer.callback_resources.get::<LineScanPipeline>() else {
            texture.destroy();
            params.destroy();
            return Err(ScanError::DeviceUnavailable(
                "render pipeline not installed".into(),
            ));
        };
        let bind_group = pipeline.bind_group(&state.device, &view, &params);
        renderer
            .callback_resources
            .insert(ActiveSurface { bind_group });
        drop(renderer);

        Ok(GpuSurface {
            render_state: state.clone(),
            texture,
            params,
            width: geometry.width,
        })
    }

    fn release(&mut self, surface: GpuSurface) {
        surface
            .render_state
            .renderer
            .write()
            .callback_resources
            .remove::<ActiveSurface>();
        surface.texture.destroy();
        surface.params.destroy();
    }
}

/// An `R8Unorm` texture of `width × max_lines` plus its uniform buffer.
pub struct GpuSurface {
    render_state: egui_wgpu::RenderState,
    texture: wgpu::Texture,
    params: wgpu::Buffer,
    width: u32,
}

impl RowSurface for GpuSurface {
    fn write_row(&mut self, row: u32, pixels: &[u8]) {
        self.render_state.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: row, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: self.width,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    fn publish(&mut self, params: &SurfaceParams) {
        self.render_state
            .queue
            .write_buffer(&self.params, 0, bytemuck::bytes_of(params));
    }
}
