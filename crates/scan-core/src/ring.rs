//! Circular row surface with wraparound bookkeeping.
//!
//! The store writes each incoming row in place at `head_index` and advances
//! the head modulo the capacity. Nothing is ever shifted: the renderer turns
//! the head position into a sampling offset, so a new row costs one row copy
//! no matter how deep the buffer is.
//!
//! The pixel storage itself lives behind [`RenderDevice`] / [`RowSurface`] so
//! the same bookkeeping drives a GPU texture or the CPU-side [`HostSurface`].

use bytemuck::{Pod, Zeroable};

use crate::error::{Result, ScanError};
use crate::protocol::StreamGeometry;
use crate::transform::TransformState;

/// Parameter block read by the render pipeline.
///
/// Layout matches the WGSL uniform struct (eight 4-byte fields). The
/// 64-bit line total is split into two words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SurfaceParams {
    /// Row that will be written next (the stalest row).
    pub head_index: u32,
    /// Row capacity of the surface.
    pub capacity: u32,
    /// Low 32 bits of the total line count.
    pub total_lo: u32,
    /// High 32 bits of the total line count.
    pub total_hi: u32,
    /// Zoom scale.
    pub zoom: f32,
    /// Horizontal pan in clip space.
    pub pan_x: f32,
    /// Vertical pan in clip space.
    pub pan_y: f32,
    /// Keeps the block a multiple of 16 bytes.
    pub _pad: f32,
}

/// Size in bytes of [`SurfaceParams`].
pub const SURFACE_PARAMS_SIZE: usize = std::mem::size_of::<SurfaceParams>();

impl SurfaceParams {
    /// Combine ring position and transform into one block.
    #[must_use]
    pub fn new(head_index: u32, capacity: u32, total_lines: u64, transform: &TransformState) -> Self {
        Self {
            head_index,
            capacity,
            total_lo: total_lines as u32,
            total_hi: (total_lines >> 32) as u32,
            zoom: transform.zoom,
            pan_x: transform.pan_x,
            pan_y: transform.pan_y,
            _pad: 0.0,
        }
    }

    /// Reassembled 64-bit line total.
    #[must_use]
    pub fn total_lines(&self) -> u64 {
        (u64::from(self.total_hi) << 32) | u64::from(self.total_lo)
    }
}

/// Device-resident pixel surface of `width × capacity` single-channel bytes.
pub trait RowSurface {
    /// Overwrite row `row` with `pixels` (exactly `width` bytes).
    fn write_row(&mut self, row: u32, pixels: &[u8]);

    /// Upload the parameter block consumed by the renderer.
    fn publish(&mut self, params: &SurfaceParams);
}

/// Allocator for [`RowSurface`]s.
pub trait RenderDevice {
    /// Surface type produced by this device.
    type Surface: RowSurface;

    /// Allocate a surface for `geometry`.
    ///
    /// Fails with [`ScanError::DeviceUnavailable`] if no compatible device
    /// can be acquired.
    fn allocate(&mut self, geometry: StreamGeometry) -> Result<Self::Surface>;

    /// Release a surface previously returned by [`RenderDevice::allocate`].
    fn release(&mut self, surface: Self::Surface);
}

/// Ring bookkeeping plus ownership of the current surface.
pub struct RingBufferStore<D: RenderDevice> {
    device: D,
    surface: Option<D::Surface>,
    geometry: Option<StreamGeometry>,
    head_index: u32,
    total_lines: u64,
}

impl<D: RenderDevice> RingBufferStore<D> {
    /// Create an unconfigured store on `device`.
    pub fn new(device: D) -> Self {
        Self {
            device,
            surface: None,
            geometry: None,
            head_index: 0,
            total_lines: 0,
        }
    }

    /// Whether a surface is allocated and rows can be written.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    /// Geometry of the current surface.
    #[must_use]
    pub fn geometry(&self) -> Option<StreamGeometry> {
        self.geometry
    }

    /// Row that will be written next.
    #[must_use]
    pub fn head_index(&self) -> u32 {
        self.head_index
    }

    /// Rows written since the last `configure`.
    #[must_use]
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// The underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The current surface, if configured.
    pub fn surface(&self) -> Option<&D::Surface> {
        self.surface.as_ref()
    }

    /// (Re)allocate the surface for `geometry`.
    ///
    /// The previous surface is released before the replacement is allocated.
    /// Counters restart at zero. On failure the store is left unconfigured.
    pub fn configure(&mut self, geometry: StreamGeometry) -> Result<()> {
        if geometry.width == 0 || geometry.max_lines == 0 {
            return Err(ScanError::InvalidGeometry(format!(
                "{}x{}",
                geometry.width, geometry.max_lines
            )));
        }

        self.teardown();

        let surface = self.device.allocate(geometry)?;
        tracing::debug!(
            width = geometry.width,
            max_lines = geometry.max_lines,
            "Ring surface allocated"
        );
        self.surface = Some(surface);
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Write one row at the head and advance.
    ///
    /// A payload whose length differs from the configured width is rejected
    /// and leaves the head and total untouched.
    pub fn write_row(&mut self, pixels: &[u8]) -> Result<()> {
        let (Some(surface), Some(geometry)) = (self.surface.as_mut(), self.geometry) else {
            return Err(ScanError::NotConfigured);
        };
        if pixels.len() != geometry.width as usize {
            return Err(ScanError::RowLength {
                expected: geometry.width,
                actual: pixels.len(),
            });
        }

        surface.write_row(self.head_index, pixels);
        self.head_index = (self.head_index + 1) % geometry.max_lines;
        self.total_lines += 1;
        Ok(())
    }

    /// Parameter block for the current ring position and `transform`.
    #[must_use]
    pub fn parameters(&self, transform: &TransformState) -> SurfaceParams {
        let capacity = self.geometry.map_or(0, |g| g.max_lines);
        SurfaceParams::new(self.head_index, capacity, self.total_lines, transform)
    }

    /// Upload the parameter block. No-op while unconfigured.
    pub fn publish_parameters(&mut self, transform: &TransformState) {
        let params = self.parameters(transform);
        if let Some(surface) = self.surface.as_mut() {
            surface.publish(&params);
        }
    }

    /// Release the surface and forget the geometry.
    pub fn teardown(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.device.release(surface);
            tracing::debug!("Ring surface released");
        }
        self.geometry = None;
        self.head_index = 0;
        self.total_lines = 0;
    }
}

impl<D: RenderDevice> Drop for RingBufferStore<D> {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.device.release(surface);
        }
    }
}

impl RingBufferStore<HostDevice> {
    /// Retained rows, oldest first.
    ///
    /// Yields `min(total_lines, capacity)` rows, starting at the head once
    /// the ring has wrapped.
    #[must_use]
    pub fn rows_oldest_first(&self) -> Vec<&[u8]> {
        let (Some(surface), Some(geometry)) = (self.surface.as_ref(), self.geometry) else {
            return Vec::new();
        };
        let capacity = u64::from(geometry.max_lines);
        let retained = self.total_lines.min(capacity) as u32;
        let start = if self.total_lines >= capacity {
            self.head_index
        } else {
            0
        };
        (0..retained)
            .map(|i| surface.row((start + i) % geometry.max_lines))
            .collect()
    }
}

/// Largest surface [`HostDevice`] will allocate, in bytes.
pub const HOST_SURFACE_LIMIT: usize = 256 * 1024 * 1024;

/// CPU-resident [`RenderDevice`].
///
/// Used by the headless probe and in tests. Can be told to refuse
/// allocation to exercise the device-unavailable path.
#[derive(Debug, Default)]
pub struct HostDevice {
    unavailable: Option<String>,
    allocations: usize,
    releases: usize,
}

impl HostDevice {
    /// A device that always allocates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that refuses every allocation with `reason`.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Number of successful allocations.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Surfaces allocated and not yet released.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.allocations - self.releases
    }
}

impl RenderDevice for HostDevice {
    type Surface = HostSurface;

    fn allocate(&mut self, geometry: StreamGeometry) -> Result<HostSurface> {
        if let Some(reason) = &self.unavailable {
            return Err(ScanError::DeviceUnavailable(reason.clone()));
        }
        let len = geometry
            .surface_len()
            .filter(|len| *len <= HOST_SURFACE_LIMIT)
            .ok_or_else(|| {
                ScanError::InvalidGeometry(format!(
                    "{}x{} exceeds the {HOST_SURFACE_LIMIT} byte host surface limit",
                    geometry.width, geometry.max_lines
                ))
            })?;
        self.allocations += 1;
        Ok(HostSurface {
            width: geometry.width,
            pixels: vec![0; len],
            params: SurfaceParams::default(),
        })
    }

    fn release(&mut self, _surface: HostSurface) {
        self.releases += 1;
    }
}

/// CPU copy of the ring surface.
#[derive(Debug, Clone)]
pub struct HostSurface {
    width: u32,
    pixels: Vec<u8>,
    params: SurfaceParams,
}

impl HostSurface {
    /// Physical row `index`.
    #[must_use]
    pub fn row(&self, index: u32) -> &[u8] {
        let width = self.width as usize;
        let start = index as usize * width;
        &self.pixels[start..start + width]
    }

    /// Last published parameter block.
    #[must_use]
    pub fn params(&self) -> SurfaceParams {
        self.params
    }
}

impl RowSurface for HostSurface {
    fn write_row(&mut self, row: u32, pixels: &[u8]) {
        let width = self.width as usize;
        let start = row as usize * width;
        self.pixels[start..start + width].copy_from_slice(pixels);
    }

    fn publish(&mut self, params: &SurfaceParams) {
        self.params = *params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(width: u32, lines: u32) -> RingBufferStore<HostDevice> {
        let mut store = RingBufferStore::new(HostDevice::new());
        store.configure(StreamGeometry::new(width, lines)).unwrap();
        store
    }

    #[test]
    fn test_params_layout_is_32_bytes() {
        assert_eq!(SURFACE_PARAMS_SIZE, 32);
        let params = SurfaceParams::new(3, 8, (7u64 << 32) | 5, &TransformState::IDENTITY);
        assert_eq!(params.total_lo, 5);
        assert_eq!(params.total_hi, 7);
        assert_eq!(params.total_lines(), (7u64 << 32) | 5);
        assert_eq!(bytemuck::bytes_of(&params).len(), 32);
    }

    #[test]
    fn test_write_before_configure_rejected() {
        let mut store = RingBufferStore::new(HostDevice::new());
        assert!(!store.is_ready());
        assert!(matches!(store.write_row(&[1, 2]), Err(ScanError::NotConfigured)));
        assert_eq!(store.total_lines(), 0);
    }

    #[test]
    fn test_write_advances_head() {
        let mut store = store(4, 3);
        store.write_row(&[1; 4]).unwrap();
        store.write_row(&[2; 4]).unwrap();
        assert_eq!(store.head_index(), 2);
        store.write_row(&[3; 4]).unwrap();
        assert_eq!(store.head_index(), 0);
        store.write_row(&[4; 4]).unwrap();
        assert_eq!(store.head_index(), 1);
        assert_eq!(store.total_lines(), 4);

        let rows: Vec<u8> = store.rows_oldest_first().iter().map(|r| r[0]).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn test_wrong_length_row_does_not_advance() {
        let mut store = store(4, 3);
        store.write_row(&[9; 4]).unwrap();
        let err = store.write_row(&[1; 5]).unwrap_err();
        assert!(matches!(err, ScanError::RowLength { expected: 4, actual: 5 }));
        assert!(store.write_row(&[1; 3]).is_err());
        assert!(store.write_row(&[]).is_err());
        assert_eq!(store.head_index(), 1);
        assert_eq!(store.total_lines(), 1);
    }

    #[test]
    fn test_configure_rejects_zero_dimensions() {
        let mut store = RingBufferStore::new(HostDevice::new());
        assert!(matches!(
            store.configure(StreamGeometry::new(0, 10)),
            Err(ScanError::InvalidGeometry(_))
        ));
        assert!(store.configure(StreamGeometry::new(10, 0)).is_err());
        assert_eq!(store.device().allocations(), 0);
    }

    #[test]
    fn test_oversized_geometry_rejected_without_allocating() {
        let mut store = RingBufferStore::new(HostDevice::new());
        for geometry in [
            StreamGeometry::new(u32::MAX, u32::MAX),
            StreamGeometry::new(1_000_000, 1_000_000),
        ] {
            assert!(matches!(
                store.configure(geometry),
                Err(ScanError::InvalidGeometry(_))
            ));
        }
        assert!(!store.is_ready());
        assert_eq!(store.device().allocations(), 0);

        store.configure(StreamGeometry::new(8192, 2048)).unwrap();
        assert!(store.is_ready());
    }

    #[test]
    fn test_reconfigure_releases_before_allocating() {
        let mut store = store(8, 4);
        store.write_row(&[1; 8]).unwrap();
        store.configure(StreamGeometry::new(16, 4)).unwrap();
        assert_eq!(store.device().allocations(), 2);
        assert_eq!(store.device().live_surfaces(), 1);
        assert_eq!(store.total_lines(), 0);
        assert_eq!(store.head_index(), 0);
    }

    #[test]
    fn test_unavailable_device_leaves_store_unready() {
        let mut store = RingBufferStore::new(HostDevice::unavailable("No GPU adapter found"));
        let err = store.configure(StreamGeometry::new(8, 4)).unwrap_err();
        assert_eq!(err.status_text(), "No GPU adapter found");
        assert!(!store.is_ready());
        assert!(store.geometry().is_none());
    }

    #[test]
    fn test_publish_carries_ring_and_transform() {
        let mut store = store(2, 5);
        store.write_row(&[0; 2]).unwrap();
        store.write_row(&[0; 2]).unwrap();
        let transform = TransformState {
            zoom: 2.0,
            pan_x: 0.25,
            pan_y: -0.5,
        };
        store.publish_parameters(&transform);

        let params = store.surface().unwrap().params();
        assert_eq!(params.head_index, 2);
        assert_eq!(params.capacity, 5);
        assert_eq!(params.total_lines(), 2);
        assert_eq!(params.zoom, 2.0);
        assert_eq!(params.pan_x, 0.25);
        assert_eq!(params.pan_y, -0.5);
    }

    #[test]
    fn test_teardown_releases_surface() {
        let mut store = store(2, 2);
        store.teardown();
        assert!(!store.is_ready());
        assert_eq!(store.device().live_surfaces(), 0);
        // Publishing while unconfigured is a no-op.
        store.publish_parameters(&TransformState::IDENTITY);
    }

    proptest! {
        #[test]
        fn prop_retains_most_recent_rows(capacity in 1u32..32, extra in 1usize..80) {
            let mut store = store(2, capacity);
            let n = capacity as usize + extra;
            for i in 0..n {
                let tag = (i % 251) as u8;
                store.write_row(&[tag, tag]).unwrap();
            }

            prop_assert_eq!(u64::from(store.head_index()), n as u64 % u64::from(capacity));
            prop_assert_eq!(store.total_lines(), n as u64);

            let rows = store.rows_oldest_first();
            prop_assert_eq!(rows.len(), capacity as usize);
            for (k, row) in rows.iter().enumerate() {
                let expected = ((n - capacity as usize + k) % 251) as u8;
                prop_assert_eq!(row[0], expected);
            }
        }
    }
}
