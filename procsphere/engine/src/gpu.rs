//! wgpu device/queue helper and blocking buffer readback.

use std::sync::OnceLock;
use wgpu::{Device, Instance, Queue};

use crate::error::DispatchError;

/// Device and queue shared by the GPU kernels.
pub struct GpuContext {
    /// Instance used to create adapters
    pub instance: Instance,
    /// Logical device
    pub device: Device,
    /// Submission queue
    pub queue: Queue,
    /// Adapter description for logs
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Create a context on a high-performance adapter.
    pub async fn new() -> Result<Self, DispatchError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DispatchError::NoAdapter)?;
        let adapter_info = adapter.get_info();
        // Storage buffers only; default limits are enough for r = 99.
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("sphere-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| DispatchError::DeviceCreation(e.to_string()))?;
        log::info!("[gpu] using {} ({:?})", adapter_info.name, adapter_info.backend);
        Ok(Self { instance, device, queue, adapter_info })
    }

    /// Blocking form of [`GpuContext::new`].
    pub fn new_blocking() -> Result<Self, DispatchError> {
        pollster::block_on(Self::new())
    }
}

/// Global persistent GPU context to avoid per-sphere device creation.
static GPU_CTX: OnceLock<Result<GpuContext, DispatchError>> = OnceLock::new();

/// Shared `GpuContext`, created on first use. A failed creation is cached too.
pub fn persistent() -> Result<&'static GpuContext, DispatchError> {
    GPU_CTX.get_or_init(GpuContext::new_blocking).as_ref().map_err(Clone::clone)
}

/// Copy `size` bytes of `src` into a mappable buffer, wait, and return them as `T`s.
pub(crate) fn read_back<T: bytemuck::Pod>(
    ctx: &GpuContext,
    src: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<T>, DispatchError> {
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder =
        ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("enc.read") });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size);
    ctx.queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|e| DispatchError::BufferMapping(e.to_string()))?
        .map_err(|e| DispatchError::BufferMapping(e.to_string()))?;

    let data = slice.get_mapped_range();
    let out = bytemuck::cast_slice::<u8, T>(&data).to_vec();
    drop(data);
    staging.unmap();
    Ok(out)
}
