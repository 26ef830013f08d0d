//! WGSL compute pipelines for projection and noise displacement.
//!
//! Vec3 arrays travel as `array<vec4<f32>>` (w unused) to satisfy storage
//! layout rules. Buffers are created per dispatch and dropped on return.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::backend::{check_len, ComputeBackend};
use crate::batch::{CompiledNoiseEntry, NoiseBatch};
use crate::error::DispatchError;
use crate::gpu::{persistent, read_back, GpuContext};
use crate::kernels::WORKGROUP_SIZE;

/// Projection kernel source (entry point `project`).
pub const PROJECT_WGSL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../shaders/cube_sphere.wgsl"));
/// Displacement kernel source (entry point `main`).
pub const DISPLACE_WGSL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../shaders/noise_displace.wgsl"));

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ProjectParams {
    count: u32,
    resolution: u32,
    radius: f32,
    _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DisplaceParams {
    count: u32,
    entry_count: u32,
    radius: f32,
    _pad: u32,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(16),
        },
        count: None,
    }
}

/// Run `f` inside a validation error scope and surface whatever it raised.
fn validated<T>(ctx: &GpuContext, f: impl FnOnce() -> T) -> Result<T, String> {
    ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    match pollster::block_on(ctx.device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(out),
    }
}

fn to_vec4(points: &[Vec3]) -> Vec<[f32; 4]> {
    points.iter().map(|p| [p.x, p.y, p.z, 0.0]).collect()
}

fn vec3_bytes(n: usize) -> u64 {
    (n * std::mem::size_of::<[f32; 4]>()) as u64
}

#[allow(clippy::cast_possible_truncation)]
fn workgroups(n: usize) -> u32 {
    (n as u32).div_ceil(WORKGROUP_SIZE)
}

struct Kernel {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl Kernel {
    fn new(
        ctx: &GpuContext,
        label: &str,
        source: &str,
        entry_point: &str,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Result<Self, DispatchError> {
        validated(ctx, || {
            let module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            });
            let pipeline_layout =
                ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts: &[&layout],
                    push_constant_ranges: &[],
                });
            let pipeline = ctx.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point,
            });
            Self { pipeline, layout }
        })
        .map_err(DispatchError::Pipeline)
    }

    /// Bind `buffers` in order and dispatch one thread per element.
    fn dispatch(
        &self,
        ctx: &GpuContext,
        label: &str,
        buffers: &[&wgpu::Buffer],
        count: usize,
    ) -> Result<(), DispatchError> {
        validated(ctx, || {
            let entries: Vec<wgpu::BindGroupEntry> = buffers
                .iter()
                .enumerate()
                .map(|(i, b)| wgpu::BindGroupEntry {
                    binding: i as u32,
                    resource: b.as_entire_binding(),
                })
                .collect();
            let bind = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.layout,
                entries: &entries,
            });
            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
            {
                let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(label),
                    timestamp_writes: None,
                });
                cpass.set_pipeline(&self.pipeline);
                cpass.set_bind_group(0, &bind, &[]);
                cpass.dispatch_workgroups(workgroups(count), 1, 1);
            }
            ctx.queue.submit(Some(encoder.finish()));
        })
        .map_err(DispatchError::Pipeline)
    }
}

/// Both kernels on a wgpu device.
pub struct GpuBackend {
    ctx: &'static GpuContext,
    project: Kernel,
    displace: Kernel,
}

impl GpuBackend {
    /// Build both pipelines on `ctx`.
    pub fn new(ctx: &'static GpuContext) -> Result<Self, DispatchError> {
        let project = Kernel::new(
            ctx,
            "cube_sphere.wgsl",
            PROJECT_WGSL,
            "project",
            &[uniform_entry(0), storage_entry(1, true), storage_entry(2, false), storage_entry(3, false)],
        )?;
        let displace = Kernel::new(
            ctx,
            "noise_displace.wgsl",
            DISPLACE_WGSL,
            "main",
            &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
            ],
        )?;
        log::debug!("[gpu] pipelines ready on {}", ctx.adapter_info.name);
        Ok(Self { ctx, project, displace })
    }

    /// Build on the shared context from [`persistent`].
    pub fn persistent() -> Result<Self, DispatchError> {
        Self::new(persistent()?)
    }

    fn storage(&self, label: &str, contents: &[u8], writable: bool) -> wgpu::Buffer {
        let usage = if writable {
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC
        } else {
            wgpu::BufferUsages::STORAGE
        };
        self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        })
    }

    fn output(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn uniform<T: bytemuck::Pod>(&self, label: &str, value: &T) -> wgpu::Buffer {
        self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }
}

fn copy_vec3(src: &[[f32; 4]], dst: &mut [Vec3]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Vec3::new(s[0], s[1], s[2]);
    }
}

impl ComputeBackend for GpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    #[allow(clippy::cast_possible_truncation)]
    fn project(
        &self,
        cube_points: &[Vec3],
        resolution: u32,
        radius: f32,
        positions: &mut [Vec3],
        normals: &mut [Vec3],
    ) -> Result<(), DispatchError> {
        let n = cube_points.len();
        check_len("positions", n, positions.len())?;
        check_len("normals", n, normals.len())?;
        if n == 0 {
            return Ok(());
        }
        let params = self.uniform(
            "project.params",
            &ProjectParams { count: n as u32, resolution, radius, _pad: 0 },
        );
        let input = self.storage("project.in", bytemuck::cast_slice(&to_vec4(cube_points)), false);
        let out_pos = self.output("project.pos", vec3_bytes(n));
        let out_nrm = self.output("project.nrm", vec3_bytes(n));
        self.project.dispatch(self.ctx, "project", &[&params, &input, &out_pos, &out_nrm], n)?;

        let pos: Vec<[f32; 4]> = read_back(self.ctx, &out_pos, vec3_bytes(n))?;
        let nrm: Vec<[f32; 4]> = read_back(self.ctx, &out_nrm, vec3_bytes(n))?;
        check_len("readback", n, pos.len().min(nrm.len()))?;
        copy_vec3(&pos, positions);
        copy_vec3(&nrm, normals);
        log::trace!("[gpu] projected {n} vertices");
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn displace(
        &self,
        sphere_points: &[Vec3],
        batch: &NoiseBatch,
        radius: f32,
        positions: &mut [Vec3],
        noise: &mut [f32],
    ) -> Result<(), DispatchError> {
        let n = sphere_points.len();
        check_len("positions", n, positions.len())?;
        check_len("noise", n, noise.len())?;
        if n == 0 {
            return Ok(());
        }
        let params = self.uniform(
            "displace.params",
            &DisplaceParams {
                count: n as u32,
                entry_count: batch.len() as u32,
                radius,
                _pad: 0,
            },
        );
        // Zero-sized bindings are invalid; an empty batch uploads one unused entry.
        let dummy = [CompiledNoiseEntry::default()];
        let entry_bytes: &[u8] =
            if batch.is_empty() { bytemuck::cast_slice(&dummy) } else { batch.as_bytes() };
        let entries = self.storage("displace.entries", entry_bytes, false);
        let input = self.storage("displace.in", bytemuck::cast_slice(&to_vec4(sphere_points)), false);
        let out_pos = self.output("displace.pos", vec3_bytes(n));
        let noise_bytes = (n * std::mem::size_of::<f32>()) as u64;
        let out_noise = self.output("displace.noise", noise_bytes);
        self.displace.dispatch(
            self.ctx,
            "displace",
            &[&params, &entries, &input, &out_pos, &out_noise],
            n,
        )?;

        let pos: Vec<[f32; 4]> = read_back(self.ctx, &out_pos, vec3_bytes(n))?;
        let values: Vec<f32> = read_back(self.ctx, &out_noise, noise_bytes)?;
        check_len("readback", n, pos.len().min(values.len()))?;
        copy_vec3(&pos, positions);
        noise.copy_from_slice(&values);
        log::trace!("[gpu] displaced {n} vertices by {} layers", batch.len());
        Ok(())
    }
}
