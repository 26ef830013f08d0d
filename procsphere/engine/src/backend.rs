//! Dispatch strategy for the per-vertex kernels.
//!
//! A [`ComputeBackend`] runs the projection and displacement kernels over a
//! whole vertex array and blocks until the results are in host memory. The
//! CPU backend here and [`crate::gpu_backend::GpuBackend`] evaluate the same
//! kernels, so a sphere produces the same mesh whichever one it is given.

use glam::Vec3;
use rayon::prelude::*;

use crate::batch::NoiseBatch;
use crate::error::DispatchError;
use crate::kernels::{displace_vertex, project_vertex, WORKGROUP_SIZE};

/// Base positions and normals from the projection kernel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    /// Points on the sphere of the requested radius
    pub positions: Vec<Vec3>,
    /// Outward unit normals
    pub normals: Vec<Vec3>,
}

/// Result of the displacement kernel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Displacement {
    /// Displaced positions
    pub positions: Vec<Vec3>,
    /// Raw elevation per vertex
    pub noise: Vec<f32>,
}

/// Runs both kernels over full vertex arrays.
pub trait ComputeBackend {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Project cube lattice points onto the sphere of `radius`.
    /// Output slices must be as long as `cube_points`.
    fn project(
        &self,
        cube_points: &[Vec3],
        resolution: u32,
        radius: f32,
        positions: &mut [Vec3],
        normals: &mut [Vec3],
    ) -> Result<(), DispatchError>;

    /// Displace `sphere_points` by the layered noise in `batch`.
    /// Output slices must be as long as `sphere_points`.
    fn displace(
        &self,
        sphere_points: &[Vec3],
        batch: &NoiseBatch,
        radius: f32,
        positions: &mut [Vec3],
        noise: &mut [f32],
    ) -> Result<(), DispatchError>;

    /// Allocating form of [`ComputeBackend::project`].
    fn project_all(
        &self,
        cube_points: &[Vec3],
        resolution: u32,
        radius: f32,
    ) -> Result<Projection, DispatchError> {
        let mut out = Projection {
            positions: vec![Vec3::ZERO; cube_points.len()],
            normals: vec![Vec3::ZERO; cube_points.len()],
        };
        self.project(cube_points, resolution, radius, &mut out.positions, &mut out.normals)?;
        Ok(out)
    }

    /// Allocating form of [`ComputeBackend::displace`].
    fn displace_all(
        &self,
        sphere_points: &[Vec3],
        batch: &NoiseBatch,
        radius: f32,
    ) -> Result<Displacement, DispatchError> {
        let mut out = Displacement {
            positions: vec![Vec3::ZERO; sphere_points.len()],
            noise: vec![0.0; sphere_points.len()],
        };
        self.displace(sphere_points, batch, radius, &mut out.positions, &mut out.noise)?;
        Ok(out)
    }
}

impl<B: ComputeBackend + ?Sized> ComputeBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn project(
        &self,
        cube_points: &[Vec3],
        resolution: u32,
        radius: f32,
        positions: &mut [Vec3],
        normals: &mut [Vec3],
    ) -> Result<(), DispatchError> {
        (**self).project(cube_points, resolution, radius, positions, normals)
    }

    fn displace(
        &self,
        sphere_points: &[Vec3],
        batch: &NoiseBatch,
        radius: f32,
        positions: &mut [Vec3],
        noise: &mut [f32],
    ) -> Result<(), DispatchError> {
        (**self).displace(sphere_points, batch, radius, positions, noise)
    }
}

/// Fail with [`DispatchError::SizeMismatch`] unless `got == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), DispatchError> {
    if expected == got {
        Ok(())
    } else {
        Err(DispatchError::SizeMismatch { what, expected, got })
    }
}

enum Mode {
    Serial,
    Global,
    Pool(rayon::ThreadPool),
}

/// Kernels on the host, either one vertex at a time or across a rayon pool.
pub struct CpuBackend {
    mode: Mode,
}

impl CpuBackend {
    /// Single-threaded reference evaluation.
    #[must_use]
    pub fn serial() -> Self {
        Self { mode: Mode::Serial }
    }

    /// Parallel evaluation on rayon's global pool.
    #[must_use]
    pub fn parallel() -> Self {
        Self { mode: Mode::Global }
    }

    /// Parallel evaluation on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, DispatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sphere-cpu-{i}"))
            .build()
            .map_err(|e| DispatchError::ThreadPool(e.to_string()))?;
        Ok(Self { mode: Mode::Pool(pool) })
    }

    fn run<F: FnOnce() + Send>(&self, f: F) {
        match &self.mode {
            Mode::Pool(pool) => pool.install(f),
            _ => f(),
        }
    }

    fn is_serial(&self) -> bool {
        matches!(self.mode, Mode::Serial)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::parallel()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        match self.mode {
            Mode::Serial => "cpu-serial",
            Mode::Global | Mode::Pool(_) => "cpu-rayon",
        }
    }

    fn project(
        &self,
        cube_points: &[Vec3],
        resolution: u32,
        radius: f32,
        positions: &mut [Vec3],
        normals: &mut [Vec3],
    ) -> Result<(), DispatchError> {
        check_len("positions", cube_points.len(), positions.len())?;
        check_len("normals", cube_points.len(), normals.len())?;
        let kernel = |((pos, nrm), &p): ((&mut Vec3, &mut Vec3), &Vec3)| {
            (*pos, *nrm) = project_vertex(p, resolution, radius);
        };
        if self.is_serial() {
            positions.iter_mut().zip(normals.iter_mut()).zip(cube_points).for_each(kernel);
        } else {
            self.run(|| {
                positions
                    .par_iter_mut()
                    .zip(normals.par_iter_mut())
                    .zip(cube_points.par_iter())
                    .with_min_len(WORKGROUP_SIZE as usize)
                    .for_each(kernel);
            });
        }
        Ok(())
    }

    fn displace(
        &self,
        sphere_points: &[Vec3],
        batch: &NoiseBatch,
        radius: f32,
        positions: &mut [Vec3],
        noise: &mut [f32],
    ) -> Result<(), DispatchError> {
        check_len("positions", sphere_points.len(), positions.len())?;
        check_len("noise", sphere_points.len(), noise.len())?;
        let entries = batch.entries();
        let kernel = |((pos, n), &p): ((&mut Vec3, &mut f32), &Vec3)| {
            (*pos, *n) = displace_vertex(p, entries, radius);
        };
        if self.is_serial() {
            positions.iter_mut().zip(noise.iter_mut()).zip(sphere_points).for_each(kernel);
        } else {
            self.run(|| {
                positions
                    .par_iter_mut()
                    .zip(noise.par_iter_mut())
                    .zip(sphere_points.par_iter())
                    .with_min_len(WORKGROUP_SIZE as usize)
                    .for_each(kernel);
            });
        }
        Ok(())
    }
}
