//! One procedural sphere: topology, projection, displacement and coloring.
//!
//! A generation pass runs the noise kernel over the cached sphere
//! projection, maps the resulting elevations to colors and commits the
//! mesh. Passes are all-or-nothing: if a dispatch fails the committed mesh,
//! noise range and settings stay exactly as they were.

use glam::Vec3;
use sphere_geo::{build_topology, recalculate_normals, CubeTopology, Resolution};

use crate::animation::OffsetAnimator;
use crate::backend::{ComputeBackend, Projection};
use crate::batch::NoiseBatch;
use crate::color::{Gradient, GradientColorMapper, NoiseRange};
use crate::config::SphereConfig;
use crate::error::{ConfigError, SphereError};
use crate::mesh::{MeshBuffers, MeshSink};

/// Everything a settings update may replace, kept for rollback.
struct Snapshot {
    config: SphereConfig,
    resolution: Resolution,
    topology: Option<CubeTopology>,
    base: Option<Projection>,
    mapper: GradientColorMapper,
    animator: OffsetAnimator,
    triangles_dirty: bool,
}

/// A cube-sphere mesh driven by a [`SphereConfig`] and a compute backend.
pub struct ProceduralSphere<B: ComputeBackend> {
    config: SphereConfig,
    resolution: Resolution,
    backend: B,
    topology: CubeTopology,
    base: Projection,
    mapper: GradientColorMapper,
    animator: OffsetAnimator,
    mesh: MeshBuffers,
    triangles_dirty: bool,
    positions_scratch: Vec<Vec3>,
    noise_scratch: Vec<f32>,
}

impl<B: ComputeBackend> ProceduralSphere<B> {
    /// Validate `config`, build the topology, project it and run the first pass.
    pub fn new(config: SphereConfig, backend: B) -> Result<Self, SphereError> {
        let resolution = config.validate()?;
        let topology = build_topology(resolution);
        log::info!(
            "[topology] r={} vertices={} indices={}",
            resolution.get(),
            topology.vertices.len(),
            topology.triangles.len()
        );
        let base =
            backend.project_all(&topology.vertices, resolution.get(), config.shape.radius)?;
        let mapper = GradientColorMapper::new(&config.color.gradient, config.color.range_policy);
        let animator = OffsetAnimator::new(config.offset_driver);
        let mut sphere = Self {
            config,
            resolution,
            backend,
            topology,
            base,
            mapper,
            animator,
            mesh: MeshBuffers::default(),
            triangles_dirty: true,
            positions_scratch: Vec::new(),
            noise_scratch: Vec::new(),
        };
        sphere.generate()?;
        Ok(sphere)
    }

    /// Run one generation pass with the current frame offset and commit it.
    pub fn generate(&mut self) -> Result<&MeshBuffers, SphereError> {
        let n = self.base.positions.len();
        let batch = NoiseBatch::compile(&self.config.shape.noise_layers, self.animator.current());
        if self.noise_scratch.len() != n {
            self.noise_scratch.resize(n, 0.0);
            self.positions_scratch.resize(n, Vec3::ZERO);
        }
        self.backend.displace(
            &self.base.positions,
            &batch,
            self.config.shape.radius,
            &mut self.positions_scratch,
            &mut self.noise_scratch,
        )?;

        // Dispatch succeeded; everything below is infallible.
        self.mapper.map_colors_into(&self.noise_scratch, &mut self.mesh.colors);
        std::mem::swap(&mut self.mesh.vertices, &mut self.positions_scratch);
        std::mem::swap(&mut self.mesh.noise_values, &mut self.noise_scratch);
        if self.config.recalculate_normals {
            self.mesh.normals = recalculate_normals(&self.mesh.vertices, &self.topology.triangles);
        } else {
            self.mesh.normals.clone_from(&self.base.normals);
        }
        if self.triangles_dirty {
            self.mesh.triangles.clone_from(&self.topology.triangles);
            self.triangles_dirty = false;
        }
        let range = self.mapper.range();
        log::debug!(
            "[sphere] pass on {}: {} layers, noise [{}, {}]",
            self.backend.name(),
            batch.len(),
            range.min,
            range.max
        );
        Ok(&self.mesh)
    }

    /// [`ProceduralSphere::generate`], then publish to `sink`. Nothing is
    /// published when the pass fails.
    pub fn generate_into(&mut self, sink: &mut impl MeshSink) -> Result<(), SphereError> {
        self.generate()?;
        sink.publish(&self.mesh);
        Ok(())
    }

    /// Advance the animation by `dt` seconds and regenerate if the offset
    /// moved. Spheres without noise layers never animate.
    /// Returns whether a pass ran.
    pub fn tick(&mut self, dt: f32, follow_position: Vec3) -> Result<bool, SphereError> {
        if self.config.shape.noise_layers.is_empty() {
            return Ok(false);
        }
        let previous = self.animator.clone();
        if self.animator.advance(dt, self.config.shape.offset_velocity, follow_position).is_none() {
            return Ok(false);
        }
        if let Err(e) = self.generate().map(|_| ()) {
            self.animator = previous;
            return Err(e);
        }
        Ok(true)
    }

    /// Replace the configuration and regenerate.
    ///
    /// Reprojects when the resolution or radius changed, resamples the LUT
    /// only when the gradient changed, and starts a fresh noise range. On
    /// error the previous state is restored.
    pub fn update_settings(&mut self, config: SphereConfig) -> Result<&MeshBuffers, SphereError> {
        let resolution = config.validate()?;
        let resized = resolution != self.resolution;
        let reproject = resized || config.shape.radius != self.config.shape.radius;

        // Fallible device work first, before anything is replaced.
        let topology = resized.then(|| build_topology(resolution));
        let base = if reproject {
            let cube = topology.as_ref().map_or(&self.topology.vertices, |t| &t.vertices);
            Some(self.backend.project_all(cube, resolution.get(), config.shape.radius)?)
        } else {
            None
        };

        let mut mapper = self.mapper.clone();
        if config.color.gradient != self.config.color.gradient {
            mapper.rebuild(&config.color.gradient);
        }
        mapper.set_policy(config.color.range_policy);
        mapper.reset_range();
        let mut animator = self.animator.clone();
        animator.set_driver(config.offset_driver);

        let dirty = self.triangles_dirty || resized;
        let snapshot = Snapshot {
            config: std::mem::replace(&mut self.config, config),
            resolution: std::mem::replace(&mut self.resolution, resolution),
            topology: topology.map(|t| std::mem::replace(&mut self.topology, t)),
            base: base.map(|b| std::mem::replace(&mut self.base, b)),
            mapper: std::mem::replace(&mut self.mapper, mapper),
            animator: std::mem::replace(&mut self.animator, animator),
            triangles_dirty: std::mem::replace(&mut self.triangles_dirty, dirty),
        };
        if resized {
            log::info!(
                "[topology] r={} vertices={} indices={}",
                resolution.get(),
                self.topology.vertices.len(),
                self.topology.triangles.len()
            );
        }

        if let Err(e) = self.generate().map(|_| ()) {
            self.restore(snapshot);
            return Err(e);
        }
        Ok(&self.mesh)
    }

    fn restore(&mut self, s: Snapshot) {
        self.config = s.config;
        self.resolution = s.resolution;
        if let Some(t) = s.topology {
            self.topology = t;
        }
        if let Some(b) = s.base {
            self.base = b;
        }
        self.mapper = s.mapper;
        self.animator = s.animator;
        self.triangles_dirty = s.triangles_dirty;
        log::warn!("[sphere] settings update failed; previous settings restored");
    }

    /// Swap the gradient and recolor the committed mesh without a dispatch.
    pub fn set_gradient(&mut self, gradient: Gradient) -> Result<(), ConfigError> {
        gradient.validate()?;
        self.mapper.rebuild(&gradient);
        self.config.color.gradient = gradient;
        self.mapper.map_colors_into(&self.mesh.noise_values, &mut self.mesh.colors);
        Ok(())
    }

    /// Forget the accumulated noise range; the next pass starts fresh.
    pub fn reset_noise_range(&mut self) {
        self.mapper.reset_range();
    }

    /// Last committed mesh.
    #[must_use]
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SphereConfig {
        &self.config
    }

    /// Validated resolution.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Cube-space lattice.
    #[must_use]
    pub fn topology(&self) -> &CubeTopology {
        &self.topology
    }

    /// Undisplaced sphere positions and normals.
    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.base
    }

    /// Noise range used by the last pass.
    #[must_use]
    pub fn noise_range(&self) -> NoiseRange {
        self.mapper.range()
    }

    /// Color mapper.
    #[must_use]
    pub fn mapper(&self) -> &GradientColorMapper {
        &self.mapper
    }

    /// Offset added to every layer this frame.
    #[must_use]
    pub fn frame_offset(&self) -> Vec3 {
        self.animator.current()
    }

    /// Compute backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
