#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cube;
pub mod normals;
pub mod warp;


pub use cube::{build_topology, CubeTopology, Resolution, MAX_RESOLUTION, MIN_RESOLUTION};
pub use normals::recalculate_normals;
pub use warp::{cube_to_sphere, project_lattice_point, to_unit_cube};
