#![warn(missing_docs)]

//! Triangle mesh kernel for torsoscan.
//!
//! Provides the geometry primitives the analysis pipeline runs on: an owned
//! [`Mesh`] with a world transform, bounding boxes and cylinders, slab
//! slicing and convex boolean intersection by plane clipping, island
//! splitting, 2D convex hulls, decimation and volume integration.
//!
//! # Example
//!
//! ```ignore
//! use torsoscan_math::Axis;
//! use torsoscan_mesh::{ClipKernel, GeometryKernel, TorsoPhantom};
//!
//! let torso = TorsoPhantom::default().build();
//! let kernel = ClipKernel;
//! let slice = kernel.slice(&torso, Axis::Z, 0.28, 0.01).unwrap();
//! println!("islands: {}", kernel.islands(&slice).len());
//! ```

pub mod bounds;
pub mod clip;
pub mod contour;
pub mod decimate;
pub mod error;
pub mod hull;
pub mod islands;
pub mod kernel;
pub mod mesh;
pub mod phantom;
pub mod primitives;

pub use bounds::{BoundingBox, BoundingCylinder};
pub use clip::{clip_convex, clip_half_space, intersect, slice, Plane};
pub use contour::Polygon;
pub use decimate::decimate;
pub use error::{MeshError, Result};
pub use hull::{convex_hull_2d, hull_area, hull_perimeter, hull_polygon};
pub use islands::{island_count, islands};
pub use kernel::{ClipKernel, GeometryKernel};
pub use mesh::Mesh;
pub use phantom::{Bump, TorsoPhantom};
pub use primitives::{cuboid, cylinder};
