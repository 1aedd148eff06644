mod basis;
mod bezier;
mod core;
mod linalg;
mod mesh;
mod nurbs;

pub use basis::{
    BasisError, averaged_knot_vector, basis_functions, bernstein, binomial_coefficients,
    chord_length_params, find_span_linear,
};
pub use bezier::{BezierError, BezierSurfaceSource};
pub use core::{Point3, Tolerance, Transform, Vec3};
pub use linalg::{
    LinalgError, MIN_PIVOT, SquareMatrix, backward_substitution, forward_substitution,
    lu_decompose, lu_solve_points,
};
pub use mesh::{MeshCells, SurfaceMesh, WrapAround, quad_grid, triangulate_grid};
pub use nurbs::{NurbsConfig, NurbsDiagnostics, NurbsError, NurbsSurfaceSource};
