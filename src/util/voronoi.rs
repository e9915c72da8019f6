use delaunator::next_halfedge;
use delaunator::Triangulation;

use itertools::Itertools;

use nannou::geom::Vec2;

#[derive(Debug, Clone)]
pub struct Voronoi {
    /// The Voronoi cells. Each input point has a corresponding cell.
    pub cells: Vec<VoronoiCell>,
    /// The Voronoi cell vertices. Each vertex is the circumcenter of three input points.
    pub vertices: Vec<Vec2>,
    /// The Delaunay triangulation of the input points.
    pub triangulation: Triangulation,
}

#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// The vertices that form the cell. If this is a hull cell, these do not form a closed polygon.
    pub vertices: Vec<usize>,
    /// True if the cell is unbounded: its point lies on the convex hull, touches a flat
    /// triangle, or was skipped by the triangulation (a duplicate).
    pub hull: bool,
}

/// A partition of the plane into cells, one per input point.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// The polygon of each input point's cell, or None if the cell is open.
    pub polygons: Vec<Option<Vec<Vec2>>>,
    /// Pairs of input point indices whose cells share an edge.
    pub ridges: Vec<(usize, usize)>,
}

impl Voronoi {
    pub fn new(points: &[Vec2]) -> Self {
        let triangulation = generate_triangulation(points);

        let mut vertices = Vec::with_capacity(triangulation.triangles.len() / 3);
        let mut flat = vec![];

        for (t, (a, b, c)) in triangulation.triangles.iter().tuples().enumerate() {
            let (a, b, c) = (points[*a], points[*b], points[*c]);

            vertices.push(circumcenter(a, b, c));

            if is_degenerate(a, b, c) {
                flat.push(t);
            }
        }

        let incoming = build_incoming_edge_index(&triangulation, points.len());

        let mut cells = vec![];

        for halfedge in incoming.iter() {
            let mut cell_vertices = vec![];

            for e in edges_around_point(&triangulation, *halfedge) {
                cell_vertices.push(triangle_of_edge(e));
            }

            cells.push(VoronoiCell {
                hull: cell_vertices.is_empty(),
                vertices: cell_vertices,
            });
        }

        for i in triangulation.hull.iter() {
            cells[*i].hull = true;
        }

        // Both ends of an unpaired half-edge lie on the boundary of the triangulation.
        for e in 0..triangulation.triangles.len() {
            if triangulation.halfedges[e] == delaunator::EMPTY {
                cells[triangulation.triangles[e]].hull = true;
                cells[triangulation.triangles[next_halfedge(e)]].hull = true;
            }
        }

        // Nearly collinear points along the hull can be joined by a sliver triangle, which pulls
        // a hull point inside the triangulation. Its circumcenter is far away or meaningless, so
        // every cell around it stays open.
        for t in flat.iter() {
            for e in 3 * t..3 * t + 3 {
                cells[triangulation.triangles[e]].hull = true;
            }
        }

        Self {
            cells,
            vertices,
            triangulation,
        }
    }

    /// The closed cell polygons and the cell adjacency, keyed by input point index.
    pub fn partition(&self) -> Partition {
        let polygons = self
            .cells
            .iter()
            .map(|cell| {
                if cell.hull {
                    return None;
                }

                Some(cell.vertices.iter().map(|v| self.vertices[*v]).collect())
            })
            .collect();

        Partition {
            polygons,
            ridges: self.ridges(),
        }
    }

    /// Each pair of input points joined by a Delaunay edge, listed once.
    pub fn ridges(&self) -> Vec<(usize, usize)> {
        let triangles = &self.triangulation.triangles;
        let halfedges = &self.triangulation.halfedges;

        let mut ridges = Vec::with_capacity(triangles.len() / 2);

        for e in 0..triangles.len() {
            let opposite = halfedges[e];

            // interior edges appear twice, once per direction
            if opposite != delaunator::EMPTY && opposite < e {
                continue;
            }

            ridges.push((triangles[e], triangles[next_halfedge(e)]));
        }

        ridges
    }
}

fn generate_triangulation(points: &[Vec2]) -> Triangulation {
    let mut input = vec![delaunator::Point::default(); points.len()];

    for (i, p) in points.iter().enumerate() {
        input[i].x = p.x as f64;
        input[i].y = p.y as f64;
    }

    delaunator::triangulate(&input)
}

pub fn triangle_of_edge(e: usize) -> usize {
    e / 3
}

/// Traverse the incoming edges around a point, starting with the [incoming_edge].
pub fn edges_around_point(triangulation: &Triangulation, incoming_edge: usize) -> EdgesAroundPoint {
    EdgesAroundPoint {
        triangulation,
        curr: incoming_edge,
        last: incoming_edge,
    }
}

/// Sine of the smallest corner angle below which a triangle is treated as flat.
const FLAT_SINE: f64 = 1e-4;

/// True if the corner at [a] is so close to straight that the triangle has no usable
/// circumcenter. Computed in f64, the precision the triangulation works in.
fn is_degenerate(a: Vec2, b: Vec2, c: Vec2) -> bool {
    let (bx, by) = (b.x as f64 - a.x as f64, b.y as f64 - a.y as f64);
    let (cx, cy) = (c.x as f64 - a.x as f64, c.y as f64 - a.y as f64);

    let cross = bx * cy - by * cx;

    cross.abs() <= FLAT_SINE * bx.hypot(by) * cx.hypot(cy)
}

/// Find the circumcenter of a triangle.
fn circumcenter(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    // Work relative to [a] to keep the squared lengths small.
    let b = b - a;
    let c = c - a;

    let bd = b.length_squared();
    let cd = c.length_squared();

    let d = 2.0 * (b.x * c.y - b.y * c.x);

    if d.abs() < f32::EPSILON {
        // collinear; fall back to the centroid
        return a + (b + c) / 3.0;
    }

    let x = (c.y * bd - b.y * cd) / d;
    let y = (b.x * cd - c.x * bd) / d;

    a + Vec2::new(x, y)
}

/// Find the area-weighted centroid of a simple polygon, in either winding order. Degenerate
/// (zero area) polygons fall back to the mean of their points.
pub fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }

    // Shoelace sums, taken relative to the first point for precision.
    let origin = points[0];

    let mut area = 0.0;
    let mut sum = Vec2::ZERO;

    for (a, b) in points.iter().circular_tuple_windows() {
        let a = *a - origin;
        let b = *b - origin;
        let cross = a.x * b.y - b.x * a.y;

        area += cross;
        sum += (a + b) * cross;
    }

    if area.abs() < f32::EPSILON {
        let mean = points.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
        return mean / points.len() as f32;
    }

    origin + sum / (3.0 * area)
}

/// Build an index from point index to some incoming edge index for edge traversal.
fn build_incoming_edge_index(triangulation: &Triangulation, num_points: usize) -> Vec<usize> {
    let mut result = vec![delaunator::EMPTY; num_points];

    for e in 0..triangulation.triangles.len() {
        // Considering the half-edge A<-B, we can find the index of A by taking the next half-edge
        // in the loop (which is A->C) and looking at its point index in the triangles table. We
        // take the first incoming edge we find, but replace it if the incoming edge has no
        // corresponding outgoing edge; that means the the incoming edge is "leftmost" and our
        // edge traversal will visit all of the incoming edges for the point.

        let point_index = triangulation.triangles[next_halfedge(e)];
        let is_leftmost = triangulation.halfedges[e] == delaunator::EMPTY;

        if result[point_index] == delaunator::EMPTY || is_leftmost {
            result[point_index] = e;
        }
    }

    result
}

/// State struct for the edges_around_point iterator.
pub struct EdgesAroundPoint<'a> {
    triangulation: &'a Triangulation,
    curr: usize,
    last: usize,
}

impl Iterator for EdgesAroundPoint<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.curr == delaunator::EMPTY {
            return None;
        }

        let curr = self.curr;
        let next = self.triangulation.halfedges[next_halfedge(curr)];

        if next != self.last {
            self.curr = next;
        } else {
            self.curr = delaunator::EMPTY;
        }

        Some(curr)
    }
}
