use serde::{Deserialize, Serialize};

use crate::{OsmBuildingsError, PlaneBounds, PlanePoint, Result};

/// Points closer than this are treated as duplicates when cleaning rings
const RING_EPSILON: f64 = 1e-9;

/// Azimuth subdivisions of a dome
const DOME_SEGMENTS: usize = 16;

/// Altitude subdivisions of a dome
const DOME_STACKS: usize = 8;

/// Render-ready triangle mesh
///
/// Positions are y-up: plane x maps to scene x, plane y (north) to
/// scene -z, and height to scene y. Indices wind counter-clockwise
/// seen from outside the solid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Vertex positions as [x, y, z]
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex unit normals
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices into the vertex arrays
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Number of vertices in the mesh
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no geometry
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Extrude a footprint into a capped solid between two heights
///
/// The outline and holes are cleaned and re-wound before triangulation,
/// so input ring orientation and closing duplicates don't matter. Caps
/// come from ear-clipping triangulation, walls from one quad per ring
/// edge. Fails with a geometry error when the footprint is degenerate.
pub fn extrude_solid(
    outline: &[PlanePoint],
    holes: &[Vec<PlanePoint>],
    base_m: f64,
    top_m: f64,
) -> Result<MeshBuffers> {
    let mut outer = clean_ring(outline);
    if outer.len() < 3 {
        return Err(OsmBuildingsError::Geometry(format!(
            "Footprint has only {} unique vertices",
            outer.len()
        )));
    }
    // Outer ring counter-clockwise, holes clockwise
    if ring_signed_area(&outer) < 0.0 {
        outer.reverse();
    }

    let mut rings = vec![outer];
    for hole in holes {
        let mut cleaned = clean_ring(hole);
        if cleaned.len() < 3 {
            tracing::debug!("Dropping degenerate hole with {} vertices", cleaned.len());
            continue;
        }
        if ring_signed_area(&cleaned) > 0.0 {
            cleaned.reverse();
        }
        rings.push(cleaned);
    }

    // Flatten all rings for ear clipping; holes are vertex start offsets
    let mut flat_coords = Vec::new();
    let mut hole_starts = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_starts.push(flat_coords.len() / 2);
        }
        for point in ring {
            flat_coords.push(point.x);
            flat_coords.push(point.y);
        }
    }

    let cap_indices = earcutr::earcut(&flat_coords, &hole_starts, 2)
        .map_err(|e| OsmBuildingsError::Geometry(format!("Triangulation failed: {:?}", e)))?;
    if cap_indices.is_empty() {
        return Err(OsmBuildingsError::Geometry(
            "Triangulation produced no triangles".to_string(),
        ));
    }

    let point_count = flat_coords.len() / 2;
    let mut mesh = MeshBuffers::default();

    // Bottom vertices first, then the top set at the same ring order
    for i in 0..point_count {
        let (x, y) = (flat_coords[2 * i] as f32, flat_coords[2 * i + 1] as f32);
        mesh.positions.push([x, base_m as f32, -y]);
    }
    for i in 0..point_count {
        let (x, y) = (flat_coords[2 * i] as f32, flat_coords[2 * i + 1] as f32);
        mesh.positions.push([x, top_m as f32, -y]);
    }

    let top_offset = point_count as u32;

    // Bottom cap faces down: flip the triangulation winding
    for tri in cap_indices.chunks_exact(3) {
        mesh.indices.push(tri[0] as u32);
        mesh.indices.push(tri[2] as u32);
        mesh.indices.push(tri[1] as u32);
    }
    // Top cap faces up: triangulation winding as-is
    for tri in cap_indices.chunks_exact(3) {
        mesh.indices.push(tri[0] as u32 + top_offset);
        mesh.indices.push(tri[1] as u32 + top_offset);
        mesh.indices.push(tri[2] as u32 + top_offset);
    }

    // Walls: two triangles per ring edge, wound outward
    let mut ring_start = 0u32;
    for ring in &rings {
        let len = ring.len() as u32;
        for i in 0..len {
            let bottom_current = ring_start + i;
            let bottom_next = ring_start + (i + 1) % len;
            let top_current = bottom_current + top_offset;
            let top_next = bottom_next + top_offset;

            mesh.indices
                .extend_from_slice(&[bottom_current, bottom_next, top_next]);
            mesh.indices
                .extend_from_slice(&[bottom_current, top_next, top_current]);
        }
        ring_start += len;
    }

    mesh.normals = compute_vertex_normals(&mesh.positions, &mesh.indices);
    Ok(mesh)
}

/// Build a hemispheric dome over a footprint's bounding box
///
/// The dome is a latitude/longitude grid: horizontal radius is half the
/// bounding-box width, vertical extent is `top_m - base_m`, and the rim
/// sits at `base_m` centered on the bounding box. The underside is open.
pub fn dome_solid(bounds: &PlaneBounds, base_m: f64, top_m: f64) -> Result<MeshBuffers> {
    let radius = bounds.width() / 2.0;
    let vertical = top_m - base_m;
    if radius <= 0.0 || vertical <= 0.0 {
        return Err(OsmBuildingsError::Geometry(format!(
            "Degenerate dome: radius {:.3} m, vertical extent {:.3} m",
            radius, vertical
        )));
    }

    let center = bounds.center();
    let mut mesh = MeshBuffers::default();

    // Stacks of vertices from the rim toward the apex
    for stack in 0..DOME_STACKS {
        let altitude = std::f64::consts::FRAC_PI_2 * stack as f64 / DOME_STACKS as f64;
        let (sin_alt, cos_alt) = altitude.sin_cos();

        for segment in 0..DOME_SEGMENTS {
            let azimuth = std::f64::consts::TAU * segment as f64 / DOME_SEGMENTS as f64;
            let (sin_az, cos_az) = azimuth.sin_cos();

            let x = center.x + radius * cos_alt * cos_az;
            let plane_y = center.y + radius * cos_alt * sin_az;
            let height = base_m + vertical * sin_alt;
            mesh.positions
                .push([x as f32, height as f32, -plane_y as f32]);

            // Scaled-sphere normal: gradient of the ellipsoid surface
            let normal = normalize([
                (cos_alt * cos_az / radius) as f32,
                (sin_alt / vertical) as f32,
                (-cos_alt * sin_az / radius) as f32,
            ]);
            mesh.normals.push(normal);
        }
    }

    let apex = mesh.positions.len() as u32;
    mesh.positions
        .push([center.x as f32, (base_m + vertical) as f32, -center.y as f32]);
    mesh.normals.push([0.0, 1.0, 0.0]);

    // Quads between consecutive stacks, fan against the apex
    for stack in 0..DOME_STACKS - 1 {
        let row = (stack * DOME_SEGMENTS) as u32;
        let next_row = row + DOME_SEGMENTS as u32;
        for segment in 0..DOME_SEGMENTS as u32 {
            let next_segment = (segment + 1) % DOME_SEGMENTS as u32;

            let a = row + segment;
            let b = row + next_segment;
            let c = next_row + next_segment;
            let d = next_row + segment;

            mesh.indices.extend_from_slice(&[a, b, c]);
            mesh.indices.extend_from_slice(&[a, c, d]);
        }
    }

    let last_row = ((DOME_STACKS - 1) * DOME_SEGMENTS) as u32;
    for segment in 0..DOME_SEGMENTS as u32 {
        let next_segment = (segment + 1) % DOME_SEGMENTS as u32;
        mesh.indices
            .extend_from_slice(&[last_row + segment, last_row + next_segment, apex]);
    }

    Ok(mesh)
}

/// Drop consecutive duplicates and the closing point of a ring
fn clean_ring(ring: &[PlanePoint]) -> Vec<PlanePoint> {
    let mut cleaned: Vec<PlanePoint> = Vec::with_capacity(ring.len());

    for point in ring {
        if let Some(last) = cleaned.last() {
            if (point.x - last.x).abs() < RING_EPSILON && (point.y - last.y).abs() < RING_EPSILON {
                continue;
            }
        }
        cleaned.push(*point);
    }

    // Drop the closing duplicate if the ring came in closed
    if cleaned.len() > 1 {
        let first = cleaned[0];
        let last = cleaned[cleaned.len() - 1];
        if (first.x - last.x).abs() < RING_EPSILON && (first.y - last.y).abs() < RING_EPSILON {
            cleaned.pop();
        }
    }

    cleaned
}

/// Twice the signed area of a ring; positive means counter-clockwise
fn ring_signed_area(ring: &[PlanePoint]) -> f64 {
    let mut doubled = 0.0;
    for i in 0..ring.len() {
        let a = &ring[i];
        let b = &ring[(i + 1) % ring.len()];
        doubled += a.x * b.y - b.x * a.y;
    }
    doubled
}

/// Area-weighted vertex normals accumulated from the triangle list
fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for tri in indices.chunks_exact(3) {
        let a = positions[tri[0] as usize];
        let b = positions[tri[1] as usize];
        let c = positions[tri[2] as usize];

        let edge1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let edge2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];

        // Cross product magnitude carries the triangle area weighting
        let face = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &index in tri {
            let n = &mut normals[index as usize];
            n[0] += face[0];
            n[1] += face[1];
            n[2] += face[2];
        }
    }

    for normal in &mut normals {
        *normal = normalize(*normal);
    }
    normals
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > 1e-10 {
        [v[0] / length, v[1] / length, v[2] / length]
    } else {
        [0.0, 1.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<PlanePoint> {
        vec![
            PlanePoint::new(0.0, 0.0),
            PlanePoint::new(size, 0.0),
            PlanePoint::new(size, size),
            PlanePoint::new(0.0, size),
        ]
    }

    /// Signed volume of a closed mesh; positive when faces wind outward
    fn signed_volume(mesh: &MeshBuffers) -> f64 {
        let mut volume = 0.0;
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.positions[tri[0] as usize].map(|v| v as f64);
            let b = mesh.positions[tri[1] as usize].map(|v| v as f64);
            let c = mesh.positions[tri[2] as usize].map(|v| v as f64);

            volume += a[0] * (b[1] * c[2] - b[2] * c[1])
                - a[1] * (b[0] * c[2] - b[2] * c[0])
                + a[2] * (b[0] * c[1] - b[1] * c[0]);
        }
        volume / 6.0
    }

    #[test]
    fn test_extrude_square() {
        let mesh = extrude_solid(&square(10.0), &[], 0.0, 10.0).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        // 2 cap triangles top and bottom, 2 wall triangles per edge
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.normals.len(), mesh.positions.len());

        for position in &mesh.positions {
            assert!(position[1] == 0.0 || position[1] == 10.0);
        }
    }

    #[test]
    fn test_extrude_winds_outward() {
        let mesh = extrude_solid(&square(10.0), &[], 0.0, 10.0).unwrap();
        let volume = signed_volume(&mesh);
        assert!((volume - 1000.0).abs() < 1e-3, "volume was {}", volume);
    }

    #[test]
    fn test_extrude_clockwise_input_normalized() {
        let mut reversed = square(10.0);
        reversed.reverse();

        let mesh = extrude_solid(&reversed, &[], 0.0, 10.0).unwrap();
        assert!((signed_volume(&mesh) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_extrude_closed_ring_input() {
        let mut closed = square(10.0);
        closed.push(closed[0]);

        let mesh = extrude_solid(&closed, &[], 0.0, 10.0).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_extrude_with_hole() {
        let hole = vec![
            PlanePoint::new(4.0, 4.0),
            PlanePoint::new(6.0, 4.0),
            PlanePoint::new(6.0, 6.0),
            PlanePoint::new(4.0, 6.0),
        ];

        let mesh = extrude_solid(&square(10.0), &[hole], 0.0, 10.0).unwrap();

        assert_eq!(mesh.vertex_count(), 16);
        // Solid volume minus the 2 m × 2 m courtyard
        assert!((signed_volume(&mesh) - 960.0).abs() < 1e-3);
    }

    #[test]
    fn test_extrude_above_ground() {
        let mesh = extrude_solid(&square(10.0), &[], 5.0, 12.0).unwrap();

        for position in &mesh.positions {
            assert!(position[1] == 5.0 || position[1] == 12.0);
        }
    }

    #[test]
    fn test_extrude_degenerate_footprints() {
        // Two unique vertices
        let sliver = vec![
            PlanePoint::new(0.0, 0.0),
            PlanePoint::new(1.0, 0.0),
            PlanePoint::new(0.0, 0.0),
        ];
        assert!(extrude_solid(&sliver, &[], 0.0, 10.0).is_err());

        // Collinear vertices triangulate to nothing
        let collinear = vec![
            PlanePoint::new(0.0, 0.0),
            PlanePoint::new(1.0, 0.0),
            PlanePoint::new(2.0, 0.0),
        ];
        assert!(extrude_solid(&collinear, &[], 0.0, 10.0).is_err());
    }

    #[test]
    fn test_degenerate_hole_dropped() {
        let bad_hole = vec![PlanePoint::new(5.0, 5.0), PlanePoint::new(5.0, 5.0)];

        let mesh = extrude_solid(&square(10.0), &[bad_hole], 0.0, 10.0).unwrap();
        assert!((signed_volume(&mesh) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_normals_unit_length() {
        let mesh = extrude_solid(&square(10.0), &[], 0.0, 10.0).unwrap();

        for normal in &mesh.normals {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_dome_shape() {
        let bounds = PlaneBounds::of_ring(&square(10.0)).unwrap();
        let mesh = dome_solid(&bounds, 0.0, 8.0).unwrap();

        assert_eq!(mesh.vertex_count(), DOME_STACKS * DOME_SEGMENTS + 1);

        // Apex on top, rim at the base
        let apex = mesh.positions.last().unwrap();
        assert!((apex[0] - 5.0).abs() < 1e-4);
        assert!((apex[1] - 8.0).abs() < 1e-4);
        assert!((apex[2] + 5.0).abs() < 1e-4);

        for rim in &mesh.positions[..DOME_SEGMENTS] {
            assert!(rim[1].abs() < 1e-4);
            let dx = rim[0] as f64 - 5.0;
            let dz = rim[2] as f64 + 5.0;
            assert!(((dx * dx + dz * dz).sqrt() - 5.0).abs() < 1e-4);
        }

        // All indices valid, all normals unit
        let max_index = *mesh.indices.iter().max().unwrap() as usize;
        assert!(max_index < mesh.vertex_count());
        for normal in &mesh.normals {
            let length =
                (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
        assert_eq!(*mesh.normals.last().unwrap(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_dome_rejects_degenerate_extent() {
        let bounds = PlaneBounds::of_ring(&square(10.0)).unwrap();
        assert!(dome_solid(&bounds, 5.0, 5.0).is_err());

        let flat = PlaneBounds::of_ring(&[PlanePoint::new(1.0, 0.0), PlanePoint::new(1.0, 9.0)])
            .unwrap();
        assert!(dome_solid(&flat, 0.0, 8.0).is_err());
    }
}
