//! Hard-coded geometry of the demo scene
//!
//! The light cube, the vegetation quad and the parallax ground are built
//! here; the plant and table come from OBJ files (see [`super::object`]).

use std::cmp::Ordering;

use cgmath::{vec2, vec3, InnerSpace, MetricSpace, Vector2, Vector3};

use super::vertex::{BillboardVertex, PositionVertex, TangentVertex};

/// Where the grass quads stand. Each quad's left edge sits at its position.
pub const VEGETATION_POSITIONS: [[f32; 3]; 5] = [
    [-1.5, -1.6, -0.48],
    [1.5, -1.6, 0.51],
    [0.0, -1.6, 0.7],
    [-0.3, -1.6, -2.3],
    [0.5, -1.6, -0.6],
];

/// Scale of the light cube drawn at the point light.
pub const LIGHT_CUBE_SCALE: f32 = 0.3;

/// Height of the ground plane; the bottom edge of the grass quads.
pub const GROUND_HEIGHT: f32 = -2.1;
/// Half the side length of the ground plane.
pub const GROUND_HALF_EXTENT: f32 = 5.0;
/// How often the ground textures repeat across the plane.
pub const GROUND_UV_REPEAT: f32 = 5.0;

pub fn vegetation_positions() -> Vec<Vector3<f32>> {
    VEGETATION_POSITIONS.iter().map(|&p| p.into()).collect()
}

/// Unit cube centred on the origin as 36 vertices, counter-clockwise when
/// seen from outside.
pub fn cube_vertices() -> Vec<PositionVertex> {
    // (outward normal, u axis, v axis) with u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let (n, u, v) = (
            Vector3::from(normal) * 0.5,
            Vector3::from(u) * 0.5,
            Vector3::from(v) * 0.5,
        );
        let corner = |su: f32, sv: f32| PositionVertex {
            position: (n + u * su + v * sv).into(),
        };
        let (bl, br, tr, tl) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        vertices.extend_from_slice(&[bl, br, tr, bl, tr, tl]);
    }
    vertices
}

/// The vegetation quad: x in 0..1, y in -0.5..0.5, facing +Z.
pub fn transparent_quad() -> [BillboardVertex; 6] {
    let vertex = |x: f32, y: f32, u: f32, v: f32| BillboardVertex {
        position: [x, y, 0.0],
        tex_coords: [u, v],
    };
    [
        vertex(0.0, 0.5, 0.0, 0.0),
        vertex(0.0, -0.5, 0.0, 1.0),
        vertex(1.0, -0.5, 1.0, 1.0),
        vertex(0.0, 0.5, 0.0, 0.0),
        vertex(1.0, -0.5, 1.0, 1.0),
        vertex(1.0, 0.5, 1.0, 0.0),
    ]
}

/// Orders positions farthest-first from `eye`. Equal distances keep their
/// input order.
pub fn sort_back_to_front(positions: &[Vector3<f32>], eye: Vector3<f32>) -> Vec<Vector3<f32>> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| {
        let (da, db) = (a.distance2(eye), b.distance2(eye));
        db.partial_cmp(&da).unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Tangent and bitangent of a triangle from its positions and UVs.
///
/// Both vectors are normalized. A triangle whose UVs are degenerate gets an
/// arbitrary frame perpendicular to its face.
pub fn compute_tangent_frame(
    positions: [Vector3<f32>; 3],
    uvs: [Vector2<f32>; 3],
) -> (Vector3<f32>, Vector3<f32>) {
    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let delta_uv1 = uvs[1] - uvs[0];
    let delta_uv2 = uvs[2] - uvs[0];

    let determinant = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;
    if determinant.abs() <= f32::EPSILON {
        let normal = edge1.cross(edge2);
        let tangent = if edge1.magnitude2() > f32::EPSILON {
            edge1.normalize()
        } else {
            Vector3::unit_x()
        };
        let bitangent = if normal.magnitude2() > f32::EPSILON {
            normal.cross(tangent).normalize()
        } else {
            Vector3::unit_z()
        };
        return (tangent, bitangent);
    }

    let f = 1.0 / determinant;
    let tangent = (edge1 * delta_uv2.y - edge2 * delta_uv1.y) * f;
    let bitangent = (edge2 * delta_uv1.x - edge1 * delta_uv2.x) * f;
    (tangent.normalize(), bitangent.normalize())
}

/// Two triangles with a shared tangent frame per triangle.
fn tangent_quad(corners: [Vector3<f32>; 4], uvs: [Vector2<f32>; 4]) -> Vec<TangentVertex> {
    let mut vertices = Vec::with_capacity(6);
    for [a, b, c] in [[0usize, 1, 2], [0, 2, 3]] {
        let positions = [corners[a], corners[b], corners[c]];
        let tex = [uvs[a], uvs[b], uvs[c]];
        let normal = (positions[1] - positions[0])
            .cross(positions[2] - positions[0])
            .normalize();
        let (tangent, bitangent) = compute_tangent_frame(positions, tex);
        for (position, uv) in positions.iter().zip(tex.iter()) {
            vertices.push(TangentVertex {
                position: (*position).into(),
                normal: normal.into(),
                tex_coords: (*uv).into(),
                tangent: tangent.into(),
                bitangent: bitangent.into(),
            });
        }
    }
    vertices
}

/// The ground: a square at `height`, facing +Y, with repeating UVs.
pub fn ground_quad(half_extent: f32, height: f32, uv_repeat: f32) -> Vec<TangentVertex> {
    let s = half_extent;
    tangent_quad(
        [
            vec3(-s, height, -s),
            vec3(-s, height, s),
            vec3(s, height, s),
            vec3(s, height, -s),
        ],
        [
            vec2(0.0, 0.0),
            vec2(0.0, uv_repeat),
            vec2(uv_repeat, uv_repeat),
            vec2(uv_repeat, 0.0),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn test_cube_triangles_face_outward() {
        let vertices = cube_vertices();
        assert_eq!(vertices.len(), 36);
        for triangle in vertices.chunks(3) {
            let [a, b, c] = [
                Vector3::from(triangle[0].position),
                Vector3::from(triangle[1].position),
                Vector3::from(triangle[2].position),
            ];
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
        for vertex in &vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn test_transparent_quad_bounds() {
        let quad = transparent_quad();
        let xs: Vec<f32> = quad.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = quad.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 0.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -0.5);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 0.5);
        // Top of the image maps to the top of the quad
        for vertex in &quad {
            let expected_v = if vertex.position[1] > 0.0 { 0.0 } else { 1.0 };
            assert_eq!(vertex.tex_coords[1], expected_v);
        }
    }

    #[test]
    fn test_sort_back_to_front() {
        let eye = vec3(0.0, 0.0, 10.0);
        let sorted = sort_back_to_front(&vegetation_positions(), eye);
        assert_eq!(sorted.len(), VEGETATION_POSITIONS.len());
        for pair in sorted.windows(2) {
            assert!(pair[0].distance2(eye) >= pair[1].distance2(eye));
        }
        assert_eq!(sorted[0], vec3(-0.3, -1.6, -2.3));
    }

    #[test]
    fn test_sort_is_stable_for_equal_distances() {
        let eye = vec3(0.0, 0.0, 0.0);
        let positions = vec![
            vec3(1.0, 0.0, 0.0),
            vec3(0.0, 1.0, 0.0),
            vec3(0.0, 0.0, 3.0),
            vec3(-1.0, 0.0, 0.0),
        ];
        let sorted = sort_back_to_front(&positions, eye);
        assert_eq!(
            sorted,
            vec![
                vec3(0.0, 0.0, 3.0),
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
                vec3(-1.0, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_tangent_frame_follows_uv_axes() {
        let (tangent, bitangent) = compute_tangent_frame(
            [vec3(0.0, 0.0, 0.0), vec3(2.0, 0.0, 0.0), vec3(0.0, 3.0, 0.0)],
            [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)],
        );
        assert!(approx(tangent, vec3(1.0, 0.0, 0.0)));
        assert!(approx(bitangent, vec3(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_degenerate_uvs_still_give_unit_frame() {
        let (tangent, bitangent) = compute_tangent_frame(
            [vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0)],
            [vec2(0.5, 0.5); 3],
        );
        assert!((tangent.magnitude() - 1.0).abs() < 1e-5);
        assert!((bitangent.magnitude() - 1.0).abs() < 1e-5);
        assert!(tangent.dot(bitangent).abs() < 1e-5);
    }

    #[test]
    fn test_ground_is_flat_and_faces_up() {
        let ground = ground_quad(GROUND_HALF_EXTENT, GROUND_HEIGHT, GROUND_UV_REPEAT);
        assert_eq!(ground.len(), 6);
        for vertex in &ground {
            assert_eq!(vertex.position[1], GROUND_HEIGHT);
            assert!(approx(vertex.normal.into(), vec3(0.0, 1.0, 0.0)));
            assert!(approx(vertex.tangent.into(), vec3(1.0, 0.0, 0.0)));
            assert!(approx(vertex.bitangent.into(), vec3(0.0, 0.0, 1.0)));
        }
    }
}
