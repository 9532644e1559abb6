pub(crate) const SHADER: &str = r#"
struct FrameUniform {
    mvp: mat4x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniform;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return frame.mvp * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return frame.color;
}
"#;

// Unit cube centered on the origin; the material is unlit, so corner
// positions are shared between faces and no normals are carried.
pub(crate) const CUBE_VERTICES: &[f32] = &[
    -0.5, -0.5, -0.5, // 0
    0.5, -0.5, -0.5, // 1
    0.5, 0.5, -0.5, // 2
    -0.5, 0.5, -0.5, // 3
    -0.5, -0.5, 0.5, // 4
    0.5, -0.5, 0.5, // 5
    0.5, 0.5, 0.5, // 6
    -0.5, 0.5, 0.5, // 7
];

pub(crate) const CUBE_INDICES: &[u16] = &[
    4, 5, 6, 4, 6, 7, // front
    1, 0, 3, 1, 3, 2, // back
    0, 4, 7, 0, 7, 3, // left
    5, 1, 2, 5, 2, 6, // right
    0, 1, 5, 0, 5, 4, // bottom
    7, 6, 2, 7, 2, 3, // top
];
