// Copyright @yucwang 2026

// Homogeneous helpers. The w component never takes part in length or cross
// product, it only rides along.

use super::constants::{ Float, Vector3f, Vector4f, EPSILON };

pub fn vec4(x: Float, y: Float, z: Float, w: Float) -> Vector4f {
    Vector4f::new(x, y, z, w)
}

pub fn direction(v: &Vector3f) -> Vector4f {
    Vector4f::new(v.x, v.y, v.z, 0.0)
}

pub fn length_xyz(v: &Vector4f) -> Float {
    v.xyz().norm()
}

// Zero-length vectors are returned unchanged.
pub fn normalize_xyz(v: &Vector4f) -> Vector4f {
    let len = length_xyz(v);
    if len <= EPSILON {
        return *v;
    }
    Vector4f::new(v.x / len, v.y / len, v.z / len, v.w)
}

pub fn cross_xyz(a: &Vector4f, b: &Vector4f) -> Vector4f {
    direction(&a.xyz().cross(&b.xyz()))
}

pub fn dot_xyz(a: &Vector4f, b: &Vector4f) -> Float {
    a.xyz().dot(&b.xyz())
}
