/* Copyright 2020 @Yuchen Wong */

pub type Float = f64;

pub type Vector3f = nalgebra::Vector3<Float>;
pub type Vector4f = nalgebra::Vector4<Float>;

pub const EPSILON: Float = 1e-9;
