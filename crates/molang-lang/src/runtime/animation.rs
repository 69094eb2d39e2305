//! Per-evaluation animation state read by the animation-related queries.

use std::fmt;
use std::sync::Arc;

use crate::runtime::value::Value;

/// Bone translation (`t`), rotation (`r`) and scale (`s`), each as x/y/z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self { translation: [0.0; 3], rotation: [0.0; 3], scale: [1.0; 3] }
    }
}

impl BoneTransform {
    /// `{t: {x, y, z}, r: {x, y, z}, s: {x, y, z}}`
    pub fn to_value(&self) -> Value {
        Value::object([
            ("t", xyz(self.translation)),
            ("r", xyz(self.rotation)),
            ("s", xyz(self.scale)),
        ])
    }
}

pub fn xyz([x, y, z]: [f32; 3]) -> Value {
    Value::object([("x", Value::Number(x)), ("y", Value::Number(y)), ("z", Value::Number(z))])
}

/// Bone data a host animation system exposes to scripts. Unknown bones answer `None`.
pub trait Skeleton: Send + Sync {
    /// Animated bone transform at `time` seconds.
    fn bone_trs(&self, bone: &str, time: f32) -> Option<BoneTransform>;
    /// Bind-pose pivot.
    fn bone_origin(&self, bone: &str) -> Option<[f32; 3]>;
    /// Bind-pose rotation.
    fn bone_rotation(&self, bone: &str) -> Option<[f32; 3]>;
}

#[derive(Clone, Default)]
pub struct AnimationInfo {
    /// Seconds since the current animation started.
    pub anim_time: f32,
    pub global_time: f32,
    pub delta_time: f32,
    /// Ratio between the previous and next key frame.
    pub keyframe_lerp_time: f32,
    pub all_animations_finished: bool,
    pub any_animation_finished: bool,
    pub skeleton: Option<Arc<dyn Skeleton>>,
}

impl AnimationInfo {
    pub fn bone_trs(&self, bone: &str) -> BoneTransform {
        self.skeleton
            .as_ref()
            .and_then(|s| s.bone_trs(bone, self.global_time))
            .unwrap_or_default()
    }

    pub fn bone_origin(&self, bone: &str) -> [f32; 3] {
        self.skeleton.as_ref().and_then(|s| s.bone_origin(bone)).unwrap_or([0.0; 3])
    }

    pub fn bone_rotation(&self, bone: &str) -> [f32; 3] {
        self.skeleton.as_ref().and_then(|s| s.bone_rotation(bone)).unwrap_or([0.0; 3])
    }
}

impl fmt::Debug for AnimationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationInfo")
            .field("anim_time", &self.anim_time)
            .field("global_time", &self.global_time)
            .field("delta_time", &self.delta_time)
            .field("keyframe_lerp_time", &self.keyframe_lerp_time)
            .field("all_animations_finished", &self.all_animations_finished)
            .field("any_animation_finished", &self.any_animation_finished)
            .field("skeleton", &self.skeleton.is_some())
            .finish()
    }
}
