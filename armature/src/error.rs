use crate::armature::BoneId;

/// Rejected armature request.
///
/// Requests failing with one of these errors leave the armature unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ArmatureError {
    #[error("Bone {id:?} is not part of this armature")]
    UnknownBone { id: BoneId },

    #[error("Bone `{name}` must be created with a parent")]
    MissingParent { name: String },

    #[error("Armature has no root bone, cannot switch to {state:?} state")]
    NoRoots { state: crate::WidgetState },

    #[error("Unknown representation type `{value}`")]
    UnknownRepresentation { value: String },

    #[error("Unknown widget state `{value}`")]
    UnknownWidgetState { value: String },

    #[error("Unknown axes visibility `{value}`")]
    UnknownAxesVisibility { value: String },
}
