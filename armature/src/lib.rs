//! Armature of bones arranged in a forest.
//!
//! [`Armature`] owns every [`Bone`] it manages, keeps parent/children links
//! consistent under structural edits and propagates rest and pose frames
//! from parents to their children whenever an observed bone changes.

pub mod armature;
pub mod bone;
pub mod broker;
pub mod error;
pub mod math;
pub mod representation;

pub use self::{
    armature::{Armature, ArmatureProperties, BoneId, BoneMut},
    bone::{Bone, WidgetState},
    broker::{BoneEvent, BoneEventKind},
    error::ArmatureError,
    math::Frame,
    representation::{
        Aabb, AxesVisibility, CylinderRepresentation,
        DoubleConeRepresentation, Representation, RepresentationStyle,
    },
};
