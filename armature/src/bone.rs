use {
    crate::{
        error::ArmatureError,
        math::{self, Frame},
        representation::{Aabb, AxesVisibility, Representation},
    },
    bitflags::bitflags,
    nalgebra as na,
    std::convert::TryFrom,
};

/// Coordinate mode of a bone or whole armature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum WidgetState {
    /// Bind pose. Authoritative reference geometry.
    Rest,

    /// Current, possibly manipulated, geometry.
    Pose,
}

impl Default for WidgetState {
    fn default() -> Self {
        WidgetState::Rest
    }
}

impl TryFrom<i32> for WidgetState {
    type Error = ArmatureError;

    fn try_from(value: i32) -> Result<Self, ArmatureError> {
        match value {
            0 => Ok(WidgetState::Rest),
            1 => Ok(WidgetState::Pose),
            _ => {
                tracing::error!("Unknown state: {}", value);
                Err(ArmatureError::UnknownWidgetState {
                    value: value.to_string(),
                })
            }
        }
    }
}

bitflags! {
    pub(crate) struct Changes: u8 {
        const REST = 0b01;
        const POSE = 0b10;
    }
}

/// Single oriented segment going from head to tail.
///
/// Rest geometry is stored in world space together with the frame of the
/// parent's tail. Changing that frame keeps rest points in place, while pose
/// geometry is always derived through the pose frame of the parent, so posed
/// bones follow their parents.
///
/// Pose geometry is derived from rest geometry, so every rest edit is
/// reported as pose change as well.
///
/// Bone axis is +Y in bone space.
#[derive(Clone, Debug)]
pub struct Bone {
    name: String,
    debug_id: usize,

    world_head_rest: na::Point3<f64>,
    world_tail_rest: na::Point3<f64>,
    roll: f64,
    world_to_parent_rest: Frame,

    world_to_parent_pose: Frame,
    pose_rotation: na::UnitQuaternion<f64>,
    pose_translation: na::Vector3<f64>,

    state: WidgetState,
    enabled: bool,
    process_events: bool,
    visible: bool,
    axes_visibility: AxesVisibility,
    show_parenthood: bool,
    representation: Option<Representation>,

    observed: bool,
    changes: Changes,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Bone {
            name: name.into(),
            debug_id: 0,
            world_head_rest: na::Point3::origin(),
            world_tail_rest: na::Point3::origin(),
            roll: 0.0,
            world_to_parent_rest: Frame::identity(),
            world_to_parent_pose: Frame::identity(),
            pose_rotation: na::UnitQuaternion::identity(),
            pose_translation: na::Vector3::zeros(),
            state: WidgetState::Rest,
            enabled: false,
            process_events: true,
            visible: true,
            axes_visibility: AxesVisibility::Hidden,
            show_parenthood: true,
            representation: None,
            observed: false,
            changes: Changes::empty(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Numeric identifier assigned when bone is added to an armature.
    pub fn debug_id(&self) -> usize {
        self.debug_id
    }

    pub(crate) fn set_debug_id(&mut self, debug_id: usize) {
        self.debug_id = debug_id;
    }

    pub fn world_head_rest(&self) -> na::Point3<f64> {
        self.world_head_rest
    }

    pub fn world_tail_rest(&self) -> na::Point3<f64> {
        self.world_tail_rest
    }

    pub fn set_world_head_rest(&mut self, head: na::Point3<f64>) {
        if self.world_head_rest != head {
            self.world_head_rest = head;
            self.touch(Changes::REST | Changes::POSE);
        }
    }

    pub fn set_world_tail_rest(&mut self, tail: na::Point3<f64>) {
        if self.world_tail_rest != tail {
            self.world_tail_rest = tail;
            self.touch(Changes::REST | Changes::POSE);
        }
    }

    /// Rotation around bone axis in radians.
    pub fn roll(&self) -> f64 {
        self.roll
    }

    pub fn set_roll(&mut self, roll: f64) {
        if self.roll != roll {
            self.roll = roll;
            self.touch(Changes::REST | Changes::POSE);
        }
    }

    pub fn length(&self) -> f64 {
        (self.world_tail_rest - self.world_head_rest).norm()
    }

    pub fn world_to_parent_rest(&self) -> &Frame {
        &self.world_to_parent_rest
    }

    /// Sets frame of the parent in rest mode.
    /// World rest points are kept in place.
    pub fn set_world_to_parent_rest(&mut self, frame: Frame) {
        if self.world_to_parent_rest != frame {
            self.world_to_parent_rest = frame;
            self.touch(Changes::REST | Changes::POSE);
        }
    }

    pub fn local_head_rest(&self) -> na::Point3<f64> {
        self.world_to_parent_rest
            .inverse_transform_point(&self.world_head_rest)
    }

    pub fn local_tail_rest(&self) -> na::Point3<f64> {
        self.world_to_parent_rest
            .inverse_transform_point(&self.world_tail_rest)
    }

    /// Orientation of the bone relative to parent frame in rest mode.
    pub fn parent_to_bone_rest_rotation(&self) -> na::UnitQuaternion<f64> {
        let direction = self.local_tail_rest() - self.local_head_rest();
        let align = math::rotation_between(&na::Vector3::y(), &direction);
        align
            * na::UnitQuaternion::from_axis_angle(
                &na::Vector3::y_axis(),
                self.roll,
            )
    }

    pub fn world_to_bone_rest_rotation(&self) -> na::UnitQuaternion<f64> {
        self.world_to_parent_rest.rotation * self.parent_to_bone_rest_rotation()
    }

    pub fn world_to_parent_pose(&self) -> &Frame {
        &self.world_to_parent_pose
    }

    /// Sets frame of the parent in pose mode.
    /// Pose points move with the frame.
    pub fn set_world_to_parent_pose(&mut self, frame: Frame) {
        if self.world_to_parent_pose != frame {
            self.world_to_parent_pose = frame;
            self.touch(Changes::POSE);
        }
    }

    /// Rotation applied on top of rest orientation, around the head.
    pub fn pose_rotation(&self) -> na::UnitQuaternion<f64> {
        self.pose_rotation
    }

    pub fn set_pose_rotation(&mut self, rotation: na::UnitQuaternion<f64>) {
        if self.pose_rotation != rotation {
            self.pose_rotation = rotation;
            self.touch(Changes::POSE);
        }
    }

    /// Rotates bone in pose mode around `axis` given in bone space.
    pub fn rotate_pose(
        &mut self,
        axis: &na::Unit<na::Vector3<f64>>,
        angle: f64,
    ) {
        let rotation = self.pose_rotation
            * na::UnitQuaternion::from_axis_angle(axis, angle);
        self.set_pose_rotation(rotation);
    }

    /// Head offset in pose mode expressed in parent frame.
    pub fn pose_translation(&self) -> na::Vector3<f64> {
        self.pose_translation
    }

    pub fn set_pose_translation(&mut self, translation: na::Vector3<f64>) {
        if self.pose_translation != translation {
            self.pose_translation = translation;
            self.touch(Changes::POSE);
        }
    }

    /// Makes pose geometry match rest geometry again.
    pub fn reset_pose(&mut self) {
        self.set_pose_rotation(na::UnitQuaternion::identity());
        self.set_pose_translation(na::Vector3::zeros());
    }

    pub fn world_to_bone_pose_rotation(&self) -> na::UnitQuaternion<f64> {
        self.world_to_parent_pose.rotation
            * self.parent_to_bone_rest_rotation()
            * self.pose_rotation
    }

    pub fn world_head_pose(&self) -> na::Point3<f64> {
        self.world_to_parent_pose
            .transform_point(&(self.local_head_rest() + self.pose_translation))
    }

    pub fn world_tail_pose(&self) -> na::Point3<f64> {
        self.world_head_pose()
            + self.world_to_bone_pose_rotation()
                * na::Vector3::new(0.0, self.length(), 0.0)
    }

    pub fn world_head(&self, mode: WidgetState) -> na::Point3<f64> {
        match mode {
            WidgetState::Rest => self.world_head_rest(),
            WidgetState::Pose => self.world_head_pose(),
        }
    }

    pub fn world_tail(&self, mode: WidgetState) -> na::Point3<f64> {
        match mode {
            WidgetState::Rest => self.world_tail_rest(),
            WidgetState::Pose => self.world_tail_pose(),
        }
    }

    pub fn world_to_bone_rotation(
        &self,
        mode: WidgetState,
    ) -> na::UnitQuaternion<f64> {
        match mode {
            WidgetState::Rest => self.world_to_bone_rest_rotation(),
            WidgetState::Pose => self.world_to_bone_pose_rotation(),
        }
    }

    /// Translation from world origin to the tail.
    pub fn world_to_bone_tail_translation(
        &self,
        mode: WidgetState,
    ) -> na::Vector3<f64> {
        self.world_tail(mode).coords
    }

    pub fn current_world_head(&self) -> na::Point3<f64> {
        self.world_head(self.state)
    }

    pub fn current_world_tail(&self) -> na::Point3<f64> {
        self.world_tail(self.state)
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    /// Switches bone between rest and pose.
    /// Entering a state notifies observers so that descendants get
    /// up-to-date parent frames.
    pub fn set_state(&mut self, state: WidgetState) {
        if self.state != state {
            self.state = state;
            match state {
                WidgetState::Rest => self.touch(Changes::REST),
                WidgetState::Pose => self.touch(Changes::POSE),
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn process_events(&self) -> bool {
        self.process_events
    }

    pub fn set_process_events(&mut self, process_events: bool) {
        self.process_events = process_events;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn axes_visibility(&self) -> AxesVisibility {
        self.axes_visibility
    }

    pub fn set_axes_visibility(&mut self, axes_visibility: AxesVisibility) {
        self.axes_visibility = axes_visibility;
    }

    /// Whether line from parent's tail to this bone's head is shown.
    pub fn show_parenthood(&self) -> bool {
        self.show_parenthood
    }

    pub fn set_show_parenthood(&mut self, show_parenthood: bool) {
        self.show_parenthood = show_parenthood;
    }

    pub fn representation(&self) -> Option<&Representation> {
        self.representation.as_ref()
    }

    pub fn set_representation(
        &mut self,
        representation: Option<Representation>,
    ) {
        self.representation = representation;
    }

    /// Bounds of the representation in current state.
    pub fn bounds(&self) -> Option<Aabb> {
        let representation = self.representation.as_ref()?;
        Some(representation.bounds(
            &self.current_world_head(),
            &self.current_world_tail(),
        ))
    }

    pub(crate) fn set_observed(&mut self, observed: bool) {
        self.observed = observed;
        self.changes = Changes::empty();
    }

    pub(crate) fn take_changes(&mut self) -> Changes {
        std::mem::replace(&mut self.changes, Changes::empty())
    }

    fn touch(&mut self, changes: Changes) {
        if self.observed {
            self.changes |= changes;
        }
    }
}
