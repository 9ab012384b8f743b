use {
    crate::{
        bone::{Bone, Changes, WidgetState},
        broker::{BoneEvent, BoneEventKind, EventBroker},
        error::ArmatureError,
        math::Frame,
        representation::{
            Aabb, AxesVisibility, Representation, RepresentationStyle,
        },
    },
    nalgebra as na,
    slab::Slab,
    smallvec::SmallVec,
    std::{
        fmt::{self, Display},
        ops::{Deref, DerefMut},
    },
};

/// Handle of a bone registered in an [`Armature`].
///
/// Consists of slot index and generation.
/// Removed bone's handle never refers to a bone added later into the same
/// slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoneId {
    key: usize,
    generation: u64,
}

struct TreeNode {
    bone: Bone,
    generation: u64,
    parent: Option<BoneId>,
    children: SmallVec<[BoneId; 4]>,
    head_linked_to_parent: bool,
}

/// Policy applied uniformly to every bone of an armature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(default))]
pub struct ArmatureProperties {
    pub representation: RepresentationStyle,
    pub state: WidgetState,
    pub axes_visibility: AxesVisibility,
    pub show_parenthood: bool,
    pub visible: bool,
}

impl Default for ArmatureProperties {
    fn default() -> Self {
        ArmatureProperties {
            representation: RepresentationStyle::None,
            state: WidgetState::Rest,
            axes_visibility: AxesVisibility::Hidden,
            show_parenthood: true,
            visible: true,
        }
    }
}

/// Forest of bones.
///
/// Owns every registered bone, keeps parent/children links consistent and
/// propagates rest and pose frames from parents to children whenever an
/// observed bone changes.
pub struct Armature {
    nodes: Slab<TreeNode>,
    order: Vec<BoneId>,
    roots: Vec<BoneId>,
    next_generation: u64,
    events: EventBroker<BoneEvent>,

    representation: RepresentationStyle,
    state: WidgetState,
    axes_visibility: AxesVisibility,
    show_parenthood: bool,
    enabled: bool,
    process_events: bool,
    visible: bool,
}

impl Default for Armature {
    fn default() -> Self {
        Self::new()
    }
}

impl Armature {
    pub fn new() -> Self {
        let properties = ArmatureProperties::default();
        Armature {
            nodes: Slab::new(),
            order: Vec::new(),
            roots: Vec::new(),
            next_generation: 1,
            events: EventBroker::new(),
            representation: properties.representation,
            state: properties.state,
            axes_visibility: properties.axes_visibility,
            show_parenthood: properties.show_parenthood,
            enabled: false,
            process_events: true,
            visible: properties.visible,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has_bone(&self, id: BoneId) -> bool {
        self.node(id).is_some()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.node(id).map(|node| &node.bone)
    }

    /// Returns guard for editing the bone.
    /// Changes made through the guard are propagated to descendants when it
    /// is dropped.
    pub fn bone_mut(&mut self, id: BoneId) -> Option<BoneMut<'_>> {
        if self.has_bone(id) {
            Some(BoneMut { armature: self, id })
        } else {
            None
        }
    }

    /// Top-level bones in insertion order.
    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    /// All bones in registration order.
    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &Bone)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.bone(id).map(|bone| (id, bone)))
    }

    /// Creates bone configured with armature options.
    ///
    /// Bone's rest head is placed on parent's rest tail.
    /// Returned bone must be added with [`Armature::add_bone`].
    pub fn create_bone(
        &self,
        parent: Option<BoneId>,
        name: impl Into<String>,
    ) -> Result<Bone, ArmatureError> {
        self.check_parent(parent)?;

        let mut bone = Bone::new(name);
        if let Some(parent) = parent.and_then(|p| self.bone(p)) {
            bone.set_world_head_rest(parent.world_tail_rest());
        }
        self.apply_armature_options(&mut bone, parent);
        Ok(bone)
    }

    /// Creates bone going from parent's rest tail to `tail`.
    pub fn create_bone_with_tail(
        &self,
        parent: Option<BoneId>,
        tail: na::Point3<f64>,
        name: impl Into<String>,
    ) -> Result<Bone, ArmatureError> {
        let name = name.into();
        let parent = match parent {
            Some(parent) => parent,
            None => {
                tracing::error!(
                    "The bone `{}` inserted with this method \
                     must have a parent",
                    name
                );
                return Err(ArmatureError::MissingParent { name });
            }
        };

        let mut bone = self.create_bone(Some(parent), name)?;
        bone.set_world_tail_rest(tail);
        Ok(bone)
    }

    /// Registers bone under `parent` or as new root.
    ///
    /// With `linked` and a parent the bone's rest head is snapped to the
    /// parent's rest tail and kept there.
    pub fn add_bone(
        &mut self,
        mut bone: Bone,
        parent: Option<BoneId>,
        linked: bool,
    ) -> Result<BoneId, ArmatureError> {
        self.check_parent(parent)?;

        let linked = linked && parent.is_some();
        if linked {
            if let Some(parent) = parent.and_then(|p| self.bone(p)) {
                bone.set_world_head_rest(parent.world_tail_rest());
            }
        }

        bone.set_enabled(self.enabled);
        bone.set_process_events(self.process_events);
        bone.set_visible(self.visible);
        bone.set_axes_visibility(self.axes_visibility);
        bone.set_show_parenthood(self.show_parenthood);

        let generation = self.next_generation;
        self.next_generation += 1;

        let entry = self.nodes.vacant_entry();
        let id = BoneId {
            key: entry.key(),
            generation,
        };

        tracing::debug!(
            "Add bone `{}` {:?} under {:?}",
            bone.name(),
            id,
            parent
        );

        entry.insert(TreeNode {
            bone,
            generation,
            parent,
            children: SmallVec::new(),
            head_linked_to_parent: linked,
        });

        match parent.and_then(|p| self.node_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }

        self.order.push(id);
        let debug_id = self.order.len();
        if let Some(node) = self.node_mut(id) {
            node.bone.set_debug_id(debug_id);
        }

        self.flush(id);
        self.dispatch();
        Ok(id)
    }

    /// Removes bone from the armature and releases it.
    ///
    /// Children of the removed bone are appended to its parent's children.
    /// When a root is removed its first child becomes new root and adopts
    /// the remaining children.
    ///
    /// Returns `false` if bone is not part of the armature.
    pub fn remove_bone(&mut self, id: BoneId) -> bool {
        let (parent, children) = match self.node(id) {
            Some(node) => (node.parent, node.children.clone()),
            None => return false,
        };

        match parent {
            Some(parent) => {
                for &child in &children {
                    if let Some(node) = self.node_mut(child) {
                        node.parent = Some(parent);
                    }
                }
                if let Some(node) = self.node_mut(parent) {
                    node.children.retain(|c| *c != id);
                    node.children.extend(children);
                }
                self.update_children(parent);
            }
            None => {
                let mut children = children.into_iter();
                if let Some(new_root) = children.next() {
                    for child in children {
                        if let Some(node) = self.node_mut(child) {
                            node.parent = Some(new_root);
                        }
                        if let Some(node) = self.node_mut(new_root) {
                            node.children.push(child);
                        }
                    }

                    if let Some(node) = self.node_mut(new_root) {
                        node.parent = None;
                        node.head_linked_to_parent = false;
                    }
                    self.set_parent_frame(WidgetState::Rest, new_root, None);
                    self.set_parent_frame(WidgetState::Pose, new_root, None);

                    self.roots.push(new_root);
                    self.update_children(new_root);
                }
                self.roots.retain(|r| *r != id);
            }
        }

        let mut node = self.nodes.remove(id.key);
        node.bone.set_observed(false);
        self.order.retain(|b| *b != id);

        tracing::debug!("Removed bone `{}` {:?}", node.bone.name(), id);

        self.dispatch();
        true
    }

    pub fn set_bone_name(
        &mut self,
        id: BoneId,
        name: impl Into<String>,
    ) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.bone.set_name(name);
                true
            }
            None => false,
        }
    }

    pub fn bone_name(&self, id: BoneId) -> Option<&str> {
        self.bone(id).map(Bone::name)
    }

    /// Finds first bone with given name in registration order.
    pub fn bone_by_name(&self, name: &str) -> Option<BoneId> {
        self.bones()
            .find(|(_, bone)| bone.name() == name)
            .map(|(id, _)| id)
    }

    pub fn bone_parent(&self, id: BoneId) -> Option<BoneId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Direct children of the bone.
    /// Empty for unknown bones.
    pub fn bone_children(&self, id: BoneId) -> &[BoneId] {
        match self.node(id) {
            Some(node) => &node.children[..],
            None => &[],
        }
    }

    pub fn bone_linked_with_parent(&self, id: BoneId) -> bool {
        self.node(id).map_or(false, |node| node.head_linked_to_parent)
    }

    /// Links or unlinks bone's head to parent's tail.
    ///
    /// Linking snaps rest head onto parent's rest tail.
    /// Unlinking leaves bone where it is.
    ///
    /// Returns `false` if bone is not part of the armature.
    pub fn set_bone_linked_with_parent(
        &mut self,
        id: BoneId,
        linked: bool,
    ) -> bool {
        let node = match self.node_mut(id) {
            Some(node) => node,
            None => return false,
        };

        if node.head_linked_to_parent == linked {
            return true;
        }
        node.head_linked_to_parent = linked;

        if linked {
            self.snap_head_to_parent(id);
            self.dispatch();
        }
        true
    }

    /// Frame of `parent` in given mode that children are expressed in.
    /// Identity for root bones.
    pub fn parent_frame(
        &self,
        mode: WidgetState,
        parent: Option<BoneId>,
    ) -> Frame {
        match parent.and_then(|p| self.bone(p)) {
            Some(parent) => crate::math::frame(
                parent.world_to_bone_rotation(mode),
                parent.world_to_bone_tail_translation(mode),
            ),
            None => Frame::identity(),
        }
    }

    pub fn widget_state(&self) -> WidgetState {
        self.state
    }

    /// Switches every bone between rest and pose.
    ///
    /// Fails if armature has no bones.
    pub fn set_widget_state(
        &mut self,
        state: WidgetState,
    ) -> Result<(), ArmatureError> {
        if state == self.state {
            return Ok(());
        }

        if self.roots.is_empty() {
            tracing::error!(
                "Could not find any root element! Cannot set armature state"
            );
            return Err(ArmatureError::NoRoots { state });
        }

        tracing::debug!("Switch armature to {:?}", state);
        self.state = state;

        match state {
            WidgetState::Rest => {
                for id in self.order.clone() {
                    self.edit_bone(id, |bone| {
                        bone.set_state(WidgetState::Rest)
                    });
                }
            }
            WidgetState::Pose => {
                for root in self.roots.clone() {
                    self.set_parent_frame(WidgetState::Pose, root, None);
                }
                for id in self.order.clone() {
                    self.edit_bone(id, |bone| {
                        bone.set_state(WidgetState::Pose)
                    });
                }
            }
        }

        self.dispatch();
        Ok(())
    }

    pub fn bones_representation(&self) -> RepresentationStyle {
        self.representation
    }

    /// Replaces representation of every bone.
    pub fn set_bones_representation(&mut self, style: RepresentationStyle) {
        if style == self.representation {
            return;
        }

        self.representation = style;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            node.bone.set_representation(Representation::for_style(style));
        }
    }

    /// Overrides representation of a single bone until next armature-wide
    /// change.
    pub fn set_bone_representation(
        &mut self,
        id: BoneId,
        style: RepresentationStyle,
    ) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.bone.set_representation(Representation::for_style(style));
                true
            }
            None => false,
        }
    }

    pub fn axes_visibility(&self) -> AxesVisibility {
        self.axes_visibility
    }

    pub fn set_axes_visibility(&mut self, axes_visibility: AxesVisibility) {
        if axes_visibility == self.axes_visibility {
            return;
        }

        self.axes_visibility = axes_visibility;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            node.bone.set_axes_visibility(axes_visibility);
        }
    }

    pub fn show_parenthood(&self) -> bool {
        self.show_parenthood
    }

    pub fn set_show_parenthood(&mut self, show_parenthood: bool) {
        if show_parenthood == self.show_parenthood {
            return;
        }

        self.show_parenthood = show_parenthood;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            node.bone.set_show_parenthood(show_parenthood);
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables interaction with every bone.
    /// Bones without representation get armature's one.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        let style = self.representation;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            if node.bone.representation().is_none() {
                node.bone.set_representation(Representation::for_style(style));
            }
            node.bone.set_enabled(enabled);
        }
    }

    pub fn process_events(&self) -> bool {
        self.process_events
    }

    pub fn set_process_events(&mut self, process_events: bool) {
        self.process_events = process_events;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            node.bone.set_process_events(process_events);
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }

        self.visible = visible;
        for node in self.nodes.iter_mut().map(|(_, node)| node) {
            node.bone.set_visible(visible);
        }
    }

    pub fn properties(&self) -> ArmatureProperties {
        ArmatureProperties {
            representation: self.representation,
            state: self.state,
            axes_visibility: self.axes_visibility,
            show_parenthood: self.show_parenthood,
            visible: self.visible,
        }
    }

    /// Applies all properties at once.
    ///
    /// State switch is checked first, nothing is applied if it would fail.
    pub fn apply_properties(
        &mut self,
        properties: &ArmatureProperties,
    ) -> Result<(), ArmatureError> {
        if properties.state != self.state && self.roots.is_empty() {
            tracing::error!(
                "Could not find any root element! \
                 Cannot apply armature properties"
            );
            return Err(ArmatureError::NoRoots {
                state: properties.state,
            });
        }

        self.set_bones_representation(properties.representation);
        self.set_axes_visibility(properties.axes_visibility);
        self.set_show_parenthood(properties.show_parenthood);
        self.set_visible(properties.visible);
        self.set_widget_state(properties.state)
    }

    /// Union of all represented bones' bounds in current state.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bones()
            .filter_map(|(_, bone)| bone.bounds())
            .fold(None, |acc: Option<Aabb>, b| match acc {
                Some(acc) => Some(acc.union(&b)),
                None => Some(b),
            })
    }

    fn node(&self, id: BoneId) -> Option<&TreeNode> {
        self.nodes
            .get(id.key)
            .filter(|node| node.generation == id.generation)
    }

    fn node_mut(&mut self, id: BoneId) -> Option<&mut TreeNode> {
        self.nodes
            .get_mut(id.key)
            .filter(|node| node.generation == id.generation)
    }

    fn check_parent(
        &self,
        parent: Option<BoneId>,
    ) -> Result<(), ArmatureError> {
        match parent {
            Some(id) if !self.has_bone(id) => {
                tracing::error!(
                    "Parent bone {:?} is not in the armature",
                    id
                );
                Err(ArmatureError::UnknownBone { id })
            }
            _ => Ok(()),
        }
    }

    fn apply_armature_options(
        &self,
        bone: &mut Bone,
        parent: Option<BoneId>,
    ) {
        let style = self.representation;
        bone.set_representation(Representation::for_style(style));

        let rest = self.parent_frame(WidgetState::Rest, parent);
        bone.set_world_to_parent_rest(rest);
        if self.state == WidgetState::Pose {
            let pose = self.parent_frame(WidgetState::Pose, parent);
            bone.set_world_to_parent_pose(pose);
        }
        bone.set_state(self.state);

        // Subscribe to notifications. Setup above is not reported.
        bone.set_observed(true);
    }

    /// Runs `f` on the bone and queues notifications it raised.
    fn edit_bone(&mut self, id: BoneId, f: impl FnOnce(&mut Bone)) {
        if let Some(node) = self.node_mut(id) {
            f(&mut node.bone);
            self.flush(id);
        }
    }

    fn set_parent_frame(
        &mut self,
        mode: WidgetState,
        id: BoneId,
        parent: Option<BoneId>,
    ) {
        let frame = self.parent_frame(mode, parent);
        self.edit_bone(id, |bone| match mode {
            WidgetState::Rest => bone.set_world_to_parent_rest(frame),
            WidgetState::Pose => bone.set_world_to_parent_pose(frame),
        });
    }

    fn snap_head_to_parent(&mut self, id: BoneId) {
        let tail = match self
            .bone_parent(id)
            .and_then(|p| self.bone(p))
            .map(Bone::world_tail_rest)
        {
            Some(tail) => tail,
            None => return,
        };

        self.edit_bone(id, |bone| bone.set_world_head_rest(tail));
    }

    fn update_children(&mut self, parent: BoneId) {
        match self.bone(parent).map(Bone::state) {
            Some(WidgetState::Rest) => self.update_children_rest(parent),
            Some(WidgetState::Pose) => self.update_children_pose(parent),
            None => {}
        }
    }

    fn update_children_rest(&mut self, parent: BoneId) {
        for child in self.bone_children(parent).to_vec() {
            self.set_parent_frame(WidgetState::Rest, child, Some(parent));
            if self.bone_linked_with_parent(child) {
                self.snap_head_to_parent(child);
            }
        }
    }

    fn update_children_pose(&mut self, parent: BoneId) {
        for child in self.bone_children(parent).to_vec() {
            self.set_parent_frame(WidgetState::Pose, child, Some(parent));
        }
    }

    /// Moves bone's pending changes into event broker.
    fn flush(&mut self, id: BoneId) {
        let changes = match self.node_mut(id) {
            Some(node) => node.bone.take_changes(),
            None => return,
        };

        if changes.contains(Changes::REST) {
            self.events.add(BoneEvent {
                bone: id,
                kind: BoneEventKind::RestChanged,
            });
        }
        if changes.contains(Changes::POSE) {
            self.events.add(BoneEvent {
                bone: id,
                kind: BoneEventKind::PoseChanged,
            });
        }
    }

    /// Handles queued notifications until none is left.
    fn dispatch(&mut self) {
        while let Some(event) = self.events.next() {
            if !self.has_bone(event.bone) {
                continue;
            }

            tracing::trace!("Dispatch {:?}", event);

            match event.kind {
                BoneEventKind::RestChanged => {
                    if self.bone_linked_with_parent(event.bone) {
                        self.snap_head_to_parent(event.bone);
                    }
                    self.update_children_rest(event.bone);
                }
                BoneEventKind::PoseChanged => {
                    self.update_children_pose(event.bone);
                }
            }
        }
    }

    fn fmt_subtree(
        &self,
        fmt: &mut fmt::Formatter<'_>,
        id: BoneId,
        depth: usize,
    ) -> fmt::Result {
        let node = match self.node(id) {
            Some(node) => node,
            None => return Ok(()),
        };

        write!(
            fmt,
            "{:indent$}- {} [#{}]",
            "",
            node.bone.name(),
            node.bone.debug_id(),
            indent = depth * 2
        )?;
        if node.head_linked_to_parent {
            write!(fmt, " linked")?;
        }
        writeln!(fmt)?;

        for &child in &node.children {
            self.fmt_subtree(fmt, child, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for Armature {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            fmt,
            "Armature ({:?}, {} bones, {} roots)",
            self.state,
            self.len(),
            self.roots.len()
        )?;
        for &root in &self.roots {
            self.fmt_subtree(fmt, root, 0)?;
        }
        Ok(())
    }
}

/// Mutable access to a bone of an [`Armature`].
///
/// Dropping the guard notifies the armature about changes made to the bone.
pub struct BoneMut<'a> {
    armature: &'a mut Armature,
    id: BoneId,
}

impl BoneMut<'_> {
    pub fn id(&self) -> BoneId {
        self.id
    }
}

impl Deref for BoneMut<'_> {
    type Target = Bone;

    fn deref(&self) -> &Bone {
        &self.armature.nodes[self.id.key].bone
    }
}

impl DerefMut for BoneMut<'_> {
    fn deref_mut(&mut self) -> &mut Bone {
        &mut self.armature.nodes[self.id.key].bone
    }
}

impl Drop for BoneMut<'_> {
    fn drop(&mut self) {
        self.armature.flush(self.id);
        self.armature.dispatch();
    }
}
