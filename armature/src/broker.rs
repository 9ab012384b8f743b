use crate::armature::BoneId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoneEventKind {
    RestChanged,
    PoseChanged,
}

/// Notification raised by an observed bone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoneEvent {
    pub bone: BoneId,
    pub kind: BoneEventKind,
}

/// Holds events of type `T` until they are dispatched.
///
/// Events are handed out last-in first-out, so events raised while handling
/// an event are handled before its siblings.
#[derive(Debug)]
pub struct EventBroker<T> {
    pool: Vec<T>,
}

impl<T> EventBroker<T> {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        EventBroker {
            pool: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, event: T) {
        self.pool.push(event);
    }

    pub fn next(&mut self) -> Option<T> {
        self.pool.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

impl<T> Default for EventBroker<T> {
    fn default() -> Self {
        Self::new()
    }
}
