//! # Component System
//!
//! Components are plain data records with no behavior of their own.
//!
//! A component value lives inside a [`ComponentHandle`]: a shared handle
//! carrying the value behind a read/write lock, a weak back-reference to the
//! owning entity and a soft-deleted flag. Cloning a handle never copies the
//! value, both clones refer to the same component instance.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entity::{Entity, EntityInner};
use crate::error::{EcsError, EcsResult};

/// Marker trait for ECS components.
///
/// Components must be `Send + Sync + 'static` so that systems running on
/// the worker pool can reach them.
///
/// # Example
///
/// ```rust
/// use epsilon_core::Component;
///
/// struct Position {
///     x: i64,
///     y: i64,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Send + Sync + 'static {}

/// Ownership bookkeeping shared by every component slot.
#[derive(Default)]
pub(crate) struct SlotState {
    /// Back-reference to the owner. `Some` from the first successful attach on,
    /// even after the owner itself is dropped.
    owner: Mutex<Option<Weak<EntityInner>>>,
    deleted: AtomicBool,
}

impl SlotState {
    #[inline]
    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }

    /// Claims the slot for `owner`. Fails without mutation when the slot is
    /// deleted or already claimed.
    pub(crate) fn claim(&self, owner: &Arc<EntityInner>, component: &'static str) -> EcsResult<()> {
        let mut slot_owner = self.owner.lock();
        if self.is_deleted() {
            return Err(EcsError::ComponentDeleted { component });
        }
        if slot_owner.is_some() {
            return Err(EcsError::ComponentOwned { component });
        }
        *slot_owner = Some(Arc::downgrade(owner));
        Ok(())
    }

    fn owner(&self) -> Option<Entity> {
        self.owner
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Entity::from_inner)
    }

    fn is_owned(&self) -> bool {
        self.owner.lock().is_some()
    }
}

/// The heap cell behind a [`ComponentHandle`].
struct Slot<C> {
    state: SlotState,
    value: RwLock<C>,
}

/// Type-erased view of a slot, as stored inside an entity.
pub(crate) trait ErasedSlot: Send + Sync {
    fn state(&self) -> &SlotState;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<C: Component> ErasedSlot for Slot<C> {
    fn state(&self) -> &SlotState {
        &self.state
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared handle to one component instance.
///
/// # Example
///
/// ```rust
/// use epsilon_core::{Component, ComponentHandle, Entity};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// let health = ComponentHandle::new(Health(100));
/// let entity = Entity::new();
/// entity.add_component(&health).unwrap();
///
/// health.write().0 -= 10;
/// assert_eq!(entity.get_component::<Health>().unwrap().read().0, 90);
/// assert!(health.owner().unwrap().ptr_eq(&entity));
/// ```
pub struct ComponentHandle<C: Component> {
    slot: Arc<Slot<C>>,
}

impl<C: Component> ComponentHandle<C> {
    /// Wraps a value in a new, detached component.
    #[must_use]
    pub fn new(value: C) -> Self {
        Self {
            slot: Arc::new(Slot {
                state: SlotState::default(),
                value: RwLock::new(value),
            }),
        }
    }

    /// Locks the value for reading.
    ///
    /// The lock is taken recursively, so a system may read the same
    /// component again while it still holds a guard, even if another system
    /// is waiting to write it.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.slot.value.read_recursive()
    }

    /// Locks the value for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.slot.value.write()
    }

    /// Whether the component was removed from its entity (or the entity was
    /// deleted).
    #[inline]
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.slot.state.is_deleted()
    }

    /// Whether the component was ever attached to an entity.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.slot.state.is_owned()
    }

    /// The entity this component was attached to, if it is still alive.
    ///
    /// Removal does not clear the owner.
    #[must_use]
    pub fn owner(&self) -> Option<Entity> {
        self.slot.state.owner()
    }

    /// Whether both handles refer to the same component instance.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub(crate) fn erased(&self) -> Arc<dyn ErasedSlot> {
        Arc::clone(&self.slot) as Arc<dyn ErasedSlot>
    }

    /// Recovers a typed handle from an entity slot.
    pub(crate) fn from_erased(slot: &Arc<dyn ErasedSlot>) -> Option<Self> {
        Arc::clone(slot)
            .into_any()
            .downcast::<Slot<C>>()
            .ok()
            .map(|slot| Self { slot })
    }

    /// Whether an entity slot holds a `C`.
    #[inline]
    pub(crate) fn matches(slot: &Arc<dyn ErasedSlot>) -> bool {
        slot.as_any().is::<Slot<C>>()
    }
}

impl<C: Component> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C: Component> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("type", &type_name::<C>())
            .field("owned", &self.is_owned())
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u8);
    impl Component for Marker {}

    struct Other;
    impl Component for Other {}

    #[test]
    fn test_new_handle_is_detached() {
        let handle = ComponentHandle::new(Marker(1));
        assert!(!handle.is_owned());
        assert!(!handle.is_deleted());
        assert!(handle.owner().is_none());
    }

    #[test]
    fn test_clones_share_the_value() {
        let a = ComponentHandle::new(Marker(1));
        let b = a.clone();
        b.write().0 = 7;
        assert_eq!(a.read().0, 7);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&ComponentHandle::new(Marker(7))));
    }

    #[test]
    fn test_erased_roundtrip_checks_type() {
        let handle = ComponentHandle::new(Marker(3));
        let erased = handle.erased();

        assert!(ComponentHandle::<Marker>::matches(&erased));
        assert!(!ComponentHandle::<Other>::matches(&erased));
        assert!(ComponentHandle::<Other>::from_erased(&erased).is_none());

        let back = ComponentHandle::<Marker>::from_erased(&erased).unwrap();
        assert!(back.ptr_eq(&handle));
        assert_eq!(erased.component_name(), type_name::<Marker>());
    }

    #[test]
    fn test_debug_output_names_the_type() {
        let handle = ComponentHandle::new(Other);
        let text = format!("{handle:?}");
        assert!(text.contains("Other"));
        assert!(text.contains("deleted: false"));
    }
}
