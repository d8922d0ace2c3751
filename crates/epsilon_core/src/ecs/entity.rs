//! # Entity Management
//!
//! An entity is an ordered collection of components it owns exclusively.
//! Entities are created detached and receive an [`EntityId`] when they are
//! registered into a [`World`](crate::World).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::component::{Component, ComponentHandle, ErasedSlot};
use crate::error::{EcsError, EcsResult};

/// Opaque identity handed out by [`World::add_entity`](crate::World::add_entity).
///
/// Identities start at 1, strictly increase and are never reused, not even
/// after the entity is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct EntityInner {
    components: RwLock<Vec<Arc<dyn ErasedSlot>>>,
    deleted: AtomicBool,
}

/// Handle to an entity.
///
/// Cloning the handle is cheap and never copies components; equality is
/// identity. All mutation goes through interior locks, so an entity can be
/// shared with systems running on the worker pool. The locks protect the
/// component list only: two systems that write the same component value
/// still race at the logical level and must coordinate themselves.
///
/// # Example
///
/// ```rust
/// use epsilon_core::{Component, Entity};
///
/// struct Position { x: i64 }
/// impl Component for Position {}
///
/// let entity = Entity::new();
/// let position = entity.insert(Position { x: 0 }).unwrap();
/// assert!(entity.has_component::<Position>());
///
/// assert!(entity.remove_component::<Position>());
/// assert!(position.is_deleted());
/// assert!(!entity.has_component::<Position>());
/// ```
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

impl Entity {
    /// Creates a detached entity with no components.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EntityInner {
                components: RwLock::new(Vec::new()),
                deleted: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<EntityInner>) -> Self {
        Self { inner }
    }

    /// Attaches a component, transferring its ownership to this entity.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ComponentDeleted`] if the component was removed before.
    /// - [`EcsError::ComponentOwned`] if the component already belongs to an
    ///   entity (this one included).
    /// - [`EcsError::EntityDeleted`] if this entity was deleted.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn add_component<C: Component>(&self, component: &ComponentHandle<C>) -> EcsResult<()> {
        let mut components = self.inner.components.write();
        if self.is_deleted() {
            return Err(EcsError::EntityDeleted {
                component: std::any::type_name::<C>(),
            });
        }

        let slot = component.erased();
        slot.state().claim(&self.inner, slot.component_name())?;
        components.push(slot);
        Ok(())
    }

    /// Wraps `value` in a new component, attaches it and returns its handle.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityDeleted`] if this entity was deleted.
    pub fn insert<C: Component>(&self, value: C) -> EcsResult<ComponentHandle<C>> {
        let handle = ComponentHandle::new(value);
        self.add_component(&handle)?;
        Ok(handle)
    }

    /// Builder form of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityDeleted`] if this entity was deleted.
    pub fn with<C: Component>(self, value: C) -> EcsResult<Self> {
        self.insert(value)?;
        Ok(self)
    }

    /// Returns the first component of type `C`, in insertion order.
    #[must_use]
    pub fn get_component<C: Component>(&self) -> Option<ComponentHandle<C>> {
        self.inner
            .components
            .read()
            .iter()
            .find(|slot| ComponentHandle::<C>::matches(slot))
            .and_then(ComponentHandle::from_erased)
    }

    /// Whether a component of type `C` is attached.
    #[must_use]
    pub fn has_component<C: Component>(&self) -> bool {
        self.inner
            .components
            .read()
            .iter()
            .any(|slot| ComponentHandle::<C>::matches(slot))
    }

    /// Detaches the first component of type `C` and marks it deleted.
    ///
    /// The removed component keeps its owner for diagnostics but can never be
    /// attached again. Returns `false` without mutating anything when no such
    /// component exists or the entity is deleted.
    pub fn remove_component<C: Component>(&self) -> bool {
        let mut components = self.inner.components.write();
        if self.is_deleted() {
            return false;
        }

        let Some(index) = components
            .iter()
            .position(|slot| ComponentHandle::<C>::matches(slot))
        else {
            return false;
        };

        let slot = components.remove(index);
        slot.state().mark_deleted();
        true
    }

    /// Soft-deletes the entity: every component is marked deleted and the
    /// entity accepts no further mutation. Idempotent.
    ///
    /// Components stay in the entity so they can still be inspected.
    pub fn delete(&self) {
        let components = self.inner.components.read();
        for slot in components.iter() {
            slot.state().mark_deleted();
        }
        self.inner.deleted.store(true, Ordering::Release);
    }

    /// Whether [`delete`](Self::delete) was called.
    #[inline]
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.inner.deleted.load(Ordering::Acquire)
    }

    /// Number of attached components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.components.read().len()
    }

    /// Whether no component is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.components.read().is_empty()
    }

    /// Type names of the attached components, in insertion order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&'static str> {
        self.inner
            .components
            .read()
            .iter()
            .map(|slot| slot.component_name())
            .collect()
    }

    /// Whether both handles refer to the same entity.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("components", &self.component_names())
            .field("deleted", &self.is_deleted())
            .finish()
    }
}
