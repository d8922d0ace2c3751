//! Downcasting support for the [`System`](crate::System) and
//! [`Manager`](crate::Manager) trait objects.

use std::any::{Any, TypeId};

/// Upcast to [`Any`], implemented for every `'static` type.
///
/// Call it on the trait object itself (`&dyn Manager`), never on a `Box` or
/// `Arc` around it, otherwise the smart pointer's own type is returned.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The [`TypeId`] of the concrete type behind the trait object.
    fn concrete_type_id(&self) -> TypeId;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }
}
