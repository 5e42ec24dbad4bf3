#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// Interior mutability for shared composite values.
///
/// Poisoning is ignored under `std`: a panic while a guard is held leaves the
/// contents as they were, which is all a diagnostic walk needs.
#[repr(transparent)]
pub(crate) struct SharedLock<T>(impl_::RwLock<T>);

impl<T> SharedLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> impl_::RwLockReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        guard
    }

    #[inline]
    pub(crate) fn write(&self) -> impl_::RwLockWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self.0.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        guard
    }
}
