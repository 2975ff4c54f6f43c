use std::cell::RefCell;
use std::rc::Rc;

use crate::info::{GenericTypeInfoCell, RefInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, ReflectKind, impl_reflect_cast_fn};

// -----------------------------------------------------------------------------
// Shared

/// A shared, identity-bearing handle to a `T`.
///
/// `Shared` is what makes object graphs with aliasing and cycles
/// representable: cloning a `Shared` clones the *handle*, so every clone
/// observes the same value. On write, the second and later encounters of
/// one identity serialize as a back reference; on read, all references to
/// one id come back as handles to one cell.
///
/// # Cell states
///
/// A cell is `Empty` (created by [`unresolved`](Shared::unresolved),
/// awaiting a forward reference), holds a `Value`, or is a `Link` to
/// another cell. Links appear when a forward reference is patched after
/// its target id arrives: the placeholder cell is rewired to the
/// canonical one rather than copied into. All accessors read through
/// links transparently.
///
/// # Threading and re-entrancy
///
/// `Shared` is single-threaded (`Rc` + `RefCell`). Re-entrant mutable
/// access through a cycle panics at the `RefCell`, as it would with any
/// interior-mutability cycle.
pub struct Shared<T>(Rc<RefCell<SharedCell<T>>>);

enum SharedCell<T> {
    Empty,
    Value(T),
    Link(Shared<T>),
}

impl<T> Shared<T> {
    /// A resolved handle holding `value`.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(SharedCell::Value(value))))
    }

    /// An empty handle awaiting a value or a link.
    pub fn unresolved() -> Self {
        Self(Rc::new(RefCell::new(SharedCell::Empty)))
    }

    /// The handle this cell ultimately refers to, following links.
    ///
    /// For a non-link cell this is a clone of `self`.
    pub fn canonical(&self) -> Shared<T> {
        let mut current = self.clone();
        loop {
            let next = match &*current.0.borrow() {
                SharedCell::Link(target) => target.clone(),
                _ => break,
            };
            current = next;
        }
        current
    }

    /// Whether the (canonical) cell holds a value.
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.canonical().0.borrow(), SharedCell::Value(_))
    }

    /// Visits the inner value, if resolved.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let canonical = self.canonical();
        let cell = canonical.0.borrow();
        match &*cell {
            SharedCell::Value(v) => Some(f(v)),
            _ => None,
        }
    }

    /// Visits the inner value mutably, if resolved.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let canonical = self.canonical();
        let mut cell = canonical.0.borrow_mut();
        match &mut *cell {
            SharedCell::Value(v) => Some(f(v)),
            _ => None,
        }
    }

    /// Fills an empty cell with a value.
    ///
    /// Returns the value back if the cell is already resolved.
    pub fn fill(&self, value: T) -> Result<(), T> {
        let canonical = self.canonical();
        let mut cell = canonical.0.borrow_mut();
        match &*cell {
            SharedCell::Empty => {
                *cell = SharedCell::Value(value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// Rewires an empty cell to refer to `target`'s canonical cell.
    ///
    /// Returns `false` (and changes nothing) if this cell is not empty or
    /// the link would be a self-loop.
    pub fn link_to(&self, target: &Shared<T>) -> bool {
        let canonical = target.canonical();
        if Rc::ptr_eq(&self.0, &canonical.0) {
            return false;
        }
        let mut cell = self.0.borrow_mut();
        match &*cell {
            SharedCell::Empty => {
                *cell = SharedCell::Link(canonical);
                true
            }
            _ => false,
        }
    }

    /// Whether two handles refer to the same cell.
    pub fn same_identity(&self, other: &Shared<T>) -> bool {
        Rc::ptr_eq(&self.canonical().0, &other.canonical().0)
    }

    /// A stable address for the canonical cell, usable as an identity key
    /// while the handle is alive.
    pub fn identity_addr(&self) -> usize {
        Rc::as_ptr(&self.canonical().0) as usize
    }
}

impl<T: Clone> Shared<T> {
    /// Clones the inner value out, if resolved.
    pub fn get_clone(&self) -> Option<T> {
        self.with(T::clone)
    }
}

impl<T> Clone for Shared<T> {
    /// Clones the handle; both clones observe the same cell.
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::unresolved()
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let canonical = self.canonical();
        let cell = canonical.0.borrow();
        match &*cell {
            SharedCell::Value(v) => f.debug_tuple("Shared").field(v).finish(),
            _ => f.write_str("Shared(<unresolved>)"),
        }
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    /// Identity first, value second; two unresolved cells are only equal
    /// when they are the same cell.
    fn eq(&self, other: &Self) -> bool {
        if self.same_identity(other) {
            return true;
        }
        self.with(|a| other.with(|b| a == b) == Some(true)) == Some(true)
    }
}

// -----------------------------------------------------------------------------
// SharedRef

/// Type-erased access to a [`Shared`] cell.
///
/// The methods take `&self`: filling and linking go through the cell's
/// interior mutability, which is what lets the reader hold plain clones
/// of placeholder handles and patch them after the fact.
pub trait SharedRef: Reflect {
    /// The identity key of the canonical cell.
    fn canonical_addr(&self) -> usize;

    /// Whether the cell holds a value.
    fn is_resolved(&self) -> bool;

    /// Visits the inner value; returns `false` if unresolved.
    fn with_value(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool;

    /// Fills an empty cell. On inner type mismatch or an already-resolved
    /// cell the input is handed back untouched.
    fn fill_boxed(&self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Rewires an empty cell to `target` (another handle of the same
    /// `Shared` type). Returns `false` if nothing was changed.
    fn link_boxed(&self, target: &dyn Reflect) -> bool;

    /// A new handle to the same cell, boxed and erased.
    fn clone_handle(&self) -> Box<dyn Reflect>;

    /// The [`TypeInfo`] of the inner type.
    fn inner_type_info(&self) -> &'static TypeInfo;
}

impl<T: Reflect + Typed> SharedRef for Shared<T> {
    fn canonical_addr(&self) -> usize {
        self.identity_addr()
    }

    fn is_resolved(&self) -> bool {
        Shared::is_resolved(self)
    }

    fn with_value(&self, f: &mut dyn FnMut(&dyn Reflect)) -> bool {
        self.with(|v| f(v.as_reflect())).is_some()
    }

    fn fill_boxed(&self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        let value = value.take::<T>()?;
        self.fill(value).map_err(|v| Box::new(v) as Box<dyn Reflect>)
    }

    fn link_boxed(&self, target: &dyn Reflect) -> bool {
        match target.downcast_ref::<Shared<T>>() {
            Some(target) => self.link_to(target),
            None => false,
        }
    }

    fn clone_handle(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn inner_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }
}

// -----------------------------------------------------------------------------
// Reflect plumbing

impl<T: Reflect + Typed> Typed for Shared<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Ref(RefInfo::new::<Self, T>(|| {
                Box::new(Shared::<T>::unresolved())
            }))
        })
    }
}

impl<T: Reflect + Typed> Reflect for Shared<T> {
    impl_reflect_cast_fn!(Ref);

    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }

    /// Clones the *handle*; the clone observes the same cell.
    fn reflect_clone(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        let other = other.downcast_ref::<Self>()?;
        if self.same_identity(other) {
            return Some(true);
        }
        let a = self.canonical();
        let b = other.canonical();
        let ra = a.0.borrow();
        let rb = b.0.borrow();
        match (&*ra, &*rb) {
            (SharedCell::Value(x), SharedCell::Value(y)) => x.reflect_partial_eq(y.as_reflect()),
            // Distinct unresolved cells have no defined value equality.
            (SharedCell::Empty, SharedCell::Empty) => None,
            _ => Some(false),
        }
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let canonical = self.canonical();
        let cell = canonical.0.borrow();
        match &*cell {
            SharedCell::Value(v) => {
                f.write_str("Shared(")?;
                v.reflect_debug(f)?;
                f.write_str(")")
            }
            _ => f.write_str("Shared(<unresolved>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_cell() {
        let a = Shared::new(5_i32);
        let b = a.clone();
        b.with_mut(|v| *v = 7);
        assert_eq!(a.get_clone(), Some(7));
        assert!(a.same_identity(&b));
    }

    #[test]
    fn fill_resolves_every_handle() {
        let a: Shared<i32> = Shared::unresolved();
        let b = a.clone();
        assert!(!b.is_resolved());
        a.fill(3).unwrap();
        assert_eq!(b.get_clone(), Some(3));
        assert!(a.fill(4).is_err());
    }

    #[test]
    fn link_reads_through() {
        let target = Shared::new("x".to_owned());
        let placeholder: Shared<String> = Shared::unresolved();
        assert!(placeholder.link_to(&target));
        assert_eq!(placeholder.get_clone().as_deref(), Some("x"));
        assert!(placeholder.same_identity(&target));
        // A linked cell refuses a second rewiring.
        assert!(!placeholder.link_to(&Shared::new("y".to_owned())));
    }

    #[test]
    fn identity_survives_link_chains() {
        let target = Shared::new(1_i32);
        let hop: Shared<i32> = Shared::unresolved();
        hop.link_to(&target);
        let hop2: Shared<i32> = Shared::unresolved();
        hop2.link_to(&hop);
        assert_eq!(hop2.identity_addr(), target.identity_addr());
    }

    #[test]
    fn self_link_is_refused() {
        let a: Shared<i32> = Shared::unresolved();
        let b = a.clone();
        assert!(!a.link_to(&b));
    }
}
