use crate::reflection::Reflect;

// -----------------------------------------------------------------------------
// Optional

/// Data access for `Option<T>`-shaped values.
///
/// Optionals are transparent in documents: `Some(v)` serializes as `v`
/// would, `None` as null or an absent pair. Converters use this trait to
/// fill or clear the slot without knowing `T`.
pub trait Optional: Reflect {
    /// Whether the slot holds a value.
    fn is_some(&self) -> bool;

    /// Returns the inner value, if present.
    fn get(&self) -> Option<&dyn Reflect>;

    /// Returns the inner value mutably, if present.
    fn get_mut(&mut self) -> Option<&mut dyn Reflect>;

    /// Fills the slot. On inner type mismatch the input is handed back
    /// untouched.
    fn set_inner(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Empties the slot.
    fn clear(&mut self);

    /// Empties the slot, returning the value it held.
    fn take_inner(&mut self) -> Option<Box<dyn Reflect>>;
}
