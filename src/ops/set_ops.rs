use crate::reflection::Reflect;

// -----------------------------------------------------------------------------
// Set

/// Data access for set-like values.
///
/// There is no dynamic counterpart: untagged JSON arrays degrade to
/// [`DynamicList`](crate::ops::DynamicList), and concrete sets are built
/// through [`insert_boxed`](Set::insert_boxed).
pub trait Set: Reflect {
    /// Inserts a boxed value. On item type mismatch the input is handed
    /// back untouched.
    fn insert_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Whether the set contains a value reflect-equal to `value`.
    fn contains(&self, value: &dyn Reflect) -> bool;

    /// Returns the number of items.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the items, in container order.
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}
