use std::collections::HashMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::ops::ReflectRef;
use crate::reflection::Reflect;

// -----------------------------------------------------------------------------
// WriteRefs

/// Identity tracking for one serialization pass: canonical cell address
/// to assigned id.
#[derive(Default)]
pub struct WriteRefs {
    ids: HashMap<usize, String>,
    next_id: u64,
}

/// Outcome of [`WriteRefs::track`].
pub(crate) enum Tracked {
    /// First visit; the id should be emitted as `@id`.
    New(String),
    /// Already written; emit `{"@ref": id}` and do not recurse.
    Seen(String),
}

impl WriteRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a visit to the cell at `addr`, assigning a sequential id
    /// on first sight.
    pub(crate) fn track(&mut self, addr: usize) -> Tracked {
        if let Some(id) = self.ids.get(&addr) {
            return Tracked::Seen(id.clone());
        }
        self.next_id += 1;
        let id = self.next_id.to_string();
        trace!(id, "assigned reference id");
        self.ids.insert(addr, id.clone());
        Tracked::New(id)
    }
}

// -----------------------------------------------------------------------------
// ReadRefs

/// One id's registrations during a parse.
///
/// The typed path stores an erased [`Shared`](crate::ops::Shared) handle
/// (`cell`); the dynamic path stores a finished value cloned per backward
/// reference (`value`). An id may carry both when typed and dynamic slots
/// mention it.
#[derive(Default)]
pub(crate) struct RefSlot {
    pub(crate) cell: Option<Box<dyn Reflect>>,
    pub(crate) value: Option<Box<dyn Reflect>>,
}

/// A forward reference awaiting its definition: the placeholder cell *is*
/// the recorded location, wherever it was stored.
pub(crate) struct PendingPatch {
    pub(crate) id: String,
    pub(crate) cell: Box<dyn Reflect>,
}

/// Reference bookkeeping for one parse: id to slot, plus the forward
/// references in encounter order.
#[derive(Default)]
pub struct ReadRefs {
    slots: HashMap<String, RefSlot>,
    patches: Vec<PendingPatch>,
}

impl ReadRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn slot(&self, id: &str) -> Option<&RefSlot> {
        self.slots.get(id)
    }

    /// Registers the cell for `id`, or returns the previously registered
    /// one (created by an earlier forward reference).
    ///
    /// `make_cell` runs only when the id is new.
    pub(crate) fn cell_for(
        &mut self,
        id: &str,
        make_cell: impl FnOnce() -> Box<dyn Reflect>,
    ) -> &dyn Reflect {
        let slot = self.slots.entry(id.to_owned()).or_default();
        &**slot.cell.get_or_insert_with(make_cell)
    }

    /// Records a forward reference to `id` through `cell`, to be verified
    /// after the document ends.
    pub(crate) fn push_patch(&mut self, id: &str, cell: Box<dyn Reflect>) {
        trace!(id, "recorded forward reference");
        self.patches.push(PendingPatch {
            id: id.to_owned(),
            cell,
        });
    }

    /// Stores the finished dynamic value for `id`.
    pub(crate) fn define_value(&mut self, id: &str, value: Box<dyn Reflect>) {
        let slot = self.slots.entry(id.to_owned()).or_default();
        slot.value = Some(value);
    }

    /// Whether `id` has a definition usable by a backward reference.
    pub(crate) fn is_defined(&self, id: &str) -> bool {
        self.slots.get(id).is_some_and(|slot| {
            slot.value.is_some()
                || slot.cell.as_ref().is_some_and(|cell| {
                    matches!(cell.reflect_ref(), ReflectRef::Ref(s) if s.is_resolved())
                })
        })
    }

    /// The patch pass: every forward reference must have been resolved by
    /// the end of the document. Checked in encounter order.
    pub fn verify(&self) -> Result<()> {
        for patch in &self.patches {
            let resolved = matches!(
                patch.cell.reflect_ref(),
                ReflectRef::Ref(shared) if shared.is_resolved()
            );
            if !resolved {
                return Err(Error::UnresolvedReference {
                    id: patch.id.clone(),
                });
            }
            trace!(id = patch.id, "forward reference resolved");
        }
        Ok(())
    }
}
