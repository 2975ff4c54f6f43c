/// How an engine treats shared objects and cycles.
///
/// Stored per engine instance, never process-global, so two engines with
/// different policies can run side by side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopPolicy {
    /// No identity tracking. Aliased objects are written once per
    /// encounter; a genuine cycle recurses until the stack runs out.
    /// Cheap, and safe for tree-shaped data.
    #[default]
    NoChecks,

    /// Track object identity with `@id`/`@ref` properties, preserving
    /// aliasing and making cycles representable.
    IdTagging,
}
