use std::borrow::Cow;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error outcomes of converting between object graphs and JSON.
///
/// The variants fall into the kinds described in the crate docs:
///
/// - [`NoConverter`](Error::NoConverter) and
///   [`NoConstructor`](Error::NoConstructor) are *configuration* errors:
///   the engine has no way to represent the type at all. They indicate an
///   incomplete registration, not a document problem, and are never fixed
///   by retrying with different input.
/// - [`Syntax`](Error::Syntax) means the token stream did not have the
///   expected shape at a read point. Always surfaced, never recovered
///   mid-document.
/// - [`Io`](Error::Io) wraps an underlying stream failure.
/// - [`UnresolvedReference`](Error::UnresolvedReference) is raised after an
///   otherwise successful parse when a recorded forward reference points at
///   an id that was never defined anywhere in the document.
/// - [`Mismatch`](Error::Mismatch) means a value's runtime shape could not
///   be reconciled with a field's declared type, even after coercion. From
///   the caller's perspective the document was not a valid representation
///   of the target type, so this is surfaced alongside syntax errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No registered factory claimed the requested type.
    #[error("no converter registered for type `{type_path}`")]
    NoConverter { type_path: Cow<'static, str> },

    /// The constructor strategy found no way to create an instance.
    #[error(
        "cannot construct `{type_path}`: {reason}; register an instance \
         creator or derive the type with `#[reflect(default)]`"
    )]
    NoConstructor {
        type_path: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    /// Malformed JSON, or a token of the wrong kind at a read point.
    #[error("syntax error at line {line} column {column}: {msg}")]
    Syntax {
        msg: Cow<'static, str>,
        line: usize,
        column: usize,
    },

    /// Underlying stream failure on read or write.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A `@ref` whose id was never defined by end of document.
    #[error("could not resolve reference `{id}`")]
    UnresolvedReference { id: String },

    /// A value could not be coerced into the declared field type.
    #[error("expected `{expected}`, got `{found}`{}", in_field(.field))]
    Mismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
        field: Option<Cow<'static, str>>,
    },

    /// A class tag named a type the engine cannot resolve, under the
    /// fail-loudly policy.
    #[error("unknown class tag `{tag}`")]
    UnknownTag { tag: String },
}

fn in_field(field: &Option<Cow<'static, str>>) -> String {
    match field {
        Some(f) => format!(" in field `{f}`"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn no_converter(type_path: impl Into<Cow<'static, str>>) -> Self {
        Error::NoConverter {
            type_path: type_path.into(),
        }
    }

    /// A [`Mismatch`](Error::Mismatch) with no field attached. Public so
    /// hand-written converters can report shape problems.
    pub fn mismatch(
        expected: impl Into<Cow<'static, str>>,
        found: impl Into<Cow<'static, str>>,
    ) -> Self {
        Error::Mismatch {
            expected: expected.into(),
            found: found.into(),
            field: None,
        }
    }

    /// Attach the document property name to a mismatch error.
    pub(crate) fn for_field(self, name: &str) -> Self {
        match self {
            Error::Mismatch {
                expected,
                found,
                field: None,
            } => Error::Mismatch {
                expected,
                found,
                field: Some(Cow::Owned(name.to_owned())),
            },
            other => other,
        }
    }

    /// Whether this error signals missing registration rather than bad data.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::NoConverter { .. } | Error::NoConstructor { .. })
    }
}
