//! Fully/relatively qualified type names and namespace composition.

use ori_ir::Name;

/// What kind of declaration a [`TypeName`] refers to.
///
/// A name's kind is fixed at construction and never changes; it is what lets
/// [`crate::entry::Entry`] lookups dispatch without re-deriving the kind from
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// A class or module (the two share a namespace and collision rules).
    /// Class and module aliases are also tagged this way: an alias's new
    /// name occupies the same slot its target would.
    ClassOrModule,
    Interface,
    TypeAlias,
    Constant,
    Global,
}

impl NameKind {
    /// Whether this kind occupies the shared class/module/alias/interface/
    /// type-alias/constant namespace (invariant 2 of the data model).
    #[must_use]
    pub fn is_non_global(self) -> bool {
        !matches!(self, NameKind::Global)
    }
}

/// Ordered sequence of simple identifiers, rooted or relative.
///
/// Equality is structural: two namespaces with the same identifiers in the
/// same order and the same `absolute` flag are equal, regardless of how they
/// were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Namespace {
    absolute: bool,
    segments: Vec<Name>,
}

impl Namespace {
    /// The empty, relative namespace (top level, not yet rooted).
    #[must_use]
    pub fn empty() -> Self {
        Namespace {
            absolute: false,
            segments: Vec::new(),
        }
    }

    /// The root namespace: absolute, no segments.
    #[must_use]
    pub fn root() -> Self {
        Namespace {
            absolute: true,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[must_use]
    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// Append a single identifier, returning a new namespace.
    #[must_use]
    pub fn append(&self, segment: Name) -> Namespace {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Namespace {
            absolute: self.absolute,
            segments,
        }
    }

    /// Prepend `prefix`'s segments in front of this namespace's own, taking
    /// `prefix`'s absoluteness. Used to resolve a relative namespace against
    /// an enclosing one.
    #[must_use]
    pub fn with_prefix(&self, prefix: &Namespace) -> Namespace {
        if self.absolute {
            return self.clone();
        }
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().copied());
        Namespace {
            absolute: prefix.absolute,
            segments,
        }
    }

    /// Coerce to absolute in place (semantically: reinterpret as rooted,
    /// keeping the same segments). Used by `TypeName::absolute`.
    #[must_use]
    pub fn to_absolute(&self) -> Namespace {
        Namespace {
            absolute: true,
            segments: self.segments.clone(),
        }
    }

    /// Split off the last segment as a simple identifier, turning the
    /// remaining segments back into a namespace — the qualifier one step up
    /// from this namespace, read as a class/module name.
    ///
    /// # Panics
    /// Panics on an empty namespace; callers only call this on a namespace
    /// known to have at least one segment (an alias's non-empty qualifier).
    #[must_use]
    pub fn to_type_name(&self, kind: NameKind) -> TypeName {
        let mut segments = self.segments.clone();
        let simple = segments
            .pop()
            .expect("to_type_name called on an empty namespace");
        TypeName::new(
            Namespace {
                absolute: self.absolute,
                segments,
            },
            simple,
            kind,
        )
    }
}

/// A namespace plus a simple identifier plus a kind tag.
///
/// Either *absolute* (rooted at the top namespace) or *relative*.
///
/// Equality and hashing consider only `namespace` and `simple`, not `kind`:
/// invariant 2 (§3) puts classes, modules, interfaces, type aliases,
/// constants, and class/module aliases in one shared name-keyed table, so a
/// name collision must be detected across kinds, not just within one. `kind`
/// is metadata carried alongside the identity, not part of it.
#[derive(Debug, Clone)]
pub struct TypeName {
    namespace: Namespace,
    simple: Name,
    kind: NameKind,
}

impl PartialEq for TypeName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.simple == other.simple
    }
}

impl Eq for TypeName {}

impl std::hash::Hash for TypeName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.simple.hash(state);
    }
}

impl TypeName {
    #[must_use]
    pub fn new(namespace: Namespace, simple: Name, kind: NameKind) -> Self {
        TypeName {
            namespace,
            simple,
            kind,
        }
    }

    /// Construct an already-absolute name directly under the root.
    #[must_use]
    pub fn root_level(simple: Name, kind: NameKind) -> Self {
        TypeName {
            namespace: Namespace::root(),
            simple,
            kind,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[must_use]
    pub fn simple(&self) -> Name {
        self.simple
    }

    #[must_use]
    pub fn kind(&self) -> NameKind {
        self.kind
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.namespace.is_absolute()
    }

    /// `absolute!` — coerce a relative name to absolute, keeping its segments.
    #[must_use]
    pub fn absolute(&self) -> TypeName {
        TypeName {
            namespace: self.namespace.to_absolute(),
            simple: self.simple,
            kind: self.kind,
        }
    }

    /// Prepend `prefix` onto this name's namespace when this name is
    /// relative; absolute names are returned unchanged.
    #[must_use]
    pub fn with_prefix(&self, prefix: &Namespace) -> TypeName {
        TypeName {
            namespace: self.namespace.with_prefix(prefix),
            simple: self.simple,
            kind: self.kind,
        }
    }

    /// `to_namespace` — the namespace this class/module name introduces for
    /// its members, i.e. itself appended as a segment.
    ///
    /// # Panics
    /// Panics if `self` is not a class/module name; callers must check
    /// [`TypeName::is_class_or_module`] first (mirrors the `name.class?`
    /// precondition in the normalization algorithm).
    #[must_use]
    pub fn to_namespace(&self) -> Namespace {
        assert!(
            self.is_class_or_module(),
            "to_namespace called on a non-class/module TypeName"
        );
        self.namespace.append(self.simple)
    }

    /// `name.class?` — gates operations that require a class/module name.
    #[must_use]
    pub fn is_class_or_module(&self) -> bool {
        matches!(self.kind, NameKind::ClassOrModule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(local: u32) -> Name {
        Name::new(0, local)
    }

    #[test]
    fn namespace_with_prefix_is_noop_for_absolute() {
        let abs = Namespace::root().append(n(1));
        let prefix = Namespace::root().append(n(99));
        assert_eq!(abs.with_prefix(&prefix), abs);
    }

    #[test]
    fn namespace_with_prefix_prepends_for_relative() {
        let relative = Namespace::empty().append(n(2));
        let prefix = Namespace::root().append(n(1));
        let result = relative.with_prefix(&prefix);
        assert!(result.is_absolute());
        assert_eq!(result.segments(), &[n(1), n(2)]);
    }

    #[test]
    fn type_name_absolute_coerces_relative_namespace() {
        let relative = TypeName::new(Namespace::empty(), n(1), NameKind::ClassOrModule);
        assert!(!relative.is_absolute());
        let abs = relative.absolute();
        assert!(abs.is_absolute());
        assert_eq!(abs.simple(), n(1));
    }

    #[test]
    fn to_namespace_appends_self_as_segment() {
        let name = TypeName::new(Namespace::root(), n(5), NameKind::ClassOrModule);
        let ns = name.to_namespace();
        assert!(ns.is_absolute());
        assert_eq!(ns.segments(), &[n(5)]);
    }

    #[test]
    #[should_panic(expected = "to_namespace called on a non-class/module TypeName")]
    fn to_namespace_panics_on_non_class_module() {
        let name = TypeName::new(Namespace::root(), n(5), NameKind::Constant);
        let _ = name.to_namespace();
    }

    #[test]
    fn with_prefix_resolves_a_relative_name_under_its_enclosing_namespace() {
        let outer = Namespace::root().append(n(1));
        let relative = TypeName::new(Namespace::empty(), n(2), NameKind::ClassOrModule);
        let resolved = relative.with_prefix(&outer);
        assert!(resolved.is_absolute());
        assert_eq!(resolved.namespace().segments(), &[n(1)]);
        assert_eq!(resolved.simple(), n(2));
    }
}
