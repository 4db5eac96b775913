//! Tagged entries: what is stored per declaration kind, and the
//! multi-fragment bookkeeping classes and modules require.

use std::cell::RefCell;
use std::rc::Rc;

use ori_ir::Name;
use smallvec::{smallvec, SmallVec};

use crate::context::Context;
use crate::decl::{Decl, TypeExpr, TypeParam};
use crate::error::EnvError;
use crate::name::TypeName;

/// One occurrence of a class or module declaration, plus the path of
/// enclosing class/module declarations at its original appearance site.
#[derive(Clone)]
pub struct Fragment {
    pub decl: Rc<Decl>,
    pub outer: Vec<Rc<Decl>>,
    /// Memoized per §4.5: a fragment's lexical context never changes once
    /// computed, since `outer` is fixed at fragment-creation time.
    context: RefCell<Option<Context>>,
}

impl Fragment {
    #[must_use]
    pub fn new(decl: Rc<Decl>, outer: Vec<Rc<Decl>>) -> Self {
        Fragment {
            decl,
            outer,
            context: RefCell::new(None),
        }
    }

    /// `calculate_context(outer ++ [fragment.decl])`, memoized on first call.
    pub fn context(&self) -> Context {
        if let Some(ctx) = self.context.borrow().as_ref() {
            return ctx.clone();
        }
        let mut path: Vec<Rc<Decl>> = self.outer.clone();
        path.push(self.decl.clone());
        let ctx = crate::context::calculate_context(&path);
        *self.context.borrow_mut() = Some(ctx.clone());
        ctx
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("decl", &self.decl)
            .field("outer_len", &self.outer.len())
            .finish()
    }
}

/// Multi-fragment entry shared by classes and modules.
///
/// `primary` is memoized: the validation result is cached until a new
/// fragment is appended, mirroring how the teacher registry clears its
/// method-lookup cache on every mutation rather than trying to patch it
/// incrementally.
#[derive(Clone)]
pub struct MultiFragmentEntry {
    pub name: TypeName,
    fragments: SmallVec<[Fragment; 1]>,
    primary: RefCell<Option<Result<usize, EnvError>>>,
}

impl std::fmt::Debug for MultiFragmentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiFragmentEntry")
            .field("name", &self.name)
            .field("fragments", &self.fragments.len())
            .finish()
    }
}

impl MultiFragmentEntry {
    #[must_use]
    pub fn new(name: TypeName, first: Fragment) -> Self {
        MultiFragmentEntry {
            name,
            fragments: smallvec![first],
            primary: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Append a fragment and invalidate the primary-fragment cache — the new
    /// fragment may change which one is primary, or may disagree on type
    /// parameters with the existing primary.
    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
        *self.primary.borrow_mut() = None;
    }

    /// §4.2/§3 invariant 4: the first fragment that declares a super class,
    /// else the first fragment inserted. Validates type-parameter
    /// compatibility across all fragments against the chosen primary.
    ///
    /// # Errors
    /// Returns [`EnvError::GenericParameterMismatch`] citing the first
    /// fragment whose type parameters disagree with the primary's.
    pub fn primary(&self) -> Result<usize, EnvError> {
        if let Some(cached) = self.primary.borrow().as_ref() {
            return cached.clone();
        }
        let result = self.compute_primary();
        *self.primary.borrow_mut() = Some(result.clone());
        result
    }

    fn compute_primary(&self) -> Result<usize, EnvError> {
        let primary_idx = self
            .fragments
            .iter()
            .position(Self::declares_super_class)
            .unwrap_or(0);
        let primary_params = self.fragments[primary_idx].decl.type_params();
        for (idx, fragment) in self.fragments.iter().enumerate() {
            if idx == primary_idx {
                continue;
            }
            let params = fragment.decl.type_params();
            if !type_params_compatible(primary_params, params) {
                return Err(EnvError::GenericParameterMismatch {
                    name: self.name.clone(),
                    offending_decl: fragment.decl.clone(),
                });
            }
        }
        Ok(primary_idx)
    }

    fn declares_super_class(fragment: &Fragment) -> bool {
        matches!(
            fragment.decl.as_ref(),
            Decl::Class(c) if c.super_class.is_some()
        )
    }
}

/// Structural type-parameter compatibility per §4.2: equal arity, and after
/// renaming `other`'s parameter names to `first`'s (in both the parameter
/// list and any bound positions), the lists compare equal.
fn type_params_compatible(first: &[TypeParam], other: &[TypeParam]) -> bool {
    if first.len() != other.len() {
        return false;
    }
    let mapping: Vec<(Name, Name)> = other
        .iter()
        .zip(first.iter())
        .map(|(o, f)| (o.name, f.name))
        .collect();
    first.iter().zip(other.iter()).all(|(f, o)| {
        f.variance == o.variance
            && f.unchecked == o.unchecked
            && o.upper_bound.as_ref().map(|b| rename_bound(b, &mapping))
                == f.upper_bound.clone()
    })
}

fn rename_bound(bound: &TypeExpr, mapping: &[(Name, Name)]) -> TypeExpr {
    bound.map_names(&mut |name| {
        if !name.is_absolute() && name.namespace().segments().is_empty() {
            if let Some((_, renamed)) = mapping.iter().find(|(old, _)| *old == name.simple()) {
                return TypeName::new(name.namespace().clone(), *renamed, name.kind());
            }
        }
        name.clone()
    })
}


/// A single-occurrence declaration: interfaces, type aliases, constants,
/// and globals.
#[derive(Debug, Clone)]
pub struct SingleEntry {
    pub name: TypeName,
    pub decl: Rc<Decl>,
    pub outer: Vec<Rc<Decl>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Class,
    Module,
}

/// A class or module alias entry. `old_name` is recorded verbatim on the
/// underlying declaration and may be relative.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub name: TypeName,
    pub decl: Rc<Decl>,
    pub outer: Vec<Rc<Decl>>,
    pub kind: AliasKind,
}

impl AliasEntry {
    /// The alias's `old_name`, as recorded on the declaration.
    ///
    /// # Panics
    /// Panics if the underlying declaration is not a class/module alias —
    /// an invariant violation, since `AliasEntry` is only ever constructed
    /// from one.
    #[must_use]
    pub fn old_name(&self) -> &TypeName {
        match self.decl.as_ref() {
            Decl::ClassAlias(d) => &d.old_name,
            Decl::ModuleAlias(d) => &d.old_name,
            _ => unreachable!("AliasEntry constructed from a non-alias declaration"),
        }
    }
}

/// A tagged record describing what is stored at a given name.
#[derive(Debug, Clone)]
pub enum Entry {
    Class(MultiFragmentEntry),
    Module(MultiFragmentEntry),
    Interface(SingleEntry),
    TypeAlias(SingleEntry),
    Constant(SingleEntry),
    ClassAlias(AliasEntry),
    ModuleAlias(AliasEntry),
}

impl Entry {
    #[must_use]
    pub fn name(&self) -> &TypeName {
        match self {
            Entry::Class(e) | Entry::Module(e) => &e.name,
            Entry::Interface(e) | Entry::TypeAlias(e) | Entry::Constant(e) => &e.name,
            Entry::ClassAlias(e) | Entry::ModuleAlias(e) => &e.name,
        }
    }

    #[must_use]
    pub fn is_class_or_module(&self) -> bool {
        matches!(self, Entry::Class(_) | Entry::Module(_))
    }

    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self, Entry::ClassAlias(_) | Entry::ModuleAlias(_))
    }

    /// All declarations backing this entry — every fragment for
    /// classes/modules, the single declaration otherwise. Used to report
    /// `DuplicatedDeclaration`'s `existing_decls`.
    #[must_use]
    pub fn decls(&self) -> Vec<Rc<Decl>> {
        match self {
            Entry::Class(e) | Entry::Module(e) => {
                e.fragments().iter().map(|f| f.decl.clone()).collect()
            }
            Entry::Interface(e) | Entry::TypeAlias(e) | Entry::Constant(e) => vec![e.decl.clone()],
            Entry::ClassAlias(e) | Entry::ModuleAlias(e) => vec![e.decl.clone()],
        }
    }
}
