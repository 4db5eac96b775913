//! The environment core: insertion, collision rules, lookup, alias
//! normalization, and the introspection utilities built on top of them.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::decl::{Buffer, Decl, Member};
use crate::entry::{AliasEntry, AliasKind, Entry, Fragment, MultiFragmentEntry, SingleEntry};
use crate::error::EnvError;
use crate::name::{NameKind, Namespace, TypeName};
use crate::resolver::Loader;

/// State of a single key in the alias-normalization memo.
///
/// `Resolved`/`Unresolved` are both terminal; `Pending` marks a name
/// currently under computation on the current call chain and is how cycles
/// are detected (§4.4). A key absent from the map has not been seen yet.
#[derive(Debug, Clone)]
enum MemoState {
    Resolved(TypeName),
    Unresolved,
    Pending,
}

/// Per-table sizes, for debugging and spotting reopened classes/modules
/// without walking every entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSizes {
    pub classes: usize,
    pub modules: usize,
    pub interfaces: usize,
    pub type_aliases: usize,
    pub constants: usize,
    pub class_aliases: usize,
    pub module_aliases: usize,
    pub globals: usize,
    pub fragments: usize,
}

/// The in-memory symbol table.
///
/// Invariant 2 (§3) is enforced by construction: classes, modules,
/// interfaces, type aliases, constants, and class/module aliases all share
/// one name-keyed table (`entries`); globals live in their own table.
pub struct Environment {
    /// Top-level declarations, in insertion order (what `<<`/`push` append
    /// to). Nested declarations are reachable through `Member::Nested` but
    /// are not duplicated into this list.
    declarations: Vec<Rc<Decl>>,
    entries: FxHashMap<TypeName, Entry>,
    globals: FxHashMap<TypeName, SingleEntry>,
    alias_memo: RefCell<FxHashMap<TypeName, MemoState>>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            declarations: Vec::new(),
            entries: FxHashMap::default(),
            globals: FxHashMap::default(),
            alias_memo: RefCell::new(FxHashMap::default()),
        }
    }
}

impl Clone for Environment {
    /// Shallow duplication: the kind tables and declaration list are
    /// duplicated, but fragments and declarations are shared (`Rc` clones).
    /// The normalization memo is derived state and starts empty in the
    /// clone, same as the teacher registry's lookup cache is never copied
    /// across a duplicate.
    fn clone(&self) -> Self {
        Environment {
            declarations: self.declarations.clone(),
            entries: self.entries.clone(),
            globals: self.globals.clone(),
            alias_memo: RefCell::new(FxHashMap::default()),
        }
    }
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh environment and populate it via `loader.load(..)`.
    #[must_use]
    pub fn from_loader(loader: &impl Loader) -> Self {
        let mut env = Self::new();
        loader.load(&mut env);
        env
    }

    #[must_use]
    pub fn declarations(&self) -> &[Rc<Decl>] {
        &self.declarations
    }

    // ---- Insertion ---------------------------------------------------

    /// `<< decl` — append to the top-level declaration list and insert
    /// recursively starting at the root namespace.
    ///
    /// # Errors
    /// See [`EnvError::DuplicatedDeclaration`] / [`EnvError::GenericParameterMismatch`].
    /// On error the environment is left partially populated up to the
    /// failing declaration; callers that cannot tolerate that should
    /// discard it.
    pub fn push(&mut self, decl: Rc<Decl>) -> Result<(), EnvError> {
        self.declarations.push(decl.clone());
        self.insert(decl, Vec::new(), Namespace::root())
    }

    fn insert(
        &mut self,
        decl: Rc<Decl>,
        outer: Vec<Rc<Decl>>,
        namespace: Namespace,
    ) -> Result<(), EnvError> {
        match decl.as_ref() {
            Decl::Class(_) | Decl::Module(_) => self.insert_class_or_module(decl, outer, namespace),
            Decl::Interface(d) => {
                let name = d.name.with_prefix(&namespace);
                self.reject_if_occupied(&name, &decl)?;
                self.entries.insert(
                    name.clone(),
                    Entry::Interface(SingleEntry { name, decl, outer }),
                );
                Ok(())
            }
            Decl::TypeAlias(d) => {
                let name = d.name.with_prefix(&namespace);
                self.reject_if_occupied(&name, &decl)?;
                self.entries.insert(
                    name.clone(),
                    Entry::TypeAlias(SingleEntry { name, decl, outer }),
                );
                Ok(())
            }
            Decl::Constant(d) => {
                let name = d.name.with_prefix(&namespace);
                self.reject_if_occupied(&name, &decl)?;
                self.entries.insert(
                    name.clone(),
                    Entry::Constant(SingleEntry { name, decl, outer }),
                );
                Ok(())
            }
            Decl::Global(d) => {
                let name = d.name.with_prefix(&namespace);
                if let Some(existing) = self.globals.get(&name) {
                    return Err(EnvError::DuplicatedDeclaration {
                        name,
                        new_decl: decl.clone(),
                        existing_decls: vec![existing.decl.clone()],
                    });
                }
                self.globals
                    .insert(name.clone(), SingleEntry { name, decl, outer });
                Ok(())
            }
            Decl::ClassAlias(d) => {
                let name = d.new_name.with_prefix(&namespace);
                self.reject_if_occupied(&name, &decl)?;
                self.entries.insert(
                    name.clone(),
                    Entry::ClassAlias(AliasEntry {
                        name,
                        decl,
                        outer,
                        kind: AliasKind::Class,
                    }),
                );
                Ok(())
            }
            Decl::ModuleAlias(d) => {
                let name = d.new_name.with_prefix(&namespace);
                self.reject_if_occupied(&name, &decl)?;
                self.entries.insert(
                    name.clone(),
                    Entry::ModuleAlias(AliasEntry {
                        name,
                        decl,
                        outer,
                        kind: AliasKind::Module,
                    }),
                );
                Ok(())
            }
        }
    }

    fn reject_if_occupied(&self, name: &TypeName, new_decl: &Rc<Decl>) -> Result<(), EnvError> {
        if let Some(existing) = self.entries.get(name) {
            return Err(EnvError::DuplicatedDeclaration {
                name: name.clone(),
                new_decl: new_decl.clone(),
                existing_decls: existing.decls(),
            });
        }
        Ok(())
    }

    fn insert_class_or_module(
        &mut self,
        decl: Rc<Decl>,
        outer: Vec<Rc<Decl>>,
        namespace: Namespace,
    ) -> Result<(), EnvError> {
        let name = decl.name().with_prefix(&namespace);
        let is_class = matches!(decl.as_ref(), Decl::Class(_));

        match self.entries.get_mut(&name) {
            Some(Entry::Class(entry)) if is_class => {
                entry.push_fragment(Fragment::new(decl.clone(), outer.clone()));
            }
            Some(Entry::Module(entry)) if !is_class => {
                entry.push_fragment(Fragment::new(decl.clone(), outer.clone()));
            }
            Some(existing) => {
                return Err(EnvError::DuplicatedDeclaration {
                    name: name.clone(),
                    new_decl: decl.clone(),
                    existing_decls: existing.decls(),
                });
            }
            None => {
                let entry = MultiFragmentEntry::new(
                    name.clone(),
                    Fragment::new(decl.clone(), outer.clone()),
                );
                self.entries.insert(
                    name.clone(),
                    if is_class {
                        Entry::Class(entry)
                    } else {
                        Entry::Module(entry)
                    },
                );
            }
        }

        let inner_namespace = name.to_namespace();
        let mut inner_outer = outer;
        inner_outer.push(decl.clone());
        for member in decl.members() {
            if let Member::Nested(nested) = member {
                self.insert(nested.clone(), inner_outer.clone(), inner_namespace.clone())?;
            }
        }
        Ok(())
    }

    // ---- Lookup surface (§4.3) ---------------------------------------

    #[must_use]
    pub fn interface_name(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::Interface(_)))
    }

    #[must_use]
    pub fn type_alias_name(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::TypeAlias(_)))
    }

    #[must_use]
    pub fn module_name(&self, n: &TypeName) -> bool {
        matches!(
            self.entries.get(n),
            Some(Entry::Class(_) | Entry::Module(_) | Entry::ClassAlias(_) | Entry::ModuleAlias(_))
        )
    }

    #[must_use]
    pub fn type_name(&self, n: &TypeName) -> bool {
        self.interface_name(n) || self.type_alias_name(n) || self.module_name(n)
    }

    #[must_use]
    pub fn constant_name(&self, n: &TypeName) -> bool {
        matches!(
            self.entries.get(n),
            Some(
                Entry::Constant(_)
                    | Entry::Class(_)
                    | Entry::Module(_)
                    | Entry::ClassAlias(_)
                    | Entry::ModuleAlias(_)
            )
        )
    }

    #[must_use]
    pub fn class_decl(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::Class(_)))
    }

    #[must_use]
    pub fn module_decl(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::Module(_)))
    }

    #[must_use]
    pub fn class_alias(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::ClassAlias(_)))
    }

    #[must_use]
    pub fn module_alias(&self, n: &TypeName) -> bool {
        matches!(self.entries.get(n), Some(Entry::ModuleAlias(_)))
    }

    #[must_use]
    pub fn class_entry(&self, n: &TypeName) -> Option<&Entry> {
        match self.entries.get(n) {
            e @ Some(Entry::Class(_) | Entry::ClassAlias(_)) => e,
            _ => None,
        }
    }

    #[must_use]
    pub fn module_entry(&self, n: &TypeName) -> Option<&Entry> {
        match self.entries.get(n) {
            e @ Some(Entry::Module(_) | Entry::ModuleAlias(_)) => e,
            _ => None,
        }
    }

    #[must_use]
    pub fn module_class_entry(&self, n: &TypeName) -> Option<&Entry> {
        self.class_entry(n).or_else(|| self.module_entry(n))
    }

    #[must_use]
    pub fn constant_entry(&self, n: &TypeName) -> Option<&Entry> {
        self.module_class_entry(n).or_else(|| match self.entries.get(n) {
            e @ Some(Entry::Constant(_)) => e,
            _ => None,
        })
    }

    /// Alias-normalizing variant of [`Environment::module_class_entry`]: if
    /// `n` normalizes to a class/module, returns its entry; fails loudly
    /// (an [`EnvError::Internal`]) if normalization somehow still surfaces
    /// an alias, since that would mean normalization is broken.
    ///
    /// # Errors
    /// See [`Environment::normalize_module_name_opt`].
    pub fn normalized_module_class_entry(
        &self,
        n: &TypeName,
    ) -> Result<Option<&Entry>, EnvError> {
        let Some(canonical) = self.normalize_module_name_opt(n)? else {
            return Ok(None);
        };
        match self.entries.get(&canonical) {
            e @ Some(Entry::Class(_) | Entry::Module(_)) => Ok(e),
            Some(Entry::ClassAlias(_) | Entry::ModuleAlias(_)) => Err(EnvError::Internal(
                "normalize_module_name returned an alias name".to_string(),
            )),
            _ => Ok(None),
        }
    }

    // ---- Alias normalization (§4.4) -----------------------------------

    /// `normalize_module_name(name)` — the total wrapper: returns `name`
    /// (coerced to absolute) unchanged when the partial variant finds
    /// nothing.
    ///
    /// # Errors
    /// See [`Environment::normalize_module_name_opt`].
    pub fn normalize_module_name(&self, name: &TypeName) -> Result<TypeName, EnvError> {
        let absolute = name.absolute();
        match self.normalize_module_name_opt(name)? {
            Some(resolved) => Ok(resolved),
            None => Ok(absolute),
        }
    }

    /// `normalize_module_name?(name)` — chase the alias chain starting at
    /// `name` to its canonical absolute class/module name, or `None` if it
    /// does not resolve to one.
    ///
    /// # Errors
    /// [`EnvError::Internal`] if `name` is not a class/module name.
    /// [`EnvError::CyclicClassAliasDefinition`] if the chain cycles.
    /// [`EnvError::Internal`] if a constant name is found where a module
    /// was expected (programmer error upstream of this call).
    pub fn normalize_module_name_opt(&self, name: &TypeName) -> Result<Option<TypeName>, EnvError> {
        if !name.is_class_or_module() {
            return Err(EnvError::Internal(
                "normalize_module_name called on a non-class/module name".to_string(),
            ));
        }
        let absolute = name.absolute();
        self.normalize_inner(&absolute)
    }

    fn normalize_inner(&self, name: &TypeName) -> Result<Option<TypeName>, EnvError> {
        match self.alias_memo.borrow().get(name) {
            Some(MemoState::Resolved(resolved)) => return Ok(Some(resolved.clone())),
            Some(MemoState::Unresolved) => return Ok(None),
            Some(MemoState::Pending) => return self.raise_cycle(name),
            None => {}
        }
        self.alias_memo
            .borrow_mut()
            .insert(name.clone(), MemoState::Pending);

        match self.normalize_step(name) {
            Ok(StepOutcome::NoEntry) => {
                // No entry at all: remove the Pending marker so a later
                // insert at this name can still succeed, but don't cache a
                // definitive "unresolved" result — the name may not exist
                // *yet*.
                self.alias_memo.borrow_mut().remove(name);
                Ok(None)
            }
            Ok(StepOutcome::Canonical(canonical)) => {
                self.alias_memo
                    .borrow_mut()
                    .insert(name.clone(), MemoState::Resolved(canonical.clone()));
                Ok(Some(canonical))
            }
            Ok(StepOutcome::AliasResult(Some(canonical))) => {
                self.alias_memo
                    .borrow_mut()
                    .insert(name.clone(), MemoState::Resolved(canonical.clone()));
                Ok(Some(canonical))
            }
            Ok(StepOutcome::AliasResult(None)) => {
                self.alias_memo
                    .borrow_mut()
                    .insert(name.clone(), MemoState::Unresolved);
                Ok(None)
            }
            Err(e) => {
                self.alias_memo.borrow_mut().remove(name);
                Err(e)
            }
        }
    }

    fn normalize_step(&self, name: &TypeName) -> Result<StepOutcome, EnvError> {
        match self.constant_entry(name) {
            Some(Entry::Class(_) | Entry::Module(_)) => Ok(StepOutcome::Canonical(name.clone())),
            Some(Entry::ClassAlias(alias) | Entry::ModuleAlias(alias)) => {
                let old = alias.old_name().clone();
                if old.namespace().segments().is_empty() {
                    Ok(StepOutcome::AliasResult(self.normalize_inner(&old)?))
                } else {
                    let parent = old.namespace().to_type_name(NameKind::ClassOrModule);
                    let normalized_parent = self.normalize_module_name(&parent)?;
                    let old_prime = if normalized_parent == parent {
                        old
                    } else {
                        TypeName::new(normalized_parent.to_namespace(), old.simple(), old.kind())
                    };
                    Ok(StepOutcome::AliasResult(self.normalize_inner(&old_prime)?))
                }
            }
            Some(Entry::Constant(_)) => Err(EnvError::Internal(
                "constant name passed where a module name was expected".to_string(),
            )),
            Some(Entry::Interface(_) | Entry::TypeAlias(_)) => Err(EnvError::Internal(
                "interface/type-alias name passed where a module name was expected".to_string(),
            )),
            None => Ok(StepOutcome::NoEntry),
        }
    }

    fn raise_cycle(&self, name: &TypeName) -> Result<Option<TypeName>, EnvError> {
        match self.entries.get(name) {
            Some(Entry::ClassAlias(alias) | Entry::ModuleAlias(alias)) => {
                Err(EnvError::CyclicClassAliasDefinition {
                    alias_entry: alias.clone(),
                })
            }
            _ => Err(EnvError::Internal(format!(
                "pending normalization marker for {name:?} but no alias entry is present"
            ))),
        }
    }

    // ---- Introspection (§4.7) -----------------------------------------

    /// Forces every multi-fragment entry to compute its primary fragment,
    /// transitively validating type-parameter compatibility everywhere.
    ///
    /// # Errors
    /// The first [`EnvError::GenericParameterMismatch`] encountered.
    pub fn validate_type_params(&self) -> Result<(), EnvError> {
        for entry in self.entries.values() {
            if let Entry::Class(e) | Entry::Module(e) = entry {
                e.primary()?;
            }
        }
        Ok(())
    }

    /// Groups top-level declarations by their source buffer. Declarations
    /// without a location are silently dropped.
    #[must_use]
    pub fn buffers_decls(&self) -> FxHashMap<Buffer, Vec<Rc<Decl>>> {
        let mut grouped: FxHashMap<Buffer, Vec<Rc<Decl>>> = FxHashMap::default();
        for decl in &self.declarations {
            if let Some(location) = decl.location() {
                grouped.entry(location.buffer).or_default().push(decl.clone());
            }
        }
        grouped
    }

    /// The deduplicated set of source buffers referenced by `declarations`.
    #[must_use]
    pub fn buffers(&self) -> FxHashSet<Buffer> {
        self.declarations
            .iter()
            .filter_map(|d| d.location())
            .map(|l| l.buffer)
            .collect()
    }

    /// A new environment containing exactly the top-level declarations for
    /// which `predicate` is false, obtained by re-inserting them — this
    /// fully re-validates collisions and nesting rather than filtering the
    /// existing tables in place.
    ///
    /// # Errors
    /// Any error re-insertion could raise (shouldn't happen for a predicate
    /// that only removes declarations, but collisions among the *kept* set
    /// are still possible in principle and are surfaced rather than
    /// swallowed).
    pub fn reject(&self, predicate: impl Fn(&Rc<Decl>) -> bool) -> Result<Environment, EnvError> {
        let mut kept = Environment::new();
        for decl in &self.declarations {
            if !predicate(decl) {
                kept.push(decl.clone())?;
            }
        }
        Ok(kept)
    }

    /// Per-table sizes, for debugging.
    #[must_use]
    pub fn table_sizes(&self) -> TableSizes {
        let mut sizes = TableSizes {
            globals: self.globals.len(),
            ..TableSizes::default()
        };
        for entry in self.entries.values() {
            match entry {
                Entry::Class(e) => {
                    sizes.classes += 1;
                    sizes.fragments += e.fragments().len();
                }
                Entry::Module(e) => {
                    sizes.modules += 1;
                    sizes.fragments += e.fragments().len();
                }
                Entry::Interface(_) => sizes.interfaces += 1,
                Entry::TypeAlias(_) => sizes.type_aliases += 1,
                Entry::Constant(_) => sizes.constants += 1,
                Entry::ClassAlias(_) => sizes.class_aliases += 1,
                Entry::ModuleAlias(_) => sizes.module_aliases += 1,
            }
        }
        sizes
    }

    /// The combined non-global entry table, keyed by absolute name.
    #[must_use]
    pub fn entries(&self) -> &FxHashMap<TypeName, Entry> {
        &self.entries
    }

    /// The global table, keyed by absolute name.
    #[must_use]
    pub fn globals(&self) -> &FxHashMap<TypeName, SingleEntry> {
        &self.globals
    }
}

/// Outcome of one step of `normalize_step`, before memo bookkeeping.
enum StepOutcome {
    /// `constant_entry(name)` found nothing at all.
    NoEntry,
    /// `name` is already a canonical class/module entry.
    Canonical(TypeName),
    /// `name` is an alias; this is the (already-recursed) result of
    /// chasing its `old_name`.
    AliasResult(Option<TypeName>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{
        ClassAliasDecl, ClassDecl, ConstantDecl, InterfaceDecl, ModuleAliasDecl, ModuleDecl,
        TypeExpr,
    };
    use ori_ir::{Name, Span};
    use pretty_assertions::assert_eq;

    fn n(local: u32) -> Name {
        Name::new(0, local)
    }

    fn rel(simple: Name, kind: NameKind) -> TypeName {
        TypeName::new(Namespace::empty(), simple, kind)
    }

    fn abs(simple: Name, kind: NameKind) -> TypeName {
        TypeName::root_level(simple, kind)
    }

    fn class(simple: Name) -> Rc<Decl> {
        Rc::new(Decl::Class(ClassDecl {
            name: rel(simple, NameKind::ClassOrModule),
            type_params: vec![],
            super_class: None,
            members: vec![],
            location: None,
        }))
    }

    fn module(simple: Name) -> Rc<Decl> {
        Rc::new(Decl::Module(ModuleDecl {
            name: rel(simple, NameKind::ClassOrModule),
            type_params: vec![],
            self_types: vec![],
            members: vec![],
            location: None,
        }))
    }

    fn class_alias(new_name: Name, old_name: Name) -> Rc<Decl> {
        Rc::new(Decl::ClassAlias(ClassAliasDecl {
            new_name: rel(new_name, NameKind::ClassOrModule),
            old_name: rel(old_name, NameKind::ClassOrModule),
            location: None,
        }))
    }

    fn module_alias(new_name: Name, old_name: Name) -> Rc<Decl> {
        Rc::new(Decl::ModuleAlias(ModuleAliasDecl {
            new_name: rel(new_name, NameKind::ClassOrModule),
            old_name: rel(old_name, NameKind::ClassOrModule),
            location: None,
        }))
    }

    fn interface(simple: Name) -> Rc<Decl> {
        Rc::new(Decl::Interface(InterfaceDecl {
            name: rel(simple, NameKind::Interface),
            type_params: vec![],
            members: vec![],
            location: None,
        }))
    }

    fn constant(simple: Name) -> Rc<Decl> {
        Rc::new(Decl::Constant(ConstantDecl {
            name: rel(simple, NameKind::Constant),
            ty: TypeExpr::Opaque,
            location: None,
        }))
    }

    // ---- insertion & collision rules (§4.1, scenario 5) -----------------

    #[test]
    fn class_then_module_same_name_collides() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        let err = env.push(module(n(1))).unwrap_err();
        match err {
            EnvError::DuplicatedDeclaration { name, .. } => {
                assert_eq!(name, abs(n(1), NameKind::ClassOrModule));
            }
            other => panic!("expected DuplicatedDeclaration, got {other:?}"),
        }
    }

    #[test]
    fn reopening_a_class_appends_a_fragment_instead_of_colliding() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        env.push(class(n(1))).unwrap();
        match env.entries().get(&abs(n(1), NameKind::ClassOrModule)) {
            Some(Entry::Class(e)) => assert_eq!(e.fragments().len(), 2),
            other => panic!("expected a 2-fragment class entry, got {other:?}"),
        }
    }

    #[test]
    fn interface_then_constant_at_same_name_collides() {
        let mut env = Environment::new();
        env.push(interface(n(1))).unwrap();
        let err = env.push(constant(n(1))).unwrap_err();
        assert!(matches!(err, EnvError::DuplicatedDeclaration { .. }));
    }

    #[test]
    fn duplicate_interface_raises_uniformly() {
        // Open Question 1: every insertion path raises, none silently
        // overwrites.
        let mut env = Environment::new();
        env.push(interface(n(1))).unwrap();
        let err = env.push(interface(n(1))).unwrap_err();
        assert!(matches!(err, EnvError::DuplicatedDeclaration { .. }));
    }

    #[test]
    fn globals_live_in_their_own_namespace() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        let global = Rc::new(Decl::Global(crate::decl::GlobalDecl {
            name: rel(n(1), NameKind::Global),
            ty: TypeExpr::Opaque,
            location: None,
        }));
        // A global at the same simple name as a class does not collide:
        // invariant 2 only binds the non-global tables together.
        assert!(env.push(global).is_ok());
    }

    // ---- module reopening & type-parameter validation (scenario 2) -----

    fn module_with_params(simple: Name, params: Vec<crate::decl::TypeParam>) -> Rc<Decl> {
        Rc::new(Decl::Module(ModuleDecl {
            name: rel(simple, NameKind::ClassOrModule),
            type_params: params,
            self_types: vec![],
            members: vec![],
            location: None,
        }))
    }

    fn invariant_param(name: Name) -> crate::decl::TypeParam {
        crate::decl::TypeParam {
            name,
            variance: crate::decl::Variance::Invariant,
            upper_bound: None,
            unchecked: false,
        }
    }

    #[test]
    fn reopened_module_with_matching_params_validates() {
        let t = n(2);
        let mut env = Environment::new();
        env.push(module_with_params(n(1), vec![invariant_param(t)]))
            .unwrap();
        env.push(module_with_params(n(1), vec![invariant_param(t)]))
            .unwrap();
        assert!(env.validate_type_params().is_ok());
        match env.entries().get(&abs(n(1), NameKind::ClassOrModule)) {
            Some(Entry::Module(e)) => assert_eq!(e.fragments().len(), 2),
            other => panic!("expected a 2-fragment module entry, got {other:?}"),
        }
    }

    #[test]
    fn reopened_module_with_mismatched_arity_fails_validation() {
        let t = n(2);
        let u = n(3);
        let mut env = Environment::new();
        env.push(module_with_params(n(1), vec![invariant_param(t)]))
            .unwrap();
        env.push(module_with_params(n(1), vec![invariant_param(t), invariant_param(u)]))
            .unwrap();
        assert!(matches!(
            env.validate_type_params(),
            Err(EnvError::GenericParameterMismatch { .. })
        ));
    }

    // ---- alias normalization (§4.4, scenarios 3 & 4) --------------------

    #[test]
    fn normalize_non_alias_class_is_itself() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        let resolved = env
            .normalize_module_name(&rel(n(1), NameKind::ClassOrModule))
            .unwrap();
        assert_eq!(resolved, abs(n(1), NameKind::ClassOrModule));
    }

    #[test]
    fn alias_chain_normalizes_to_the_concrete_class() {
        let x = n(1);
        let y = n(2);
        let z = n(3);
        let mut env = Environment::new();
        env.push(class(x)).unwrap();
        env.push(class_alias(y, x)).unwrap();
        env.push(class_alias(z, y)).unwrap();

        let resolved = env
            .normalize_module_name(&rel(z, NameKind::ClassOrModule))
            .unwrap();
        assert_eq!(resolved, abs(x, NameKind::ClassOrModule));
    }

    #[test]
    fn alias_normalization_is_idempotent() {
        let x = n(1);
        let y = n(2);
        let mut env = Environment::new();
        env.push(class(x)).unwrap();
        env.push(class_alias(y, x)).unwrap();

        let name = rel(y, NameKind::ClassOrModule);
        let first = env.normalize_module_name(&name).unwrap();
        let second = env.normalize_module_name(&first).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn module_alias_chain_works_the_same_way_as_class_alias() {
        let x = n(1);
        let y = n(2);
        let mut env = Environment::new();
        env.push(module(x)).unwrap();
        env.push(module_alias(y, x)).unwrap();
        let resolved = env
            .normalize_module_name(&rel(y, NameKind::ClassOrModule))
            .unwrap();
        assert_eq!(resolved, abs(x, NameKind::ClassOrModule));
    }

    #[test]
    fn cyclic_alias_is_reported_at_the_entry_the_cycle_closes_on() {
        let a = n(1);
        let b = n(2);
        let mut env = Environment::new();
        env.push(class_alias(a, b)).unwrap();
        env.push(class_alias(b, a)).unwrap();

        let err = env
            .normalize_module_name_opt(&rel(a, NameKind::ClassOrModule))
            .unwrap_err();
        match err {
            EnvError::CyclicClassAliasDefinition { alias_entry } => {
                assert_eq!(alias_entry.name, abs(a, NameKind::ClassOrModule));
            }
            other => panic!("expected CyclicClassAliasDefinition, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_alias_target_normalizes_to_none() {
        let y = n(2);
        let ghost = n(99);
        let mut env = Environment::new();
        env.push(class_alias(y, ghost)).unwrap();
        assert_eq!(
            env.normalize_module_name_opt(&rel(y, NameKind::ClassOrModule))
                .unwrap(),
            None
        );
    }

    #[test]
    fn normalize_on_non_class_module_name_is_a_programmer_error() {
        let env = Environment::new();
        let err = env
            .normalize_module_name_opt(&rel(n(1), NameKind::Constant))
            .unwrap_err();
        assert!(matches!(err, EnvError::Internal(_)));
    }

    // ---- lookup surface (§4.3) ------------------------------------------

    #[test]
    fn lookup_predicates_distinguish_kinds() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        env.push(interface(n(2))).unwrap();
        env.push(class_alias(n(3), n(1))).unwrap();

        let cls = abs(n(1), NameKind::ClassOrModule);
        let iface = abs(n(2), NameKind::Interface);
        let alias = abs(n(3), NameKind::ClassOrModule);

        assert!(env.class_decl(&cls));
        assert!(!env.module_decl(&cls));
        assert!(env.module_name(&cls));
        assert!(env.constant_name(&cls));

        assert!(env.interface_name(&iface));
        assert!(env.type_name(&iface));
        assert!(!env.module_name(&iface));

        assert!(env.class_alias(&alias));
        assert!(!env.class_decl(&alias));
        assert!(env.module_name(&alias));
        assert!(env.class_entry(&alias).is_some());
    }

    // ---- introspection (§4.7) -------------------------------------------

    #[test]
    fn reject_false_preserves_every_declaration() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        env.push(interface(n(2))).unwrap();
        let kept = env.reject(|_| false).unwrap();
        assert_eq!(kept.declarations().len(), env.declarations().len());
    }

    #[test]
    fn reject_true_removes_everything() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        let kept = env.reject(|_| true).unwrap();
        assert!(kept.declarations().is_empty());
    }

    #[test]
    fn reject_drops_only_the_matching_declarations_and_revalidates() {
        let mut env = Environment::new();
        let keep = class(n(1));
        let drop = class(n(2));
        env.push(keep.clone()).unwrap();
        env.push(drop.clone()).unwrap();
        let kept = env.reject(|d| Rc::ptr_eq(d, &drop)).unwrap();
        assert_eq!(kept.declarations().len(), 1);
        assert!(kept.class_decl(&abs(n(1), NameKind::ClassOrModule)));
        assert!(!kept.class_decl(&abs(n(2), NameKind::ClassOrModule)));
    }

    #[test]
    fn buffers_decls_drops_declarations_without_a_location() {
        let mut env = Environment::new();
        let buf = Buffer(n(100));
        let located = Rc::new(Decl::Class(ClassDecl {
            name: rel(n(1), NameKind::ClassOrModule),
            type_params: vec![],
            super_class: None,
            members: vec![],
            location: Some(crate::decl::Location {
                buffer: buf,
                span: Span::new(0, 1),
            }),
        }));
        env.push(located).unwrap();
        env.push(class(n(2))).unwrap(); // no location

        let grouped = env.buffers_decls();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get(&buf).map(Vec::len), Some(1));
        assert_eq!(env.buffers().len(), 1);
    }

    #[test]
    fn table_sizes_counts_fragments_and_entries_separately() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        env.push(class(n(1))).unwrap(); // reopened: same entry, 2 fragments
        env.push(interface(n(2))).unwrap();
        env.push(constant(n(3))).unwrap();

        let sizes = env.table_sizes();
        assert_eq!(sizes.classes, 1);
        assert_eq!(sizes.fragments, 2);
        assert_eq!(sizes.interfaces, 1);
        assert_eq!(sizes.constants, 1);
    }

    #[test]
    fn clone_shares_declarations_but_not_the_normalization_memo() {
        let mut env = Environment::new();
        env.push(class(n(1))).unwrap();
        env.push(class_alias(n(2), n(1))).unwrap();
        env.normalize_module_name(&rel(n(2), NameKind::ClassOrModule))
            .unwrap();

        let cloned = env.clone();
        assert_eq!(cloned.declarations().len(), env.declarations().len());
        // The memo is derived state; a fresh clone still answers correctly
        // even though it starts with an empty cache.
        assert_eq!(
            cloned
                .normalize_module_name(&rel(n(2), NameKind::ClassOrModule))
                .unwrap(),
            abs(n(1), NameKind::ClassOrModule)
        );
    }
}
