//! Error taxonomy for the declaration environment.
//!
//! Plain enum with hand-written `Display`/`Error` impls, matching the rest
//! of the workspace's error types rather than reaching for a derive macro.

use std::fmt;
use std::rc::Rc;

use crate::decl::Decl;
use crate::entry::AliasEntry;
use crate::name::TypeName;

/// Errors raised by the declaration environment.
///
/// All variants are raised synchronously; see §7 for how callers are
/// expected to react (insertion failures leave the environment partially
/// populated, normalization failures may leave `Pending` memo entries that
/// this crate is responsible for clearing before returning).
#[derive(Debug, Clone)]
pub enum EnvError {
    /// An insertion collided with an existing entry at the same name.
    DuplicatedDeclaration {
        name: TypeName,
        new_decl: Rc<Decl>,
        existing_decls: Vec<Rc<Decl>>,
    },
    /// A later fragment of a multi-fragment entry disagreed with the
    /// primary fragment on type-parameter arity, bounds, or variance.
    GenericParameterMismatch {
        name: TypeName,
        offending_decl: Rc<Decl>,
    },
    /// A class/module alias chain closed on itself.
    CyclicClassAliasDefinition { alias_entry: AliasEntry },
    /// A precondition was violated by the caller, or the environment's own
    /// invariants were found broken (programmer error, not user error).
    Internal(String),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::DuplicatedDeclaration {
                name,
                existing_decls,
                ..
            } => write!(
                f,
                "duplicated declaration at {name:?}: {} existing declaration(s) already occupy this name",
                existing_decls.len()
            ),
            EnvError::GenericParameterMismatch { name, .. } => write!(
                f,
                "generic parameter mismatch in a fragment of {name:?}: type parameters do not agree with the primary fragment"
            ),
            EnvError::CyclicClassAliasDefinition { alias_entry } => write!(
                f,
                "cyclic class/module alias definition closing at {:?}",
                alias_entry.name
            ),
            EnvError::Internal(msg) => write!(f, "internal declaration environment error: {msg}"),
        }
    }
}

impl std::error::Error for EnvError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ClassAliasDecl, ClassDecl};
    use crate::entry::AliasKind;
    use crate::name::{NameKind, Namespace};
    use ori_ir::Name;

    fn name(local: u32) -> TypeName {
        TypeName::new(Namespace::root(), Name::new(0, local), NameKind::ClassOrModule)
    }

    fn class_decl(local: u32) -> Rc<Decl> {
        Rc::new(Decl::Class(ClassDecl {
            name: name(local),
            type_params: vec![],
            super_class: None,
            members: vec![],
            location: None,
        }))
    }

    #[test]
    fn duplicated_declaration_display_mentions_the_name() {
        let err = EnvError::DuplicatedDeclaration {
            name: name(1),
            new_decl: class_decl(1),
            existing_decls: vec![class_decl(1)],
        };
        assert!(format!("{err}").contains("duplicated declaration"));
    }

    #[test]
    fn cyclic_alias_display_mentions_the_closing_entry() {
        let alias_decl = Rc::new(Decl::ClassAlias(ClassAliasDecl {
            new_name: name(1),
            old_name: name(2),
            location: None,
        }));
        let err = EnvError::CyclicClassAliasDefinition {
            alias_entry: AliasEntry {
                name: name(1),
                decl: alias_decl,
                outer: vec![],
                kind: AliasKind::Class,
            },
        };
        assert!(format!("{err}").contains("cyclic"));
    }
}
