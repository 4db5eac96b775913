//! External collaborators the environment calls but does not implement:
//! the name resolver consulted during [`crate::environment::Environment::resolve_type_names`],
//! and the loader that feeds declarations in.

use std::rc::Rc;

use crate::context::Context;
use crate::decl::Decl;
use crate::environment::Environment;
use crate::name::TypeName;

/// Given a type name and a lexical context, returns the absolute name it
/// denotes, or `None` if lookup fails.
///
/// Implementations are free to be stateful (e.g. backed by the environment
/// itself plus an inheritance-aware search), but must be deterministic for
/// a fixed `(type_name, context)` pair within a single resolution pass —
/// `resolve_type_names` calls this repeatedly and does not cache results
/// itself.
pub trait NameResolver {
    fn resolve(&self, type_name: &TypeName, context: &Context) -> Option<TypeName>;
}

/// Pushes declarations into an environment via repeated `insert`.
pub trait Loader {
    fn load(&self, env: &mut Environment);
}

/// A resolver that only ever returns the name unchanged, coerced to
/// absolute. Useful for tests that don't care about resolution fidelity,
/// and as a minimal, always-available fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl NameResolver for IdentityResolver {
    fn resolve(&self, type_name: &TypeName, _context: &Context) -> Option<TypeName> {
        Some(type_name.absolute())
    }
}

/// A loader that simply replays a fixed list of top-level declarations.
#[derive(Debug, Default, Clone)]
pub struct DeclList(pub Vec<Rc<Decl>>);

impl Loader for DeclList {
    fn load(&self, env: &mut Environment) {
        for decl in &self.0 {
            // Errors from a fixed test fixture are a programmer error, not
            // something `load` can meaningfully recover from.
            env.push(decl.clone())
                .unwrap_or_else(|e| panic!("{e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ClassDecl;
    use crate::name::{NameKind, Namespace};

    #[test]
    fn identity_resolver_always_returns_an_absolute_name() {
        let relative = TypeName::new(Namespace::empty(), ori_ir::Name::new(0, 1), NameKind::ClassOrModule);
        let resolved = IdentityResolver.resolve(&relative, &None).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn from_loader_replays_the_fixed_declaration_list() {
        let decl = Rc::new(Decl::Class(ClassDecl {
            name: TypeName::new(Namespace::empty(), ori_ir::Name::new(0, 1), NameKind::ClassOrModule),
            type_params: vec![],
            super_class: None,
            members: vec![],
            location: None,
        }));
        let loader = DeclList(vec![decl]);
        let env = Environment::from_loader(&loader);
        assert_eq!(env.declarations().len(), 1);
    }
}
