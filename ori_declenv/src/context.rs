//! Lexical nesting context, as consumed by the external [`NameResolver`](crate::resolver::NameResolver).

use std::rc::Rc;

use crate::decl::Decl;
use crate::name::Namespace;
use crate::name::TypeName;

/// One link in the context cons-list: the enclosing context, paired with
/// the innermost absolute class/module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextNode {
    pub parent: Context,
    pub name: TypeName,
}

/// A right-recursive cons-list of absolute class/module names, or the root
/// sentinel (`None`) at the top level. Cheap to clone and share across
/// sibling members since each link is an `Rc`.
pub type Context = Option<Rc<ContextNode>>;

/// `calculate_context([d1, .., dn])` per §4.5: starting from the root
/// sentinel, each step appends the next declaration's name to the running
/// absolute name and pairs the old context with the new absolute name.
///
/// The empty sequence yields `None` (top level).
#[must_use]
pub fn calculate_context(path: &[Rc<Decl>]) -> Context {
    let mut ctx: Context = None;
    let mut prefix = Namespace::root();
    for decl in path {
        let name = decl.name().with_prefix(&prefix);
        prefix = name.to_namespace();
        ctx = Some(Rc::new(ContextNode { parent: ctx, name }));
    }
    ctx
}
