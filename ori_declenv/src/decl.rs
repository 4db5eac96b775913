//! Declaration AST: the concrete node types the environment walks.
//!
//! These are deliberately plain — keyword-ish constructors, no behavior
//! beyond simple accessors — since parsing and AST construction are external
//! collaborators. A real toolchain would hand these in from a parser crate;
//! here they are the stand-ins that make the environment buildable and
//! testable on its own.

use std::rc::Rc;

use ori_ir::{Name, Span};

use crate::name::TypeName;

/// `Buffer` — an interned source identifier (e.g. a file path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Buffer(pub Name);

/// A location: which buffer, and the span within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub buffer: Buffer,
    pub span: Span,
}

/// Declare-site variance annotation for a type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

/// A single type parameter on a class, module, interface, or type alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParam {
    pub name: Name,
    pub variance: Variance,
    /// Upper bound, if any (`T < Bound`).
    pub upper_bound: Option<TypeExpr>,
    pub unchecked: bool,
}

/// A type expression: either a plain reference to a (possibly relative) type
/// name with type arguments, a tuple, or an optional/union-ish leaf.
///
/// Kept intentionally small — the resolution pass only needs to find and
/// rewrite embedded `TypeName` occurrences, not reason about the full
/// richness of a signature language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A reference to a type name with type arguments (possibly empty).
    Named { name: TypeName, args: Vec<TypeExpr> },
    /// `self`-type reference (module self-types, `self` return annotations).
    SelfType,
    /// A tuple of type expressions.
    Tuple(Vec<TypeExpr>),
    /// Anything opaque to this crate (literals, `void`, `untyped`, unions,
    /// etc.) that carries no embedded type name to rewrite.
    Opaque,
}

impl TypeExpr {
    /// Visit every `TypeName` embedded in this expression, depth-first.
    pub fn for_each_name<'a>(&'a self, f: &mut impl FnMut(&'a TypeName)) {
        match self {
            TypeExpr::Named { name, args } => {
                f(name);
                for arg in args {
                    arg.for_each_name(f);
                }
            }
            TypeExpr::Tuple(items) => {
                for item in items {
                    item.for_each_name(f);
                }
            }
            TypeExpr::SelfType | TypeExpr::Opaque => {}
        }
    }

    /// Rewrite every embedded `TypeName` via `f`, returning a new expression.
    #[must_use]
    pub fn map_names(&self, f: &mut impl FnMut(&TypeName) -> TypeName) -> TypeExpr {
        match self {
            TypeExpr::Named { name, args } => TypeExpr::Named {
                name: f(name),
                args: args.iter().map(|a| a.map_names(f)).collect(),
            },
            TypeExpr::Tuple(items) => {
                TypeExpr::Tuple(items.iter().map(|i| i.map_names(f)).collect())
            }
            TypeExpr::SelfType => TypeExpr::SelfType,
            TypeExpr::Opaque => TypeExpr::Opaque,
        }
    }
}

/// A reference to a super class: name plus type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuperClassRef {
    pub name: TypeName,
    pub args: Vec<TypeExpr>,
}

/// One overload of a method definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodOverload {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<TypeExpr>,
    pub return_type: TypeExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixinKind {
    Include,
    Extend,
    Prepend,
}

/// A member of a class or module body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Method {
        name: Name,
        overloads: Vec<MethodOverload>,
        location: Option<Location>,
    },
    AttrReader {
        name: Name,
        ty: TypeExpr,
        location: Option<Location>,
    },
    AttrWriter {
        name: Name,
        ty: TypeExpr,
        location: Option<Location>,
    },
    AttrAccessor {
        name: Name,
        ty: TypeExpr,
        location: Option<Location>,
    },
    InstanceVariable {
        name: Name,
        ty: TypeExpr,
    },
    ClassVariable {
        name: Name,
        ty: TypeExpr,
    },
    ClassInstanceVariable {
        name: Name,
        ty: TypeExpr,
    },
    Mixin {
        kind: MixinKind,
        name: TypeName,
        args: Vec<TypeExpr>,
    },
    /// A declaration nested inside this class/module body.
    Nested(Rc<Decl>),
}

impl Member {
    /// Rewrite every embedded type expression's names via `f`. Nested
    /// declarations are left untouched — the resolution pass walks those
    /// separately via its own recursion so it can thread the right context.
    #[must_use]
    pub fn map_type_names(&self, f: &mut impl FnMut(&TypeExpr) -> TypeExpr) -> Member {
        match self {
            Member::Method {
                name,
                overloads,
                location,
            } => Member::Method {
                name: *name,
                location: *location,
                overloads: overloads
                    .iter()
                    .map(|o| MethodOverload {
                        type_params: o.type_params.clone(),
                        params: o.params.iter().map(f).collect(),
                        return_type: f(&o.return_type),
                    })
                    .collect(),
            },
            Member::AttrReader { name, ty, location } => Member::AttrReader {
                name: *name,
                ty: f(ty),
                location: *location,
            },
            Member::AttrWriter { name, ty, location } => Member::AttrWriter {
                name: *name,
                ty: f(ty),
                location: *location,
            },
            Member::AttrAccessor { name, ty, location } => Member::AttrAccessor {
                name: *name,
                ty: f(ty),
                location: *location,
            },
            Member::InstanceVariable { name, ty } => Member::InstanceVariable {
                name: *name,
                ty: f(ty),
            },
            Member::ClassVariable { name, ty } => Member::ClassVariable {
                name: *name,
                ty: f(ty),
            },
            Member::ClassInstanceVariable { name, ty } => Member::ClassInstanceVariable {
                name: *name,
                ty: f(ty),
            },
            Member::Mixin { kind, name, args } => Member::Mixin {
                kind: *kind,
                name: name.clone(),
                args: args.iter().map(f).collect(),
            },
            Member::Nested(decl) => Member::Nested(decl.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub super_class: Option<SuperClassRef>,
    pub members: Vec<Member>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub self_types: Vec<TypeExpr>,
    pub members: Vec<Member>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub members: Vec<Member>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeAliasDecl {
    pub name: TypeName,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeExpr,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantDecl {
    pub name: TypeName,
    pub ty: TypeExpr,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalDecl {
    pub name: TypeName,
    pub ty: TypeExpr,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassAliasDecl {
    pub new_name: TypeName,
    /// May be relative; recorded verbatim.
    pub old_name: TypeName,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleAliasDecl {
    pub new_name: TypeName,
    pub old_name: TypeName,
    pub location: Option<Location>,
}

/// Top-level declaration fragment, opaque to this crate except for its own
/// shape. One of eight variants, matching §3 of the declaration model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decl {
    Class(ClassDecl),
    Module(ModuleDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Constant(ConstantDecl),
    Global(GlobalDecl),
    ClassAlias(ClassAliasDecl),
    ModuleAlias(ModuleAliasDecl),
}

impl Decl {
    /// The name this declaration introduces (not yet prefixed with an
    /// enclosing namespace).
    #[must_use]
    pub fn name(&self) -> &TypeName {
        match self {
            Decl::Class(d) => &d.name,
            Decl::Module(d) => &d.name,
            Decl::Interface(d) => &d.name,
            Decl::TypeAlias(d) => &d.name,
            Decl::Constant(d) => &d.name,
            Decl::Global(d) => &d.name,
            Decl::ClassAlias(d) => &d.new_name,
            Decl::ModuleAlias(d) => &d.new_name,
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Decl::Class(d) => d.location,
            Decl::Module(d) => d.location,
            Decl::Interface(d) => d.location,
            Decl::TypeAlias(d) => d.location,
            Decl::Constant(d) => d.location,
            Decl::Global(d) => d.location,
            Decl::ClassAlias(d) => d.location,
            Decl::ModuleAlias(d) => d.location,
        }
    }

    #[must_use]
    pub fn type_params(&self) -> &[TypeParam] {
        match self {
            Decl::Class(d) => &d.type_params,
            Decl::Module(d) => &d.type_params,
            Decl::Interface(d) => &d.type_params,
            Decl::TypeAlias(d) => &d.type_params,
            Decl::Constant(_)
            | Decl::Global(_)
            | Decl::ClassAlias(_)
            | Decl::ModuleAlias(_) => &[],
        }
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        match self {
            Decl::Class(d) => &d.members,
            Decl::Module(d) => &d.members,
            Decl::Interface(d) => &d.members,
            _ => &[],
        }
    }
}
