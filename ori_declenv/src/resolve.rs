//! The resolution pass: a pure transformation producing a new environment
//! whose type-name occurrences are all absolute (§4.6).

use std::rc::Rc;

use crate::context::{calculate_context, Context};
use crate::decl::{
    ClassAliasDecl, ClassDecl, ConstantDecl, Decl, GlobalDecl, InterfaceDecl, Member,
    ModuleAliasDecl, ModuleDecl, SuperClassRef, TypeAliasDecl, TypeExpr, TypeParam,
};
use crate::environment::Environment;
use crate::error::EnvError;
use crate::name::Namespace;
use crate::resolver::NameResolver;

/// `resolve_type_names(only?)` — produce a new environment whose
/// declarations are structurally identical to `env`'s except that every
/// type-name occurrence is replaced by its absolute form, per the supplied
/// resolver.
///
/// When `only` is supplied, declarations not identical (by `Rc` pointer,
/// per §9's AST-node-identity convention) to one of its entries are copied
/// over unresolved.
///
/// Never mutates `env`; always builds and returns a new one.
///
/// # Errors
/// Propagates any error re-insertion into the new environment could raise.
/// In practice this should not happen for a structurally faithful
/// transformation of an environment that was itself successfully built.
pub fn resolve_type_names(
    env: &Environment,
    resolver: &dyn NameResolver,
    only: Option<&[Rc<Decl>]>,
) -> Result<Environment, EnvError> {
    let mut resolved_env = Environment::new();
    let root = Namespace::root();
    for decl in env.declarations() {
        let included = match only {
            None => true,
            Some(set) => set.iter().any(|candidate| Rc::ptr_eq(candidate, decl)),
        };
        if included {
            let resolved = resolve_declaration(decl, &[], &root, resolver);
            resolved_env.push(Rc::new(resolved))?;
        } else {
            resolved_env.push(decl.clone())?;
        }
    }
    Ok(resolved_env)
}

/// Dispatches on declaration kind, threading `(outer, prefix, context)`
/// through nested declarations and members as described in §4.6.
fn resolve_declaration(
    decl: &Rc<Decl>,
    outer: &[Rc<Decl>],
    prefix: &Namespace,
    resolver: &dyn NameResolver,
) -> Decl {
    match decl.as_ref() {
        Decl::Global(d) => Decl::Global(GlobalDecl {
            name: d.name.with_prefix(prefix),
            ty: absolute_type(&d.ty, &None, resolver),
            location: d.location,
        }),
        Decl::Class(d) => {
            let outer_context = calculate_context(outer);
            let mut inner_path = outer.to_vec();
            inner_path.push(decl.clone());
            let inner_context = calculate_context(&inner_path);
            let new_name = d.name.with_prefix(prefix);
            let prefix_prime = new_name.to_namespace();
            let outer_prime = inner_path;

            Decl::Class(ClassDecl {
                name: new_name,
                type_params: resolve_type_params(&d.type_params, &inner_context, resolver),
                super_class: d.super_class.as_ref().map(|s| SuperClassRef {
                    name: resolver
                        .resolve(&s.name, &outer_context)
                        .unwrap_or_else(|| s.name.clone()),
                    args: s
                        .args
                        .iter()
                        .map(|a| absolute_type(a, &outer_context, resolver))
                        .collect(),
                }),
                members: d
                    .members
                    .iter()
                    .map(|m| resolve_member(m, &inner_context, &outer_prime, &prefix_prime, resolver))
                    .collect(),
                location: d.location,
            })
        }
        Decl::Module(d) => {
            let mut inner_path = outer.to_vec();
            inner_path.push(decl.clone());
            let inner_context = calculate_context(&inner_path);
            let new_name = d.name.with_prefix(prefix);
            let prefix_prime = new_name.to_namespace();
            let outer_prime = inner_path;

            Decl::Module(ModuleDecl {
                name: new_name,
                type_params: resolve_type_params(&d.type_params, &inner_context, resolver),
                self_types: d
                    .self_types
                    .iter()
                    .map(|t| absolute_type(t, &inner_context, resolver))
                    .collect(),
                members: d
                    .members
                    .iter()
                    .map(|m| resolve_member(m, &inner_context, &outer_prime, &prefix_prime, resolver))
                    .collect(),
                location: d.location,
            })
        }
        Decl::Interface(d) => {
            let outer_context = calculate_context(outer);
            Decl::Interface(InterfaceDecl {
                name: d.name.with_prefix(prefix),
                type_params: resolve_type_params(&d.type_params, &outer_context, resolver),
                members: d
                    .members
                    .iter()
                    .map(|m| resolve_member(m, &outer_context, outer, prefix, resolver))
                    .collect(),
                location: d.location,
            })
        }
        Decl::TypeAlias(d) => {
            let outer_context = calculate_context(outer);
            Decl::TypeAlias(TypeAliasDecl {
                name: d.name.with_prefix(prefix),
                type_params: resolve_type_params(&d.type_params, &outer_context, resolver),
                ty: absolute_type(&d.ty, &outer_context, resolver),
                location: d.location,
            })
        }
        Decl::Constant(d) => {
            let outer_context = calculate_context(outer);
            Decl::Constant(ConstantDecl {
                name: d.name.with_prefix(prefix),
                ty: absolute_type(&d.ty, &outer_context, resolver),
                location: d.location,
            })
        }
        Decl::ClassAlias(d) => {
            let outer_context = calculate_context(outer);
            Decl::ClassAlias(ClassAliasDecl {
                new_name: d.new_name.with_prefix(prefix),
                old_name: resolver
                    .resolve(&d.old_name, &outer_context)
                    .unwrap_or_else(|| d.old_name.clone()),
                location: d.location,
            })
        }
        Decl::ModuleAlias(d) => {
            let outer_context = calculate_context(outer);
            Decl::ModuleAlias(ModuleAliasDecl {
                new_name: d.new_name.with_prefix(prefix),
                old_name: resolver
                    .resolve(&d.old_name, &outer_context)
                    .unwrap_or_else(|| d.old_name.clone()),
                location: d.location,
            })
        }
    }
}

fn resolve_member(
    member: &Member,
    context: &Context,
    outer: &[Rc<Decl>],
    prefix: &Namespace,
    resolver: &dyn NameResolver,
) -> Member {
    match member {
        Member::Method {
            name,
            overloads,
            location,
        } => Member::Method {
            name: *name,
            location: *location,
            overloads: overloads
                .iter()
                .map(|o| crate::decl::MethodOverload {
                    type_params: resolve_type_params(&o.type_params, context, resolver),
                    params: o
                        .params
                        .iter()
                        .map(|p| absolute_type(p, context, resolver))
                        .collect(),
                    return_type: absolute_type(&o.return_type, context, resolver),
                })
                .collect(),
        },
        Member::AttrReader { name, ty, location } => Member::AttrReader {
            name: *name,
            ty: absolute_type(ty, context, resolver),
            location: *location,
        },
        Member::AttrWriter { name, ty, location } => Member::AttrWriter {
            name: *name,
            ty: absolute_type(ty, context, resolver),
            location: *location,
        },
        Member::AttrAccessor { name, ty, location } => Member::AttrAccessor {
            name: *name,
            ty: absolute_type(ty, context, resolver),
            location: *location,
        },
        Member::InstanceVariable { name, ty } => Member::InstanceVariable {
            name: *name,
            ty: absolute_type(ty, context, resolver),
        },
        Member::ClassVariable { name, ty } => Member::ClassVariable {
            name: *name,
            ty: absolute_type(ty, context, resolver),
        },
        Member::ClassInstanceVariable { name, ty } => Member::ClassInstanceVariable {
            name: *name,
            ty: absolute_type(ty, context, resolver),
        },
        Member::Mixin { kind, name, args } => Member::Mixin {
            kind: *kind,
            name: resolver.resolve(name, context).unwrap_or_else(|| name.clone()),
            args: args.iter().map(|a| absolute_type(a, context, resolver)).collect(),
        },
        Member::Nested(nested) => Member::Nested(Rc::new(resolve_declaration(
            nested, outer, prefix, resolver,
        ))),
    }
}

fn resolve_type_params(
    params: &[TypeParam],
    context: &Context,
    resolver: &dyn NameResolver,
) -> Vec<TypeParam> {
    params
        .iter()
        .map(|p| TypeParam {
            name: p.name,
            variance: p.variance,
            unchecked: p.unchecked,
            upper_bound: p
                .upper_bound
                .as_ref()
                .map(|b| absolute_type(b, context, resolver)),
        })
        .collect()
}

/// `absolute_type(type)` — walk a type expression, replacing any embedded
/// type-name with the resolver's result; if the resolver returns nothing,
/// the original name is kept so downstream diagnostics can pinpoint the
/// failure (the pass itself never raises on an unresolved name).
fn absolute_type(ty: &TypeExpr, context: &Context, resolver: &dyn NameResolver) -> TypeExpr {
    ty.map_names(&mut |name| resolver.resolve(name, context).unwrap_or_else(|| name.clone()))
}
