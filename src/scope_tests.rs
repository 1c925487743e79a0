//! Resolution behavior of the scope model: locality, the unresolved
//! marker, and outer-access classification.

#[cfg(test)]
mod tests {
    use crate::ir::{
        BlockNode, ClassDeclNode, CompilationUnit, FieldDeclNode, ImportDecl, MethodDeclNode,
        NewInstanceNode, SourcePosition, SyntaxNode, TypeInfo, TypeRegistry,
    };
    use crate::scope::{ScopeArena, ScopeBuilder, ScopeKind, TypeMembers};
    use std::sync::Arc;

    fn pos() -> SourcePosition {
        SourcePosition { line: 1, column: 1 }
    }

    fn names(list: &[&str]) -> std::collections::HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Resolution over a hand-built arena
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn innermost_declaration_wins_without_parent_lookup() {
        let mut arena = ScopeArena::new();
        let root = arena.push(
            "root",
            None,
            ScopeKind::FullyQualified {
                facts: Arc::new(TypeRegistry::new()),
            },
        );
        let type_scope = arena.push(
            "type T",
            Some(root),
            ScopeKind::Type(TypeMembers {
                type_name: "demo.T".to_string(),
                fields: names(&["x"]),
                ..TypeMembers::default()
            }),
        );
        let block = arena.push(
            "block",
            Some(type_scope),
            ScopeKind::Variable {
                variables: names(&["x"]),
            },
        );

        // `x` is declared both locally and on the type; the local wins
        // and no type-scope classification happens.
        let resolved = arena.resolve_identifier(block, pos(), "x");
        assert_eq!(resolved.defining_scope(), Some(block));
        assert_eq!(resolved.qualified(), Some("x"));
        assert!(!resolved.is_outer_access());
    }

    #[test]
    fn absent_name_yields_unresolved_marker() {
        let mut arena = ScopeArena::new();
        let root = arena.push(
            "root",
            None,
            ScopeKind::FullyQualified {
                facts: Arc::new(TypeRegistry::new()),
            },
        );
        let block = arena.push(
            "block",
            Some(root),
            ScopeKind::Variable {
                variables: names(&["x"]),
            },
        );

        assert!(!arena.resolve_identifier(block, pos(), "ghost").is_resolved());
        assert!(!arena.resolve_type(block, pos(), "Ghost").is_resolved());
        // The identifier namespace never answers method queries.
        assert!(!arena.resolve_method(block, pos(), "x").is_resolved());
    }

    #[test]
    fn this_scope_predicate_matches_type_variants_only() {
        let mut arena = ScopeArena::new();
        let root = arena.push(
            "root",
            None,
            ScopeKind::FullyQualified {
                facts: Arc::new(TypeRegistry::new()),
            },
        );
        let members = TypeMembers {
            type_name: "demo.T".to_string(),
            ..TypeMembers::default()
        };
        let type_scope = arena.push("type T", Some(root), ScopeKind::Type(members.clone()));
        let parent_type = arena.push(
            "parent-type T",
            Some(type_scope),
            ScopeKind::ParentType(members),
        );
        let block = arena.push(
            "block",
            Some(parent_type),
            ScopeKind::Variable {
                variables: names(&[]),
            },
        );

        assert!(arena.scope(type_scope).kind.is_this_scope());
        assert!(arena.scope(parent_type).kind.is_this_scope());
        assert!(!arena.scope(root).kind.is_this_scope());
        assert!(!arena.scope(block).kind.is_this_scope());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Builder-produced trees
    // ═══════════════════════════════════════════════════════════════════════════

    /// class Outer { count; m() { … new Widget() { run() { … } } … } }
    fn outer_unit() -> CompilationUnit {
        let run = SyntaxNode::MethodDecl(MethodDeclNode {
            id: 5,
            name: "run".to_string(),
            is_static: false,
            params: vec![],
            body: Some(Box::new(SyntaxNode::Block(BlockNode {
                id: 6,
                statements: vec![],
                pos: pos(),
            }))),
            pos: pos(),
        });
        let anon = SyntaxNode::NewInstance(NewInstanceNode {
            id: 4,
            type_name: "demo.Widget".to_string(),
            args: vec![],
            body: Some(vec![run]),
            pos: pos(),
        });
        let method = SyntaxNode::MethodDecl(MethodDeclNode {
            id: 2,
            name: "m".to_string(),
            is_static: false,
            params: vec![],
            body: Some(Box::new(SyntaxNode::Block(BlockNode {
                id: 3,
                statements: vec![SyntaxNode::ExpressionStmt(crate::ir::ExpressionStmtNode {
                    expr: Box::new(anon),
                    pos: pos(),
                })],
                pos: pos(),
            }))),
            pos: pos(),
        });
        let class = SyntaxNode::ClassDecl(ClassDeclNode {
            id: 1,
            name: "demo.Outer".to_string(),
            members: vec![
                SyntaxNode::FieldDecl(FieldDeclNode {
                    name: "count".to_string(),
                    is_static: false,
                    init: None,
                    pos: pos(),
                }),
                method,
            ],
            pos: pos(),
        });
        CompilationUnit {
            file_path: "outer.src".to_string(),
            imports: vec![],
            types: vec![class],
        }
    }

    fn outer_facts() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::with_types(vec![
            TypeInfo {
                qualified: "demo.Outer".to_string(),
                fields: names(&["count"]),
                methods: names(&["m"]),
                ..TypeInfo::default()
            },
            TypeInfo::named("demo.Widget"),
        ]))
    }

    #[test]
    fn own_member_access_is_not_outer() {
        let unit = outer_unit();
        let tree = ScopeBuilder::build(&unit, outer_facts());

        let method_block = tree.scope_for(3).expect("block scope");
        let resolved = tree.arena.resolve_identifier(method_block, pos(), "count");
        assert!(resolved.is_resolved());
        assert!(!resolved.is_outer_access());
        assert_eq!(resolved.qualified(), Some("demo.Outer.count"));

        let defining = resolved.defining_scope().expect("defining scope");
        assert!(matches!(
            tree.arena.scope(defining).kind,
            ScopeKind::Type(_)
        ));
    }

    #[test]
    fn access_from_nested_type_is_outer_with_defining_scope_of_owner() {
        let unit = outer_unit();
        let tree = ScopeBuilder::build(&unit, outer_facts());

        // Same identifier, requested from two levels deeper: inside the
        // anonymous type's method body.
        let anon_block = tree.scope_for(6).expect("anonymous method block scope");
        let resolved = tree.arena.resolve_identifier(anon_block, pos(), "count");
        assert!(resolved.is_outer_access());
        assert_eq!(resolved.qualified(), Some("demo.Outer.count"));

        let defining = resolved.defining_scope().expect("defining scope");
        match &tree.arena.scope(defining).kind {
            ScopeKind::ParentType(members) => assert_eq!(members.type_name, "demo.Outer"),
            other => panic!("expected parent-type scope, got {:?}", other),
        }
    }

    #[test]
    fn anonymous_type_sees_inherited_members_locally() {
        let mut facts = TypeRegistry::new();
        facts.insert(TypeInfo {
            qualified: "demo.Outer".to_string(),
            fields: names(&["count"]),
            ..TypeInfo::default()
        });
        facts.insert(TypeInfo {
            qualified: "demo.Widget".to_string(),
            fields: names(&["width"]),
            ..TypeInfo::default()
        });
        let unit = outer_unit();
        let tree = ScopeBuilder::build(&unit, Arc::new(facts));

        // `width` comes from the instantiated base type; inside the
        // anonymous body it is a plain `this` access.
        let anon_block = tree.scope_for(6).expect("anonymous method block scope");
        let resolved = tree.arena.resolve_identifier(anon_block, pos(), "width");
        assert!(resolved.is_resolved());
        assert!(!resolved.is_outer_access());
    }

    #[test]
    fn imports_answer_their_namespaces() {
        let mut unit = outer_unit();
        unit.imports = vec![
            ImportDecl {
                qualified: "lib.List".to_string(),
                is_static: false,
            },
            ImportDecl {
                qualified: "lib.Util.max".to_string(),
                is_static: true,
            },
        ];
        let tree = ScopeBuilder::build(&unit, outer_facts());
        let block = tree.scope_for(3).expect("block scope");

        let ty = tree.arena.resolve_type(block, pos(), "List");
        assert_eq!(ty.qualified(), Some("lib.List"));

        // A static import answers both the method and the identifier
        // namespace.
        let call = tree.arena.resolve_method(block, pos(), "max");
        assert_eq!(call.qualified(), Some("lib.Util.max"));
        let field = tree.arena.resolve_identifier(block, pos(), "max");
        assert_eq!(field.qualified(), Some("lib.Util.max"));
    }

    #[test]
    fn root_resolves_fully_qualified_names_only() {
        let unit = outer_unit();
        let tree = ScopeBuilder::build(&unit, outer_facts());
        let block = tree.scope_for(3).expect("block scope");

        let known = tree.arena.resolve_type(block, pos(), "demo.Widget");
        assert!(known.is_resolved());
        assert_eq!(known.defining_scope(), Some(tree.root));

        assert!(!tree.arena.resolve_type(block, pos(), "Widget").is_resolved());
        assert!(!tree
            .arena
            .resolve_type(block, pos(), "nowhere.Missing")
            .is_resolved());
    }

    #[test]
    fn scope_paths_follow_nesting() {
        let unit = outer_unit();
        let tree = ScopeBuilder::build(&unit, outer_facts());
        let block = tree.scope_for(3).expect("block scope");
        assert_eq!(tree.arena.path(block), "root.import.type Outer.param m.block");
    }
}
