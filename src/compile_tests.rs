//! End-to-end unit compilation: phase gating, idempotence, batch
//! behavior and the JSON entry point.

#[cfg(test)]
mod tests {
    use crate::compile::{compile_unit, compile_unit_json, compile_units, CompileOptions};
    use crate::default_registry;
    use crate::ir::{
        AssignmentNode, BlockNode, ClassDeclNode, CompilationUnit, ExpressionStmtNode,
        FieldDeclNode, IdentifierNode, LiteralNode, LiteralValue, MethodDeclNode, NewInstanceNode,
        SourcePosition, SyntaxNode, TypeInfo, TypeRegistry,
    };
    use crate::context::{ERR_INIT_BLOCK_SHAPE, ERR_INLINE_FUNCTION_SHAPE, ERR_OUTER_FIELD_ACCESS};
    use crate::ir::InitBlockNode;
    use std::sync::Arc;

    fn pos() -> SourcePosition {
        SourcePosition { line: 1, column: 1 }
    }

    fn field(name: &str) -> SyntaxNode {
        SyntaxNode::FieldDecl(FieldDeclNode {
            name: name.to_string(),
            is_static: false,
            init: None,
            pos: pos(),
        })
    }

    fn set_stmt(name: &str, value: f64) -> SyntaxNode {
        SyntaxNode::ExpressionStmt(ExpressionStmtNode {
            expr: Box::new(SyntaxNode::Assignment(AssignmentNode {
                target: Box::new(SyntaxNode::Identifier(IdentifierNode {
                    name: name.to_string(),
                    pos: pos(),
                })),
                value: Box::new(SyntaxNode::Literal(LiteralNode {
                    value: LiteralValue::Number(value),
                    pos: pos(),
                })),
                pos: pos(),
            })),
            pos: pos(),
        })
    }

    fn method(id: u32, name: &str, block_id: u32, statements: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::MethodDecl(MethodDeclNode {
            id,
            name: name.to_string(),
            is_static: false,
            params: vec![],
            body: Some(Box::new(SyntaxNode::Block(BlockNode {
                id: block_id,
                statements,
                pos: pos(),
            }))),
            pos: pos(),
        })
    }

    /// class Counter { n; bump() { n = 5; } } is a clean unit.
    fn counter_unit() -> CompileOptions {
        let mut facts = TypeRegistry::new();
        facts.insert(TypeInfo {
            qualified: "demo.Counter".to_string(),
            fields: ["n"].iter().map(|s| s.to_string()).collect(),
            methods: ["bump"].iter().map(|s| s.to_string()).collect(),
            ..TypeInfo::default()
        });
        CompileOptions {
            unit: CompilationUnit {
                file_path: "counter.src".to_string(),
                imports: vec![],
                types: vec![SyntaxNode::ClassDecl(ClassDeclNode {
                    id: 1,
                    name: "demo.Counter".to_string(),
                    members: vec![field("n"), method(2, "bump", 3, vec![set_stmt("n", 5.0)])],
                    pos: pos(),
                })],
            },
            types: Arc::new(facts),
        }
    }

    /// A class whose anonymous instantiation reads the outer field,
    /// the construct the outer-scope check rejects.
    fn outer_capture_unit() -> CompileOptions {
        let mut facts = TypeRegistry::new();
        facts.insert(TypeInfo {
            qualified: "demo.Holder".to_string(),
            fields: ["total"].iter().map(|s| s.to_string()).collect(),
            methods: ["m"].iter().map(|s| s.to_string()).collect(),
            ..TypeInfo::default()
        });
        facts.insert(TypeInfo::named("demo.Task"));

        let anon_body = method(5, "run", 6, vec![set_stmt("total", 1.0)]);
        let new = SyntaxNode::NewInstance(NewInstanceNode {
            id: 4,
            type_name: "demo.Task".to_string(),
            args: vec![],
            body: Some(vec![anon_body]),
            pos: pos(),
        });
        let m = method(
            2,
            "m",
            3,
            vec![SyntaxNode::ExpressionStmt(ExpressionStmtNode {
                expr: Box::new(new),
                pos: pos(),
            })],
        );
        CompileOptions {
            unit: CompilationUnit {
                file_path: "holder.src".to_string(),
                imports: vec![],
                types: vec![SyntaxNode::ClassDecl(ClassDeclNode {
                    id: 1,
                    name: "demo.Holder".to_string(),
                    members: vec![field("total"), m],
                    pos: pos(),
                })],
            },
            types: Arc::new(facts),
        }
    }

    /// Two duplicate-member violations in two unrelated classes.
    fn two_violation_unit() -> CompileOptions {
        let class = |id: u32, name: &str| {
            SyntaxNode::ClassDecl(ClassDeclNode {
                id,
                name: name.to_string(),
                members: vec![field("v"), field("v")],
                pos: pos(),
            })
        };
        CompileOptions {
            unit: CompilationUnit {
                file_path: "dups.src".to_string(),
                imports: vec![],
                types: vec![class(1, "demo.A"), class(2, "demo.B")],
            },
            types: Arc::new(TypeRegistry::new()),
        }
    }

    /// Instantiates a synthetic type whose initializer block holds a
    /// statement that is not a plain assignment.
    fn bad_synthetic_init_unit() -> CompileOptions {
        let mut facts = TypeRegistry::new();
        facts.insert(TypeInfo {
            qualified: "demo.Holder".to_string(),
            methods: ["m"].iter().map(|s| s.to_string()).collect(),
            ..TypeInfo::default()
        });
        facts.insert(TypeInfo {
            qualified: "demo.Opts".to_string(),
            is_synthetic: true,
            ..TypeInfo::default()
        });

        let bad_stmt = SyntaxNode::ExpressionStmt(ExpressionStmtNode {
            expr: Box::new(SyntaxNode::Identifier(IdentifierNode {
                name: "noise".to_string(),
                pos: pos(),
            })),
            pos: pos(),
        });
        let new = SyntaxNode::NewInstance(NewInstanceNode {
            id: 4,
            type_name: "demo.Opts".to_string(),
            args: vec![],
            body: Some(vec![SyntaxNode::InitBlock(InitBlockNode {
                id: 5,
                is_static: false,
                statements: vec![bad_stmt],
                pos: pos(),
            })]),
            pos: pos(),
        });
        let m = method(
            2,
            "m",
            3,
            vec![SyntaxNode::ExpressionStmt(ExpressionStmtNode {
                expr: Box::new(new),
                pos: pos(),
            })],
        );
        CompileOptions {
            unit: CompilationUnit {
                file_path: "opts.src".to_string(),
                imports: vec![],
                types: vec![SyntaxNode::ClassDecl(ClassDeclNode {
                    id: 1,
                    name: "demo.Holder".to_string(),
                    members: vec![m],
                    pos: pos(),
                })],
            },
            types: Arc::new(facts),
        }
    }

    /// Instantiates a functional contract with two declared methods.
    fn bad_contract_unit() -> CompileOptions {
        let mut facts = TypeRegistry::new();
        facts.insert(TypeInfo {
            qualified: "demo.Holder".to_string(),
            methods: ["m"].iter().map(|s| s.to_string()).collect(),
            ..TypeInfo::default()
        });
        facts.insert(TypeInfo {
            qualified: "demo.Callback".to_string(),
            methods: ["run"].iter().map(|s| s.to_string()).collect(),
            function_method: Some("run".to_string()),
            ..TypeInfo::default()
        });

        let new = SyntaxNode::NewInstance(NewInstanceNode {
            id: 4,
            type_name: "demo.Callback".to_string(),
            args: vec![],
            body: Some(vec![
                method(5, "run", 6, vec![]),
                method(7, "extra", 8, vec![]),
            ]),
            pos: pos(),
        });
        let m = method(
            2,
            "m",
            3,
            vec![SyntaxNode::ExpressionStmt(ExpressionStmtNode {
                expr: Box::new(new),
                pos: pos(),
            })],
        );
        CompileOptions {
            unit: CompilationUnit {
                file_path: "callback.src".to_string(),
                imports: vec![],
                types: vec![SyntaxNode::ClassDecl(ClassDeclNode {
                    id: 1,
                    name: "demo.Holder".to_string(),
                    members: vec![m],
                    pos: pos(),
                })],
            },
            types: Arc::new(facts),
        }
    }

    #[test]
    fn clean_unit_produces_program_and_no_diagnostics() {
        let registry = default_registry();
        let result = compile_unit(&registry, &counter_unit()).unwrap();

        assert!(result.diagnostics.is_empty());
        let program = result.program.expect("program");
        // var Counter = function(){…}; Counter.prototype.bump = …;
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn violations_accumulate_and_gate_generation() {
        let registry = default_registry();
        let result = compile_unit(&registry, &two_violation_unit()).unwrap();

        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.program.is_none());
    }

    #[test]
    fn outer_capture_is_rejected_before_generation() {
        let registry = default_registry();
        let result = compile_unit(&registry, &outer_capture_unit()).unwrap();

        assert!(result.program.is_none());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == ERR_OUTER_FIELD_ACCESS));
    }

    #[test]
    fn synthetic_initializer_with_non_assignment_is_rejected() {
        let registry = default_registry();
        let result = compile_unit(&registry, &bad_synthetic_init_unit()).unwrap();

        assert!(result.program.is_none());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == ERR_INIT_BLOCK_SHAPE));
    }

    #[test]
    fn contract_instantiation_with_two_methods_is_rejected() {
        let registry = default_registry();
        let result = compile_unit(&registry, &bad_contract_unit()).unwrap();

        assert!(result.program.is_none());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == ERR_INLINE_FUNCTION_SHAPE));
    }

    #[test]
    fn regeneration_of_unchanged_unit_is_identical() {
        let registry = default_registry();
        let options = counter_unit();

        let first = compile_unit(&registry, &options).unwrap();
        let second = compile_unit(&registry, &options).unwrap();
        assert_eq!(
            serde_json::to_string(&first.program).unwrap(),
            serde_json::to_string(&second.program).unwrap()
        );
    }

    #[test]
    fn parallel_batch_matches_sequential_results() {
        let registry = default_registry();
        let batch = vec![counter_unit(), two_violation_unit(), outer_capture_unit()];

        let parallel = compile_units(&registry, &batch);
        assert_eq!(parallel.len(), batch.len());
        for (options, result) in batch.iter().zip(&parallel) {
            let sequential = compile_unit(&registry, options).unwrap();
            let parallel_result = result.as_ref().unwrap();
            assert_eq!(
                serde_json::to_string(&sequential).unwrap(),
                serde_json::to_string(parallel_result).unwrap()
            );
        }
    }

    #[test]
    fn json_entry_point_round_trips() {
        let registry = default_registry();
        let options = counter_unit();
        let job = serde_json::json!({
            "unit": options.unit,
            "types": options.types.as_ref(),
        });

        let result_json = compile_unit_json(&registry, &job.to_string());
        let result: serde_json::Value = serde_json::from_str(&result_json).unwrap();
        assert!(result.get("error").is_none());
        assert!(result["program"].is_object());
        assert_eq!(result["diagnostics"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn malformed_job_reports_error_json() {
        let registry = default_registry();
        let result_json = compile_unit_json(&registry, "{ not json");
        let result: serde_json::Value = serde_json::from_str(&result_json).unwrap();
        assert!(result["error"].as_str().unwrap().contains("compile job"));
    }
}
