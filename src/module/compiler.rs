//! Script compiler
//!
//! `ScriptCompiler` performs the structural half of compiling JavaScript:
//! it parses the source with oxc, turns parse errors into
//! `ImportError::Compile`, and records static dependency requests
//! (`require("x")`, `import ... from "x"`, `import "x"`, `import("x")`,
//! `export ... from "x"`) from the AST. Evaluation is left to other
//! `ModuleCompiler` implementations.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression, ModuleDeclaration,
};
use oxc_ast::visit::walk;
use oxc_ast::Visit;
use oxc_parser::{ParseOptions, Parser, ParserReturn};
use oxc_span::SourceType;
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::module::traits::{CompiledUnit, ModuleCompiler, ModuleFormat};

/// Default compiler
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleCompiler for ScriptCompiler {
    fn compile(&self, name: &str, source: &str) -> ImportResult<CompiledUnit> {
        let allocator = Allocator::default();
        let mut parsed = parse(&allocator, source, true);

        // Sloppy-mode scripts (legacy octals, `with`) only parse as CommonJS
        if !parsed.errors.is_empty() {
            let script = parse(&allocator, source, false);
            if !script.errors.is_empty() {
                let reason = parsed
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ImportError::Compile {
                    module: name.to_string(),
                    reason,
                });
            }
            parsed = script;
        }

        let mut collector = RequestCollector::default();
        collector.visit_program(&parsed.program);
        let unit = collector.finish();
        debug!(
            "Compiled {} ({:?}, {} request(s))",
            name,
            unit.format,
            unit.requests.len()
        );
        Ok(unit)
    }
}

fn parse<'a>(allocator: &'a Allocator, source: &'a str, module: bool) -> ParserReturn<'a> {
    let source_type = SourceType::default().with_module(module);
    Parser::new(allocator, source, source_type)
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        })
        .parse()
}

/// Walks the AST collecting static requests in source order
#[derive(Default)]
struct RequestCollector {
    requests: Vec<String>,
    is_esm: bool,
}

impl RequestCollector {
    fn push(&mut self, request: &str) {
        if !request.is_empty() && !self.requests.iter().any(|r| r == request) {
            self.requests.push(request.to_string());
        }
    }

    fn finish(self) -> CompiledUnit {
        CompiledUnit {
            format: if self.is_esm {
                ModuleFormat::EsModule
            } else {
                ModuleFormat::CommonJs
            },
            requests: self.requests,
        }
    }
}

impl<'a> Visit<'a> for RequestCollector {
    fn visit_module_declaration(&mut self, decl: &ModuleDeclaration<'a>) {
        self.is_esm = true;
        walk::walk_module_declaration(self, decl);
    }

    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        self.push(decl.source.value.as_str());
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            self.push(source.value.as_str());
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.push(decl.source.value.as_str());
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &expr.source {
            self.push(lit.value.as_str());
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        // Bare `require` only; `loader.require(...)` is a member call
        if let Expression::Identifier(callee) = &call.callee {
            if callee.name.as_str() == "require" {
                if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
                    self.push(lit.value.as_str());
                }
            }
        }
        walk::walk_call_expression(self, call);
    }
}
