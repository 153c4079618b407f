// Code generator core
//
// A backend is a visitor family over the AST. The default pass covers the
// constructs shared by C-like shader languages; a target backend overrides a
// curated subset and delegates the rest back to `c_like`.

use crate::error::{CodegenError, CodegenResult};
use crate::source::{SourceBuilder, StringSink};
use slc_ast::Module;
use slc_ast::{DeclId, ExprId, StmtId, TypeId};
use slc_diagnostics::DiagnosticEngine;

/// Codegen configuration supplied by the host
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub indent_width: usize,
    /// Replaces the backend's compiled-in prelude when set
    pub prelude_override: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            prelude_override: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionStyle {
    Normal,
    SignatureOnly,
}

pub trait ShaderBackend {
    fn options(&self) -> &GeneratorOptions;

    /// Whether the target language has native constructors
    fn supports_constructors(&self) -> bool {
        true
    }

    /// One-time work before emission (e.g. binding allocation)
    fn prepare(&mut self, _module: &Module, _diags: &mut DiagnosticEngine) -> CodegenResult<()> {
        Ok(())
    }

    /// Backend preamble: built-in prelude and intrinsic helpers
    fn preamble(&self, _module: &Module, _sb: &mut SourceBuilder) -> CodegenResult<()> {
        Ok(())
    }

    fn type_name(&self, module: &Module, ty: TypeId) -> String {
        module.type_decl(ty).name.clone()
    }

    fn visit_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        c_like::visit_expr(self, module, sb, expr)
    }

    fn visit_binary_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        c_like::visit_binary_expr(self, module, sb, expr)
    }

    fn visit_construct_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        c_like::visit_construct_expr(self, module, sb, expr)
    }

    fn visit_access_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        c_like::visit_access_expr(self, module, sb, expr)
    }

    fn visit_stmt(&self, module: &Module, sb: &mut SourceBuilder, stmt: StmtId) -> CodegenResult<()> {
        c_like::visit_stmt(self, module, sb, stmt)
    }

    /// Attributes immediately preceding the controlled statement
    fn stmt_attributes(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        stmt: StmtId,
    ) -> CodegenResult<()> {
        c_like::stmt_attributes(module, sb, stmt)
    }

    fn visit_variable(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        decl: DeclId,
    ) -> CodegenResult<()> {
        c_like::visit_variable(self, module, sb, decl)
    }

    fn visit_parameter(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
        param: DeclId,
    ) -> CodegenResult<()> {
        c_like::visit_parameter(self, module, sb, function, param)
    }

    fn visit_field(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        owner: TypeId,
        field: DeclId,
    ) -> CodegenResult<()> {
        c_like::visit_field(self, module, sb, owner, field)
    }

    /// Global resource declaration line(s)
    fn visit_shader_resource(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        var: DeclId,
    ) -> CodegenResult<()> {
        self.visit_variable(module, sb, var)?;
        sb.endline_with(';');
        Ok(())
    }

    fn visit_function(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
        style: FunctionStyle,
    ) -> CodegenResult<()> {
        c_like::visit_function(self, module, sb, function, style)
    }

    fn visit_constructor(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        ctor: DeclId,
        style: FunctionStyle,
    ) -> CodegenResult<()> {
        c_like::visit_constructor(self, module, sb, ctor, style)
    }

    fn visit_type_decl(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        ty: TypeId,
    ) -> CodegenResult<()> {
        c_like::visit_type_decl(self, module, sb, ty)
    }

    /// Entry attributes emitted above the function signature
    fn function_attributes(
        &self,
        _module: &Module,
        _sb: &mut SourceBuilder,
        _function: DeclId,
    ) -> CodegenResult<()> {
        Ok(())
    }

    /// Text after the closing parenthesis of the signature
    fn function_signature_postfix(
        &self,
        _module: &Module,
        _sb: &mut SourceBuilder,
        _function: DeclId,
    ) -> CodegenResult<()> {
        Ok(())
    }

    /// Produce the full target source for a module.
    ///
    /// Emission is buffered: a failing run produces no output at all, and the
    /// failure is mirrored into the diagnostics channel.
    fn generate(&mut self, module: &Module, diags: &mut DiagnosticEngine) -> CodegenResult<String>
    where
        Self: Sized,
    {
        let mut out = String::new();
        self.generate_into(module, &mut out, diags)?;
        Ok(out)
    }

    fn generate_into(
        &mut self,
        module: &Module,
        sink: &mut dyn StringSink,
        diags: &mut DiagnosticEngine,
    ) -> CodegenResult<()>
    where
        Self: Sized,
    {
        if let Err(e) = self.prepare(module, diags) {
            diags.emit(e.to_diagnostic());
            return Err(e);
        }
        let mut buffer = String::new();
        let result = {
            let mut sb = SourceBuilder::new(&mut buffer, self.options().indent_width);
            c_like::emit_module(&*self, module, &mut sb)
        };
        match result {
            Ok(()) => {
                sink.append(&buffer);
                Ok(())
            }
            Err(e) => {
                diags.emit(e.to_diagnostic());
                Err(e)
            }
        }
    }
}

/// The default C-like emission pass
pub mod c_like {
    use super::*;
    use crate::binding::is_resource_global;
    use slc_ast::{
        Attr, ConstantValue, DeclKind, ExprKind, Qualifier, StmtKind, TypeKind,
    };
    use std::collections::HashSet;

    pub fn constant_literal(value: ConstantValue) -> String {
        match value {
            ConstantValue::Bool(true) => "true".to_string(),
            ConstantValue::Bool(false) => "false".to_string(),
            ConstantValue::Int(v) => v.to_string(),
            ConstantValue::UInt(v) => format!("{}u", v),
            ConstantValue::Float(bits) => float_literal(f32::from_bits(bits)),
        }
    }

    fn float_literal(v: f32) -> String {
        if !v.is_finite() {
            // No portable literal for these; reconstruct from bits
            return format!("asfloat({}u)", v.to_bits());
        }
        if v == v.trunc() {
            format!("{:.1}f", v)
        } else {
            format!("{}f", v)
        }
    }

    fn swizzle_letters(comps: &[u32]) -> String {
        comps
            .iter()
            .map(|&c| match c {
                0 => 'x',
                1 => 'y',
                2 => 'z',
                _ => 'w',
            })
            .collect()
    }

    /// Parenthesize operands that would rebind under the parent operator
    fn visit_operand<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        operand: ExprId,
        parent_precedence: u8,
        is_right: bool,
    ) -> CodegenResult<()> {
        let needs_parens = match &module.expr(operand).kind {
            ExprKind::Binary { op, .. } => {
                let p = op.precedence();
                p < parent_precedence || (is_right && p == parent_precedence && parent_precedence != 0)
            }
            _ => false,
        };
        if needs_parens {
            sb.append("(");
        }
        backend.visit_expr(module, sb, operand)?;
        if needs_parens {
            sb.append(")");
        }
        Ok(())
    }

    pub fn visit_expr<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        match &module.expr(expr).kind {
            ExprKind::Constant(value) => {
                sb.append(&constant_literal(*value));
                Ok(())
            }
            ExprKind::DeclRef(decl) => {
                sb.append(module.decl(*decl).name());
                Ok(())
            }
            ExprKind::Unary { op, operand } => {
                sb.append(op.symbol());
                let parens = matches!(
                    module.expr(*operand).kind,
                    ExprKind::Binary { .. } | ExprKind::Conditional { .. }
                );
                if parens {
                    sb.append("(");
                }
                backend.visit_expr(module, sb, *operand)?;
                if parens {
                    sb.append(")");
                }
                Ok(())
            }
            ExprKind::Binary { .. } => backend.visit_binary_expr(module, sb, expr),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                sb.append("(");
                backend.visit_expr(module, sb, *cond)?;
                sb.append(" ? ");
                backend.visit_expr(module, sb, *then_expr)?;
                sb.append(" : ");
                backend.visit_expr(module, sb, *else_expr)?;
                sb.append(")");
                Ok(())
            }
            ExprKind::Call { callee, args } => {
                sb.append(module.decl(*callee).name());
                visit_call_args(backend, module, sb, args)
            }
            ExprKind::MethodCall { callee, args } => {
                if !matches!(module.expr(*callee).kind, ExprKind::Method { .. }) {
                    return Err(CodegenError::Unreachable(
                        "method call through a non-member callee".to_string(),
                    ));
                }
                backend.visit_expr(module, sb, *callee)?;
                visit_call_args(backend, module, sb, args)
            }
            ExprKind::Construct { .. } => backend.visit_construct_expr(module, sb, expr),
            ExprKind::InitList { exprs } => {
                sb.append("{ ");
                for (i, &e) in exprs.iter().enumerate() {
                    if i > 0 {
                        sb.append(", ");
                    }
                    backend.visit_expr(module, sb, e)?;
                }
                sb.append(" }");
                Ok(())
            }
            ExprKind::Access { .. } => backend.visit_access_expr(module, sb, expr),
            ExprKind::Field { base, field } => {
                // Members resolve implicitly inside method bodies
                if !matches!(module.expr(*base).kind, ExprKind::This) {
                    backend.visit_expr(module, sb, *base)?;
                    sb.append(".");
                }
                sb.append(module.decl(*field).name());
                Ok(())
            }
            ExprKind::Method { base, method } => {
                if !matches!(module.expr(*base).kind, ExprKind::This) {
                    backend.visit_expr(module, sb, *base)?;
                    sb.append(".");
                }
                sb.append(module.decl(*method).name());
                Ok(())
            }
            ExprKind::Swizzle { base, comps } => {
                backend.visit_expr(module, sb, *base)?;
                sb.append(".");
                sb.append(&swizzle_letters(comps));
                Ok(())
            }
            ExprKind::This => {
                sb.append("this");
                Ok(())
            }
            ExprKind::StaticCast { operand } => {
                let ty = module.expr(expr).ty;
                sb.append(&format!("(({})", backend.type_name(module, ty)));
                backend.visit_expr(module, sb, *operand)?;
                sb.append(")");
                Ok(())
            }
            ExprKind::BitwiseCast { operand } => {
                let ty = module.expr(expr).ty;
                sb.append(&format!("bit_cast<{}>(", backend.type_name(module, ty)));
                backend.visit_expr(module, sb, *operand)?;
                sb.append(")");
                Ok(())
            }
            ExprKind::ImplicitCast { operand } => backend.visit_expr(module, sb, *operand),
        }
    }

    pub fn visit_call_args<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        args: &[ExprId],
    ) -> CodegenResult<()> {
        sb.append("(");
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                sb.append(", ");
            }
            backend.visit_expr(module, sb, arg)?;
        }
        sb.append(")");
        Ok(())
    }

    pub fn visit_binary_expr<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let (op, left, right) = match module.expr(expr).kind {
            ExprKind::Binary { op, left, right } => (op, left, right),
            _ => return Err(CodegenError::Unreachable("binary visit on non-binary".to_string())),
        };
        let precedence = op.precedence();
        visit_operand(backend, module, sb, left, precedence, false)?;
        sb.append(&format!(" {} ", op.symbol()));
        visit_operand(backend, module, sb, right, precedence, true)?;
        Ok(())
    }

    pub fn visit_construct_expr<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let args = match &module.expr(expr).kind {
            ExprKind::Construct { args } => args.clone(),
            _ => {
                return Err(CodegenError::Unreachable(
                    "construct visit on non-construct".to_string(),
                ))
            }
        };
        let ty = module.expr(expr).ty;
        sb.append(&backend.type_name(module, ty));
        visit_call_args(backend, module, sb, &args)
    }

    pub fn visit_access_expr<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let (base, index) = match module.expr(expr).kind {
            ExprKind::Access { base, index } => (base, index),
            _ => return Err(CodegenError::Unreachable("access visit on non-access".to_string())),
        };
        backend.visit_expr(module, sb, base)?;
        sb.append("[");
        backend.visit_expr(module, sb, index)?;
        sb.append("]");
        Ok(())
    }

    pub fn stmt_attributes(
        module: &Module,
        sb: &mut SourceBuilder,
        stmt: StmtId,
    ) -> CodegenResult<()> {
        let mut any = false;
        for &attr in &module.stmt(stmt).attrs {
            match module.attr(attr) {
                Attr::Loop => {
                    sb.append("[loop]");
                    any = true;
                }
                Attr::Unroll { count } => {
                    match count {
                        Some(count) => sb.append(&format!("[unroll({})]", count)),
                        None => sb.append("[unroll]"),
                    }
                    any = true;
                }
                Attr::Branch => {
                    sb.append("[branch]");
                    any = true;
                }
                Attr::Flatten => {
                    sb.append("[flatten]");
                    any = true;
                }
                _ => {}
            }
        }
        if any {
            sb.endline();
        }
        Ok(())
    }

    /// Emit a statement as a block line, terminating it appropriately
    pub fn emit_statement<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        stmt: StmtId,
    ) -> CodegenResult<()> {
        backend.stmt_attributes(module, sb, stmt)?;
        match &module.stmt(stmt).kind {
            StmtKind::Compound { .. }
            | StmtKind::If { .. }
            | StmtKind::For { .. }
            | StmtKind::While { .. }
            | StmtKind::Switch { .. }
            | StmtKind::Case { .. }
            | StmtKind::Default { .. }
            | StmtKind::Comment(_) => {
                backend.visit_stmt(module, sb, stmt)?;
                sb.endline();
            }
            StmtKind::DeclGroup { decls } => {
                for &decl_stmt in decls {
                    emit_statement(backend, module, sb, decl_stmt)?;
                }
            }
            _ => {
                backend.visit_stmt(module, sb, stmt)?;
                sb.endline_with(';');
            }
        }
        Ok(())
    }

    /// Statement emission without line handling (for-loop headers)
    fn visit_stmt_inline<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        stmt: StmtId,
    ) -> CodegenResult<()> {
        backend.visit_stmt(module, sb, stmt)
    }

    pub fn visit_stmt<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        stmt: StmtId,
    ) -> CodegenResult<()> {
        match &module.stmt(stmt).kind {
            StmtKind::Compound { stmts } => {
                sb.append("{");
                sb.endline();
                sb.indent();
                for &s in stmts {
                    emit_statement(backend, module, sb, s)?;
                }
                sb.dedent();
                sb.append("}");
                Ok(())
            }
            StmtKind::Decl { decl } => backend.visit_variable(module, sb, *decl),
            StmtKind::DeclGroup { decls } => {
                for &d in decls {
                    emit_statement(backend, module, sb, d)?;
                }
                Ok(())
            }
            StmtKind::Expr { expr } => backend.visit_expr(module, sb, *expr),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                sb.append("if (");
                backend.visit_expr(module, sb, *cond)?;
                sb.append(") ");
                backend.visit_stmt(module, sb, *then_body)?;
                if let Some(else_body) = else_body {
                    sb.append(" else ");
                    backend.visit_stmt(module, sb, *else_body)?;
                }
                Ok(())
            }
            StmtKind::For {
                init,
                cond,
                inc,
                body,
            } => {
                sb.append("for (");
                if let Some(init) = init {
                    visit_stmt_inline(backend, module, sb, *init)?;
                }
                sb.append("; ");
                if let Some(cond) = cond {
                    backend.visit_expr(module, sb, *cond)?;
                }
                sb.append("; ");
                if let Some(inc) = inc {
                    visit_stmt_inline(backend, module, sb, *inc)?;
                }
                sb.append(") ");
                backend.visit_stmt(module, sb, *body)
            }
            StmtKind::While { cond, body } => {
                sb.append("while (");
                backend.visit_expr(module, sb, *cond)?;
                sb.append(") ");
                backend.visit_stmt(module, sb, *body)
            }
            StmtKind::Switch { cond, cases } => {
                sb.append("switch (");
                backend.visit_expr(module, sb, *cond)?;
                sb.append(") {");
                sb.endline();
                sb.indent();
                for &case in cases {
                    emit_statement(backend, module, sb, case)?;
                }
                sb.dedent();
                sb.append("}");
                Ok(())
            }
            StmtKind::Case { value, body } => {
                sb.append("case ");
                backend.visit_expr(module, sb, *value)?;
                sb.append(": ");
                backend.visit_stmt(module, sb, *body)
            }
            StmtKind::Default { body } => {
                sb.append("default: ");
                backend.visit_stmt(module, sb, *body)
            }
            StmtKind::Break => {
                sb.append("break");
                Ok(())
            }
            StmtKind::Continue => {
                sb.append("continue");
                Ok(())
            }
            StmtKind::Return { value } => {
                sb.append("return");
                if let Some(value) = value {
                    sb.append(" ");
                    backend.visit_expr(module, sb, *value)?;
                }
                Ok(())
            }
            StmtKind::Comment(text) => {
                sb.append("// ");
                sb.append(text);
                Ok(())
            }
        }
    }

    pub fn visit_variable<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        decl: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(decl);
        let (name, ty, qualifier, init) = match &d.kind {
            DeclKind::Var {
                name,
                ty,
                qualifier,
                init,
            }
            | DeclKind::GlobalVar {
                name,
                ty,
                qualifier,
                init,
            } => (name, *ty, *qualifier, *init),
            _ => {
                return Err(CodegenError::Unreachable(
                    "variable visit on non-variable declaration".to_string(),
                ))
            }
        };
        match qualifier {
            Qualifier::Const => sb.append("const "),
            Qualifier::GroupShared => sb.append("groupshared "),
            _ => {}
        }
        sb.append(&backend.type_name(module, ty));
        sb.append(" ");
        sb.append(name);
        if let Some(init) = init {
            sb.append(" = ");
            backend.visit_expr(module, sb, init)?;
        }
        Ok(())
    }

    pub fn visit_parameter<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        _function: DeclId,
        param: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(param);
        let prefix = match d.qualifier() {
            Qualifier::None => "",
            Qualifier::Const => "const ",
            Qualifier::Out => "out ",
            Qualifier::Inout => "inout ",
            Qualifier::GroupShared => "groupshared ",
        };
        sb.append(prefix);
        let ty = d.var_type().ok_or_else(|| {
            CodegenError::Unreachable("parameter without a type".to_string())
        })?;
        sb.append(&backend.type_name(module, ty));
        sb.append(" ");
        sb.append(d.name());
        Ok(())
    }

    pub fn visit_field<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        _owner: TypeId,
        field: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(field);
        let ty = d
            .var_type()
            .ok_or_else(|| CodegenError::Unreachable("field without a type".to_string()))?;
        sb.append(&backend.type_name(module, ty));
        sb.append(" ");
        sb.append(d.name());
        sb.endline_with(';');
        Ok(())
    }

    pub fn visit_function<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
        style: FunctionStyle,
    ) -> CodegenResult<()> {
        backend.function_attributes(module, sb, function)?;
        let d = module.decl(function);
        let return_type = d
            .return_type()
            .map(|ty| backend.type_name(module, ty))
            .unwrap_or_else(|| "void".to_string());
        sb.append(&format!("{} {}(", return_type, d.name()));
        for (i, &param) in d.params().iter().enumerate() {
            if i > 0 {
                sb.append(", ");
            }
            backend.visit_parameter(module, sb, function, param)?;
        }
        sb.append(")");
        backend.function_signature_postfix(module, sb, function)?;
        match style {
            FunctionStyle::SignatureOnly => sb.endline_with(';'),
            FunctionStyle::Normal => {
                sb.append(" ");
                match d.body() {
                    Some(body) => backend.visit_stmt(module, sb, body)?,
                    None => sb.append("{ }"),
                }
                sb.endline();
            }
        }
        Ok(())
    }

    pub fn visit_constructor<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        ctor: DeclId,
        style: FunctionStyle,
    ) -> CodegenResult<()> {
        let d = module.decl(ctor);
        let owner = match &d.kind {
            DeclKind::Constructor { owner, .. } => *owner,
            _ => {
                return Err(CodegenError::Unreachable(
                    "constructor visit on non-constructor".to_string(),
                ))
            }
        };
        sb.append(&format!("{}(", module.type_decl(owner).name));
        for (i, &param) in d.params().iter().enumerate() {
            if i > 0 {
                sb.append(", ");
            }
            backend.visit_parameter(module, sb, ctor, param)?;
        }
        sb.append(")");
        match style {
            FunctionStyle::SignatureOnly => sb.endline_with(';'),
            FunctionStyle::Normal => {
                sb.append(" ");
                match d.body() {
                    Some(body) => backend.visit_stmt(module, sb, body)?,
                    None => sb.append("{ }"),
                }
                sb.endline();
            }
        }
        Ok(())
    }

    pub fn visit_type_decl<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        ty: TypeId,
    ) -> CodegenResult<()> {
        let td = module.type_decl(ty);
        let (fields, methods, constructors) = match &td.kind {
            TypeKind::Structure {
                fields,
                methods,
                constructors,
            } => (fields.clone(), methods.clone(), constructors.clone()),
            // Builtin types need no declaration
            _ => return Ok(()),
        };
        sb.append(&format!("struct {} {{", td.name));
        sb.endline();
        sb.indent();
        for field in fields {
            backend.visit_field(module, sb, ty, field)?;
        }
        for ctor in constructors {
            backend.visit_constructor(module, sb, ctor, FunctionStyle::Normal)?;
        }
        for method in methods {
            backend.visit_function(module, sb, method, FunctionStyle::Normal)?;
        }
        sb.dedent();
        sb.append("}");
        sb.endline_with(';');
        Ok(())
    }

    // --- module-level ordering --------------------------------------------

    pub fn emit_globals<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
    ) -> CodegenResult<()> {
        for &var in module.globals() {
            let ty = match module.decl(var).var_type() {
                Some(ty) => ty,
                None => continue,
            };
            if is_resource_global(module, ty) {
                backend.visit_shader_resource(module, sb, var)?;
            } else {
                backend.visit_variable(module, sb, var)?;
                sb.endline_with(';');
            }
        }
        if !module.globals().is_empty() {
            sb.endline();
        }
        Ok(())
    }

    fn structure_deps(module: &Module, ty: TypeId, out: &mut Vec<TypeId>) {
        if let TypeKind::Structure { fields, .. } = &module.type_decl(ty).kind {
            for &field in fields {
                if let Some(mut fty) = module.decl(field).var_type() {
                    while let TypeKind::Array { element, .. } = module.type_decl(fty).kind {
                        fty = element;
                    }
                    if matches!(module.type_decl(fty).kind, TypeKind::Structure { .. }) {
                        out.push(fty);
                    }
                }
            }
        }
    }

    /// Topological order over structures, field dependencies first
    pub fn structure_emission_order(module: &Module) -> Vec<TypeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();

        fn visit(module: &Module, ty: TypeId, visited: &mut HashSet<TypeId>, order: &mut Vec<TypeId>) {
            if !visited.insert(ty) {
                return;
            }
            let mut deps = Vec::new();
            structure_deps(module, ty, &mut deps);
            for dep in deps {
                visit(module, dep, visited, order);
            }
            order.push(ty);
        }

        for &ty in module.named_types() {
            if matches!(module.type_decl(ty).kind, TypeKind::Structure { .. }) {
                visit(module, ty, &mut visited, &mut order);
            }
        }
        order
    }

    pub fn emit_types<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
    ) -> CodegenResult<()> {
        for ty in structure_emission_order(module) {
            backend.visit_type_decl(module, sb, ty)?;
            sb.endline();
        }
        Ok(())
    }

    pub fn emit_functions<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
    ) -> CodegenResult<()> {
        let mut namespaced: HashSet<DeclId> = HashSet::new();
        for &ns in module.namespaces() {
            if let DeclKind::Namespace { functions, .. } = &module.decl(ns).kind {
                namespaced.extend(functions.iter().copied());
            }
        }
        for &function in module.functions() {
            if namespaced.contains(&function) {
                continue;
            }
            backend.visit_function(module, sb, function, FunctionStyle::Normal)?;
            sb.endline();
        }
        for &ns in module.namespaces() {
            let is_root = matches!(
                &module.decl(ns).kind,
                DeclKind::Namespace { parent: None, .. }
            );
            if is_root {
                emit_namespace(backend, module, sb, ns)?;
            }
        }
        Ok(())
    }

    fn emit_namespace<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
        ns: DeclId,
    ) -> CodegenResult<()> {
        let (name, nested, functions) = match &module.decl(ns).kind {
            DeclKind::Namespace {
                name,
                nested,
                functions,
                ..
            } => (name.clone(), nested.clone(), functions.clone()),
            _ => return Err(CodegenError::Unreachable("namespace visit on non-namespace".to_string())),
        };
        sb.append(&format!("namespace {} {{", name));
        sb.endline();
        sb.indent();
        for function in functions {
            backend.visit_function(module, sb, function, FunctionStyle::Normal)?;
        }
        for child in nested {
            emit_namespace(backend, module, sb, child)?;
        }
        sb.dedent();
        sb.append("}");
        sb.endline();
        Ok(())
    }

    /// Preamble, globals, types in field-dependency order, then functions
    pub fn emit_module<B: ShaderBackend + ?Sized>(
        backend: &B,
        module: &Module,
        sb: &mut SourceBuilder,
    ) -> CodegenResult<()> {
        backend.preamble(module, sb)?;
        emit_globals(backend, module, sb)?;
        emit_types(backend, module, sb)?;
        emit_functions(backend, module, sb)?;
        Ok(())
    }
}
