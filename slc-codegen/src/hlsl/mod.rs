// HLSL backend
//
// Overrides the C-like defaults where HLSL diverges: matrix multiplication
// goes through `mul`, user constructors lower to a static `New` wrapper,
// bindless indices wrap in `NonUniformResourceIndex`, and globals carry
// Vulkan binding decorations next to their `register` assignment.

mod preamble;

use crate::backend::{c_like, FunctionStyle, GeneratorOptions, ShaderBackend};
use crate::binding::{allocate_bindings, leaf_resource_type, register_letter, Binding};
use crate::error::{CodegenError, CodegenResult};
use crate::source::SourceBuilder;
use log::debug;
use slc_ast::{
    Attr, DeclId, DeclKind, ExprId, ExprKind, InterpolationMode, Module, Qualifier, RayQueryFlags,
    SemanticType, ShaderStage, TypeId, TypeKind,
};
use slc_diagnostics::DiagnosticEngine;
use std::collections::BTreeMap;

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "pixel",
        ShaderStage::Compute => "compute",
    }
}

fn system_value_name(semantic: SemanticType) -> &'static str {
    use SemanticType::*;
    match semantic {
        Position => "SV_Position",
        ClipDistance => "SV_ClipDistance",
        CullDistance => "SV_CullDistance",
        RenderTarget0 => "SV_Target0",
        RenderTarget1 => "SV_Target1",
        RenderTarget2 => "SV_Target2",
        RenderTarget3 => "SV_Target3",
        RenderTarget4 => "SV_Target4",
        RenderTarget5 => "SV_Target5",
        RenderTarget6 => "SV_Target6",
        RenderTarget7 => "SV_Target7",
        Depth => "SV_Depth",
        DepthGreaterEqual => "SV_DepthGreaterEqual",
        DepthLessEqual => "SV_DepthLessEqual",
        StencilRef => "SV_StencilRef",
        VertexID => "SV_VertexID",
        InstanceID => "SV_InstanceID",
        PrimitiveID => "SV_PrimitiveID",
        IsFrontFace => "SV_IsFrontFace",
        SampleIndex => "SV_SampleIndex",
        SampleMask => "SV_Coverage",
        Barycentrics => "SV_Barycentrics",
        ThreadID => "SV_DispatchThreadID",
        GroupID => "SV_GroupID",
        ThreadPositionInGroup => "SV_GroupThreadID",
        ThreadIndexInGroup => "SV_GroupIndex",
        ViewID => "SV_ViewID",
    }
}

fn interpolation_name(mode: InterpolationMode) -> &'static str {
    match mode {
        InterpolationMode::linear => "linear",
        InterpolationMode::nointerpolation => "nointerpolation",
        InterpolationMode::centroid => "centroid",
        InterpolationMode::sample => "sample",
        InterpolationMode::noperspective => "noperspective",
    }
}

/// Is `semantic` usable for a parameter with this qualifier in this stage?
fn semantic_allowed(semantic: SemanticType, stage: ShaderStage, qualifier: Qualifier) -> bool {
    use SemanticType::*;
    let is_out = qualifier == Qualifier::Out;
    match stage {
        ShaderStage::Vertex => {
            if is_out {
                matches!(semantic, Position | ClipDistance | CullDistance)
            } else {
                matches!(semantic, VertexID | InstanceID | ViewID)
            }
        }
        ShaderStage::Fragment => {
            if is_out {
                matches!(
                    semantic,
                    RenderTarget0
                        | RenderTarget1
                        | RenderTarget2
                        | RenderTarget3
                        | RenderTarget4
                        | RenderTarget5
                        | RenderTarget6
                        | RenderTarget7
                        | Depth
                        | DepthGreaterEqual
                        | DepthLessEqual
                        | StencilRef
                        | SampleMask
                )
            } else {
                matches!(
                    semantic,
                    Position
                        | IsFrontFace
                        | SampleIndex
                        | SampleMask
                        | Barycentrics
                        | PrimitiveID
                        | ClipDistance
                        | CullDistance
                        | ViewID
                )
            }
        }
        ShaderStage::Compute => {
            !is_out
                && matches!(
                    semantic,
                    ThreadID | GroupID | ThreadPositionInGroup | ThreadIndexInGroup
                )
        }
    }
}

fn ray_flags_text(flags: RayQueryFlags) -> String {
    let mut text = String::from("RAY_FLAG_NONE");
    let spellings = [
        (RayQueryFlags::FORCE_OPAQUE, "RAY_FLAG_FORCE_OPAQUE"),
        (RayQueryFlags::FORCE_NON_OPAQUE, "RAY_FLAG_FORCE_NON_OPAQUE"),
        (
            RayQueryFlags::ACCEPT_FIRST_AND_END_SEARCH,
            "RAY_FLAG_ACCEPT_FIRST_HIT_AND_END_SEARCH",
        ),
        (RayQueryFlags::CULL_BACK_FACE, "RAY_FLAG_CULL_BACK_FACING_TRIANGLES"),
        (RayQueryFlags::CULL_FRONT_FACE, "RAY_FLAG_CULL_FRONT_FACING_TRIANGLES"),
        (RayQueryFlags::CULL_OPAQUE, "RAY_FLAG_CULL_OPAQUE"),
        (RayQueryFlags::CULL_NON_OPAQUE, "RAY_FLAG_CULL_NON_OPAQUE"),
        (RayQueryFlags::CULL_TRIANGLE, "RAY_FLAG_CULL_TRIANGLES"),
        (RayQueryFlags::CULL_PROCEDURAL, "RAY_FLAG_CULL_PROCEDURAL_PRIMITIVES"),
    ];
    for (flag, spelling) in spellings {
        if flags.contains(flag) {
            text.push_str(" | ");
            text.push_str(spelling);
        }
    }
    text
}

/// HLSL source generator
pub struct HlslGenerator {
    options: GeneratorOptions,
    bindings: BTreeMap<DeclId, Binding>,
}

impl Default for HlslGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HlslGenerator {
    pub fn new() -> Self {
        Self::with_options(GeneratorOptions::default())
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self {
            options,
            bindings: BTreeMap::new(),
        }
    }

    /// The binding table computed by the last `prepare`
    pub fn bindings(&self) -> &BTreeMap<DeclId, Binding> {
        &self.bindings
    }

    fn find_stage(&self, module: &Module, function: DeclId) -> Option<ShaderStage> {
        module
            .find_attr(&module.decl(function).attrs, |a| matches!(a, Attr::Stage(_)))
            .and_then(|a| match a {
                Attr::Stage(stage) => Some(*stage),
                _ => None,
            })
    }

    fn uses_bitwise_cast(&self, module: &Module) -> bool {
        module
            .exprs()
            .any(|e| matches!(e.kind, ExprKind::BitwiseCast { .. }))
    }
}

impl ShaderBackend for HlslGenerator {
    fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    fn supports_constructors(&self) -> bool {
        false
    }

    fn prepare(&mut self, module: &Module, diags: &mut DiagnosticEngine) -> CodegenResult<()> {
        self.bindings = allocate_bindings(module, diags)?;
        debug!("allocated {} resource bindings", self.bindings.len());
        Ok(())
    }

    fn preamble(&self, module: &Module, sb: &mut SourceBuilder) -> CodegenResult<()> {
        if self.uses_bitwise_cast(module) {
            sb.append(preamble::HLSL_BITCAST);
            sb.endline();
        }
        match &self.options.prelude_override {
            Some(text) => sb.append(text),
            None => {
                sb.append(preamble::HLSL_HEADER);
                sb.append(preamble::HLSL_BUFFER_INTRINSICS);
                sb.append(preamble::HLSL_TEXTURE_INTRINSICS);
                sb.append(preamble::HLSL_RAY_INTRINSICS);
            }
        }
        sb.endline();
        preamble::emit_array_helpers(module, sb);
        Ok(())
    }

    fn type_name(&self, module: &Module, ty: TypeId) -> String {
        let td = module.type_decl(ty);
        match &td.kind {
            // The 4-channel sampled view is canonical
            TypeKind::Texture2D { .. } | TypeKind::Texture3D { .. } => match td.name.find('>') {
                Some(pos) => {
                    let mut name = td.name.clone();
                    name.insert(pos, '4');
                    name
                }
                None => td.name.clone(),
            },
            TypeKind::Array { element, count, .. } => {
                if module.is_bindless_array(ty) {
                    format!("Bindless<{}>", self.type_name(module, *element))
                } else {
                    format!("array<{}, {}>", self.type_name(module, *element), count)
                }
            }
            TypeKind::RayQuery { flags } => format!("RayQuery<{}>", ray_flags_text(*flags)),
            _ => td.name.clone(),
        }
    }

    fn visit_binary_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let (op, left, right) = match module.expr(expr).kind {
            ExprKind::Binary { op, left, right } => (op, left, right),
            _ => return c_like::visit_binary_expr(self, module, sb, expr),
        };
        let lt = module.expr(left).ty;
        let rt = module.expr(right).ty;
        let vec_mat = (module.is_vector(lt) && module.is_matrix(rt))
            || (module.is_matrix(lt) && module.is_vector(rt));

        if vec_mat && op == slc_ast::BinaryOp::Mul {
            sb.append("mul(");
            self.visit_expr(module, sb, left)?;
            sb.append(", ");
            self.visit_expr(module, sb, right)?;
            sb.append(")");
            return Ok(());
        }
        if vec_mat && op == slc_ast::BinaryOp::MulAssign {
            self.visit_expr(module, sb, left)?;
            sb.append(" = mul(");
            self.visit_expr(module, sb, left)?;
            sb.append(", ");
            self.visit_expr(module, sb, right)?;
            sb.append(")");
            return Ok(());
        }
        c_like::visit_binary_expr(self, module, sb, expr)
    }

    fn visit_construct_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let args = match &module.expr(expr).kind {
            ExprKind::Construct { args } => args.clone(),
            _ => return c_like::visit_construct_expr(self, module, sb, expr),
        };
        let ty = module.expr(expr).ty;
        let td = module.type_decl(ty);

        match &td.kind {
            TypeKind::RayQuery { .. } => {
                // Ray queries are declared, never constructed
                sb.append("[RayQuery SHOULD NEVER BE INITIALIZED IN HLSL]");
                Ok(())
            }
            TypeKind::Array { element, count, .. } => {
                sb.append(&format!(
                    "make_array{}<{}, {}>(",
                    count,
                    self.type_name(module, *element),
                    count
                ));
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        sb.append(", ");
                    }
                    self.visit_expr(module, sb, arg)?;
                }
                sb.append(")");
                Ok(())
            }
            TypeKind::Vector { count, .. } if args.len() <= 1 => {
                sb.append(&format!("{}(", td.name));
                match args.first() {
                    Some(&arg) if module.is_scalar(module.expr(arg).ty) => {
                        for i in 0..*count {
                            if i > 0 {
                                sb.append(", ");
                            }
                            self.visit_expr(module, sb, arg)?;
                        }
                    }
                    Some(&arg) => self.visit_expr(module, sb, arg)?,
                    None => {
                        for i in 0..*count {
                            if i > 0 {
                                sb.append(", ");
                            }
                            sb.append("0");
                        }
                    }
                }
                sb.append(")");
                Ok(())
            }
            _ if td.builtin => {
                sb.append(&format!("{}(", self.type_name(module, ty)));
                if args.is_empty() {
                    sb.append("0");
                } else {
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            sb.append(", ");
                        }
                        self.visit_expr(module, sb, arg)?;
                    }
                }
                sb.append(")");
                Ok(())
            }
            _ => {
                // User types construct through the synthesized static wrapper
                sb.append(&format!("{}::New(", self.type_name(module, ty)));
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        sb.append(", ");
                    }
                    self.visit_expr(module, sb, arg)?;
                }
                sb.append(")");
                Ok(())
            }
        }
    }

    fn visit_access_expr(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        expr: ExprId,
    ) -> CodegenResult<()> {
        let (base, index) = match module.expr(expr).kind {
            ExprKind::Access { base, index } => (base, index),
            _ => return c_like::visit_access_expr(self, module, sb, expr),
        };
        self.visit_expr(module, sb, base)?;

        let base_ty = module.expr(base).ty;
        let is_bindless = module.is_bindless_array(base_ty);
        let is_bound_global = match module.expr(base).kind {
            ExprKind::DeclRef(decl) => module
                .find_attr(&module.decl(decl).attrs, |a| {
                    matches!(a, Attr::ResourceBind { .. })
                })
                .is_some(),
            _ => false,
        };
        // Plain value arrays live behind the wrapper struct's `data` field
        if !is_bindless && !is_bound_global && module.is_array(base_ty) {
            sb.append(".data");
        }

        sb.append("[");
        if is_bindless {
            sb.append("NonUniformResourceIndex(");
        }
        self.visit_expr(module, sb, index)?;
        if is_bindless {
            sb.append(")");
        }
        sb.append("]");
        Ok(())
    }

    fn visit_variable(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        decl: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(decl);
        let (name, ty, qualifier, init, is_global) = match &d.kind {
            DeclKind::Var {
                name,
                ty,
                qualifier,
                init,
            } => (name, *ty, *qualifier, *init, false),
            DeclKind::GlobalVar {
                name,
                ty,
                qualifier,
                init,
            } => (name, *ty, *qualifier, *init, true),
            _ => {
                return Err(CodegenError::Unreachable(
                    "variable visit on non-variable declaration".to_string(),
                ))
            }
        };

        match qualifier {
            Qualifier::Const => sb.append(if is_global { "static const " } else { "const " }),
            Qualifier::Inout => {
                // Buffers and textures cannot pass through inout
                if !module.is_resource(ty) {
                    sb.append("inout ");
                }
            }
            Qualifier::GroupShared => sb.append("groupshared "),
            _ => {}
        }

        sb.append(&self.type_name(module, ty));
        sb.append(" ");
        sb.append(name);
        if let Some(init) = init {
            let init_ty = module.expr(init).ty;
            if !matches!(module.type_decl(init_ty).kind, TypeKind::RayQuery { .. }) {
                sb.append(" = ");
                self.visit_expr(module, sb, init)?;
            }
        }
        Ok(())
    }

    fn visit_parameter(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
        param: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(param);
        let ty = d.var_type().ok_or_else(|| {
            CodegenError::Unreachable("parameter without a type".to_string())
        })?;
        let qualifier = d.qualifier();

        let mut semantic_suffix = String::new();
        if let Some(stage) = self.find_stage(module, function) {
            let semantic = module
                .find_attr(&d.attrs, |a| matches!(a, Attr::Semantic(_)))
                .and_then(|a| match a {
                    Attr::Semantic(semantic) => Some(*semantic),
                    _ => None,
                });
            if let Some(semantic) = semantic {
                if semantic_allowed(semantic, stage, qualifier) {
                    semantic_suffix = format!(" : {}", system_value_name(semantic));
                } else {
                    return Err(CodegenError::InvalidSemantic {
                        semantic: system_value_name(semantic).to_string(),
                        param: d.name().to_string(),
                        stage: stage_name(stage).to_string(),
                    });
                }
            }
        }

        let prefix = match qualifier {
            Qualifier::None => "",
            Qualifier::Const => "const ",
            Qualifier::Out => "out ",
            Qualifier::Inout => {
                if module.is_resource(ty) {
                    ""
                } else {
                    "inout "
                }
            }
            Qualifier::GroupShared => "groupshared ",
        };
        sb.append(prefix);
        sb.append(&self.type_name(module, ty));
        sb.append(" ");
        sb.append(d.name());
        sb.append(&semantic_suffix);
        Ok(())
    }

    fn visit_field(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        owner: TypeId,
        field: DeclId,
    ) -> CodegenResult<()> {
        let is_stage_inout = module
            .find_attr(&module.type_decl(owner).attrs, |a| {
                matches!(a, Attr::StageInout)
            })
            .is_some();

        let d = module.decl(field);
        if let Some(&Attr::Interpolation(mode)) =
            module.find_attr(&d.attrs, |a| matches!(a, Attr::Interpolation(_)))
        {
            sb.append(interpolation_name(mode));
            sb.append(" ");
        }

        let ty = d
            .var_type()
            .ok_or_else(|| CodegenError::Unreachable("field without a type".to_string()))?;
        sb.append(&self.type_name(module, ty));
        sb.append(" ");
        sb.append(d.name());
        if is_stage_inout {
            sb.append(&format!(" : {}", d.name()));
        }
        sb.endline_with(';');
        Ok(())
    }

    fn visit_constructor(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        ctor: DeclId,
        _style: FunctionStyle,
    ) -> CodegenResult<()> {
        let d = module.decl(ctor);
        let (owner, name, params) = match &d.kind {
            DeclKind::Constructor { owner, name, params, .. } => {
                (*owner, name.clone(), params.clone())
            }
            _ => {
                return Err(CodegenError::Unreachable(
                    "constructor visit on non-constructor".to_string(),
                ))
            }
        };

        // No native constructors: emit the body as a plain method
        sb.append(&format!("void {}(", name));
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                sb.append(", ");
            }
            self.visit_parameter(module, sb, ctor, param)?;
        }
        sb.append(") ");
        match d.body() {
            Some(body) => self.visit_stmt(module, sb, body)?,
            None => sb.append("{ }"),
        }
        sb.endline();

        // Static wrapper: zero the instance, run the constructor, return it
        let owner_name = self.type_name(module, owner);
        sb.append(&format!("static {} New(", owner_name));
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                sb.append(", ");
            }
            self.visit_parameter(module, sb, ctor, param)?;
        }
        sb.append(") {");
        sb.endline();
        sb.indent();
        sb.append(&format!("{} _this = ({})0;", owner_name, owner_name));
        sb.endline();
        let arg_names: Vec<&str> = params.iter().map(|&p| module.decl(p).name()).collect();
        sb.append(&format!("_this.{}({});", name, arg_names.join(", ")));
        sb.endline();
        sb.append("return _this;");
        sb.endline();
        sb.dedent();
        sb.append("}");
        sb.endline();
        Ok(())
    }

    fn visit_shader_resource(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        var: DeclId,
    ) -> CodegenResult<()> {
        let d = module.decl(var);
        let ty = d.var_type().ok_or_else(|| {
            CodegenError::Unreachable("resource global without a type".to_string())
        })?;

        // Resource arrays use C-style dimensions on the variable
        let mut dims = String::new();
        let mut leaf = ty;
        while let TypeKind::Array { element, count, .. } = module.type_decl(leaf).kind {
            if count > 0 {
                dims.push_str(&format!("[{}]", count));
            } else {
                dims.push_str("[]");
            }
            leaf = element;
        }

        let is_push = module
            .find_attr(&d.attrs, |a| matches!(a, Attr::PushConstant))
            .is_some();
        if is_push {
            sb.append("[[vk::push_constant]]");
            sb.endline();
        }

        let binding = self.bindings.get(&var).copied();
        if let Some(binding) = binding {
            if !is_push {
                sb.append(&format!("[[vk::binding({}, {})]]", binding.register, binding.space));
                sb.endline();
            }
        }

        sb.append(&format!("{} {}{}", self.type_name(module, leaf), d.name(), dims));
        if let Some(binding) = binding {
            let letter = register_letter(module, leaf_resource_type(module, ty));
            sb.append(&format!(
                " : register({}{}, space{})",
                letter, binding.register, binding.space
            ));
        }
        sb.endline_with(';');
        Ok(())
    }

    fn function_attributes(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
    ) -> CodegenResult<()> {
        if let Some(stage) = self.find_stage(module, function) {
            sb.append(&format!("[shader(\"{}\")]", stage_name(stage)));
            sb.endline();
            let kernel_size = module
                .find_attr(&module.decl(function).attrs, |a| {
                    matches!(a, Attr::KernelSize { .. })
                })
                .and_then(|a| match a {
                    Attr::KernelSize { x, y, z } => Some((*x, *y, *z)),
                    _ => None,
                });
            if let Some((x, y, z)) = kernel_size {
                sb.append(&format!("[numthreads({}, {}, {})]", x, y, z));
                sb.endline();
            }
        }
        Ok(())
    }

    fn function_signature_postfix(
        &self,
        module: &Module,
        sb: &mut SourceBuilder,
        function: DeclId,
    ) -> CodegenResult<()> {
        if self.find_stage(module, function) == Some(ShaderStage::Fragment) {
            sb.append(" : SV_Target");
        }
        Ok(())
    }
}
