// Expressions and their result-type derivation
//
// Result types are fixed when a node is created; there is no separate type
// checking pass.

use crate::arena::{DeclId, ExprId, Module, TypeId};
use crate::error::{AstError, AstResult};
use crate::types::TypeKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
        }
    }

    /// C precedence, higher binds tighter
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            Mul | Div | Rem => 10,
            Add | Sub => 9,
            Shl | Shr => 8,
            Lt | Gt | Le | Ge => 7,
            Eq | Ne => 6,
            BitAnd => 5,
            BitXor => 4,
            BitOr => 3,
            And => 2,
            Or => 1,
            _ => 0, // assignments
        }
    }

    pub fn is_assignment(self) -> bool {
        self.precedence() == 0
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }
}

/// Literal with its exact bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Raw IEEE-754 bits, kept exact across serialization
    Float(u32),
}

impl ConstantValue {
    pub fn float(v: f32) -> Self {
        ConstantValue::Float(v.to_bits())
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            ConstantValue::Float(bits) => Some(f32::from_bits(bits)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Result type, derivable from the node and its children
    pub ty: TypeId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Constant(ConstantValue),
    DeclRef(DeclId),
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: ExprId },
    Conditional { cond: ExprId, then_expr: ExprId, else_expr: ExprId },
    Call { callee: DeclId, args: Vec<ExprId> },
    MethodCall { callee: ExprId, args: Vec<ExprId> },
    Construct { args: Vec<ExprId> },
    InitList { exprs: Vec<ExprId> },
    Access { base: ExprId, index: ExprId },
    Field { base: ExprId, field: DeclId },
    Method { base: ExprId, method: DeclId },
    Swizzle { base: ExprId, comps: Vec<u32> },
    This,
    StaticCast { operand: ExprId },
    BitwiseCast { operand: ExprId },
    ImplicitCast { operand: ExprId },
}

impl Module {
    /// Bool type (scalar or vector) matching the dimensionality of `ty`
    pub fn bool_matching_dim(&self, ty: TypeId) -> TypeId {
        match self.type_decl(ty).kind {
            TypeKind::Vector { count, .. } => match count {
                2 => self.builtins.bool2,
                3 => self.builtins.bool3,
                4 => self.builtins.bool4,
                _ => self.builtins.bool_,
            },
            _ => self.builtins.bool_,
        }
    }

    fn binary_result_type(&self, op: BinaryOp, left: TypeId, right: TypeId) -> TypeId {
        if op.is_assignment() {
            return left;
        }
        if op.is_comparison() {
            return self.bool_matching_dim(left);
        }
        // mat * vec and vec * mat produce the vector
        if op == BinaryOp::Mul {
            if self.is_matrix(left) && self.is_vector(right) {
                return right;
            }
            if self.is_vector(left) && self.is_matrix(right) {
                return left;
            }
        }
        // scalar operands broaden to the vector side
        if self.is_vector(left) && self.is_scalar(right) {
            return left;
        }
        if self.is_scalar(left) && self.is_vector(right) {
            return right;
        }
        left
    }

    // --- factories ---------------------------------------------------------

    pub fn constant(&mut self, value: ConstantValue) -> ExprId {
        let ty = match value {
            ConstantValue::Bool(_) => self.builtins.bool_,
            ConstantValue::Int(_) => self.builtins.int_,
            ConstantValue::UInt(_) => self.builtins.uint,
            ConstantValue::Float(_) => self.builtins.float,
        };
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Constant(value),
        })
    }

    pub fn decl_ref(&mut self, decl: DeclId) -> ExprId {
        let ty = self
            .decl(decl)
            .var_type()
            .or_else(|| self.decl(decl).return_type())
            .unwrap_or(self.builtins.void_);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::DeclRef(decl),
        })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        let operand_ty = self.expr(operand).ty;
        let ty = match op {
            UnaryOp::Not => self.bool_matching_dim(operand_ty),
            _ => operand_ty,
        };
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Unary { op, operand },
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let (lt, rt) = (self.expr(left).ty, self.expr(right).ty);
        let ty = self.binary_result_type(op, lt, rt);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Binary { op, left, right },
        })
    }

    pub fn conditional(&mut self, cond: ExprId, then_expr: ExprId, else_expr: ExprId) -> ExprId {
        let ty = self.expr(then_expr).ty;
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
        })
    }

    /// Call of a concrete (non-template) callable
    pub fn call(&mut self, callee: DeclId, args: &[ExprId]) -> ExprId {
        let ty = self.decl(callee).return_type().unwrap_or(self.builtins.void_);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Call {
                callee,
                args: args.to_vec(),
            },
        })
    }

    /// Call through a member expression (see [`Module::method_expr`])
    pub fn method_call(&mut self, callee: ExprId, args: &[ExprId]) -> ExprId {
        let ty = self.expr(callee).ty;
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::MethodCall {
                callee,
                args: args.to_vec(),
            },
        })
    }

    pub fn construct(&mut self, ty: TypeId, args: &[ExprId]) -> ExprId {
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Construct { args: args.to_vec() },
        })
    }

    pub fn init_list(&mut self, exprs: &[ExprId]) -> ExprId {
        let ty = exprs
            .first()
            .map(|&e| self.expr(e).ty)
            .unwrap_or(self.builtins.void_);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::InitList { exprs: exprs.to_vec() },
        })
    }

    pub fn access(&mut self, base: ExprId, index: ExprId) -> ExprId {
        let base_ty = self.expr(base).ty;
        let ty = match self.type_decl(base_ty).kind {
            TypeKind::Vector { element, .. }
            | TypeKind::Array { element, .. }
            | TypeKind::StructuredBuffer { element, .. } => element,
            TypeKind::Matrix { element, n } => {
                self.vector(element, n).unwrap_or(base_ty)
            }
            TypeKind::ByteBuffer { .. } => self.builtins.uint,
            _ => base_ty,
        };
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Access { base, index },
        })
    }

    pub fn field_expr(&mut self, base: ExprId, field: DeclId) -> ExprId {
        let ty = self.decl(field).var_type().unwrap_or(self.builtins.void_);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Field { base, field },
        })
    }

    /// Member expression naming a method, used as a method-call callee
    pub fn method_expr(&mut self, base: ExprId, method: DeclId) -> ExprId {
        let ty = self.decl(method).return_type().unwrap_or(self.builtins.void_);
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Method { base, method },
        })
    }

    pub fn swizzle(&mut self, base: ExprId, comps: &[u32]) -> AstResult<ExprId> {
        let base_ty = self.expr(base).ty;
        let element = self.element_type(base_ty).ok_or_else(|| {
            AstError::QualifierViolation(format!(
                "swizzle applied to non-vector type `{}`",
                self.type_decl(base_ty).name
            ))
        })?;
        let ty = if comps.len() == 1 {
            element
        } else {
            self.vector(element, comps.len() as u32)?
        };
        Ok(self.emplace_expr(Expr {
            ty,
            kind: ExprKind::Swizzle {
                base,
                comps: comps.to_vec(),
            },
        }))
    }

    /// `this` is only meaningful inside a method or constructor body; the
    /// builder trusts the caller on that, matching the other factories.
    pub fn this_expr(&mut self, ty: TypeId) -> ExprId {
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::This,
        })
    }

    pub fn static_cast(&mut self, ty: TypeId, operand: ExprId) -> ExprId {
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::StaticCast { operand },
        })
    }

    pub fn bitwise_cast(&mut self, ty: TypeId, operand: ExprId) -> ExprId {
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::BitwiseCast { operand },
        })
    }

    pub fn implicit_cast(&mut self, ty: TypeId, operand: ExprId) -> ExprId {
        self.emplace_expr(Expr {
            ty,
            kind: ExprKind::ImplicitCast { operand },
        })
    }
}
