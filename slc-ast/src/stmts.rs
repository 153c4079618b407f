// Statements and their factories

use crate::arena::{AttrId, DeclId, ExprId, Module, StmtId, TypeId};
use crate::decls::{Decl, DeclKind, Qualifier};
use crate::error::{AstError, AstResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub attrs: Vec<AttrId>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Compound { stmts: Vec<StmtId> },
    Decl { decl: DeclId },
    DeclGroup { decls: Vec<StmtId> },
    /// An expression in statement position
    Expr { expr: ExprId },
    If {
        cond: ExprId,
        then_body: StmtId,
        else_body: Option<StmtId>,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        inc: Option<StmtId>,
        body: StmtId,
    },
    While { cond: ExprId, body: StmtId },
    Switch { cond: ExprId, cases: Vec<StmtId> },
    Case { value: ExprId, body: StmtId },
    Default { body: StmtId },
    Break,
    Continue,
    Return { value: Option<ExprId> },
    Comment(String),
}

impl Module {
    pub fn block(&mut self, stmts: &[StmtId]) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Compound { stmts: stmts.to_vec() },
        })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Expr { expr },
        })
    }

    /// Declare a local variable and wrap it in a declaration statement.
    /// Returns the statement and the underlying variable declaration.
    pub fn variable(
        &mut self,
        qualifier: Qualifier,
        ty: TypeId,
        name: &str,
        init: Option<ExprId>,
    ) -> AstResult<(StmtId, DeclId)> {
        self.reserved_words_check(name)?;
        if qualifier == Qualifier::Inout {
            return Err(AstError::QualifierViolation(format!(
                "`inout` is not allowed on variable declaration `{}`",
                name
            )));
        }

        let decl = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Var {
                name: name.to_string(),
                ty,
                qualifier,
                init,
            },
        });
        let stmt = self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Decl { decl },
        });
        Ok((stmt, decl))
    }

    pub fn decl_group(&mut self, decls: &[StmtId]) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::DeclGroup { decls: decls.to_vec() },
        })
    }

    pub fn if_stmt(&mut self, cond: ExprId, then_body: StmtId, else_body: Option<StmtId>) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::If {
                cond,
                then_body,
                else_body,
            },
        })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        inc: Option<StmtId>,
        body: StmtId,
    ) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::For { init, cond, inc, body },
        })
    }

    pub fn while_stmt(&mut self, cond: ExprId, body: StmtId) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::While { cond, body },
        })
    }

    pub fn case(&mut self, value: ExprId, body: StmtId) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Case { value, body },
        })
    }

    pub fn default_case(&mut self, body: StmtId) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Default { body },
        })
    }

    pub fn switch(&mut self, cond: ExprId, cases: &[StmtId]) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Switch {
                cond,
                cases: cases.to_vec(),
            },
        })
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Break,
        })
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Continue,
        })
    }

    pub fn return_stmt(&mut self, value: Option<ExprId>) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Return { value },
        })
    }

    pub fn comment(&mut self, text: &str) -> StmtId {
        self.emplace_stmt(Stmt {
            attrs: Vec::new(),
            kind: StmtKind::Comment(text.to_string()),
        })
    }
}
