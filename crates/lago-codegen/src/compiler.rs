use std::collections::HashMap;

use lago_lang::ast::{
    Call, Elif, Expr, ExprKind, For, FuncDecl, If, InfixExpr, InfixOp, Location, PrefixExpr,
    PrefixOp, Program, Stmt, StmtKind, While,
};
use smol_str::SmolStr;
use tracing::debug;

use crate::{
    error::{CompileError, CompileErrorKind, CompileResult},
    func::FuncBuilder,
    module::{FuncType, ModuleBuilder},
    opcode::{BlockType, Opcode, ValType},
    runtime,
};

/// A successfully compiled module.
#[derive(Debug)]
pub struct Compilation {
    /// The complete WebAssembly module.
    pub bytes: Vec<u8>,
    /// The raw data-segment payload: each distinct string literal in
    /// first-encounter order, zero-terminated.
    pub strings: Vec<u8>,
}

/// Compile a program in one AST walk. See [`Compiler::compile`].
pub fn compile(program: &Program) -> CompileResult<Compilation> {
    Compiler::new().compile(program)
}

/// The code generator. Walks a [`Program`] once, emitting `main` and each
/// user function body, then assembles the module around them together with
/// the runtime helper suite.
#[derive(Debug, Default)]
pub struct Compiler {
    strings: StringTable,
    funcs: HashMap<SmolStr, FuncInfo>,
    // Compiled user functions, indexed by `function index - FIRST_USER`.
    // Slots are reserved at declaration and filled once the body is done,
    // which keeps indices stable when declarations nest.
    users: Vec<Option<UserFunc>>,
    scopes: Scopes,
    in_function: bool,
}

#[derive(Debug, Clone, Copy)]
struct FuncInfo {
    index: u32,
    arity: usize,
    returns: bool,
}

#[derive(Debug)]
struct UserFunc {
    arity: usize,
    returns: bool,
    body: Vec<u8>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(mut self, program: &Program) -> CompileResult<Compilation> {
        debug!(
            "began compiling program with {} statement(s)",
            program.body.len()
        );
        let mut main = FuncBuilder::new();
        self.scopes.push_frame();
        for stmt in &program.body {
            self.stmt(stmt, &mut main)?;
        }
        let main_locals = self.scopes.next_local;
        let main_body = main.finish(&[(main_locals, ValType::I32)]);

        let mut module = ModuleBuilder::new(self.strings.data.clone());
        let main_ty = module.intern_type(FuncType::new(vec![], vec![]));
        module.push_func(main_ty, main_body);
        for (ty, body) in runtime::helpers() {
            let ty = module.intern_type(ty);
            module.push_func(ty, body);
        }
        for user in self.users {
            let user = user.expect("every registered function should have a compiled body");
            let results = if user.returns {
                vec![ValType::I32]
            } else {
                vec![]
            };
            let ty = module.intern_type(FuncType::new(vec![ValType::I32; user.arity], results));
            module.push_func(ty, user.body);
        }
        debug!("finished compiling");
        Ok(Compilation {
            bytes: module.finish(),
            strings: self.strings.data,
        })
    }

    fn stmt(&mut self, stmt: &Stmt, f: &mut FuncBuilder) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Print(e) => {
                self.expr(e, f)?;
                f.call(runtime::PRINT);
            }
            StmtKind::Println(e) => {
                self.expr(e, f)?;
                f.call(runtime::PRINTLN);
            }
            StmtKind::Assign { name, value } => {
                self.expr(value, f)?;
                let slot = self.scopes.assign(name);
                f.local_set(slot);
            }
            StmtKind::LocalAssign { name, value } => {
                self.expr(value, f)?;
                let Some(slot) = self.scopes.declare_local(name) else {
                    return Err(error(
                        CompileErrorKind::DuplicateLocal(name.clone()),
                        stmt.loc,
                        name.len(),
                    ));
                };
                f.local_set(slot);
            }
            StmtKind::If(if_) => self.stmt_if(if_, f)?,
            StmtKind::While(while_) => self.stmt_while(while_, f)?,
            StmtKind::For(for_) => self.stmt_for(for_, f)?,
            StmtKind::FuncDecl(decl) => self.func_decl(decl, stmt.loc)?,
            StmtKind::Ret(e) => {
                self.expr(e, f)?;
                if self.in_function {
                    f.op(Opcode::Return);
                } else {
                    // `ret` outside a function parses, but trips at runtime.
                    f.op(Opcode::Drop);
                    f.op(Opcode::Unreachable);
                }
            }
            StmtKind::Expr(e) => {
                // A call to a void function leaves nothing on the stack;
                // every other expression's value gets dropped.
                if let ExprKind::Call(call) = &e.kind {
                    let info = self.resolve_call(call, e.loc)?;
                    for arg in &call.args {
                        self.expr(arg, f)?;
                    }
                    f.call(info.index);
                    if info.returns {
                        f.op(Opcode::Drop);
                    }
                } else {
                    self.expr(e, f)?;
                    f.op(Opcode::Drop);
                }
            }
        }
        Ok(())
    }

    /// Compile a statement list in its own scope frame.
    fn block(&mut self, stmts: &[Stmt], f: &mut FuncBuilder) -> CompileResult<()> {
        self.scopes.push_frame();
        for stmt in stmts {
            self.stmt(stmt, f)?;
        }
        self.scopes.pop_frame();
        Ok(())
    }

    fn stmt_if(&mut self, if_: &If, f: &mut FuncBuilder) -> CompileResult<()> {
        self.expr(&if_.cond, f)?;
        f.call(runtime::IS_TRUTHY);
        f.if_(BlockType::Void);
        self.block(&if_.then, f)?;
        if !if_.elifs.is_empty() || if_.else_.is_some() {
            f.else_();
            self.elif_chain(&if_.elifs, if_.else_.as_deref(), f)?;
        }
        f.end();
        Ok(())
    }

    /// Each elif becomes an `if` nested in the previous branch's `else`, so
    /// the surface chain compiles to well-nested conditionals.
    fn elif_chain(
        &mut self,
        elifs: &[Elif],
        else_: Option<&[Stmt]>,
        f: &mut FuncBuilder,
    ) -> CompileResult<()> {
        let Some((head, rest)) = elifs.split_first() else {
            if let Some(body) = else_ {
                self.block(body, f)?;
            }
            return Ok(());
        };
        self.expr(&head.cond, f)?;
        f.call(runtime::IS_TRUTHY);
        f.if_(BlockType::Void);
        self.block(&head.body, f)?;
        if !rest.is_empty() || else_.is_some() {
            f.else_();
            self.elif_chain(rest, else_, f)?;
        }
        f.end();
        Ok(())
    }

    fn stmt_while(&mut self, while_: &While, f: &mut FuncBuilder) -> CompileResult<()> {
        f.block(BlockType::Void);
        f.loop_(BlockType::Void);
        self.expr(&while_.cond, f)?;
        f.call(runtime::IS_TRUTHY);
        f.op(Opcode::I32Eqz);
        f.br_if(1);
        self.block(&while_.body, f)?;
        f.br(0);
        f.end();
        f.end();
        Ok(())
    }

    fn stmt_for(&mut self, for_: &For, f: &mut FuncBuilder) -> CompileResult<()> {
        // The loop variable lives in its own frame, shadowing any outer
        // binding. Start/end/step evaluate once, before the first test; the
        // direction flag is computed from the step's sign and dispatches the
        // termination test each iteration.
        self.scopes.push_frame();
        self.expr(&for_.start, f)?;
        let var = self.scopes.declare(&for_.var);
        f.local_set(var);
        self.expr(&for_.end, f)?;
        let end = self.scopes.hidden();
        f.local_set(end);
        match &for_.step {
            Some(step) => self.expr(step, f)?,
            None => {
                f.f64_const(1.0);
                f.call(runtime::BOX_NUMBER);
            }
        }
        let step = self.scopes.hidden();
        f.local_set(step);
        let descending = self.scopes.hidden();
        f.local_get(step);
        f.call(runtime::TO_NUMBER);
        f.f64_const(0.0);
        f.op(Opcode::F64Lt);
        f.local_set(descending);

        f.block(BlockType::Void);
        f.loop_(BlockType::Void);
        f.local_get(descending);
        f.if_(BlockType::I32);
        {
            f.local_get(var);
            f.call(runtime::TO_NUMBER);
            f.local_get(end);
            f.call(runtime::TO_NUMBER);
            f.op(Opcode::F64Lt);
        }
        f.else_();
        {
            f.local_get(var);
            f.call(runtime::TO_NUMBER);
            f.local_get(end);
            f.call(runtime::TO_NUMBER);
            f.op(Opcode::F64Gt);
        }
        f.end();
        f.br_if(1);
        self.block(&for_.body, f)?;
        f.local_get(var);
        f.call(runtime::TO_NUMBER);
        f.local_get(step);
        f.call(runtime::TO_NUMBER);
        f.op(Opcode::F64Add);
        f.call(runtime::BOX_NUMBER);
        f.local_set(var);
        f.br(0);
        f.end();
        f.end();
        self.scopes.pop_frame();
        Ok(())
    }

    fn func_decl(&mut self, decl: &FuncDecl, loc: Location) -> CompileResult<()> {
        if self.funcs.contains_key(&decl.name) {
            return Err(error(
                CompileErrorKind::FunctionRedefined(decl.name.clone()),
                loc,
                decl.name.len(),
            ));
        }
        let returns = block_returns(&decl.body);
        let index = runtime::FIRST_USER + self.users.len() as u32;
        let slot = self.users.len();
        self.users.push(None);
        // Registered before the body compiles, so recursive calls resolve.
        self.funcs.insert(
            decl.name.clone(),
            FuncInfo {
                index,
                arity: decl.params.len(),
                returns,
            },
        );
        debug!(
            "compiling function `{}` at index {index} (returns: {returns})",
            decl.name
        );

        // Function bodies do not see their caller's locals: swap in a fresh
        // scope stack and local-index counter, restoring them afterwards.
        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_in_function = self.in_function;
        self.in_function = true;
        self.scopes.push_frame();
        for param in &decl.params {
            self.scopes.declare(param);
        }
        let mut f = FuncBuilder::new();
        let mut result = Ok(());
        for stmt in &decl.body {
            result = self.stmt(stmt, &mut f);
            if result.is_err() {
                break;
            }
        }
        let extra_locals = self.scopes.next_local - decl.params.len() as u32;
        self.scopes = saved_scopes;
        self.in_function = saved_in_function;
        result?;

        if returns {
            // Falling off the end of a value-returning function yields nil.
            f.call(runtime::BOX_NIL);
        }
        self.users[slot] = Some(UserFunc {
            arity: decl.params.len(),
            returns,
            body: f.finish(&[(extra_locals, ValType::I32)]),
        });
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, f: &mut FuncBuilder) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Number(n) => {
                f.f64_const(*n);
                f.call(runtime::BOX_NUMBER);
            }
            ExprKind::String(s) => {
                let (offset, len) = self.strings.intern(s);
                f.i32_const(offset as i32);
                f.i32_const(len as i32);
                f.call(runtime::BOX_STRING);
            }
            ExprKind::Bool(b) => {
                f.i32_const(*b as i32);
                f.call(runtime::BOX_BOOL);
            }
            ExprKind::Ident(name) => {
                let Some(slot) = self.scopes.lookup(name) else {
                    return Err(error(
                        CompileErrorKind::UnknownVariable(name.clone()),
                        expr.loc,
                        name.len(),
                    ));
                };
                f.local_get(slot);
            }
            ExprKind::Grouping(inner) => self.expr(inner, f)?,
            ExprKind::Prefix(prefix) => self.prefix(prefix, f)?,
            ExprKind::Infix(infix) => self.infix(infix, f)?,
            ExprKind::Call(call) => {
                let info = self.resolve_call(call, expr.loc)?;
                for arg in &call.args {
                    self.expr(arg, f)?;
                }
                f.call(info.index);
                if !info.returns {
                    // A void callee in value position produces nil.
                    f.call(runtime::BOX_NIL);
                }
            }
        }
        Ok(())
    }

    fn prefix(&mut self, prefix: &PrefixExpr, f: &mut FuncBuilder) -> CompileResult<()> {
        match prefix.op {
            PrefixOp::Sign => self.expr(&prefix.expr, f)?,
            PrefixOp::Neg => {
                if let ExprKind::Number(n) = prefix.expr.kind {
                    // Fold negated literals into one constant.
                    f.f64_const(-n);
                    f.call(runtime::BOX_NUMBER);
                } else {
                    self.expr(&prefix.expr, f)?;
                    f.call(runtime::TO_NUMBER);
                    f.op(Opcode::F64Neg);
                    f.call(runtime::BOX_NUMBER);
                }
            }
            PrefixOp::Not => {
                self.expr(&prefix.expr, f)?;
                f.call(runtime::TO_NUMBER);
                f.f64_const(0.0);
                f.op(Opcode::F64Eq);
                f.call(runtime::BOX_BOOL);
            }
        }
        Ok(())
    }

    fn infix(&mut self, infix: &InfixExpr, f: &mut FuncBuilder) -> CompileResult<()> {
        match infix.op {
            // `+` dispatches at runtime between addition and concatenation.
            InfixOp::Add => {
                self.expr(&infix.lhs, f)?;
                self.expr(&infix.rhs, f)?;
                f.call(runtime::ADD_VALUES);
            }
            InfixOp::Sub | InfixOp::Mul | InfixOp::Div => {
                let op = match infix.op {
                    InfixOp::Sub => Opcode::F64Sub,
                    InfixOp::Mul => Opcode::F64Mul,
                    InfixOp::Div => Opcode::F64Div,
                    _ => unreachable!(),
                };
                self.numeric_operands(infix, f)?;
                f.op(op);
                f.call(runtime::BOX_NUMBER);
            }
            InfixOp::Mod => {
                self.numeric_operands(infix, f)?;
                f.call(runtime::NUM_MOD);
                f.call(runtime::BOX_NUMBER);
            }
            InfixOp::Pow => {
                self.numeric_operands(infix, f)?;
                f.call(runtime::NUM_POW);
                f.call(runtime::BOX_NUMBER);
            }
            InfixOp::Eq
            | InfixOp::Ne
            | InfixOp::Lt
            | InfixOp::Gt
            | InfixOp::Le
            | InfixOp::Ge => {
                let op = match infix.op {
                    InfixOp::Eq => Opcode::F64Eq,
                    InfixOp::Ne => Opcode::F64Ne,
                    InfixOp::Lt => Opcode::F64Lt,
                    InfixOp::Gt => Opcode::F64Gt,
                    InfixOp::Le => Opcode::F64Le,
                    InfixOp::Ge => Opcode::F64Ge,
                    _ => unreachable!(),
                };
                self.numeric_operands(infix, f)?;
                f.op(op);
                f.call(runtime::BOX_BOOL);
            }
            // Short-circuit operators spill the first operand to the scratch
            // slot so the untaken branch can produce it unevaluated.
            InfixOp::And => {
                let scratch = self.scopes.scratch_slot();
                self.expr(&infix.lhs, f)?;
                f.local_tee(scratch);
                f.call(runtime::IS_TRUTHY);
                f.if_(BlockType::I32);
                self.expr(&infix.rhs, f)?;
                f.else_();
                f.local_get(scratch);
                f.end();
            }
            InfixOp::Or => {
                let scratch = self.scopes.scratch_slot();
                self.expr(&infix.lhs, f)?;
                f.local_tee(scratch);
                f.call(runtime::IS_TRUTHY);
                f.if_(BlockType::I32);
                f.local_get(scratch);
                f.else_();
                self.expr(&infix.rhs, f)?;
                f.end();
            }
        }
        Ok(())
    }

    /// Compile both operands of an infix expression, coercing each to f64.
    fn numeric_operands(&mut self, infix: &InfixExpr, f: &mut FuncBuilder) -> CompileResult<()> {
        self.expr(&infix.lhs, f)?;
        f.call(runtime::TO_NUMBER);
        self.expr(&infix.rhs, f)?;
        f.call(runtime::TO_NUMBER);
        Ok(())
    }

    fn resolve_call(&self, call: &Call, loc: Location) -> CompileResult<FuncInfo> {
        let Some(&info) = self.funcs.get(&call.name) else {
            return Err(error(
                CompileErrorKind::UnknownFunction(call.name.clone()),
                loc,
                call.name.len(),
            ));
        };
        if info.arity != call.args.len() {
            return Err(error(
                CompileErrorKind::ArityMismatch {
                    name: call.name.clone(),
                    expected: info.arity,
                    got: call.args.len(),
                },
                loc,
                call.name.len(),
            ));
        }
        Ok(info)
    }
}

fn error(kind: CompileErrorKind, loc: Location, len: usize) -> CompileError {
    CompileError {
        kind,
        line: loc.start.line,
        column: loc.start.column,
        len,
    }
}

/// Whether a statement list contains a `ret` on any path, which decides the
/// enclosing function's result type. Nested function declarations do not
/// count.
fn block_returns(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Ret(_) => true,
        StmtKind::If(if_) => {
            block_returns(&if_.then)
                || if_.elifs.iter().any(|elif| block_returns(&elif.body))
                || if_.else_.as_ref().is_some_and(|body| block_returns(body))
        }
        StmtKind::While(while_) => block_returns(&while_.body),
        StmtKind::For(for_) => block_returns(&for_.body),
        _ => false,
    })
}

/// Interns string literals into the module's data segment. Duplicate
/// literals share one zero-terminated entry.
#[derive(Debug, Default)]
struct StringTable {
    data: Vec<u8>,
    offsets: HashMap<SmolStr, (u32, u32)>,
}

impl StringTable {
    /// Intern a literal, returning its `(offset, length)` in the data
    /// segment.
    fn intern(&mut self, s: &str) -> (u32, u32) {
        if let Some(&entry) = self.offsets.get(s) {
            return entry;
        }
        let entry = (self.data.len() as u32, s.len() as u32);
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        self.offsets.insert(SmolStr::new(s), entry);
        debug!("interned string literal at offset {}", entry.0);
        entry
    }
}

/// Scope frames and the per-function local-index allocator. All locals are
/// i32 boxed pointers; `next_local` only ever grows within one function.
#[derive(Debug, Default)]
struct Scopes {
    frames: Vec<HashMap<SmolStr, u32>>,
    next_local: u32,
    scratch: Option<u32>,
}

impl Scopes {
    fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop_frame(&mut self) {
        self.frames.pop().expect("should always pop a frame");
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    /// Bind `name` to a fresh slot in the innermost frame.
    fn declare(&mut self, name: &SmolStr) -> u32 {
        let slot = self.next_local;
        self.next_local += 1;
        self.frames
            .last_mut()
            .expect("should always have a frame")
            .insert(name.clone(), slot);
        slot
    }

    /// Bind a `local` declaration, refusing a duplicate in the same frame.
    /// Shadowing an outer frame's binding is fine.
    fn declare_local(&mut self, name: &SmolStr) -> Option<u32> {
        let frame = self.frames.last().expect("should always have a frame");
        if frame.contains_key(name) {
            return None;
        }
        Some(self.declare(name))
    }

    /// Resolve a plain assignment: an existing binding anywhere in the
    /// stack, or a new one in the innermost frame.
    fn assign(&mut self, name: &SmolStr) -> u32 {
        match self.lookup(name) {
            Some(slot) => slot,
            None => self.declare(name),
        }
    }

    /// The function's shared scratch slot, reserved on first use.
    fn scratch_slot(&mut self) -> u32 {
        match self.scratch {
            Some(slot) => slot,
            None => {
                let slot = self.next_local;
                self.next_local += 1;
                self.scratch = Some(slot);
                slot
            }
        }
    }

    /// An anonymous slot, used by for-loop bookkeeping.
    fn hidden(&mut self) -> u32 {
        let slot = self.next_local;
        self.next_local += 1;
        slot
    }
}
