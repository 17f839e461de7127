//! Recursive-descent parser (component F): one-token lookahead, integrated
//! semantic checks, and boundary-synchronizing error recovery.

use crate::error::ParseError;
use cminus_ast::{
    finalize, ArgDecl, AssignOp, CmpOp, Expr, ExprKind, Function, FunctionId, MathOp, Program,
    Stmt,
};
use cminus_core::{Diagnostic, IdentId, SymbolTable, Token, TokenType, Type};

pub struct ParseOutput {
    pub program: Program,
    pub symbols: SymbolTable,
    pub interner: cminus_core::StringInterner,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses a complete source file. Never panics on malformed input; any
/// unrecoverable condition is recorded as a fatal diagnostic and parsing
/// stops, returning whatever functions were completed so far (P6).
pub fn parse(source: &str) -> ParseOutput {
    let tokens = crate::lexer::scan(source);
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    ParseOutput {
        program,
        symbols: parser.symbols,
        interner: parser.interner,
        diagnostics: parser.diagnostics,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    symbols: SymbolTable,
    interner: cminus_core::StringInterner,
    diagnostics: Vec<Diagnostic>,
    current_return_ty: Type,
    saw_printf_call: bool,
    next_function_id: u32,
    /// Return type + positional parameter types for every function whose
    /// signature has been seen so far, keyed by its identifier. Populated
    /// as soon as a function's parameter list is parsed (before its body),
    /// so a function can call itself recursively and have that call
    /// checked; a call to a function not yet defined at this point in the
    /// file cannot be checked, matching the reference's single-pass,
    /// no-forward-declarations model.
    fn_signatures: std::collections::HashMap<IdentId, (Type, Vec<Type>)>,
}

/// Synchronization targets for a recovery boundary; `synchronize` consumes
/// tokens until it finds (and, unless `consume_after` specifies otherwise,
/// consumes) one of these, or hits EOF.
#[derive(Clone, Copy)]
enum SyncSet {
    Statement,
    CloseParen,
    CloseBracket,
    CloseBrace,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            symbols: SymbolTable::new(),
            interner: cminus_core::StringInterner::new(),
            diagnostics: Vec::new(),
            current_return_ty: Type::Void,
            saw_printf_call: false,
            next_function_id: 0,
            fn_signatures: std::collections::HashMap::new(),
        }
    }

    // -- token cursor -----------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenType {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenType) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenType) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenType, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(ParseError::syntax(
                format!("expected {} but found '{}'", what, tok.text),
                tok.line,
                tok.col,
            ))
        }
    }

    fn is_type_keyword(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenType::KeyVoid | TokenType::KeyInt | TokenType::KeyChar | TokenType::KeyDouble
        )
    }

    fn consume_type_keyword(&mut self) -> Type {
        match self.advance().kind {
            TokenType::KeyVoid => Type::Void,
            TokenType::KeyInt => Type::Int,
            TokenType::KeyChar => Type::Char,
            TokenType::KeyDouble => Type::Double,
            _ => unreachable!("caller checked is_type_keyword"),
        }
    }

    fn diagnose(&mut self, message: impl Into<String>, line: u32, col: u32) {
        self.diagnostics.push(Diagnostic::error(message, line, col));
    }

    /// Scans forward past the offending token until a token in `set` is
    /// seen (consuming it, for statement/paren/bracket/brace boundaries),
    /// or EOF is reached, in which case parsing is unrecoverable.
    fn synchronize(&mut self, set: SyncSet) -> Result<(), ParseError> {
        loop {
            if self.check(TokenType::EndOfFile) {
                return Err(ParseError::UnexpectedEof);
            }
            let hit = match set {
                SyncSet::Statement => self.check(TokenType::SemiColon),
                SyncSet::CloseParen => self.check(TokenType::RParen),
                SyncSet::CloseBracket => self.check(TokenType::RBracket),
                SyncSet::CloseBrace => self.check(TokenType::RBrace),
            };
            if hit {
                self.advance();
                return Ok(());
            }
            self.advance();
        }
    }

    fn lookup_or_diagnose(&mut self, name: &str, line: u32, col: u32) -> IdentId {
        match self.symbols.get_identifier(name) {
            Some(id) => id,
            None => {
                self.diagnose(format!("Use of undeclared identifier '{}'", name), line, col);
                self.symbols.dummy_variable()
            }
        }
    }

    // -- top level ----------------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut functions = Vec::new();
        loop {
            if self.check(TokenType::EndOfFile) {
                break;
            }
            match self.parse_function() {
                Ok(func) => functions.push(func),
                Err(ParseError::UnexpectedEof) => {
                    let tok = self.peek();
                    self.diagnose("Unexpected end of file", tok.line, tok.col);
                    break;
                }
                Err(ParseError::Syntax { message, line, col }) => {
                    self.diagnose(message, line, col);
                    if self.synchronize(SyncSet::CloseBrace).is_err() {
                        let tok = self.peek();
                        self.diagnose("Unexpected end of file", tok.line, tok.col);
                        break;
                    }
                }
            }
        }
        Program { functions }
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let ret_ty = if self.is_type_keyword() {
            self.consume_type_keyword()
        } else {
            let tok = self.peek();
            return Err(ParseError::syntax(
                format!("expected a return type but found '{}'", tok.text),
                tok.line,
                tok.col,
            ));
        };

        let name_tok = self.expect(TokenType::Identifier, "a function name")?;
        let name = name_tok.text.clone();

        let ident = match self.symbols.create_identifier(&name, Type::Function, None) {
            Some(id) => id,
            None => {
                self.diagnose(
                    format!("Invalid redeclaration of function '{}'", name),
                    name_tok.line,
                    name_tok.col,
                );
                self.symbols.dummy_function()
            }
        };

        let scope = self.symbols.enter_scope();

        self.expect(TokenType::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                args.push(self.parse_arg_decl()?);
                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'")?;

        let param_types: Vec<Type> = args.iter().map(|a| self.symbols.ident(a.ident).ty).collect();
        self.fn_signatures.insert(ident, (ret_ty, param_types));

        let saved_return_ty = self.current_return_ty;
        let saved_saw_printf = self.saw_printf_call;
        self.current_return_ty = ret_ty;
        self.saw_printf_call = false;

        let body = self.parse_compound(true)?;
        ensure_terminating_return(&body, ret_ty, &mut self.diagnostics, name_tok.line, name_tok.col);

        let needs_printf = self.saw_printf_call;
        self.current_return_ty = saved_return_ty;
        self.saw_printf_call = saved_saw_printf;

        self.symbols.exit_scope();

        let id = FunctionId(self.next_function_id);
        self.next_function_id += 1;
        self.symbols.ident_mut(ident).function_ref = Some(id.0);

        if name == "main" && (ret_ty != Type::Int || !args.is_empty()) {
            self.diagnose(
                "Function 'main' must return int and take no arguments",
                name_tok.line,
                name_tok.col,
            );
        }

        Ok(Function {
            id,
            ident,
            return_ty: ret_ty,
            args,
            body,
            scope,
            needs_printf,
        })
    }

    fn parse_arg_decl(&mut self) -> Result<ArgDecl, ParseError> {
        if !self.is_type_keyword() {
            let tok = self.peek();
            return Err(ParseError::syntax(
                format!("expected a parameter type but found '{}'", tok.text),
                tok.line,
                tok.col,
            ));
        }
        let base_ty = self.consume_type_keyword();
        let name_tok = self.expect(TokenType::Identifier, "a parameter name")?;

        let ty = if self.matches(TokenType::LBracket) {
            self.expect(TokenType::RBracket, "']'")?;
            base_ty.array_of().unwrap_or(base_ty)
        } else {
            base_ty
        };

        let ident = match self.symbols.create_identifier(&name_tok.text, ty, ty.is_array().then_some(-1)) {
            Some(id) => id,
            None => {
                self.diagnose(
                    format!("Invalid redeclaration of parameter '{}'", name_tok.text),
                    name_tok.line,
                    name_tok.col,
                );
                self.symbols.dummy_variable()
            }
        };
        Ok(ArgDecl { ident })
    }

    // -- statements -----------------------------------------------------

    /// `{ Decl* Stmt* }`. When `is_function_body`, the surrounding scope
    /// has already been entered by `parse_function`.
    fn parse_compound(&mut self, is_function_body: bool) -> Result<Stmt, ParseError> {
        self.expect(TokenType::LBrace, "'{'")?;
        if !is_function_body {
            self.symbols.enter_scope();
        }

        let mut stmts = Vec::new();
        while self.is_type_keyword() {
            match self.parse_declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(ParseError::Syntax { message, line, col }) => {
                    self.diagnose(message, line, col);
                    self.synchronize(SyncSet::Statement)?;
                    stmts.push(Stmt::Null);
                }
                Err(e @ ParseError::UnexpectedEof) => return Err(e),
            }
        }
        while !self.check(TokenType::RBrace) && !self.check(TokenType::EndOfFile) {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(ParseError::Syntax { message, line, col }) => {
                    self.diagnose(message, line, col);
                    self.synchronize(SyncSet::Statement)?;
                    stmts.push(Stmt::Null);
                }
                Err(e @ ParseError::UnexpectedEof) => return Err(e),
            }
        }

        self.expect(TokenType::RBrace, "'}'")?;
        if !is_function_body {
            self.symbols.exit_scope();
        }
        Ok(Stmt::Compound(stmts))
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenType::LBrace => self.parse_compound(false),
            TokenType::KeyIf => self.parse_if(),
            TokenType::KeyWhile => self.parse_while(),
            TokenType::KeyFor => self.parse_for(),
            TokenType::KeyReturn => self.parse_return(),
            TokenType::SemiColon => {
                self.advance();
                Ok(Stmt::Null)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenType::SemiColon, "';'")?;
                Ok(Stmt::ExprStmt(expr))
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(TokenType::RParen, "')'")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.matches(TokenType::KeyElse) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(TokenType::RParen, "')'")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    /// `for ( InitStmt ; CondStmt ; UpdateExpr ) Stmt`. The init-statement
    /// may be a declaration; when it is, its identifier is scoped to the
    /// whole for-statement (init, condition, update, body), entered here
    /// and exited once the body has been parsed.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenType::LParen, "'('")?;

        let scope = self.symbols.enter_scope();

        let init = if self.check(TokenType::SemiColon) {
            self.advance();
            None
        } else if self.is_type_keyword() {
            Some(Box::new(self.parse_declaration()?))
        } else {
            let expr = self.parse_expr()?;
            self.expect(TokenType::SemiColon, "';'")?;
            Some(Box::new(Stmt::ExprStmt(expr)))
        };

        let cond = if self.check(TokenType::SemiColon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenType::SemiColon, "';'")?;

        let update = if self.check(TokenType::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenType::RParen, "')'")?;

        let body = Box::new(self.parse_statement()?);
        self.symbols.exit_scope();

        Ok(Stmt::For {
            scope,
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.advance();
        let expr = if self.check(TokenType::SemiColon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenType::SemiColon, "';'")?;

        let actual_ty = expr.as_ref().map(|e| e.ty).unwrap_or(Type::Void);
        if actual_ty != self.current_return_ty {
            self.diagnose(
                format!(
                    "Return type mismatch: expected {}, found {}",
                    self.current_return_ty, actual_ty
                ),
                kw.line,
                kw.col,
            );
        }
        Ok(Stmt::Return {
            expr,
            line: kw.line,
            col: kw.col,
        })
    }

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        let base_ty = self.consume_type_keyword();
        let name_tok = self.expect(TokenType::Identifier, "a variable name")?;

        let mut declared_size: Option<i64> = None;
        let mut is_array = false;
        if self.matches(TokenType::LBracket) {
            is_array = true;
            if self.check(TokenType::IntLit) {
                let size_tok = self.advance();
                let size: i64 = size_tok.text.parse().unwrap_or(0);
                if size <= 0 || size > 65536 {
                    self.diagnose(
                        format!("Array size {} out of range (1..=65536)", size),
                        size_tok.line,
                        size_tok.col,
                    );
                }
                declared_size = Some(size);
            }
            self.expect(TokenType::RBracket, "']'")?;
        }

        let init = if self.matches(TokenType::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(TokenType::SemiColon, "';'")?;

        let decl_ty = if is_array {
            base_ty.array_of().unwrap_or(base_ty)
        } else {
            base_ty
        };

        if is_array {
            match decl_ty {
                Type::CharArray => {
                    if declared_size.is_none() {
                        match &init {
                            Some(Expr { kind: ExprKind::StringLit(_), .. }) => {}
                            _ => {
                                self.diagnose(
                                    "Char array without explicit size must be initialized with a string literal",
                                    name_tok.line,
                                    name_tok.col,
                                );
                                declared_size = Some(1);
                            }
                        }
                    }
                    if let Some(Expr { kind: ExprKind::StringLit(id), .. }) = &init {
                        let len = self.interner.get(*id).text.as_bytes().len() as i64;
                        match declared_size {
                            Some(size) if len + 1 > size => {
                                self.diagnose(
                                    format!(
                                        "String literal of length {} does not fit in char[{}]",
                                        len, size
                                    ),
                                    name_tok.line,
                                    name_tok.col,
                                );
                            }
                            None => declared_size = Some(len + 1),
                            _ => {}
                        }
                    }
                }
                Type::IntArray | Type::DoubleArray => {
                    if declared_size.is_none() {
                        self.diagnose(
                            format!("Array of {} requires an explicit constant size", base_ty),
                            name_tok.line,
                            name_tok.col,
                        );
                        declared_size = Some(1);
                    }
                    if init.is_some() {
                        self.diagnose(
                            "Aggregate initialization of array types is not supported",
                            name_tok.line,
                            name_tok.col,
                        );
                    }
                }
                _ => {}
            }
        } else if let Some(init_expr) = &init {
            if init_expr.ty != decl_ty {
                self.diagnose(
                    format!(
                        "Initializer type {} does not match declared type {}",
                        init_expr.ty, decl_ty
                    ),
                    name_tok.line,
                    name_tok.col,
                );
            }
        }

        let ident = match self
            .symbols
            .create_identifier(&name_tok.text, decl_ty, declared_size)
        {
            Some(id) => id,
            None => {
                self.diagnose(
                    format!("Invalid redeclaration of variable '{}'", name_tok.text),
                    name_tok.line,
                    name_tok.col,
                );
                self.symbols.dummy_variable()
            }
        };

        Ok(Stmt::Declaration { ident, init })
    }

    // -- expressions ------------------------------------------------------
    //
    // Precedence, loosest to tightest: Assignment (right-assoc) ->
    // LogicalOr -> LogicalAnd -> Comparison -> Additive -> Multiplicative
    // -> Unary `!` -> Primary.

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_logical_or()?;

        let op = match self.peek_kind() {
            TokenType::Assign => Some(AssignOp::Assign),
            TokenType::IncAssign => Some(AssignOp::AddAssign),
            TokenType::MinusAssign => Some(AssignOp::SubAssign),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        let op_tok = self.advance();
        let rhs = self.parse_assignment()?;

        match finalize::finalize_assign(lhs.is_lvalue(), lhs.ty, rhs.ty) {
            Ok(ty) => Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty,
                op_tok.line,
                op_tok.col,
            )),
            Err(e) => {
                self.diagnose(e.to_string(), op_tok.line, op_tok.col);
                Ok(Expr::new(
                    ExprKind::Assign {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    Type::Int,
                    op_tok.line,
                    op_tok.col,
                ))
            }
        }
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_logical_and()?;
        while self.check(TokenType::Or) {
            let tok = self.advance();
            let rhs = self.parse_logical_and()?;
            lhs = self.finish_logical(ExprLogicalKind::Or, lhs, rhs, tok.line, tok.col);
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        while self.check(TokenType::And) {
            let tok = self.advance();
            let rhs = self.parse_comparison()?;
            lhs = self.finish_logical(ExprLogicalKind::And, lhs, rhs, tok.line, tok.col);
        }
        Ok(lhs)
    }

    fn finish_logical(&mut self, kind: ExprLogicalKind, lhs: Expr, rhs: Expr, line: u32, col: u32) -> Expr {
        let (lhs_ty, rhs_ty) = (lhs.ty, rhs.ty);
        let ty = match finalize::finalize_logical(lhs_ty, rhs_ty) {
            Ok(ty) => ty,
            Err(e) => {
                self.diagnose(e.to_string(), line, col);
                Type::Int
            }
        };
        let node = match kind {
            ExprLogicalKind::And => ExprKind::LogicalAnd(Box::new(lhs), Box::new(rhs)),
            ExprLogicalKind::Or => ExprKind::LogicalOr(Box::new(lhs), Box::new(rhs)),
        };
        Expr::new(node, ty, line, col)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenType::EqualTo => CmpOp::Eq,
                TokenType::NotEqual => CmpOp::Ne,
                TokenType::LessThan => CmpOp::Lt,
                TokenType::LThanOrEq => CmpOp::Le,
                TokenType::GreaterThan => CmpOp::Gt,
                TokenType::GThanOrEq => CmpOp::Ge,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_additive()?;
            let ty = match finalize::finalize_cmp(lhs.ty, rhs.ty) {
                Ok(ty) => ty,
                Err(e) => {
                    self.diagnose(e.to_string(), tok.line, tok.col);
                    Type::Int
                }
            };
            lhs = Expr::new(
                ExprKind::BinaryCmp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty,
                tok.line,
                tok.col,
            );
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenType::Plus => MathOp::Add,
                TokenType::Minus => MathOp::Sub,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.finish_math(op, lhs, rhs, tok.line, tok.col);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenType::Mult => MathOp::Mul,
                TokenType::Div => MathOp::Div,
                TokenType::Mod => MathOp::Mod,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.finish_math(op, lhs, rhs, tok.line, tok.col);
        }
        Ok(lhs)
    }

    fn finish_math(&mut self, op: MathOp, lhs: Expr, rhs: Expr, line: u32, col: u32) -> Expr {
        let ty = match finalize::finalize_math(lhs.ty, rhs.ty) {
            Ok(ty) => ty,
            Err(e) => {
                self.diagnose(e.to_string(), line, col);
                Type::Int
            }
        };
        Expr::new(
            ExprKind::BinaryMath {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            line,
            col,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenType::Not) {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            if operand.ty != Type::Int {
                self.diagnose(
                    format!("Operand to '!' must be int, found {}", operand.ty),
                    tok.line,
                    tok.col,
                );
            }
            return Ok(Expr::new(ExprKind::Not(Box::new(operand)), Type::Int, tok.line, tok.col));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenType::RParen, "')'")?;
                Ok(inner)
            }
            TokenType::IntLit => {
                let tok = self.advance();
                let value: i64 = tok.text.parse().unwrap_or(0);
                Ok(Expr::new(ExprKind::IntLit(value), Type::Int, tok.line, tok.col))
            }
            TokenType::DoubleLit => {
                let tok = self.advance();
                let value: f64 = tok.text.parse().unwrap_or(0.0);
                Ok(Expr::new(ExprKind::DoubleLit(value), Type::Double, tok.line, tok.col))
            }
            TokenType::CharLit => {
                let tok = self.advance();
                let byte = tok.text.as_bytes().first().copied().unwrap_or(0);
                Ok(Expr::new(ExprKind::CharLit(byte), Type::Char, tok.line, tok.col))
            }
            TokenType::StringLit => {
                let tok = self.advance();
                let id = self.interner.intern(&tok.text);
                Ok(Expr::new(ExprKind::StringLit(id), Type::CharArray, tok.line, tok.col))
            }
            TokenType::Inc | TokenType::Dec => {
                let op_tok = self.advance();
                let name_tok = self.expect(TokenType::Identifier, "an identifier")?;
                let ident = self.lookup_or_diagnose(&name_tok.text, name_tok.line, name_tok.col);
                let ty = self.symbols.ident(ident).ty;
                if !ty.is_numeric_scalar() {
                    self.diagnose(
                        format!("Operand to '++'/'--' must be a scalar variable, found {}", ty),
                        op_tok.line,
                        op_tok.col,
                    );
                }
                let kind = if op_tok.kind == TokenType::Inc {
                    ExprKind::PreIncrement(ident)
                } else {
                    ExprKind::PreDecrement(ident)
                };
                Ok(Expr::new(kind, ty, op_tok.line, op_tok.col))
            }
            TokenType::Addr => {
                let addr_tok = self.advance();
                let name_tok = self.expect(TokenType::Identifier, "an identifier")?;
                let ident = self.lookup_or_diagnose(&name_tok.text, name_tok.line, name_tok.col);
                self.expect(TokenType::LBracket, "'['")?;
                let index = self.parse_expr()?;
                match self.expect(TokenType::RBracket, "']'") {
                    Ok(_) => {}
                    Err(e) => {
                        let ParseError::Syntax { message, line, col } = e else { unreachable!() };
                        self.diagnose(message, line, col);
                        self.synchronize(SyncSet::CloseBracket)?;
                    }
                }
                let array_ty = self.symbols.ident(ident).ty;
                if !array_ty.is_array() {
                    self.diagnose(
                        format!("Cannot subscript non-array identifier '{}'", name_tok.text),
                        name_tok.line,
                        name_tok.col,
                    );
                }
                Ok(Expr::new(
                    ExprKind::AddrOfArrayElement {
                        array: ident,
                        index: Box::new(index),
                    },
                    Type::Int,
                    addr_tok.line,
                    addr_tok.col,
                ))
            }
            TokenType::Identifier => self.parse_ident_primary(),
            _ => {
                let tok = self.peek();
                Err(ParseError::syntax(
                    format!("expected an expression but found '{}'", tok.text),
                    tok.line,
                    tok.col,
                ))
            }
        }
    }

    /// Handles the common left prefix `id`, `id[expr]`, and `id(args)`.
    fn parse_ident_primary(&mut self) -> Result<Expr, ParseError> {
        let name_tok = self.advance();
        let ident = self.lookup_or_diagnose(&name_tok.text, name_tok.line, name_tok.col);
        let ty = self.symbols.ident(ident).ty;

        if self.matches(TokenType::LBracket) {
            if !ty.is_array() {
                self.diagnose(
                    format!("Cannot subscript non-array identifier '{}'", name_tok.text),
                    name_tok.line,
                    name_tok.col,
                );
            }
            let index = self.parse_expr()?;
            match self.expect(TokenType::RBracket, "']'") {
                Ok(_) => {}
                Err(e) => {
                    let ParseError::Syntax { message, line, col } = e else { unreachable!() };
                    self.diagnose(message, line, col);
                    self.synchronize(SyncSet::CloseBracket)?;
                }
            }
            let elem_ty = ty.array_element().unwrap_or(Type::Int);
            return Ok(Expr::new(
                ExprKind::ArraySubscript {
                    array: ident,
                    index: Box::new(index),
                },
                elem_ty,
                name_tok.line,
                name_tok.col,
            ));
        }

        if self.matches(TokenType::LParen) {
            if ty != Type::Function {
                self.diagnose(
                    format!("Cannot call non-function identifier '{}'", name_tok.text),
                    name_tok.line,
                    name_tok.col,
                );
            }
            let mut args = Vec::new();
            if !self.check(TokenType::RParen) {
                loop {
                    args.push(self.parse_expr()?);
                    if !self.matches(TokenType::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenType::RParen, "')'")?;
            self.check_call_args(&name_tok.text, ident, &args, name_tok.line, name_tok.col);
            let ret_ty = self.callee_return_type(&name_tok.text, ident);
            return Ok(Expr::new(
                ExprKind::FunctionCall { callee: ident, args },
                ret_ty,
                name_tok.line,
                name_tok.col,
            ));
        }

        Ok(Expr::new(ExprKind::IdentRef(ident), ty, name_tok.line, name_tok.col))
    }

    fn callee_return_type(&self, name: &str, ident: IdentId) -> Type {
        if name == "printf" {
            return Type::Int;
        }
        self.fn_signatures.get(&ident).map(|(ret, _)| *ret).unwrap_or(Type::Int)
    }

    /// I3: argument count and positional types are checked against the
    /// callee's signature, except for the variadic `printf`, whose only
    /// requirement is a CharArray first argument.
    fn check_call_args(&mut self, name: &str, ident: IdentId, args: &[Expr], line: u32, col: u32) {
        if name == "printf" {
            self.saw_printf_call = true;
            if args.is_empty() {
                self.diagnose("'printf' requires at least one argument", line, col);
            } else if args[0].ty != Type::CharArray {
                self.diagnose(
                    format!("First argument to 'printf' must be char[], found {}", args[0].ty),
                    line,
                    col,
                );
            }
            return;
        }
        if self.symbols.ident(ident).is_dummy() {
            return;
        }
        let Some((_, params)) = self.fn_signatures.get(&ident).cloned() else {
            self.diagnose(
                format!("Call to '{}' before its signature is known", name),
                line,
                col,
            );
            return;
        };
        if params.len() != args.len() {
            self.diagnose(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    name,
                    params.len(),
                    args.len()
                ),
                line,
                col,
            );
            return;
        }
        for (i, (param_ty, arg)) in params.iter().zip(args.iter()).enumerate() {
            if *param_ty != arg.ty {
                self.diagnose(
                    format!(
                        "Argument {} to '{}' has type {}, expected {}",
                        i + 1,
                        name,
                        arg.ty,
                        param_ty
                    ),
                    line,
                    col,
                );
            }
        }
    }
}

enum ExprLogicalKind {
    And,
    Or,
}

/// I6: a non-void body must terminate with a Return on every path; a void
/// body gets an implicit trailing Return synthesized in its place.
fn ensure_terminating_return(
    body: &Stmt,
    return_ty: Type,
    diagnostics: &mut Vec<Diagnostic>,
    line: u32,
    col: u32,
) {
    if return_ty != Type::Void && !stmt_always_terminates(body) {
        diagnostics.push(Diagnostic::error(
            "Non-void function body must terminate with a return statement",
            line,
            col,
        ));
    }
    // A missing trailing return in a void function is synthesized by the
    // IR builder (it always appends an implicit `ret void` to a function's
    // last block if the block has no terminator yet), so no AST rewrite is
    // needed here.
}

/// True iff every control-flow path through `stmt` ends in a Return.
/// `If` requires both branches to terminate; loops are never considered
/// terminating since their body may run zero times.
fn stmt_always_terminates(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::Compound(stmts) => stmts.last().is_some_and(stmt_always_terminates),
        Stmt::If { then_branch, else_branch, .. } => else_branch
            .as_deref()
            .is_some_and(|e| stmt_always_terminates(then_branch) && stmt_always_terminates(e)),
        Stmt::While { .. } | Stmt::For { .. } | Stmt::Declaration { .. } | Stmt::ExprStmt(_) | Stmt::Null => false,
    }
}
