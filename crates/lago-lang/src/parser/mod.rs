pub mod ast;
mod error;
pub mod lexer;

pub use self::error::*;
use self::{
    ast::{
        Call, Elif, Expr, ExprKind, For, FuncDecl, If, InfixExpr, InfixOp, Location, PrefixExpr,
        PrefixOp, Program, Stmt, StmtKind, While,
    },
    lexer::{Token, TokenKind},
};
use tracing::debug;

/// The parser for lago source. Consumes a token stream produced by
/// [`lexer::Lexer`] and produces a [`Program`].
///
/// There is no recovery: the first error aborts the parse, carrying the
/// statements completed so far in [`ParseError::partial`].
#[derive(Debug)]
pub struct Parser<'tok> {
    tokens: &'tok [Token],
    idx: usize,
    current: Token,
}

impl<'tok> Parser<'tok> {
    pub fn new(tokens: &'tok [Token]) -> Self {
        Self {
            tokens,
            idx: 0,
            current: tokens.first().cloned().unwrap_or_else(Token::eof),
        }
    }

    pub fn parse(mut self) -> ParseResult<Program> {
        debug!("began parsing");
        let mut body = vec![];
        self.skip_comments();
        while self.current.kind != TokenKind::Eof {
            match self.parse_stmt() {
                Ok(stmt) => body.push(stmt),
                Err(mut err) => {
                    err.partial = Program { body };
                    return Err(err);
                }
            }
            self.next_token();
            self.skip_comments();
        }
        debug!("finished parsing {} statements", body.len());
        Ok(Program { body })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.current.kind {
            TokenKind::Print | TokenKind::Println => self.parse_print(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Func => self.parse_func(),
            TokenKind::Ret => self.parse_ret(),
            TokenKind::Local => self.parse_local(),
            TokenKind::Ident if self.peek_kind() == TokenKind::ColonAssign => self.parse_assign(),
            _ => {
                let expr = self.parse_expr(Precedence::Lowest)?;
                Ok(Stmt {
                    loc: expr.loc,
                    kind: StmtKind::Expr(expr),
                })
            }
        }
    }

    fn parse_print(&mut self) -> ParseResult<Stmt> {
        let start = Location::of(&self.current);
        let println = self.current.kind == TokenKind::Println;
        self.next_token();
        let expr = self.parse_expr(Precedence::Lowest)?;
        let loc = Location::span(start, expr.loc);
        let kind = if println {
            StmtKind::Println(expr)
        } else {
            StmtKind::Print(expr)
        };
        Ok(Stmt { kind, loc })
    }

    fn parse_assign(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::Ident);
        let start = Location::of(&self.current);
        let name = self.current.text.clone();
        self.next_token();
        debug_assert_eq!(self.current.kind, TokenKind::ColonAssign);
        self.next_token();
        let value = self.parse_expr(Precedence::Lowest)?;
        let loc = Location::span(start, value.loc);
        debug!("parsed assignment to `{name}`");
        Ok(Stmt {
            kind: StmtKind::Assign { name, value },
            loc,
        })
    }

    fn parse_local(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::Local);
        let start = Location::of(&self.current);
        self.expect_next(TokenKind::Ident, "identifier after 'local'")?;
        let name = self.current.text.clone();
        self.expect_next(TokenKind::ColonAssign, "':='")?;
        self.next_token();
        let value = self.parse_expr(Precedence::Lowest)?;
        let loc = Location::span(start, value.loc);
        debug!("parsed local declaration of `{name}`");
        Ok(Stmt {
            kind: StmtKind::LocalAssign { name, value },
            loc,
        })
    }

    fn parse_ret(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::Ret);
        let start = Location::of(&self.current);
        self.next_token();
        let expr = self.parse_expr(Precedence::Lowest)?;
        let loc = Location::span(start, expr.loc);
        Ok(Stmt {
            kind: StmtKind::Ret(expr),
            loc,
        })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::If);
        debug!("began parsing if statement");
        let start = Location::of(&self.current);
        self.next_token();
        let cond = self.parse_expr(Precedence::Lowest)?;
        self.expect_next(TokenKind::Then, "'then' after if condition")?;
        self.next_token();
        let then = self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;
        let mut elifs = vec![];
        while self.current.kind == TokenKind::Elif {
            self.next_token();
            let cond = self.parse_expr(Precedence::Lowest)?;
            self.expect_next(TokenKind::Then, "'then' after elif condition")?;
            self.next_token();
            let body = self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;
            elifs.push(Elif { cond, body });
        }
        let else_ = if self.current.kind == TokenKind::Else {
            self.next_token();
            Some(self.parse_block(&[TokenKind::End])?)
        } else {
            None
        };
        debug_assert_eq!(self.current.kind, TokenKind::End);
        let loc = Location::span(start, Location::of(&self.current));
        debug!("successfully parsed if statement");
        Ok(Stmt {
            kind: StmtKind::If(If {
                cond,
                then,
                elifs,
                else_,
            }),
            loc,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::While);
        debug!("began parsing while statement");
        let start = Location::of(&self.current);
        self.next_token();
        let cond = self.parse_expr(Precedence::Lowest)?;
        self.expect_next(TokenKind::Do, "'do' after while condition")?;
        self.next_token();
        let body = self.parse_block(&[TokenKind::End])?;
        let loc = Location::span(start, Location::of(&self.current));
        debug!("successfully parsed while statement");
        Ok(Stmt {
            kind: StmtKind::While(While { cond, body }),
            loc,
        })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::For);
        debug!("began parsing for statement");
        let start = Location::of(&self.current);
        self.expect_next(TokenKind::Ident, "identifier after 'for'")?;
        let var = self.current.text.clone();
        self.expect_next(TokenKind::ColonAssign, "':='")?;
        self.next_token();
        let start_expr = self.parse_expr(Precedence::Lowest)?;
        self.expect_next(TokenKind::Comma, "',' after for start value")?;
        self.next_token();
        let end_expr = self.parse_expr(Precedence::Lowest)?;
        let step = if self.peek_kind() == TokenKind::Comma {
            self.next_token();
            self.next_token();
            Some(self.parse_expr(Precedence::Lowest)?)
        } else {
            None
        };
        self.expect_next(TokenKind::Do, "'do' after for header")?;
        self.next_token();
        let body = self.parse_block(&[TokenKind::End])?;
        let loc = Location::span(start, Location::of(&self.current));
        debug!("successfully parsed for statement over `{var}`");
        Ok(Stmt {
            kind: StmtKind::For(For {
                var,
                start: start_expr,
                end: end_expr,
                step,
                body,
            }),
            loc,
        })
    }

    fn parse_func(&mut self) -> ParseResult<Stmt> {
        debug_assert_eq!(self.current.kind, TokenKind::Func);
        debug!("began parsing function declaration");
        let start = Location::of(&self.current);
        self.expect_next(TokenKind::Ident, "function name after 'func'")?;
        let name = self.current.text.clone();
        self.expect_next(TokenKind::LParen, "'(' after function name")?;
        let mut params = vec![];
        if self.peek_kind() == TokenKind::RParen {
            self.next_token();
        } else {
            loop {
                self.expect_next(TokenKind::Ident, "parameter name")?;
                params.push(self.current.text.clone());
                if self.peek_kind() == TokenKind::Comma {
                    self.next_token();
                } else {
                    break;
                }
            }
            self.expect_next(TokenKind::RParen, "')' after parameters")?;
        }
        self.next_token();
        let body = self.parse_block(&[TokenKind::End])?;
        let loc = Location::span(start, Location::of(&self.current));
        debug!(
            "successfully parsed function `{name}` with {} parameter(s)",
            params.len()
        );
        Ok(Stmt {
            kind: StmtKind::FuncDecl(FuncDecl { name, params, body }),
            loc,
        })
    }

    /// Parse statements until one of `until` is the current token, which is
    /// left for the caller. Comments between statements are skipped.
    fn parse_block(&mut self, until: &[TokenKind]) -> ParseResult<Vec<Stmt>> {
        let mut body = vec![];
        self.skip_comments();
        while !until.contains(&self.current.kind) {
            if self.current.kind == TokenKind::Eof {
                return Err(self.expected("'end'"));
            }
            body.push(self.parse_stmt()?);
            self.next_token();
            self.skip_comments();
        }
        Ok(body)
    }

    fn parse_expr(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        // The heart of the Pratt parser: parse a prefix position, then fold
        // in infix operators while they bind tighter than `precedence`.
        let mut expr = self.parse_prefix()?;

        loop {
            let peek_precedence = Precedence::from(self.peek_kind());
            if peek_precedence <= precedence {
                break;
            }
            self.next_token();
            expr = self.parse_infix(expr)?;
        }

        Ok(expr)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.current.kind {
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => {
                let start = Location::of(&self.current);
                let op = match self.current.kind {
                    TokenKind::Minus => PrefixOp::Neg,
                    TokenKind::Plus => PrefixOp::Sign,
                    TokenKind::Tilde => PrefixOp::Not,
                    _ => unreachable!(),
                };
                self.next_token();
                let operand = self.parse_expr(Precedence::Prefix)?;
                let loc = Location::span(start, operand.loc);
                Ok(Expr {
                    kind: ExprKind::Prefix(PrefixExpr {
                        op,
                        expr: Box::new(operand),
                    }),
                    loc,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let loc = Location::of(&self.current);
        let expr = match self.current.kind {
            TokenKind::Number => {
                let n = self
                    .current
                    .text
                    .parse::<f64>()
                    .expect("lexer should only produce valid numbers");
                Expr {
                    kind: ExprKind::Number(n),
                    loc,
                }
            }
            TokenKind::String => Expr {
                kind: ExprKind::String(self.current.text.clone()),
                loc,
            },
            TokenKind::True => Expr {
                kind: ExprKind::Bool(true),
                loc,
            },
            TokenKind::False => Expr {
                kind: ExprKind::Bool(false),
                loc,
            },
            TokenKind::Ident if self.peek_kind() == TokenKind::LParen => self.parse_call()?,
            TokenKind::Ident => Expr {
                kind: ExprKind::Ident(self.current.text.clone()),
                loc,
            },
            TokenKind::LParen => self.parse_grouped()?,
            _ => return Err(self.expected("expression")),
        };
        Ok(expr)
    }

    fn parse_grouped(&mut self) -> ParseResult<Expr> {
        debug_assert_eq!(self.current.kind, TokenKind::LParen);
        let start = Location::of(&self.current);
        self.next_token();
        let inner = self.parse_expr(Precedence::Lowest)?;
        self.expect_next(TokenKind::RParen, "')' to close grouped expression")?;
        let loc = Location::span(start, Location::of(&self.current));
        Ok(Expr {
            kind: ExprKind::Grouping(Box::new(inner)),
            loc,
        })
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        debug_assert_eq!(self.current.kind, TokenKind::Ident);
        let start = Location::of(&self.current);
        let name = self.current.text.clone();
        self.next_token();
        debug_assert_eq!(self.current.kind, TokenKind::LParen);
        let mut args = vec![];
        if self.peek_kind() == TokenKind::RParen {
            self.next_token();
        } else {
            loop {
                self.next_token();
                args.push(self.parse_expr(Precedence::Lowest)?);
                if self.peek_kind() == TokenKind::Comma {
                    self.next_token();
                } else {
                    break;
                }
            }
            self.expect_next(TokenKind::RParen, "')' to close argument list")?;
        }
        let loc = Location::span(start, Location::of(&self.current));
        debug!("parsed call to `{name}` with {} argument(s)", args.len());
        Ok(Expr {
            kind: ExprKind::Call(Call { name, args }),
            loc,
        })
    }

    fn parse_infix(&mut self, lhs: Expr) -> ParseResult<Expr> {
        let op_kind = self.current.kind;
        let op = match op_kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Star => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::Percent => InfixOp::Mod,
            TokenKind::Caret => InfixOp::Pow,
            TokenKind::Eq => InfixOp::Eq,
            TokenKind::Ne => InfixOp::Ne,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::Le => InfixOp::Le,
            TokenKind::Ge => InfixOp::Ge,
            TokenKind::And => InfixOp::And,
            TokenKind::Or => InfixOp::Or,
            _ => panic!("BUG: should not call when not on an infix operator!"),
        };
        let precedence = Precedence::from(op_kind);
        self.next_token();
        let rhs = match op {
            // The exponent of `^` is a primary expression, not a unary one.
            InfixOp::Pow => self.parse_primary()?,
            _ => self.parse_expr(precedence)?,
        };
        if op == InfixOp::Mod && self.peek_kind() == TokenKind::Percent {
            self.next_token();
            return Err(self.error(ParseErrorKind::ChainedModulo));
        }
        let loc = Location::span(lhs.loc, rhs.loc);
        Ok(Expr {
            kind: ExprKind::Infix(InfixExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            loc,
        })
    }

    fn next_token(&mut self) {
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
        self.current = self
            .tokens
            .get(self.idx)
            .cloned()
            .unwrap_or_else(Token::eof);
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.idx + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn skip_comments(&mut self) {
        while self.current.kind == TokenKind::Comment {
            self.next_token();
        }
    }

    fn expect_next(&mut self, kind: TokenKind, expected: &'static str) -> ParseResult<()> {
        self.next_token();
        if self.current.kind != kind {
            return Err(self.expected(expected));
        }
        Ok(())
    }

    fn expected(&self, expected: &'static str) -> ParseError {
        let kind = if self.current.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::Expected {
                expected,
                found: self.current.clone(),
            }
        };
        self.error(kind)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            line: self.current.line,
            column: self.current.column,
            token_len: self.current.size(),
            partial: Program::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equality,
    Comparison,
    Sum,
    Product,
    Modulo,
    Prefix,
    Power,
}

impl From<TokenKind> for Precedence {
    fn from(tok: TokenKind) -> Self {
        match tok {
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Eq | TokenKind::Ne => Self::Equality,
            TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Self::Comparison,
            TokenKind::Plus | TokenKind::Minus => Self::Sum,
            TokenKind::Star | TokenKind::Slash => Self::Product,
            TokenKind::Percent => Self::Modulo,
            TokenKind::Caret => Self::Power,
            _ => Self::Lowest,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::{lexer::Lexer, *};

    fn parse(input: &str) -> Program {
        let lexed = Lexer::new(input).lex();
        assert_eq!(None, lexed.error, "lexing should succeed");
        Parser::new(&lexed.tokens)
            .parse()
            .expect("should parse with no errors")
    }

    fn parse_err(input: &str) -> ParseError {
        let lexed = Lexer::new(input).lex();
        assert_eq!(None, lexed.error, "lexing should succeed");
        Parser::new(&lexed.tokens)
            .parse()
            .expect_err("parser should fail")
    }

    /// Assert that `input` parses, and that pretty-printing and re-parsing
    /// the result yields a structurally identical program.
    macro_rules! round_trip_test {
        ($name:ident, $input:expr) => {
            #[test]
            fn $name() {
                let program = parse($input);
                let pretty = program.to_string();
                let reparsed = parse(&pretty);
                assert_eq!(program, reparsed, "pretty printed as:\n{pretty}");
            }
        };
    }

    round_trip_test!(print_statements, "print 5\nprintln \"hi\"");
    round_trip_test!(assignments, "x := 5\nlocal y := x + 1\nx := y");
    round_trip_test!(arithmetic, "print 1 + 2 * 3 - 4 / 5");
    round_trip_test!(grouping, "print (1 + 2) * 3");
    round_trip_test!(prefix_operators, "print -x + +y\nprint ~true\nprint - -x");
    round_trip_test!(comparisons, "print 1 < 2 and 3 >= 4 or 5 ~= 6 and 7 == 8");
    round_trip_test!(modulo_and_power, "print 5 % 2 + 2 ^ 3 ^ 2");
    round_trip_test!(strings_with_escapes, "print \"a\\nb\\tc\\\"d\"");
    round_trip_test!(
        if_elif_else,
        "if x < 1 then print 1 elif x < 2 then print 2 elif x < 3 then print 3 else print 4 end"
    );
    round_trip_test!(while_loop, "while x < 10 do x := x + 1 end");
    round_trip_test!(for_loop, "for i := 1, 10 do print i end");
    round_trip_test!(for_loop_with_step, "for i := 10, 1, -1 do print i end");
    round_trip_test!(
        functions,
        "func add(a, b) ret a + b end\nfunc zero() ret 0 end\nprintln add(zero(), 2)"
    );
    round_trip_test!(
        recursion,
        "func fact(n) if n <= 1 then ret 1 else ret n * fact(n - 1) end end\nprintln fact(5)"
    );

    #[test]
    fn precedence_groups_tighter_ops() {
        // a + b * c parses as a + (b * c)
        let program = parse("x := a + b * c");
        let StmtKind::Assign { value, .. } = &program.body[0].kind else {
            panic!("should be an assignment");
        };
        let ExprKind::Infix(add) = &value.kind else {
            panic!("should be an infix expr");
        };
        assert_eq!(InfixOp::Add, add.op);
        let ExprKind::Infix(mul) = &add.rhs.kind else {
            panic!("rhs should be the multiplication");
        };
        assert_eq!(InfixOp::Mul, mul.op);
    }

    #[test]
    fn subtraction_is_left_associative() {
        let program = parse("x := a - b - c");
        let StmtKind::Assign { value, .. } = &program.body[0].kind else {
            panic!("should be an assignment");
        };
        let ExprKind::Infix(outer) = &value.kind else {
            panic!("should be an infix expr");
        };
        assert_eq!(InfixOp::Sub, outer.op);
        let ExprKind::Infix(inner) = &outer.lhs.kind else {
            panic!("lhs should be the first subtraction");
        };
        assert_eq!(InfixOp::Sub, inner.op);
    }

    #[test]
    fn power_is_left_associative() {
        let program = parse("x := 2 ^ 3 ^ 4");
        let StmtKind::Assign { value, .. } = &program.body[0].kind else {
            panic!("should be an assignment");
        };
        let ExprKind::Infix(outer) = &value.kind else {
            panic!("should be an infix expr");
        };
        assert_eq!(InfixOp::Pow, outer.op);
        let ExprKind::Infix(inner) = &outer.lhs.kind else {
            panic!("lhs should be the first power");
        };
        assert_eq!(InfixOp::Pow, inner.op);
    }

    #[test]
    fn unary_binds_looser_than_power() {
        // -2 ^ 2 parses as -(2 ^ 2)
        let program = parse("x := -2 ^ 2");
        let StmtKind::Assign { value, .. } = &program.body[0].kind else {
            panic!("should be an assignment");
        };
        let ExprKind::Prefix(neg) = &value.kind else {
            panic!("should be a prefix expr");
        };
        assert_eq!(PrefixOp::Neg, neg.op);
        assert!(matches!(&neg.expr.kind, ExprKind::Infix(i) if i.op == InfixOp::Pow));
    }

    #[test]
    fn chained_modulo_is_rejected() {
        let err = parse_err("x := 1 % 2 % 3");
        assert_eq!(ParseErrorKind::ChainedModulo, err.kind);
    }

    #[test]
    fn power_exponent_must_be_primary() {
        let err = parse_err("x := 2 ^ -3");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "expression",
                ..
            }
        ));
    }

    #[test]
    fn missing_then() {
        let err = parse_err("if x print 1 end");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "'then' after if condition",
                ..
            }
        ));
    }

    #[test]
    fn missing_end() {
        let err = parse_err("while x < 10 do print x");
        assert_eq!(ParseErrorKind::UnexpectedEof, err.kind);
    }

    #[test]
    fn local_requires_identifier() {
        let err = parse_err("local 5 := 1");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "identifier after 'local'",
                ..
            }
        ));
    }

    #[test]
    fn partial_program_is_preserved() {
        let err = parse_err("print 1\nprint 2\nif x then");
        assert_eq!(2, err.partial.body.len());
        assert!(matches!(err.partial.body[0].kind, StmtKind::Print(_)));
    }

    #[test]
    fn comments_skipped_between_statements() {
        let program = parse("-- leading\nprint 1\n-- middle\nprint 2 -- trailing");
        assert_eq!(2, program.body.len());
    }

    #[test]
    fn comment_inside_expression_is_an_error() {
        let err = parse_err("print 1 + -- oops\n2");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "expression",
                ..
            }
        ));
    }

    #[test]
    fn locations_are_tracked() {
        let program = parse("print 5\nwhile x < 2 do print x end");
        let print = &program.body[0];
        assert_eq!((1, 1), (print.loc.start.line, print.loc.start.column));
        assert_eq!((1, 8), (print.loc.end.line, print.loc.end.column));
        let while_ = &program.body[1];
        assert_eq!((2, 1), (while_.loc.start.line, while_.loc.start.column));
        // Ends just past the `end` keyword.
        assert_eq!((2, 27), (while_.loc.end.line, while_.loc.end.column));
    }

    #[test]
    fn ret_is_allowed_at_top_level() {
        // Not rejected by the parser; the compiled program traps instead.
        let program = parse("ret 5");
        assert!(matches!(program.body[0].kind, StmtKind::Ret(_)));
    }

    #[test]
    fn call_argument_arity_shapes() {
        let program = parse("f()\ng(1)\nh(1, 2, 3)");
        let arg_counts = program
            .body
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(e) => match &e.kind {
                    ExprKind::Call(c) => c.args.len(),
                    _ => panic!("should be a call"),
                },
                _ => panic!("should be an expression statement"),
            })
            .collect::<Vec<_>>();
        assert_eq!(vec![0, 1, 3], arg_counts);
    }
}
