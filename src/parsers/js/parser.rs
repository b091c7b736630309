//! 递归下降的 JavaScript 片段解析器
//!
//! 输入通常只有一两条语句，例如 `openPopImg('a.jpg','Title',320,240)`
//! 或 `window.status='Home'; return true`。顶层出现 `return` 属于语法错误，
//! 所以事件处理器必须通过 [`parse_handler`] 先包进一个合成函数再解析。

use crate::error::{RetrofitError, RetrofitResult};

use super::ast::{Expr, Literal, Program, Stmt};
use super::lexer::{tokenize, Token, TokenKind};

/// 合成包装函数的名字
pub const HANDLER_WRAPPER: &str = "__retrofit_handler__";

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=",
];

/// 解析一段脚本
pub fn parse_script(src: &str) -> RetrofitResult<Program> {
    let mut parser = Parser::new(tokenize(src)?);
    parser.parse_program()
}

/// 解析事件处理器：包进合成函数后返回函数体
pub fn parse_handler(src: &str) -> RetrofitResult<Vec<Stmt>> {
    let wrapped = format!("function {}() {{\n{}\n}}", HANDLER_WRAPPER, src);
    let program = parse_script(&wrapped)?;
    match program.body.as_slice() {
        [Stmt::Function { name, body, .. }] if name == HANDLER_WRAPPER => Ok(body.clone()),
        _ => Err(RetrofitError::parse(
            "handler escaped its synthetic function wrapper",
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    function_depth: usize,
}

fn binary_precedence(kind: &TokenKind) -> Option<(&'static str, u8)> {
    let op: &'static str = match kind {
        TokenKind::Punct(p) => p,
        TokenKind::Ident(word) if word == "instanceof" => "instanceof",
        TokenKind::Ident(word) if word == "in" => "in",
        _ => return None,
    };
    let prec = match op {
        "??" | "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "===" | "!==" => 6,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        "**" => 11,
        _ => return None,
    };
    Some((op, prec))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier `{}`", name),
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Str(s) => format!("string {:?}", s),
        TokenKind::Punct(p) => format!("`{}`", p),
        TokenKind::Eof => "end of input".to_string(),
    }
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            function_depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        // 记号序列总以 Eof 结尾
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(p) if p == punct)
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(w) if w == word)
    }

    fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> RetrofitError {
        let token = self.peek();
        RetrofitError::parse(format!(
            "unexpected {} at offset {}",
            describe(&token.kind),
            token.offset
        ))
    }

    fn expect_punct(&mut self, punct: &str) -> RetrofitResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_ident(&mut self) -> RetrofitResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// 分号，或可以自动插入分号的位置
    fn consume_semicolon(&mut self) -> RetrofitResult<()> {
        if self.eat_punct(";") || self.is_punct("}") || self.is_eof() || self.peek().newline_before {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_program(&mut self) -> RetrofitResult<Program> {
        let mut body = Vec::new();
        while !self.is_eof() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    fn parse_statement(&mut self) -> RetrofitResult<Stmt> {
        if self.eat_punct(";") {
            return Ok(Stmt::Empty);
        }
        if self.is_punct("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        if self.is_word("return") {
            if self.function_depth == 0 {
                return Err(RetrofitError::parse(format!(
                    "illegal return statement at offset {}",
                    self.peek().offset
                )));
            }
            self.advance();
            if self.is_punct(";") || self.is_punct("}") || self.is_eof() || self.peek().newline_before {
                self.consume_semicolon()?;
                return Ok(Stmt::Return(None));
            }
            let arg = self.parse_expression()?;
            self.consume_semicolon()?;
            return Ok(Stmt::Return(Some(arg)));
        }
        for kind in ["var", "let", "const"] {
            if self.is_word(kind) {
                self.advance();
                return self.parse_var(kind);
            }
        }
        if self.is_word("if") {
            self.advance();
            self.expect_punct("(")?;
            let test = self.parse_expression()?;
            self.expect_punct(")")?;
            let consequent = Box::new(self.parse_statement()?);
            let alternate = if self.is_word("else") {
                self.advance();
                Some(Box::new(self.parse_statement()?))
            } else {
                None
            };
            return Ok(Stmt::If {
                test,
                consequent,
                alternate,
            });
        }
        if self.is_word("function") {
            self.advance();
            let name = self.expect_ident()?;
            let (params, body) = self.parse_function_rest()?;
            return Ok(Stmt::Function { name, params, body });
        }

        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> RetrofitResult<Vec<Stmt>> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.eat_punct("}") {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_var(&mut self, kind: &'static str) -> RetrofitResult<Stmt> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat_punct("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.consume_semicolon()?;
        Ok(Stmt::Var { kind, decls })
    }

    fn parse_function_rest(&mut self) -> RetrofitResult<(Vec<String>, Vec<Stmt>)> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.eat_punct(")") {
            loop {
                params.push(self.expect_ident()?);
                if self.eat_punct(")") {
                    break;
                }
                self.expect_punct(",")?;
            }
        }
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        Ok((params, body?))
    }

    fn parse_expression(&mut self) -> RetrofitResult<Expr> {
        let first = self.parse_assignment()?;
        if !self.is_punct(",") {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat_punct(",") {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs))
    }

    fn parse_assignment(&mut self) -> RetrofitResult<Expr> {
        let target = self.parse_conditional()?;
        let op = match self.peek().kind {
            TokenKind::Punct(p) if ASSIGN_OPS.contains(&p) => p,
            _ => return Ok(target),
        };
        if !matches!(target, Expr::Ident(_) | Expr::Member { .. }) {
            return Err(RetrofitError::parse(format!(
                "invalid assignment target at offset {}",
                self.peek().offset
            )));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> RetrofitResult<Expr> {
        let test = self.parse_binary(1)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> RetrofitResult<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((op, prec)) = binary_precedence(&self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            // `**` 右结合，其余左结合
            let next_min = if op == "**" { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> RetrofitResult<Expr> {
        let op: Option<&'static str> = match &self.peek().kind {
            TokenKind::Punct(p) if ["!", "-", "+", "~"].contains(p) => Some(p),
            TokenKind::Ident(w) if w == "typeof" => Some("typeof"),
            TokenKind::Ident(w) if w == "void" => Some("void"),
            TokenKind::Ident(w) if w == "delete" => Some("delete"),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let arg = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                arg: Box::new(arg),
            });
        }
        if let TokenKind::Punct(p @ ("++" | "--")) = self.peek().kind {
            self.advance();
            let arg = self.parse_unary()?;
            return Ok(Expr::Update {
                op: p,
                prefix: true,
                arg: Box::new(arg),
            });
        }

        let expr = self.parse_call_member()?;
        if let TokenKind::Punct(p @ ("++" | "--")) = self.peek().kind {
            if !self.peek().newline_before {
                self.advance();
                return Ok(Expr::Update {
                    op: p,
                    prefix: false,
                    arg: Box::new(expr),
                });
            }
        }
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> RetrofitResult<Expr> {
        let mut expr = if self.is_word("new") {
            self.advance();
            let callee = self.parse_member_only()?;
            let args = if self.is_punct("(") {
                self.parse_args()?
            } else {
                Vec::new()
            };
            Expr::New {
                callee: Box::new(callee),
                args,
            }
        } else {
            self.parse_primary()?
        };

        loop {
            if self.eat_punct(".") {
                let name = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::Ident(name)),
                    computed: false,
                };
            } else if self.eat_punct("[") {
                let property = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                    computed: true,
                };
            } else if self.is_punct("(") {
                let args = self.parse_args()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// `new` 之后的被调用者：不包含调用的成员表达式
    fn parse_member_only(&mut self) -> RetrofitResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(".") {
                let name = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::Ident(name)),
                    computed: false,
                };
            } else if self.eat_punct("[") {
                let property = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                    computed: true,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_args(&mut self) -> RetrofitResult<Vec<Expr>> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        if self.eat_punct(")") {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if self.eat_punct(")") {
                return Ok(args);
            }
            self.expect_punct(",")?;
            // 允许末尾逗号
            if self.eat_punct(")") {
                return Ok(args);
            }
        }
    }

    fn parse_primary(&mut self) -> RetrofitResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Num(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s)))
            }
            TokenKind::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "true" => Ok(Expr::Literal(Literal::Bool(true))),
                    "false" => Ok(Expr::Literal(Literal::Bool(false))),
                    "null" => Ok(Expr::Literal(Literal::Null)),
                    "this" => Ok(Expr::This),
                    "function" => {
                        let name = match self.peek().kind.clone() {
                            TokenKind::Ident(n) => {
                                self.advance();
                                Some(n)
                            }
                            _ => None,
                        };
                        let (params, body) = self.parse_function_rest()?;
                        Ok(Expr::Function { name, params, body })
                    }
                    _ => Ok(Expr::Ident(word)),
                }
            }
            TokenKind::Punct("(") => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat_punct("]") {
                    items.push(self.parse_assignment()?);
                    if !self.eat_punct(",") {
                        self.expect_punct("]")?;
                        break;
                    }
                }
                Ok(Expr::Array(items))
            }
            TokenKind::Punct("{") => {
                self.advance();
                let mut props = Vec::new();
                while !self.eat_punct("}") {
                    let key = match self.advance().kind {
                        TokenKind::Ident(k) | TokenKind::Str(k) => k,
                        TokenKind::Number(n) => Literal::Num(n).to_string(),
                        other => {
                            return Err(RetrofitError::parse(format!(
                                "unexpected {} in object literal",
                                describe(&other)
                            )))
                        }
                    };
                    self.expect_punct(":")?;
                    props.push((key, self.parse_assignment()?));
                    if !self.eat_punct(",") {
                        self.expect_punct("}")?;
                        break;
                    }
                }
                Ok(Expr::Object(props))
            }
            _ => Err(self.unexpected()),
        }
    }
}
