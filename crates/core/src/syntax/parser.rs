//! Recursive-descent parser for the config source language
//!
//! The parser accepts the typed superset of the language (annotations on
//! variable declarations and function parameters) and discards the
//! annotations. Every node records its byte span so callers can re-serialize
//! a subtree verbatim from the original text.

use super::ast::*;
use super::lexer::{tokenize_at, RawTemplatePart, Token, TokenKind};
use super::{Span, SyntaxError};

pub fn parse_module(source: &str) -> Result<Module, SyntaxError> {
    let tokens = tokenize_at(source, 0, 1)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.parse_stmt()?);
    }
    Ok(Module { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn cur(&self) -> &Token {
        // The token stream always ends with an Eof token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            self.cur().span.start
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(&self.cur().kind, TokenKind::Punct(s) if *s == p)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), SyntaxError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", p)))
        }
    }

    fn is_ident(&self, name: &str) -> bool {
        matches!(&self.cur().kind, TokenKind::Ident(s) if s == name)
    }

    fn eat_ident(&mut self, name: &str) -> bool {
        if self.is_ident(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        match &self.cur().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("expected an identifier")),
        }
    }

    fn unexpected(&self, message: &str) -> SyntaxError {
        let found = match &self.cur().kind {
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Num(n) => format!("number {}", n),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Template(_) => "template literal".to_string(),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Eof => "end of input".to_string(),
        };
        SyntaxError::new(format!("{}, found {}", message, found), self.cur().line)
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.cur().span.start;
        let line = self.cur().line;

        let kind = if self.is_punct(";") {
            self.advance();
            StmtKind::Empty
        } else if self.is_punct("{") {
            StmtKind::Block(self.parse_block()?)
        } else if self.is_ident("import") {
            self.parse_import()?
        } else if self.is_ident("const") || self.is_ident("let") || self.is_ident("var") {
            self.parse_var_decl()?
        } else if self.is_ident("return") {
            self.advance();
            let value = if self.is_punct(";") || self.is_punct("}") || self.at_eof() {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.eat_punct(";");
            StmtKind::Return(value)
        } else if self.is_ident("if") {
            self.parse_if()?
        } else {
            let expr = self.parse_expr()?;
            self.eat_punct(";");
            StmtKind::Expr(expr)
        };

        Ok(Stmt {
            kind,
            span: Span::new(start, self.prev_end()),
            line,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.is_punct("}") {
            if self.at_eof() {
                return Err(self.unexpected("expected '}'"));
            }
            body.push(self.parse_stmt()?);
        }
        self.advance();
        Ok(body)
    }

    fn parse_import(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        let mut decl = ImportDecl {
            default: None,
            namespace: None,
            named: Vec::new(),
            source: String::new(),
        };

        match &self.cur().kind {
            // import "module";
            TokenKind::Str(source) => {
                decl.source = source.clone();
                self.advance();
                self.eat_punct(";");
                return Ok(StmtKind::Import(decl));
            }
            TokenKind::Punct("{") => {
                decl.named = self.parse_named_imports()?;
            }
            TokenKind::Punct("*") => {
                self.advance();
                if !self.eat_ident("as") {
                    return Err(self.unexpected("expected 'as'"));
                }
                decl.namespace = Some(self.expect_ident()?);
            }
            TokenKind::Ident(_) => {
                decl.default = Some(self.expect_ident()?);
                if self.eat_punct(",") {
                    decl.named = self.parse_named_imports()?;
                }
            }
            _ => return Err(self.unexpected("expected an import clause")),
        }

        if !self.eat_ident("from") {
            return Err(self.unexpected("expected 'from'"));
        }
        match &self.cur().kind {
            TokenKind::Str(source) => {
                decl.source = source.clone();
                self.advance();
            }
            _ => return Err(self.unexpected("expected a module string")),
        }
        self.eat_punct(";");
        Ok(StmtKind::Import(decl))
    }

    fn parse_named_imports(&mut self) -> Result<Vec<String>, SyntaxError> {
        self.expect_punct("{")?;
        let mut names = Vec::new();
        while !self.is_punct("}") {
            let mut name = self.expect_ident()?;
            if self.eat_ident("as") {
                name = format!("{} as {}", name, self.expect_ident()?);
            }
            names.push(name);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(names)
    }

    fn parse_var_decl(&mut self) -> Result<StmtKind, SyntaxError> {
        let kind = match self.advance().kind {
            TokenKind::Ident(word) if word == "const" => DeclKind::Const,
            TokenKind::Ident(word) if word == "let" => DeclKind::Let,
            _ => DeclKind::Var,
        };
        let name = self.expect_ident()?;
        if self.eat_punct(":") {
            self.skip_type_annotation()?;
        }
        let init = if self.eat_punct("=") {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.eat_punct(";");
        Ok(StmtKind::VarDecl(VarDecl { kind, name, init }))
    }

    /// Consume and discard a type annotation: an identifier or string
    /// literal, optional `[]` suffixes, joined by `|` into unions.
    fn skip_type_annotation(&mut self) -> Result<(), SyntaxError> {
        loop {
            match &self.cur().kind {
                TokenKind::Ident(_) | TokenKind::Str(_) => {
                    self.advance();
                }
                _ => return Err(self.unexpected("expected a type")),
            }
            while self.is_punct("[") {
                self.advance();
                self.expect_punct("]")?;
            }
            if !self.eat_punct("|") {
                return Ok(());
            }
        }
    }

    fn parse_if(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        self.expect_punct("(")?;
        let cond = self.parse_expr()?;
        self.expect_punct(")")?;
        let then_branch = self.parse_branch()?;
        let else_branch = if self.eat_ident("else") {
            Some(self.parse_branch()?)
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_branch(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        if self.is_punct("{") {
            self.parse_block()
        } else {
            Ok(vec![self.parse_stmt()?])
        }
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        // Assignment binds loosest and is right-associative. The lexer
        // emits `==`/`=>` as single tokens, so a bare `=` here is always
        // an assignment.
        if let TokenKind::Ident(name) = &self.cur().kind {
            let next = self.tokens.get(self.pos + 1).map(|t| &t.kind);
            if matches!(next, Some(TokenKind::Punct("="))) {
                let start = self.cur().span.start;
                let target = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                return Ok(self.finish(
                    start,
                    ExprKind::Assign {
                        target,
                        value: Box::new(value),
                    },
                ));
            }
        }
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let start = self.cur().span.start;
        let mut lhs = self.parse_unary()?;
        loop {
            let Some(op) = self.peek_binary_op() else {
                return Ok(lhs);
            };
            if op.precedence() < min_prec {
                return Ok(lhs);
            }
            self.advance();
            let rhs = self.parse_binary(op.precedence() + 1)?;
            lhs = Expr {
                span: Span::new(start, self.prev_end()),
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let TokenKind::Punct(p) = &self.cur().kind else {
            return None;
        };
        Some(match *p {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "==" => BinaryOp::Eq,
            "===" => BinaryOp::StrictEq,
            "!=" => BinaryOp::Ne,
            "!==" => BinaryOp::StrictNe,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.cur().span.start;
        let op = if self.is_punct("!") {
            Some(UnaryOp::Not)
        } else if self.is_punct("-") {
            Some(UnaryOp::Neg)
        } else {
            None
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr {
                span: Span::new(start, self.prev_end()),
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.cur().span.start;
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(".") {
                let property = self.expect_ident()?;
                expr = Expr {
                    span: Span::new(start, self.prev_end()),
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                };
            } else if self.is_punct("(") {
                let args = self.parse_args()?;
                expr = Expr {
                    span: Span::new(start, self.prev_end()),
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.is_punct(")") {
            args.push(self.parse_expr()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.cur().span.start;
        match &self.cur().kind {
            TokenKind::Str(value) => {
                let value = value.clone();
                self.advance();
                Ok(self.finish(start, ExprKind::Str(value)))
            }
            TokenKind::Num(value) => {
                let value = *value;
                self.advance();
                Ok(self.finish(start, ExprKind::Num(value)))
            }
            TokenKind::Template(raw) => {
                let raw = raw.clone();
                self.advance();
                let parts = self.parse_template_parts(raw)?;
                Ok(self.finish(start, ExprKind::Template(parts)))
            }
            TokenKind::Punct("(") => {
                if self.arrow_params_ahead() {
                    self.parse_arrow(start)
                } else {
                    self.advance();
                    let inner = self.parse_expr()?;
                    self.expect_punct(")")?;
                    Ok(self.finish(start, ExprKind::Paren(Box::new(inner))))
                }
            }
            TokenKind::Punct("{") => self.parse_object(start),
            TokenKind::Punct("[") => self.parse_array(start),
            TokenKind::Ident(name) => {
                let name = name.clone();
                match name.as_str() {
                    "true" => {
                        self.advance();
                        Ok(self.finish(start, ExprKind::Bool(true)))
                    }
                    "false" => {
                        self.advance();
                        Ok(self.finish(start, ExprKind::Bool(false)))
                    }
                    "null" => {
                        self.advance();
                        Ok(self.finish(start, ExprKind::Null))
                    }
                    "undefined" => {
                        self.advance();
                        Ok(self.finish(start, ExprKind::Undefined))
                    }
                    "function" => self.parse_function(start),
                    _ => {
                        self.advance();
                        // Bare single-parameter arrow: `x => ...`
                        if self.is_punct("=>") {
                            self.advance();
                            let body = self.parse_fn_body()?;
                            Ok(self.finish(
                                start,
                                ExprKind::Arrow {
                                    params: vec![Param { name }],
                                    body,
                                },
                            ))
                        } else {
                            Ok(self.finish(start, ExprKind::Ident(name)))
                        }
                    }
                }
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    fn finish(&self, start: usize, kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: Span::new(start, self.prev_end()),
        }
    }

    /// Lookahead from an opening paren: does the matching close paren lead
    /// straight into `=>`?
    fn arrow_params_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.tokens.len() {
            match &self.tokens[i].kind {
                TokenKind::Punct("(") => depth += 1,
                TokenKind::Punct(")") => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Punct("=>"))
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_arrow(&mut self, start: usize) -> Result<Expr, SyntaxError> {
        let params = self.parse_params()?;
        self.expect_punct("=>")?;
        let body = self.parse_fn_body()?;
        Ok(self.finish(start, ExprKind::Arrow { params, body }))
    }

    fn parse_fn_body(&mut self) -> Result<FnBody, SyntaxError> {
        if self.is_punct("{") {
            Ok(FnBody::Block(self.parse_block()?))
        } else {
            Ok(FnBody::Expr(Box::new(self.parse_expr()?)))
        }
    }

    fn parse_function(&mut self, start: usize) -> Result<Expr, SyntaxError> {
        self.advance();
        let name = match &self.cur().kind {
            TokenKind::Ident(n) => {
                let n = n.clone();
                self.advance();
                Some(n)
            }
            _ => None,
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(self.finish(start, ExprKind::Function { name, params, body }))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, SyntaxError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.is_punct(")") {
            let name = self.expect_ident()?;
            if self.eat_punct(":") {
                self.skip_type_annotation()?;
            }
            params.push(Param { name });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(params)
    }

    fn parse_object(&mut self, start: usize) -> Result<Expr, SyntaxError> {
        self.expect_punct("{")?;
        let mut props = Vec::new();
        while !self.is_punct("}") {
            let key = match &self.cur().kind {
                TokenKind::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                TokenKind::Str(value) => {
                    let value = value.clone();
                    self.advance();
                    value
                }
                _ => return Err(self.unexpected("expected a property name")),
            };
            if self.eat_punct(":") {
                props.push((key, self.parse_expr()?));
            } else {
                // Shorthand property: `{ name }`
                let span = Span::new(self.prev_end(), self.prev_end());
                props.push((
                    key.clone(),
                    Expr {
                        kind: ExprKind::Ident(key),
                        span,
                    },
                ));
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(self.finish(start, ExprKind::Object(props)))
    }

    fn parse_array(&mut self, start: usize) -> Result<Expr, SyntaxError> {
        self.expect_punct("[")?;
        let mut items = Vec::new();
        while !self.is_punct("]") {
            items.push(self.parse_expr()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("]")?;
        Ok(self.finish(start, ExprKind::Array(items)))
    }

    fn parse_template_parts(
        &mut self,
        raw: Vec<RawTemplatePart>,
    ) -> Result<Vec<TemplatePart>, SyntaxError> {
        let mut parts = Vec::new();
        for part in raw {
            match part {
                RawTemplatePart::Text(text) => parts.push(TemplatePart::Text(text)),
                RawTemplatePart::Expr { src, offset, line } => {
                    let tokens = tokenize_at(&src, offset, line)?;
                    let mut sub = Parser { tokens, pos: 0 };
                    let expr = sub.parse_expr()?;
                    if !sub.at_eof() {
                        return Err(sub.unexpected("expected end of template expression"));
                    }
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        parse_module(source).expect("parses")
    }

    #[test]
    fn parses_task_invocation_shape() {
        let src = r#"task("run", () => {}, [runs("r", () => { command("exit 0"); })], options);"#;
        let module = parse(src);
        assert_eq!(module.body.len(), 1);
        match &module.body[0].kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Call { callee, args },
                ..
            }) => {
                assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "task"));
                assert_eq!(args.len(), 4);
            }
            other => panic!("expected a call statement, got {:?}", other),
        }
    }

    #[test]
    fn statement_spans_cover_the_verbatim_text() {
        let src = "const x = 1;\ntask(\"t\", () => {}, []);";
        let module = parse(src);
        assert_eq!(module.body[1].span.slice(src), "task(\"t\", () => {}, []);");
        assert_eq!(module.body[1].line, 2);
    }

    #[test]
    fn accepts_typed_syntax_without_requiring_it() {
        let src = "const options: TaskConfig = { silent: true };\nconst f = (cmd: string) => cmd;";
        let module = parse(src);
        assert_eq!(module.body.len(), 2);
        match &module.body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert_eq!(decl.name, "options");
                assert!(decl.init.is_some());
            }
            other => panic!("expected a variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn parses_import_forms() {
        let src = "import { task, command } from \"plow\";\nimport plow from \"plow\";\nimport * as p from \"plow\";";
        let module = parse(src);
        let mut named = 0;
        for stmt in &module.body {
            if let StmtKind::Import(decl) = &stmt.kind {
                named += decl.named.len();
                assert_eq!(decl.source, "plow");
            }
        }
        assert_eq!(named, 2);
    }

    #[test]
    fn distinguishes_parenthesized_expressions_from_arrow_params() {
        let module = parse("const a = (1 + 2) * 3;\nconst f = (x, y) => x;");
        match &module.body[0].kind {
            StmtKind::VarDecl(decl) => {
                let init = decl.init.as_ref().expect("init");
                assert!(matches!(init.kind, ExprKind::Binary { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &module.body[1].kind {
            StmtKind::VarDecl(decl) => {
                let init = decl.init.as_ref().expect("init");
                assert!(matches!(init.kind, ExprKind::Arrow { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_template_interpolation() {
        let module = parse("const s = `run ${name} now`;");
        match &module.body[0].kind {
            StmtKind::VarDecl(decl) => match &decl.init.as_ref().expect("init").kind {
                ExprKind::Template(parts) => assert_eq!(parts.len(), 3),
                other => panic!("expected template, got {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_bare_assignment_statements() {
        let module = parse("options = { silent: true };");
        match &module.body[0].kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Assign { target, value },
                ..
            }) => {
                assert_eq!(target, "options");
                assert!(matches!(value.kind, ExprKind::Object(_)));
            }
            other => panic!("expected an assignment statement, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unbalanced_source() {
        assert!(parse_module("task(\"t\", () => {").is_err());
        assert!(parse_module("const = 3;").is_err());
    }
}
