//! Recursive-descent parser producing a `FileModule`
//!
//! Errors are recoverable: the parser records them and synchronizes to the
//! next statement, so a file with one bad declaration still yields every
//! other declaration and reference.

use super::error::{SyntaxError, SyntaxErrorKind};
use super::scanner::{scan, Token, TokenKind};
use crate::ast::{
    Assignment, BinaryOp, Declaration, Expr, ExternalKind, ExternalNode, FunctionDecl, LocalScope,
    Location, ModuleDecl, ModuleInstantiation, Param, UnaryOp,
};
use crate::module::FileModule;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
    module: FileModule,
    prev_pos: (usize, usize),
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let (tokens, errors) = scan(source);
        Self {
            tokens,
            pos: 0,
            errors,
            module: FileModule::new(),
            prev_pos: (1, 1),
        }
    }

    /// Parse the whole file, returning the module and every error found
    pub fn parse(mut self) -> (FileModule, Vec<SyntaxError>) {
        let scope = self.parse_declarations(true);
        self.module.scope = scope;
        (self.module, self.errors)
    }

    // Token cursor helpers

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.prev_pos = (token.line, token.column);
        self.pos += 1;
        Some(token)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().map(|t| &t.kind == kind).unwrap_or(false)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.peek()
            .map(|t| (t.line, t.column))
            .unwrap_or(self.prev_pos)
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.match_token(&kind) {
            true
        } else {
            self.unexpected(&kind.to_string());
            false
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                let name = name.clone();
                self.consume();
                Some(name)
            }
            _ => {
                self.unexpected("identifier");
                None
            }
        }
    }

    fn unexpected(&mut self, expected: &str) {
        let (line, column) = self.current_pos();
        let kind = match self.peek() {
            Some(token) => SyntaxErrorKind::UnexpectedToken {
                found: token.kind.to_string(),
                expected: expected.to_string(),
            },
            None => SyntaxErrorKind::UnexpectedEndOfInput,
        };
        self.errors.push(SyntaxError::at(kind, line, column));
    }

    /// Skip to just past the next `;`, or to a `}` (left for the caller),
    /// stepping over balanced braces along the way.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon if depth == 0 => {
                    self.consume();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.consume();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.consume();
                }
                _ => {
                    self.consume();
                }
            }
        }
    }

    // Declarations

    fn parse_declarations(&mut self, top_level: bool) -> LocalScope {
        let mut scope = LocalScope::new();
        while let Some(kind) = self.peek().map(|t| t.kind.clone()) {
            match kind {
                TokenKind::RBrace if !top_level => break,
                TokenKind::Use | TokenKind::Include => {
                    self.parse_reference(&mut scope, top_level)
                }
                TokenKind::Module => {
                    if let Some(decl) = self.parse_module_decl() {
                        scope.push(decl);
                    }
                }
                TokenKind::Function => {
                    if let Some(decl) = self.parse_function_decl() {
                        scope.push(decl);
                    }
                }
                TokenKind::Ident(_) => {
                    if let Some(decl) = self.parse_ident_statement() {
                        scope.push(decl);
                    }
                }
                TokenKind::Semicolon => {
                    // stray semicolon
                    self.consume();
                }
                TokenKind::RBrace => {
                    // unmatched at top level
                    self.unexpected("declaration");
                    self.consume();
                }
                _ => {
                    self.unexpected("declaration");
                    self.synchronize();
                }
            }
        }
        scope
    }

    /// `use "file";` or `include "file";`
    fn parse_reference(&mut self, scope: &mut LocalScope, top_level: bool) {
        let start = self.current_pos();
        let kind = match self.consume().map(|t| t.kind) {
            Some(TokenKind::Use) => ExternalKind::Use,
            _ => ExternalKind::Include,
        };

        let filename = match self.peek() {
            Some(Token {
                kind: TokenKind::Str(s),
                ..
            }) => {
                let s = s.clone();
                self.consume();
                s
            }
            _ => {
                self.unexpected("filename string");
                self.synchronize();
                return;
            }
        };
        self.expect(TokenKind::Semicolon);

        if !top_level {
            let (line, column) = start;
            self.errors.push(SyntaxError::at(
                SyntaxErrorKind::ReferenceNotTopLevel,
                line,
                column,
            ));
            return;
        }
        if filename.is_empty() {
            let (line, column) = start;
            self.errors
                .push(SyntaxError::at(SyntaxErrorKind::EmptyReference, line, column));
            return;
        }

        let location = Location::new(start.0, start.1, self.prev_pos.0, self.prev_pos.1);
        let node = ExternalNode::new(kind, filename, location);
        match kind {
            ExternalKind::Use => {
                self.module.add_use_node(node);
            }
            ExternalKind::Include => {
                if let Some(entry) = self.module.add_include_node(node) {
                    scope.push(Declaration::Include(entry));
                }
            }
        }
    }

    /// `module name(params) { ... }`
    fn parse_module_decl(&mut self) -> Option<Declaration> {
        let start = self.current_pos();
        self.consume(); // 'module'
        let name = match self.expect_ident() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        if !self.expect(TokenKind::LParen) {
            self.synchronize();
            return None;
        }
        let params = self.parse_params();
        if !self.expect(TokenKind::LBrace) {
            self.synchronize();
            return None;
        }
        let body = self.parse_declarations(false);
        self.expect(TokenKind::RBrace);

        Some(Declaration::Module(ModuleDecl {
            name,
            params,
            body,
            location: Location::new(start.0, start.1, self.prev_pos.0, self.prev_pos.1),
        }))
    }

    /// `function name(params) = expr;`
    fn parse_function_decl(&mut self) -> Option<Declaration> {
        let start = self.current_pos();
        self.consume(); // 'function'
        let name = match self.expect_ident() {
            Some(name) => name,
            None => {
                self.synchronize();
                return None;
            }
        };
        if !self.expect(TokenKind::LParen) {
            self.synchronize();
            return None;
        }
        let params = self.parse_params();
        if !self.expect(TokenKind::Assign) {
            self.synchronize();
            return None;
        }
        let body = match self.parse_expr() {
            Some(expr) => expr,
            None => {
                self.synchronize();
                return None;
            }
        };
        self.expect(TokenKind::Semicolon);

        Some(Declaration::Function(FunctionDecl {
            name,
            params,
            body,
            location: Location::new(start.0, start.1, self.prev_pos.0, self.prev_pos.1),
        }))
    }

    /// `name = expr;` or `name(args);`
    fn parse_ident_statement(&mut self) -> Option<Declaration> {
        let start = self.current_pos();
        let name = self.expect_ident()?;

        if self.match_token(&TokenKind::Assign) {
            let value = match self.parse_expr() {
                Some(expr) => expr,
                None => {
                    self.synchronize();
                    return None;
                }
            };
            self.expect(TokenKind::Semicolon);
            return Some(Declaration::Assignment(Assignment {
                name,
                value,
                location: Location::new(start.0, start.1, self.prev_pos.0, self.prev_pos.1),
            }));
        }

        if self.check(&TokenKind::LParen) {
            self.consume();
            let args = self.parse_args();
            self.expect(TokenKind::Semicolon);
            return Some(Declaration::Instantiation(ModuleInstantiation {
                name,
                args,
                location: Location::new(start.0, start.1, self.prev_pos.0, self.prev_pos.1),
            }));
        }

        self.unexpected("'=' or '('");
        self.synchronize();
        None
    }

    /// Parameter list, consuming the closing `)`
    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.match_token(&TokenKind::RParen) {
            return params;
        }
        loop {
            let name = match self.expect_ident() {
                Some(name) => name,
                None => break,
            };
            let default = if self.match_token(&TokenKind::Assign) {
                self.parse_expr()
            } else {
                None
            };
            params.push(Param { name, default });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        params
    }

    /// Argument list, consuming the closing `)`
    fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.match_token(&TokenKind::RParen) {
            return args;
        }
        loop {
            match self.parse_expr() {
                Some(expr) => args.push(expr),
                None => break,
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        args
    }

    // Expressions, by precedence climbing

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: i32) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.peek_binary_op() {
            let precedence = binary_precedence(op);
            if precedence < min_precedence {
                break;
            }
            self.consume();
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Some(lhs)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => Some(BinaryOp::Add),
            Some(TokenKind::Minus) => Some(BinaryOp::Sub),
            Some(TokenKind::Star) => Some(BinaryOp::Mul),
            Some(TokenKind::Slash) => Some(BinaryOp::Div),
            Some(TokenKind::Lt) => Some(BinaryOp::Lt),
            Some(TokenKind::Le) => Some(BinaryOp::Le),
            Some(TokenKind::Gt) => Some(BinaryOp::Gt),
            Some(TokenKind::Ge) => Some(BinaryOp::Ge),
            Some(TokenKind::EqEq) => Some(BinaryOp::Eq),
            Some(TokenKind::NotEq) => Some(BinaryOp::Ne),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.match_token(&TokenKind::Minus) {
            return Some(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_unary()?),
            });
        }
        if self.match_token(&TokenKind::Bang) {
            return Some(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_unary()?),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => {
                self.unexpected("expression");
                return None;
            }
        };
        match token.kind {
            TokenKind::Number(n) => {
                self.consume();
                Some(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.consume();
                Some(Expr::Str(s))
            }
            TokenKind::True => {
                self.consume();
                Some(Expr::Bool(true))
            }
            TokenKind::False => {
                self.consume();
                Some(Expr::Bool(false))
            }
            TokenKind::Ident(name) => {
                self.consume();
                if self.match_token(&TokenKind::LParen) {
                    let args = self.parse_args();
                    Some(Expr::Call { name, args })
                } else {
                    Some(Expr::Var(name))
                }
            }
            TokenKind::LParen => {
                self.consume();
                let expr = self.parse_expr();
                self.expect(TokenKind::RParen);
                expr
            }
            _ => {
                self.unexpected("expression");
                None
            }
        }
    }
}

/// Comparisons bind loosest, then additive, then multiplicative.
fn binary_precedence(op: BinaryOp) -> i32 {
    match op {
        BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne => 100,
        BinaryOp::Add | BinaryOp::Sub => 200,
        BinaryOp::Mul | BinaryOp::Div => 300,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> FileModule {
        let (module, errors) = Parser::new(source).parse();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        module
    }

    #[test]
    fn test_parse_assignment() {
        let module = parse_ok("r = 2 + 3 * 4;");
        let assignment = module.scope.lookup_assignment("r").unwrap();
        assert_eq!(assignment.value.to_string(), "(2 + (3 * 4))");
    }

    #[test]
    fn test_parse_module_decl_with_body() {
        let module = parse_ok("module wheel(r) { rim(r); hub(r / 2); }");
        let decl = module.scope.lookup_module("wheel").unwrap();
        assert_eq!(decl.params.len(), 1);
        assert_eq!(decl.body.len(), 2);
    }

    #[test]
    fn test_parse_function_decl() {
        let module = parse_ok("function area(r) = r * r;");
        let func = module.scope.lookup_function("area").unwrap();
        assert_eq!(func.body.to_string(), "(r * r)");
    }

    #[test]
    fn test_parse_param_defaults() {
        let module = parse_ok("module m(a, b = 3) { }");
        let decl = module.scope.lookup_module("m").unwrap();
        assert_eq!(decl.params[1].default, Some(Expr::Number(3.0)));
    }

    #[test]
    fn test_parse_references_registered_not_resolved() {
        let module = parse_ok("use \"lib.lathe\";\ninclude \"shapes.lathe\";\n");
        assert!(module.has_externals());
        let externals: Vec<_> = module.externals().collect();
        assert_eq!(externals.len(), 2);
        assert_eq!(externals[0].kind(), ExternalKind::Use);
        assert!(!externals[0].is_resolved());
        assert_eq!(externals[1].kind(), ExternalKind::Include);
    }

    #[test]
    fn test_include_leaves_placeholder_in_scope() {
        let module = parse_ok("a = 1;\ninclude \"lib.lathe\";\nb = 2;");
        assert!(matches!(
            module.scope.declarations[1],
            Declaration::Include(0)
        ));
    }

    #[test]
    fn test_duplicate_include_single_placeholder() {
        let module = parse_ok("include \"lib.lathe\";\ninclude \"lib.lathe\";");
        let placeholders = module
            .scope
            .iter()
            .filter(|d| matches!(d, Declaration::Include(_)))
            .count();
        assert_eq!(placeholders, 1);
        assert_eq!(module.externals().count(), 1);
    }

    #[test]
    fn test_use_does_not_touch_scope() {
        let module = parse_ok("use \"lib.lathe\";");
        assert!(module.scope.is_empty());
    }

    #[test]
    fn test_reference_not_top_level_is_error() {
        let (module, errors) = Parser::new("module m() { include \"lib.lathe\"; }").parse();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            SyntaxErrorKind::ReferenceNotTopLevel
        ));
        assert!(!module.has_externals());
    }

    #[test]
    fn test_error_recovery_keeps_siblings() {
        let (module, errors) = Parser::new("a = ;\nb = 2;").parse();
        assert!(!errors.is_empty());
        assert!(module.scope.lookup_assignment("b").is_some());
        assert!(module.scope.lookup_assignment("a").is_none());
    }

    #[test]
    fn test_location_spans_statement() {
        let module = parse_ok("r = 1;");
        let assignment = module.scope.lookup_assignment("r").unwrap();
        assert_eq!(assignment.location.first_line(), 1);
        assert_eq!(assignment.location.first_column(), 1);
    }
}
