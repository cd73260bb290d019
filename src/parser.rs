use crate::lexer::tokenize;
use crate::token::{Span, Token, TokenKind};

pub mod cst;
pub mod error;

use cst::{
    Block, ClassDecl, ExprNode, Ident, Item, OperatorToken, ParamDecl, ProcedureDecl,
    StatementNode, SyntaxTree,
};
pub use error::SyntaxError;

type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if !matches!(tokens.last().map(Token::kind), Some(TokenKind::EOF)) {
            let end = tokens.last().map(|token| token.span.end).unwrap_or(0);
            tokens.push(Token::new(
                TokenKind::EOF,
                "",
                Span {
                    start: end,
                    end,
                    ..Span::default()
                },
            ));
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse_tree(mut self) -> ParseResult<SyntaxTree> {
        let mut items = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::EOF => break,
                TokenKind::Procedure => items.push(Item::Procedure(self.parse_procedure()?)),
                TokenKind::Class => items.push(Item::Class(self.parse_class_decl()?)),
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => return Err(self.error("PROCEDURE or CLASS")),
            }
        }
        Ok(SyntaxTree { items })
    }

    fn parse_procedure(&mut self) -> ParseResult<ProcedureDecl> {
        self.expect(TokenKind::Procedure, "PROCEDURE")?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "(")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let name = self.expect_identifier()?;
                let type_name = if self.eat(&TokenKind::Colon) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                params.push(ParamDecl { name, type_name });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, ")")?;
        if !self.check(&TokenKind::Begin) {
            return Err(self.error("BEGIN"));
        }
        let body = self.parse_delimited_block()?;
        Ok(ProcedureDecl { name, params, body })
    }

    fn parse_class_decl(&mut self) -> ParseResult<ClassDecl> {
        self.expect(TokenKind::Class, "CLASS")?;
        let name = if self.check_identifier() {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "{")?;
        let mut attributes = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            attributes.push(self.expect_identifier()?);
            self.eat(&TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "}")?;
        Ok(ClassDecl { name, attributes })
    }

    fn parse_delimited_block(&mut self) -> ParseResult<Block> {
        self.expect(TokenKind::Begin, "BEGIN")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::End) {
            if self.check(&TokenKind::EOF) {
                return Err(self.error("END"));
            }
            if self.current().kind.is_closer() {
                return Err(self.error("statement or END"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::End, "END")?;
        Ok(Block {
            statements,
            delimited: true,
        })
    }

    /// Body of a compound statement: a `BEGIN … END` block, or statements up
    /// to the next closing keyword (which is left for the caller).
    fn parse_body(&mut self) -> ParseResult<Block> {
        if self.check(&TokenKind::Begin) {
            return self.parse_delimited_block();
        }
        let mut statements = Vec::new();
        while !self.current().kind.is_closer() {
            statements.push(self.parse_statement()?);
        }
        Ok(Block {
            statements,
            delimited: false,
        })
    }

    /// Accepts `ENDIF`, `END IF` and, when the body was not delimited, a bare `END`.
    fn parse_closer(
        &mut self,
        end_keyword: TokenKind<'a>,
        keyword: TokenKind<'a>,
        required: bool,
        construct: &str,
    ) -> ParseResult<()> {
        if self.eat(&end_keyword) {
            return Ok(());
        }
        if self.check(&TokenKind::End) {
            if self.peek_kind(1) == &keyword {
                self.advance();
                self.advance();
                return Ok(());
            }
            if required {
                self.advance();
                return Ok(());
            }
        }
        if required {
            Err(self.error(&format!("END to close {construct}")))
        } else {
            Ok(())
        }
    }

    fn parse_statement(&mut self) -> ParseResult<StatementNode> {
        let statement = match self.current().kind {
            TokenKind::If => return self.parse_if(),
            TokenKind::While => return self.parse_while(),
            TokenKind::For => return self.parse_for(),
            TokenKind::Repeat => return self.parse_repeat(),
            TokenKind::Begin => StatementNode::Block(self.parse_delimited_block()?),
            TokenKind::Call => {
                self.advance();
                let name = self.expect_identifier()?;
                let args = self.parse_arguments()?;
                StatementNode::Call { name, args }
            }
            TokenKind::Return => {
                let span = self.advance().span;
                let value = if self.check(&TokenKind::Semicolon) || self.current().kind.is_closer()
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                StatementNode::Return { value, span }
            }
            TokenKind::Class => {
                self.advance();
                let name = self.expect_identifier()?;
                StatementNode::ObjectDecl {
                    class_name: None,
                    name,
                }
            }
            TokenKind::Identifier(_) => self.parse_simple_statement()?,
            _ => return Err(self.error("statement")),
        };
        while self.eat(&TokenKind::Semicolon) {}
        Ok(statement)
    }

    fn parse_simple_statement(&mut self) -> ParseResult<StatementNode> {
        if matches!(self.peek_kind(1), TokenKind::Identifier(_)) {
            let class_name = self.expect_identifier()?;
            let name = self.expect_identifier()?;
            return Ok(StatementNode::ObjectDecl {
                class_name: Some(class_name),
                name,
            });
        }
        if self.peek_kind(1) == &TokenKind::LParen {
            let name = self.expect_identifier()?;
            let args = self.parse_arguments()?;
            return Ok(StatementNode::Call { name, args });
        }
        let target = self.parse_postfix()?;
        if !self.check(&TokenKind::Assign) {
            return Err(self.error("assignment operator"));
        }
        let token = self.advance();
        let assign = operator(&token);
        let value = self.parse_expression()?;
        Ok(StatementNode::Assign {
            target,
            assign,
            value,
        })
    }

    fn parse_if(&mut self) -> ParseResult<StatementNode> {
        self.expect(TokenKind::If, "IF")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then, "THEN")?;
        let then_block = self.parse_body()?;
        let else_block = if self.eat(&TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        let last_delimited = else_block.as_ref().unwrap_or(&then_block).delimited;
        self.parse_closer(TokenKind::EndIf, TokenKind::If, !last_delimited, "IF")?;
        Ok(StatementNode::If {
            condition,
            then_block,
            else_block,
        })
    }

    fn parse_while(&mut self) -> ParseResult<StatementNode> {
        self.expect(TokenKind::While, "WHILE")?;
        let condition = self.parse_expression()?;
        self.eat(&TokenKind::Do);
        let body = self.parse_body()?;
        self.parse_closer(
            TokenKind::EndWhile,
            TokenKind::While,
            !body.delimited,
            "WHILE",
        )?;
        Ok(StatementNode::While { condition, body })
    }

    fn parse_for(&mut self) -> ParseResult<StatementNode> {
        self.expect(TokenKind::For, "FOR")?;
        let var = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "assignment operator")?;
        let start = self.parse_expression()?;
        self.expect(TokenKind::To, "TO")?;
        let end = self.parse_expression()?;
        let step = if self.eat(&TokenKind::Step) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.eat(&TokenKind::Do);
        let body = self.parse_body()?;
        self.parse_closer(TokenKind::EndFor, TokenKind::For, !body.delimited, "FOR")?;
        Ok(StatementNode::For {
            var,
            start,
            end,
            step,
            body,
        })
    }

    fn parse_repeat(&mut self) -> ParseResult<StatementNode> {
        self.expect(TokenKind::Repeat, "REPEAT")?;
        let body = self.parse_body()?;
        self.expect(TokenKind::Until, "UNTIL")?;
        let condition = self.parse_expression()?;
        while self.eat(&TokenKind::Semicolon) {}
        Ok(StatementNode::Repeat { body, condition })
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<ExprNode>> {
        self.expect(TokenKind::LParen, "(")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, ")")?;
        Ok(args)
    }

    fn parse_expression(&mut self) -> ParseResult<ExprNode> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<ExprNode> {
        self.parse_binary_level(|kind| matches!(kind, TokenKind::Or), Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<ExprNode> {
        self.parse_binary_level(|kind| matches!(kind, TokenKind::And), Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> ParseResult<ExprNode> {
        self.parse_binary_level(
            |kind| {
                matches!(
                    kind,
                    TokenKind::Equal
                        | TokenKind::NotEqual
                        | TokenKind::Less
                        | TokenKind::LessEqual
                        | TokenKind::Greater
                        | TokenKind::GreaterEqual
                )
            },
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> ParseResult<ExprNode> {
        self.parse_binary_level(
            |kind| matches!(kind, TokenKind::Plus | TokenKind::Minus),
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> ParseResult<ExprNode> {
        self.parse_binary_level(
            |kind| {
                matches!(
                    kind,
                    TokenKind::Star | TokenKind::Slash | TokenKind::Div | TokenKind::Mod
                )
            },
            Self::parse_unary,
        )
    }

    /// One left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        is_operator: fn(&TokenKind<'a>) -> bool,
        operand: fn(&mut Self) -> ParseResult<ExprNode>,
    ) -> ParseResult<ExprNode> {
        let mut expr = operand(self)?;
        while is_operator(&self.current().kind) {
            let token = self.advance();
            let right = operand(self)?;
            expr = ExprNode::Binary {
                left: Box::new(expr),
                op: Some(operator(&token)),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<ExprNode> {
        if matches!(
            self.current().kind,
            TokenKind::Minus | TokenKind::Not | TokenKind::Floor | TokenKind::Ceil
        ) {
            let token = self.advance();
            let operand = self.parse_unary()?;
            return Ok(ExprNode::Unary {
                op: operator(&token),
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<ExprNode> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current().kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "]")?;
                    expr = ExprNode::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_identifier()?;
                    expr = ExprNode::Field {
                        base: Box::new(expr),
                        field,
                    };
                }
                TokenKind::LParen => {
                    let ExprNode::Name(callee) = &expr else {
                        break;
                    };
                    let callee = callee.clone();
                    let args = self.parse_arguments()?;
                    expr = ExprNode::Call { callee, args };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<ExprNode> {
        let span = self.current().span;
        match self.current().kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(ExprNode::Integer { value, span })
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(ExprNode::Str {
                    value: value.to_string(),
                    span,
                })
            }
            TokenKind::True | TokenKind::False => {
                let value = matches!(self.advance().kind, TokenKind::True);
                Ok(ExprNode::Boolean { value, span })
            }
            TokenKind::Identifier(_) => Ok(ExprNode::Name(self.expect_identifier()?)),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, ")")?;
                Ok(ExprNode::Group {
                    inner: Box::new(inner),
                    span,
                })
            }
            _ => Err(self.error("expression")),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<Ident> {
        if let TokenKind::Identifier(name) = self.current().kind {
            let span = self.current().span;
            self.advance();
            Ok(Ident {
                text: name.to_string(),
                span,
            })
        } else {
            Err(self.error("identifier"))
        }
    }

    fn check_identifier(&self) -> bool {
        matches!(self.current().kind, TokenKind::Identifier(_))
    }

    fn expect(&mut self, kind: TokenKind<'a>, expected: &str) -> ParseResult<Token<'a>> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn check(&self, kind: &TokenKind<'a>) -> bool {
        &self.current().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind<'a>) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current(&self) -> &Token<'a> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind<'a> {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> SyntaxError {
        let token = self.current();
        let found = if matches!(token.kind, TokenKind::EOF) {
            "end of input".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        SyntaxError::new(format!("Expected {expected}, got {found}"), token.span)
    }
}

fn operator(token: &Token<'_>) -> OperatorToken {
    OperatorToken {
        lexeme: token.lexeme.to_string(),
        span: token.span,
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> Result<SyntaxTree, SyntaxError> {
    Parser::new(tokens).parse_tree()
}

pub fn parse(input: &str) -> Result<SyntaxTree, SyntaxError> {
    let tokens = tokenize(input)?;
    parse_tokens(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn single_procedure(input: &str) -> ProcedureDecl {
        let tree = parse(input).expect("parse failed");
        match tree.items.into_iter().next() {
            Some(Item::Procedure(procedure)) => procedure,
            other => panic!("expected a procedure, got {other:?}"),
        }
    }

    #[test]
    fn parses_simple_procedure() {
        let procedure = single_procedure(indoc! {"
            PROCEDURE P(n)
            BEGIN
                x := 1;
            END
        "});
        assert_eq!(procedure.name.text, "P");
        assert_eq!(procedure.params.len(), 1);
        assert!(procedure.body.delimited);
        match &procedure.body.statements[..] {
            [StatementNode::Assign { target, assign, value }] => {
                assert!(matches!(target, ExprNode::Name(ident) if ident.text == "x"));
                assert_eq!(assign.lexeme, ":=");
                assert!(matches!(value, ExprNode::Integer { value: 1, .. }));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn parses_typed_params_and_classes() {
        let tree = parse(indoc! {"
            CLASS Casa {Area color propietario}
            PROCEDURE Area(A: ARRAY, n: INTEGER)
            BEGIN
                Casa miCasa;
            END
        "})
        .expect("parse failed");
        assert_eq!(tree.items.len(), 2);
        let Item::Class(class) = &tree.items[0] else {
            panic!("expected class");
        };
        assert_eq!(class.attributes.len(), 3);
        let Item::Procedure(procedure) = &tree.items[1] else {
            panic!("expected procedure");
        };
        assert_eq!(
            procedure.params[0].type_name.as_ref().map(|t| t.text.as_str()),
            Some("ARRAY")
        );
        assert!(matches!(
            procedure.body.statements[0],
            StatementNode::ObjectDecl { .. }
        ));
    }

    #[test]
    fn accepts_every_block_closing_style() {
        let procedure = single_procedure(indoc! {"
            PROCEDURE Styles(A, n)
            BEGIN
                FOR i <- 1 TO n DO
                    IF A[i] = 0 THEN
                        RETURN i;
                    END
                END
                WHILE n > 0 DO
                    n <- n - 1;
                END WHILE
                IF n < 0 THEN
                BEGIN
                    n <- 0;
                END
                ENDIF
                FOR j := 1 TO n DO
                BEGIN
                    x := j;
                END
                REPEAT
                    n := n - 1;
                UNTIL n = 0
            END
        "});
        assert_eq!(procedure.body.statements.len(), 5);
        assert!(matches!(
            procedure.body.statements[4],
            StatementNode::Repeat { .. }
        ));
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let procedure = single_procedure(indoc! {"
            PROCEDURE Search(A, x, mid)
            BEGIN
                IF A[mid] = x THEN
                    RETURN mid;
                ELSE
                    IF A[mid] < x THEN
                        RETURN 1;
                    ELSE
                        RETURN 0;
                    END
                END
            END
        "});
        let [StatementNode::If { else_block, .. }] = &procedure.body.statements[..] else {
            panic!("expected a single IF");
        };
        let else_block = else_block.as_ref().expect("else branch");
        assert!(matches!(
            &else_block.statements[..],
            [StatementNode::If {
                else_block: Some(_),
                ..
            }]
        ));
    }

    #[test]
    fn respects_operator_precedence() {
        let procedure = single_procedure("PROCEDURE P() BEGIN x := 1 + 2 * 3 < 4 and not y; END");
        let StatementNode::Assign { value, .. } = &procedure.body.statements[0] else {
            panic!("expected assignment");
        };
        let ExprNode::Binary { op, left, .. } = value else {
            panic!("expected binary root");
        };
        assert_eq!(op.as_ref().map(|op| op.lexeme.as_str()), Some("and"));
        let ExprNode::Binary { op, left, .. } = left.as_ref() else {
            panic!("expected comparison");
        };
        assert_eq!(op.as_ref().map(|op| op.lexeme.as_str()), Some("<"));
        let ExprNode::Binary { op, right, .. } = left.as_ref() else {
            panic!("expected addition");
        };
        assert_eq!(op.as_ref().map(|op| op.lexeme.as_str()), Some("+"));
        assert!(matches!(right.as_ref(), ExprNode::Binary { .. }));
    }

    #[test]
    fn keeps_groups_and_call_expressions() {
        let procedure =
            single_procedure("PROCEDURE P(A, l, r) BEGIN m := floor((l + r) / 2); v := f(A)[m]; END");
        let StatementNode::Assign { value, .. } = &procedure.body.statements[0] else {
            panic!("expected assignment");
        };
        let ExprNode::Unary { op, operand } = value else {
            panic!("expected floor");
        };
        assert_eq!(op.lexeme, "floor");
        let ExprNode::Group { inner, .. } = operand.as_ref() else {
            panic!("expected parenthesized operand");
        };
        let ExprNode::Binary { left, .. } = inner.as_ref() else {
            panic!("expected division");
        };
        assert!(matches!(left.as_ref(), ExprNode::Group { .. }));
        let StatementNode::Assign { value, .. } = &procedure.body.statements[1] else {
            panic!("expected assignment");
        };
        let ExprNode::Index { base, .. } = value else {
            panic!("expected index");
        };
        assert!(matches!(base.as_ref(), ExprNode::Call { .. }));
    }

    #[test]
    fn parses_call_statements_with_and_without_keyword() {
        let procedure = single_procedure(indoc! {"
            PROCEDURE Sort(A, p, r)
            BEGIN
                CALL Sort(A, p, r - 1);
                Merge(A, p, r);
                RETURN;
            END
        "});
        assert!(matches!(
            &procedure.body.statements[..],
            [
                StatementNode::Call { .. },
                StatementNode::Call { .. },
                StatementNode::Return { value: None, .. }
            ]
        ));
    }

    #[test]
    fn reports_position_of_first_error() {
        let err = parse("PROCEDURE X ( BEGIN").expect_err("expected syntax error");
        assert!(err.message.contains("Expected identifier"));
        assert_eq!(err.position.line, 1);
        assert_eq!(err.position.column, 14);
    }

    #[test]
    fn missing_closer_is_an_error() {
        let err = parse(indoc! {"
            PROCEDURE P(n)
            BEGIN
                WHILE n > 0 DO
                    n := n - 1;
        "})
        .expect_err("expected syntax error");
        assert!(err.message.contains("got end of input"), "{}", err.message);
    }

    #[test]
    fn lexical_errors_surface_as_syntax_errors() {
        let err = parse("PROCEDURE P() BEGIN x := 1 $ 2; END").expect_err("expected failure");
        assert!(err.message.contains("Unexpected character '$'"));
        assert_eq!(err.position.column, 27);
    }
}
