use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

pub mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    eof_reached: bool,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            eof_reached: false,
            line: 1,
            column: 0,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_trivia();

        let (start_idx, ch) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => {
                self.eof_reached = true;
                let index = self.input.len();
                return Ok(Token::new(
                    TokenKind::EOF,
                    "",
                    Span {
                        start: index,
                        end: index,
                        line: self.line,
                        column: self.column,
                    },
                ));
            }
        };

        let start_line = self.line;
        let start_column = self.column;
        let kind = match ch {
            '"' => return self.read_string(start_idx, start_line, start_column),
            c if c.is_alphabetic() || c == '_' => {
                return Ok(self.read_word(start_idx, start_line, start_column));
            }
            c if c.is_ascii_digit() => {
                return self.read_integer(start_idx, start_line, start_column);
            }
            '←' | '🡨' => self.single(TokenKind::Assign),
            '≤' => self.single(TokenKind::LessEqual),
            '≥' => self.single(TokenKind::GreaterEqual),
            '≠' => self.single(TokenKind::NotEqual),
            '=' => self.single(TokenKind::Equal),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ':' => {
                self.advance_char();
                if self.eat_char('=') {
                    TokenKind::Assign
                } else {
                    TokenKind::Colon
                }
            }
            '<' => {
                self.advance_char();
                if self.eat_char('=') {
                    TokenKind::LessEqual
                } else if self.eat_char('>') {
                    TokenKind::NotEqual
                } else if self.eat_char('-') {
                    TokenKind::Assign
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                self.advance_char();
                if self.eat_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '!' => {
                self.advance_char();
                if self.eat_char('=') {
                    TokenKind::NotEqual
                } else {
                    return Err(LexError::UnexpectedCharacter {
                        character: '!',
                        position: Span {
                            start: start_idx,
                            end: start_idx + 1,
                            line: start_line,
                            column: start_column,
                        },
                    });
                }
            }
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    position: Span {
                        start: start_idx,
                        end: start_idx + ch.len_utf8(),
                        line: start_line,
                        column: start_column,
                    },
                });
            }
        };

        let end_idx = self.current_index();
        Ok(Token::new(
            kind,
            &self.input[start_idx..end_idx],
            Span {
                start: start_idx,
                end: end_idx,
                line: start_line,
                column: start_column,
            },
        ))
    }

    fn single(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.advance_char();
        kind
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and line comments (`//` and `►`).
    fn skip_trivia(&mut self) {
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else if c == '►' || (c == '/' && self.input[idx..].starts_with("//")) {
                while let Some(&(_, c)) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance_char();
                }
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume first char
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end_idx = self.current_index();
        let word = &self.input[start..end_idx];
        let kind = keyword(word).unwrap_or(TokenKind::Identifier(word));
        Token::new(
            kind,
            word,
            Span {
                start,
                end: end_idx,
                line,
                column,
            },
        )
    }

    fn read_integer(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume first digit
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }

        let end_idx = self.current_index();
        let span = Span {
            start,
            end: end_idx,
            line,
            column,
        };
        let num_str = &self.input[start..end_idx];
        let num = num_str
            .parse::<i64>()
            .map_err(|_| LexError::InvalidIntegerLiteral {
                literal: num_str.to_string(),
                position: span,
            })?;
        Ok(Token::new(TokenKind::Integer(num), num_str, span))
    }

    fn read_string(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume opening quote
        let content_start = (start + 1).min(self.input.len());
        let unterminated = LexError::UnterminatedString {
            position: Span {
                start,
                end: start + 1,
                line,
                column,
            },
        };
        while let Some(&(idx, c)) = self.chars.peek() {
            if c == '"' {
                self.advance_char(); // Consume closing quote
                return Ok(Token::new(
                    TokenKind::String(&self.input[content_start..idx]),
                    &self.input[start..idx + 1],
                    Span {
                        start,
                        end: idx + 1,
                        line,
                        column,
                    },
                ));
            }
            if c == '\n' {
                return Err(unterminated);
            }
            self.advance_char();
        }
        Err(unterminated)
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

fn keyword<'a>(word: &str) -> Option<TokenKind<'a>> {
    let kind = match word.to_ascii_lowercase().as_str() {
        "procedure" => TokenKind::Procedure,
        "begin" => TokenKind::Begin,
        "end" => TokenKind::End,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "endif" => TokenKind::EndIf,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "endwhile" => TokenKind::EndWhile,
        "for" => TokenKind::For,
        "to" => TokenKind::To,
        "step" => TokenKind::Step,
        "endfor" => TokenKind::EndFor,
        "repeat" => TokenKind::Repeat,
        "until" => TokenKind::Until,
        "call" => TokenKind::Call,
        "return" => TokenKind::Return,
        "class" | "clase" => TokenKind::Class,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "div" => TokenKind::Div,
        "mod" => TokenKind::Mod,
        "floor" => TokenKind::Floor,
        "ceil" => TokenKind::Ceil,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

pub fn tokenize<'a>(input: &'a str) -> LexResult<Vec<Token<'a>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::EOF);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}
