//! JavaScript 词法分析器
//!
//! 只覆盖事件处理器和 `javascript:` 链接中会出现的语法：
//! 标识符、数字、字符串、注释以及常见的运算符。
//! 正则字面量和模板字符串不受支持，遇到时报告解析错误。

use crate::error::{RetrofitError, RetrofitResult};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Punct(&'static str),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    /// 该记号之前是否出现过换行（用于自动分号插入）
    pub newline_before: bool,
}

/// 按长度从长到短排列，保证最长匹配
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "**=", "==", "!=", "<=", ">=", "&&", "||", "??",
    "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "**", "=>", "(", ")",
    "[", "]", "{", "}", ",", ";", ".", "=", "+", "-", "*", "/", "%", "!", "?", ":", "<", ">",
    "&", "|", "^", "~",
];

pub fn tokenize(src: &str) -> RetrofitResult<Vec<Token>> {
    let mut lexer = Lexer {
        src,
        chars: src.char_indices().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();

    loop {
        let newline_before = lexer.skip_trivia()?;
        let offset = lexer.offset();
        let Some(c) = lexer.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                offset,
                newline_before,
            });
            break;
        };

        let kind = if c.is_alphabetic() || c == '_' || c == '$' {
            TokenKind::Ident(lexer.read_ident())
        } else if c.is_ascii_digit() || (c == '.' && lexer.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
            TokenKind::Number(lexer.read_number()?)
        } else if c == '\'' || c == '"' {
            TokenKind::Str(lexer.read_string(c)?)
        } else if c == '`' {
            return Err(RetrofitError::parse(format!(
                "template literals are not supported (offset {})",
                offset
            )));
        } else {
            TokenKind::Punct(lexer.read_punct()?)
        };

        tokens.push(Token {
            kind,
            offset,
            newline_before,
        });
    }

    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.src.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// 跳过空白和注释，返回其间是否有换行
    fn skip_trivia(&mut self) -> RetrofitResult<bool> {
        let mut newline = false;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    if c == '\n' || c == '\r' || c == '\u{2028}' || c == '\u{2029}' {
                        newline = true;
                    }
                    self.pos += 1;
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.offset();
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(c), _) => {
                                if c == '\n' {
                                    newline = true;
                                }
                                self.pos += 1;
                            }
                            (None, _) => {
                                return Err(RetrofitError::parse(format!(
                                    "unterminated comment starting at offset {}",
                                    start
                                )))
                            }
                        }
                    }
                }
                // HTML 注释形式的“单行注释”在旧页面脚本中很常见
                (Some('<'), Some('!')) if self.rest().starts_with("<!--") => {
                    self.pos += 4;
                }
                (Some('-'), Some('-')) if self.rest().starts_with("-->") => {
                    self.pos += 3;
                }
                _ => return Ok(newline),
            }
        }
    }

    fn rest(&self) -> &'a str {
        let src: &'a str = self.src;
        &src[self.offset()..]
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self) -> RetrofitResult<f64> {
        let start = self.offset();
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.pos += 2;
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                digits.push(c);
                self.pos += 1;
            }
            return u64::from_str_radix(&digits, 16)
                .map(|v| v as f64)
                .map_err(|_| RetrofitError::parse(format!("invalid hex literal at offset {}", start)));
        }

        let mut literal = String::new();
        while let Some(c) = self.peek() {
            let exponent_sign =
                (c == '+' || c == '-') && matches!(literal.chars().last(), Some('e') | Some('E'));
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                literal.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        literal
            .parse::<f64>()
            .map_err(|_| RetrofitError::parse(format!("invalid number {:?} at offset {}", literal, start)))
    }

    fn read_string(&mut self, quote: char) -> RetrofitResult<String> {
        let start = self.offset();
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(RetrofitError::parse(format!(
                        "unterminated string literal starting at offset {}",
                        start
                    )))
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some('v') => value.push('\u{b}'),
                    Some('0') => value.push('\0'),
                    Some('x') => value.push(self.read_hex_escape(2, start)?),
                    Some('u') => value.push(self.read_hex_escape(4, start)?),
                    // 行继续符
                    Some('\n') => {}
                    Some(other) => value.push(other),
                    None => {
                        return Err(RetrofitError::parse(format!(
                            "unterminated string literal starting at offset {}",
                            start
                        )))
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn read_hex_escape(&mut self, len: usize, start: usize) -> RetrofitResult<char> {
        let mut digits = String::new();
        for _ in 0..len {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                _ => {
                    return Err(RetrofitError::parse(format!(
                        "invalid escape sequence in string starting at offset {}",
                        start
                    )))
                }
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| RetrofitError::parse(format!("invalid code point \\{}", digits)))
    }

    fn read_punct(&mut self) -> RetrofitResult<&'static str> {
        let offset = self.offset();
        let rest = self.rest();
        for punct in PUNCTUATORS {
            if rest.starts_with(punct) {
                self.pos += punct.chars().count();
                return Ok(punct);
            }
        }
        Err(RetrofitError::parse(format!(
            "unexpected character {:?} at offset {}",
            rest.chars().next().unwrap_or_default(),
            offset
        )))
    }
}
