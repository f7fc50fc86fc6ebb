mod token;

use std::str::Chars;

use smol_str::SmolStr;
use thiserror::Error;
pub use token::*;
use tracing::trace;

use crate::source::Diagnostic;

#[derive(Debug, Error, PartialEq)]
pub enum LexErrorKind {
    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("Unexpected character '.' in number")]
    MalformedNumber,
    #[error("Unterminated string")]
    UnterminatedString,
}

#[derive(Debug, Error, PartialEq)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic for LexError {
    fn message(&self) -> String {
        self.kind.to_string()
    }

    fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn len(&self) -> usize {
        1
    }
}

/// The output of [`Lexer::lex`]: the tokens read so far, always terminated by
/// an [`TokenKind::Eof`] token, plus the error that stopped the lexer, if
/// any. On error the token stream is truncated at the point of failure.
#[derive(Debug, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub error: Option<LexError>,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src str,
    chars: Chars<'src>,

    current: char,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut chars = src.chars();
        let current = chars.next().unwrap_or('\0');
        Self {
            src,
            chars,
            current,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn lex(mut self) -> Lexed {
        let mut tokens = Vec::new();
        let mut error = None;

        'lex: while self.current != '\0' {
            let (start, line, column) = (self.pos, self.line, self.column);

            /// Push a token spanning `start` up to the current position.
            macro_rules! token {
                ($kind:ident, $text:expr) => {{
                    trace!("read {:?} at {start}", TokenKind::$kind);
                    tokens.push(Token {
                        kind: TokenKind::$kind,
                        text: SmolStr::new($text),
                        line,
                        column,
                        start,
                        end: self.pos,
                    });
                }};
            }
            macro_rules! fail {
                ($kind:expr) => {
                    fail!($kind, line, column)
                };
                ($kind:expr, $line:expr, $column:expr) => {{
                    error = Some(LexError {
                        kind: $kind,
                        line: $line,
                        column: $column,
                    });
                    break 'lex;
                }};
            }

            match self.current {
                ' ' | '\t' | '\r' | '\n' => self.consume(),

                '(' => {
                    self.consume();
                    token!(LParen, "(");
                }
                ')' => {
                    self.consume();
                    token!(RParen, ")");
                }
                ',' => {
                    self.consume();
                    token!(Comma, ",");
                }
                '+' => {
                    self.consume();
                    token!(Plus, "+");
                }
                '*' => {
                    self.consume();
                    token!(Star, "*");
                }
                '/' => {
                    self.consume();
                    token!(Slash, "/");
                }
                '^' => {
                    self.consume();
                    token!(Caret, "^");
                }
                '%' => {
                    self.consume();
                    token!(Percent, "%");
                }

                '-' if self.peek() == '-' => {
                    // `--` opens a comment running to the end of the line. The
                    // token's text keeps the dashes but not the newline.
                    self.consume();
                    self.consume();
                    self.consume_while(|c| c != '\n');
                    token!(Comment, &self.src[start..self.pos]);
                }
                '-' => {
                    self.consume();
                    token!(Minus, "-");
                }

                '>' if self.peek() == '=' => {
                    self.consume();
                    self.consume();
                    token!(Ge, ">=");
                }
                '>' => {
                    self.consume();
                    token!(Gt, ">");
                }
                '<' if self.peek() == '=' => {
                    self.consume();
                    self.consume();
                    token!(Le, "<=");
                }
                '<' => {
                    self.consume();
                    token!(Lt, "<");
                }
                '~' if self.peek() == '=' => {
                    self.consume();
                    self.consume();
                    token!(Ne, "~=");
                }
                '~' => {
                    self.consume();
                    token!(Tilde, "~");
                }
                '=' if self.peek() == '=' => {
                    self.consume();
                    self.consume();
                    token!(Eq, "==");
                }
                '=' => fail!(LexErrorKind::UnexpectedChar('=')),
                ':' if self.peek() == '=' => {
                    self.consume();
                    self.consume();
                    token!(ColonAssign, ":=");
                }
                ':' => fail!(LexErrorKind::UnexpectedChar(':')),

                quote @ ('"' | '\'') => {
                    self.consume();
                    let mut text = String::new();
                    loop {
                        match self.current {
                            '\0' => fail!(LexErrorKind::UnterminatedString),
                            c if c == quote => {
                                self.consume();
                                break;
                            }
                            '\\' => match self.peek() {
                                'n' => {
                                    text.push('\n');
                                    self.consume();
                                    self.consume();
                                }
                                't' => {
                                    text.push('\t');
                                    self.consume();
                                    self.consume();
                                }
                                '"' => {
                                    text.push('"');
                                    self.consume();
                                    self.consume();
                                }
                                _ => {
                                    text.push('\\');
                                    self.consume();
                                }
                            },
                            c => {
                                text.push(c);
                                self.consume();
                            }
                        }
                    }
                    token!(String, text);
                }

                c if c.is_ascii_digit() => {
                    self.consume_while(|c| c.is_ascii_digit());
                    if self.current == '.' {
                        if !self.peek().is_ascii_digit() {
                            fail!(LexErrorKind::MalformedNumber, self.line, self.column);
                        }
                        self.consume();
                        self.consume_while(|c| c.is_ascii_digit());
                    }
                    token!(Number, &self.src[start..self.pos]);
                }

                c if is_ident_start(c) => {
                    let s = self.consume_while(is_ident_char);
                    let kind = TokenKind::from_kw(s).unwrap_or(TokenKind::Ident);
                    trace!("read {kind:?} at {start}");
                    tokens.push(Token {
                        kind,
                        text: SmolStr::new(s),
                        line,
                        column,
                        start,
                        end: self.pos,
                    });
                }

                c => fail!(LexErrorKind::UnexpectedChar(c)),
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            text: SmolStr::default(),
            line: self.line,
            column: self.column,
            start: self.pos,
            end: self.pos,
        });

        Lexed { tokens, error }
    }

    /// Advance the lexer by one character.
    fn consume(&mut self) {
        if self.current == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += self.current.len_utf8() as u32;
        }
        self.pos += self.current.len_utf8();
        self.current = self.chars.next().unwrap_or('\0');
    }

    /// Peek at the next character after `self.current`.
    fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or('\0')
    }

    /// Consume characters while the given predicate holds, halting at the end
    /// of input.
    fn consume_while<F>(&mut self, mut f: F) -> &'src str
    where
        F: FnMut(char) -> bool,
    {
        let start = self.pos;
        while self.current != '\0' && f(self.current) {
            self.consume();
        }
        &self.src[start..self.pos]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    macro_rules! lexer_test {
        ($name:ident, $input:expr, [$($kind:ident $text:expr),* $(,)?]) => {
            #[test]
            fn $name() {
                let lexed = Lexer::new($input).lex();
                assert_eq!(None, lexed.error);
                let got = lexed
                    .tokens
                    .iter()
                    .map(|t| (t.kind, t.text.as_str()))
                    .collect::<Vec<_>>();
                let expect = vec![$((TokenKind::$kind, $text),)* (TokenKind::Eof, "")];
                assert_eq!(expect, got);
            }
        };
        (@fail $name:ident, $input:expr, $kind:expr, $line:expr, $column:expr) => {
            #[test]
            fn $name() {
                let lexed = Lexer::new($input).lex();
                let err = lexed.error.expect("lexer should fail");
                assert_eq!($kind, err.kind);
                assert_eq!(($line, $column), (err.line, err.column));
                assert_eq!(
                    TokenKind::Eof,
                    lexed.tokens.last().expect("should end with eof").kind
                );
            }
        };
    }

    lexer_test!(
        punctuation,
        "( ) , + - * / ^ %",
        [
            LParen "(",
            RParen ")",
            Comma ",",
            Plus "+",
            Minus "-",
            Star "*",
            Slash "/",
            Caret "^",
            Percent "%",
        ]
    );

    lexer_test!(
        two_char_operators,
        ">= <= ~= == := < > ~",
        [Ge ">=", Le "<=", Ne "~=", Eq "==", ColonAssign ":=", Lt "<", Gt ">", Tilde "~"]
    );

    lexer_test!(
        keywords,
        "if elif then else true false and or while do for func end print println ret local",
        [
            If "if",
            Elif "elif",
            Then "then",
            Else "else",
            True "true",
            False "false",
            And "and",
            Or "or",
            While "while",
            Do "do",
            For "for",
            Func "func",
            End "end",
            Print "print",
            Println "println",
            Ret "ret",
            Local "local",
        ]
    );

    lexer_test!(
        identifiers,
        "x foo_bar _tmp x2 iffy",
        [Ident "x", Ident "foo_bar", Ident "_tmp", Ident "x2", Ident "iffy"]
    );

    lexer_test!(
        numbers,
        "0 5 3.25 100.0",
        [Number "0", Number "5", Number "3.25", Number "100.0"]
    );

    lexer_test!(
        strings,
        "\"hello world\" 'hi'",
        [String "hello world", String "hi"]
    );

    lexer_test!(
        string_escapes,
        r#""a\nb\tc\"d" "back\slash""#,
        [String "a\nb\tc\"d", String "back\\slash"]
    );

    lexer_test!(
        comments,
        "x := 1 -- trailing comment\n-- whole line\ny := 2",
        [
            Ident "x",
            ColonAssign ":=",
            Number "1",
            Comment "-- trailing comment",
            Comment "-- whole line",
            Ident "y",
            ColonAssign ":=",
            Number "2",
        ]
    );

    lexer_test!(
        minus_vs_comment,
        "1 - 2 --3",
        [Number "1", Minus "-", Number "2", Comment "--3"]
    );

    lexer_test!(@fail lone_equals, "x = 1", LexErrorKind::UnexpectedChar('='), 1, 3);
    lexer_test!(@fail lone_colon, "x : 1", LexErrorKind::UnexpectedChar(':'), 1, 3);
    lexer_test!(@fail unknown_char, "x := @", LexErrorKind::UnexpectedChar('@'), 1, 6);
    lexer_test!(@fail trailing_dot, "print 3.", LexErrorKind::MalformedNumber, 1, 8);
    lexer_test!(@fail unterminated_string, "print \"oops", LexErrorKind::UnterminatedString, 1, 7);

    #[test]
    fn positions() {
        let lexed = Lexer::new("print 5\nx := 10").lex();
        assert_eq!(None, lexed.error);
        let spots = lexed
            .tokens
            .iter()
            .map(|t| (t.line, t.column, t.start, t.end))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                (1, 1, 0, 5),
                (1, 7, 6, 7),
                (2, 1, 8, 9),
                (2, 3, 10, 12),
                (2, 6, 13, 15),
                (2, 8, 15, 15),
            ],
            spots
        );
    }

    #[test]
    fn error_truncates_stream() {
        let lexed = Lexer::new("print 5 = 3").lex();
        assert!(lexed.error.is_some());
        let kinds = lexed.tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
        assert_eq!(
            vec![TokenKind::Print, TokenKind::Number, TokenKind::Eof],
            kinds
        );
    }

    #[test]
    fn offsets_reconstruct_source() {
        let src = "for i := 1, 10 do println \"a b\" end";
        let lexed = Lexer::new(src).lex();
        assert_eq!(None, lexed.error);
        // Token offsets always point back at the exact source slice, even for
        // tokens whose text is decoded.
        for tok in &lexed.tokens {
            if tok.kind != TokenKind::String {
                assert_eq!(&src[tok.start..tok.end], tok.text.as_str());
            }
        }
    }

    #[test]
    fn whitespace_insensitive() {
        let a = Lexer::new("print 1 + 2").lex();
        let b = Lexer::new("print   1+\t2").lex();
        let kinds = |l: &Lexed| {
            l.tokens
                .iter()
                .map(|t| (t.kind, t.text.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(kinds(&a), kinds(&b));
    }
}
