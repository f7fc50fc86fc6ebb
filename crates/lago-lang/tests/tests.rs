use lago_lang::{
    ast::{ExprKind, StmtKind},
    Lexer, Parser, Source, TokenKind,
};
use pretty_assertions::assert_eq;

const FIZZBUZZ: &str = "\
-- classic fizzbuzz, lago style
func fizzbuzz(n)
  for i := 1, n do
    if i % 15 == 0 then
      println \"fizzbuzz\"
    elif i % 3 == 0 then
      println \"fizz\"
    elif i % 5 == 0 then
      println \"buzz\"
    else
      println i
    end
  end
  ret n
end

local total := fizzbuzz(100)
println \"done: \" + total
";

#[test]
fn lex_and_parse_a_whole_program() {
    let lexed = Lexer::new(FIZZBUZZ).lex();
    assert_eq!(None, lexed.error);
    let program = Parser::new(&lexed.tokens).parse().expect("should parse");
    assert_eq!(3, program.body.len());
    assert!(matches!(program.body[0].kind, StmtKind::FuncDecl(_)));
    assert!(matches!(program.body[1].kind, StmtKind::LocalAssign { .. }));
}

#[test]
fn round_trip_a_whole_program() {
    let lexed = Lexer::new(FIZZBUZZ).lex();
    let program = Parser::new(&lexed.tokens).parse().expect("should parse");
    let pretty = program.to_string();
    let relexed = Lexer::new(&pretty).lex();
    assert_eq!(None, relexed.error);
    let reparsed = Parser::new(&relexed.tokens).parse().expect("should reparse");
    assert_eq!(program, reparsed);
}

#[test]
fn token_offsets_cover_the_source() {
    // Concatenating the source slices of all tokens in order reproduces the
    // source, up to whitespace.
    let lexed = Lexer::new(FIZZBUZZ).lex();
    let joined = lexed
        .tokens
        .iter()
        .map(|t| &FIZZBUZZ[t.start..t.end])
        .collect::<String>();
    let stripped = FIZZBUZZ
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    let joined_stripped = joined
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    assert_eq!(stripped, joined_stripped);
}

#[test]
fn tokens_are_whitespace_insensitive() {
    let dense = Lexer::new("x:=1+2*3").lex();
    let spaced = Lexer::new("x  :=\t1 + 2   * 3").lex();
    let kinds = |l: &lago_lang::Lexed| l.tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
    assert_eq!(kinds(&dense), kinds(&spaced));
    assert_eq!(
        vec![
            TokenKind::Ident,
            TokenKind::ColonAssign,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Star,
            TokenKind::Number,
            TokenKind::Eof,
        ],
        kinds(&dense)
    );
}

#[test]
fn string_literals_decode_escapes() {
    let lexed = Lexer::new("println \"a\\tb\\nc\"").lex();
    let program = Parser::new(&lexed.tokens).parse().expect("should parse");
    let StmtKind::Println(expr) = &program.body[0].kind else {
        panic!("should be a println");
    };
    let ExprKind::String(s) = &expr.kind else {
        panic!("should be a string literal");
    };
    assert_eq!("a\tb\nc", s.as_str());
}

#[test]
fn diagnostics_render_against_the_source() {
    let text = "print 5\nprint \"unclosed";
    let source = Source::new("<test>", text.to_owned());
    let lexed = Lexer::new(source.contents()).lex();
    let err = lexed.error.expect("should fail to lex");
    let mut buf = vec![];
    source.fmt_diagnostic(&err, &mut buf).expect("should write");
    let report = String::from_utf8(buf).expect("report should be utf-8");
    assert!(report.contains("Unterminated string"), "got: {report}");
}

#[test]
fn parse_error_positions_point_at_the_offending_token() {
    let lexed = Lexer::new("if x < 1 print 1 end").lex();
    let err = Parser::new(&lexed.tokens).parse().expect_err("should fail");
    assert_eq!((1, 10), (err.line, err.column));
    assert_eq!(5, err.token_len);
}
