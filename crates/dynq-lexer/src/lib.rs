// dynq lexer -- tokenizer for the dynq expression language.

mod cursor;

use cursor::Cursor;
use dynq_common::{ParseError, ParseErrorKind, Token, TokenKind};

/// The dynq lexer. Converts source text into tokens one at a time.
///
/// This is a pull lexer: the parser keeps a single token of lookahead and
/// asks for the next one as it goes. The first lexical error aborts the
/// parse, so errors surface through `Result` rather than error tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    source: &'src str,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            source,
        }
    }

    /// Convenience: tokenize the entire source, excluding the final
    /// `End` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            if tok.kind == TokenKind::End {
                return Ok(out);
            }
            out.push(tok);
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.cursor.bump_while(char::is_whitespace);

        let start = self.cursor.pos();

        let Some(c) = self.cursor.ch() else {
            return Ok(Token::new(TokenKind::End, start, start));
        };

        match c {
            '!' => Ok(self.one_or_two(TokenKind::Bang, '=', TokenKind::NotEq, start)),
            '%' => Ok(self.single(TokenKind::Percent, start)),
            '&' => Ok(self.one_or_two(TokenKind::Amp, '&', TokenKind::AmpAmp, start)),
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '*' => Ok(self.single(TokenKind::Star, start)),
            '+' => Ok(self.single(TokenKind::Plus, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '-' => Ok(self.single(TokenKind::Minus, start)),
            '.' => Ok(self.single(TokenKind::Dot, start)),
            '/' => Ok(self.single(TokenKind::Slash, start)),
            ':' => Ok(self.single(TokenKind::Colon, start)),
            '?' => Ok(self.single(TokenKind::Question, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            '<' => {
                self.cursor.bump();
                match self.cursor.ch() {
                    Some('=') => {
                        self.cursor.bump();
                        Ok(Token::new(TokenKind::LtEq, start, self.cursor.pos()))
                    }
                    Some('>') => {
                        self.cursor.bump();
                        Ok(Token::new(TokenKind::Diamond, start, self.cursor.pos()))
                    }
                    _ => Ok(Token::new(TokenKind::Lt, start, self.cursor.pos())),
                }
            }
            '=' => Ok(self.one_or_two(TokenKind::Eq, '=', TokenKind::EqEq, start)),
            '>' => Ok(self.one_or_two(TokenKind::Gt, '=', TokenKind::GtEq, start)),
            '|' => Ok(self.one_or_two(TokenKind::Bar, '|', TokenKind::BarBar, start)),
            '"' | '\'' => self.lex_string(c, start),
            c if c.is_ascii_digit() => self.lex_number(start),
            c if is_ident_start(c) => Ok(self.lex_ident(start)),
            other => Err(ParseError::new(
                ParseErrorKind::InvalidCharacter(other),
                start,
            )),
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Consume one character, upgrading to `two` if `second` follows.
    fn one_or_two(&mut self, one: TokenKind, second: char, two: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        if self.cursor.ch() == Some(second) {
            self.cursor.bump();
            Token::new(two, start, self.cursor.pos())
        } else {
            Token::new(one, start, self.cursor.pos())
        }
    }

    // ── String literals ────────────────────────────────────────────────

    /// Lex a `"` or `'` delimited literal. An embedded delimiter is
    /// escaped by doubling it; the token keeps the raw text, delimiters
    /// and doubled quotes included.
    fn lex_string(&mut self, quote: char, start: u32) -> Result<Token, ParseError> {
        self.cursor.bump(); // opening delimiter
        loop {
            match self.cursor.ch() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedStringLiteral,
                        self.cursor.pos(),
                    ))
                }
                Some(c) if c == quote => {
                    self.cursor.bump();
                    // A doubled delimiter is an escaped quote; keep going.
                    if self.cursor.ch() == Some(quote) {
                        self.cursor.bump();
                    } else {
                        return Ok(Token::new(TokenKind::StringLit, start, self.cursor.pos()));
                    }
                }
                Some(_) => self.cursor.bump(),
            }
        }
    }

    // ── Numeric literals ───────────────────────────────────────────────

    /// Lex an integer literal, decaying to a real literal on a fraction
    /// (`.` followed by a digit), an exponent, or an `F` suffix.
    fn lex_number(&mut self, start: u32) -> Result<Token, ParseError> {
        let mut kind = TokenKind::IntLit;
        self.cursor.bump_while(|c| c.is_ascii_digit());

        if self.cursor.ch() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            kind = TokenKind::RealLit;
            self.cursor.bump(); // '.'
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.ch(), Some('E') | Some('e')) {
            kind = TokenKind::RealLit;
            self.cursor.bump();
            if matches!(self.cursor.ch(), Some('+') | Some('-')) {
                self.cursor.bump();
            }
            if !self.cursor.ch().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ParseError::new(
                    ParseErrorKind::DigitExpected,
                    self.cursor.pos(),
                ));
            }
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.ch(), Some('F') | Some('f')) {
            kind = TokenKind::RealLit;
            self.cursor.bump();
        }

        Ok(Token::new(kind, start, self.cursor.pos()))
    }

    // ── Identifiers ────────────────────────────────────────────────────

    /// Lex an identifier, retagging `as`/`is` (case-insensitively) into
    /// their operator kinds.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.bump();
        self.cursor.bump_while(|c| c.is_alphanumeric() || c == '_');
        let end = self.cursor.pos();
        let text = &self.source[start as usize..end as usize];
        let kind = if text.eq_ignore_ascii_case("as") {
            TokenKind::AsKw
        } else if text.eq_ignore_ascii_case("is") {
            TokenKind::IsKw
        } else {
            TokenKind::Ident
        };
        Token::new(kind, start, end)
    }
}

/// Identifiers begin with a letter, `@`, or `_`.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '@' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn compound_operators_win_over_singles() {
        use TokenKind::*;
        assert_eq!(
            kinds("! != & && < <= <> = == > >= | ||"),
            vec![Bang, NotEq, Amp, AmpAmp, Lt, LtEq, Diamond, Eq, EqEq, Gt, GtEq, Bar, BarBar]
        );
    }

    #[test]
    fn as_and_is_are_retagged() {
        use TokenKind::*;
        assert_eq!(kinds("x AS y Is z"), vec![Ident, AsKw, Ident, IsKw, Ident]);
        // Only exact matches retag; `asx` stays an identifier.
        assert_eq!(kinds("asx"), vec![Ident]);
    }

    #[test]
    fn dot_decays_integer_only_before_digit() {
        use TokenKind::*;
        assert_eq!(kinds("1.5"), vec![RealLit]);
        assert_eq!(kinds("1.Foo"), vec![IntLit, Dot, Ident]);
        assert_eq!(kinds("2E+10 2e5 1.5e-3 10f 3F"), vec![RealLit; 5]);
    }

    #[test]
    fn exponent_requires_digit() {
        let err = Lexer::tokenize("1e+").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DigitExpected);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn doubled_quotes_stay_inside_the_literal() {
        let toks = Lexer::tokenize(r#""he said ""hi""" x"#).expect("lexing failed");
        assert_eq!(toks[0].kind, TokenKind::StringLit);
        assert_eq!(toks[0].text(r#""he said ""hi""" x"#), r#""he said ""hi""""#);
        assert_eq!(toks[1].kind, TokenKind::Ident);
    }

    #[test]
    fn unterminated_string_fails() {
        let err = Lexer::tokenize("'abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedStringLiteral);
    }

    #[test]
    fn at_substitution_names_lex_as_identifiers() {
        let source = "@0 @1 _x";
        let toks = Lexer::tokenize(source).expect("lexing failed");
        let texts: Vec<&str> = toks.iter().map(|t| t.text(source)).collect();
        assert_eq!(texts, vec!["@0", "@1", "_x"]);
        assert!(toks.iter().all(|t| t.kind == TokenKind::Ident));
    }

    #[test]
    fn invalid_character_reports_position() {
        let err = Lexer::tokenize("a # b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidCharacter('#'));
        assert_eq!(err.position, 2);
    }

    #[test]
    fn end_token_at_end_of_input() {
        let mut lexer = Lexer::new("  ");
        let tok = lexer.next_token().expect("lexing failed");
        assert_eq!(tok.kind, TokenKind::End);
        assert_eq!(tok.pos(), 2);
    }
}
