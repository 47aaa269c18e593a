use crate::{
    lang::source_buffer::{CodeLocation, SourceBuffer},
    runtime::error::{self, ErrorKind, ScriptError},
};
use std::fmt::{self, Debug, Display, Formatter};

/// The kinds of token the tokenizer produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// A quoted string literal, single or triple delimited.
    String,

    /// A `#` comment through to the end of the line.
    Comment,

    StartArray,
    EndArray,

    /// `{name`, the name may be empty to mean the app module.
    StartModule,
    EndModule,

    /// `: NAME`
    StartDef,

    /// `;`
    EndDef,

    /// `@: NAME`
    StartMemo,

    /// Anything else, resolved at run time by the interpreter.
    Word,

    /// A `.name` symbol.  The lexeme has the leading dot stripped.
    DotSymbol,

    EndOfStream,
}

/// A token is a simple unit of the language: its type, the text it was made from, and the location
/// in the original source code where it was found.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub token_type: TokenType,
    pub string: String,
    pub location: CodeLocation,
}

/// A list of tokens found in the source code.
pub type TokenList = Vec<Token>;

/// Make sure that the tokens are nicely printable for debugging purposes.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.string)
    }
}

/// Include the type and location when debugging.
impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {:?} {:?}", self.location, self.token_type, self.string)
    }
}

impl Token {
    pub fn new(token_type: TokenType, string: String, location: CodeLocation) -> Token {
        Token {
            token_type,
            string,
            location,
        }
    }

    /// Get the token's location in the original source text.
    pub fn location(&self) -> &CodeLocation {
        &self.location
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.token_type == TokenType::EndOfStream
    }
}

/// Check if the given character is considered whitespace.  Parentheses and commas are only
/// separators in Forthic.
fn is_whitespace(next: char) -> bool {
    matches!(next, ' ' | '\t' | '\n' | '\r' | '(' | ')' | ',')
}

/// The characters that can open a string literal.
fn is_quote(next: char) -> bool {
    matches!(next, '"' | '\'' | '^')
}

/// The tokenizer is a hand written state machine.  Each `transition_from_*` method corresponds to
/// one lexical state and consumes characters from the buffer until it can emit a token.
///
/// In streaming mode input may end part way through a token.  Rather than failing, the tokenizer
/// then returns `None` so the caller can wait for more input.
pub struct Tokenizer {
    buffer: SourceBuffer,
    streaming: bool,

    /// Where the token currently being gathered started.
    token_start: CodeLocation,

    /// The text of the token currently being gathered.
    token_string: String,
}

impl Tokenizer {
    /// Create a tokenizer over complete input.  The reference location, if any, gives the source
    /// identifier and the line, column and offset the text starts at.
    pub fn new(code: &str, reference: Option<CodeLocation>) -> Tokenizer {
        Tokenizer::with_mode(code, reference, false)
    }

    /// Create a tokenizer over input that may be incomplete.
    pub fn new_streaming(code: &str, reference: Option<CodeLocation>) -> Tokenizer {
        Tokenizer::with_mode(code, reference, true)
    }

    fn with_mode(code: &str, reference: Option<CodeLocation>, streaming: bool) -> Tokenizer {
        let buffer = SourceBuffer::new(code, reference);
        let token_start = buffer.location().clone();

        Tokenizer {
            buffer,
            streaming,
            token_start,
            token_string: String::new(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The unescaped text being tokenized.
    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// The current position of the tokenizer.
    pub fn location(&self) -> &CodeLocation {
        self.buffer.location()
    }

    /// Absolute offset one past the end of the input.
    pub fn end_pos(&self) -> usize {
        self.buffer.end_pos()
    }

    /// Get the original text between two absolute offsets, if this tokenizer holds it.
    pub fn slice(&self, start_pos: usize, end_pos: usize) -> Option<&str> {
        self.buffer.slice(start_pos, end_pos)
    }

    /// Get the next token.  Once the input is exhausted every call returns an EndOfStream token.
    /// `None` is only returned in streaming mode when the input ends inside a token.
    pub fn next_token(&mut self) -> error::Result<Option<Token>> {
        self.token_string.clear();
        self.transition_from_start()
    }

    fn make_token(&self, token_type: TokenType, string: String) -> Token {
        let end_pos = self.buffer.location().start_pos();
        Token::new(token_type, string, self.token_start.with_end_pos(end_pos))
    }

    fn take_token(&mut self, token_type: TokenType) -> Token {
        let string = std::mem::take(&mut self.token_string);
        self.make_token(token_type, string)
    }

    fn lexical_error<T>(&self, location: CodeLocation, message: String) -> error::Result<T> {
        ScriptError::new_as_result(ErrorKind::Lexical(message), Some(location), None)
    }

    fn transition_from_start(&mut self) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) {
                let _ = self.buffer.next_char();
                continue;
            }

            self.token_start = self.buffer.location().clone();
            let _ = self.buffer.next_char();

            return match next {
                '#' => {
                    self.token_string.push('#');
                    self.transition_from_comment()
                }

                ':' => self.transition_from_start_definition(TokenType::StartDef),

                '@' if self.buffer.peek_next() == Some(':') => {
                    let _ = self.buffer.next_char();
                    self.transition_from_start_definition(TokenType::StartMemo)
                }

                ';' => Ok(Some(self.make_token(TokenType::EndDef, ";".to_string()))),
                '[' => Ok(Some(self.make_token(TokenType::StartArray, "[".to_string()))),
                ']' => Ok(Some(self.make_token(TokenType::EndArray, "]".to_string()))),
                '{' => self.transition_from_gather_module(),
                '}' => Ok(Some(self.make_token(TokenType::EndModule, "}".to_string()))),

                _ if is_quote(next)
                    && self.buffer.peek_at(0) == Some(next)
                    && self.buffer.peek_at(1) == Some(next) =>
                {
                    let _ = self.buffer.next_char();
                    let _ = self.buffer.next_char();
                    self.transition_from_gather_triple_quote_string(next)
                }

                _ if is_quote(next) => self.transition_from_gather_string(next),

                '.' => {
                    self.token_string.push('.');
                    self.transition_from_gather_dot_symbol()
                }

                _ => {
                    self.token_string.push(next);
                    self.transition_from_gather_word()
                }
            };
        }

        self.token_start = self.buffer.location().clone();
        Ok(Some(self.take_token(TokenType::EndOfStream)))
    }

    fn transition_from_comment(&mut self) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if next == '\n' {
                break;
            }

            self.token_string.push(next);
            let _ = self.buffer.next_char();
        }

        Ok(Some(self.take_token(TokenType::Comment)))
    }

    /// Skip to the definition's name.  Shared by `:` and `@:`.
    fn transition_from_start_definition(
        &mut self,
        token_type: TokenType,
    ) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) {
                let _ = self.buffer.next_char();
                continue;
            }

            if is_quote(next) {
                return self.lexical_error(
                    self.buffer.location().clone(),
                    "Definition names can't have quotes in them.".to_string(),
                );
            }

            return self.transition_from_gather_definition_name(token_type);
        }

        if self.streaming {
            return Ok(None);
        }

        self.lexical_error(
            self.token_start.clone(),
            "Unexpected end of input while reading a definition name.".to_string(),
        )
    }

    fn transition_from_gather_definition_name(
        &mut self,
        token_type: TokenType,
    ) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) {
                break;
            }

            if is_quote(next) {
                return self.lexical_error(
                    self.buffer.location().clone(),
                    "Definition names can't have quotes in them.".to_string(),
                );
            }

            if matches!(next, '[' | ']' | '{' | '}') {
                return self.lexical_error(
                    self.buffer.location().clone(),
                    format!("Definition names can't have '{}' in them.", next),
                );
            }

            self.token_string.push(next);
            let _ = self.buffer.next_char();
        }

        Ok(Some(self.take_token(token_type)))
    }

    /// The closing `}` is left for the next token.
    fn transition_from_gather_module(&mut self) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) || next == '}' {
                break;
            }

            self.token_string.push(next);
            let _ = self.buffer.next_char();
        }

        Ok(Some(self.take_token(TokenType::StartModule)))
    }

    /// Gather until the delimiter repeats three times.  If a fourth delimiter directly follows a
    /// candidate close, one delimiter is taken as content and scanning goes on.  So `"""a""""` is
    /// the string `a"`.
    fn transition_from_gather_triple_quote_string(
        &mut self,
        delimiter: char,
    ) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.next_char() {
            if next == delimiter
                && self.buffer.peek_at(0) == Some(delimiter)
                && self.buffer.peek_at(1) == Some(delimiter)
            {
                if self.buffer.peek_at(2) == Some(delimiter) {
                    self.token_string.push(next);
                    continue;
                }

                let _ = self.buffer.next_char();
                let _ = self.buffer.next_char();

                return Ok(Some(self.take_token(TokenType::String)));
            }

            self.token_string.push(next);
        }

        self.unterminated_string()
    }

    fn transition_from_gather_string(&mut self, delimiter: char) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.next_char() {
            if next == delimiter {
                return Ok(Some(self.take_token(TokenType::String)));
            }

            self.token_string.push(next);
        }

        self.unterminated_string()
    }

    fn unterminated_string(&self) -> error::Result<Option<Token>> {
        if self.streaming {
            return Ok(None);
        }

        self.lexical_error(
            self.token_start.clone(),
            format!("Unterminated string: {}", self.token_string),
        )
    }

    /// Words end at whitespace or one of `; { } # ]`.  A `[` also ends the word unless the word so
    /// far contains a `T`, in which case it's taken to be a date-time with a bracketed zone, (e.g.
    /// `2025-05-20T08:00:00[UTC]`,) and everything through the closing `]` is kept.
    fn transition_from_gather_word(&mut self) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) || matches!(next, ';' | '{' | '}' | '#' | ']') {
                break;
            }

            if next == '[' {
                if !self.token_string.contains('T') {
                    break;
                }

                self.gather_bracketed_suffix();
                continue;
            }

            self.token_string.push(next);
            let _ = self.buffer.next_char();
        }

        Ok(Some(self.take_token(TokenType::Word)))
    }

    fn gather_bracketed_suffix(&mut self) {
        while let Some(next) = self.buffer.next_char() {
            self.token_string.push(next);

            if next == ']' {
                break;
            }
        }
    }

    fn transition_from_gather_dot_symbol(&mut self) -> error::Result<Option<Token>> {
        while let Some(next) = self.buffer.peek_next() {
            if is_whitespace(next) || matches!(next, ';' | '[' | ']' | '{' | '}' | '#') {
                break;
            }

            self.token_string.push(next);
            let _ = self.buffer.next_char();
        }

        // A lone dot is an ordinary word.
        if self.token_string.chars().count() < 2 {
            return Ok(Some(self.take_token(TokenType::Word)));
        }

        let mut token = self.take_token(TokenType::DotSymbol);
        token.string.remove(0);

        Ok(Some(token))
    }
}

/// Tokenize complete source text, up to and including the EndOfStream token.
pub fn tokenize_from_source(code: &str) -> error::Result<TokenList> {
    let mut tokenizer = Tokenizer::new(code, None);
    let mut token_list = TokenList::new();

    while let Some(token) = tokenizer.next_token()? {
        let done = token.is_end_of_stream();
        token_list.push(token);

        if done {
            break;
        }
    }

    Ok(token_list)
}
