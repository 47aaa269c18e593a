use std::{ fmt::{ self,
                  Display,
                  Formatter },
           hash::{ Hash,
                   Hasher } };



/// The location in the source code where a token was found.  This structure is used all over the
/// interpreter to keep track where important things are found in the source code.  This is used
/// extensively in the error reporting.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeLocation
{
    /// Either the path to the file or a description of the source code, if one was given.
    source: Option<String>,

    /// The 1 based line number in the source code where the token was found.
    line: usize,

    /// The 1 based column number in the source code where the token was found.
    column: usize,

    /// Absolute byte offset of the first character.
    start_pos: usize,

    /// Absolute byte offset one past the last character.
    end_pos: usize
}


impl Hash for CodeLocation
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.source.hash(state);
        self.line.hash(state);
        self.column.hash(state);
        self.start_pos.hash(state);
    }
}


/// Used for error reporting to show where in the source code an error originated.
impl Display for CodeLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        match &self.source
        {
            Some(source) => write!(formatter, "{} ({}, {})", source, self.line, self.column),
            None         => write!(formatter, "<input> ({}, {})", self.line, self.column)
        }
    }
}


impl Default for CodeLocation
{
    fn default() -> Self
    {
        CodeLocation::new(None, 1, 1, 0)
    }
}


impl CodeLocation
{
    /// Create a new zero length location.
    pub fn new(source: Option<String>, line: usize, column: usize, start_pos: usize) -> CodeLocation
    {
        CodeLocation { source, line, column, start_pos, end_pos: start_pos }
    }

    /// Create a location at the start of a named source.
    pub fn new_from_source(source: &str) -> CodeLocation
    {
        CodeLocation::new(Some(source.to_owned()), 1, 1, 0)
    }

    /// Create a new CodeLocation with all of the needed information.  This is useful in
    /// conjunction with the location_here! macro.
    pub fn new_from_info(source: &str, line: usize, column: usize) -> CodeLocation
    {
        CodeLocation::new(Some(source.to_owned()), line, column, 0)
    }

    /// A copy of this location ending at the given absolute offset.
    pub fn with_end_pos(&self, end_pos: usize) -> CodeLocation
    {
        CodeLocation { end_pos, ..self.clone() }
    }

    pub fn source(&self) -> &Option<String>
    {
        &self.source
    }

    /// The 1 based line number in the source code.
    pub fn line(&self) -> usize
    {
        self.line
    }

    /// The 1 based column number in the source code.
    pub fn column(&self) -> usize
    {
        self.column
    }

    pub fn start_pos(&self) -> usize
    {
        self.start_pos
    }

    pub fn end_pos(&self) -> usize
    {
        self.end_pos
    }
}



/// Helper macro to get the location of the macro invocation.  This is useful for error reporting
/// that includes locations within the Rust code where important operations are occurring.
#[macro_export]
macro_rules! location_here
{
    () =>
    {
        $crate::lang::source_buffer::CodeLocation::new_from_info(file!(),
                                                                 line!() as usize,
                                                                 column!() as usize)
    };
}



/// Replace the two HTML entities hosts commonly embed Forthic code with.  This is the only
/// transform made to the text before tokenizing.
pub fn unescape_entities(text: &str) -> String
{
    text.replace("&lt;", "<").replace("&gt;", ">")
}



/// A buffer for processing source code.  This is used by the tokenizer to extract meaningful tokens
/// from the source code.  This buffer acts as a forward only iterator over the code.  As characters
/// are consumed the location of the cursor in that source is maintained.  Thus allowing the
/// tokenizer to keep track of important points in the source code.
///
/// Positions are tracked relative to a reference location so that a buffer can represent a sub
/// region of a larger source.
pub struct SourceBuffer
{
    /// The already unescaped source text.
    text: String,

    /// Byte offset of the cursor within text.
    position: usize,

    /// The logical location of the cursor in the source code.
    location: CodeLocation,

    /// Absolute offset of the first byte of text.
    base_pos: usize
}


impl SourceBuffer
{
    /// Create a new SourceBuffer for the source text.  If a reference location is given the
    /// buffer's line, column and offsets continue on from it.
    pub fn new(source: &str, reference: Option<CodeLocation>) -> SourceBuffer
    {
        let location = reference.unwrap_or_default();
        let base_pos = location.start_pos;

        SourceBuffer
            {
                text: unescape_entities(source),
                position: 0,
                location: CodeLocation::new(location.source, location.line, location.column, base_pos),
                base_pos
            }
    }

    /// The location the cursor is at in the source code being processed.
    pub fn location(&self) -> &CodeLocation
    {
        &self.location
    }

    /// The unescaped text being processed.
    pub fn text(&self) -> &str
    {
        &self.text
    }

    /// Absolute offset one past the end of the text.
    pub fn end_pos(&self) -> usize
    {
        self.base_pos + self.text.len()
    }

    /// Has all of the text been consumed?
    pub fn is_at_end(&self) -> bool
    {
        self.position >= self.text.len()
    }

    /// Take a peek at the next character in the source code without consuming it.
    pub fn peek_next(&self) -> Option<char>
    {
        self.peek_at(0)
    }

    /// Look ahead past the next character.  An offset of 0 is the next character.
    pub fn peek_at(&self, offset: usize) -> Option<char>
    {
        self.text[self.position..].chars().nth(offset)
    }

    /// Get and consume the next character in the source code.
    pub fn next_char(&mut self) -> Option<char>
    {
        let next = self.peek_next();

        if let Some(next_char) = next
        {
            self.position += next_char.len_utf8();
            self.increment_location(next_char);
        }

        next
    }

    /// Get a slice of the text by absolute offsets.  Returns None if the range is not held by this
    /// buffer.
    pub fn slice(&self, start_pos: usize, end_pos: usize) -> Option<&str>
    {
        let start = start_pos.checked_sub(self.base_pos)?;
        let end = end_pos.checked_sub(self.base_pos)?;

        self.text.get(start..end)
    }

    /// Increment the location based on the next character.  Advance one column for regular
    /// characters.  Reset the colum to 1 and increment the line for new line characters.
    fn increment_location(&mut self, next: char)
    {
        if next == '\n'
        {
            self.location.line += 1;
            self.location.column = 1;
        }
        else
        {
            self.location.column += 1;
        }

        self.location.start_pos = self.base_pos + self.position;
        self.location.end_pos = self.location.start_pos;
    }
}
