use std::fmt::{ self,
                Display,
                Formatter };
use crate::runtime::{ data_structures::value::Value,
                      error::{ self,
                               ErrorKind,
                               ScriptError } };



/// The data stack of values managed by the interpreter.  Besides the values themselves the stack
/// remembers the deepest it has ever been.
#[derive(Clone, Debug, Default)]
pub struct ValueStack
{
    items: Vec<Value>,
    max_depth: usize
}


/// Print the stack bottom to top, one value per line.
impl Display for ValueStack
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        for ( index, value ) in self.items.iter().enumerate()
        {
            writeln!(f, "{:4}: {:?}", self.items.len() - index - 1, value)?;
        }

        Ok(())
    }
}


impl ValueStack
{
    pub fn new() -> ValueStack
    {
        ValueStack::default()
    }

    pub fn push(&mut self, value: Value)
    {
        self.items.push(value);

        if self.items.len() > self.max_depth
        {
            self.max_depth = self.items.len();
        }
    }

    /// Pop the top value.  Fails with a stack underflow if the stack is empty.
    pub fn pop(&mut self) -> error::Result<Value>
    {
        self.items.pop().ok_or_else(underflow)
    }

    /// Look at the top value without removing it.  Fails with a stack underflow if the stack is
    /// empty.
    pub fn peek(&self) -> error::Result<&Value>
    {
        self.items.last().ok_or_else(underflow)
    }

    pub fn len(&self) -> usize
    {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items.is_empty()
    }

    /// The values on the stack, bottom first.
    pub fn items(&self) -> &[Value]
    {
        &self.items
    }

    /// What has the maximum depth the stack as reached so far?
    pub fn max_depth(&self) -> usize
    {
        self.max_depth
    }

    pub fn clear(&mut self)
    {
        self.items.clear();
    }
}


fn underflow() -> ScriptError
{
    ScriptError::new(ErrorKind::StackUnderflow, None, None)
}
