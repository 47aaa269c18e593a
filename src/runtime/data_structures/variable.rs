use std::{ cell::RefCell,
           fmt::{ self,
                  Display,
                  Formatter },
           rc::Rc };
use crate::runtime::data_structures::value::Value;



/// A named mutable cell holding one value.  Each variable is owned by one module, words reach it
/// through a VariablePtr pushed on the stack.
#[derive(Clone, Debug)]
pub struct Variable
{
    name: String,
    value: Value
}


/// Variables are shared by reference between the owning module and the values that refer to it.
pub type VariablePtr = Rc<RefCell<Variable>>;


impl Display for Variable
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{} = {:?}", self.name, self.value)
    }
}


impl Variable
{
    /// Create a new variable cell.
    pub fn new(name: &str, value: Value) -> VariablePtr
    {
        Rc::new(RefCell::new(Variable { name: name.to_string(), value }))
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// A copy of the value currently held by the variable.
    pub fn value(&self) -> Value
    {
        self.value.clone()
    }

    pub fn set_value(&mut self, value: Value)
    {
        self.value = value;
    }

    /// Create an independent cell holding the same value.  Composite values keep sharing their
    /// contents, only the cell itself is new.
    pub fn dup(&self) -> VariablePtr
    {
        Variable::new(&self.name, self.value.clone())
    }
}
