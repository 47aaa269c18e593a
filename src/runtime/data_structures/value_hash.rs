use std::{ collections::HashMap,
           cell::RefCell,
           fmt::{ self,
                  Display,
                  Formatter },
           rc::Rc };
use crate::runtime::data_structures::value::Value;



/// A record of string keys to values.  Records are produced by host words and by converting
/// word options.
#[derive(Clone, Default, PartialEq)]
pub struct ValueHash
{
    values: HashMap<String, Value>
}


/// A reference counted pointer to a ValueHash.  This is the type that is managed by scripts.
pub type ValueHashPtr = Rc<RefCell<ValueHash>>;


/// Print the record with it's keys sorted so that the output is stable.
impl Display for ValueHash
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        if self.values.is_empty()
        {
            return write!(f, "{{}}");
        }

        write!(f, "{{ ")?;

        for ( index, key ) in self.sorted_keys().iter().enumerate()
        {
            if index > 0
            {
                write!(f, ", ")?;
            }

            write!(f, "{}: {:?}", Value::stringify(key), self.values[key.as_str()])?;
        }

        write!(f, " }}")
    }
}


/// Core implementation of the ValueHash type.
impl ValueHash
{
    /// Create a new and empty ValueHash reference.
    pub fn new() -> ValueHashPtr
    {
        Rc::new(RefCell::new(ValueHash::default()))
    }


    /// Get the size of the record.
    pub fn len(&self) -> usize
    {
        self.values.len()
    }


    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }


    /// Insert a key/value pair into the record, replacing the value if the key already exists.
    pub fn insert(&mut self, key: String, value: Value)
    {
        self.values.insert(key, value);
    }


    /// Try to get a value from the record by key.
    pub fn get(&self, key: &str) -> Option<&Value>
    {
        self.values.get(key)
    }


    /// The record's keys in sorted order.
    pub fn sorted_keys(&self) -> Vec<String>
    {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();

        keys.sort();
        keys
    }


    /// Allow user code to iterate over the record.
    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, Value>
    {
        self.values.iter()
    }
}
