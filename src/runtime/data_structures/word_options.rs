use std::{ collections::HashMap,
           fmt::{ self,
                  Display,
                  Formatter },
           rc::Rc };
use crate::runtime::{ data_structures::{ value::Value,
                                         value_hash::ValueHash },
                      error::{ self,
                               ErrorKind,
                               ScriptError } };



/// The optional keyword arguments a native word can accept, built by the `~>` word from a flat
/// array of alternating keys and values.  Once built the options are read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordOptions
{
    options: HashMap<String, Value>,

    /// Keys in the order they were first given.
    keys: Vec<String>
}


/// Options are immutable, so they are shared by a plain reference count.
pub type WordOptionsPtr = Rc<WordOptions>;


impl Display for WordOptions
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "<options")?;

        for key in &self.keys
        {
            write!(f, " {}: {:?}", key, self.options[key])?;
        }

        write!(f, ">")
    }
}


impl WordOptions
{
    /// Decode a flat `[ key value key value ... ]` list.  The list must be of even length and every
    /// key must be a string.  A key given more than once keeps the last value.
    pub fn from_flat(values: &[Value]) -> error::Result<WordOptions>
    {
        if values.len() % 2 != 0
        {
            return Err(invalid_options(format!("expected key/value pairs, found {} items",
                                               values.len())));
        }

        let mut word_options = WordOptions::default();

        for pair in values.chunks(2)
        {
            let Value::String(key) = &pair[0]
            else
            {
                return Err(invalid_options(format!("option key {:?} is not a string", pair[0])));
            };

            if word_options.options.insert(key.clone(), pair[1].clone()).is_none()
            {
                word_options.keys.push(key.clone());
            }
        }

        Ok(word_options)
    }

    /// Get the value for the key, or the default if the option was not given.
    pub fn get(&self, key: &str, default: Value) -> Value
    {
        self.options.get(key).cloned().unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool
    {
        self.options.contains_key(key)
    }

    /// The option keys in the order they were first given.
    pub fn keys(&self) -> &[String]
    {
        &self.keys
    }

    pub fn len(&self) -> usize
    {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.keys.is_empty()
    }

    /// Convert the options to a record value.
    pub fn to_record(&self) -> Value
    {
        let record = ValueHash::new();

        for ( key, value ) in &self.options
        {
            record.borrow_mut().insert(key.clone(), value.clone());
        }

        Value::Record(record)
    }
}


fn invalid_options(message: String) -> ScriptError
{
    ScriptError::new(ErrorKind::InvalidOptions(message), None, None)
}



#[cfg(test)]
mod tests
{
    use super::*;

    fn flat(items: &[( &str, i64 )]) -> Vec<Value>
    {
        items.iter()
             .flat_map(|( key, value )| [ Value::from(*key), Value::Int(*value) ])
             .collect()
    }

    #[test]
    fn get_with_default()
    {
        let options = WordOptions::from_flat(&flat(&[ ( "depth", 2 ) ])).unwrap();

        assert!(options.has("depth"));
        assert!(!options.has("width"));
        assert_eq!(options.get("depth", Value::None), Value::Int(2));
        assert_eq!(options.get("width", Value::Int(10)), Value::Int(10));
    }

    #[test]
    fn last_duplicate_key_wins()
    {
        let options = WordOptions::from_flat(&flat(&[ ( "a", 1 ), ( "b", 2 ), ( "a", 3 ) ])).unwrap();

        assert_eq!(options.get("a", Value::None), Value::Int(3));
        assert_eq!(options.keys(), &[ "a".to_string(), "b".to_string() ]);
    }

    #[test]
    fn rejects_odd_length()
    {
        let error = WordOptions::from_flat(&[ Value::from("a") ]).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::InvalidOptions(_)));
    }

    #[test]
    fn rejects_non_string_keys()
    {
        let error = WordOptions::from_flat(&[ Value::Int(1), Value::Int(2) ]).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::InvalidOptions(_)));
    }

    #[test]
    fn converts_to_a_record()
    {
        let options = WordOptions::from_flat(&flat(&[ ( "x", 5 ) ])).unwrap();
        assert_eq!(options.to_record(), Value::new_record(vec![ ( "x".to_string(), Value::Int(5) ) ]));
    }
}
