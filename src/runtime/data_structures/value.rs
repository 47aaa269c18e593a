use std::{ fmt::{ self,
                  Debug,
                  Display,
                  Formatter },
           rc::Rc };
use chrono::{ DateTime,
              FixedOffset,
              NaiveDate,
              NaiveTime };
use crate::runtime::{ data_structures::{ value_hash::{ ValueHash,
                                                       ValueHashPtr },
                                         value_vec::{ ValueVec,
                                                      ValueVecPtr },
                                         variable::VariablePtr,
                                         word_options::WordOptionsPtr },
                      error::{ self,
                               script_error },
                      interpreter::Interpreter };



/// Core value enumeration used by the Forthic interpreter.  Every piece of data that lives on the
/// stack, in a variable, or inside of a container is represented by one of these variants.
#[derive(Clone, Default)]
pub enum Value
{
    /// The value represents nothing and no data is associated.
    #[default]
    None,

    Bool(bool),

    /// We have an integer value.  Represented as an i64.
    Int(i64),

    /// A floating-point value  Represented as a f64.
    Float(f64),

    String(String),

    /// An array of Values.  Handled by reference with a ValueVecPtr.
    Vec(ValueVecPtr),

    /// A record of string keys to Values.  Handled by reference with a ValueHashPtr.
    Record(ValueHashPtr),

    /// A calendar date without a time of day.
    Date(NaiveDate),

    /// A time of day without a date.
    Time(NaiveTime),

    /// A date and time with a fixed offset from UTC.
    DateTime(DateTime<FixedOffset>),

    /// A reference to a module variable's storage cell.
    Variable(VariablePtr),

    /// The options built by the ~> word.
    Options(WordOptionsPtr),

    /// Pushed by [ so that ] knows where the array it is collecting starts.
    StartArrayMarker
}


/// Convert an arbitrary data type to a Value.
pub trait ToValue
{
    /// Implement to handle the actual conversion.
    fn to_value(&self) -> Value;
}


impl ToValue for &str
{
    fn to_value(&self) -> Value
    {
        Value::String(self.to_string())
    }
}


/// Convenience implementation for converting a usize to a Value.  The usize type is not represented
/// directly in the Value enumeration, so it is converted to an i64 internally.
impl ToValue for usize
{
    fn to_value(&self) -> Value
    {
        Value::Int(*self as i64)
    }
}


impl ToValue for Value
{
    fn to_value(&self) -> Value
    {
        self.clone()
    }
}


/// Manage equality for the Value enumeration.  Integers and floats compare by numeric value, the
/// other variants only ever equal a value of the same variant.
impl PartialEq for Value
{
    fn eq(&self, other: &Value) -> bool
    {
        match ( self, other )
        {
            ( Value::None,             Value::None             ) => true,
            ( Value::Bool(a),          Value::Bool(b)          ) => a == b,
            ( Value::Int(a),           Value::Int(b)           ) => a == b,
            ( Value::Float(a),         Value::Float(b)         ) => a == b,
            ( Value::Int(a),           Value::Float(b)         ) => (*a as f64) == *b,
            ( Value::Float(a),         Value::Int(b)           ) => *a == (*b as f64),
            ( Value::String(a),        Value::String(b)        ) => a == b,
            ( Value::Vec(a),           Value::Vec(b)           ) => *a.borrow() == *b.borrow(),
            ( Value::Record(a),        Value::Record(b)        ) => *a.borrow() == *b.borrow(),
            ( Value::Date(a),          Value::Date(b)          ) => a == b,
            ( Value::Time(a),          Value::Time(b)          ) => a == b,
            ( Value::DateTime(a),      Value::DateTime(b)      ) => a == b,
            ( Value::Variable(a),      Value::Variable(b)      ) => Rc::ptr_eq(a, b),
            ( Value::Options(a),       Value::Options(b)       ) => a == b,
            ( Value::StartArrayMarker, Value::StartArrayMarker ) => true,

            _                                                    => false
        }
    }
}


/// Pretty print the value for display.
impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::None             => write!(f, "null"),
            Value::Bool(value)      => write!(f, "{}", value),
            Value::Int(value)       => write!(f, "{}", value),
            Value::Float(value)     => write!(f, "{:?}", value),
            Value::String(value)    => write!(f, "{}", value),
            Value::Vec(value)       => write!(f, "{}", value.borrow()),
            Value::Record(value)    => write!(f, "{}", value.borrow()),
            Value::Date(value)      => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::Time(value)      => write!(f, "{}", value.format("%H:%M:%S")),
            Value::DateTime(value)  => write!(f, "{}", value.to_rfc3339()),
            Value::Variable(value)  => write!(f, "<variable {}>", value.borrow().name()),
            Value::Options(value)   => write!(f, "{}", value),
            Value::StartArrayMarker => write!(f, "<start-array>")
        }
    }
}


/// Debug output quotes strings so that they can be told apart from other values.
impl Debug for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::String(value) => write!(f, "{}", Value::stringify(value)),
            _                    => write!(f, "{}", self)
        }
    }
}


/// Define implementations for converting between Values and the raw data types they represent.
macro_rules! value_conversion
{
    ($data_type:ty , $variant:ident , $as_ident:ident) =>
    {
        #[doc = concat!("Convert a value to ", stringify!($data_type), ".")]
        impl Value
        {
            pub fn $as_ident(&self, interpreter: &dyn Interpreter) -> error::Result<&$data_type>
            {
                match self
                {
                    Value::$variant(value) => Ok(value),
                    _ => script_error(interpreter,
                                      format!("Value {:?} could not be converted to {}",
                                              self,
                                              stringify!($data_type)))
                }
            }
        }


        #[doc = concat!("Allow conversion from ", stringify!($data_type), " to a Value.")]
        impl ToValue for $data_type
        {
            fn to_value(&self) -> Value
            {
                Value::$variant(self.clone())
            }
        }


        #[doc = concat!("Support converting from a ", stringify!($data_type), " to a Value.")]
        impl From<$data_type> for Value
        {
            fn from(original: $data_type) -> Value
            {
                original.to_value()
            }
        }
    };
}


/// Used to convert a Vector of value compatible types to a ValueVec based Value.
impl<T> From<Vec<T>> for Value
    where
        T: ToValue
{
    fn from(vec: Vec<T>) -> Value
    {
        let new_vec: Vec<Value> = vec.iter().map(|item| item.to_value()).collect();
        Value::Vec(ValueVec::from_vec(new_vec))
    }
}


impl From<&str> for Value
{
    fn from(original: &str) -> Value
    {
        original.to_value()
    }
}


// Implement the simple conversions for the value enumeration types.
value_conversion!(bool,                      Bool,     as_bool);
value_conversion!(i64,                       Int,      as_int);
value_conversion!(f64,                       Float,    as_float);
value_conversion!(String,                    String,   as_string);
value_conversion!(ValueVecPtr,               Vec,      as_vec);
value_conversion!(ValueHashPtr,              Record,   as_record);
value_conversion!(NaiveDate,                 Date,     as_date);
value_conversion!(NaiveTime,                 Time,     as_time);
value_conversion!(DateTime<FixedOffset>,     DateTime, as_date_time);
value_conversion!(VariablePtr,               Variable, as_variable);
value_conversion!(WordOptionsPtr,            Options,  as_options);


/// Handily implement variant checks for the types the Value enumeration supports.
macro_rules! is_variant
{
    ($name:ident , $variant:ident) =>
    {
        #[doc = concat!("Check if the value is the variant ", stringify!($variant), ".")]
        pub fn $name(&self) -> bool
        {
            matches!(self, Value::$variant(_))
        }
    };
}


impl Value
{
    /// Check if the value is the None variant.
    pub fn is_none(&self) -> bool
    {
        matches!(self, Value::None)
    }

    pub fn is_start_array_marker(&self) -> bool
    {
        matches!(self, Value::StartArrayMarker)
    }

    // Create variant checks for the other supported types.
    is_variant!(is_bool,      Bool);
    is_variant!(is_int,       Int);
    is_variant!(is_float,     Float);
    is_variant!(is_string,    String);
    is_variant!(is_vec,       Vec);
    is_variant!(is_record,    Record);
    is_variant!(is_date,      Date);
    is_variant!(is_time,      Time);
    is_variant!(is_date_time, DateTime);
    is_variant!(is_variable,  Variable);
    is_variant!(is_options,   Options);


    /// Create a new array value from a list of values.
    pub fn new_array(values: Vec<Value>) -> Value
    {
        Value::Vec(ValueVec::from_vec(values))
    }

    /// Create a new record value from a list of key/value pairs.
    pub fn new_record(pairs: Vec<( String, Value )>) -> Value
    {
        let record = ValueHash::new();

        for ( key, value ) in pairs
        {
            record.borrow_mut().insert(key, value);
        }

        Value::Record(record)
    }

    /// Is the value considered true when used as a condition?  None, false, zero, and empty
    /// strings and containers are false.  Everything else is true.
    pub fn is_truthy(&self) -> bool
    {
        match self
        {
            Value::None          => false,
            Value::Bool(value)   => *value,
            Value::Int(value)    => *value != 0,
            Value::Float(value)  => *value != 0.0,
            Value::String(value) => !value.is_empty(),
            Value::Vec(value)    => !value.borrow().is_empty(),
            Value::Record(value) => !value.borrow().is_empty(),
            _                    => true
        }
    }

    /// A short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::None             => "null",
            Value::Bool(_)          => "boolean",
            Value::Int(_)           => "integer",
            Value::Float(_)         => "float",
            Value::String(_)        => "string",
            Value::Vec(_)           => "array",
            Value::Record(_)        => "record",
            Value::Date(_)          => "date",
            Value::Time(_)          => "time",
            Value::DateTime(_)      => "datetime",
            Value::Variable(_)      => "variable",
            Value::Options(_)       => "options",
            Value::StartArrayMarker => "start-array marker"
        }
    }

    /// Convert a string to a string that could be used directly within source code.  New lines,
    /// tabs, quotes and backslashes are escaped, and the string is enclosed in double quotes.
    ///
    /// Mainly used for debug and stack printing.
    pub fn stringify(text: &str) -> String
    {
        let mut result = String::with_capacity(text.len() + 2);

        result.push('"');

        for character in text.chars()
        {
            match character
            {
                '"'  => result.push_str("\\\""),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\\' => result.push_str("\\\\"),
                _    => result.push(character)
            }
        }

        result.push('"');

        result
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn numbers_compare_across_int_and_float()
    {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::String("2".to_string()));
        assert_ne!(Value::None, Value::Bool(false));
    }

    #[test]
    fn arrays_compare_by_contents()
    {
        let a = Value::from(vec![ 1_i64, 2, 3 ]);
        let b = Value::new_array(vec![ Value::Int(1), Value::Int(2), Value::Int(3) ]);

        assert_eq!(a, b);
        assert_eq!(format!("{}", a), "[ 1, 2, 3 ]");
    }

    #[test]
    fn truthiness()
    {
        assert!(!Value::None.is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::new_array(vec![]).is_truthy());
    }

    #[test]
    fn stringify_escapes_special_characters()
    {
        assert_eq!(Value::stringify("a\"b\n"), "\"a\\\"b\\n\"");
    }
}
