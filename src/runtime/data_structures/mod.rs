pub mod value;
pub mod value_hash;
pub mod value_stack;
pub mod value_vec;
pub mod variable;
pub mod word_options;
