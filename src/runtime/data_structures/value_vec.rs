use crate::runtime::data_structures::value::Value;
use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// The items of a Forthic array.  Arrays are shared by reference, so a value duplicated into a
/// second variable still refers to the same items.
#[derive(Clone, Default, PartialEq)]
pub struct ValueVec {
    items: Vec<Value>,
}

pub type ValueVecPtr = Rc<RefCell<ValueVec>>;

/// Items are shown in their debug form so that strings keep their quotes, e.g. `[ 1, "a" ]`.
impl Display for ValueVec {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "[]");
        }

        let items: Vec<String> = self.items.iter().map(|item| format!("{:?}", item)).collect();
        write!(f, "[ {} ]", items.join(", "))
    }
}

impl FromIterator<Value> for ValueVec {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueVec {
            items: iter.into_iter().collect(),
        }
    }
}

impl ValueVec {
    /// Wrap already collected items as a shared array.
    pub fn from_vec(items: Vec<Value>) -> ValueVecPtr {
        Rc::new(RefCell::new(ValueVec { items }))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    /// The items as a plain vector.  Nested arrays and records are still shared.
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }
}
