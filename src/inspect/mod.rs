//! Runtime introspection of event payloads
//!
//! The formatter never knows the concrete payload types it renders. Payloads
//! expose themselves through [`Inspect`]: a static [`Layout`] describing the
//! type, a default text representation, and the list of readable attributes.
//!
//! Attribute reads are fallible. A getter may return an error or even panic;
//! both end up as an [`eyre::Report`] stored on the [`Attribute`] so a single
//! bad getter never takes the rest of a report down with it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

mod impls;

/// How the formatter treats a type when expanding it one level deeper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Numbers, booleans, characters
    Primitive,
    /// Field-less enums rendered by variant name
    Enum,
    /// Strings; already fully rendered by their display text
    Text,
    /// Walkable as a sequence of elements. `counted` is true when the element
    /// type is statically known, which enables the `Length` line.
    Sequence { counted: bool },
    /// Anything else; expanded through its declared members
    Object,
}

impl Shape {
    /// Whether values of this shape get a nested block at all
    pub fn is_expandable(&self) -> bool {
        !matches!(self, Shape::Primitive | Shape::Enum)
    }
}

/// Static description of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Fully-qualified type name, matched against the nest exclusion set
    pub type_name: &'static str,
    pub shape: Shape,
    /// Names of the members declared directly on this type, in order
    pub declared: &'static [&'static str],
}

impl Layout {
    pub const fn new(type_name: &'static str, shape: Shape) -> Self {
        Self {
            type_name,
            shape,
            declared: &[],
        }
    }

    pub const fn object(type_name: &'static str, declared: &'static [&'static str]) -> Self {
        Self {
            type_name,
            shape: Shape::Object,
            declared,
        }
    }

    /// Type name without module paths
    pub fn short_name(&self) -> String {
        short_type_name(self.type_name)
    }
}

/// Strip module paths from a type name, generic arguments included:
/// `alloc::vec::Vec<alloc::string::String>` -> `Vec<String>`
pub fn short_type_name(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len());
    let mut segment = String::new();

    for c in type_name.chars() {
        match c {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// A value that can describe and render itself without the caller knowing its type
pub trait Inspect {
    /// Layout of the implementing type
    fn layout() -> Layout
    where
        Self: Sized;

    /// Layout of the runtime value
    fn describe(&self) -> Layout;

    /// Default text representation
    fn display(&self) -> String;

    /// Every publicly readable attribute, inherited ones included, in discovery order
    fn attributes(&self) -> Vec<Attribute<'_>> {
        Vec::new()
    }

    /// Members declared directly on this type, excluding anything inherited
    fn declared(&self) -> Vec<Attribute<'_>> {
        self.attributes()
    }

    /// Elements in iteration order, when the value is a sequence
    fn elements(&self) -> Option<Vec<Element<'_>>> {
        None
    }
}

/// Result of reading one attribute
pub enum Value<'a> {
    Borrowed(&'a dyn Inspect),
    Owned(Box<dyn Inspect + 'a>),
    /// Attribute exists but holds nothing
    Null,
}

impl<'a> Value<'a> {
    pub fn get(&self) -> Option<&dyn Inspect> {
        match self {
            Value::Borrowed(v) => Some(*v),
            Value::Owned(v) => Some(v.as_ref()),
            Value::Null => None,
        }
    }

    /// Display text; null renders as an empty string
    pub fn display(&self) -> String {
        self.get().map(|v| v.display()).unwrap_or_default()
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => write!(f, "Value({})", v.display()),
            None => write!(f, "Null"),
        }
    }
}

/// One sequence element; reading it may fail independently of its siblings
pub type Element<'a> = eyre::Result<Value<'a>>;

/// A named, readable member of an inspected value
#[derive(Debug)]
pub struct Attribute<'a> {
    pub name: &'static str,
    /// Layout of the declared type, independent of whether the read succeeded
    pub layout: Layout,
    pub value: eyre::Result<Value<'a>>,
}

impl<'a> Attribute<'a> {
    /// Borrow a stored field
    pub fn field<T: Inspect + 'a>(name: &'static str, value: &'a T) -> Self {
        Self {
            name,
            layout: T::layout(),
            value: Ok(Value::Borrowed(value)),
        }
    }

    /// Borrow a field that may be empty
    pub fn optional<T: Inspect + 'a>(name: &'static str, value: Option<&'a T>) -> Self {
        Self {
            name,
            layout: T::layout(),
            value: Ok(value.map_or(Value::Null, |v| Value::Borrowed(v as &dyn Inspect))),
        }
    }

    /// Take ownership of a computed value or of the error computing it
    pub fn computed<T: Inspect + 'a>(name: &'static str, value: eyre::Result<T>) -> Self {
        Self {
            name,
            layout: T::layout(),
            value: value.map(|v| Value::Owned(Box::new(v))),
        }
    }

    /// Run a getter, converting a panic into a read error
    pub fn getter<T, F>(name: &'static str, get: F) -> Self
    where
        T: Inspect + 'a,
        F: FnOnce() -> eyre::Result<T>,
    {
        let value = match panic::catch_unwind(AssertUnwindSafe(get)) {
            Ok(result) => result,
            Err(payload) => Err(eyre::eyre!(panic_message(payload.as_ref()))),
        };
        Self::computed(name, value)
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Implement [`Inspect`] for a field-less enum, rendered by its `Debug` name
#[macro_export]
macro_rules! inspect_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::inspect::Inspect for $ty {
                fn layout() -> $crate::inspect::Layout {
                    $crate::inspect::Layout::new(
                        ::std::any::type_name::<$ty>(),
                        $crate::inspect::Shape::Enum,
                    )
                }

                fn describe(&self) -> $crate::inspect::Layout {
                    <$ty as $crate::inspect::Inspect>::layout()
                }

                fn display(&self) -> String {
                    format!("{:?}", self)
                }
            }
        )+
    };
}
