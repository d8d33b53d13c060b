//! [`Inspect`] implementations for std types

use std::any::type_name;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use super::{Attribute, Element, Inspect, Layout, Shape, Value, short_type_name};

macro_rules! inspect_display {
    ($shape:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Inspect for $ty {
                fn layout() -> Layout {
                    Layout::new(type_name::<$ty>(), $shape)
                }

                fn describe(&self) -> Layout {
                    Self::layout()
                }

                fn display(&self) -> String {
                    self.to_string()
                }
            }
        )+
    };
}

inspect_display!(Shape::Primitive => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char);
inspect_display!(Shape::Text => String, Cow<'_, str>);

impl Inspect for bool {
    fn layout() -> Layout {
        Layout::new(type_name::<bool>(), Shape::Primitive)
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        if *self { "True" } else { "False" }.to_string()
    }
}

impl Inspect for Duration {
    fn layout() -> Layout {
        Layout::object(type_name::<Duration>(), &["Secs", "Nanos"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        format!("{:?}", self)
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::computed("Secs", Ok(self.as_secs())),
            Attribute::computed("Nanos", Ok(self.subsec_nanos())),
        ]
    }
}

/// Transparent wrappers report the layout of what they hold
macro_rules! inspect_deref {
    ($($wrapper:ident),+) => {
        $(
            impl<T: Inspect> Inspect for $wrapper<T> {
                fn layout() -> Layout {
                    T::layout()
                }

                fn describe(&self) -> Layout {
                    (**self).describe()
                }

                fn display(&self) -> String {
                    (**self).display()
                }

                fn attributes(&self) -> Vec<Attribute<'_>> {
                    (**self).attributes()
                }

                fn declared(&self) -> Vec<Attribute<'_>> {
                    (**self).declared()
                }

                fn elements(&self) -> Option<Vec<Element<'_>>> {
                    (**self).elements()
                }
            }
        )+
    };
}

inspect_deref!(Box, Rc, Arc);

impl<T: Inspect> Inspect for &T {
    fn layout() -> Layout {
        T::layout()
    }

    fn describe(&self) -> Layout {
        (**self).describe()
    }

    fn display(&self) -> String {
        (**self).display()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        (**self).attributes()
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        (**self).declared()
    }

    fn elements(&self) -> Option<Vec<Element<'_>>> {
        (**self).elements()
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn layout() -> Layout {
        T::layout()
    }

    fn describe(&self) -> Layout {
        match self {
            Some(v) => v.describe(),
            None => T::layout(),
        }
    }

    fn display(&self) -> String {
        self.as_ref().map(|v| v.display()).unwrap_or_default()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        self.as_ref().map(|v| v.attributes()).unwrap_or_default()
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        self.as_ref().map(|v| v.declared()).unwrap_or_default()
    }

    fn elements(&self) -> Option<Vec<Element<'_>>> {
        self.as_ref().and_then(|v| v.elements())
    }
}

/// Map entries render as `[key, value]`
impl<K: Inspect, V: Inspect> Inspect for (K, V) {
    fn layout() -> Layout {
        Layout::object(type_name::<(K, V)>(), &["Key", "Value"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        format!("[{}, {}]", self.0.display(), self.1.display())
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![Attribute::field("Key", &self.0), Attribute::field("Value", &self.1)]
    }
}

fn borrowed<'a, T: Inspect>(item: &'a T) -> Element<'a> {
    Ok(Value::Borrowed(item))
}

macro_rules! inspect_sequence {
    ($($seq:ident),+) => {
        $(
            impl<T: Inspect> Inspect for $seq<T> {
                fn layout() -> Layout {
                    Layout::new(type_name::<$seq<T>>(), Shape::Sequence { counted: true })
                }

                fn describe(&self) -> Layout {
                    Self::layout()
                }

                fn display(&self) -> String {
                    short_type_name(type_name::<$seq<T>>())
                }

                fn elements(&self) -> Option<Vec<Element<'_>>> {
                    Some(self.iter().map(borrowed).collect())
                }
            }
        )+
    };
}

inspect_sequence!(Vec, VecDeque, HashSet, BTreeSet);

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn layout() -> Layout {
        Layout::new(type_name::<[T; N]>(), Shape::Sequence { counted: true })
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        short_type_name(type_name::<[T; N]>())
    }

    fn elements(&self) -> Option<Vec<Element<'_>>> {
        Some(self.iter().map(borrowed).collect())
    }
}

macro_rules! inspect_map {
    ($($map:ident),+) => {
        $(
            impl<K: Inspect, V: Inspect> Inspect for $map<K, V> {
                fn layout() -> Layout {
                    Layout::new(type_name::<$map<K, V>>(), Shape::Sequence { counted: true })
                }

                fn describe(&self) -> Layout {
                    Self::layout()
                }

                fn display(&self) -> String {
                    short_type_name(type_name::<$map<K, V>>())
                }

                fn elements(&self) -> Option<Vec<Element<'_>>> {
                    Some(
                        self.iter()
                            .map(|entry| Ok(Value::Owned(Box::new(entry))))
                            .collect(),
                    )
                }
            }
        )+
    };
}

inspect_map!(HashMap, BTreeMap);
