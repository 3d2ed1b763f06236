use crate::rational::Rational;
use serde::Serialize;

/// A named, typed metadata value. Nested values form the property tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

/// Payload of a [`Property`]. The variant carries the arity, so a list
/// property always holds a list payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Integer(i64),
    Rational(Rational),
    String(String),
    List(Vec<Property>),
    Array(Vec<Property>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Scalar,
    List,
    Array,
}

impl Property {
    pub fn integer(name: &str, v: impl Into<i64>) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::Integer(v.into()),
        }
    }

    pub fn rational(name: &str, v: Rational) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::Rational(v),
        }
    }

    pub fn string(name: &str, v: impl Into<String>) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::String(v.into()),
        }
    }

    pub fn list(name: &str, children: Vec<Property>) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::List(children),
        }
    }

    pub fn array(name: &str, children: Vec<Property>) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::Array(children),
        }
    }

    pub fn arity(&self) -> Arity {
        match self.value {
            PropertyValue::List(_) => Arity::List,
            PropertyValue::Array(_) => Arity::Array,
            _ => Arity::Scalar,
        }
    }

    /// Nested properties; empty for scalars.
    pub fn children(&self) -> &[Property] {
        match &self.value {
            PropertyValue::List(c) | PropertyValue::Array(c) => c,
            _ => &[],
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Property> {
        self.children().iter().find(|p| p.name == name)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<Rational> {
        match self.value {
            PropertyValue::Rational(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Render properties as an indented `Name: value` outline, two spaces per level.
pub fn render_tree(props: &[Property], depth: usize) -> String {
    let mut out = String::new();
    for p in props {
        let indent = "  ".repeat(depth);
        match &p.value {
            PropertyValue::Integer(v) => out.push_str(&format!("{indent}{}: {}\n", p.name, v)),
            PropertyValue::Rational(v) => out.push_str(&format!("{indent}{}: {}\n", p.name, v)),
            PropertyValue::String(v) => out.push_str(&format!("{indent}{}: {}\n", p.name, v)),
            PropertyValue::List(c) | PropertyValue::Array(c) => {
                out.push_str(&format!("{indent}{}:\n", p.name));
                out.push_str(&render_tree(c, depth + 1));
            }
        }
    }
    out
}

/// Find a property by name in a flat collection.
pub fn find<'a>(props: &'a [Property], name: &str) -> Option<&'a Property> {
    props.iter().find(|p| p.name == name)
}

/// Accumulates properties in insertion order, then wraps them into a
/// list- or array-typed parent.
///
/// ```
/// use jp2box::property::PropertyBuilder;
///
/// let vert = PropertyBuilder::new()
///     .integer("Numerator", 100)
///     .integer("Denominator", 1)
///     .integer("Exponent", 2)
///     .into_list("VertResolution");
/// assert_eq!(vert.children().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct PropertyBuilder {
    props: Vec<Property>,
}

impl PropertyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn integer(self, name: &str, v: impl Into<i64>) -> Self {
        self.push(Property::integer(name, v))
    }

    pub fn rational(self, name: &str, v: Rational) -> Self {
        self.push(Property::rational(name, v))
    }

    pub fn string(self, name: &str, v: impl Into<String>) -> Self {
        self.push(Property::string(name, v))
    }

    pub fn push(mut self, p: Property) -> Self {
        self.props.push(p);
        self
    }

    pub fn into_list(self, name: &str) -> Property {
        Property::list(name, self.props)
    }

    pub fn into_array(self, name: &str) -> Property {
        Property::array(name, self.props)
    }

    pub fn build(self) -> Vec<Property> {
        self.props
    }
}
