use crate::data::value::Value;
use std::fmt;

/// Named-field access for structured values that are not plain maps.
///
/// Lookup goes through this trait instead of runtime reflection: a type
/// answers for each field or zero-argument accessor it wants templates to see,
/// and returns `None` for anything else so resolution continues in the parent
/// scope. `Display` gives the text written when the object itself is
/// interpolated.
///
/// With the `macros` feature, `#[derive(Fields)]` generates the impl from the
/// struct's named fields (each must implement `serde::Serialize`).
pub trait Fields: fmt::Debug + fmt::Display + Send + Sync {
    fn field(&self, name: &str) -> Option<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({}, {})", self.x, self.y)
        }
    }

    impl Fields for Point {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "x" => Some(Value::from(self.x)),
                "y" => Some(Value::from(self.y)),
                "sum" => Some(Value::from(self.x + self.y)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_object_field_lookup() {
        let v = Value::object(Point { x: 1, y: 2 });
        match v.member("sum") {
            Some(crate::data::value::Member::Owned(s)) => assert_eq!(s, Value::I64(3)),
            _ => panic!("Expected computed field"),
        }
        assert!(v.member("z").is_none());
        assert_eq!(v.to_text().as_deref(), Some("(1, 2)"));
    }
}
