#![cfg(feature = "macros")]

use mustachio::{Fields, Template, Value};
use std::fmt;

#[derive(Debug, Fields)]
#[fields(methods(full_name, is_adult))]
struct Person {
    first: String,
    last: String,
    #[fields(rename = "years")]
    age: u32,
    #[fields(skip)]
    #[allow(dead_code)]
    password: String,
    tags: Vec<String>,
}

impl Person {
    fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    fn is_adult(&self) -> bool {
        self.age >= 18
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

fn ada() -> Person {
    Person {
        first: "Ada".to_string(),
        last: "Lovelace".to_string(),
        age: 36,
        password: "secret".to_string(),
        tags: vec!["math".to_string(), "poetry".to_string()],
    }
}

#[test]
fn test_derived_fields() {
    let person = ada();
    assert_eq!(person.field("first"), Some(Value::from("Ada")));
    assert_eq!(person.field("years"), Some(Value::U64(36)));
    assert_eq!(person.field("age"), None);
    assert_eq!(person.field("password"), None);
    assert_eq!(person.field("is_adult"), Some(Value::Bool(true)));
}

#[test]
fn test_object_in_template() {
    let data: Value = [
        ("person", Value::object(ada())),
        ("password", Value::from("outer")),
    ]
    .into_iter()
    .collect();
    let template = Template::parse(
        "{{person}}: {{person.years}}{{#person}} {{#is_adult}}adult{{/is_adult}} \
         [{{#tags}}{{.}}{{^last}},{{/last}}{{/tags}}] {{password}}{{/person}}",
    )
    .unwrap();
    assert_eq!(
        template.render(&data),
        "Ada Lovelace: 36 adult [math,poetry] outer"
    );
}
