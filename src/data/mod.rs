pub mod fields;
pub mod serializer;
pub mod value;

pub use fields::Fields;
pub use serializer::to_value;
pub use value::{Value, Variant};
