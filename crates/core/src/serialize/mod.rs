mod runtime;
mod value;

pub use runtime::{
    function_placeholder, serialize_props, serialize_value, Element, ElementType, RuntimeValue,
    MAX_DEPTH, UNSERIALIZABLE_SOURCE,
};
pub use value::{FunctionValue, JsxValue, SerializedProps, SerializedValue};
