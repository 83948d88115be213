//! Test fixtures - generator blueprints for common scenarios

use r6bind_sdk::{CallArgs, ForeignError, ForeignValue};

use crate::mocks::GeneratorSpec;

fn count(value: ForeignValue) -> i64 {
    value.as_i64().unwrap_or(0)
}

/// `Stack` with a public `size` field and `push`/`pop` methods.
///
/// Items are kept in hidden `.item<n>` attributes of the object.
pub fn stack_generator() -> GeneratorSpec {
    GeneratorSpec::new("Stack")
        .field("size", 0)
        .method("push", |rt, this, args: &CallArgs| {
            let item = args
                .positional_args()
                .first()
                .cloned()
                .ok_or_else(|| ForeignError::Evaluation("argument \"x\" is missing".into()))?;
            let size = count(rt.field(this, "size")?) + 1;
            rt.set_field(this, &format!(".item{size}"), item)?;
            rt.set_field(this, "size", size)?;
            Ok(ForeignValue::Handle(this))
        })
        .method("pop", |rt, this, _| {
            let size = count(rt.field(this, "size")?);
            if size == 0 {
                return Err(ForeignError::Evaluation("stack is empty".into()));
            }
            let item = rt.field(this, &format!(".item{size}"))?;
            rt.set_field(this, "size", size - 1)?;
            Ok(item)
        })
}

/// `Counter` with a public `count` field and an `add(by = 1)` method
pub fn counter_generator() -> GeneratorSpec {
    GeneratorSpec::new("Counter")
        .field("count", 0)
        .method("add", |rt, this, args: &CallArgs| {
            let by = args.get_named("by").and_then(ForeignValue::as_i64).unwrap_or(1);
            let next = count(rt.field(this, "count")?) + by;
            rt.set_field(this, "count", next)?;
            Ok(ForeignValue::Integer(next))
        })
}

/// `Odd` reports `value` both as a public field and as a public method
pub fn overlapping_generator() -> GeneratorSpec {
    GeneratorSpec::new("Odd")
        .method_returning("value", "from method")
        .field("value", 42)
}

/// `Broken` constructs something that is not an object
pub fn broken_constructor_generator() -> GeneratorSpec {
    GeneratorSpec::new("Broken").new_returning(1)
}
