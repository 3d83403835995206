/*! Translation between structured filters and the backend filter language.

The REST services queried by these data sources accept a LINQ-like filter
expression, for example:

```text
partNumber = "A-1" && (properties["env"] = "prod" || SafeConvert.ToDecimal(properties["volts"]) > 4.5)
```

This module maps between such expressions and the structured conditions edited
in a query editor:

- the [operation registry][Operation] lists every supported operation with its
  label and expression template;
- [`build`] turns a field, operation and value into an expression clause, and
  [`read`] recovers the field and value from a clause;
- [`FilterNode`] combines conditions into a tree which can be rendered with
  [`FilterNode::to_expression`] and recovered with [`FilterNode::parse`];
- the key-value helpers ([`editor_value`], [`value_template`], ...) back the
  two-input editor used for property-bag fields.

Building and reading never fail. Unknown operations and malformed clauses
produce empty values, so a partially configured editor row contributes nothing
to the final filter.
*/
mod builder;
mod condition;
mod error;
mod field;
mod key_value;
mod operation;
mod parser;
mod reader;
mod template;
mod time;
mod value;

pub use builder::{
    build, build_operation, build_parameterized_in, date_time_expression_builder_callback,
    expression_builder_callback, key_value_expression_builder_callback, ParameterizedFilter,
};
pub use condition::{Combinator, Condition, FilterNode};
pub use error::{FilterError, ParseError};
pub use field::{DataType, FieldDescriptor, Lookup, LookupOption, Lookups, QueryFields};
pub use key_value::{editor_template, editor_value, value_template, EditorInputs};
pub use operation::{Operation, OperationKind, OperationName};
pub use reader::{
    date_time_expression_reader_callback, expression_reader_callback,
    numeric_key_value_expression_reader_callback, read, read_operation,
    string_key_value_expression_reader_callback,
};
pub use time::{format_timestamp, time_range_filter};
pub use value::{normalize_numeric_value, FilterValue, KeyValue, KeyValuePair, ReadResult};
