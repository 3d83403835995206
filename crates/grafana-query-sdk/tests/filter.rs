use grafana_query_sdk::filter::{
    build, date_time_expression_builder_callback, key_value_expression_builder_callback, normalize_numeric_value,
    numeric_key_value_expression_reader_callback, read, string_key_value_expression_reader_callback, Combinator,
    Condition, DataType, FieldDescriptor, FilterNode, FilterValue, KeyValue, KeyValuePair, Lookup, LookupOption,
    Lookups, OperationName,
};
use pretty_assertions::assert_eq;

fn single(operation: OperationName) -> Vec<FieldDescriptor> {
    vec![FieldDescriptor::new("field", "Field", DataType::String).with_operations([operation])]
}

fn round_trip(operation: OperationName, value: FilterValue) {
    let fields = single(operation);
    let lookups = Lookups::from_fields(&fields);
    let condition = Condition::new("field", operation, value);
    let expression = condition.to_expression(&lookups);
    assert!(!expression.is_empty(), "{operation} built nothing");
    let parsed = FilterNode::parse(&expression, &fields).unwrap();
    assert_eq!(
        parsed,
        FilterNode::group(Combinator::And, vec![FilterNode::Condition(condition)]),
        "{expression}"
    );
}

macro_rules! round_trips {
    ($($name:ident: $operation:ident => $value:expr,)*) => {
        paste::paste! {
            $(
                #[test]
                fn [<round_trip_ $name>]() {
                    round_trip(OperationName::$operation, FilterValue::from($value));
                }
            )*
        }
    };
}

round_trips! {
    equals: Equals => "A-1",
    does_not_equal: DoesNotEqual => "A-1",
    starts_with: StartsWith => "A",
    ends_with: EndsWith => "1",
    contains: Contains => "say \"hi\"",
    does_not_contain: DoesNotContain => "x",
    is_blank: IsBlank => "",
    is_not_blank: IsNotBlank => "",
    greater_than: GreaterThan => "10",
    greater_than_or_equal_to: GreaterThanOrEqualTo => "10",
    less_than: LessThan => "10",
    less_than_or_equal_to: LessThanOrEqualTo => "10",
    list_equals: ListEquals => "tag",
    list_does_not_equal: ListDoesNotEqual => "tag",
    list_contains: ListContains => "ta",
    list_does_not_contain: ListDoesNotContain => "ta",
    date_time_is_blank: DateTimeIsBlank => "",
    date_time_is_not_blank: DateTimeIsNotBlank => "",
    date_time_is_after: DateTimeIsAfter => "2024-01-01T00:00:00.000Z",
    date_time_is_before: DateTimeIsBefore => "${__to:date}",
    key_value_match: KeyValueMatch => KeyValuePair::new("env", "prod"),
    key_value_does_not_match: KeyValueDoesNotMatch => KeyValuePair::new("env", "prod"),
    key_value_contains: KeyValueContains => KeyValuePair::new("env", "pr"),
    key_value_does_not_contains: KeyValueDoesNotContains => KeyValuePair::new("env", "pr"),
    key_value_is_greater_than: KeyValueIsGreaterThan => KeyValuePair::new("count", 5.0),
    key_value_is_greater_than_or_equal: KeyValueIsGreaterThanOrEqual => KeyValuePair::new("count", 12.5),
    key_value_is_less_than: KeyValueIsLessThan => KeyValuePair::new("count", -3i64),
    key_value_is_less_than_or_equal: KeyValueIsLessThanOrEqual => KeyValuePair::new("count", 0.25),
    key_value_is_numerical_equal: KeyValueIsNumericalEqual => KeyValuePair::new("count", 7i64),
    key_value_is_numerical_not_equal: KeyValueIsNumericalNotEqual => KeyValuePair::new("count", 7i64),
}

#[test]
fn date_time_is_blank_scenario() {
    assert_eq!(
        date_time_expression_builder_callback("testField", "DateTimeIsBlank", None),
        r#"testField == null || testField == """#
    );
}

#[test]
fn key_value_match_scenario() {
    assert_eq!(
        key_value_expression_builder_callback("dataField", "KeyValueMatch", &KeyValuePair::new("testKey", "testValue")),
        r#"dataField["testKey"] = "testValue""#
    );
}

#[test]
fn numeric_key_value_read_scenario() {
    let result = numeric_key_value_expression_reader_callback("", &["dataField", "testKey", "123"]);
    assert_eq!(result.field_name, "dataField");
    assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("testKey", 123i64)));
}

#[test]
fn string_key_value_read_boundary() {
    let result = string_key_value_expression_reader_callback(r#""k" : "v""#, &["field"]);
    assert_eq!(result.field_name, "field");
    assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("k", "v")));

    let result = string_key_value_expression_reader_callback(r#""k""#, &["field"]);
    assert_eq!(result.field_name, "field");
    assert_eq!(result.value, FilterValue::KeyValue(KeyValuePair::new("", "")));
}

#[test]
fn unknown_operations_are_safe() {
    let lookups = Lookups::new();
    assert_eq!(build("field", "bogus-op", &FilterValue::from("x"), &lookups), "");
    let result = read("bogus-op", "whatever", &["field"], &lookups);
    assert_eq!(result.field_name, "field");
    assert!(result.value.is_empty());

    let none: [&str; 0] = [];
    let result = read("whatever", "", &none, &lookups);
    assert_eq!(result.field_name, "");
    assert!(result.value.is_empty());
}

#[test]
fn numeric_normalization_is_idempotent() {
    for value in ["42", " 1e3 ", "-0.5", "abc", "", "inf", "$threshold"] {
        let once = normalize_numeric_value(KeyValue::from(value));
        assert_eq!(normalize_numeric_value(once.clone()), once, "{value}");
    }
}

#[test]
fn lookups_round_trip_through_labels() {
    let fields = vec![FieldDescriptor::new("workspace", "Workspace", DataType::String)
        .with_operations([OperationName::Equals, OperationName::DoesNotEqual])
        .with_lookup(Lookup::new(
            [LookupOption::new("Default", "ws-1"), LookupOption::new("Lab", "ws-2")],
            true,
        ))];
    let lookups = Lookups::from_fields(&fields);
    let tree = FilterNode::group(
        Combinator::And,
        vec![FilterNode::Condition(Condition::new(
            "workspace",
            OperationName::DoesNotEqual,
            vec!["Default".to_string(), "Lab".to_string()],
        ))],
    );
    let expression = tree.to_expression(&lookups);
    assert_eq!(expression, r#"(workspace != "ws-1" && workspace != "ws-2")"#);
    assert_eq!(FilterNode::parse(&expression, &fields).unwrap(), tree);
}

#[test]
fn built_trees_parse_back() {
    let fields = vec![
        FieldDescriptor::new("partNumber", "Part number", DataType::String)
            .with_operations([OperationName::Equals, OperationName::StartsWith]),
        FieldDescriptor::new("updatedAt", "Updated", DataType::DateTime)
            .with_operations([OperationName::DateTimeIsAfter, OperationName::DateTimeIsBlank]),
        FieldDescriptor::new("properties", "Properties", DataType::Object)
            .with_operations([OperationName::KeyValueIsGreaterThan]),
    ];
    let lookups = Lookups::from_fields(&fields);
    let tree = FilterNode::group(
        Combinator::Or,
        vec![
            FilterNode::group(
                Combinator::And,
                vec![
                    FilterNode::Condition(Condition::new("partNumber", OperationName::StartsWith, "A")),
                    FilterNode::Condition(Condition::new(
                        "updatedAt",
                        OperationName::DateTimeIsAfter,
                        "2024-05-01T00:00:00.000Z",
                    )),
                ],
            ),
            FilterNode::Condition(Condition::new("updatedAt", OperationName::DateTimeIsBlank, "")),
            FilterNode::Condition(Condition::new(
                "properties",
                OperationName::KeyValueIsGreaterThan,
                KeyValuePair::new("count", 3i64),
            )),
        ],
    );
    let expression = tree.to_expression(&lookups);
    assert_eq!(
        expression,
        concat!(
            r#"(partNumber.StartsWith("A") && updatedAt > "2024-05-01T00:00:00.000Z")"#,
            r#" || updatedAt == null || updatedAt == """#,
            r#" || SafeConvert.ToDecimal(properties["count"]) > 3"#,
        )
    );
    assert_eq!(FilterNode::parse(&expression, &fields).unwrap(), tree);
}

#[test]
fn numeric_key_values_accept_variables_only() {
    round_trip(
        OperationName::KeyValueIsGreaterThan,
        FilterValue::from(KeyValuePair::new("count", "$threshold")),
    );

    let lookups = Lookups::new();
    let injected = FilterValue::from(KeyValuePair::new("count", r#"1 || name = "x""#));
    assert_eq!(build("properties", "KeyValueIsGreaterThan", &injected, &lookups), "");
}

#[test]
fn blank_dates_next_to_and_round_trip() {
    let fields = vec![
        FieldDescriptor::new("partNumber", "Part number", DataType::String)
            .with_operations([OperationName::Equals]),
        FieldDescriptor::new("updatedAt", "Updated", DataType::DateTime)
            .with_operations([OperationName::DateTimeIsBlank]),
    ];
    let lookups = Lookups::from_fields(&fields);
    let tree = FilterNode::group(
        Combinator::And,
        vec![
            FilterNode::Condition(Condition::new("updatedAt", OperationName::DateTimeIsBlank, "")),
            FilterNode::Condition(Condition::new("partNumber", OperationName::Equals, "A-1")),
        ],
    );
    let expression = tree.to_expression(&lookups);
    assert_eq!(expression, r#"(updatedAt == null || updatedAt == "") && partNumber = "A-1""#);
    assert_eq!(FilterNode::parse(&expression, &fields).unwrap(), tree);
}

#[test]
fn list_conditions_survive_json() {
    let tree = FilterNode::group(
        Combinator::And,
        vec![FilterNode::Condition(Condition::new(
            "partNumber",
            OperationName::Equals,
            vec!["A".to_string(), "B".to_string()],
        ))],
    );
    let json = serde_json::to_string(&tree).unwrap();
    let back: FilterNode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tree);
    assert_eq!(
        back.conditions()[0].value,
        FilterValue::List(vec!["A".to_string(), "B".to_string()])
    );
}
