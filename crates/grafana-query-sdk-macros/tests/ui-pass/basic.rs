use grafana_query_sdk::{
    filter::{build, DataType, FilterValue, Lookups, OperationName},
    prelude::*,
};

#[derive(Clone, Copy, QueryFields)]
enum ResultField {
    #[query_field(name = "partNumber", label = "Part number", operations(Equals, DoesNotEqual, Contains))]
    PartNumber,
    #[query_field(name = "workspace", label = "Workspace", operations(Equals), readonly)]
    Workspace,
    #[query_field(name = "keywords", data_type = "string", operations(ListContains), lookup)]
    Keywords,
    #[query_field(name = "totalTimeInSeconds", data_type = "number", operations(LessThan, GreaterThan))]
    TotalTime,
    #[query_field(name = "updatedAt", data_type = "datetime", operations(DateTimeIsAfter, DateTimeIsBlank))]
    UpdatedAt,
    #[query_field(name = "properties", data_type = "object", operations(KeyValueMatch, KeyValueDoesNotMatch))]
    Properties,
}

fn main() {
    let fields = ResultField::descriptors();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0].data_field, "partNumber");
    assert_eq!(fields[0].label, "Part number");
    assert_eq!(
        fields[0].supported_operations,
        vec![OperationName::Equals, OperationName::DoesNotEqual, OperationName::Contains]
    );
    assert!(fields[1].lookup.as_ref().is_some_and(|l| l.readonly));
    assert!(fields[2].lookup.as_ref().is_some_and(|l| !l.readonly));
    assert!(fields[0].lookup.is_none());
    assert_eq!(fields[3].data_type, DataType::Number);
    assert_eq!(fields[4].data_type, DataType::DateTime);
    assert_eq!(fields[5].data_type, DataType::Object);

    assert_eq!(ResultField::UpdatedAt.data_field(), "updatedAt");
    let lookups = Lookups::from_fields(&fields);
    let expression = build(
        ResultField::PartNumber.data_field(),
        "=",
        &FilterValue::from("A-1"),
        &lookups,
    );
    assert_eq!(expression, r#"partNumber = "A-1""#);
}
