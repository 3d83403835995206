use grafana_query_sdk::{
    filter::{DataType, QueryFields},
    QueryFields,
};

#[derive(QueryFields)]
enum Plain {
    Name,
    #[query_field(label = "Serial number")]
    SerialNumber,
}

#[derive(QueryFields)]
enum Empty {}

fn main() {
    let fields = Plain::descriptors();
    assert_eq!(fields[0].data_field, "Name");
    assert_eq!(fields[0].label, "Name");
    assert_eq!(fields[0].data_type, DataType::String);
    assert!(fields[0].supported_operations.is_empty());
    assert_eq!(fields[1].data_field, "SerialNumber");
    assert_eq!(fields[1].label, "Serial number");
    assert_eq!(Plain::SerialNumber.data_field(), "SerialNumber");
    assert!(Empty::descriptors().is_empty());
}
