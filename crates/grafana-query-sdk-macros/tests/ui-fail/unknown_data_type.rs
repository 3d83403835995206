#![allow(dead_code)]

use grafana_query_sdk::QueryFields;

#[derive(Clone, Copy, QueryFields)]
enum ProductField {
    #[query_field(data_type = "text")]
    PartNumber,
}

fn main() {}
