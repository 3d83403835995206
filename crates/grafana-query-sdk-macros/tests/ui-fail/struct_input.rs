#![allow(dead_code)]

use grafana_query_sdk::QueryFields;

#[derive(QueryFields)]
struct PartNumber {
    value: String,
}

fn main() {}
