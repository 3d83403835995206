/*! Shared query plumbing for Grafana data sources backed by paged REST services.

This crate contains the pieces every such data source needs, independent of the
Grafana plugin runtime. It is divided into these modules:

- [`filter`] translates between structured query-editor filters and the LINQ-like
  filter expressions accepted by the services, in both directions.
- [`batch`] pages through list endpoints, by continuation token or by offset,
  within a per-request record cap and a requests-per-second budget.
- [`cache`] holds once-only lookup caches with a configurable error policy.
- [`client`] wires the above to a [`Transport`][client::Transport] performing
  raw JSON requests, and provides cached workspace, user and product listings.
- [`config`] reads paging settings from a data source's `jsonData`.
- [`logging`] sets up structured JSON logging for plugin backends.

The [`prelude`] re-exports the traits and types used in most data sources.

# Feature flags

The following feature flags enable additional functionality for this crate:

- `reqwest` - adds [`ReqwestTransport`][client::ReqwestTransport], a [`Transport`][client::Transport]
  implementation backed by [`reqwest`](https://docs.rs/reqwest)

# Example

```rust
use grafana_query_sdk::prelude::*;

#[derive(Clone, Copy, QueryFields)]
enum ProductField {
    #[query_field(name = "partNumber", label = "Part number", operations(Equals, DoesNotEqual, Contains))]
    PartNumber,
    #[query_field(name = "properties", data_type = "object", operations(KeyValueMatch))]
    Properties,
}

let fields = ProductField::descriptors();
let tree = FilterNode::group(
    Combinator::And,
    vec![
        FilterNode::Condition(Condition::new("partNumber", OperationName::Equals, "A-1")),
        FilterNode::Condition(Condition::new(
            ProductField::Properties.data_field(),
            OperationName::KeyValueMatch,
            KeyValuePair::new("env", "prod"),
        )),
    ],
);
let filter = tree.to_expression(&Lookups::from_fields(&fields));
assert_eq!(filter, r#"partNumber = "A-1" && properties["env"] = "prod""#);
assert_eq!(FilterNode::parse(&filter, &fields).unwrap(), tree);
```
*/
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

#[cfg(feature = "reqwest")]
extern crate reqwest_lib as reqwest;

pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod filter;
pub mod logging;

/// Contains the traits and types used by most data sources.
pub mod prelude {
    pub use grafana_query_sdk_macros::QueryFields;

    pub use crate::{
        batch::{BatchConfig, BatchQuery, Page},
        client::{QueryClient, QueryRequest, Transport},
        filter::{
            Combinator, Condition, FieldDescriptor, FilterNode, FilterValue, KeyValuePair, Lookups,
            OperationName, QueryFields,
        },
    };
}

#[doc(inline)]
pub use grafana_query_sdk_macros::*;
