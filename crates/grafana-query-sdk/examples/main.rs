use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};
use tracing::info;

use grafana_query_sdk::{
    client::{ClientError, PRODUCTS_PATH, WORKSPACES_PATH},
    config::DataSourceSettings,
    logging,
    prelude::*,
};

/// A transport answering from a fixed set of products, two per page.
#[derive(Debug, Default)]
struct InMemoryTransport {
    requests: AtomicUsize,
}

impl InMemoryTransport {
    fn products() -> Vec<Value> {
        (1..=5)
            .map(|i| {
                json!({
                    "id": format!("p{i}"),
                    "partNumber": format!("A-{i}"),
                    "name": format!("Product {i}"),
                    "workspace": "ws-1",
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if path != PRODUCTS_PATH {
            return Err(ClientError::InvalidRequest(format!("unknown path {path}")));
        }
        let take = body["take"].as_u64().unwrap_or(2) as usize;
        let start: usize = body["continuationToken"]
            .as_str()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let products = Self::products();
        let page: Vec<Value> = products.iter().skip(start).take(take).cloned().collect();
        let next = start + page.len();
        let token = (next < products.len()).then(|| next.to_string());
        Ok(json!({ "products": page, "continuationToken": token, "totalCount": products.len() }))
    }

    async fn get(&self, path: &str, _query: &[(&str, String)]) -> Result<Value, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if path != WORKSPACES_PATH {
            return Err(ClientError::InvalidRequest(format!("unknown path {path}")));
        }
        Ok(json!({ "workspaces": [{ "id": "ws-1", "name": "Default", "default": true, "enabled": true }], "totalCount": 1 }))
    }
}

#[derive(Clone, Copy, QueryFields)]
enum ProductField {
    #[query_field(name = "partNumber", label = "Part number", operations(Equals, DoesNotEqual, Contains))]
    PartNumber,
    #[query_field(name = "workspace", label = "Workspace", operations(Equals, DoesNotEqual), readonly)]
    Workspace,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_subscriber();

    let settings = DataSourceSettings::from_json(br#"{"maxTakePerRequest": 2, "requestsPerSecond": 10}"#)?;
    let client = QueryClient::new(InMemoryTransport::default(), settings.batch_config()?);

    let mut fields = ProductField::descriptors();
    let workspaces = client.workspace_lookup_options().await?;
    for field in fields
        .iter_mut()
        .filter(|f| f.data_field == ProductField::Workspace.data_field())
    {
        field.merge_lookup_options(workspaces.clone());
    }

    let tree: FilterNode = FilterNode::group(
        Combinator::And,
        vec![
            FilterNode::Condition(Condition::new(
                ProductField::Workspace.data_field(),
                OperationName::Equals,
                "Default",
            )),
            FilterNode::Condition(Condition::new(
                ProductField::PartNumber.data_field(),
                OperationName::DoesNotEqual,
                "A-3",
            )),
        ],
    );
    let filter = tree.to_expression(&Lookups::from_fields(&fields));
    info!(%filter, "Built filter");

    let request = QueryRequest::new().with_filter(filter).with_take(4);
    let products = client.query_products(&request).await?;
    info!(
        records = products.len(),
        requests = client.transport().requests.load(Ordering::SeqCst),
        "Fetched products"
    );
    Ok(())
}
