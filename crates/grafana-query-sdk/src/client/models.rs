use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{batch::Page, filter::ParameterizedFilter};

/// The body of a paged query request.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// The filter expression.
    pub filter: Option<String>,
    /// Values referenced as `@n` by the filter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub substitutions: Vec<String>,
    /// The field to order by.
    pub order_by: Option<String>,
    /// Whether to order descending.
    pub descending: Option<bool>,
    /// The number of records to request.
    ///
    /// When passed to [`QueryClient::query_records`][super::QueryClient::query_records]
    /// this limits the total number of records; each page request carries its own size.
    pub take: Option<usize>,
    /// The token of the page to request.
    pub continuation_token: Option<String>,
    /// Whether the service should report the total number of matching records.
    pub return_count: Option<bool>,
    /// The fields to return.
    pub projection: Option<Vec<String>>,
}

impl QueryRequest {
    /// An unfiltered request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter. An empty filter is omitted from the request.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    /// Set the filter and substitutions from a parameterized filter.
    pub fn with_parameterized_filter(mut self, filter: ParameterizedFilter) -> Self {
        self.filter = (!filter.filter.is_empty()).then_some(filter.filter);
        self.substitutions = filter.substitutions;
        self
    }

    /// Order by `field`.
    pub fn with_order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(field.into());
        self.descending = Some(descending);
        self
    }

    /// Limit the total number of records.
    pub fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// Ask the service for the total number of matching records.
    pub fn with_return_count(mut self) -> Self {
        self.return_count = Some(true);
        self
    }

    /// Only return `fields`.
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// The body of a paged query response.
///
/// Services name the record array after the resource (`products`, `results`,
/// ...); all of these are accepted.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    /// The records of this page.
    #[serde(
        default = "Vec::new",
        alias = "products",
        alias = "results",
        alias = "steps",
        alias = "systems",
        alias = "users",
        alias = "workspaces"
    )]
    pub data: Vec<T>,
    /// The token of the next page, if any.
    #[serde(default)]
    pub continuation_token: Option<String>,
    /// The total number of matching records, if requested.
    #[serde(default)]
    pub total_count: Option<usize>,
}

impl<T> From<QueryResponse<T>> for Page<T> {
    fn from(other: QueryResponse<T>) -> Self {
        Self {
            data: other.data,
            continuation_token: other.continuation_token,
            total_count: other.total_count,
        }
    }
}

/// A workspace records can belong to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    /// The workspace ID.
    pub id: String,
    /// The display name.
    pub name: String,
    /// Whether this is the default workspace.
    pub default: bool,
    /// Whether the workspace is enabled.
    pub enabled: bool,
}

/// A user of the services.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// The user ID.
    pub id: String,
    /// The first name.
    pub first_name: String,
    /// The last name.
    pub last_name: String,
    /// The email address.
    pub email: String,
}

impl User {
    /// The first and last name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A product tracked by the test monitor service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    /// The product ID.
    pub id: String,
    /// The part number, unique per product.
    pub part_number: String,
    /// The display name.
    pub name: String,
    /// The product family.
    pub family: String,
    /// The ID of the owning workspace.
    pub workspace: String,
    /// Custom properties.
    pub properties: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::filter::build_parameterized_in;

    #[test]
    fn request_skips_unset_fields() {
        let request = QueryRequest::new()
            .with_parameterized_filter(build_parameterized_in("id", ["a"]))
            .with_order_by("updatedAt", true)
            .with_return_count();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "filter": "new[] {@0}.Contains(id)",
                "substitutions": ["a"],
                "orderBy": "updatedAt",
                "descending": true,
                "returnCount": true,
            })
        );
        assert_eq!(serde_json::to_value(QueryRequest::new().with_filter("")).unwrap(), json!({}));
    }

    #[test]
    fn response_accepts_resource_names() {
        let response: QueryResponse<Product> = serde_json::from_value(json!({
            "products": [{"id": "p1", "partNumber": "A-1"}],
            "continuationToken": "next",
            "totalCount": 2,
        }))
        .unwrap();
        let page = Page::from(response);
        assert_eq!(page.data[0].part_number, "A-1");
        assert_eq!(page.continuation_token.as_deref(), Some("next"));
        assert_eq!(page.total_count, Some(2));

        let empty: QueryResponse<User> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.data.is_empty());
    }

    #[test]
    fn full_name_trims() {
        let user = User {
            first_name: "Ada".into(),
            ..Default::default()
        };
        assert_eq!(user.full_name(), "Ada");
    }
}
