use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as the store keeps it: storage column names, raw values.
pub type StoredRecord = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub fields: Vec<FieldRef>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldRef {
    pub field: FieldName,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhereClause {
    pub field_name: String,
    pub operator: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub sorttype: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

impl QueryRequest {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|name| FieldRef {
                    field: FieldName {
                        name: (*name).to_string(),
                    },
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn equal_to(mut self, field: &str, value: Value) -> Self {
        self.where_clauses.push(WhereClause {
            field_name: field.to_string(),
            operator: "EqualTo".to_string(),
            values: vec![value],
        });
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.to_string(),
            sorttype: "DESC".to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset: 0 });
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<StoredRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<StoredRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WriteRequest {
    pub records: Vec<StoredRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<WriteResult>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WriteResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<StoredRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_serializes_in_store_shape() {
        let query = QueryRequest::new(&["Id", "name_c"])
            .equal_to("is_active_c", json!(true))
            .order_desc("name_c")
            .limit(5);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "fields": [{ "field": { "Name": "Id" } }, { "field": { "Name": "name_c" } }],
                "where": [{ "FieldName": "is_active_c", "Operator": "EqualTo", "Values": [true] }],
                "orderBy": [{ "fieldName": "name_c", "sorttype": "DESC" }],
                "pagingInfo": { "limit": 5, "offset": 0 }
            })
        );
    }

    #[test]
    fn empty_clauses_are_omitted() {
        let value = serde_json::to_value(QueryRequest::new(&["Id"])).unwrap();
        assert!(value.get("where").is_none());
        assert!(value.get("orderBy").is_none());
        assert!(value.get("pagingInfo").is_none());
    }
}
