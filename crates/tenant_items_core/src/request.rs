use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::contract::ValidationError;

pub const TENANT_ID_PARAM: &str = "tenant_id";
pub const SHARD_ID_PARAM: &str = "shard_id";
pub const PRODUCT_ID_PARAM: &str = "product_id";

pub const UNSUPPORTED_PARAMETERS_MESSAGE: &str =
    "Parameter list is not supported. Refer the README.md for supported API operations of /items";

/// Inbound operation with the proxy framing stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsRequest {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// The actions the service supports, resolved from an [`ItemsRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    GetItem {
        tenant_id: String,
        shard_id: String,
        product_id: String,
    },
    ListItems {
        tenant_id: String,
    },
    CreateItems {
        tenant_id: String,
    },
}

#[derive(Debug, Deserialize)]
struct CreateItemsBody {
    tenant_id: String,
}

impl ItemsRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Reads an API Gateway proxy event.
    pub fn from_api_gateway_event(event: &Value) -> Result<Self, ValidationError> {
        let Some(object) = event.as_object() else {
            return Err(ValidationError::new("Request payload must be a JSON object"));
        };

        let method = match object.get("httpMethod") {
            Some(Value::String(method)) => method.clone(),
            _ => return Err(ValidationError::new("httpMethod is required")),
        };

        let mut query = BTreeMap::new();
        match object.get("queryStringParameters") {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) => {
                for (key, value) in params {
                    let Some(text) = value.as_str() else {
                        return Err(ValidationError::new(format!(
                            "Query parameter '{key}' must be a string"
                        )));
                    };
                    query.insert(key.clone(), text.to_string());
                }
            }
            Some(_) => {
                return Err(ValidationError::new(
                    "queryStringParameters must be a JSON object",
                ));
            }
        }

        let body = match object.get("body") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(value @ Value::Object(_)) => Some(value.to_string()),
            Some(_) => return Err(ValidationError::new("Request body must be a JSON object")),
        };

        Ok(Self {
            method,
            query,
            body,
        })
    }
}

pub fn route_request(request: &ItemsRequest) -> Result<Route, ValidationError> {
    match request.method.as_str() {
        "GET" => route_read(&request.query),
        "POST" => route_write(request.body.as_deref()),
        _ => Err(ValidationError::new(format!(
            "HTTP operation : \"{}\" is not yet supported!",
            request.method
        ))),
    }
}

fn route_read(query: &BTreeMap<String, String>) -> Result<Route, ValidationError> {
    if let (Some(shard_id), Some(product_id)) =
        (query.get(SHARD_ID_PARAM), query.get(PRODUCT_ID_PARAM))
    {
        let Some(tenant_id) = query.get(TENANT_ID_PARAM) else {
            return Err(ValidationError::new(
                "tenant_id is required to look up a single item",
            ));
        };
        return Ok(Route::GetItem {
            tenant_id: tenant_id.clone(),
            shard_id: shard_id.clone(),
            product_id: product_id.clone(),
        });
    }

    match (query.len(), query.get(TENANT_ID_PARAM)) {
        (1, Some(tenant_id)) => Ok(Route::ListItems {
            tenant_id: tenant_id.clone(),
        }),
        _ => Err(ValidationError::new(UNSUPPORTED_PARAMETERS_MESSAGE)),
    }
}

fn route_write(body: Option<&str>) -> Result<Route, ValidationError> {
    let Some(body) = body else {
        return Err(ValidationError::new(
            "Request body with a tenant_id is required",
        ));
    };
    let parsed: CreateItemsBody = serde_json::from_str(body)
        .map_err(|error| ValidationError::new(format!("Malformed request body: {error}")))?;
    Ok(Route::CreateItems {
        tenant_id: parsed.tenant_id,
    })
}
