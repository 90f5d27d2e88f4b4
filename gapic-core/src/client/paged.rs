use super::CallError;
use crate::{
    BoxError,
    grpc::client::GrpcClient,
    pager::{Page, PageSource},
    transport::CallMetadata,
};
use http_body::Body as HttpBody;
use prost_reflect::{Kind, MethodDescriptor};
use serde_json::Value;
use tonic::transport::Channel;

const PAGE_TOKEN: &str = "page_token";
const NEXT_PAGE_TOKEN: &str = "next_page_token";

/// A list method bound to its initial request.
///
/// The request is kept untouched; each fetch sends a copy carrying the continuation token.
pub struct MethodPageSource<S = Channel> {
    client: GrpcClient<S>,
    method: MethodDescriptor,
    request: Value,
    metadata: CallMetadata,
    items_field: String,
    token_field: String,
}

impl<S> MethodPageSource<S> {
    /// Binds `method` to `request`, failing if the method has no paged shape: a `page_token`
    /// request field, a `next_page_token` response field and a repeated response field.
    pub fn new(
        client: GrpcClient<S>,
        method: MethodDescriptor,
        request: Value,
        metadata: CallMetadata,
    ) -> Result<Self, CallError> {
        let (items_field, token_field) = page_fields(&method)
            .ok_or_else(|| CallError::NotPaginated(method.full_name().to_string()))?;

        Ok(Self {
            client,
            method,
            request,
            metadata,
            items_field,
            token_field,
        })
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// The initial request, as passed by the caller.
    pub fn request(&self) -> &Value {
        &self.request
    }
}

impl<S> PageSource for MethodPageSource<S>
where
    S: tonic::client::GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    type Item = Value;
    type Error = CallError;

    async fn fetch(&mut self, page_token: &str) -> Result<Page<Value>, CallError> {
        let request = with_page_token(&self.request, page_token);
        let headers = self.metadata.resolve()?;

        let response = self.client.unary(&self.method, request, headers).await??;
        Ok(into_page(response, &self.items_field, &self.token_field))
    }
}

/// JSON names of the items and continuation token fields of a paged method.
fn page_fields(method: &MethodDescriptor) -> Option<(String, String)> {
    method.input().get_field_by_name(PAGE_TOKEN)?;

    let output = method.output();
    let token_field = output
        .get_field_by_name(NEXT_PAGE_TOKEN)
        .filter(|f| f.kind() == Kind::String)?;
    let items_field = output.fields().find(|f| f.is_list())?;

    Some((
        items_field.json_name().to_string(),
        token_field.json_name().to_string(),
    ))
}

/// The first fetch sends the request unchanged; later ones replace any token it carried.
fn with_page_token(request: &Value, page_token: &str) -> Value {
    if page_token.is_empty() {
        return request.clone();
    }

    let mut fields = match request {
        Value::Object(fields) => fields.clone(),
        _ => serde_json::Map::new(),
    };
    fields.remove(PAGE_TOKEN);
    fields.remove("pageToken");
    fields.insert("pageToken".to_string(), Value::from(page_token));
    Value::Object(fields)
}

// The codec keeps default-valued fields. Responses from any other source may omit them, so a
// missing list still reads as an empty page and a missing token as the last one.
fn into_page(response: Value, items_field: &str, token_field: &str) -> Page<Value> {
    let Value::Object(mut fields) = response else {
        return Page::new(Vec::new(), "");
    };

    let items = match fields.remove(items_field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let next_page_token = fields
        .get(token_field)
        .and_then(Value::as_str)
        .unwrap_or_default();

    Page::new(items, next_page_token)
}
