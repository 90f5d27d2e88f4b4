//! A `tonic` codec moving `serde_json::Value` over the wire as protobuf.
//!
//! Requests are checked against the request `MessageDescriptor` while being turned into a
//! `DynamicMessage`, so a field the schema does not know is rejected before anything is sent.
//!
//! Responses are mapped back using the proto3 JSON mapping (`nextPageToken`, enum names) with
//! default values kept: an empty repeated field comes back as `[]` and the continuation token of
//! the last page as `""`, instead of both being left out.
use prost::Message;
use prost_reflect::{DeserializeOptions, DynamicMessage, MessageDescriptor, SerializeOptions};
use serde_json::Value;
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

pub struct JsonCodec {
    request: MessageDescriptor,
    response: MessageDescriptor,
}

impl JsonCodec {
    pub fn new(request: MessageDescriptor, response: MessageDescriptor) -> Self {
        Self { request, response }
    }
}

impl Codec for JsonCodec {
    type Encode = Value;
    type Decode = Value;

    type Encoder = JsonEncoder;
    type Decoder = JsonDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        JsonEncoder(self.request.clone())
    }

    fn decoder(&mut self) -> Self::Decoder {
        JsonDecoder(self.response.clone())
    }
}

pub struct JsonEncoder(MessageDescriptor);

impl Encoder for JsonEncoder {
    type Item = Value;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        to_message(&self.0, item)?.encode_raw(dst);
        Ok(())
    }
}

pub struct JsonDecoder(MessageDescriptor);

impl Decoder for JsonDecoder {
    type Item = Value;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut message = DynamicMessage::new(self.0.clone());
        message
            .merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode response bytes: {e}")))?;

        to_json(&message).map(Some)
    }
}

/// Builds the request message, refusing fields unknown to `descriptor`.
fn to_message(descriptor: &MessageDescriptor, value: Value) -> Result<DynamicMessage, Status> {
    let options = DeserializeOptions::new().deny_unknown_fields(true);

    DynamicMessage::deserialize_with_options(descriptor.clone(), value, &options).map_err(|e| {
        Status::invalid_argument(format!(
            "Request does not match message '{}': {e}",
            descriptor.full_name()
        ))
    })
}

/// Maps a response to JSON, keeping fields that hold their default value.
fn to_json(message: &DynamicMessage) -> Result<Value, Status> {
    let options = SerializeOptions::new().skip_default_fields(false);

    message
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(|e| Status::internal(format!("Failed to map response to JSON: {e}")))
}
