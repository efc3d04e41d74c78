use std::error::Error;
use std::marker::PhantomData;
use std::string::FromUtf8Error;

/// The content type attached to JSON-encoded messages.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// The content type attached to plain-text messages.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Represents a way of decoding a payload of an incoming message (which is
/// received as a sequence of bytes) into an arbitrary result type.
///
/// The decoded result is handed over to a [`Handler`](crate::Handler) by
/// value, and the original bytes are dropped once the delivery is finalized.
/// The result type thus may not contain references to the original bytes.
pub trait Decoder {
    /// The type of decoded result.
    type Result;

    /// The type of error produced when decoding is not possible.
    type Error: Error;

    /// Decodes the given sequence of bytes into the desired
    /// [`Result`](Decoder::Result), or returns an appropriate
    /// [`Error`](Decoder::Error).
    fn decode(&self, bytes: &[u8]) -> Result<Self::Result, Self::Error>;
}

/// Represents a way of encoding an outgoing value into a sequence of bytes,
/// tagged with a content type.
pub trait Encoder {
    /// The type of value this encoder accepts.
    type Input: ?Sized;

    /// The type of error produced when encoding is not possible.
    type Error: Error + Send + Sync + 'static;

    /// Reports the content type of the encoded bytes.
    fn content_type(&self) -> &str;

    /// Encodes the given value into bytes, or returns an appropriate
    /// [`Error`](Encoder::Error).
    fn encode(&self, value: &Self::Input) -> Result<Vec<u8>, Self::Error>;
}

/// Implements [`Decoder`] for any function or closure that returns a
/// non-referential [`Result`].
impl<F, R, E> Decoder for F
where
    F: Fn(&[u8]) -> Result<R, E>,
    E: Error,
{
    type Result = R;
    type Error = E;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Result, Self::Error> {
        self(bytes)
    }
}

/// Implements [`Decoder`] that allocates an owned UTF-8 [`String`] with a copy
/// of the given bytes. This decoder fails with [`FromUtf8Error`] if the given
/// bytes cannot be interpreted as valid UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringDecoder;

impl Decoder for StringDecoder {
    type Result = String;
    type Error = FromUtf8Error;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Result, Self::Error> {
        String::from_utf8(bytes.to_vec())
    }
}

/// Encodes and decodes values of type `T` as JSON. Field names are part of the
/// wire contract: publishers and subscribers of the same message type must
/// agree on them exactly.
///
/// Decoding requires `T` to be [`DeserializeOwned`](serde::de::DeserializeOwned),
/// which is automatically implemented by types that implement
/// [`Deserialize`](serde::Deserialize) and don’t contain references.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    /// Creates a new JSON codec.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Decoder for JsonCodec<T>
where
    T: serde::de::DeserializeOwned,
{
    type Result = T;
    type Error = serde_json::Error;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Result, Self::Error> {
        serde_json::from_slice(bytes)
    }
}

impl<T> Encoder for JsonCodec<T>
where
    T: serde::Serialize,
{
    type Input = T;
    type Error = serde_json::Error;

    fn content_type(&self) -> &str {
        CONTENT_TYPE_JSON
    }

    fn encode(&self, value: &Self::Input) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ArmyMove {
        #[serde(rename = "Player")]
        player: String,
        #[serde(rename = "Units")]
        units: Vec<u32>,
        #[serde(rename = "ToLocation")]
        to_location: String,
        #[serde(rename = "Tags")]
        tags: BTreeMap<String, bool>,
    }

    fn sample() -> ArmyMove {
        ArmyMove {
            player: "alice".to_string(),
            units: vec![1, 2, 3],
            to_location: "europe".to_string(),
            tags: BTreeMap::from([("flanking".to_string(), true)]),
        }
    }

    #[test]
    fn json_round_trip() {
        // Given
        let codec = JsonCodec::<ArmyMove>::new();
        let value = sample();

        // When
        let bytes = codec.encode(&value).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        // Then
        assert_eq!(value, decoded);
        assert_eq!(CONTENT_TYPE_JSON, codec.content_type());
    }

    #[test]
    fn json_field_names_are_the_contract() {
        // Given
        let codec = JsonCodec::<ArmyMove>::new();

        // When
        let bytes = codec.encode(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        // Then
        assert!(text.contains("\"Player\":\"alice\""));
        assert!(text.contains("\"ToLocation\":\"europe\""));
    }

    #[test]
    fn json_rejects_mismatched_shape() {
        // Given
        let codec = JsonCodec::<ArmyMove>::new();
        let inputs: [&[u8]; 4] = [
            b"",
            b"not json at all",
            br#"{"player":"alice","units":[],"to_location":"asia","tags":{}}"#,
            br#"{"Player":"alice","Units":"many","ToLocation":"asia","Tags":{}}"#,
        ];

        for input in inputs {
            // When
            let result = codec.decode(input);

            // Then
            assert!(result.is_err(), "decoded {:?}", String::from_utf8_lossy(input));
        }
    }

    #[test]
    fn string_decoder() {
        assert_eq!("pause", StringDecoder.decode(b"pause").unwrap());
        assert!(StringDecoder.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn closure_decoder() {
        // Given
        let decoder = |bytes: &[u8]| std::str::from_utf8(bytes).map(str::len);

        // When
        let result = decoder.decode(b"four");

        // Then
        assert_eq!(4, result.unwrap());
    }
}
