//! Runtime values for flowgraph.
//!
//! [`Value`] is what flows along edges at run time. Literals from a request are
//! lifted into it with [`Value::from_json`]; media blobs stay in their transport
//! form (a `data:` URL string) until a consumer asks for them via [`decode_value`].
//! [`encode`] turns any value back into the transport-safe form sent to clients.

mod codec;
mod error;
mod value;

pub use codec::{decode, decode_value, encode, encode_media, is_encoded_media};
pub use error::CodecError;
pub use value::{Media, Value};
