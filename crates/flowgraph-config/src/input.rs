//! Externally supplied input values.
//!
//! Each input node receives one literal from the request:
//!
//! ```json
//! {
//!   "A": 5,
//!   "name": "sample",
//!   "img": "data:image/png;base64,iVBORw0KGgo..."
//! }
//! ```
//!
//! Numbers and strings are passed through as scalars. Strings carrying a
//! `data:<mime>;base64,` prefix are media blobs and are decoded only when a
//! function node consumes them.

use std::collections::HashMap;

/// A literal supplied for one input node.
pub type InputValue = serde_json::Value;

/// Input node id -> supplied literal.
pub type InputValues = HashMap<String, InputValue>;
