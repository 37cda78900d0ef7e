//! Prefix range planning.
//!
//! Turns "every record of an object type whose first `k` key fields equal
//! these values" into one half-open byte range `[start, end)` over the
//! physical keyspace. `start` is the encoded prefix; `end` is the smallest
//! byte string greater than every string that begins with the prefix.
//!
//! The range holds exactly the keys that start with the prefix, so no byte
//! value is reserved as a boundary marker.

use common::BytesRange;
pub use common::bytes::lex_increment;

use crate::codec::encode_prefix;
use crate::error::Result;

/// Plans the scan range for a prefix of an object type's key fields.
///
/// `arity` is the number of key fields the object type declares. With an
/// empty `prefix` the range covers every record of the object type; with a
/// full tuple it holds at most the one exact key.
///
/// # Errors
///
/// [`crate::Error::PrefixLength`] if `prefix` has more than `arity` fields,
/// plus anything [`encode_prefix`] rejects.
pub fn plan_prefix_range<S: AsRef<str>>(
    object_type: &str,
    arity: usize,
    prefix: &[S],
) -> Result<BytesRange> {
    let start = encode_prefix(object_type, arity, prefix)?;
    Ok(BytesRange::prefix(start))
}
