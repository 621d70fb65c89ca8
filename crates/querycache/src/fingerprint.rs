//! Argument fingerprinting
//!
//! Derives the cache key for a call from its positional argument list: each
//! argument feeds its type tag and then its textual rendering into a single
//! MD5 digest, and the hex-encoded sum is the fingerprint.

use std::any;
use std::fmt::{self, Write};

use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// A value usable as a cache-key argument.
///
/// Blanket-implemented for every [`fmt::Display`] type, so callers pass
/// plain values. The type tag keeps values that render identically but
/// differ in type (integer `1` vs text `"1"`) from colliding.
pub trait QueryArg {
    /// Textual tag for the argument's static type
    fn type_tag(&self) -> &'static str;

    /// Render the argument's value into `out`
    fn render(&self, out: &mut String) -> fmt::Result;
}

impl<T: fmt::Display> QueryArg for T {
    fn type_tag(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn render(&self, out: &mut String) -> fmt::Result {
        write!(out, "{}", self)
    }
}

/// Derive the fingerprint for a positional argument list.
///
/// # Arguments
/// * `args` - Argument values in call order
///
/// # Returns
/// * `Result<String>` - Hex-encoded MD5 over the type/value stream
///
/// Fails with [`Error::Digest`] if any argument cannot be rendered; the
/// partial digest is discarded.
pub fn fingerprint(args: &[&dyn QueryArg]) -> Result<String> {
    let mut digest = Md5::new();
    let mut buf = String::new();

    for arg in args {
        digest.update(arg.type_tag().as_bytes());
        buf.clear();
        arg.render(&mut buf).map_err(|_| Error::Digest)?;
        digest.update(buf.as_bytes());
    }

    Ok(hex::encode(digest.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unrenderable;

    impl fmt::Display for Unrenderable {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint(&[&42u64, &"user"]).unwrap();
        let b = fingerprint(&[&42u64, &"user"]).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_shape() {
        let key = fingerprint(&[&"user"]).unwrap();

        // 16 MD5 bytes, hex-encoded
        assert_eq!(key.len(), 32);
        assert!(key.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_type_sensitive() {
        let int_one = fingerprint(&[&1]).unwrap();
        let text_one = fingerprint(&[&"1"]).unwrap();

        assert_ne!(int_one, text_one);
    }

    #[test]
    fn test_fingerprint_argument_boundaries() {
        // Per-argument type tags keep concatenations apart
        let ab_c = fingerprint(&[&"ab", &"c"]).unwrap();
        let a_bc = fingerprint(&[&"a", &"bc"]).unwrap();

        assert_ne!(ab_c, a_bc);
    }

    #[test]
    fn test_fingerprint_value_sensitive() {
        let a = fingerprint(&[&"a"]).unwrap();
        let b = fingerprint(&[&"b"]).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_empty_args() {
        // MD5 of the empty stream
        let key = fingerprint(&[]).unwrap();

        assert_eq!(key, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_fingerprint_unrenderable_argument() {
        let result = fingerprint(&[&"ok", &Unrenderable]);

        assert!(matches!(result, Err(Error::Digest)));
    }
}
