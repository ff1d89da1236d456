// surfbridge/src/info.rs
//
//! Version information.

use std::fmt::{self, Display, Formatter};

/// A `major.minor` version pair.
///
/// Used for both the native EGL version and the OpenGL ES versions requested from and exposed
/// by contexts. Versions order lexicographically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GLVersion {
    pub major: u8,
    pub minor: u8,
}

impl GLVersion {
    #[inline]
    pub const fn new(major: u8, minor: u8) -> GLVersion {
        GLVersion { major, minor }
    }
}

impl Display for GLVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
