use std::fmt;

use crate::address::ContentAddress;
use crate::descriptor::BlobDescriptor;
use crate::error::TypeError;

/// Exclusive resume point for paginated enumeration.
///
/// `After(a)` admits only addresses strictly greater than `a`. The named
/// address does not have to exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    #[default]
    Start,
    After(ContentAddress),
}

impl Cursor {
    /// Parse the wire form: the empty string is [`Cursor::Start`], anything
    /// else must be a canonical content address.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Ok(Self::Start);
        }
        ContentAddress::parse(s).map(Self::After)
    }

    /// The cursor that continues after `last`, typically the final
    /// descriptor of the previous page.
    pub fn after(last: &BlobDescriptor) -> Self {
        Self::After(last.address.clone())
    }

    /// Returns `true` if `address` lies strictly beyond this cursor.
    pub fn admits(&self, address: &ContentAddress) -> bool {
        match self {
            Self::Start => true,
            Self::After(cursor) => address > cursor,
        }
    }

    pub fn address(&self) -> Option<&ContentAddress> {
        match self {
            Self::Start => None,
            Self::After(addr) => Some(addr),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => Ok(()),
            Self::After(addr) => write!(f, "{addr}"),
        }
    }
}
