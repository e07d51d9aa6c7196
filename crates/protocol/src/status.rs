//! Wire status codes
//!
//! One status line is written per request, immediately after framing:
//! the decimal code followed by CRLF. Log requests are acknowledged
//! with `Ok` before any per-record validation; `Continue` means
//! "accepted, response body follows".

/// Status code written on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    /// Request accepted; nothing further follows
    Ok = 0,
    /// Request malformed or rejected; session closes for framing errors
    BadRequest = 1,
    /// Request accepted; see response body
    Continue = 2,
}

impl StatusCode {
    /// Numeric wire value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::BadRequest),
            2 => Some(Self::Continue),
            _ => None,
        }
    }

    /// The status line as written to the socket
    #[inline]
    pub fn wire_line(self) -> [u8; 3] {
        [b'0' + self.as_u8(), b'\r', b'\n']
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ok => "STATUS_OK",
            Self::BadRequest => "BAD_REQUEST",
            Self::Continue => "CONTINUE",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_lines() {
        assert_eq!(&StatusCode::Ok.wire_line(), b"0\r\n");
        assert_eq!(&StatusCode::BadRequest.wire_line(), b"1\r\n");
        assert_eq!(&StatusCode::Continue.wire_line(), b"2\r\n");
    }

    #[test]
    fn test_round_trip() {
        for code in [StatusCode::Ok, StatusCode::BadRequest, StatusCode::Continue] {
            assert_eq!(StatusCode::from_u8(code.as_u8()), Some(code));
        }
        assert_eq!(StatusCode::from_u8(9), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StatusCode::Ok.to_string(), "STATUS_OK");
        assert_eq!(StatusCode::Continue.to_string(), "CONTINUE");
    }
}
