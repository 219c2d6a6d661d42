use std::fmt;

/// Size limits that decide whether a response may be stored.
#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    max_object_bytes: usize,
    max_key_bytes: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    PayloadTooLarge { len: usize, max: usize },
    KeyTooLong { len: usize, max: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PayloadTooLarge { len, max } => {
                write!(f, "payload of {len} bytes is not below the {max} byte object limit")
            }
            RejectReason::KeyTooLong { len, max } => {
                write!(f, "key of {len} bytes exceeds the {max} byte key limit")
            }
        }
    }
}

impl CachePolicy {
    pub fn new(max_object_bytes: usize, max_key_bytes: usize) -> Self {
        Self {
            max_object_bytes,
            max_key_bytes,
        }
    }

    pub fn max_object_bytes(&self) -> usize {
        self.max_object_bytes
    }

    pub fn max_key_bytes(&self) -> usize {
        self.max_key_bytes
    }

    /// A payload is storable only while strictly below the object limit.
    pub fn fits_payload(&self, len: usize) -> bool {
        len < self.max_object_bytes
    }

    pub fn check(&self, key: &str, payload_len: usize) -> Result<(), RejectReason> {
        if key.len() > self.max_key_bytes {
            return Err(RejectReason::KeyTooLong {
                len: key.len(),
                max: self.max_key_bytes,
            });
        }
        if !self.fits_payload(payload_len) {
            return Err(RejectReason::PayloadTooLarge {
                len: payload_len,
                max: self.max_object_bytes,
            });
        }
        Ok(())
    }
}
