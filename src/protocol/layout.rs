//! Frame layout schema
//!
//! Every frame on the wire is an `i32` little-endian length prefix followed
//! by a fixed header and a homogeneous sample array:
//!
//! ```text
//! Body frame (232 byte payload):
//! +-----------+---------+------------+------------+-------------------+
//! | ts (i64)  | code    | body count | engagement | 54 x f32 joints   |
//! |           | (i16)   | (u16)      | (f32)      | (x, y, conf) x 18 |
//! +-----------+---------+------------+------------+-------------------+
//!
//! Image frame (hands and head):
//! +-----------+---------+-----------+------------+----------------------+
//! | ts (i64)  | code    | width     | height     | w x h x 3 x u16 RGB  |
//! |           | (i32)   | (u16)     | (u16)      | samples, row-major   |
//! +-----------+---------+-----------+------------+----------------------+
//! ```
//!
//! The code field differs in width between the two layouts. Existing
//! clients decode it that way, so the widths are kept as they are.
//!
//! The engagement value is part of the body header here; on the upstream
//! text line it is the first of the 55 values.

/// Primitive field type on the wire (all little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    I16,
    U16,
    I32,
    I64,
    F32,
}

impl FieldKind {
    /// Size in bytes
    pub const fn size(self) -> usize {
        match self {
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::F32 => 4,
            FieldKind::I64 => 8,
        }
    }
}

/// Named header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Header fields followed by an array of samples of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub header: &'static [Field],
    pub sample: FieldKind,
}

impl FrameLayout {
    /// Header size in bytes
    pub const fn header_size(&self) -> usize {
        let mut size = 0;
        let mut i = 0;
        while i < self.header.len() {
            size += self.header[i].kind.size();
            i += 1;
        }
        size
    }

    /// Payload size (excluding the length prefix) for `samples` samples
    pub const fn payload_size(&self, samples: usize) -> usize {
        self.header_size() + samples * self.sample.size()
    }

    /// Number of samples that fit in a payload of `payload_len` bytes
    ///
    /// Returns `None` if the payload is shorter than the header or does not
    /// end on a sample boundary.
    pub fn sample_count(&self, payload_len: usize) -> Option<usize> {
        let body = payload_len.checked_sub(self.header_size())?;
        if body % self.sample.size() != 0 {
            return None;
        }
        Some(body / self.sample.size())
    }
}

/// Skeleton frame layout
pub const BODY_LAYOUT: FrameLayout = FrameLayout {
    header: &[
        Field::new("timestamp", FieldKind::I64),
        Field::new("category_code", FieldKind::I16),
        Field::new("body_count", FieldKind::U16),
        Field::new("engagement", FieldKind::F32),
    ],
    sample: FieldKind::F32,
};

/// Hand and head image frame layout
pub const IMAGE_LAYOUT: FrameLayout = FrameLayout {
    header: &[
        Field::new("timestamp", FieldKind::I64),
        Field::new("code", FieldKind::I32),
        Field::new("width", FieldKind::U16),
        Field::new("height", FieldKind::U16),
    ],
    sample: FieldKind::U16,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::JOINT_VALUE_COUNT;

    #[test]
    fn test_body_payload_size() {
        assert_eq!(BODY_LAYOUT.header_size(), 16);
        assert_eq!(BODY_LAYOUT.payload_size(JOINT_VALUE_COUNT), 232);
    }

    #[test]
    fn test_image_payload_size() {
        assert_eq!(IMAGE_LAYOUT.header_size(), 16);
        assert_eq!(IMAGE_LAYOUT.payload_size(64 * 64 * 3), 16 + 64 * 64 * 3 * 2);
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(IMAGE_LAYOUT.sample_count(16 + 12), Some(6));
        assert_eq!(IMAGE_LAYOUT.sample_count(16 + 3), None);
        assert_eq!(IMAGE_LAYOUT.sample_count(8), None);
        assert_eq!(BODY_LAYOUT.sample_count(232), Some(54));
    }
}
