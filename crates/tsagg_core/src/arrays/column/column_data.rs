use half::f16;

use super::physical_type::PhysicalType;

/// Variable length binary data.
///
/// Value `i` lives at `data[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
    pub(crate) offsets: Vec<usize>,
    pub(crate) data: Vec<u8>,
}

impl BinaryData {
    pub fn with_capacity(cap: usize) -> Self {
        let mut offsets = Vec::with_capacity(cap + 1);
        offsets.push(0);
        BinaryData {
            offsets,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, val: &[u8]) {
        self.data.extend_from_slice(val);
        self.offsets.push(self.data.len());
    }
}

impl Default for BinaryData {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Physical storage for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Only tracks the number of values.
    UntypedNull(usize),
    Boolean(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Binary(BinaryData),
}

impl ColumnData {
    /// Create empty data for the given physical type.
    pub fn with_capacity(physical_type: PhysicalType, cap: usize) -> Self {
        match physical_type {
            PhysicalType::UntypedNull => Self::UntypedNull(0),
            PhysicalType::Boolean => Self::Boolean(Vec::with_capacity(cap)),
            PhysicalType::Int8 => Self::Int8(Vec::with_capacity(cap)),
            PhysicalType::Int16 => Self::Int16(Vec::with_capacity(cap)),
            PhysicalType::Int32 => Self::Int32(Vec::with_capacity(cap)),
            PhysicalType::Int64 => Self::Int64(Vec::with_capacity(cap)),
            PhysicalType::Float16 => Self::Float16(Vec::with_capacity(cap)),
            PhysicalType::Float32 => Self::Float32(Vec::with_capacity(cap)),
            PhysicalType::Float64 => Self::Float64(Vec::with_capacity(cap)),
            PhysicalType::Binary => Self::Binary(BinaryData::with_capacity(cap)),
        }
    }

    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::UntypedNull(_) => PhysicalType::UntypedNull,
            Self::Boolean(_) => PhysicalType::Boolean,
            Self::Int8(_) => PhysicalType::Int8,
            Self::Int16(_) => PhysicalType::Int16,
            Self::Int32(_) => PhysicalType::Int32,
            Self::Int64(_) => PhysicalType::Int64,
            Self::Float16(_) => PhysicalType::Float16,
            Self::Float32(_) => PhysicalType::Float32,
            Self::Float64(_) => PhysicalType::Float64,
            Self::Binary(_) => PhysicalType::Binary,
        }
    }

    /// Number of physical values.
    pub fn len(&self) -> usize {
        match self {
            Self::UntypedNull(len) => *len,
            Self::Boolean(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float16(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a placeholder value, used for null entries.
    pub fn push_default(&mut self) {
        match self {
            Self::UntypedNull(len) => *len += 1,
            Self::Boolean(v) => v.push(false),
            Self::Int8(v) => v.push(0),
            Self::Int16(v) => v.push(0),
            Self::Int32(v) => v.push(0),
            Self::Int64(v) => v.push(0),
            Self::Float16(v) => v.push(f16::ZERO),
            Self::Float32(v) => v.push(0.0),
            Self::Float64(v) => v.push(0.0),
            Self::Binary(v) => v.push(&[]),
        }
    }
}
