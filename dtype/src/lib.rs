//! Element data types for kernjit literals and kernel arguments.

pub mod ext;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


pub use ext::HasDType;

/// Element type of a literal.
///
/// The textual names follow the HLO convention (`s32`, `f32`, `pred`, ...) and
/// round-trip through `Display` / `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    #[strum(serialize = "pred")]
    Bool,

    #[strum(serialize = "s8")]
    Int8,
    #[strum(serialize = "s16")]
    Int16,
    #[strum(serialize = "s32")]
    Int32,
    #[strum(serialize = "s64")]
    Int64,

    #[strum(serialize = "u8")]
    UInt8,
    #[strum(serialize = "u16")]
    UInt16,
    #[strum(serialize = "u32")]
    UInt32,
    #[strum(serialize = "u64")]
    UInt64,

    #[strum(serialize = "f16")]
    Float16,
    #[strum(serialize = "bf16")]
    BFloat16,
    #[strum(serialize = "f32")]
    Float32,
    #[strum(serialize = "f64")]
    Float64,
}

impl DType {
    /// Size of one element in bytes.
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }
}
