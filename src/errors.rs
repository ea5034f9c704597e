//! バイトレイアウト処理用エラー型定義
//! 宣言時エラー（ConfigError）と代入時エラー（ValidationError）を区別する

use std::error::Error;
use std::fmt;

/// パケット型やフィールドの宣言が不正な場合のエラー。
/// 宣言・構築時に即座に検出され、遅延されることはない。
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// フィールドリストが空
    EmptyFieldList,
    /// BitsFieldのパートリストが空
    EmptyParts,
    /// フィールド名が識別子規則に従っていない
    InvalidFieldName(String),
    /// 同名フィールドの二重定義
    DuplicateFieldName(String),
    /// 予約済み属性名との衝突
    ReservedFieldName(String),
    /// 存在しないフィールド名の参照
    UnknownField(String),
    /// デフォルト値が数値範囲外
    DefaultOutOfRange {
        field: String,
        value: i128,
        low: i128,
        high: i128,
    },
    /// デフォルト値が宣言長より長い
    DefaultTooLong {
        field: String,
        length: usize,
        max: usize,
    },
    /// 列挙マッピングのキーが範囲外
    EnumKeyOutOfRange {
        field: String,
        key: i128,
        low: i128,
        high: i128,
    },
    /// パートのビット幅合計が集約幅と一致しない
    BitWidthMismatch { given: usize, expected: usize },
    /// パートのビット幅が集約幅以上
    PartTooWide {
        part: String,
        bits: usize,
        aggregate: usize,
    },
    /// パートのデフォルト値がビット幅に収まらない
    PartDefaultOutOfRange {
        part: String,
        value: u64,
        bits: usize,
    },
    /// レイヤ抽出に最低一つのパケット型が必要
    NoPacketTypes,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyFieldList => {
                write!(f, "the list of fields must not be empty")
            }
            ConfigError::EmptyParts => {
                write!(f, "parts must not be an empty list")
            }
            ConfigError::InvalidFieldName(name) => {
                write!(
                    f,
                    "field name must start with a letter and contain only letters, \
                     digits and underscores but you provided {name}"
                )
            }
            ConfigError::DuplicateFieldName(name) => {
                write!(f, "you already have a field with name {name}")
            }
            ConfigError::ReservedFieldName(name) => {
                write!(f, "{name} is a reserved packet attribute name")
            }
            ConfigError::UnknownField(name) => {
                write!(f, "there is no attribute with name {name}")
            }
            ConfigError::DefaultOutOfRange {
                field,
                value,
                low,
                high,
            } => {
                write!(
                    f,
                    "{field} default must be between {low} and {high} but you provided {value}"
                )
            }
            ConfigError::DefaultTooLong { field, length, max } => {
                write!(
                    f,
                    "{field} default length is {length} but must not exceed {max}"
                )
            }
            ConfigError::EnumKeyOutOfRange {
                field,
                key,
                low,
                high,
            } => {
                write!(
                    f,
                    "all keys in {field} enumeration must be between {low} and {high} \
                     but you provided {key}"
                )
            }
            ConfigError::BitWidthMismatch { given, expected } => {
                write!(
                    f,
                    "the sum in bits of the different field parts ({given}) is different \
                     from the field size ({expected})"
                )
            }
            ConfigError::PartTooWide {
                part,
                bits,
                aggregate,
            } => {
                write!(
                    f,
                    "field part {part} is {bits} bits wide which does not fit in an \
                     aggregate of {aggregate} bits"
                )
            }
            ConfigError::PartDefaultOutOfRange { part, value, bits } => {
                write!(
                    f,
                    "{part} default must be between 0 and {} but you provided {value}",
                    u64::MAX >> (64 - bits)
                )
            }
            ConfigError::NoPacketTypes => {
                write!(
                    f,
                    "you must provide at least one packet type to use for layer extraction"
                )
            }
        }
    }
}

impl Error for ConfigError {}

/// 値の代入・デコードが不正な場合のエラー。
/// 代入箇所で同期的に検出される。
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// 数値が許容範囲外
    OutOfRange {
        field: String,
        value: i128,
        low: i128,
        high: i128,
    },
    /// 期待と異なる値種別
    WrongKind {
        field: String,
        expected: &'static str,
    },
    /// 文字列が宣言長を超過
    TooLong {
        field: String,
        length: usize,
        max: usize,
    },
    /// 列挙マッピングに存在しないシンボル名
    UnknownEnumName { field: String, name: String },
    /// テキストフィールドに不正なUTF-8
    InvalidUtf8 { field: String },
}

impl ValidationError {
    pub(crate) fn out_of_range(field: &str, value: i128, low: i128, high: i128) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            low,
            high,
        }
    }

    pub(crate) fn wrong_kind(field: &str, expected: &'static str) -> Self {
        ValidationError::WrongKind {
            field: field.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange {
                field,
                value,
                low,
                high,
            } => {
                write!(
                    f,
                    "{field} value must be between {low} and {high} but you provided {value}"
                )
            }
            ValidationError::WrongKind { field, expected } => {
                write!(f, "{field} value must be {expected}")
            }
            ValidationError::TooLong { field, length, max } => {
                write!(
                    f,
                    "the length of {field} value is {length} but must not exceed {max}"
                )
            }
            ValidationError::UnknownEnumName { field, name } => {
                write!(f, "{field} has no value represented by {name}")
            }
            ValidationError::InvalidUtf8 { field } => {
                write!(f, "{field} holds bytes that are not valid UTF-8")
            }
        }
    }
}

impl Error for ValidationError {}

/// ライブラリ全体の統合エラー型
#[derive(Debug, Clone, PartialEq)]
pub enum PacketError {
    Config(ConfigError),
    Validation(ValidationError),
    /// レイヤ抽出中にバッファが尽きた
    OutOfData { layer: String },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::Config(e) => write!(f, "configuration error: {e}"),
            PacketError::Validation(e) => write!(f, "validation error: {e}"),
            PacketError::OutOfData { layer } => {
                write!(f, "ran out of data before decoding layer {layer}")
            }
        }
    }
}

impl Error for PacketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PacketError::Config(e) => Some(e),
            PacketError::Validation(e) => Some(e),
            PacketError::OutOfData { .. } => None,
        }
    }
}

impl From<ConfigError> for PacketError {
    fn from(e: ConfigError) -> Self {
        PacketError::Config(e)
    }
}

impl From<ValidationError> for PacketError {
    fn from(e: ValidationError) -> Self {
        PacketError::Validation(e)
    }
}

/// ライブラリ共通のResult型
pub type LayoutResult<T> = Result<T, PacketError>;
