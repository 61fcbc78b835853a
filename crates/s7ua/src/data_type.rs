// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! S7 data types.
//!
//! [`S7DataType`] is the PLC-side view of a variable's type. It is distinct
//! from the wire type: an `S5TIME` travels as a `ByteString`, a `DATE` as a
//! `UInt16`, a `TIME` as an `Int32`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, S7Error};

macro_rules! s7_data_types {
    (
        scalars { $($scalar:ident => $scalar_name:literal, $size:expr;)* }
        arrays { $($array:ident => $array_name:literal, $element:ident;)* }
    ) => {
        /// PLC data type of a variable.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        pub enum S7DataType {
            $(
                #[doc = concat!("`", $scalar_name, "`")]
                #[serde(rename = $scalar_name)]
                $scalar,
            )*
            $(
                #[doc = concat!("`", $array_name, "`")]
                #[serde(rename = $array_name)]
                $array,
            )*
            /// Structure without a named type.
            #[serde(rename = "STRUCT")]
            Struct,
            /// Named user-defined type.
            #[serde(rename = "UDT")]
            Udt,
            /// Type could not be determined.
            #[default]
            #[serde(rename = "UNKNOWN")]
            Unknown,
        }

        impl S7DataType {
            /// Returns the S7 type name.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$scalar => $scalar_name,)*
                    $(Self::$array => $array_name,)*
                    Self::Struct => "STRUCT",
                    Self::Udt => "UDT",
                    Self::Unknown => "UNKNOWN",
                }
            }

            /// Returns the array type whose elements have this type.
            pub const fn array_of(&self) -> Option<S7DataType> {
                match self {
                    $(Self::$element => Some(Self::$array),)*
                    _ => None,
                }
            }

            /// Returns the element type of an array type.
            pub const fn element_type(&self) -> Option<S7DataType> {
                match self {
                    $(Self::$array => Some(Self::$element),)*
                    _ => None,
                }
            }

            /// Returns the fixed size of a scalar in PLC memory, 0 if variable.
            pub const fn size_in_bytes(&self) -> usize {
                match self {
                    $(Self::$scalar => $size,)*
                    _ => 0,
                }
            }
        }

        impl FromStr for S7DataType {
            type Err = S7Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($scalar_name => Ok(Self::$scalar),)*
                    $($array_name => Ok(Self::$array),)*
                    "STRUCT" => Ok(Self::Struct),
                    "UDT" => Ok(Self::Udt),
                    "UNKNOWN" => Ok(Self::Unknown),
                    _ => Err(ConversionError::unsupported_type(s).into()),
                }
            }
        }
    };
}

s7_data_types! {
    scalars {
        Bool => "BOOL", 1;
        Byte => "BYTE", 1;
        Word => "WORD", 2;
        DWord => "DWORD", 4;
        LWord => "LWORD", 8;
        SInt => "SINT", 1;
        Int => "INT", 2;
        DInt => "DINT", 4;
        LInt => "LINT", 8;
        USInt => "USINT", 1;
        UInt => "UINT", 2;
        UDInt => "UDINT", 4;
        ULInt => "ULINT", 8;
        Real => "REAL", 4;
        LReal => "LREAL", 8;
        Char => "CHAR", 1;
        WChar => "WCHAR", 2;
        String => "STRING", 256;
        WString => "WSTRING", 512;
        Date => "DATE", 2;
        Time => "TIME", 4;
        LTime => "LTIME", 8;
        TimeOfDay => "TIME_OF_DAY", 4;
        LTimeOfDay => "LTIME_OF_DAY", 8;
        S5Time => "S5TIME", 2;
        DateAndTime => "DATE_AND_TIME", 8;
        Ldt => "LDT", 8;
        Dtl => "DTL", 12;
        Counter => "COUNTER", 2;
    }
    arrays {
        ArrayOfBool => "ARRAY_OF_BOOL", Bool;
        ArrayOfByte => "ARRAY_OF_BYTE", Byte;
        ArrayOfWord => "ARRAY_OF_WORD", Word;
        ArrayOfDWord => "ARRAY_OF_DWORD", DWord;
        ArrayOfLWord => "ARRAY_OF_LWORD", LWord;
        ArrayOfSInt => "ARRAY_OF_SINT", SInt;
        ArrayOfInt => "ARRAY_OF_INT", Int;
        ArrayOfDInt => "ARRAY_OF_DINT", DInt;
        ArrayOfLInt => "ARRAY_OF_LINT", LInt;
        ArrayOfUSInt => "ARRAY_OF_USINT", USInt;
        ArrayOfUInt => "ARRAY_OF_UINT", UInt;
        ArrayOfUDInt => "ARRAY_OF_UDINT", UDInt;
        ArrayOfULInt => "ARRAY_OF_ULINT", ULInt;
        ArrayOfReal => "ARRAY_OF_REAL", Real;
        ArrayOfLReal => "ARRAY_OF_LREAL", LReal;
        ArrayOfChar => "ARRAY_OF_CHAR", Char;
        ArrayOfWChar => "ARRAY_OF_WCHAR", WChar;
        ArrayOfString => "ARRAY_OF_STRING", String;
        ArrayOfWString => "ARRAY_OF_WSTRING", WString;
        ArrayOfDate => "ARRAY_OF_DATE", Date;
        ArrayOfTime => "ARRAY_OF_TIME", Time;
        ArrayOfLTime => "ARRAY_OF_LTIME", LTime;
        ArrayOfTimeOfDay => "ARRAY_OF_TIME_OF_DAY", TimeOfDay;
        ArrayOfLTimeOfDay => "ARRAY_OF_LTIME_OF_DAY", LTimeOfDay;
        ArrayOfS5Time => "ARRAY_OF_S5TIME", S5Time;
        ArrayOfDateAndTime => "ARRAY_OF_DATE_AND_TIME", DateAndTime;
        ArrayOfLdt => "ARRAY_OF_LDT", Ldt;
        ArrayOfDtl => "ARRAY_OF_DTL", Dtl;
        ArrayOfCounter => "ARRAY_OF_COUNTER", Counter;
    }
}

impl S7DataType {
    /// Returns `true` for STRUCT and UDT, the types that carry members.
    #[inline]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Struct | Self::Udt)
    }

    /// Returns `true` for array types.
    #[inline]
    pub const fn is_array(&self) -> bool {
        self.element_type().is_some()
    }
}

impl fmt::Display for S7DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_element_symmetry() {
        assert_eq!(S7DataType::Int.array_of(), Some(S7DataType::ArrayOfInt));
        assert_eq!(S7DataType::ArrayOfChar.element_type(), Some(S7DataType::Char));
        assert_eq!(S7DataType::Udt.array_of(), None);
        assert!(S7DataType::ArrayOfDtl.is_array());
        assert!(!S7DataType::Dtl.is_array());
    }

    #[test]
    fn test_names_and_parse() {
        assert_eq!(S7DataType::TimeOfDay.to_string(), "TIME_OF_DAY");
        assert_eq!("s5time".parse::<S7DataType>().unwrap(), S7DataType::S5Time);
        assert_eq!(
            "ARRAY_OF_DATE_AND_TIME".parse::<S7DataType>().unwrap(),
            S7DataType::ArrayOfDateAndTime
        );
        assert!("FLOAT".parse::<S7DataType>().is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(S7DataType::Dtl.size_in_bytes(), 12);
        assert_eq!(S7DataType::DateAndTime.size_in_bytes(), 8);
        assert_eq!(S7DataType::Udt.size_in_bytes(), 0);
        assert_eq!(S7DataType::ArrayOfInt.size_in_bytes(), 0);
    }

    #[test]
    fn test_structured() {
        assert!(S7DataType::Struct.is_structured());
        assert!(S7DataType::Udt.is_structured());
        assert!(!S7DataType::Unknown.is_structured());
        assert_eq!(S7DataType::default(), S7DataType::Unknown);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&S7DataType::ArrayOfWChar).unwrap();
        assert_eq!(json, "\"ARRAY_OF_WCHAR\"");
    }
}
