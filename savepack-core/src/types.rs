// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


use crate::util::hash_key;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire type of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum PropertyType {
    Bool = 1,
    Byte = 2,
    SByte = 3,
    Short = 4,
    UShort = 5,
    Int = 6,
    UInt = 7,
    Long = 8,
    ULong = 9,
    Float = 10,
    Double = 11,
    String = 12,
    Vector2 = 13,
    Vector3 = 14,
    Vector4 = 15,
    Vector2Int = 16,
    Vector3Int = 17,
    Quaternion = 18,
    Color = 19,
    Color32 = 20,
    Guid = 21,
    DateTime = 22,
    Serializable = 23,
    PushContext = 0xF0,
    PopContext = 0xF1,
    NextBuffer = 0xFF,
}

/// Byte used to pad the tail of a chunk after a `NextBuffer` record.
pub const NEXT_BUFFER_BYTE: u8 = PropertyType::NextBuffer as u8;

/// `[i32 record_len][u8 type][u8 flags]`
pub const RECORD_HEADER_LEN: usize = 6;
/// Key hash following the header of every named record.
pub const KEY_LEN: usize = 4;
/// `[i32 used_len]` at the start of each chunk.
pub const CHUNK_HEADER_LEN: usize = 4;
/// A `NextBuffer` record is a bare header.
pub const NEXT_BUFFER_RECORD_LEN: usize = RECORD_HEADER_LEN;
/// `[i32 total_len]` in front of the stream.
pub const STREAM_HEADER_LEN: usize = 4;

/// Modifier bits of a record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: PropertyFlags = PropertyFlags(0);
    /// Payload is `[i32 count][elements]`.
    pub const IS_ARRAY: PropertyFlags = PropertyFlags(1);
    /// No key hash; the record belongs to the preceding named property.
    pub const UNNAMED: PropertyFlags = PropertyFlags(1 << 1);
    /// Empty array or serializable list; the payload is omitted.
    pub const NULL_OR_EMPTY: PropertyFlags = PropertyFlags(1 << 2);

    const ALL: u8 = 0b111;

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Rejects unknown bits, which only appear in corrupt data.
    pub fn from_bits(bits: u8) -> Option<PropertyFlags> {
        if bits & !Self::ALL == 0 {
            Some(PropertyFlags(bits))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn contains(self, other: PropertyFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn with(self, other: PropertyFlags) -> PropertyFlags {
        PropertyFlags(self.0 | other.0)
    }

    #[inline(always)]
    pub fn is_array(self) -> bool {
        self.contains(Self::IS_ARRAY)
    }

    #[inline(always)]
    pub fn is_unnamed(self) -> bool {
        self.contains(Self::UNNAMED)
    }

    #[inline(always)]
    pub fn is_null_or_empty(self) -> bool {
        self.contains(Self::NULL_OR_EMPTY)
    }
}

impl std::ops::BitOr for PropertyFlags {
    type Output = PropertyFlags;

    fn bitor(self, rhs: PropertyFlags) -> PropertyFlags {
        self.with(rhs)
    }
}

impl fmt::Debug for PropertyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_array() {
            names.push("IS_ARRAY");
        }
        if self.is_unnamed() {
            names.push("UNNAMED");
        }
        if self.is_null_or_empty() {
            names.push("NULL_OR_EMPTY");
        }
        write!(f, "PropertyFlags({})", names.join(" | "))
    }
}

/// Kind of a nested scope. Only used to check that pushes and pops pair up;
/// addressing is done by id alone.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ContextType {
    Root = 0,
    Scene = 1,
    Object = 2,
    Component = 3,
    Data = 4,
}

/// Stable on-disk identifier of a property: the 32-bit hash of its name.
///
/// ```rust
/// use savepack_core::types::PropertyKey;
///
/// let by_name = PropertyKey::from("health");
/// let by_hash = PropertyKey::from(by_name.hash());
/// assert_eq!(by_name, by_hash);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(i32);

impl PropertyKey {
    #[inline(always)]
    pub const fn from_hash(hash: i32) -> PropertyKey {
        PropertyKey(hash)
    }

    #[inline(always)]
    pub const fn hash(self) -> i32 {
        self.0
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey(hash_key(name))
    }
}

impl From<&String> for PropertyKey {
    fn from(name: &String) -> Self {
        PropertyKey(hash_key(name))
    }
}

impl From<i32> for PropertyKey {
    fn from(hash: i32) -> Self {
        PropertyKey(hash)
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyKey({:#010x})", self.0)
    }
}
