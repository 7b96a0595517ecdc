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


use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::object::Value;
use crate::serializer::PropertyValue;
use crate::types::PropertyType;
use std::mem;

macro_rules! impl_num_value {
    ($ty:ty, $variant:ident, $writer:ident, $reader:ident) => {
        impl PropertyValue for $ty {
            const PROPERTY_TYPE: PropertyType = PropertyType::$variant;
            const MIN_ENCODED_LEN: usize = mem::size_of::<$ty>();

            #[inline(always)]
            fn encoded_len(&self) -> usize {
                mem::size_of::<$ty>()
            }

            #[inline(always)]
            fn write_to(&self, writer: &mut Writer) {
                writer.$writer(*self);
            }

            #[inline(always)]
            fn read_from(reader: &mut Reader) -> Result<Self, Error> {
                reader.$reader()
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_num_value!(bool, Bool, write_bool, read_bool);
impl_num_value!(u8, Byte, write_u8, read_u8);
impl_num_value!(i8, SByte, write_i8, read_i8);
impl_num_value!(i16, Short, write_i16, read_i16);
impl_num_value!(u16, UShort, write_u16, read_u16);
impl_num_value!(i32, Int, write_i32, read_i32);
impl_num_value!(u32, UInt, write_u32, read_u32);
impl_num_value!(i64, Long, write_i64, read_i64);
impl_num_value!(u64, ULong, write_u64, read_u64);
impl_num_value!(f32, Float, write_f32, read_f32);
impl_num_value!(f64, Double, write_f64, read_f64);
