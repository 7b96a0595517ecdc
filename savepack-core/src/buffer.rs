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


use crate::error::Error;
use crate::types::{
    PropertyFlags, PropertyType, CHUNK_HEADER_LEN, NEXT_BUFFER_BYTE, NEXT_BUFFER_RECORD_LEN,
};
use crate::util::Pool;
use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;
use std::ops::Range;

#[derive(Default, Debug)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    /// Drops everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.bf.truncate(len);
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.bf.reserve(additional);
    }

    pub fn set_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), Error> {
        let len = self.bf.len();
        self.bf
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| Error::buffer_out_of_bound(offset, data.len(), len))?
            .copy_from_slice(data);
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    pub fn fill(&mut self, value: u8, len: usize) {
        self.bf.resize(self.bf.len() + len, value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i16(&mut self, value: i16) {
        let mut b = [0u8; 2];
        LittleEndian::write_i16(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut b = [0u8; 8];
        LittleEndian::write_i64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    /// Writes `[i32 count][count × u16]` UTF-16 code units.
    pub fn write_utf16(&mut self, units: &[u16]) {
        self.write_i32(units.len() as i32);
        self.bf.reserve(units.len() * 2);
        for &unit in units {
            self.write_u16(unit);
        }
    }
}

/// Bounds-checked little-endian cursor over a byte slice.
pub struct Reader<'bf> {
    bf: &'bf [u8],
    cursor: usize,
}

impl<'bf> Reader<'bf> {
    pub fn new(bf: &'bf [u8]) -> Reader<'bf> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        if self.cursor + n > self.bf.len() {
            return Err(Error::buffer_out_of_bound(self.cursor, n, self.bf.len()));
        }
        Ok(())
    }

    #[inline(always)]
    fn take(&mut self, n: usize) -> Result<&'bf [u8], Error> {
        self.check_bound(n)?;
        let s = &self.bf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(s)
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) -> Result<(), Error> {
        if cursor > self.bf.len() {
            return Err(Error::buffer_out_of_bound(cursor, 0, self.bf.len()));
        }
        self.cursor = cursor;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    pub fn slice_after_cursor(&self) -> &'bf [u8] {
        &self.bf[self.cursor..]
    }

    /// A reader over `range` of the underlying slice, for bounded payload parsing.
    pub fn sub_reader(&self, range: Range<usize>) -> Result<Reader<'bf>, Error> {
        if range.start > range.end || range.end > self.bf.len() {
            return Err(Error::buffer_out_of_bound(range.start, range.len(), self.bf.len()));
        }
        Ok(Reader::new(&self.bf[range]))
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check_bound(len)?;
        self.cursor += len;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'bf [u8], Error> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Reads a non-negative `i32` length and checks it against what is left.
    pub fn read_len(&mut self, element_size: usize) -> Result<usize, Error> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(Error::invalid_data(format!("negative length {}", len)));
        }
        let len = len as usize;
        self.check_bound(len.saturating_mul(element_size))?;
        Ok(len)
    }

    pub fn read_utf16(&mut self) -> Result<Vec<u16>, Error> {
        let len = self.read_len(2)?;
        let bytes = self.take(len * 2)?;
        let mut units = vec![0u16; len];
        LittleEndian::read_u16_into(bytes, &mut units);
        Ok(units)
    }
}

struct Chunk {
    writer: Writer,
    capacity: usize,
}

impl Chunk {
    #[inline(always)]
    fn fits(&self, record_len: usize) -> bool {
        self.writer.len() + record_len + NEXT_BUFFER_RECORD_LEN <= self.capacity
    }

    #[inline(always)]
    fn is_fresh(&self) -> bool {
        self.writer.len() == CHUNK_HEADER_LEN
    }

    fn seal_used_len(&mut self) -> Result<(), Error> {
        let used = self.writer.len() as i32;
        self.writer.set_bytes(0, &used.to_le_bytes())
    }

    /// Records the used length, then covers the rest of the chunk with a
    /// `NextBuffer` record whose body is padding.
    fn seal_with_marker(&mut self) -> Result<(), Error> {
        self.seal_used_len()?;
        let remaining = self.capacity - self.writer.len();
        self.writer.write_i32(remaining as i32);
        self.writer.write_u8(PropertyType::NextBuffer.into());
        self.writer.write_u8(PropertyFlags::UNNAMED.bits());
        self.writer
            .fill(NEXT_BUFFER_BYTE, remaining - NEXT_BUFFER_RECORD_LEN);
        Ok(())
    }
}

/// Output made of fixed-capacity chunks instead of one growing array.
///
/// A record never straddles two chunks: when one would overflow, the current
/// chunk is sealed with its used length and a `NextBuffer` padding record, and
/// the record starts a fresh chunk. Every chunk keeps room for that marker, so
/// sealing can never fail for lack of space.
pub struct ChunkedBuffer {
    chunks: Vec<Chunk>,
    pool: Pool<Writer>,
    chunk_size: usize,
    pooling: bool,
}

impl ChunkedBuffer {
    pub fn new(chunk_size: usize, pooling: bool) -> ChunkedBuffer {
        ChunkedBuffer {
            chunks: Vec::new(),
            pool: Pool::new(move || Writer::with_capacity(chunk_size)),
            chunk_size,
            pooling,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Drops all written data, recycling standard-size chunks.
    pub fn reset(&mut self) {
        for chunk in self.chunks.drain(..) {
            if self.pooling && chunk.capacity == self.chunk_size {
                let mut writer = chunk.writer;
                writer.reset();
                self.pool.put(writer);
            }
        }
        if !self.pooling {
            self.pool.clear();
        }
    }

    fn open_chunk(&mut self, capacity: usize) {
        let mut writer = if capacity == self.chunk_size {
            self.pool.get()
        } else {
            Writer::with_capacity(capacity)
        };
        writer.reset();
        writer.write_i32(0);
        self.chunks.push(Chunk { writer, capacity });
    }

    /// Returns the chunk writer that has room for `record_len` more bytes.
    pub fn reserve_record(&mut self, record_len: usize) -> Result<&mut Writer, Error> {
        let oversized = CHUNK_HEADER_LEN + record_len + NEXT_BUFFER_RECORD_LEN;
        match self.chunks.last_mut() {
            None => {
                let capacity = self.chunk_size.max(oversized);
                self.open_chunk(capacity);
            }
            Some(chunk) if chunk.fits(record_len) => {}
            Some(chunk) if chunk.is_fresh() => {
                // nothing written yet, grow in place rather than leave an empty chunk
                chunk.capacity = oversized;
                chunk.writer.reserve(oversized);
            }
            Some(chunk) => {
                chunk.seal_with_marker()?;
                let capacity = self.chunk_size.max(oversized);
                self.open_chunk(capacity);
            }
        }
        let chunk = self
            .chunks
            .last_mut()
            .ok_or_else(|| Error::unknown("no chunk available after reserve"))?;
        Ok(&mut chunk.writer)
    }

    /// Stamps the used length of the last chunk. Called once per pass.
    pub fn finish(&mut self) -> Result<(), Error> {
        match self.chunks.last_mut() {
            Some(chunk) => chunk.seal_used_len(),
            None => Ok(()),
        }
    }

    pub fn total_len(&self) -> usize {
        self.chunks.iter().map(|c| c.writer.len()).sum()
    }

    pub fn write_to<W: Write>(&self, stream: &mut W) -> std::io::Result<()> {
        for chunk in &self.chunks {
            stream.write_all(chunk.writer.as_slice())?;
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk.writer.as_slice());
        }
        out
    }
}
