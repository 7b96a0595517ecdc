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


/// Smallest chunk capacity accepted; anything lower is clamped up.
pub const MIN_BUFFER_SIZE: usize = 64;

/// Configuration shared by the binary writer and reader.
///
/// Fields are public; the chained setters clamp values into their valid
/// range, so prefer them over assigning fields directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of each fixed-size output chunk in bytes.
    pub buffer_size: usize,
    /// Largest length prefix `read_from_stream` accepts before treating the
    /// stream as corrupt.
    pub max_stream_len: usize,
    /// Whether sealed chunks are recycled by the next pass.
    pub pool_buffers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_size: 16 * 1024,
            max_stream_len: 256 * 1024 * 1024,
            pool_buffers: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk capacity, clamped to [`MIN_BUFFER_SIZE`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use savepack_core::config::Config;
    ///
    /// let config = Config::default().buffer_size(128);
    /// assert_eq!(config.get_buffer_size(), 128);
    /// assert_eq!(Config::default().buffer_size(1).get_buffer_size(), 64);
    /// ```
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(MIN_BUFFER_SIZE);
        self
    }

    pub fn max_stream_len(mut self, max_stream_len: usize) -> Self {
        self.max_stream_len = max_stream_len.min(i32::MAX as usize);
        self
    }

    pub fn pool_buffers(mut self, pool_buffers: bool) -> Self {
        self.pool_buffers = pool_buffers;
        self
    }

    #[inline(always)]
    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size.max(MIN_BUFFER_SIZE)
    }

    #[inline(always)]
    pub fn get_max_stream_len(&self) -> usize {
        self.max_stream_len
    }

    #[inline(always)]
    pub fn is_pool_buffers(&self) -> bool {
        self.pool_buffers
    }
}
