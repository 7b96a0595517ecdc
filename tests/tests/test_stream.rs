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


use savepack_core::binary::{BinaryReader, BinaryWriter};
use savepack_core::config::Config;
use savepack_core::error::Error;
use savepack_core::resolver::FormatterRegistry;
use savepack_core::types::ContextType;
use std::io::{self, Read, Write};
use std::sync::Arc;
use tests::init_logger;

struct FailingStream;

impl Write for FailingStream {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for FailingStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
    }
}

/// Hands out at most three bytes per read call.
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.0.len()).min(3);
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

fn sample_bytes() -> Vec<u8> {
    let mut writer = BinaryWriter::new(
        Config::default().buffer_size(64),
        Arc::new(FormatterRegistry::new()),
    );
    writer.begin_serialization().unwrap();
    for id in 0..6 {
        writer.push_context(ContextType::Object, id).unwrap();
        writer.write_value("id", &id).unwrap();
        writer.write_value("name", &format!("crate {}", id)).unwrap();
        writer.pop_context(ContextType::Object).unwrap();
    }
    writer.end_serialization().unwrap();
    writer.to_bytes().unwrap()
}

#[test]
fn test_write_failure_is_reported() {
    init_logger();
    let mut writer = BinaryWriter::default();
    assert!(matches!(
        writer.write_to_stream(&mut FailingStream),
        Err(Error::NotAllowed(_))
    ));
    writer.begin_serialization().unwrap();
    writer.write_value("a", &1i32).unwrap();
    writer.end_serialization().unwrap();
    assert!(matches!(
        writer.write_to_stream(&mut FailingStream),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_read_failures_are_reported() {
    init_logger();
    let mut reader = BinaryReader::default();
    assert!(matches!(
        reader.read_from_stream(&mut FailingStream),
        Err(Error::Io(_))
    ));
    assert!(matches!(
        reader.read_from_stream(&mut &[1u8, 0][..]),
        Err(Error::Io(_))
    ));
    assert!(reader
        .read_from_stream(&mut &(-5i32).to_le_bytes()[..])
        .is_err());
    assert!(reader.begin_deserialization().is_err());
}

#[test]
fn test_short_read_is_a_hard_failure() {
    init_logger();
    let bytes = sample_bytes();
    let mut reader = BinaryReader::default();
    let truncated = &bytes[..bytes.len() - 10];
    assert!(matches!(
        reader.read_from_stream(&mut &truncated[..]),
        Err(Error::InvalidData(_))
    ));
    assert!(reader.begin_deserialization().is_err());
}

#[test]
fn test_partial_reads_are_assembled() {
    init_logger();
    let bytes = sample_bytes();
    let mut reader = BinaryReader::default();
    reader.read_from_stream(&mut Trickle(&bytes)).unwrap();
    reader.begin_deserialization().unwrap();
    assert!(reader.push_context(ContextType::Object, 5));
    assert_eq!(
        reader.try_read_value::<_, String>("name"),
        Some("crate 5".to_string())
    );
}

#[test]
fn test_corrupted_data_never_panics() {
    init_logger();
    let bytes = sample_bytes();
    for position in 4..bytes.len() {
        for &value in &[0x00u8, 0x7F, 0xFF] {
            let mut corrupted = bytes.clone();
            corrupted[position] = value;
            let mut reader = BinaryReader::default();
            reader.read_from_stream(&mut corrupted.as_slice()).unwrap();
            reader.begin_deserialization().unwrap();
            for id in reader.sub_context_ids(ContextType::Object) {
                if reader.push_context(ContextType::Object, id) {
                    let _ = reader.try_read_value::<_, i32>("id");
                    let _ = reader.try_read_value::<_, String>("name");
                    reader.pop_context(ContextType::Object);
                }
            }
            reader.end_deserialization();
        }
    }
}

#[test]
fn test_damaged_tail_keeps_earlier_objects() {
    init_logger();
    let mut bytes = sample_bytes();
    // break the length of the very last record, a pop marker
    let last_record = bytes.len() - 7;
    bytes[last_record..last_record + 4].copy_from_slice(&1000i32.to_le_bytes());

    let mut reader = BinaryReader::default();
    reader.read_from_stream(&mut bytes.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert!(reader.fault_count() > 0);
    assert!(reader.push_context(ContextType::Object, 0));
    assert_eq!(reader.try_read_value::<_, i32>("id"), Some(0));
}
