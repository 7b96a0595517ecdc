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


//! Context tree built by one linear scan of a save blob.
//!
//! Building never fails. Records that cannot be attached are logged and
//! dropped; a frame that cannot be parsed stops the scan, and everything
//! indexed before it stays readable.

use crate::buffer::Reader;
use crate::ensure;
use crate::error::Error;
use crate::types::{
    ContextType, PropertyFlags, PropertyType, CHUNK_HEADER_LEN, KEY_LEN, NEXT_BUFFER_RECORD_LEN,
    RECORD_HEADER_LEN,
};
use std::collections::HashMap;
use std::ops::Range;

pub(crate) const ROOT: usize = 0;

/// An unnamed record attached to the named property before it.
#[derive(Debug)]
pub(crate) struct ChildRecord {
    pub property_type: PropertyType,
    pub payload: Range<usize>,
}

#[derive(Debug)]
pub(crate) struct PropertyRecord {
    pub property_type: PropertyType,
    pub flags: PropertyFlags,
    pub payload: Range<usize>,
    pub children: Vec<ChildRecord>,
}

#[derive(Debug)]
pub(crate) struct ContextNode {
    pub context_type: ContextType,
    pub id: i32,
    pub parent: Option<usize>,
    pub properties: HashMap<i32, PropertyRecord>,
    pub sub_contexts: HashMap<i32, usize>,
}

impl ContextNode {
    fn new(context_type: ContextType, id: i32, parent: Option<usize>) -> ContextNode {
        ContextNode {
            context_type,
            id,
            parent,
            properties: HashMap::new(),
            sub_contexts: HashMap::new(),
        }
    }
}

/// Where the next unnamed record goes.
#[derive(Clone, Copy)]
enum Attach {
    Nowhere,
    Property(i32),
    // children of a rejected duplicate are dropped quietly
    Discarded,
}

/// Arena of contexts; index 0 is the root.
#[derive(Debug)]
pub(crate) struct ContextIndex {
    nodes: Vec<ContextNode>,
    record_count: usize,
    fault_count: usize,
}

struct Scan {
    current: usize,
    attach: Attach,
}

impl ContextIndex {
    pub fn empty() -> ContextIndex {
        ContextIndex {
            nodes: vec![ContextNode::new(ContextType::Root, 0, None)],
            record_count: 0,
            fault_count: 0,
        }
    }

    pub fn build(data: &[u8]) -> ContextIndex {
        let mut index = ContextIndex::empty();
        let mut scan = Scan {
            current: ROOT,
            attach: Attach::Nowhere,
        };
        let mut reader = Reader::new(data);
        if let Err(e) = index.scan_chunks(&mut reader, &mut scan) {
            index.fault_count += 1;
            log::error!(
                "Save data corrupt at offset {}: {}; {} record(s) indexed before the fault",
                reader.get_cursor(),
                e,
                index.record_count
            );
        }
        let mut open = 0;
        let mut node = scan.current;
        while let Some(parent) = index.nodes[node].parent {
            open += 1;
            node = parent;
        }
        if open > 0 {
            index.fault_count += 1;
            log::error!("{} context(s) left open at end of save data", open);
        }
        log::debug!(
            "Indexed {} record(s) in {} context(s) from {} bytes",
            index.record_count,
            index.nodes.len(),
            data.len()
        );
        index
    }

    #[inline(always)]
    pub fn node(&self, index: usize) -> &ContextNode {
        &self.nodes[index]
    }

    pub fn context_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of structural problems logged while building.
    pub fn fault_count(&self) -> usize {
        self.fault_count
    }

    fn scan_chunks(&mut self, reader: &mut Reader, scan: &mut Scan) -> Result<(), Error> {
        while reader.remaining() > 0 {
            let chunk_start = reader.get_cursor();
            let used = reader.read_i32()?;
            ensure!(
                used >= CHUNK_HEADER_LEN as i32 && chunk_start + (used as usize) <= reader.len(),
                Error::invalid_data(format!("chunk at {} claims {} used bytes", chunk_start, used))
            );
            let chunk_end = chunk_start + used as usize;
            while reader.get_cursor() < chunk_end {
                self.scan_record(reader, chunk_end, scan)?;
            }
            if reader.remaining() > 0 {
                Self::skip_next_buffer(reader)?;
            }
        }
        Ok(())
    }

    fn skip_next_buffer(reader: &mut Reader) -> Result<(), Error> {
        let start = reader.get_cursor();
        let len = reader.read_i32()?;
        let raw_type = reader.read_u8()?;
        ensure!(
            raw_type == u8::from(PropertyType::NextBuffer) && len >= NEXT_BUFFER_RECORD_LEN as i32,
            Error::invalid_data(format!("expected a NextBuffer record at {}", start))
        );
        reader.set_cursor(start + len as usize)
    }

    fn scan_record(&mut self, reader: &mut Reader, chunk_end: usize, scan: &mut Scan) -> Result<(), Error> {
        let start = reader.get_cursor();
        let record_len = reader.read_i32()?;
        let raw_type = reader.read_u8()?;
        let raw_flags = reader.read_u8()?;
        ensure!(
            record_len >= RECORD_HEADER_LEN as i32 && start + (record_len as usize) <= chunk_end,
            Error::invalid_data(format!("record at {} has length {}", start, record_len))
        );
        let end = start + record_len as usize;
        // the length is trusted from here on, so a bad record can be skipped
        let result = match (PropertyType::try_from(raw_type), PropertyFlags::from_bits(raw_flags)) {
            (Ok(property_type), Some(flags)) => {
                self.index_record(reader, property_type, flags, end, scan)
            }
            _ => Err(Error::invalid_data(format!(
                "unknown type {:#04x} or flags {:#04x}",
                raw_type, raw_flags
            ))),
        };
        if let Err(e) = result {
            self.fault_count += 1;
            log::error!("Skipping record at {}: {}", start, e);
        }
        reader.set_cursor(end)
    }

    fn index_record(
        &mut self,
        reader: &mut Reader,
        property_type: PropertyType,
        flags: PropertyFlags,
        end: usize,
        scan: &mut Scan,
    ) -> Result<(), Error> {
        let body = reader.get_cursor()..end;
        self.record_count += 1;
        match property_type {
            PropertyType::PushContext => {
                let mut payload = reader.sub_reader(body)?;
                let context_type = ContextType::try_from(payload.read_u8()?)
                    .map_err(|_| Error::invalid_data("unknown context type"))?;
                let id = payload.read_i32()?;
                self.push(context_type, id, scan);
                Ok(())
            }
            PropertyType::PopContext => {
                let mut payload = reader.sub_reader(body)?;
                let context_type = ContextType::try_from(payload.read_u8()?)
                    .map_err(|_| Error::invalid_data("unknown context type"))?;
                self.pop(context_type, scan);
                Ok(())
            }
            PropertyType::NextBuffer => Err(Error::invalid_data("NextBuffer inside a chunk")),
            _ if flags.is_unnamed() => {
                self.attach_child(property_type, body, scan);
                Ok(())
            }
            _ => {
                ensure!(
                    body.len() >= KEY_LEN,
                    Error::invalid_data("named record without a key")
                );
                let key = reader.read_i32()?;
                let record = PropertyRecord {
                    property_type,
                    flags,
                    payload: body.start + KEY_LEN..end,
                    children: Vec::new(),
                };
                self.insert_property(key, record, scan);
                Ok(())
            }
        }
    }

    fn push(&mut self, context_type: ContextType, id: i32, scan: &mut Scan) {
        let parent = scan.current;
        let node = self.nodes.len();
        self.nodes.push(ContextNode::new(context_type, id, Some(parent)));
        let parent_node = &mut self.nodes[parent];
        if !parent_node.sub_contexts.contains_key(&id) {
            parent_node.sub_contexts.insert(id, node);
        } else {
            // the node stays in the arena so its pop still balances
            self.fault_count += 1;
            log::error!(
                "Duplicate context id {} under {:?} {}; keeping the first",
                id,
                parent_node.context_type,
                parent_node.id
            );
        }
        scan.current = node;
        scan.attach = Attach::Nowhere;
    }

    fn pop(&mut self, context_type: ContextType, scan: &mut Scan) {
        let node = &self.nodes[scan.current];
        match node.parent {
            None => {
                self.fault_count += 1;
                log::error!("Pop marker ({:?}) at the root context ignored", context_type);
            }
            Some(parent) => {
                if node.context_type != context_type {
                    log::warn!(
                        "Context type mismatch on pop: expected {:?}, found {:?} (id {})",
                        node.context_type,
                        context_type,
                        node.id
                    );
                }
                scan.current = parent;
            }
        }
        scan.attach = Attach::Nowhere;
    }

    fn insert_property(&mut self, key: i32, record: PropertyRecord, scan: &mut Scan) {
        let node = &mut self.nodes[scan.current];
        if node.properties.contains_key(&key) {
            self.fault_count += 1;
            log::error!(
                "Duplicate key {:#010x} in context {:?} {}; keeping the first",
                key,
                node.context_type,
                node.id
            );
            scan.attach = Attach::Discarded;
        } else {
            node.properties.insert(key, record);
            scan.attach = Attach::Property(key);
        }
    }

    fn attach_child(&mut self, property_type: PropertyType, payload: Range<usize>, scan: &mut Scan) {
        match scan.attach {
            Attach::Property(key) => {
                if let Some(parent) = self.nodes[scan.current].properties.get_mut(&key) {
                    parent.children.push(ChildRecord {
                        property_type,
                        payload,
                    });
                }
            }
            Attach::Discarded => {}
            Attach::Nowhere => {
                self.fault_count += 1;
                log::error!(
                    "Unnamed {:?} record at {} has no property to attach to",
                    property_type,
                    payload.start
                );
            }
        }
    }
}
