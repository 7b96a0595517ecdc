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


//! # Savepack Core
//!
//! A save-game serialization layer: nested contexts of keyed, typed
//! properties written to a chunked little-endian blob, read back through an
//! index that tolerates missing, renamed and retyped fields.
//!
//! ## Architecture
//!
//! - **`binary`**: `BinaryWriter` and the indexing `BinaryReader`
//! - **`object`**: the same contract over an in-memory value tree, persisted as JSON
//! - **`codec`**: `SaveWriter` / `SaveReader` / `Persistent`, shared by both codecs
//! - **`serializer`**: per-type payload encodings (`PropertyValue`)
//! - **`resolver`**: formatter and prototype registries, reference chains
//! - **`buffer`**: byte `Writer` / `Reader` and the chunk chain
//! - **`types`**: wire types, flags, context types and property keys
//! - **`config`**, **`error`**, **`util`**
//!
//! ## Key Concepts
//!
//! ### Contexts
//!
//! Every property lives in a context identified by an id unique among its
//! siblings. Keys only need to be unique within one context, and a reader
//! only sees the properties of the context it has pushed.
//!
//! ### Tolerant reads
//!
//! The reader never fails on data. A key that is absent, or was written with
//! another type or array-ness, reads as `None`, so old saves keep loading
//! after fields change.
//!
//! ### References
//!
//! Pointers between objects are stored as chains of integer keys from a
//! scene root, built and resolved against the host's [`resolver::SceneGraph`].
//!
//! ## Usage
//!
//! ```rust
//! use savepack_core::binary::{BinaryReader, BinaryWriter};
//! use savepack_core::codec::{read_persistent, write_persistent, Persistent, SaveReader, SaveWriter};
//! use savepack_core::error::Error;
//! use savepack_core::types::ContextType;
//!
//! #[derive(Default)]
//! struct Door {
//!     open: bool,
//!     label: String,
//! }
//!
//! impl Persistent for Door {
//!     fn write_properties<W: SaveWriter>(&self, writer: &mut W) -> Result<(), Error> {
//!         writer.write_value("open", &self.open)?;
//!         writer.write_value("label", &self.label)
//!     }
//!
//!     fn read_properties<R: SaveReader>(&mut self, reader: &mut R) {
//!         self.open = reader.read_value_or("open", false);
//!         self.label = reader.read_value_or("label", String::new());
//!     }
//! }
//!
//! let door = Door { open: true, label: "vault".into() };
//! let mut writer = BinaryWriter::default();
//! writer.begin_serialization().unwrap();
//! write_persistent(&mut writer, ContextType::Object, 7, &door).unwrap();
//! writer.end_serialization().unwrap();
//! let bytes = writer.to_bytes().unwrap();
//!
//! let mut reader = BinaryReader::default();
//! reader.read_from_stream(&mut bytes.as_slice()).unwrap();
//! reader.begin_deserialization().unwrap();
//! let mut loaded = Door::default();
//! assert!(read_persistent(&mut reader, ContextType::Object, 7, &mut loaded));
//! assert!(loaded.open);
//! assert_eq!(loaded.label, "vault");
//! ```

pub mod binary;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod object;
pub mod resolver;
pub mod serializer;
pub mod types;
pub mod util;

pub use binary::{BinaryReader, BinaryWriter};
pub use codec::{Persistent, SaveReader, SaveWriter};
pub use config::Config;
pub use error::Error;
pub use object::{ObjectReader, ObjectWriter, SaveTree};
pub use types::{ContextType, PropertyKey, PropertyType};
