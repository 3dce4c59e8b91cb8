// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Decoder for the selection wire format.
//!
//! The upstream parser hands a query over as
//! `{"selections": [{"name", "alias"?, "arguments"?, "selections"?}, ...]}`.
//! Nesting on the wire is unbounded, so the decoder keeps its own stack of
//! open containers instead of recursing: a document nested far past any
//! configured depth still decodes, and the depth rule then rejects it.
//! Member names, scalars, argument maps and unknown members are read with
//! `serde_json`; only the structural punctuation is handled here.

use crate::error::DocumentError;
use crate::tree::{NodeId, SelectionTree};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// The document object; its selections hang off the synthetic root
    Document,
    /// A `selections` array whose items become children of `parent`
    List { parent: NodeId },
    /// One selection object
    Selection {
        id: NodeId,
        start: usize,
        named: bool,
    },
}

struct Decoder<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while matches!(bytes.get(self.pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consume `byte` if it comes next.
    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), DocumentError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.syntax(expected))
        }
    }

    fn syntax(&self, expected: &'static str) -> DocumentError {
        DocumentError::Syntax {
            expected,
            offset: self.pos,
        }
    }

    /// Read one complete JSON value starting at the cursor.
    fn read<T: DeserializeOwned>(&mut self) -> Result<T, DocumentError> {
        self.skip_whitespace();
        let offset = self.pos;
        let mut values =
            serde_json::Deserializer::from_str(&self.input[offset..]).into_iter::<T>();
        match values.next() {
            Some(Ok(value)) => {
                self.pos = offset + values.byte_offset();
                Ok(value)
            }
            Some(Err(source)) => Err(DocumentError::Value { offset, source }),
            None => Err(self.syntax("a value")),
        }
    }

    /// Read `"name":` and return the name.
    fn read_key(&mut self) -> Result<String, DocumentError> {
        if self.peek() != Some(b'"') {
            return Err(self.syntax("a member name"));
        }
        let key = self.read()?;
        self.expect(b':', "`:`")?;
        Ok(key)
    }
}

impl SelectionTree {
    /// Decode a selection document into a tree.
    ///
    /// Members may appear in any order and unknown members are skipped.
    /// `alias`, `arguments` and `selections` may be `null`.
    pub fn from_json(input: &str) -> Result<Self, DocumentError> {
        let mut tree = SelectionTree::new();
        let mut decoder = Decoder { input, pos: 0 };

        decoder.expect(b'{', "`{`")?;
        let mut stack = vec![Frame::Document];
        // Set right after an opening bracket, where no `,` may come first
        let mut first = true;

        while let Some(&frame) = stack.last() {
            if let Frame::List { parent } = frame {
                if decoder.eat(b']') {
                    stack.pop();
                    first = false;
                    continue;
                }
                if !first {
                    decoder.expect(b',', "`,` or `]`")?;
                }
                decoder.skip_whitespace();
                let start = decoder.pos;
                decoder.expect(b'{', "a selection object")?;
                let id = tree.open_field(parent);
                stack.push(Frame::Selection {
                    id,
                    start,
                    named: false,
                });
                first = true;
                continue;
            }

            if decoder.eat(b'}') {
                if let Frame::Selection {
                    named: false,
                    start,
                    ..
                } = frame
                {
                    return Err(DocumentError::MissingName { offset: start });
                }
                stack.pop();
                first = false;
                continue;
            }
            if !first {
                decoder.expect(b',', "`,` or `}`")?;
            }
            first = false;

            let key = decoder.read_key()?;
            let owner = match frame {
                Frame::Selection { id, .. } => id,
                _ => tree.root(),
            };

            match (frame, key.as_str()) {
                (_, "selections") => {
                    if decoder.eat(b'[') {
                        stack.push(Frame::List { parent: owner });
                        first = true;
                    } else {
                        decoder.read::<()>()?;
                    }
                }
                (Frame::Selection { id, .. }, "name") => {
                    let name: String = decoder.read()?;
                    if !name.is_empty() {
                        tree.node_mut(id).name = name;
                        if let Some(Frame::Selection { named, .. }) = stack.last_mut() {
                            *named = true;
                        }
                    }
                }
                (Frame::Selection { id, .. }, "alias") => {
                    tree.node_mut(id).alias = decoder.read()?;
                }
                (Frame::Selection { id, .. }, "arguments") => {
                    let arguments: Option<Map<String, Value>> = decoder.read()?;
                    for (name, value) in arguments.unwrap_or_default() {
                        tree.set_argument(id, name, value);
                    }
                }
                _ => {
                    decoder.read::<IgnoredAny>()?;
                }
            }
        }

        decoder.skip_whitespace();
        if decoder.pos != input.len() {
            return Err(decoder.syntax("end of document"));
        }
        Ok(tree)
    }
}
