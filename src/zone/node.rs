// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Node`] structure of the zone tree.

use std::collections::HashMap;

use crate::name::{Label, Name};
use crate::rr::RrsetList;

/// A node in the DNS tree, which may own RRsets.
///
/// The child whose label is `*` (the wildcard owner below this node)
/// is kept in its own slot rather than in `children`, so that the
/// lookup code can find it without hashing.
#[derive(Debug)]
pub(super) struct Node {
    pub name: Name,
    pub rrsets: RrsetList,
    pub children: HashMap<Label, Node>,
    pub wildcard: Option<Box<Node>>,
}

impl Node {
    /// Creates a new `Node` with the provided name. It initially owns
    /// no RRsets and has no children.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            rrsets: RrsetList::new(),
            children: HashMap::new(),
            wildcard: None,
        }
    }

    /// Returns the child of this node with the given label. An
    /// asterisk label reaches the wildcard slot.
    pub fn child(&self, label: &Label) -> Option<&Node> {
        if label.is_asterisk() {
            self.wildcard.as_deref()
        } else {
            self.children.get(label)
        }
    }

    /// Gets or creates a descendant node corresponding to `name`. Any
    /// nodes between the target descendant node and `self` will also be
    /// created. `level` should be set so that `self` corresponds to the
    /// suffix of `name` starting at label `level`.
    pub fn get_or_create_descendant(&mut self, name: &Name, level: usize) -> &mut Node {
        if level == 0 {
            return self;
        }
        let label = &name.labels().as_slice()[level - 1];
        let child = if label.is_asterisk() {
            self.wildcard
                .get_or_insert_with(|| Box::new(Node::new(name.suffix(level - 1))))
                .as_mut()
        } else {
            self.children
                .entry(label.clone())
                .or_insert_with(|| Node::new(name.suffix(level - 1)))
        };
        child.get_or_create_descendant(name, level - 1)
    }

    /// Returns an iterator over the children of this node, the wildcard
    /// child included.
    pub fn all_children(&self) -> impl Iterator<Item = &Node> {
        self.children.values().chain(self.wildcard.as_deref())
    }

    /// Calls `f` on this node and each of its descendants, parents
    /// before children.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.all_children() {
            child.visit(f);
        }
    }
}
