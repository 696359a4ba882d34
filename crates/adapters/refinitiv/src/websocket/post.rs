// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Contribution requests, post envelopes and post ID correlation.
//!
//! Every post carries a `PostID` which the gateway echoes back as the `AckID` of its
//! acknowledgment. IDs are issued once per envelope, before encoding, and are never reused while
//! the session is alive. There is no wraparound handling: a session is expected to issue fewer
//! than 2^31 posts.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use ustr::Ustr;

use super::messages::{FieldMap, FieldValue};
use crate::common::consts::FIRST_POST_ID;

/// Fields to contribute to a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRequest {
    /// Target service name.
    pub service: Ustr,
    /// Target item name (RIC).
    pub item: Ustr,
    /// Fields in wire order.
    pub fields: FieldMap,
    /// `true` to (re)establish the item's full field set, `false` for incremental changes.
    pub is_refresh: bool,
}

impl ContributionRequest {
    /// Creates a refresh establishing the item's field set.
    #[must_use]
    pub fn refresh(service: &str, item: &str) -> Self {
        Self {
            service: Ustr::from(service),
            item: Ustr::from(item),
            fields: FieldMap::new(),
            is_refresh: true,
        }
    }

    /// Creates an update carrying changed fields only.
    #[must_use]
    pub fn update(service: &str, item: &str) -> Self {
        Self {
            is_refresh: false,
            ..Self::refresh(service, item)
        }
    }

    /// Appends a field, keeping insertion order.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// A contribution request tagged with its session-assigned post ID.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEnvelope {
    /// Correlation key for the acknowledgment.
    pub post_id: u64,
    /// Whether an acknowledgment is requested.
    pub ack: bool,
    /// The contributed content.
    pub request: ContributionRequest,
}

impl PostEnvelope {
    /// Creates a new [`PostEnvelope`] instance.
    #[must_use]
    pub const fn new(post_id: u64, ack: bool, request: ContributionRequest) -> Self {
        Self {
            post_id,
            ack,
            request,
        }
    }
}

/// A post awaiting acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPost {
    /// Item the post was contributed to.
    pub item: Ustr,
    /// Whether the post was a refresh.
    pub is_refresh: bool,
}

/// Issues post IDs and tracks posts awaiting acknowledgment.
#[derive(Debug, Clone)]
pub struct PostCorrelator {
    next: Arc<AtomicU64>,
    pending: Arc<DashMap<u64, PendingPost>>,
}

impl Default for PostCorrelator {
    fn default() -> Self {
        Self::new(FIRST_POST_ID)
    }
}

impl PostCorrelator {
    /// Creates a new [`PostCorrelator`] issuing IDs from `start`.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Returns the current ID and advances the counter.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Records a sent post as awaiting acknowledgment.
    pub fn register(&self, envelope: &PostEnvelope) {
        if !envelope.ack {
            return;
        }
        self.pending.insert(
            envelope.post_id,
            PendingPost {
                item: envelope.request.item,
                is_refresh: envelope.request.is_refresh,
            },
        );
    }

    /// Matches an acknowledgment to its post, removing it from the pending set.
    pub fn acknowledge(&self, ack_id: u64) -> Option<PendingPost> {
        self.pending.remove(&ack_id).map(|(_, post)| post)
    }

    /// Returns the number of posts awaiting acknowledgment.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
