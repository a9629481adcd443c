//! On-chain approval records, keyed by approval-flow digest.

use safe_types::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owners that approved a digest, in approval order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
	pub approvers: Vec<Address>,
	/// Set once the digest ran; the record is final afterwards.
	pub executed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalBook {
	records: BTreeMap<B256, ApprovalRecord>,
}

impl ApprovalBook {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&self, digest: &B256) -> Option<&ApprovalRecord> {
		self.records.get(digest)
	}

	/// Approvers of `digest`; empty if nobody approved it.
	pub fn approvers(&self, digest: &B256) -> &[Address] {
		self.records
			.get(digest)
			.map(|r| r.approvers.as_slice())
			.unwrap_or_default()
	}

	pub fn is_executed(&self, digest: &B256) -> bool {
		self.records.get(digest).is_some_and(|r| r.executed)
	}

	pub fn has_approved(&self, digest: &B256, owner: &Address) -> bool {
		self.approvers(digest).contains(owner)
	}

	/// Records `owner` as an approver. Returns false if it already was one.
	pub fn approve(&mut self, digest: B256, owner: Address) -> bool {
		let record = self.records.entry(digest).or_default();
		if record.approvers.contains(&owner) {
			return false;
		}
		record.approvers.push(owner);
		true
	}

	pub fn mark_executed(&mut self, digest: B256) {
		self.records.entry(digest).or_default().executed = true;
	}

	/// Number of distinct approvers accepted by `counts`.
	pub fn count_where(&self, digest: &B256, counts: impl Fn(&Address) -> bool) -> usize {
		self.approvers(digest).iter().filter(|a| counts(a)).count()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
