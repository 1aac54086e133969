//! Canned quotas served for filesystems whose host is `test`.

use crate::config::FsEntry;
use crate::grace::QuotaState;
use crate::record::{QuotaRecord, ResourceUsage};

use super::{LookupError, QuotaSource};

const K: u64 = 1024;
const M: u64 = K * K;
const G: u64 = M * K;

/// Fixed quotas for uids 100 to 106, one per interesting report case.
#[derive(Debug, Default)]
pub struct FixtureSource;

impl QuotaSource for FixtureSource {
    fn query(&self, uid: u32, _entry: &FsEntry) -> Result<QuotaRecord, LookupError> {
        let none = ResourceUsage::unlimited(0);

        let (bytes, files) = match uid {
            // usage only, no limits
            100 => (ResourceUsage::unlimited(M), ResourceUsage::unlimited(455_555)),
            // expired block quota
            101 => (
                ResourceUsage::new(G, M, M, QuotaState::Expired),
                ResourceUsage::new(455_555, M, M, QuotaState::Under),
            ),
            // expired file quota
            102 => (
                ResourceUsage::new(K, M, G, QuotaState::Under),
                ResourceUsage::new(455_555, K, K, QuotaState::Expired),
            ),
            // 73 PiB and 17 Ti files
            103 => (
                ResourceUsage::unlimited(73 * G * M),
                ResourceUsage::unlimited(17 * G * K),
            ),
            // close to the hard limit
            104 => (
                ResourceUsage::new(100 * K, 105 * K, 105 * K, QuotaState::Under),
                none,
            ),
            // over block soft limit, timer running
            105 => (
                ResourceUsage::new(
                    100 * K,
                    90 * K,
                    105 * K,
                    QuotaState::Started {
                        seconds_remaining: 3 * 24 * 60 * 60,
                    },
                ),
                none,
            ),
            // over file soft limit, timer not started
            106 => (
                none,
                ResourceUsage::new(100 * K, 90 * K, 105 * K, QuotaState::NotStarted),
            ),
            _ => return Err(LookupError::NoQuota(uid)),
        };

        Ok(QuotaRecord::new(uid, bytes, files))
    }
}
