//! Landmark-pair hash generation (spec.md §4.3). Hash and peak ordering are
//! part of the on-disk wire format — do not reorder without breaking
//! cross-run compatibility of stored fingerprints (spec.md §9.3).

use super::{Peak, FAN_VALUE, FINGERPRINT_REDUCTION, MAX_HASH_TIME_DELTA, MIN_HASH_TIME_DELTA};
use sha1::{Digest, Sha1};

/// A transient (hash, anchor-time) record, per spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    pub hash: String,
    pub anchor_time: usize,
}

/// `hashes(peaks, fan_value) -> [(hash_hex20, anchor_time)]`.
///
/// Peaks are sorted ascending by `(freq_bin, time_bin)` before fan-out —
/// this ordering is part of the hash contract, not an implementation detail.
pub fn generate_hashes(peaks: &[Peak]) -> Vec<HashRecord> {
    generate_hashes_with_fan(peaks, FAN_VALUE)
}

pub fn generate_hashes_with_fan(peaks: &[Peak], fan_value: usize) -> Vec<HashRecord> {
    let mut sorted = peaks.to_vec();
    sorted.sort();

    let mut out = Vec::new();
    for i in 0..sorted.len() {
        let anchor = sorted[i];
        for j in 1..fan_value {
            let Some(target) = sorted.get(i + j) else {
                break;
            };
            let dt = target.time_bin as i64 - anchor.time_bin as i64;
            if dt < MIN_HASH_TIME_DELTA || dt > MAX_HASH_TIME_DELTA {
                continue;
            }

            let descriptor = format!("{}|{}|{}", anchor.freq_bin, target.freq_bin, dt);
            let digest = Sha1::digest(descriptor.as_bytes());
            let hash = hex::encode(digest)[..FINGERPRINT_REDUCTION].to_string();

            out.push(HashRecord {
                hash,
                anchor_time: anchor.time_bin,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_peaks_within_range_produce_one_hash() {
        let peaks = vec![
            Peak { freq_bin: 100, time_bin: 10 },
            Peak { freq_bin: 200, time_bin: 15 },
        ];
        let records = generate_hashes(&peaks);
        assert_eq!(records.len(), 1);

        let expected_digest = Sha1::digest(b"100|200|5");
        let expected_hash = hex::encode(expected_digest)[..20].to_string();
        assert_eq!(records[0].hash, expected_hash);
        assert_eq!(records[0].anchor_time, 10);
    }

    #[test]
    fn pairs_exceeding_max_delta_are_dropped() {
        let peaks = vec![
            Peak { freq_bin: 10, time_bin: 0 },
            Peak { freq_bin: 10, time_bin: 5 },
            Peak { freq_bin: 10, time_bin: 250 },
        ];
        let records = generate_hashes(&peaks);
        // Only (0 -> 5) survives; (0 -> 250) and (5 -> 250) exceed MAX_HASH_TIME_DELTA.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].anchor_time, 0);
    }

    #[test]
    fn every_hash_is_twenty_lowercase_hex_chars() {
        let peaks = vec![
            Peak { freq_bin: 3, time_bin: 0 },
            Peak { freq_bin: 9, time_bin: 2 },
            Peak { freq_bin: 40, time_bin: 4 },
        ];
        for record in generate_hashes(&peaks) {
            assert_eq!(record.hash.len(), 20);
            assert!(record.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn empty_peak_list_yields_no_hashes() {
        assert!(generate_hashes(&[]).is_empty());
    }

    #[test]
    fn ordering_by_freq_then_time_determines_which_peak_is_anchor() {
        // Peaks given out of order; anchor/target pairing must follow sorted order.
        let peaks = vec![
            Peak { freq_bin: 50, time_bin: 20 },
            Peak { freq_bin: 10, time_bin: 5 },
        ];
        let records = generate_hashes(&peaks);
        assert_eq!(records.len(), 1);
        // sorted: (10,5) then (50,20) -> anchor is (10,5), dt = 20-5 = 15
        assert_eq!(records[0].anchor_time, 5);
    }
}
