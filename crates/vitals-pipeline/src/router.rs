//! Sticky worker partitioning.
//!
//! Per-user FIFO requires every sample of a user to land on the same
//! worker, so the router is a stable hash of the user id, not a round
//! robin. FNV-1a keeps it dependency-free and deterministic across runs.

/// Worker index for a user id.
pub fn worker_index(user_id: &str, workers: usize) -> usize {
    debug_assert!(workers > 0);
    (fnv1a(user_id.as_bytes()) % workers as u64) as usize
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_user_same_worker() {
        for workers in [1, 4, 8] {
            let first = worker_index("alice", workers);
            for _ in 0..100 {
                assert_eq!(worker_index("alice", workers), first);
            }
        }
    }

    #[test]
    fn test_index_in_range() {
        for user in ["alice", "bob", "default", "", "subject-42"] {
            for workers in 1..=16 {
                assert!(worker_index(user, workers) < workers);
            }
        }
    }

    #[test]
    fn test_users_spread_over_workers() {
        let indices: std::collections::HashSet<usize> = (0..64)
            .map(|i| worker_index(&format!("user-{i}"), 8))
            .collect();
        // 64 distinct users must hit more than one of 8 workers.
        assert!(indices.len() > 1);
    }
}
