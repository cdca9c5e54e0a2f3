use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub mod call;
pub mod chat;

/// Deterministic identifier for a two-party conversation.
///
/// The pair is sorted before hashing, so both participants derive the same
/// value regardless of who asks.
pub fn combine_ids(a: Uuid, b: Uuid) -> String {
    let (first, second) = if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    };

    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());

    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_id_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(combine_ids(a, b), combine_ids(b, a));
    }

    #[test]
    fn distinct_pairs_get_distinct_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        assert_ne!(combine_ids(a, b), combine_ids(a, c));
        assert_ne!(combine_ids(a, b), combine_ids(b, c));
    }

    #[test]
    fn combined_id_is_url_safe() {
        let id = combine_ids(Uuid::new_v4(), Uuid::new_v4());
        assert!(!id.contains('+') && !id.contains('/') && !id.contains('='));
    }
}
