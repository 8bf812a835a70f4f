//! Human-readable order numbers.

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 4;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates an order number of the form `JB-<unix-ms>-<4 base36 chars>`,
/// e.g. `JB-1756400000000-7KQ2`.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("JB-{}-{}", Utc::now().timestamp_millis(), suffix)
}
