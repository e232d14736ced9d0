//! Identifier utilities
//!
//! Records in the store are keyed by push keys: 20-character strings whose
//! lexicographic order follows creation order. The first 8 characters encode
//! the creation time in milliseconds, the remaining 12 are random and are
//! incremented when several keys are generated within the same millisecond.

use once_cell::sync::Lazy;
use rand::Rng;
use std::sync::Mutex;
use uuid::Uuid;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of a push key
pub const PUSH_KEY_LEN: usize = 20;

const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = PUSH_KEY_LEN - TIME_LEN;

struct PushState {
    last_millis: i64,
    last_random: [u8; RANDOM_LEN],
}

static PUSH_STATE: Lazy<Mutex<PushState>> = Lazy::new(|| {
    Mutex::new(PushState {
        last_millis: i64::MIN,
        last_random: [0; RANDOM_LEN],
    })
});

/// Generate a new push key for the current time
pub fn push_key() -> String {
    push_key_at(crate::time::now_millis())
}

/// Generate a push key for the given epoch milliseconds
///
/// Keys never go backwards: a clock that steps back reuses the last
/// timestamp and increments the random suffix instead.
pub fn push_key_at(millis: i64) -> String {
    stamped_push_key(millis).0
}

/// Push key plus the millisecond timestamp it encodes
///
/// Records that store a timestamp next to their key take it from here, so
/// key order and timestamp order agree after a clock step-back.
pub fn stamped_push_key(millis: i64) -> (String, i64) {
    let mut state = match PUSH_STATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let millis = millis.max(state.last_millis);
    if millis == state.last_millis {
        increment(&mut state.last_random);
    } else {
        let mut rng = rand::thread_rng();
        for slot in state.last_random.iter_mut() {
            *slot = rng.gen_range(0..64);
        }
        state.last_millis = millis;
    }

    let mut key = String::with_capacity(PUSH_KEY_LEN);
    key.push_str(&encode_time(millis));
    for &digit in state.last_random.iter() {
        key.push(PUSH_CHARS[digit as usize] as char);
    }
    (key, millis)
}

/// Increment a base-64 digit string, carrying from the rightmost digit
fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

fn encode_time(millis: i64) -> String {
    let mut value = millis.max(0) as u64;
    let mut chars = [b'-'; TIME_LEN];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(value % 64) as usize];
        value /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}

/// Check whether a string has the shape of a push key
pub fn is_push_key(s: &str) -> bool {
    s.len() == PUSH_KEY_LEN && s.bytes().all(|b| PUSH_CHARS.contains(&b))
}

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}
