//! Motivational messages shown on the dashboard.

use tracing::warn;

/// The fixed message pool.
pub const MOTIVATIONAL_MESSAGES: [&str; 7] = [
    "Keep pushing, you're doing great!",
    "Small steps lead to big results.",
    "Focus on progress, not perfection.",
    "Your future self will thank you for today’s effort!",
    "You got this! One task at a time.",
    "Every small victory counts!",
    "Discipline beats motivation — keep going!",
];

/// Source of the index used to pick a message.
pub trait MessagePicker: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick_index(&self, len: usize) -> usize;
}

/// Picks uniformly using the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomPicker;

impl MessagePicker for OsRandomPicker {
    fn pick_index(&self, len: usize) -> usize {
        let mut bytes = [0u8; 8];
        let value = match getrandom::getrandom(&mut bytes) {
            Ok(()) => u64::from_le_bytes(bytes),
            Err(e) => {
                warn!("OS random source unavailable ({}), falling back to clock", e);
                clock_nanos()
            }
        };
        (value % len as u64) as usize
    }
}

fn clock_nanos() -> u64 {
    use std::time::SystemTime;

    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

/// Always picks the same index (wrapped into range).
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl MessagePicker for FixedPicker {
    fn pick_index(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Choose a message from the pool.
pub fn pick_message(picker: &dyn MessagePicker) -> &'static str {
    let index = picker.pick_index(MOTIVATIONAL_MESSAGES.len()) % MOTIVATIONAL_MESSAGES.len();
    MOTIVATIONAL_MESSAGES[index]
}
