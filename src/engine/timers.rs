/// Level-triggered countdown driven by the engine clock.
///
/// Nothing fires on its own: the owner polls it every tick with the current time and the
/// duration it wants. The first poll arms the deadline, a poll at or past the deadline fires
/// once and disarms, and the next poll arms it again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    deadline_ms: Option<u64>,
}

impl Countdown {
    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn clear(&mut self) {
        self.deadline_ms = None;
    }

    pub fn poll(&mut self, now_ms: u64, duration_ms: u64) -> bool {
        let deadline = *self
            .deadline_ms
            .get_or_insert(now_ms.saturating_add(duration_ms));
        if now_ms >= deadline {
            self.deadline_ms = None;
            return true;
        }
        false
    }

    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms
            .map(|deadline| deadline.saturating_sub(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_arms_and_later_poll_fires_once() {
        let mut countdown = Countdown::default();
        assert!(!countdown.poll(1_000, 3_000));
        assert_eq!(countdown.deadline_ms(), Some(4_000));
        assert!(!countdown.poll(3_999, 3_000));
        assert!(countdown.poll(4_000, 3_000));
        assert!(!countdown.is_armed());
    }

    #[test]
    fn duration_is_fixed_when_armed() {
        let mut countdown = Countdown::default();
        countdown.poll(0, 7_000);
        assert!(!countdown.poll(3_000, 3_000));
        assert!(countdown.poll(7_000, 3_000));
    }

    #[test]
    fn clear_discards_deadline() {
        let mut countdown = Countdown::default();
        countdown.poll(0, 500);
        countdown.clear();
        assert_eq!(countdown.remaining_ms(10_000), None);
        assert!(!countdown.poll(10_000, 500));
        assert_eq!(countdown.remaining_ms(10_100), Some(400));
    }

    #[test]
    fn zero_duration_fires_on_arming_poll() {
        let mut countdown = Countdown::default();
        assert!(countdown.poll(42, 0));
        assert!(!countdown.is_armed());
    }
}
