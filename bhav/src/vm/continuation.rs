use std::mem;

/// The condition a suspended thread waits on.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Continuation {
    /// Resume once the global tick reaches `until`, or early on interrupt.
    Sleep { until: u64 },
}

impl Continuation {
    /// Check whether the thread may resume on `tick`.
    ///
    /// Returns the result of the suspended node, or `None` to stay suspended. A pending
    /// interrupt is consumed when it causes the resumption.
    pub fn poll(&self, tick: u64, interrupt: &mut bool) -> Option<bool> {
        match *self {
            Continuation::Sleep { until } => {
                if mem::take(interrupt) || tick >= until {
                    Some(true)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Continuation;

    #[test]
    fn sleep() {
        let sleep = Continuation::Sleep { until: 10 };
        let mut interrupt = false;
        assert_eq!(sleep.poll(9, &mut interrupt), None);
        assert_eq!(sleep.poll(10, &mut interrupt), Some(true));
        assert_eq!(sleep.poll(11, &mut interrupt), Some(true));
    }

    #[test]
    fn interrupt() {
        let sleep = Continuation::Sleep { until: 20_000 };
        let mut interrupt = true;
        assert_eq!(sleep.poll(3, &mut interrupt), Some(true));
        assert!(!interrupt);
        assert_eq!(sleep.poll(4, &mut interrupt), None);
    }
}
