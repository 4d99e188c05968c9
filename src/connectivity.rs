//! Network reconnection watchdog.
//!
//! While the link is up the watchdog is idle. On loss it starts a
//! reconnection window, kicking the link each check; if the window
//! elapses without recovery it reports [`ConnectivityError::ReconnectTimeout`],
//! which the main loop answers with a persisted snapshot and a
//! controlled restart. Restarting is the recovery of last resort and
//! the only fatal path in the system.

use log::{info, warn};

use crate::app::ports::ConnectivityPort;
use crate::error::ConnectivityError;
use crate::ticks::{ticks_since, Ticks};

pub struct ReconnectWatchdog {
    window_ticks: u32,
    /// Tick the current outage began; `None` while the link is up.
    down_since: Option<Ticks>,
}

impl ReconnectWatchdog {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ticks: window_ms,
            down_since: None,
        }
    }

    /// Run one watchdog check. `Ok(true)` means the link is up.
    pub fn check<C: ConnectivityPort>(
        &mut self,
        link: &mut C,
        now: Ticks,
    ) -> Result<bool, ConnectivityError> {
        if link.is_connected() {
            if self.down_since.take().is_some() {
                info!("connectivity: link recovered");
            }
            return Ok(true);
        }

        match self.down_since {
            None => {
                warn!("connectivity: link lost, opening reconnect window");
                self.down_since = Some(now);
                link.reconnect();
                Ok(false)
            }
            Some(since) if ticks_since(now, since) > self.window_ticks => {
                warn!(
                    "connectivity: still down after {}ms, giving up",
                    self.window_ticks
                );
                Err(ConnectivityError::ReconnectTimeout)
            }
            Some(_) => {
                link.reconnect();
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLink {
        connected: bool,
        reconnect_calls: u32,
    }

    impl ConnectivityPort for FakeLink {
        fn is_connected(&mut self) -> bool {
            self.connected
        }
        fn reconnect(&mut self) {
            self.reconnect_calls += 1;
        }
    }

    #[test]
    fn healthy_link_is_a_noop() {
        let mut wd = ReconnectWatchdog::new(30_000);
        let mut link = FakeLink {
            connected: true,
            reconnect_calls: 0,
        };
        assert_eq!(wd.check(&mut link, 0), Ok(true));
        assert_eq!(link.reconnect_calls, 0);
    }

    #[test]
    fn outage_kicks_reconnect_until_window_expires() {
        let mut wd = ReconnectWatchdog::new(30_000);
        let mut link = FakeLink {
            connected: false,
            reconnect_calls: 0,
        };
        assert_eq!(wd.check(&mut link, 1000), Ok(false));
        assert_eq!(wd.check(&mut link, 16_000), Ok(false));
        assert_eq!(link.reconnect_calls, 2);
        // Window measured from the start of the outage.
        assert_eq!(wd.check(&mut link, 31_000), Ok(false));
        assert_eq!(
            wd.check(&mut link, 31_001),
            Err(ConnectivityError::ReconnectTimeout)
        );
    }

    #[test]
    fn recovery_resets_the_window() {
        let mut wd = ReconnectWatchdog::new(30_000);
        let mut link = FakeLink {
            connected: false,
            reconnect_calls: 0,
        };
        assert_eq!(wd.check(&mut link, 0), Ok(false));
        link.connected = true;
        assert_eq!(wd.check(&mut link, 20_000), Ok(true));

        // A second outage gets a full window of its own.
        link.connected = false;
        assert_eq!(wd.check(&mut link, 40_000), Ok(false));
        assert_eq!(wd.check(&mut link, 69_000), Ok(false));
        assert_eq!(
            wd.check(&mut link, 70_001),
            Err(ConnectivityError::ReconnectTimeout)
        );
    }
}
