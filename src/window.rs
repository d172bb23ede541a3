//! Go-Back-N send-side window state machine.
//!
//! [`GbnWindow`] tracks which chunk sequence numbers are in flight and which
//! may still be transmitted.  Unlike stop-and-wait, up to `N` Data packets
//! may be outstanding simultaneously.
//!
//! # Protocol contract
//!
//! - At most `N` chunks — `[base, min(base + N - 1, total)]` — may be in
//!   flight at once.
//! - Acks are **cumulative**: a request number `R` means the receiver has
//!   accepted every chunk below `R` and now wants `R`.
//! - On timeout the caller retransmits the **entire** current window from
//!   `base` (go back to N); the cursor is rewound, nothing else changes.
//! - A request number `≤ base` is stale and moves nothing.
//! - The transfer is complete when the request number reaches `total + 1`.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.
//!
//! # Sequence-number layout
//!
//! ```text
//!    base            cursor          window_end
//!      │                │                │
//!  ────┼────────────────┼────────────────┼──────▶ chunk seq (1-based)
//!      │ ◀─ in flight ─▶│ ◀─ sendable ──▶│
//! ```

// ---------------------------------------------------------------------------
// GbnWindow
// ---------------------------------------------------------------------------

/// Go-Back-N send-side state for one transfer.
#[derive(Debug)]
pub struct GbnWindow {
    /// Lowest sequence number not yet cumulatively acknowledged.
    base: u32,
    /// Next sequence number to transmit.
    cursor: u32,
    /// Window size N.
    size: u32,
    /// Highest sequence number of the transfer.
    total: u32,
    /// Transmissions of the current window so far.
    attempts: u32,
}

impl GbnWindow {
    /// Create a window of `size` over a transfer of `total` chunks.
    pub fn new(size: u32, total: u32) -> Self {
        assert!(size >= 1, "window size must be at least 1");
        Self {
            base: 1,
            cursor: 1,
            size,
            total,
            attempts: 0,
        }
    }

    /// Current window base (oldest unacknowledged sequence number).
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Transmissions of the current window so far (0 before the first wait).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Highest sequence number the current window covers.
    pub fn window_end(&self) -> u32 {
        (self.base + self.size - 1).min(self.total)
    }

    /// Next sequence number to transmit, advancing the cursor.
    ///
    /// Returns `None` once every chunk of the current window has been sent;
    /// the caller should then wait for a cumulative Ack.
    pub fn next_to_send(&mut self) -> Option<u32> {
        if self.cursor <= self.window_end() {
            let seq = self.cursor;
            self.cursor += 1;
            Some(seq)
        } else {
            None
        }
    }

    /// `true` when `req` announces that every chunk has been accepted.
    pub fn is_complete(&self, req: u32) -> bool {
        req == self.total + 1
    }

    /// Process a cumulative request number.
    ///
    /// Slides the window base to `req`, clears the attempt counter, and
    /// returns `true` when `req` is beyond the current base.  A stale
    /// request (`req ≤ base`) changes nothing and returns `false`.
    pub fn on_request(&mut self, req: u32) -> bool {
        if req <= self.base {
            return false;
        }
        debug_assert!(
            req <= self.cursor,
            "receiver requested {req} beyond the highest sent chunk {}",
            self.cursor - 1
        );
        self.base = req;
        self.attempts = 0;
        true
    }

    /// Record a window timeout: rewind the cursor to `base` so the whole
    /// window is retransmitted, and return the new attempt count.
    pub fn on_timeout(&mut self) -> u32 {
        self.cursor = self.base;
        self.attempts += 1;
        self.attempts
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Drain every currently sendable sequence number.
    fn send_all(w: &mut GbnWindow) -> Vec<u32> {
        std::iter::from_fn(|| w.next_to_send()).collect()
    }

    #[test]
    fn initial_state() {
        let w = GbnWindow::new(3, 5);
        assert_eq!(w.base(), 1);
        assert_eq!(w.window_end(), 3);
        assert_eq!(w.attempts(), 0);
    }

    #[test]
    fn first_window_fills_eagerly() {
        let mut w = GbnWindow::new(3, 5);
        assert_eq!(send_all(&mut w), vec![1, 2, 3]);
        // Cursor is parked until the window slides or times out.
        assert_eq!(w.next_to_send(), None);
    }

    #[test]
    fn window_clamps_to_total() {
        let mut w = GbnWindow::new(8, 5);
        assert_eq!(send_all(&mut w), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn cumulative_request_slides_the_base() {
        let mut w = GbnWindow::new(3, 5);
        send_all(&mut w);

        assert!(w.on_request(4));
        assert_eq!(w.base(), 4);
        assert_eq!(w.window_end(), 5);
        // Only the newly exposed chunks are sendable.
        assert_eq!(send_all(&mut w), vec![4, 5]);
    }

    #[test]
    fn partial_request_opens_part_of_the_window() {
        let mut w = GbnWindow::new(3, 5);
        send_all(&mut w);

        assert!(w.on_request(2));
        assert_eq!(w.base(), 2);
        assert_eq!(send_all(&mut w), vec![4]);
    }

    #[test]
    fn stale_request_moves_nothing() {
        let mut w = GbnWindow::new(3, 5);
        send_all(&mut w);
        assert!(w.on_request(3));

        assert!(!w.on_request(3));
        assert!(!w.on_request(1));
        assert_eq!(w.base(), 3);
    }

    #[test]
    fn timeout_rewinds_cursor_and_counts_attempts() {
        let mut w = GbnWindow::new(3, 5);
        send_all(&mut w);

        assert_eq!(w.on_timeout(), 1);
        // The whole window is retransmitted, unchanged.
        assert_eq!(send_all(&mut w), vec![1, 2, 3]);
        assert_eq!(w.on_timeout(), 2);
    }

    #[test]
    fn slide_resets_the_attempt_counter() {
        let mut w = GbnWindow::new(3, 5);
        send_all(&mut w);
        w.on_timeout();
        w.on_timeout();
        assert_eq!(w.attempts(), 2);

        assert!(w.on_request(2));
        assert_eq!(w.attempts(), 0);
    }

    #[test]
    fn completion_is_total_plus_one() {
        let w = GbnWindow::new(3, 5);
        assert!(!w.is_complete(5));
        assert!(w.is_complete(6));

        // Degenerate empty transfer: the handshake request already completes it.
        let w = GbnWindow::new(3, 0);
        assert!(w.is_complete(1));
    }

    #[test]
    fn five_chunks_window_three_runs_in_two_windows() {
        let mut w = GbnWindow::new(3, 5);
        assert_eq!(send_all(&mut w), vec![1, 2, 3]);
        assert!(w.on_request(4));
        assert_eq!(send_all(&mut w), vec![4, 5]);
        assert!(w.is_complete(6));
    }
}
