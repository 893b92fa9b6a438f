//! Pad matrix scanning over `embedded-hal` pin traits.
//!
//! The dance pad is wired as 3 strobe rows by 12 sense columns, three
//! columns per directional tile. Rows are open-drain: driven low while
//! strobed, released to high impedance otherwise, so only one row is ever
//! active on the bus at a time. Columns are inputs with pull-ups and read
//! active-low.
//!
//! The scanner is generic over the pin traits; the firmware instantiates
//! it with rp2040-hal pins, the tests here with fakes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{COLS, ROWS};

/// Owns the matrix pins and performs blocking scan cycles.
pub struct MatrixScanner<R, C> {
    rows: [R; ROWS],
    cols: [C; COLS],
    settle_us: u32,
}

impl<R: OutputPin, C: InputPin> MatrixScanner<R, C> {
    /// `settle_us` is the per-row strobe settle time, covering line
    /// capacitance and pull-up transients. A hardware tuning value, not a
    /// protocol constant.
    pub fn new(mut rows: [R; ROWS], cols: [C; COLS], settle_us: u32) -> Self {
        // Start with every strobe line released
        for row in rows.iter_mut() {
            let _ = row.set_high();
        }
        Self {
            rows,
            cols,
            settle_us,
        }
    }

    /// Run one full scan cycle and return the per-column pressed samples.
    ///
    /// For each row in order: drive the strobe low, wait the settle time,
    /// sample every column, release the strobe before moving to the next
    /// row. A column counts as pressed if it read low under any row strobe
    /// of the cycle — a later row's quiet reading never clears an earlier
    /// hit within the same cycle.
    ///
    /// There is no failure path: a miswired column simply never reports
    /// pressed.
    pub fn scan(&mut self, delay: &mut impl DelayNs) -> [bool; COLS] {
        let mut pressed = [false; COLS];

        for row in self.rows.iter_mut() {
            let _ = row.set_low();
            delay.delay_us(self.settle_us);

            for (col, pin) in self.cols.iter_mut().enumerate() {
                if pin.is_low().unwrap_or(false) {
                    pressed[col] = true;
                }
            }

            let _ = row.set_high();
        }

        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;

    /// Which row is currently strobed, shared by all fake pins.
    type Strobe<'a> = &'a Cell<Option<usize>>;

    struct FakeRow<'a> {
        idx: usize,
        active: Strobe<'a>,
    }

    impl embedded_hal::digital::ErrorType for FakeRow<'_> {
        type Error = Infallible;
    }

    impl OutputPin for FakeRow<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            // Rows must be strobed one at a time
            assert!(self.active.get().is_none());
            self.active.set(Some(self.idx));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            if self.active.get() == Some(self.idx) {
                self.active.set(None);
            }
            Ok(())
        }
    }

    /// Column whose switch to each row is open or closed; reads low only
    /// while a row it is closed against is strobed.
    struct FakeCol<'a> {
        closed: [bool; ROWS],
        active: Strobe<'a>,
    }

    impl embedded_hal::digital::ErrorType for FakeCol<'_> {
        type Error = Infallible;
    }

    impl InputPin for FakeCol<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(!self.is_low()?)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(match self.active.get() {
                Some(row) => self.closed[row],
                None => false,
            })
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn scanner_for<'a>(
        wiring: &[[bool; ROWS]; COLS],
        active: Strobe<'a>,
    ) -> MatrixScanner<FakeRow<'a>, FakeCol<'a>> {
        let rows: [FakeRow; ROWS] = core::array::from_fn(|idx| FakeRow { idx, active });
        let cols: [FakeCol; COLS] = core::array::from_fn(|c| FakeCol {
            closed: wiring[c],
            active,
        });
        MatrixScanner::new(rows, cols, 0)
    }

    #[test]
    fn test_idle_matrix_scans_all_released() {
        let active = Cell::new(None);
        let wiring = [[false; ROWS]; COLS];
        let mut scanner = scanner_for(&wiring, &active);
        assert_eq!(scanner.scan(&mut NoDelay), [false; COLS]);
    }

    #[test]
    fn test_later_rows_never_clear_an_earlier_hit() {
        let active = Cell::new(None);
        let mut wiring = [[false; ROWS]; COLS];
        // Column 2 closes only under row 0; it reads quiet under rows 1
        // and 2 later in the same cycle
        wiring[2][0] = true;
        let mut scanner = scanner_for(&wiring, &active);

        let pressed = scanner.scan(&mut NoDelay);
        assert!(pressed[2]);
        assert_eq!(pressed.iter().filter(|&&p| p).count(), 1);
    }

    #[test]
    fn test_hits_accumulate_across_rows_in_one_cycle() {
        let active = Cell::new(None);
        let mut wiring = [[false; ROWS]; COLS];
        wiring[2][0] = true; // hit under the first row
        wiring[7][2] = true; // hit under the last row
        let mut scanner = scanner_for(&wiring, &active);

        let pressed = scanner.scan(&mut NoDelay);
        assert!(pressed[2]);
        assert!(pressed[7]);
        assert_eq!(pressed.iter().filter(|&&p| p).count(), 2);
    }

    #[test]
    fn test_scan_cycles_are_independent() {
        let active = Cell::new(None);
        let mut wiring = [[false; ROWS]; COLS];
        wiring[5][1] = true;
        let mut scanner = scanner_for(&wiring, &active);

        assert!(scanner.scan(&mut NoDelay)[5]);
        // Same wiring, same result; no state leaks between cycles
        assert!(scanner.scan(&mut NoDelay)[5]);
    }
}
