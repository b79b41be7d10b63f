//! The seam between the scan engine and a tuner device.

use std::time::Duration;

use bytes::Bytes;

use crate::error::ScanError;
use crate::transponder::TransponderEntry;

/// A tuned source of complete PSI/SI sections.
///
/// Implementations sit on top of whatever delivers sections: a demux
/// device, a network proxy, or a scripted mock in tests. The engine
/// drives it filter by filter; at most one section filter is open at a
/// time.
pub trait SectionSource {
    /// Tune to the given transponder and wait for lock.
    ///
    /// Failure here aborts the scan of this transponder.
    fn tune(&mut self, entry: &TransponderEntry) -> Result<(), ScanError>;

    /// Open a section filter on `pid`. Any previously open filter is
    /// replaced.
    fn open_filter(&mut self, pid: u16) -> Result<(), ScanError>;

    /// Read the next complete section image (table id through CRC).
    ///
    /// Returns [`ScanError::Timeout`] when nothing arrives in time.
    fn read_section(&mut self, timeout: Duration) -> Result<Bytes, ScanError>;

    /// Close the open section filter, if any.
    fn close_filter(&mut self);
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted section source shared by the engine tests.

    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use bytes::Bytes;

    use dtv_si::crc::crc32_mpeg2;

    use super::SectionSource;
    use crate::error::ScanError;
    use crate::transponder::TransponderEntry;

    /// Section source fed from per-PID scripts.
    #[derive(Default)]
    pub struct MockSource {
        queues: HashMap<u16, VecDeque<Bytes>>,
        current: Option<u16>,
        /// When set, `tune` fails with this message.
        pub tune_error: Option<String>,
        pub tuned: Vec<TransponderEntry>,
        pub opened: Vec<u16>,
    }

    impl MockSource {
        pub fn new() -> Self {
            MockSource::default()
        }

        /// Queue a section image for `pid`, appending its CRC-32.
        pub fn push_section(&mut self, pid: u16, image: &[u8]) {
            let mut full = image.to_vec();
            let crc = crc32_mpeg2(&full);
            full.extend_from_slice(&crc.to_be_bytes());
            self.queues.entry(pid).or_default().push_back(full.into());
        }

        /// Queue a section image verbatim, CRC not corrected.
        pub fn push_raw(&mut self, pid: u16, image: &[u8]) {
            self.queues
                .entry(pid)
                .or_default()
                .push_back(image.to_vec().into());
        }
    }

    impl SectionSource for MockSource {
        fn tune(&mut self, entry: &TransponderEntry) -> Result<(), ScanError> {
            if let Some(message) = &self.tune_error {
                return Err(ScanError::TuneFailure(message.clone()));
            }
            self.tuned.push(entry.clone());
            Ok(())
        }

        fn open_filter(&mut self, pid: u16) -> Result<(), ScanError> {
            self.opened.push(pid);
            self.current = Some(pid);
            Ok(())
        }

        fn read_section(&mut self, _timeout: Duration) -> Result<Bytes, ScanError> {
            self.current
                .and_then(|pid| self.queues.get_mut(&pid))
                .and_then(|queue| queue.pop_front())
                .ok_or(ScanError::Timeout("section"))
        }

        fn close_filter(&mut self) {
            self.current = None;
        }
    }
}
