//! Consumers of collected samples.

use crate::acquisition::{Sample, StopReason};

/// Receives every sample a session collects, plus the end-of-run notice.
/// The plot, table and console frontends of the original tool all reduce to
/// this seam.
pub trait SampleSink {
    /// Called once per selected channel on every successful poll.
    fn on_sample(&mut self, channel: u8, sample: &Sample);

    /// Called once when the run ends, with the reason it did.
    fn on_stop(&mut self, _reason: StopReason) {}
}

/// Discards everything. Useful when only the session's own storage matters.
impl SampleSink for () {
    fn on_sample(&mut self, _channel: u8, _sample: &Sample) {}
}

/// Prints one line per sample in the classic console format
/// `Timestamp: <sec>s / <ms>ms: <value>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl SampleSink for ConsoleSink {
    fn on_sample(&mut self, _channel: u8, sample: &Sample) {
        println!("{}", sample);
    }

    fn on_stop(&mut self, reason: StopReason) {
        println!("Data collection stopped ({}).", reason);
    }
}

/// Collects (channel, sample) rows in memory, the stand-in for the original
/// table widget. Rows live until [TableSink::clear] is called.
#[derive(Debug, Default)]
pub struct TableSink {
    rows: Vec<(u8, Sample)>,
}

impl TableSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows collected so far, in arrival order.
    pub fn rows(&self) -> &[(u8, Sample)] {
        &self.rows
    }

    /// Drops every collected row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Renders the rows as a tab-separated table with a header line.
    pub fn render(&self) -> String {
        let mut out = String::from("Channel\tTime (s)\tValue\n");
        for (channel, sample) in &self.rows {
            out.push_str(&format!(
                "{}\t{:.3}\t{}\n",
                channel,
                sample.seconds(),
                sample.value
            ));
        }
        out
    }
}

impl SampleSink for TableSink {
    fn on_sample(&mut self, channel: u8, sample: &Sample) {
        self.rows.push((channel, *sample));
    }
}
