//! Log-backed reporting service.
//!
//! Implements [`ReportingPort`] by writing every attribute report to the
//! logger.  A radio-backed adapter would implement the same trait and
//! queue the frame instead.

use log::info;

use crate::app::ports::{AttrValue, ReportingPort};

/// One delivered attribute report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrReport {
    pub endpoint: u8,
    pub cluster: u16,
    pub attribute: u16,
    pub value: AttrValue,
}

#[derive(Debug, Default)]
pub struct LogReporter {
    sent: u32,
    last: Option<AttrReport>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total reports delivered.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn last(&self) -> Option<AttrReport> {
        self.last
    }
}

impl ReportingPort for LogReporter {
    fn report_attribute_changed(&mut self, endpoint: u8, cluster: u16, attribute: u16, value: AttrValue) {
        let raw = match value {
            AttrValue::U8(v) => i32::from(v),
            AttrValue::I16(v) => i32::from(v),
            AttrValue::U16(v) => i32::from(v),
        };
        info!(
            "REPORT | ep={} cluster=0x{:04X} attr=0x{:04X} value={}",
            endpoint, cluster, attribute, raw
        );
        self.sent += 1;
        self.last = Some(AttrReport {
            endpoint,
            cluster,
            attribute,
            value,
        });
    }
}
